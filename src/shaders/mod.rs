//! 着色器集合
//!
//! 按名称管理 WGSL 着色器程序。默认源码在编译期嵌入，
//! 配置了覆盖目录时，目录中的同名 `.wgsl` 文件优先。
//!
//! 真正的编译发生在 `GraphicsDevice::create_pipeline` 中，
//! 这里只负责定位源码并检查入口函数是否存在。

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::core::error::{GraphicsError, Result};

/// 光照主着色器的名称
pub const LIT_PROGRAM: &str = "lit";

/// 内置着色器源码
const LIT_WGSL: &str = include_str!("lit.wgsl");

/// 必须存在的着色器：(名称, 内置源码, 顶点入口, 片元入口)
const REQUIRED_PROGRAMS: &[(&str, &str, &str, &str)] =
    &[(LIT_PROGRAM, LIT_WGSL, "vs_main", "fs_main")];

/// 一个着色器程序（顶点 + 片元入口位于同一个 WGSL 模块中）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    pub name: String,
    pub source: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// 源码来自覆盖目录时为该文件路径
    pub origin: Option<String>,
}

impl ShaderProgram {
    /// 检查源码中是否声明了两个入口函数
    pub fn validate(&self) -> Result<()> {
        for entry in [&self.vertex_entry, &self.fragment_entry] {
            let needle = format!("fn {}(", entry);
            if !self.source.contains(&needle) {
                return Err(GraphicsError::ShaderCompilation(format!(
                    "shader '{}' has no entry point '{}'",
                    self.name, entry
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// 着色器集合
#[derive(Debug, Default)]
pub struct ShaderCollection {
    programs: BTreeMap<String, ShaderProgram>,
}

impl ShaderCollection {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 加载所有必需的着色器
    ///
    /// # 参数
    ///
    /// * `override_dir` - 可选的覆盖目录，其中的 `<name>.wgsl` 替代内置源码
    pub fn load(override_dir: Option<&Path>) -> Result<Self> {
        let mut collection = Self::new();

        for &(name, builtin, vs, fs) in REQUIRED_PROGRAMS {
            let (source, origin) = match override_dir.map(|dir| dir.join(format!("{}.wgsl", name))) {
                Some(path) if path.is_file() => {
                    let source = std::fs::read_to_string(&path).map_err(|e| {
                        GraphicsError::ShaderCompilation(format!(
                            "failed to read '{}': {}",
                            path.display(),
                            e
                        ))
                    })?;
                    info!(shader = name, path = %path.display(), "Using shader override");
                    (source, Some(path.display().to_string()))
                }
                _ => (builtin.to_string(), None),
            };

            collection.insert(ShaderProgram {
                name: name.to_string(),
                source,
                vertex_entry: vs.to_string(),
                fragment_entry: fs.to_string(),
                origin,
            })?;
        }

        debug!(count = collection.len(), "Shader collection loaded");
        Ok(collection)
    }

    /// 添加或替换一个着色器程序
    pub fn insert(&mut self, program: ShaderProgram) -> Result<()> {
        program.validate()?;
        self.programs.insert(program.name.clone(), program);
        Ok(())
    }

    /// 按名称获取着色器程序
    pub fn get(&self, name: &str) -> Result<&ShaderProgram> {
        self.programs.get(name).ok_or_else(|| {
            GraphicsError::ShaderCompilation(format!("shader '{}' is not loaded", name)).into()
        })
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
