/// 网格数据结构模块
///
/// 定义CPU侧的网格数据容器，图元生成器的输出。

use super::vertex::Vertex;
use crate::core::error::{DistRenderError, Result};

/// CPU侧网格数据
///
/// 存储顶点和索引数据，这是一个简单的数据持有者，不包含GPU资源。
/// 渲染器负责将 `MeshData` 上传到GPU缓冲区。
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// 顶点数组
    pub vertices: Vec<Vertex>,

    /// 索引数组
    ///
    /// 三角形顶点索引，每3个索引定义一个三角形（逆时针为正面）。
    pub indices: Vec<u32>,

    /// 网格名称（可选），用于调试和识别
    pub name: Option<String>,
}

impl MeshData {
    /// 创建一个空的网格数据
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一个带名称和容量预分配的网格数据
    pub fn with_capacity(name: impl Into<String>, vertex_capacity: usize, index_capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_capacity),
            indices: Vec::with_capacity(index_capacity),
            name: Some(name.into()),
        }
    }

    /// 获取顶点数量
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// 获取索引数量
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// 获取三角形数量
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// 验证网格数据的有效性
    ///
    /// 检查：
    /// - 网格非空
    /// - 索引数量是3的倍数
    /// - 所有索引都在有效范围内
    pub fn validate(&self) -> Result<()> {
        let label = self.name.as_deref().unwrap_or("<unnamed>");

        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(DistRenderError::Mesh(format!("mesh '{}' is empty", label)));
        }

        if self.indices.len() % 3 != 0 {
            return Err(DistRenderError::Mesh(format!(
                "mesh '{}': index count {} is not a multiple of 3",
                label,
                self.indices.len()
            )));
        }

        let vertex_count = self.vertices.len() as u32;
        if let Some((i, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, &index)| index >= vertex_count)
        {
            return Err(DistRenderError::Mesh(format!(
                "mesh '{}': index {} at position {} out of range (0-{})",
                label,
                index,
                i,
                vertex_count - 1
            )));
        }

        Ok(())
    }
}
