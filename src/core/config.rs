//! 配置管理模块
//!
//! 提供程序配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 720
//! title = "Pipes"
//!
//! [graphics]
//! vsync = true
//! clear_color = [0.05, 0.05, 0.08, 1.0]
//! wireframe = false
//! cull_mode = "back"
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//!
//! [pipes]
//! grid_size = 12
//! seed = 7
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};
use crate::gfx::{AddressMode, CullMode, DepthFormat, FilterMode};

/// 程序配置
///
/// 所有分节都可以省略，缺失的字段使用默认值。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 相机配置
    #[serde(default)]
    pub camera: CameraConfig,

    /// 光源配置
    #[serde(default)]
    pub light: LightConfig,

    /// 管道模拟配置
    #[serde(default)]
    pub pipes: PipesConfig,

    /// 无窗口模式下渲染的帧数（仅命令行）
    #[serde(skip)]
    pub headless_frames: Option<u32>,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 是否可调整大小
    #[serde(default = "default_resizable")]
    pub resizable: bool,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 垂直同步
    #[serde(default = "default_vsync")]
    pub vsync: bool,

    /// 启用图形 API 的调试/验证层
    #[serde(default)]
    pub debug_layer: bool,

    /// 清屏颜色 (RGBA)
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],

    /// 主纹理路径，加载失败时使用内置的后备纹理
    #[serde(default)]
    pub texture_path: Option<String>,

    /// 着色器覆盖目录，其中的同名 .wgsl 文件优先于内置源码
    #[serde(default)]
    pub shader_dir: Option<String>,

    /// 线框模式，需要适配器支持 `POLYGON_MODE_LINE`
    #[serde(default)]
    pub wireframe: bool,

    /// 剔除模式: none, front, back
    #[serde(default = "default_cull_mode")]
    pub cull_mode: CullMode,

    /// 深度缓冲格式: depth32_float, depth24_plus_stencil8
    #[serde(default = "default_depth_format")]
    pub depth_format: DepthFormat,

    /// 纹理过滤: nearest, linear
    #[serde(default = "default_texture_filter")]
    pub texture_filter: FilterMode,

    /// 纹理寻址: repeat, clamp_to_edge
    #[serde(default = "default_texture_address")]
    pub texture_address: AddressMode,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// 环绕相机配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// 垂直视野角度（度数）
    #[serde(default = "default_fov")]
    pub fov: f32,

    /// 近裁剪面距离
    #[serde(default = "default_near_clip")]
    pub near_clip: f32,

    /// 远裁剪面距离
    #[serde(default = "default_far_clip")]
    pub far_clip: f32,

    /// 环绕半径
    #[serde(default = "default_orbit_radius")]
    pub orbit_radius: f32,

    /// 相机高度
    #[serde(default = "default_orbit_height")]
    pub orbit_height: f32,

    /// 环绕角速度（弧度/秒）
    #[serde(default = "default_orbit_speed")]
    pub orbit_speed: f32,
}

/// 点光源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightConfig {
    #[serde(default = "default_light_position")]
    pub position: [f32; 3],

    #[serde(default = "default_light_ambient")]
    pub ambient: [f32; 4],

    #[serde(default = "default_light_diffuse")]
    pub diffuse: [f32; 4],

    #[serde(default = "default_light_specular")]
    pub specular: [f32; 4],

    /// 光源绕 Y 轴旋转的角速度（弧度/秒），0 表示静止
    #[serde(default)]
    pub orbit_speed: f32,
}

/// 管道模拟配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipesConfig {
    /// 网格每条边的格子数
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,

    /// 同时生长的管道数量上限
    #[serde(default = "default_max_pipes")]
    pub max_pipes: u32,

    /// 达到该段数后重置模拟
    #[serde(default = "default_max_segments")]
    pub max_segments: u32,

    /// 每秒推进的步数
    #[serde(default = "default_steps_per_second")]
    pub steps_per_second: f32,

    /// 每一步随机转向的概率
    #[serde(default = "default_turn_chance")]
    pub turn_chance: f32,

    /// 管道半径（相对于格子边长）
    #[serde(default = "default_pipe_radius")]
    pub pipe_radius: f32,

    /// 随机种子
    #[serde(default = "default_seed")]
    pub seed: u64,
}

// 默认值函数
fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_title() -> String { "Pipes".to_string() }
fn default_resizable() -> bool { true }
fn default_vsync() -> bool { true }
fn default_clear_color() -> [f32; 4] { [0.02, 0.02, 0.05, 1.0] }
fn default_cull_mode() -> CullMode { CullMode::Back }
fn default_depth_format() -> DepthFormat { DepthFormat::Depth32Float }
fn default_texture_filter() -> FilterMode { FilterMode::Linear }
fn default_texture_address() -> AddressMode { AddressMode::Repeat }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_file() -> String { "pipes_render.log".to_string() }
fn default_fov() -> f32 { 60.0 }
fn default_near_clip() -> f32 { 0.1 }
fn default_far_clip() -> f32 { 200.0 }
fn default_orbit_radius() -> f32 { 22.0 }
fn default_orbit_height() -> f32 { 9.0 }
fn default_orbit_speed() -> f32 { 0.15 }
fn default_light_position() -> [f32; 3] { [10.0, 15.0, 10.0] }
fn default_light_ambient() -> [f32; 4] { [0.15, 0.15, 0.15, 1.0] }
fn default_light_diffuse() -> [f32; 4] { [1.0, 1.0, 1.0, 1.0] }
fn default_light_specular() -> [f32; 4] { [1.0, 1.0, 1.0, 1.0] }
fn default_grid_size() -> u32 { 12 }
fn default_max_pipes() -> u32 { 4 }
fn default_max_segments() -> u32 { 600 }
fn default_steps_per_second() -> f32 { 12.0 }
fn default_turn_chance() -> f32 { 0.2 }
fn default_pipe_radius() -> f32 { 0.18 }
fn default_seed() -> u64 { 0x5eed }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            resizable: default_resizable(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            vsync: default_vsync(),
            debug_layer: false,
            clear_color: default_clear_color(),
            texture_path: None,
            shader_dir: None,
            wireframe: false,
            cull_mode: default_cull_mode(),
            depth_format: default_depth_format(),
            texture_filter: default_texture_filter(),
            texture_address: default_texture_address(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_file: default_log_file(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: default_fov(),
            near_clip: default_near_clip(),
            far_clip: default_far_clip(),
            orbit_radius: default_orbit_radius(),
            orbit_height: default_orbit_height(),
            orbit_speed: default_orbit_speed(),
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: default_light_position(),
            ambient: default_light_ambient(),
            diffuse: default_light_diffuse(),
            specular: default_light_specular(),
            orbit_speed: 0.0,
        }
    }
}

impl Default for PipesConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            max_pipes: default_max_pipes(),
            max_segments: default_max_segments(),
            steps_per_second: default_steps_per_second(),
            turn_chance: default_turn_chance(),
            pipe_radius: default_pipe_radius(),
            seed: default_seed(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在或无法解析则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 根据命令行参数加载配置
    ///
    /// 显式指定 `--config` 时，文件缺失或解析失败都会返回错误；
    /// 否则读取 `default_path`，读取失败时使用默认配置。
    ///
    /// 返回加载后的配置和实际使用的路径。
    pub fn load_from_args<I>(args: I, default_path: &str) -> Result<(Self, String)>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        match Self::config_path_from_args(args) {
            Some(path) => Ok((Self::from_file(&path)?, path)),
            None => Ok((Self::from_file_or_default(default_path), default_path.to_string())),
        }
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数中找出配置文件路径（`--config <path>`）
    pub fn config_path_from_args<I>(args: I) -> Option<String>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        let idx = args.iter().position(|a| a == "--config")?;
        args.get(idx + 1).cloned()
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--width <value>` / `--height <value>`: 窗口尺寸
    /// - `--no-vsync`: 关闭垂直同步
    /// - `--wireframe`: 线框模式
    /// - `--seed <value>`: 管道模拟随机种子
    /// - `--headless <frames>`: 不创建窗口，渲染指定帧数后退出
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        let value_of = |flag: &str| -> Option<&String> {
            args.iter()
                .position(|a| a == flag)
                .and_then(|idx| args.get(idx + 1))
        };

        if let Some(width) = value_of("--width").and_then(|v| v.parse().ok()) {
            self.window.width = width;
        }

        if let Some(height) = value_of("--height").and_then(|v| v.parse().ok()) {
            self.window.height = height;
        }

        if args.iter().any(|a| a == "--no-vsync") {
            self.graphics.vsync = false;
        }

        if args.iter().any(|a| a == "--wireframe") {
            self.graphics.wireframe = true;
        }

        if let Some(seed) = value_of("--seed").and_then(|v| v.parse().ok()) {
            self.pipes.seed = seed;
        }

        if let Some(frames) = value_of("--headless").and_then(|v| v.parse().ok()) {
            self.headless_frames = Some(frames);
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        fn invalid(field: &str, reason: &str) -> ConfigError {
            ConfigError::InvalidValue {
                field: field.to_string(),
                reason: reason.to_string(),
            }
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid(
                "window.width/height",
                "Window dimensions must be greater than 0",
            )
            .into());
        }

        let camera = &self.camera;
        if camera.near_clip <= 0.0 || camera.far_clip <= camera.near_clip {
            return Err(invalid(
                "camera.near_clip/far_clip",
                "Clip planes must satisfy 0 < near < far",
            )
            .into());
        }

        if !(1.0..180.0).contains(&camera.fov) {
            return Err(invalid("camera.fov", "Field of view must be in [1, 180) degrees").into());
        }

        let pipes = &self.pipes;
        if pipes.grid_size < 2 {
            return Err(invalid("pipes.grid_size", "Grid must have at least 2 cells per side").into());
        }

        if pipes.max_pipes == 0 {
            return Err(invalid("pipes.max_pipes", "At least one pipe is required").into());
        }

        if !(0.0..=1.0).contains(&pipes.turn_chance) {
            return Err(invalid("pipes.turn_chance", "Probability must be within [0, 1]").into());
        }

        if pipes.steps_per_second <= 0.0 {
            return Err(invalid("pipes.steps_per_second", "Step rate must be positive").into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert!(config.graphics.vsync);
        assert_eq!(config.pipes.grid_size, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.window.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.camera.near_clip = 10.0;
        config.camera.far_clip = 5.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipes.turn_chance = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipes.grid_size = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            [window]
            width = 640

            [pipes]
            seed = 42
            max_pipes = 2

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.pipes.seed, 42);
        assert_eq!(config.pipes.max_pipes, 2);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.camera.fov, 60.0);
    }

    #[test]
    fn test_graphics_state_toml() {
        let config = Config::from_toml_str(
            r#"
            [graphics]
            wireframe = true
            cull_mode = "none"
            depth_format = "depth24_plus_stencil8"
            texture_filter = "nearest"
            texture_address = "clamp_to_edge"
            "#,
        )
        .unwrap();

        assert!(config.graphics.wireframe);
        assert_eq!(config.graphics.cull_mode, CullMode::None);
        assert_eq!(config.graphics.depth_format, DepthFormat::Depth24PlusStencil8);
        assert_eq!(config.graphics.texture_filter, FilterMode::Nearest);
        assert_eq!(config.graphics.texture_address, AddressMode::ClampToEdge);

        let defaults = Config::default();
        assert!(!defaults.graphics.wireframe);
        assert_eq!(defaults.graphics.cull_mode, CullMode::Back);
        assert!(Config::from_toml_str("[graphics]\ncull_mode = \"sideways\"").is_err());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml_str("[window]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args([
            "pipes_render",
            "--width",
            "1024",
            "--height",
            "768",
            "--no-vsync",
            "--wireframe",
            "--seed",
            "99",
            "--headless",
            "3",
        ]);

        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 768);
        assert!(!config.graphics.vsync);
        assert!(config.graphics.wireframe);
        assert_eq!(config.pipes.seed, 99);
        assert_eq!(config.headless_frames, Some(3));
    }

    #[test]
    fn test_apply_args_ignores_garbage() {
        let mut config = Config::default();
        config.apply_args(["pipes_render", "--width", "abc", "--height"]);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn test_config_path_from_args() {
        assert_eq!(
            Config::config_path_from_args(["bin", "--config", "alt.toml"]),
            Some("alt.toml".to_string())
        );
        assert_eq!(Config::config_path_from_args(["bin"]), None);
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!(
            "pipes_render_config_{}.toml",
            std::process::id()
        ));
        let mut config = Config::default();
        config.pipes.seed = 1234;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.pipes.seed, 1234);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_explicit_malformed_config_is_error() {
        let path = std::env::temp_dir().join(format!(
            "pipes_render_malformed_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[window]\nwidth = 640\n\n[pipes]\nseed = \"oops\"\n").unwrap();
        let path_str = path.display().to_string();

        let err = Config::load_from_args(["bin", "--config", path_str.as_str()], "config.toml")
            .unwrap_err();
        assert!(matches!(
            err,
            crate::core::DistRenderError::Config(ConfigError::ParseError(_))
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let err = Config::load_from_args(
            ["bin", "--config", "definitely/not/here.toml"],
            "config.toml",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::core::DistRenderError::Config(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_implicit_missing_config_uses_default() {
        let (config, path) = Config::load_from_args(["bin"], "definitely/not/here.toml").unwrap();
        assert_eq!(path, "definitely/not/here.toml");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.pipes.seed, 24301);
    }
}
