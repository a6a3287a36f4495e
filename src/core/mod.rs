//! 核心功能模块
//!
//! 本模块提供了渲染程序的基础功能，包括数学库、日志系统、配置管理、
//! 错误处理和帧计时。这些模块独立于具体的图形 API。
//!
//! # 模块组织
//!
//! - `math`：基于 nalgebra 的数学类型与投影辅助函数
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从配置文件加载程序设置
//! - `error`：错误处理，定义统一的错误类型
//! - `timer`：帧计时

pub mod config;
pub mod error;
pub mod log;
pub mod math;
pub mod timer;

// 重新导出常用类型，方便使用
pub use config::Config;
pub use error::{ConfigError, DistRenderError, GraphicsError, Result};
pub use math::{Matrix4, Vector3, Vector4};
pub use timer::FrameClock;
