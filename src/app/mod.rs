//! 应用层
//!
//! - `application`：`Application` 生命周期接口
//! - `rendering_app`：`Rendering3DApplication`，对任意 `DeviceFactory` 泛型
//! - `resources`：交换链相关资源与静态管线资源
//! - `runner`：winit 主循环和无窗口运行

pub mod application;
pub mod rendering_app;
pub mod resources;
pub mod runner;

pub use application::Application;
pub use rendering_app::{AppState, Rendering3DApplication};
pub use runner::{run, run_headless};
