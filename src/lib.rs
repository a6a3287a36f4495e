//! pipes_render - 基于 wgpu 的实时 3D 渲染程序
//!
//! 渲染一组基础图元（立方体、球体、圆柱体）和经典的 "3D 管道" 效果：
//! 管道在三维网格中随机生长，段数达到上限后重新开始。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（数学、日志、配置、错误处理、帧计时）
//! - `geometry`: 顶点、网格和图元生成
//! - `gfx`: 图形设备抽象层（wgpu 后端和无窗口后端）
//! - `shaders`: WGSL 着色器集合
//! - `scene`: 相机、光源、材质、管道模拟和场景
//! - `app`: 应用生命周期和主循环
//!
//! # 使用示例
//!
//! ```no_run
//! use pipes_render::app::{run_headless, Rendering3DApplication};
//! use pipes_render::core::Config;
//! use pipes_render::gfx::{Extent2D, HeadlessDeviceFactory};
//!
//! let factory = HeadlessDeviceFactory::new(Extent2D::new(1280, 720));
//! let mut app = Rendering3DApplication::new(Config::default(), factory);
//! run_headless(&mut app, 60).unwrap();
//! ```

pub mod app;
pub mod core;
pub mod geometry;
pub mod gfx;
pub mod scene;
pub mod shaders;
