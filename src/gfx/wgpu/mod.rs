//! wgpu 图形后端实现
//!
//! wgpu 是一个跨平台的图形 API，可以在 Vulkan、Metal、DirectX 12、OpenGL
//! 等多种后端上运行。
//!
//! # 模块结构
//!
//! - `backend` - WgpuDevice 结构（设备初始化和表面管理）和设备工厂
//! - `device` - `GraphicsDevice` 实现（资源创建、管线、帧提交）

mod backend;
mod device;

pub use backend::{WgpuDevice, WgpuDeviceFactory};
pub use device::{WgpuDepthTarget, WgpuMesh, WgpuPipeline, WgpuTexture};
