//! 图形后端模块
//!
//! 本模块封装了底层图形 API，包括：
//! - `device`：统一的 `GraphicsDevice` 接口和管线状态描述
//! - `constants`：与着色器一致的常量缓冲区布局
//! - `upload`：按 256 字节对齐的 CPU 侧常量缓冲区
//! - `wgpu`：基于 wgpu 的窗口渲染后端
//! - `headless`：不依赖 GPU 的记录后端
//!
//! 所有后端都实现了 `GraphicsDevice` trait，应用逻辑与具体后端无关。

pub mod constants;
pub mod device;
pub mod headless;
pub mod upload;
pub mod wgpu;

pub use device::{
    AddressMode, BindingsDesc, CullMode, DepthFormat, DepthState, DeviceFactory, DrawCall, DynamicBinding, Extent2D,
    FillMode, FilterMode, FrameStatus, FrameSubmission, GraphicsDevice, PipelineDesc, RasterState, SamplerDesc,
};
pub use headless::{HeadlessDevice, HeadlessDeviceFactory, HeadlessMonitor, ResourceKind};
pub use upload::UploadBuffer;
pub use self::wgpu::{WgpuDevice, WgpuDeviceFactory};
