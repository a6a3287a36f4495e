//! 图形设备的统一抽象接口
//!
//! 应用程序只通过 `GraphicsDevice` 与底层图形 API 交互。
//! 资源句柄是关联类型，由具体后端决定；句柄的所有权归调用方，
//! 离开作用域即释放。
//!
//! # 后端
//!
//! - `WgpuDevice`：基于 wgpu 的窗口渲染后端
//! - `HeadlessDevice`：不创建 GPU 对象的记录后端，用于测试和无窗口运行

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::geometry::MeshData;
use crate::shaders::ShaderProgram;

/// 二维尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 任一维度为 0（例如窗口最小化）
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// 宽高比；空尺寸返回 1.0
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// 背面剔除模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// 填充模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Solid,
    Wireframe,
}

/// 光栅化状态，创建后不可变
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterState {
    pub cull_mode: CullMode,
    pub fill_mode: FillMode,
    /// 逆时针为正面
    pub front_ccw: bool,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            fill_mode: FillMode::Solid,
            front_ccw: true,
        }
    }
}

/// 深度缓冲格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthFormat {
    Depth32Float,
    Depth24PlusStencil8,
}

/// 深度状态，随深度目标一起重建
///
/// 深度测试固定为 less。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub write_enabled: bool,
    pub format: DepthFormat,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            write_enabled: true,
            format: DepthFormat::Depth32Float,
        }
    }
}

/// 纹理过滤方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// 纹理寻址方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    Repeat,
    ClampToEdge,
}

/// 采样器描述，默认线性过滤 + 重复寻址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDesc {
    pub filter: FilterMode,
    pub address: AddressMode,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            filter: FilterMode::Linear,
            address: AddressMode::Repeat,
        }
    }
}

/// 渲染管线描述
pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub program: &'a ShaderProgram,
    pub raster: RasterState,
    pub depth: DepthState,
}

/// 动态偏移的常量缓冲区绑定：缓冲区 + 单个元素的大小
pub struct DynamicBinding<'a, B> {
    pub buffer: &'a B,
    pub element_size: u64,
}

/// 资源绑定描述，布局见 `lit.wgsl`
pub struct BindingsDesc<'a, D: GraphicsDevice> {
    pub per_frame: &'a D::Buffer,
    pub camera: &'a D::Buffer,
    pub light: &'a D::Buffer,
    pub material: DynamicBinding<'a, D::Buffer>,
    pub per_object: DynamicBinding<'a, D::Buffer>,
    pub texture: &'a D::Texture,
    pub sampler: &'a D::Sampler,
}

/// 一次绘制：网格 + 两个动态偏移（材质、物体）
pub struct DrawCall<'a, D: GraphicsDevice> {
    pub mesh: &'a D::Mesh,
    pub material_offset: u32,
    pub object_offset: u32,
}

/// 一帧的提交内容
pub struct FrameSubmission<'a, D: GraphicsDevice> {
    pub pipeline: &'a D::Pipeline,
    pub bindings: &'a D::Bindings,
    pub depth_target: &'a D::DepthTarget,
    pub clear_color: [f32; 4],
    pub draws: &'a [DrawCall<'a, D>],
}

/// 一帧的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// 已呈现
    Presented,
    /// 交换链暂不可用（过期、超时），本帧被跳过
    Skipped,
}

/// 图形设备接口
///
/// 对应 D3D11 的 device + immediate context + swapchain 三件套。
/// 交换链由设备持有，尺寸相关的深度目标由调用方持有。
pub trait GraphicsDevice {
    type Buffer;
    type Texture;
    type Sampler;
    type DepthTarget;
    type Pipeline;
    type Bindings;
    type Mesh;

    /// 后端名称，用于日志输出
    fn backend_name(&self) -> &str;

    /// 当前交换链（渲染目标）尺寸
    fn swapchain_extent(&self) -> Extent2D;

    /// 调整交换链尺寸。调用方保证尺寸非空
    fn resize_swapchain(&mut self, extent: Extent2D) -> Result<()>;

    /// 创建深度目标
    fn create_depth_target(&mut self, extent: Extent2D, state: &DepthState) -> Result<Self::DepthTarget>;

    /// 深度目标尺寸
    fn depth_target_extent(target: &Self::DepthTarget) -> Extent2D;

    /// 创建可写入的 uniform 缓冲区
    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> Result<Self::Buffer>;

    /// 写入缓冲区
    fn write_buffer(&mut self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    /// 上传网格（顶点 + 索引缓冲）
    fn create_mesh(&mut self, mesh: &MeshData) -> Result<Self::Mesh>;

    /// 创建 RGBA8 纹理并上传像素
    fn create_texture_rgba8(&mut self, label: &str, width: u32, height: u32, pixels: &[u8]) -> Result<Self::Texture>;

    /// 创建采样器
    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Self::Sampler>;

    /// 编译着色器并创建渲染管线
    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<Self::Pipeline>;

    /// 创建与管线布局匹配的资源绑定
    fn create_bindings(&mut self, pipeline: &Self::Pipeline, desc: &BindingsDesc<'_, Self>) -> Result<Self::Bindings>
    where
        Self: Sized;

    /// 清屏、执行绘制并呈现
    fn submit_frame(&mut self, frame: &FrameSubmission<'_, Self>) -> Result<FrameStatus>
    where
        Self: Sized;
}

/// 设备工厂
///
/// `Rendering3DApplication::initialize` 通过它创建设备，
/// 使应用逻辑与窗口/后端的创建方式解耦。
pub trait DeviceFactory {
    type Device: GraphicsDevice;

    fn create_device(&mut self) -> Result<Self::Device>;
}
