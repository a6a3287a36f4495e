//! 无窗口记录后端
//!
//! 不创建任何 GPU 对象，只记录资源的创建、释放和每帧的提交内容。
//! 每个句柄都携带一个计数守卫，句柄被 drop 时活跃计数减一，
//! 因此可以检查重建交换链资源或销毁应用之后是否有泄漏。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use super::device::{
    BindingsDesc, DepthState, DeviceFactory, Extent2D, FrameStatus, FrameSubmission,
    GraphicsDevice, PipelineDesc, RasterState, SamplerDesc,
};
use crate::core::error::{GraphicsError, Result};
use crate::geometry::MeshData;

/// 资源种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Device,
    Buffer,
    Texture,
    Sampler,
    DepthTarget,
    Pipeline,
    Bindings,
    Mesh,
}

/// 最近一次提交的帧
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub extent: Extent2D,
    pub clear_color: [f32; 4],
    pub draw_count: usize,
    pub index_count: u64,
    pub material_offsets: Vec<u32>,
    pub object_offsets: Vec<u32>,
}

#[derive(Debug, Default)]
struct HeadlessStats {
    live: BTreeMap<ResourceKind, usize>,
    created: BTreeMap<ResourceKind, usize>,
    buffer_writes: BTreeMap<String, usize>,
    swapchain_resizes: usize,
    frames_presented: u64,
    last_frame: Option<FrameRecord>,
    last_raster: Option<RasterState>,
    last_sampler: Option<SamplerDesc>,
    failing_buffer: Option<String>,
}

/// 观察无窗口设备状态的监视器，可在设备被 drop 之后继续使用
#[derive(Debug, Clone, Default)]
pub struct HeadlessMonitor {
    stats: Rc<RefCell<HeadlessStats>>,
}

impl HeadlessMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某类资源当前存活的数量
    pub fn live(&self, kind: ResourceKind) -> usize {
        self.stats.borrow().live.get(&kind).copied().unwrap_or(0)
    }

    /// 所有存活资源的数量（包括设备本身）
    pub fn live_total(&self) -> usize {
        self.stats.borrow().live.values().sum()
    }

    /// 某类资源累计创建的数量
    pub fn created(&self, kind: ResourceKind) -> usize {
        self.stats.borrow().created.get(&kind).copied().unwrap_or(0)
    }

    /// 按标签统计的缓冲区写入次数
    pub fn buffer_writes(&self, label: &str) -> usize {
        self.stats.borrow().buffer_writes.get(label).copied().unwrap_or(0)
    }

    pub fn swapchain_resizes(&self) -> usize {
        self.stats.borrow().swapchain_resizes
    }

    pub fn frames_presented(&self) -> u64 {
        self.stats.borrow().frames_presented
    }

    pub fn last_frame(&self) -> Option<FrameRecord> {
        self.stats.borrow().last_frame.clone()
    }

    /// 最近创建的管线的光栅化状态
    pub fn last_raster(&self) -> Option<RasterState> {
        self.stats.borrow().last_raster
    }

    /// 最近创建的采样器描述
    pub fn last_sampler(&self) -> Option<SamplerDesc> {
        self.stats.borrow().last_sampler
    }

    /// 之后创建该标签的缓冲区都会失败，模拟显存不足
    pub fn fail_buffers_labelled(&self, label: impl Into<String>) {
        self.stats.borrow_mut().failing_buffer = Some(label.into());
    }

    pub fn clear_failures(&self) {
        self.stats.borrow_mut().failing_buffer = None;
    }

    fn guard(&self, kind: ResourceKind) -> LiveGuard {
        let mut stats = self.stats.borrow_mut();
        *stats.live.entry(kind).or_default() += 1;
        *stats.created.entry(kind).or_default() += 1;
        LiveGuard {
            kind,
            stats: Rc::clone(&self.stats),
        }
    }
}

/// 句柄 drop 时减少活跃计数
#[derive(Debug)]
struct LiveGuard {
    kind: ResourceKind,
    stats: Rc<RefCell<HeadlessStats>>,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        if let Some(count) = self.stats.borrow_mut().live.get_mut(&self.kind) {
            *count = count.saturating_sub(1);
        }
    }
}

/// 通用资源句柄
#[derive(Debug)]
pub struct HeadlessResource {
    pub label: String,
    _guard: LiveGuard,
}

/// 深度目标句柄
#[derive(Debug)]
pub struct HeadlessDepthTarget {
    pub extent: Extent2D,
    pub state: DepthState,
    _guard: LiveGuard,
}

/// 网格句柄
#[derive(Debug)]
pub struct HeadlessMesh {
    pub index_count: u32,
    _guard: LiveGuard,
}

/// 缓冲区句柄
#[derive(Debug)]
pub struct HeadlessBuffer {
    pub label: String,
    pub size: u64,
    _guard: LiveGuard,
}

/// 无窗口设备
#[derive(Debug)]
pub struct HeadlessDevice {
    monitor: HeadlessMonitor,
    extent: Extent2D,
    _guard: LiveGuard,
}

impl HeadlessDevice {
    pub fn new(monitor: HeadlessMonitor, extent: Extent2D) -> Self {
        let guard = monitor.guard(ResourceKind::Device);
        Self {
            monitor,
            extent,
            _guard: guard,
        }
    }

    pub fn monitor(&self) -> &HeadlessMonitor {
        &self.monitor
    }

    fn resource(&self, kind: ResourceKind, label: &str) -> HeadlessResource {
        HeadlessResource {
            label: label.to_string(),
            _guard: self.monitor.guard(kind),
        }
    }
}

impl GraphicsDevice for HeadlessDevice {
    type Buffer = HeadlessBuffer;
    type Texture = HeadlessResource;
    type Sampler = HeadlessResource;
    type DepthTarget = HeadlessDepthTarget;
    type Pipeline = HeadlessResource;
    type Bindings = HeadlessResource;
    type Mesh = HeadlessMesh;

    fn backend_name(&self) -> &str {
        "headless"
    }

    fn swapchain_extent(&self) -> Extent2D {
        self.extent
    }

    fn resize_swapchain(&mut self, extent: Extent2D) -> Result<()> {
        if extent.is_empty() {
            return Err(GraphicsError::SwapchainError(format!(
                "cannot resize swapchain to {}x{}",
                extent.width, extent.height
            ))
            .into());
        }
        self.extent = extent;
        self.monitor.stats.borrow_mut().swapchain_resizes += 1;
        Ok(())
    }

    fn create_depth_target(&mut self, extent: Extent2D, state: &DepthState) -> Result<Self::DepthTarget> {
        if extent.is_empty() {
            return Err(GraphicsError::ResourceCreation("depth target with zero extent".into()).into());
        }
        Ok(HeadlessDepthTarget {
            extent,
            state: *state,
            _guard: self.monitor.guard(ResourceKind::DepthTarget),
        })
    }

    fn depth_target_extent(target: &Self::DepthTarget) -> Extent2D {
        target.extent
    }

    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> Result<Self::Buffer> {
        if size == 0 {
            return Err(GraphicsError::ResourceCreation(format!("buffer '{}' has zero size", label)).into());
        }
        if self.monitor.stats.borrow().failing_buffer.as_deref() == Some(label) {
            return Err(GraphicsError::ResourceCreation(format!("out of memory creating '{}'", label)).into());
        }
        Ok(HeadlessBuffer {
            label: label.to_string(),
            size,
            _guard: self.monitor.guard(ResourceKind::Buffer),
        })
    }

    fn write_buffer(&mut self, buffer: &Self::Buffer, offset: u64, data: &[u8]) {
        debug_assert!(offset + data.len() as u64 <= buffer.size, "write past end of '{}'", buffer.label);
        *self
            .monitor
            .stats
            .borrow_mut()
            .buffer_writes
            .entry(buffer.label.clone())
            .or_default() += 1;
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> Result<Self::Mesh> {
        mesh.validate()?;
        Ok(HeadlessMesh {
            index_count: mesh.index_count() as u32,
            _guard: self.monitor.guard(ResourceKind::Mesh),
        })
    }

    fn create_texture_rgba8(&mut self, label: &str, width: u32, height: u32, pixels: &[u8]) -> Result<Self::Texture> {
        if pixels.len() != (width * height * 4) as usize {
            return Err(GraphicsError::ResourceCreation(format!(
                "texture '{}' expects {} bytes, got {}",
                label,
                width * height * 4,
                pixels.len()
            ))
            .into());
        }
        Ok(self.resource(ResourceKind::Texture, label))
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Self::Sampler> {
        self.monitor.stats.borrow_mut().last_sampler = Some(*desc);
        Ok(self.resource(ResourceKind::Sampler, "Sampler"))
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<Self::Pipeline> {
        desc.program.validate()?;
        self.monitor.stats.borrow_mut().last_raster = Some(desc.raster);
        Ok(self.resource(ResourceKind::Pipeline, desc.label))
    }

    fn create_bindings(&mut self, _pipeline: &Self::Pipeline, desc: &BindingsDesc<'_, Self>) -> Result<Self::Bindings> {
        for dynamic in [&desc.material, &desc.per_object] {
            if dynamic.element_size > dynamic.buffer.size {
                return Err(GraphicsError::ResourceCreation(format!(
                    "binding of '{}' larger than the buffer",
                    dynamic.buffer.label
                ))
                .into());
            }
        }
        Ok(self.resource(ResourceKind::Bindings, "Bindings"))
    }

    fn submit_frame(&mut self, frame: &FrameSubmission<'_, Self>) -> Result<FrameStatus> {
        // 深度目标必须与渲染目标同尺寸
        if frame.depth_target.extent != self.extent {
            return Err(GraphicsError::SwapchainError(format!(
                "depth target {}x{} does not match render target {}x{}",
                frame.depth_target.extent.width,
                frame.depth_target.extent.height,
                self.extent.width,
                self.extent.height
            ))
            .into());
        }

        let record = FrameRecord {
            extent: self.extent,
            clear_color: frame.clear_color,
            draw_count: frame.draws.len(),
            index_count: frame.draws.iter().map(|d| d.mesh.index_count as u64).sum(),
            material_offsets: frame.draws.iter().map(|d| d.material_offset).collect(),
            object_offsets: frame.draws.iter().map(|d| d.object_offset).collect(),
        };

        debug!(draws = record.draw_count, "Headless frame submitted");

        let mut stats = self.monitor.stats.borrow_mut();
        stats.frames_presented += 1;
        stats.last_frame = Some(record);
        Ok(FrameStatus::Presented)
    }
}

/// 无窗口设备工厂
#[derive(Debug, Clone)]
pub struct HeadlessDeviceFactory {
    monitor: HeadlessMonitor,
    extent: Extent2D,
    failure: Option<String>,
}

impl HeadlessDeviceFactory {
    pub fn new(extent: Extent2D) -> Self {
        Self {
            monitor: HeadlessMonitor::new(),
            extent,
            failure: None,
        }
    }

    /// 创建设备时总是失败的工厂，模拟没有可用适配器
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new(Extent2D::new(1, 1))
        }
    }

    pub fn monitor(&self) -> HeadlessMonitor {
        self.monitor.clone()
    }
}

impl DeviceFactory for HeadlessDeviceFactory {
    type Device = HeadlessDevice;

    fn create_device(&mut self) -> Result<Self::Device> {
        if let Some(reason) = &self.failure {
            return Err(GraphicsError::DeviceCreation(reason.clone()).into());
        }
        Ok(HeadlessDevice::new(self.monitor.clone(), self.extent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards_track_live_resources() {
        let monitor = HeadlessMonitor::new();
        let mut device = HeadlessDevice::new(monitor.clone(), Extent2D::new(4, 4));
        assert_eq!(monitor.live(ResourceKind::Device), 1);

        let buffer = device.create_uniform_buffer("test", 64).unwrap();
        let depth = device
            .create_depth_target(Extent2D::new(4, 4), &DepthState::default())
            .unwrap();
        assert_eq!(monitor.live_total(), 3);

        drop(buffer);
        drop(depth);
        assert_eq!(monitor.live_total(), 1);
        assert_eq!(monitor.created(ResourceKind::Buffer), 1);

        drop(device);
        assert_eq!(monitor.live_total(), 0);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let mut device = HeadlessDevice::new(HeadlessMonitor::new(), Extent2D::new(4, 4));
        assert!(device.resize_swapchain(Extent2D::new(0, 4)).is_err());
        assert!(device.create_uniform_buffer("empty", 0).is_err());
        assert!(device.create_texture_rgba8("tex", 2, 2, &[0; 15]).is_err());
        assert!(device.create_mesh(&MeshData::new()).is_err());
    }

    #[test]
    fn test_injected_buffer_failure() {
        let monitor = HeadlessMonitor::new();
        let mut device = HeadlessDevice::new(monitor.clone(), Extent2D::new(4, 4));

        monitor.fail_buffers_labelled("big");
        assert!(device.create_uniform_buffer("big", 64).is_err());
        assert!(device.create_uniform_buffer("small", 64).is_ok());
        assert_eq!(monitor.created(ResourceKind::Buffer), 1);

        monitor.clear_failures();
        assert!(device.create_uniform_buffer("big", 64).is_ok());
    }

    #[test]
    fn test_failing_factory() {
        let mut factory = HeadlessDeviceFactory::failing("no adapter");
        let err = factory.create_device().unwrap_err();
        assert!(err.to_string().contains("no adapter"));
        assert_eq!(factory.monitor().live_total(), 0);
    }
}
