//! wgpu 后端设备管理
//!
//! 本模块负责 wgpu 图形设备的初始化和管理，包括：
//! - 创建 wgpu 实例
//! - 创建窗口表面
//! - 选择和创建图形适配器
//! - 创建逻辑设备和命令队列
//! - 配置交换链

use std::sync::Arc;
use tracing::{debug, error, info};
use winit::window::Window;

use crate::core::config::GraphicsConfig;
use crate::core::error::{GraphicsError, Result};
use crate::gfx::device::{DeviceFactory, Extent2D};

/// wgpu 图形设备
///
/// 封装了 wgpu 的核心设备和表面管理，资源创建与提交见 `device.rs`。
pub struct WgpuDevice {
    /// 窗口表面（交换链）
    pub(super) surface: wgpu::Surface<'static>,
    /// 图形适配器（GPU）
    pub(super) adapter: wgpu::Adapter,
    /// 逻辑设备
    pub(super) device: wgpu::Device,
    /// 命令队列
    pub(super) queue: wgpu::Queue,
    /// 表面配置
    pub(super) surface_config: wgpu::SurfaceConfiguration,
    /// wgpu 实例（入口点）
    _instance: wgpu::Instance,
    /// 窗口引用，表面的生命周期依赖它
    _window: Arc<Window>,
}

impl WgpuDevice {
    /// 创建 wgpu 设备
    ///
    /// # 参数
    ///
    /// * `window` - 已创建的窗口
    /// * `config` - 图形配置
    pub fn new(window: Arc<Window>, config: &GraphicsConfig) -> Result<Self> {
        info!("Initializing wgpu backend");

        // 1. 创建 wgpu 实例
        debug!("Creating wgpu instance");
        let flags = if config.debug_layer {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::default()
        };
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(), // 支持所有后端（Vulkan, Metal, DX12, OpenGL）
            dx12_shader_compiler: Default::default(),
            flags,
            gles_minor_version: wgpu::Gles3MinorVersion::Automatic,
        });

        // 2. 创建表面
        debug!("Creating surface");
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| GraphicsError::DeviceCreation(format!("Failed to create surface: {}", e)))?;

        // 3. 请求适配器（选择 GPU）
        debug!("Requesting adapter");
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance, // 优先选择高性能 GPU
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| GraphicsError::DeviceCreation("Failed to find suitable adapter".to_string()))?;

        info!("Selected adapter: {:?}", adapter.get_info());

        // 4. 请求设备和队列
        debug!("Requesting device and queue");
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Main Device"),
                required_features: adapter.features() & wgpu::Features::POLYGON_MODE_LINE,
                required_limits: wgpu::Limits::default(),
            },
            None, // 不跟踪 API 调用
        ))
        .map_err(|e| GraphicsError::DeviceCreation(format!("Failed to create device: {}", e)))?;

        device.on_uncaptured_error(Box::new(|e| {
            error!("Uncaptured wgpu error: {}", e);
        }));

        // 5. 配置表面
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb()) // 优先选择 sRGB 格式
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| GraphicsError::DeviceCreation("Surface reports no formats".to_string()))?;

        debug!("Surface format: {:?}", surface_format);

        let present_mode = if config.vsync {
            wgpu::PresentMode::Fifo // 垂直同步
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        info!(
            width = surface_config.width,
            height = surface_config.height,
            "wgpu backend initialized successfully"
        );

        Ok(Self {
            surface,
            adapter,
            device,
            queue,
            surface_config,
            _instance: instance,
            _window: window,
        })
    }

    /// 当前表面尺寸
    pub(super) fn surface_extent(&self) -> Extent2D {
        Extent2D::new(self.surface_config.width, self.surface_config.height)
    }

    /// 重新配置表面（用于窗口调整）
    pub(super) fn reconfigure_surface(&mut self, width: u32, height: u32) {
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// 交换链颜色格式
    pub(super) fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// 适配器是否支持线框模式
    pub(super) fn supports_wireframe(&self) -> bool {
        self.adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE)
    }
}

/// wgpu 设备工厂：持有窗口和图形配置，在 `initialize` 时创建设备
pub struct WgpuDeviceFactory {
    window: Arc<Window>,
    config: GraphicsConfig,
}

impl WgpuDeviceFactory {
    pub fn new(window: Arc<Window>, config: GraphicsConfig) -> Self {
        Self { window, config }
    }
}

impl DeviceFactory for WgpuDeviceFactory {
    type Device = WgpuDevice;

    fn create_device(&mut self) -> Result<Self::Device> {
        WgpuDevice::new(self.window.clone(), &self.config)
    }
}
