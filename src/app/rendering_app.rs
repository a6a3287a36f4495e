//! 3D 渲染应用
//!
//! `Rendering3DApplication` 持有图形设备、交换链相关资源、静态管线资源、
//! 场景、相机和光源，并实现 `Application` 的完整生命周期：
//!
//! 1. `initialize`：通过 `DeviceFactory` 创建设备，按当前尺寸建立交换链资源
//! 2. `load`：加载着色器，创建常量缓冲区、采样器、纹理、管线和场景
//! 3. `on_resize`：先销毁再重建交换链资源
//! 4. `update` / `render`：推进模拟，写入常量并绘制
//!
//! 释放顺序固定为：管线资源 → 交换链资源 → 设备。

use std::path::Path;

use tracing::{debug, info, warn};

use crate::app::application::Application;
use crate::app::resources::{PipelineResources, SwapchainState};
use crate::core::error::{DistRenderError, Result};
use crate::core::timer::FrameClock;
use crate::core::Config;
use crate::gfx::constants::{CameraConstants, PerFrameConstants, PerObjectConstants};
use crate::gfx::{DepthState, DeviceFactory, DrawCall, Extent2D, FrameStatus, FrameSubmission, GraphicsDevice};
use crate::scene::{Drawable, OrbitCamera, PointLight, Scene};
use crate::shaders::{ShaderCollection, LIT_PROGRAM};

/// 材质/物体常量的初始槽位数
const INITIAL_DRAWABLE_CAPACITY: usize = 64;

/// 生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// 刚创建，尚无设备
    Created,
    /// 设备和交换链资源已就绪
    Initialized,
    /// 所有资源已就绪，可以渲染
    Loaded,
}

/// 3D 渲染应用
pub struct Rendering3DApplication<F: DeviceFactory> {
    pipeline: Option<PipelineResources<F::Device>>,
    swapchain: SwapchainState<F::Device>,
    device: Option<F::Device>,
    factory: F,

    config: Config,
    shaders: ShaderCollection,
    scene: Scene,
    camera: OrbitCamera,
    light: PointLight,
    depth_state: DepthState,

    clock: FrameClock,
    /// 最近一次已知的窗口尺寸；`initialize` 之前的 resize 只记录在这里
    window_extent: Option<Extent2D>,
    drawables: Vec<Drawable>,
    frame_index: u64,
    state: AppState,
}

impl<F: DeviceFactory> Rendering3DApplication<F> {
    pub fn new(config: Config, factory: F) -> Self {
        let scene = Scene::new(&config.pipes);
        let camera = OrbitCamera::from_config(&config.camera);
        let light = PointLight::from_config(&config.light);
        let depth_state = DepthState {
            format: config.graphics.depth_format,
            ..DepthState::default()
        };

        Self {
            pipeline: None,
            swapchain: SwapchainState::Empty,
            device: None,
            factory,
            config,
            shaders: ShaderCollection::new(),
            scene,
            camera,
            light,
            depth_state,
            clock: FrameClock::new(),
            window_extent: None,
            drawables: Vec::new(),
            frame_index: 0,
            state: AppState::Created,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// 渲染目标（交换链）尺寸；尚无设备时为 `None`
    pub fn render_target_extent(&self) -> Option<Extent2D> {
        self.device.as_ref().map(|device| device.swapchain_extent())
    }

    /// 深度目标尺寸；交换链资源不存在时为 `None`
    pub fn depth_target_extent(&self) -> Option<Extent2D> {
        self.swapchain
            .resources()
            .map(|resources| <F::Device as GraphicsDevice>::depth_target_extent(&resources.depth_target))
    }

    pub fn drawable_count(&self) -> usize {
        self.scene.drawable_count()
    }

    /// 已呈现的帧数
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// 材质/物体常量当前的槽位数
    pub fn drawable_capacity(&self) -> Option<usize> {
        self.pipeline.as_ref().map(|p| p.material_upload.capacity())
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// 以给定时间步长推进相机、光源和管道模拟
    pub fn advance(&mut self, dt: f32) {
        self.camera.advance(dt);
        self.light.advance(dt);
        self.scene.advance(dt);
    }
}

impl<F: DeviceFactory> Application for Rendering3DApplication<F> {
    fn initialize(&mut self) -> Result<()> {
        if self.state != AppState::Created {
            return Err(DistRenderError::lifecycle("initialize called more than once"));
        }

        let mut device = self.factory.create_device()?;
        info!(backend = device.backend_name(), "Graphics device created");

        let extent = self.window_extent.unwrap_or_else(|| device.swapchain_extent());
        self.swapchain = if extent.is_empty() {
            info!("Window has zero size, rendering suspended");
            SwapchainState::Suspended
        } else {
            SwapchainState::build(&mut device, extent, self.depth_state)?
        };

        self.window_extent = Some(extent);
        self.camera.set_aspect(extent.aspect());
        self.device = Some(device);
        self.state = AppState::Initialized;

        info!(width = extent.width, height = extent.height, "Application initialized");
        Ok(())
    }

    fn load(&mut self) -> Result<()> {
        match self.state {
            AppState::Created => return Err(DistRenderError::lifecycle("load called before initialize")),
            AppState::Loaded => return Err(DistRenderError::lifecycle("load called more than once")),
            AppState::Initialized => {}
        }
        let device = self
            .device
            .as_mut()
            .ok_or_else(|| DistRenderError::lifecycle("load called without a device"))?;

        // 1. 着色器
        let shader_dir = self.config.graphics.shader_dir.as_deref().map(Path::new);
        self.shaders = ShaderCollection::load(shader_dir)?;
        let program = self.shaders.get(LIT_PROGRAM)?;

        // 2. 场景
        let scene = Scene::with_default_objects(&self.config.pipes);
        let capacity = INITIAL_DRAWABLE_CAPACITY.max(scene.drawable_count());

        // 3. 静态资源
        let resources =
            PipelineResources::create(device, program, &self.config.graphics, self.depth_state, capacity)?;

        self.scene = scene;
        self.pipeline = Some(resources);
        self.state = AppState::Loaded;

        info!(
            objects = self.scene.objects().len(),
            shaders = self.shaders.len(),
            "Application loaded"
        );
        Ok(())
    }

    fn on_resize(&mut self, width: u32, height: u32) -> Result<()> {
        let extent = Extent2D::new(width, height);

        let Some(device) = self.device.as_mut() else {
            debug!(width, height, "Resize before initialize, size recorded");
            self.window_extent = Some(extent);
            return Ok(());
        };

        if extent.is_empty() {
            if !self.swapchain.is_suspended() {
                self.swapchain.teardown();
                self.swapchain = SwapchainState::Suspended;
                info!("Window minimized, rendering suspended");
            }
            self.window_extent = Some(extent);
            return Ok(());
        }

        if let Some(resources) = self.swapchain.resources() {
            if resources.extent == extent {
                return Ok(());
            }
        }

        debug!(width, height, "Rebuilding swapchain resources");
        self.swapchain.teardown();
        self.swapchain = SwapchainState::build(device, extent, self.depth_state)?;
        self.window_extent = Some(extent);
        self.camera.set_aspect(extent.aspect());
        Ok(())
    }

    fn update(&mut self) {
        let dt = self.clock.tick();
        self.advance(dt);
    }

    fn render(&mut self) -> Result<()> {
        let (Some(device), Some(pipeline)) = (self.device.as_mut(), self.pipeline.as_mut()) else {
            return Err(DistRenderError::lifecycle("render called before load"));
        };
        let swapchain = match &self.swapchain {
            SwapchainState::Ready(resources) => resources,
            SwapchainState::Suspended => return Ok(()),
            SwapchainState::Empty => {
                return Err(DistRenderError::lifecycle("render called without swapchain resources"));
            }
        };

        // 1. 收集绘制项，必要时扩容
        self.scene.collect_drawables(&mut self.drawables);
        pipeline.ensure_capacity(device, self.drawables.len())?;

        // 2. 每帧常量
        let per_frame = PerFrameConstants::new(&self.camera.view_projection());
        let camera = CameraConstants::new(&self.camera.position());
        let light = self.light.to_constants();
        device.write_buffer(&pipeline.buffers.per_frame, 0, bytemuck::bytes_of(&per_frame));
        device.write_buffer(&pipeline.buffers.camera, 0, bytemuck::bytes_of(&camera));
        device.write_buffer(&pipeline.buffers.light, 0, bytemuck::bytes_of(&light));

        // 3. 材质和物体常量
        for (slot, drawable) in self.drawables.iter().enumerate() {
            pipeline.material_upload.write(slot, &drawable.material.to_constants());
            pipeline
                .object_upload
                .write(slot, &PerObjectConstants::from_model(&drawable.model));
        }
        let count = self.drawables.len();
        if count > 0 {
            device.write_buffer(&pipeline.buffers.material, 0, pipeline.material_upload.bytes(count));
            device.write_buffer(&pipeline.buffers.per_object, 0, pipeline.object_upload.bytes(count));
        }

        // 4. 绘制
        let pipeline = &*pipeline;
        let draws: Vec<DrawCall<'_, F::Device>> = self
            .drawables
            .iter()
            .enumerate()
            .filter_map(|(slot, drawable)| {
                pipeline.meshes.get(&drawable.mesh).map(|mesh| DrawCall {
                    mesh,
                    material_offset: pipeline.material_upload.offset_of(slot) as u32,
                    object_offset: pipeline.object_upload.offset_of(slot) as u32,
                })
            })
            .collect();

        let status = device.submit_frame(&FrameSubmission {
            pipeline: &pipeline.pipeline,
            bindings: &pipeline.bindings,
            depth_target: &swapchain.depth_target,
            clear_color: self.config.graphics.clear_color,
            draws: &draws,
        })?;

        match status {
            FrameStatus::Presented => self.frame_index += 1,
            FrameStatus::Skipped => warn!(frame = self.frame_index, "Frame skipped"),
        }
        Ok(())
    }

    /// 窗口尺寸为 0 时暂停渲染
    fn is_suspended(&self) -> bool {
        self.swapchain.is_suspended()
    }
}

impl<F: DeviceFactory> Drop for Rendering3DApplication<F> {
    fn drop(&mut self) {
        self.pipeline = None;
        self.swapchain.teardown();
        self.device = None;
        debug!(frames = self.frame_index, "Application resources released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{DepthFormat, HeadlessDeviceFactory};

    fn app() -> Rendering3DApplication<HeadlessDeviceFactory> {
        Rendering3DApplication::new(Config::default(), HeadlessDeviceFactory::new(Extent2D::new(320, 240)))
    }

    #[test]
    fn test_state_transitions() {
        let mut app = app();
        assert_eq!(app.state(), AppState::Created);
        app.initialize().unwrap();
        assert_eq!(app.state(), AppState::Initialized);
        app.load().unwrap();
        assert_eq!(app.state(), AppState::Loaded);
        assert!(app.initialize().is_err());
        assert!(app.load().is_err());
    }

    #[test]
    fn test_render_writes_constants() {
        let mut app = app();
        let monitor = app.factory().monitor();
        app.initialize().unwrap();
        app.load().unwrap();
        app.render().unwrap();

        assert_eq!(monitor.buffer_writes("PerFrame Constants"), 1);
        assert_eq!(monitor.buffer_writes("Camera Constants"), 1);
        assert_eq!(monitor.buffer_writes("Light Constants"), 1);
        assert_eq!(monitor.buffer_writes("Material Constants"), 1);
        assert_eq!(monitor.buffer_writes("PerObject Constants"), 1);

        let frame = monitor.last_frame().unwrap();
        assert_eq!(frame.draw_count, app.drawable_count());
        assert_eq!(frame.clear_color, Config::default().graphics.clear_color);
        assert_eq!(frame.object_offsets[1], 256);
    }

    #[test]
    fn test_depth_format_follows_config() {
        let mut config = Config::default();
        config.graphics.depth_format = DepthFormat::Depth24PlusStencil8;
        let mut app = Rendering3DApplication::new(config, HeadlessDeviceFactory::new(Extent2D::new(64, 64)));
        app.initialize().unwrap();

        let resources = app.swapchain.resources().unwrap();
        assert_eq!(resources.depth_state.format, DepthFormat::Depth24PlusStencil8);
        assert_eq!(resources.depth_target.state.format, DepthFormat::Depth24PlusStencil8);

        app.on_resize(128, 64).unwrap();
        let resources = app.swapchain.resources().unwrap();
        assert_eq!(resources.depth_target.state.format, DepthFormat::Depth24PlusStencil8);
    }

    #[test]
    fn test_resize_updates_camera_aspect() {
        let mut app = app();
        app.initialize().unwrap();
        app.on_resize(800, 400).unwrap();
        assert_eq!(app.camera().aspect(), 2.0);
    }

    #[test]
    fn test_upload_buffers_grow_with_scene() {
        let mut app = app();
        app.initialize().unwrap();
        app.load().unwrap();
        assert_eq!(app.drawable_capacity(), Some(INITIAL_DRAWABLE_CAPACITY));

        for _ in 0..40 {
            app.advance(0.25);
        }
        assert!(app.drawable_count() > INITIAL_DRAWABLE_CAPACITY);
        app.render().unwrap();
        assert!(app.drawable_capacity().unwrap() >= app.drawable_count());
    }
}
