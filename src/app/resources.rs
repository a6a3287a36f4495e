//! 渲染资源
//!
//! - `SwapchainState`：与窗口尺寸相关的资源（深度目标与深度状态），
//!   尺寸变化时先整体销毁再按新尺寸重建
//! - `PipelineResources`：在 `load` 中创建一次的静态资源
//!   （光栅化状态、常量缓冲区、采样器、纹理、管线、绑定、图元网格）

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::core::config::GraphicsConfig;
use crate::core::error::{GraphicsError, Result};
use crate::geometry::PrimitiveKind;
use crate::gfx::constants::{ConstantSlot, MaterialConstants, PerObjectConstants};
use crate::gfx::{
    BindingsDesc, DepthState, DynamicBinding, Extent2D, FillMode, GraphicsDevice, PipelineDesc, RasterState,
    SamplerDesc, UploadBuffer,
};
use crate::shaders::ShaderProgram;

/// 回退纹理边长（像素）
const FALLBACK_TEXTURE_SIZE: u32 = 64;

/// 回退纹理棋盘格边长（像素）
const FALLBACK_CHECKER_SIZE: u32 = 8;

/// 与窗口尺寸相关的资源
pub struct SwapchainResources<D: GraphicsDevice> {
    pub extent: Extent2D,
    pub depth_target: D::DepthTarget,
    pub depth_state: DepthState,
}

/// 交换链状态
pub enum SwapchainState<D: GraphicsDevice> {
    /// 尚未创建，或已销毁等待重建
    Empty,
    /// 资源与当前窗口尺寸一致
    Ready(SwapchainResources<D>),
    /// 窗口尺寸为 0，渲染暂停
    Suspended,
}

impl<D: GraphicsDevice> SwapchainState<D> {
    /// 第一阶段：释放所有尺寸相关资源
    pub fn teardown(&mut self) {
        if let SwapchainState::Ready(resources) = std::mem::replace(self, SwapchainState::Empty) {
            debug!(
                width = resources.extent.width,
                height = resources.extent.height,
                "Swapchain resources released"
            );
        }
    }

    /// 第二阶段：按新尺寸调整交换链并创建深度目标
    pub fn build(device: &mut D, extent: Extent2D, depth_state: DepthState) -> Result<Self> {
        if device.swapchain_extent() != extent {
            device.resize_swapchain(extent)?;
        }
        let depth_target = device.create_depth_target(extent, &depth_state)?;
        debug!(width = extent.width, height = extent.height, "Swapchain resources built");
        Ok(SwapchainState::Ready(SwapchainResources {
            extent,
            depth_target,
            depth_state,
        }))
    }

    pub fn resources(&self) -> Option<&SwapchainResources<D>> {
        match self {
            SwapchainState::Ready(resources) => Some(resources),
            _ => None,
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, SwapchainState::Suspended)
    }
}

/// 常量缓冲区：每帧、相机、光源各一个元素，材质和物体按槽位数组
pub struct ConstantBuffers<D: GraphicsDevice> {
    pub per_frame: D::Buffer,
    pub camera: D::Buffer,
    pub light: D::Buffer,
    pub material: D::Buffer,
    pub per_object: D::Buffer,
}

/// 在 `load` 中创建的静态资源
///
/// 字段按释放顺序排列：绑定先于其引用的缓冲区和纹理释放。
pub struct PipelineResources<D: GraphicsDevice> {
    pub bindings: D::Bindings,
    pub pipeline: D::Pipeline,
    pub buffers: ConstantBuffers<D>,
    pub material_upload: UploadBuffer<MaterialConstants>,
    pub object_upload: UploadBuffer<PerObjectConstants>,
    pub sampler: D::Sampler,
    pub primary_texture: Option<D::Texture>,
    pub fallback_texture: D::Texture,
    pub meshes: BTreeMap<PrimitiveKind, D::Mesh>,
    pub raster: RasterState,
}

impl<D: GraphicsDevice> PipelineResources<D> {
    /// 创建全部静态资源
    ///
    /// # 参数
    ///
    /// * `device` - 图形设备
    /// * `program` - 光照着色器
    /// * `graphics` - 图形配置（光栅化、采样器、纹理路径）
    /// * `depth_state` - 与深度目标一致的深度状态
    /// * `capacity` - 材质/物体常量的初始槽位数
    pub fn create(
        device: &mut D,
        program: &ShaderProgram,
        graphics: &GraphicsConfig,
        depth_state: DepthState,
        capacity: usize,
    ) -> Result<Self> {
        // 1. 光栅化状态
        let raster = RasterState {
            cull_mode: graphics.cull_mode,
            fill_mode: if graphics.wireframe {
                FillMode::Wireframe
            } else {
                FillMode::Solid
            },
            ..RasterState::default()
        };

        // 2. 常量缓冲区
        let material_upload = UploadBuffer::<MaterialConstants>::new(capacity);
        let object_upload = UploadBuffer::<PerObjectConstants>::new(capacity);
        let buffers = ConstantBuffers {
            per_frame: uniform(device, ConstantSlot::PerFrame, ConstantSlot::PerFrame.size())?,
            camera: uniform(device, ConstantSlot::Camera, ConstantSlot::Camera.size())?,
            light: uniform(device, ConstantSlot::Light, ConstantSlot::Light.size())?,
            material: uniform(device, ConstantSlot::Material, material_upload.total_size())?,
            per_object: uniform(device, ConstantSlot::PerObject, object_upload.total_size())?,
        };

        // 3. 采样器
        let sampler = device.create_sampler(&SamplerDesc {
            filter: graphics.texture_filter,
            address: graphics.texture_address,
        })?;

        // 4. 纹理：回退纹理总是创建，主纹理加载失败不影响运行
        let fallback_texture = create_fallback_texture(device)?;
        let primary_texture = match graphics.texture_path.as_deref() {
            Some(path) => load_primary_texture(device, Path::new(path)),
            None => None,
        };

        // 5. 管线
        let pipeline = device.create_pipeline(&PipelineDesc {
            label: "Lit Pipeline",
            program,
            raster,
            depth: depth_state,
        })?;

        // 6. 绑定
        let texture = primary_texture.as_ref().unwrap_or(&fallback_texture);
        let bindings = bind(
            device,
            &pipeline,
            &buffers,
            (&buffers.material, &buffers.per_object),
            texture,
            &sampler,
        )?;

        // 7. 图元网格
        let mut meshes = BTreeMap::new();
        for kind in PrimitiveKind::ALL {
            meshes.insert(kind, device.create_mesh(&kind.build())?);
        }

        info!(
            capacity = material_upload.capacity(),
            textured = primary_texture.is_some(),
            "Pipeline resources created"
        );

        Ok(Self {
            bindings,
            pipeline,
            buffers,
            material_upload,
            object_upload,
            sampler,
            primary_texture,
            fallback_texture,
            meshes,
            raster,
        })
    }

    /// 当前绑定的纹理
    pub fn texture(&self) -> &D::Texture {
        self.primary_texture.as_ref().unwrap_or(&self.fallback_texture)
    }

    /// 确保材质/物体常量至少有 `required` 个槽位
    ///
    /// 扩容时重新创建两个动态缓冲区和绑定，返回 `true`。
    /// 新资源全部创建成功后才替换旧资源，失败时容量和绑定保持不变。
    pub fn ensure_capacity(&mut self, device: &mut D, required: usize) -> Result<bool> {
        let material_capacity = self.material_upload.grown_capacity(required);
        let object_capacity = self.object_upload.grown_capacity(required);
        if material_capacity.is_none() && object_capacity.is_none() {
            return Ok(false);
        }
        let material_capacity = material_capacity.unwrap_or(self.material_upload.capacity());
        let object_capacity = object_capacity.unwrap_or(self.object_upload.capacity());

        let material = uniform(device, ConstantSlot::Material, self.material_upload.size_for(material_capacity))?;
        let per_object = uniform(device, ConstantSlot::PerObject, self.object_upload.size_for(object_capacity))?;
        let bindings = bind(
            device,
            &self.pipeline,
            &self.buffers,
            (&material, &per_object),
            self.texture(),
            &self.sampler,
        )?;

        self.bindings = bindings;
        self.buffers.material = material;
        self.buffers.per_object = per_object;
        self.material_upload.grow_to(material_capacity);
        self.object_upload.grow_to(object_capacity);

        info!(capacity = self.material_upload.capacity(), "Constant upload buffers grown");
        Ok(true)
    }
}

fn uniform<D: GraphicsDevice>(device: &mut D, slot: ConstantSlot, size: u64) -> Result<D::Buffer> {
    device.create_uniform_buffer(slot.label(), size)
}

/// 绑定常量缓冲区；材质/物体缓冲区单独传入，扩容时可以先绑定新缓冲区
fn bind<D: GraphicsDevice>(
    device: &mut D,
    pipeline: &D::Pipeline,
    buffers: &ConstantBuffers<D>,
    (material, per_object): (&D::Buffer, &D::Buffer),
    texture: &D::Texture,
    sampler: &D::Sampler,
) -> Result<D::Bindings> {
    let desc = BindingsDesc::<D> {
        per_frame: &buffers.per_frame,
        camera: &buffers.camera,
        light: &buffers.light,
        material: DynamicBinding {
            buffer: material,
            element_size: ConstantSlot::Material.size(),
        },
        per_object: DynamicBinding {
            buffer: per_object,
            element_size: ConstantSlot::PerObject.size(),
        },
        texture,
        sampler,
    };
    device.create_bindings(pipeline, &desc)
}

/// 棋盘格像素（RGBA8）
pub fn checkerboard_pixels(size: u32, checker: u32) -> Vec<u8> {
    let checker = checker.max(1);
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / checker) + (y / checker)) % 2 == 0;
            let value = if light { 235 } else { 165 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    pixels
}

fn create_fallback_texture<D: GraphicsDevice>(device: &mut D) -> Result<D::Texture> {
    let pixels = checkerboard_pixels(FALLBACK_TEXTURE_SIZE, FALLBACK_CHECKER_SIZE);
    device.create_texture_rgba8("Fallback Texture", FALLBACK_TEXTURE_SIZE, FALLBACK_TEXTURE_SIZE, &pixels)
}

/// 从磁盘加载主纹理，失败时记录警告并返回 `None`
fn load_primary_texture<D: GraphicsDevice>(device: &mut D, path: &Path) -> Option<D::Texture> {
    let result = decode_texture(path).and_then(|(width, height, pixels)| {
        device.create_texture_rgba8("Primary Texture", width, height, &pixels)
    });
    match result {
        Ok(texture) => {
            info!(path = %path.display(), "Primary texture loaded");
            Some(texture)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load texture, using fallback");
            None
        }
    }
}

/// 解码图像文件为 RGBA8
pub fn decode_texture(path: &Path) -> Result<(u32, u32, Vec<u8>)> {
    let image = image::open(path)
        .map_err(|e| GraphicsError::ResourceCreation(format!("failed to decode '{}': {}", path.display(), e)))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok((width, height, image.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{AddressMode, CullMode, FilterMode, HeadlessDevice, HeadlessMonitor, ResourceKind};
    use crate::shaders::{ShaderCollection, LIT_PROGRAM};

    fn device() -> HeadlessDevice {
        HeadlessDevice::new(HeadlessMonitor::new(), Extent2D::new(320, 240))
    }

    #[test]
    fn test_checkerboard() {
        let pixels = checkerboard_pixels(4, 2);
        assert_eq!(pixels.len(), 4 * 4 * 4);
        assert_eq!(&pixels[0..4], &[235, 235, 235, 255]);
        // (2, 0) 落在第二个格子
        assert_eq!(&pixels[8..12], &[165, 165, 165, 255]);
    }

    #[test]
    fn test_swapchain_teardown_then_build() {
        let mut device = device();
        let monitor = device.monitor().clone();

        let mut state = SwapchainState::build(&mut device, Extent2D::new(320, 240), DepthState::default()).unwrap();
        assert_eq!(monitor.live(ResourceKind::DepthTarget), 1);
        assert_eq!(monitor.swapchain_resizes(), 0);

        state.teardown();
        assert!(state.resources().is_none());
        assert_eq!(monitor.live(ResourceKind::DepthTarget), 0);

        state = SwapchainState::build(&mut device, Extent2D::new(640, 480), DepthState::default()).unwrap();
        assert_eq!(state.resources().unwrap().extent, Extent2D::new(640, 480));
        assert_eq!(device.swapchain_extent(), Extent2D::new(640, 480));
        assert_eq!(monitor.swapchain_resizes(), 1);
    }

    #[test]
    fn test_pipeline_resources_growth() {
        let mut device = device();
        let monitor = device.monitor().clone();
        let shaders = ShaderCollection::load(None).unwrap();
        let program = shaders.get(LIT_PROGRAM).unwrap();

        let mut resources =
            PipelineResources::create(&mut device, program, &GraphicsConfig::default(), DepthState::default(), 4)
                .unwrap();
        assert_eq!(resources.meshes.len(), 3);
        assert_eq!(monitor.live(ResourceKind::Buffer), 5);
        assert_eq!(monitor.live(ResourceKind::Bindings), 1);

        assert!(!resources.ensure_capacity(&mut device, 4).unwrap());
        assert!(resources.ensure_capacity(&mut device, 9).unwrap());
        assert_eq!(resources.material_upload.capacity(), 16);
        assert_eq!(resources.object_upload.capacity(), 16);

        // 旧的缓冲区和绑定已释放
        assert_eq!(monitor.live(ResourceKind::Buffer), 5);
        assert_eq!(monitor.live(ResourceKind::Bindings), 1);
        assert_eq!(monitor.created(ResourceKind::Bindings), 2);
    }

    #[test]
    fn test_failed_growth_keeps_resources() {
        let mut device = device();
        let monitor = device.monitor().clone();
        let shaders = ShaderCollection::load(None).unwrap();
        let program = shaders.get(LIT_PROGRAM).unwrap();

        let mut resources =
            PipelineResources::create(&mut device, program, &GraphicsConfig::default(), DepthState::default(), 4)
                .unwrap();

        // 材质缓冲区创建成功，物体缓冲区失败
        monitor.fail_buffers_labelled(ConstantSlot::PerObject.label());
        assert!(resources.ensure_capacity(&mut device, 9).is_err());
        assert_eq!(resources.material_upload.capacity(), 4);
        assert_eq!(resources.object_upload.capacity(), 4);
        assert_eq!(resources.material_upload.total_size(), 4 * 256);
        assert_eq!(monitor.live(ResourceKind::Buffer), 5);
        assert_eq!(monitor.created(ResourceKind::Bindings), 1);

        monitor.clear_failures();
        assert!(resources.ensure_capacity(&mut device, 9).unwrap());
        assert_eq!(resources.material_upload.capacity(), 16);
        assert_eq!(resources.object_upload.capacity(), 16);
        assert_eq!(monitor.live(ResourceKind::Buffer), 5);
    }

    #[test]
    fn test_graphics_config_reaches_pipeline_and_sampler() {
        let mut device = device();
        let monitor = device.monitor().clone();
        let shaders = ShaderCollection::load(None).unwrap();
        let graphics = GraphicsConfig {
            wireframe: true,
            cull_mode: CullMode::None,
            texture_filter: FilterMode::Nearest,
            texture_address: AddressMode::ClampToEdge,
            ..GraphicsConfig::default()
        };
        let resources = PipelineResources::create(
            &mut device,
            shaders.get(LIT_PROGRAM).unwrap(),
            &graphics,
            DepthState::default(),
            4,
        )
        .unwrap();

        assert_eq!(resources.raster.fill_mode, FillMode::Wireframe);
        assert_eq!(monitor.last_raster(), Some(resources.raster));
        assert_eq!(monitor.last_raster().unwrap().cull_mode, CullMode::None);
        assert!(monitor.last_raster().unwrap().front_ccw);

        let sampler = monitor.last_sampler().unwrap();
        assert_eq!(sampler.filter, FilterMode::Nearest);
        assert_eq!(sampler.address, AddressMode::ClampToEdge);
    }

    #[test]
    fn test_missing_texture_falls_back() {
        let mut device = device();
        let shaders = ShaderCollection::load(None).unwrap();
        let graphics = GraphicsConfig {
            texture_path: Some("does/not/exist.png".into()),
            ..GraphicsConfig::default()
        };
        let resources = PipelineResources::create(
            &mut device,
            shaders.get(LIT_PROGRAM).unwrap(),
            &graphics,
            DepthState::default(),
            4,
        )
        .unwrap();
        assert!(resources.primary_texture.is_none());
    }
}
