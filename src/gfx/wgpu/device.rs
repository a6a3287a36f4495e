//! wgpu 资源创建与帧提交
//!
//! 为 `WgpuDevice` 实现 `GraphicsDevice`：
//! - 常量缓冲区、纹理、采样器、网格
//! - 着色器编译（通过错误作用域捕获 WGSL 错误）
//! - 渲染管线与资源绑定（材质、物体常量使用动态偏移）
//! - 每帧清屏、绘制、呈现

use tracing::{debug, warn};
use wgpu::util::DeviceExt;

use crate::core::error::{GraphicsError, Result};
use crate::geometry::{MeshData, Vertex};
use crate::gfx::constants::ConstantSlot;
use crate::gfx::device::{
    AddressMode, BindingsDesc, CullMode, DepthFormat, DepthState, Extent2D, FillMode, FilterMode,
    FrameStatus, FrameSubmission, GraphicsDevice, PipelineDesc, SamplerDesc,
};
use crate::gfx::wgpu::backend::WgpuDevice;

/// 顶点属性：position / normal / texcoord
const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute {
        offset: Vertex::OFFSETS[0],
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: Vertex::OFFSETS[1],
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: Vertex::OFFSETS[2],
        shader_location: 2,
        format: wgpu::VertexFormat::Float32x2,
    },
];

/// 纹理及其视图
pub struct WgpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// 深度目标
pub struct WgpuDepthTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub extent: Extent2D,
}

/// 渲染管线与其绑定布局
pub struct WgpuPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub depth_format: wgpu::TextureFormat,
}

/// 已上传的网格
pub struct WgpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

fn depth_format(format: DepthFormat) -> wgpu::TextureFormat {
    match format {
        DepthFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        DepthFormat::Depth24PlusStencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
    }
}

fn uniform_layout_entry(slot: ConstantSlot) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: slot.binding(),
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: slot.is_dynamic(),
            min_binding_size: wgpu::BufferSize::new(slot.size()),
        },
        count: None,
    }
}

impl WgpuDevice {
    /// 在验证错误作用域中执行，把捕获到的错误转换为 `GraphicsError`
    fn validated<T>(
        &self,
        what: &str,
        make_error: fn(String) -> GraphicsError,
        f: impl FnOnce(&wgpu::Device) -> T,
    ) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(make_error(format!("{}: {}", what, err)).into()),
            None => Ok(value),
        }
    }
}

impl GraphicsDevice for WgpuDevice {
    type Buffer = wgpu::Buffer;
    type Texture = WgpuTexture;
    type Sampler = wgpu::Sampler;
    type DepthTarget = WgpuDepthTarget;
    type Pipeline = WgpuPipeline;
    type Bindings = wgpu::BindGroup;
    type Mesh = WgpuMesh;

    fn backend_name(&self) -> &str {
        "wgpu"
    }

    fn swapchain_extent(&self) -> Extent2D {
        self.surface_extent()
    }

    fn resize_swapchain(&mut self, extent: Extent2D) -> Result<()> {
        if extent.is_empty() {
            return Err(GraphicsError::SwapchainError(format!(
                "cannot resize swapchain to {}x{}",
                extent.width, extent.height
            ))
            .into());
        }
        debug!(width = extent.width, height = extent.height, "Reconfiguring surface");
        self.reconfigure_surface(extent.width, extent.height);
        Ok(())
    }

    fn create_depth_target(&mut self, extent: Extent2D, state: &DepthState) -> Result<Self::DepthTarget> {
        if extent.is_empty() {
            return Err(GraphicsError::ResourceCreation("depth target with zero extent".into()).into());
        }
        let format = depth_format(state.format);
        let texture = self.validated("depth target", GraphicsError::ResourceCreation, |device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width: extent.width,
                    height: extent.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
        })?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(WgpuDepthTarget { texture, view, extent })
    }

    fn depth_target_extent(target: &Self::DepthTarget) -> Extent2D {
        target.extent
    }

    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> Result<Self::Buffer> {
        if size == 0 {
            return Err(GraphicsError::ResourceCreation(format!("buffer '{}' has zero size", label)).into());
        }
        self.validated(label, GraphicsError::ResourceCreation, |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })
    }

    fn write_buffer(&mut self, buffer: &Self::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> Result<Self::Mesh> {
        mesh.validate()?;
        let name = mesh.name.as_deref().unwrap_or("Mesh");

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(WgpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count() as u32,
        })
    }

    fn create_texture_rgba8(&mut self, label: &str, width: u32, height: u32, pixels: &[u8]) -> Result<Self::Texture> {
        if width == 0 || height == 0 || pixels.len() != (width * height * 4) as usize {
            return Err(GraphicsError::ResourceCreation(format!(
                "texture '{}' {}x{} does not match {} bytes of pixel data",
                label,
                width,
                height,
                pixels.len()
            ))
            .into());
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.validated(label, GraphicsError::ResourceCreation, |device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        })?;

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(WgpuTexture { texture, view })
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Self::Sampler> {
        let filter = match desc.filter {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        };
        let address = match desc.address {
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        };
        Ok(self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sampler"),
            address_mode_u: address,
            address_mode_v: address,
            address_mode_w: address,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: filter,
            ..Default::default()
        }))
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<Self::Pipeline> {
        let program = desc.program;
        program.validate()?;

        if desc.raster.fill_mode == FillMode::Wireframe && !self.supports_wireframe() {
            return Err(GraphicsError::ResourceCreation("adapter does not support wireframe fill".into()).into());
        }

        // 1. 编译着色器
        debug!(shader = %program.name, "Compiling shader module");
        let shader_module = self.validated(&program.name, GraphicsError::ShaderCompilation, |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&program.name),
                source: wgpu::ShaderSource::Wgsl(program.source.as_str().into()),
            })
        })?;

        // 2. 绑定布局
        let bind_group_layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lit Bind Group Layout"),
            entries: &[
                uniform_layout_entry(ConstantSlot::PerFrame),
                uniform_layout_entry(ConstantSlot::Camera),
                uniform_layout_entry(ConstantSlot::Light),
                uniform_layout_entry(ConstantSlot::Material),
                uniform_layout_entry(ConstantSlot::PerObject),
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 6,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lit Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // 3. 渲染管线
        let depth_format = depth_format(desc.depth.format);
        let color_format = self.surface_format();
        let pipeline = self.validated(desc.label, GraphicsError::ShaderCompilation, |device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader_module,
                    entry_point: &program.vertex_entry,
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader_module,
                    entry_point: &program.fragment_entry,
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: if desc.raster.front_ccw {
                        wgpu::FrontFace::Ccw
                    } else {
                        wgpu::FrontFace::Cw
                    },
                    cull_mode: match desc.raster.cull_mode {
                        CullMode::None => None,
                        CullMode::Front => Some(wgpu::Face::Front),
                        CullMode::Back => Some(wgpu::Face::Back),
                    },
                    polygon_mode: match desc.raster.fill_mode {
                        FillMode::Solid => wgpu::PolygonMode::Fill,
                        FillMode::Wireframe => wgpu::PolygonMode::Line,
                    },
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_format,
                    depth_write_enabled: desc.depth.write_enabled,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        })?;

        debug!(pipeline = desc.label, "Render pipeline created");
        Ok(WgpuPipeline {
            pipeline,
            bind_group_layout,
            depth_format,
        })
    }

    fn create_bindings(&mut self, pipeline: &Self::Pipeline, desc: &BindingsDesc<'_, Self>) -> Result<Self::Bindings> {
        let material = wgpu::BufferBinding {
            buffer: desc.material.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(desc.material.element_size),
        };
        let per_object = wgpu::BufferBinding {
            buffer: desc.per_object.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(desc.per_object.element_size),
        };

        self.validated("bind group", GraphicsError::ResourceCreation, |device| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Lit Bind Group"),
                layout: &pipeline.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: ConstantSlot::PerFrame.binding(),
                        resource: desc.per_frame.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: ConstantSlot::Camera.binding(),
                        resource: desc.camera.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: ConstantSlot::Light.binding(),
                        resource: desc.light.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: ConstantSlot::Material.binding(),
                        resource: wgpu::BindingResource::Buffer(material),
                    },
                    wgpu::BindGroupEntry {
                        binding: ConstantSlot::PerObject.binding(),
                        resource: wgpu::BindingResource::Buffer(per_object),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::TextureView(&desc.texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: wgpu::BindingResource::Sampler(desc.sampler),
                    },
                ],
            })
        })
    }

    fn submit_frame(&mut self, frame: &FrameSubmission<'_, Self>) -> Result<FrameStatus> {
        let extent = self.surface_extent();
        if frame.depth_target.extent != extent {
            return Err(GraphicsError::SwapchainError(format!(
                "depth target {}x{} does not match render target {}x{}",
                frame.depth_target.extent.width, frame.depth_target.extent.height, extent.width, extent.height
            ))
            .into());
        }
        if frame.depth_target.texture.format() != frame.pipeline.depth_format {
            return Err(GraphicsError::CommandExecution("depth target format differs from pipeline".into()).into());
        }

        // 1. 获取当前帧
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(GraphicsError::DeviceLost("surface out of memory".into()).into());
            }
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // 2. 录制命令
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let [r, g, b, a] = frame.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &frame.depth_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&frame.pipeline.pipeline);
            for draw in frame.draws {
                // 动态偏移按绑定号顺序：材质(3)、物体(4)
                render_pass.set_bind_group(0, frame.bindings, &[draw.material_offset, draw.object_offset]);
                render_pass.set_vertex_buffer(0, draw.mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(draw.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.mesh.index_count, 0, 0..1);
            }
        }

        // 3. 提交并呈现
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(FrameStatus::Presented)
    }
}
