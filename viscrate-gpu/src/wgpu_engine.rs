//! Off-screen rendering engine on wgpu
//!
//! Every swap chain is an `Rgba8UnormSrgb` texture with a depth buffer and a
//! row-padded staging buffer. Rendering a view records a render pass; the
//! frame's command buffers are submitted in [`FrameRenderer::end_frame`],
//! which also performs a pending pixel readback and hands the filled
//! [`PixelBuffer`] to its callback on a `viscrate-readback` thread.

use crate::device::GpuContext;
use crate::engine::*;
use crate::mesh::{geometry_vertices, MeshVertex};
use bytemuck::{Pod, Zeroable};
use nalgebra::Matrix4;
use std::collections::HashMap;
use viscrate_core::{AxisAlignedBoundingBox, Drawable, Error, Geometry, Image, Result};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// 12-byte identifier at the start of every KTX 1.1 container
const KTX1_IDENTIFIER: [u8; 12] = [0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A];

/// Ambient term with no indirect light attached
const BASE_AMBIENT: f32 = 0.1;
/// Indirect light intensity that maps to an ambient term of `BASE_AMBIENT + 0.25`
const REFERENCE_IBL_INTENSITY: f32 = 45_000.0;

/// Maps OpenGL clip space (z in [-1, 1]) to wgpu clip space (z in [0, 1])
#[rustfmt::skip]
fn opengl_to_wgpu() -> Matrix4<f32> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Camera uniform data
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 3],
    ambient: f32,
    viewport: [f32; 2],
    _padding: [f32; 2],
}

/// Material uniform data
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct MaterialUniform {
    base_color: [f32; 4],
    metallic: f32,
    roughness: f32,
    reflectance: f32,
    clear_coat: f32,
    clear_coat_roughness: f32,
    anisotropy: f32,
    point_size: f32,
    _padding: f32,
}

impl From<&MaterialParameters> for MaterialUniform {
    fn from(p: &MaterialParameters) -> Self {
        Self {
            base_color: [p.base_color[0], p.base_color[1], p.base_color[2], 1.0],
            metallic: p.metallic,
            roughness: p.roughness,
            reflectance: p.reflectance,
            clear_coat: p.clear_coat,
            clear_coat_roughness: p.clear_coat_roughness,
            anisotropy: p.anisotropy,
            point_size: p.point_size,
            _padding: 0.0,
        }
    }
}

struct GpuTexture {
    view: wgpu::TextureView,
    _texture: wgpu::Texture,
}

struct MaterialInstance {
    kind: MaterialKind,
    params: MaterialParameters,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct Entity {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    material: MaterialInstanceHandle,
    bounds: AxisAlignedBoundingBox,
}

#[derive(Default)]
struct Scene {
    entities: Vec<EntityHandle>,
    indirect_light: Option<(IndirectLightHandle, f32)>,
    skybox: Option<SkyboxHandle>,
}

struct View {
    scene: SceneHandle,
    viewport: Viewport,
    clear_color: [f32; 4],
    camera: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
}

struct OffscreenTarget {
    width: u32,
    height: u32,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    _depth: wgpu::Texture,
}

struct PendingReadback {
    rect: PixelRect,
    buffer: PixelBuffer,
    callback: ReadPixelsCallback,
}

struct Frame {
    swap_chain: SwapChainHandle,
    commands: Vec<wgpu::CommandBuffer>,
    readback: Option<PendingReadback>,
}

/// Headless rendering engine backed by wgpu
pub struct WgpuEngine {
    gpu: GpuContext,
    camera_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<MaterialKind, wgpu::RenderPipeline>,
    sampler: wgpu::Sampler,
    textures: Vec<GpuTexture>,
    indirect_lights: Vec<ResourceLoadRequest>,
    skyboxes: Vec<ResourceLoadRequest>,
    materials: Vec<MaterialInstance>,
    scenes: Vec<Scene>,
    entities: Vec<Entity>,
    views: Vec<View>,
    swap_chains: Vec<OffscreenTarget>,
    frame: Option<Frame>,
}

/// Row pitch of a texture-to-buffer copy
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Deliver a readback result on its own thread
fn complete_readback(buffer: PixelBuffer, callback: ReadPixelsCallback) {
    let spawned = std::thread::Builder::new()
        .name("viscrate-readback".to_string())
        .spawn(move || callback(buffer));
    if let Err(e) = spawned {
        log::error!("failed to spawn readback thread: {}", e);
    }
}

fn check_ktx(bytes: &[u8], what: &str, request: &ResourceLoadRequest) -> Result<()> {
    if bytes.len() < KTX1_IDENTIFIER.len() || bytes[..KTX1_IDENTIFIER.len()] != KTX1_IDENTIFIER {
        return Err(Error::InvalidData(format!(
            "{} {} is not a KTX container",
            what,
            request.describe()
        )));
    }
    Ok(())
}

impl WgpuEngine {
    /// Create an engine on the default adapter
    pub fn new() -> Result<Self> {
        Self::with_context(GpuContext::new_blocking()?)
    }

    pub fn with_context(gpu: GpuContext) -> Result<Self> {
        let camera_layout = gpu.create_bind_group_layout("camera_bind_group_layout", &[uniform_entry(0)]);
        let material_layout = gpu.create_bind_group_layout(
            "material_bind_group_layout",
            &[
                uniform_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        );

        let shader = gpu.create_shader_module("geometry shader", include_str!("shaders/geometry.wgsl"));
        let pipelines = [
            (MaterialKind::Normals, "fs_normals"),
            (MaterialKind::Lit, "fs_lit"),
            (MaterialKind::Unlit, "fs_unlit"),
        ]
        .into_iter()
        .map(|(kind, entry)| {
            let pipeline = Self::create_render_pipeline(&gpu.device, &[&camera_layout, &material_layout], &shader, entry);
            (kind, pipeline)
        })
        .collect();

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mut engine = Self {
            gpu,
            camera_layout,
            material_layout,
            pipelines,
            sampler,
            textures: Vec::new(),
            indirect_lights: Vec::new(),
            skyboxes: Vec::new(),
            materials: Vec::new(),
            scenes: Vec::new(),
            entities: Vec::new(),
            views: Vec::new(),
            swap_chains: Vec::new(),
            frame: None,
        };

        let white = engine.add_texture(&Image {
            width: 1,
            height: 1,
            num_channels: 4,
            bytes_per_channel: 1,
            data: vec![255, 255, 255, 255],
        })?;
        let flat_normal = engine.add_texture(&Image::from_rgb8(1, 1, vec![128, 128, 255]))?;
        debug_assert_eq!(white, TextureHandle::DEFAULT_TEXTURE);
        debug_assert_eq!(flat_normal, TextureHandle::DEFAULT_NORMAL_MAP);

        Ok(engine)
    }

    fn create_render_pipeline(
        device: &wgpu::Device,
        layouts: &[&wgpu::BindGroupLayout],
        shader: &wgpu::ShaderModule,
        fragment_entry: &str,
    ) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} pipeline layout", fragment_entry)),
            bind_group_layouts: layouts,
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} pipeline", fragment_entry)),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &[MeshVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: fragment_entry,
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // models come with arbitrary winding and point quads face the camera either way
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }

    fn texture_view(&self, handle: TextureHandle) -> &wgpu::TextureView {
        let fallback = &self.textures[TextureHandle::DEFAULT_TEXTURE.index()].view;
        self.textures.get(handle.index()).map_or(fallback, |t| &t.view)
    }

    fn create_material_bind_group(&self, buffer: &wgpu::Buffer, albedo: TextureHandle) -> wgpu::BindGroup {
        self.gpu.create_bind_group(
            "material_bind_group",
            &self.material_layout,
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.texture_view(albedo)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        )
    }

    fn view_mut(&mut self, view: ViewHandle) -> Result<&mut View> {
        self.views
            .get_mut(view.index())
            .ok_or_else(|| Error::Render(format!("unknown view {:?}", view)))
    }

    fn scene_mut(&mut self, scene: SceneHandle) -> Result<&mut Scene> {
        self.scenes
            .get_mut(scene.index())
            .ok_or_else(|| Error::Render(format!("unknown scene {:?}", scene)))
    }

    /// Copy `rect` of the swap chain into `buffer` as RGB8; returns bytes written
    fn read_back(&self, swap_chain: SwapChainHandle, rect: PixelRect, buffer: &mut PixelBuffer) -> Result<usize> {
        let target = self
            .swap_chains
            .get(swap_chain.index())
            .ok_or_else(|| Error::Render(format!("unknown swap chain {:?}", swap_chain)))?;

        if rect.area() == 0 || !rect.fits_in(target.width, target.height) {
            return Err(Error::Render(format!(
                "readback rectangle {:?} outside {}x{} target",
                rect, target.width, target.height
            )));
        }
        if buffer.width() != rect.width || buffer.height() != rect.height {
            return Err(Error::Render(format!(
                "pixel buffer is {}x{} but rectangle is {}x{}",
                buffer.width(),
                buffer.height(),
                rect.width,
                rect.height
            )));
        }

        let bytes_per_row = padded_bytes_per_row(rect.width);
        let staging = self.gpu.create_buffer(
            "readback staging buffer",
            bytes_per_row as u64 * rect.height as u64,
            wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        );

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &target.color,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: rect.x,
                    y: rect.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(rect.height),
                },
            },
            wgpu::Extent3d {
                width: rect.width,
                height: rect.height,
                depth_or_array_layers: 1,
            },
        );
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.gpu.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| Error::Gpu("buffer mapping was dropped".to_string()))??;

        let mapped = slice.get_mapped_range();
        let out = buffer.data_mut();
        let row_rgb = rect.width as usize * PixelBuffer::CHANNELS;
        for (row, dst) in out.chunks_exact_mut(row_rgb).enumerate() {
            let start = row * bytes_per_row as usize;
            let src = &mapped[start..start + rect.width as usize * 4];
            for (rgb, rgba) in dst.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
                rgb.copy_from_slice(&rgba[..3]);
            }
        }
        drop(mapped);
        staging.unmap();

        Ok(rect.area() * PixelBuffer::CHANNELS)
    }
}

impl FrameRenderer for WgpuEngine {
    fn begin_frame(&mut self, swap_chain: SwapChainHandle) -> bool {
        if self.frame.is_some() {
            log::warn!("begin_frame called while a frame is in progress");
            return false;
        }
        if swap_chain.index() >= self.swap_chains.len() {
            log::warn!("begin_frame on unknown swap chain {:?}", swap_chain);
            return false;
        }
        self.frame = Some(Frame {
            swap_chain,
            commands: Vec::new(),
            readback: None,
        });
        true
    }

    fn render(&mut self, view: ViewHandle) {
        let Some(frame) = self.frame.as_mut() else {
            log::warn!("render called outside a frame");
            return;
        };
        let Some(v) = self.views.get_mut(view.index()) else {
            log::warn!("render of unknown view {:?}", view);
            return;
        };
        let Some(target) = self.swap_chains.get(frame.swap_chain.index()) else {
            return;
        };
        let scene = &self.scenes[v.scene.index()];

        v.camera.ambient = BASE_AMBIENT
            + scene.indirect_light.map_or(0.0, |(_, intensity)| {
                0.25 * (intensity / REFERENCE_IBL_INTENSITY).clamp(0.0, 2.0)
            });
        self.gpu.queue.write_buffer(&v.camera_buffer, 0, bytemuck::bytes_of(&v.camera));

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("view render encoder"),
        });
        {
            let [r, g, b, a] = v.clear_color.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("view render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let vp = v.viewport;
            if vp.area() > 0 && vp.fits_in(target.width, target.height) {
                pass.set_viewport(vp.x as f32, vp.y as f32, vp.width as f32, vp.height as f32, 0.0, 1.0);
            }
            pass.set_bind_group(0, &v.camera_bind_group, &[]);

            for handle in &scene.entities {
                let entity = &self.entities[handle.index()];
                let Some(material) = self.materials.get(entity.material.index()) else {
                    continue;
                };
                let Some(pipeline) = self.pipelines.get(&material.kind) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &material.bind_group, &[]);
                pass.set_vertex_buffer(0, entity.vertex_buffer.slice(..));
                pass.draw(0..entity.vertex_count, 0..1);
            }
        }
        frame.commands.push(encoder.finish());
    }

    fn read_pixels(&mut self, rect: PixelRect, mut buffer: PixelBuffer, callback: ReadPixelsCallback) {
        match self.frame.as_mut() {
            Some(frame) if frame.readback.is_none() => {
                frame.readback = Some(PendingReadback { rect, buffer, callback });
            }
            Some(_) => {
                log::error!("only one readback per frame is supported");
                buffer.set_transferred(0);
                complete_readback(buffer, callback);
            }
            None => {
                log::error!("read_pixels called outside a frame");
                buffer.set_transferred(0);
                complete_readback(buffer, callback);
            }
        }
    }

    fn end_frame(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };

        self.gpu.queue.submit(frame.commands);

        if let Some(PendingReadback {
            rect,
            mut buffer,
            callback,
        }) = frame.readback
        {
            let transferred = match self.read_back(frame.swap_chain, rect, &mut buffer) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("pixel readback failed: {}", e);
                    0
                }
            };
            buffer.set_transferred(transferred);
            complete_readback(buffer, callback);
        }
    }
}

impl RenderEngine for WgpuEngine {
    fn add_texture(&mut self, image: &Image) -> Result<TextureHandle> {
        let rgba = image.to_rgba8().ok_or_else(|| {
            Error::Unsupported(format!(
                "texture with {} channels of {} bytes",
                image.num_channels, image.bytes_per_channel
            ))
        })?;
        if !image.has_data() {
            return Err(Error::InvalidData("texture has no pixel data".to_string()));
        }

        let texture = self.gpu.create_texture_2d(
            "material texture",
            image.width,
            image.height,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        self.gpu.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures.push(GpuTexture {
            view,
            _texture: texture,
        });
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn add_indirect_light(&mut self, request: &ResourceLoadRequest) -> Result<IndirectLightHandle> {
        let bytes = request.read()?;
        check_ktx(&bytes, "indirect light", request)?;
        self.indirect_lights.push(request.clone());
        Ok(IndirectLightHandle(self.indirect_lights.len() as u32 - 1))
    }

    fn add_skybox(&mut self, request: &ResourceLoadRequest) -> Result<SkyboxHandle> {
        let bytes = request.read()?;
        check_ktx(&bytes, "skybox", request)?;
        self.skyboxes.push(request.clone());
        Ok(SkyboxHandle(self.skyboxes.len() as u32 - 1))
    }

    fn create_material_instance(&mut self, kind: MaterialKind) -> Result<MaterialInstanceHandle> {
        let params = MaterialParameters::default();
        let buffer = self.gpu.create_buffer_init(
            "material uniform buffer",
            &[MaterialUniform::from(&params)],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let bind_group = self.create_material_bind_group(&buffer, params.maps.albedo_map);

        self.materials.push(MaterialInstance {
            kind,
            params,
            buffer,
            bind_group,
        });
        Ok(MaterialInstanceHandle(self.materials.len() as u32 - 1))
    }

    fn update_material_instance(&mut self, instance: MaterialInstanceHandle, params: &MaterialParameters) -> Result<()> {
        let Some(material) = self.materials.get(instance.index()) else {
            return Err(Error::Render(format!("unknown material instance {:?}", instance)));
        };

        self.gpu
            .queue
            .write_buffer(&material.buffer, 0, bytemuck::bytes_of(&MaterialUniform::from(params)));

        let rebind = material.params.maps.albedo_map != params.maps.albedo_map;
        let bind_group = rebind.then(|| self.create_material_bind_group(&material.buffer, params.maps.albedo_map));

        let material = &mut self.materials[instance.index()];
        material.params = *params;
        if let Some(bind_group) = bind_group {
            material.bind_group = bind_group;
        }
        Ok(())
    }

    fn create_scene(&mut self) -> SceneHandle {
        self.scenes.push(Scene::default());
        SceneHandle(self.scenes.len() as u32 - 1)
    }

    fn add_geometry(&mut self, scene: SceneHandle, geometry: &Geometry, material: MaterialInstanceHandle) -> Result<EntityHandle> {
        if material.index() >= self.materials.len() {
            return Err(Error::Render(format!("unknown material instance {:?}", material)));
        }
        self.scene_mut(scene)?;

        let vertices = geometry_vertices(geometry);
        if vertices.is_empty() {
            return Err(Error::InvalidData("geometry has nothing to draw".to_string()));
        }
        let vertex_buffer = self.gpu.create_buffer_init("geometry vertex buffer", &vertices, wgpu::BufferUsages::VERTEX);

        self.entities.push(Entity {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            material,
            bounds: geometry.bounding_box(),
        });
        let entity = EntityHandle(self.entities.len() as u32 - 1);
        self.scene_mut(scene)?.entities.push(entity);

        log::debug!("added {:?} with {} vertices to {:?}", geometry.geometry_type(), vertices.len(), scene);
        Ok(entity)
    }

    fn scene_entities(&self, scene: SceneHandle) -> Vec<EntityHandle> {
        self.scenes
            .get(scene.index())
            .map(|s| s.entities.clone())
            .unwrap_or_default()
    }

    fn entity_bounding_box(&self, entity: EntityHandle) -> Option<AxisAlignedBoundingBox> {
        self.entities.get(entity.index()).map(|e| e.bounds)
    }

    fn set_indirect_light(&mut self, scene: SceneHandle, light: IndirectLightHandle, intensity: f32) -> Result<()> {
        if light.index() >= self.indirect_lights.len() {
            return Err(Error::Render(format!("unknown indirect light {:?}", light)));
        }
        self.scene_mut(scene)?.indirect_light = Some((light, intensity));
        Ok(())
    }

    fn set_skybox(&mut self, scene: SceneHandle, skybox: SkyboxHandle) -> Result<()> {
        if skybox.index() >= self.skyboxes.len() {
            return Err(Error::Render(format!("unknown skybox {:?}", skybox)));
        }
        self.scene_mut(scene)?.skybox = Some(skybox);
        Ok(())
    }

    fn create_view(&mut self, scene: SceneHandle, viewport: Viewport) -> Result<ViewHandle> {
        self.scene_mut(scene)?;

        let camera = CameraUniform {
            view_proj: Matrix4::<f32>::identity().into(),
            eye: [0.0, 0.0, 0.0],
            ambient: BASE_AMBIENT,
            viewport: [viewport.width.max(1) as f32, viewport.height.max(1) as f32],
            _padding: [0.0, 0.0],
        };
        let camera_buffer = self.gpu.create_buffer_init(
            "camera uniform buffer",
            &[camera],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let camera_bind_group = self.gpu.create_bind_group(
            "camera_bind_group",
            &self.camera_layout,
            &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        );

        self.views.push(View {
            scene,
            viewport,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            camera,
            camera_buffer,
            camera_bind_group,
        });
        Ok(ViewHandle(self.views.len() as u32 - 1))
    }

    fn set_camera(&mut self, view: ViewHandle, camera: &CameraMatrices) -> Result<()> {
        let v = self.view_mut(view)?;
        let view_proj = opengl_to_wgpu() * camera.projection * camera.view;
        v.camera.view_proj = view_proj.into();
        v.camera.eye = [camera.eye.x, camera.eye.y, camera.eye.z];
        Ok(())
    }

    fn set_clear_color(&mut self, view: ViewHandle, color: [f32; 4]) -> Result<()> {
        self.view_mut(view)?.clear_color = color;
        Ok(())
    }

    fn create_swap_chain(&mut self, width: u32, height: u32) -> Result<SwapChainHandle> {
        let max = self.gpu.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(Error::Render(format!(
                "swap chain size {}x{} outside 1..={}",
                width, height, max
            )));
        }

        let color = self.gpu.create_texture_2d(
            "offscreen color target",
            width,
            height,
            COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let depth = self.gpu.create_texture_2d(
            "offscreen depth target",
            width,
            height,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );

        self.swap_chains.push(OffscreenTarget {
            width,
            height,
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            _depth: depth,
        });
        Ok(SwapChainHandle(self.swap_chains.len() as u32 - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_rows() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1920), 7680);
    }

    #[test]
    fn test_ktx_identifier() {
        let request = ResourceLoadRequest::Bytes(Vec::new());
        let mut ktx = KTX1_IDENTIFIER.to_vec();
        ktx.extend_from_slice(&[0; 52]);

        assert!(check_ktx(&ktx, "ibl", &request).is_ok());
        assert!(check_ktx(b"\x89PNG\r\n\x1a\n", "ibl", &request).is_err());
        assert!(check_ktx(&[], "ibl", &request).is_err());
    }

    #[test]
    fn test_depth_maps_to_unit_range() {
        use approx::assert_relative_eq;
        use nalgebra::{Perspective3, Vector4};

        let (near, far) = (1.0, 500.0);
        let projection = opengl_to_wgpu() * Perspective3::new(16.0 / 9.0, 1.0, near, far).to_homogeneous();
        let depth = |distance: f32| {
            let clip = projection * Vector4::new(0.0, 0.0, -distance, 1.0);
            clip.z / clip.w
        };

        assert_relative_eq!(depth(near), 0.0, epsilon = 1e-6);
        assert_relative_eq!(depth(far), 1.0, epsilon = 1e-5);
        assert!(depth(10.0) > 0.0 && depth(10.0) < 1.0);
    }

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 96);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
    }
}
