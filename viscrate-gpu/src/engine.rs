//! Rendering engine interface consumed by the headless pipeline
//!
//! [`FrameRenderer`] is the frame/readback half: begin a frame against a
//! swap chain, render views, request an asynchronous pixel readback and end
//! the frame. [`RenderEngine`] adds resource and scene management. The
//! pipeline only talks to these traits, so it can be driven by the wgpu
//! implementation or by a scripted test double.

use nalgebra::{Matrix4, Point3};
use std::path::PathBuf;
use viscrate_core::{AxisAlignedBoundingBox, Geometry, Image, Result};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(
    /// Texture owned by the engine's resource manager
    TextureHandle
);
handle!(IndirectLightHandle);
handle!(SkyboxHandle);
handle!(MaterialInstanceHandle);
handle!(SceneHandle);
handle!(ViewHandle);
handle!(SwapChainHandle);
handle!(EntityHandle);

impl TextureHandle {
    /// Opaque white, present in every engine
    pub const DEFAULT_TEXTURE: TextureHandle = TextureHandle(0);
    /// Flat tangent-space normal (128, 128, 255), present in every engine
    pub const DEFAULT_NORMAL_MAP: TextureHandle = TextureHandle(1);
}

/// Rectangle in pixels, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the rectangle lies inside a `width` x `height` target
    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Viewport of a view on its render target
pub type Viewport = PixelRect;

/// Destination of a pixel readback: tightly packed 8-bit RGB rows
///
/// `transferred` is the number of bytes the engine actually wrote; zero
/// means the readback failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
    transferred: usize,
}

impl PixelBuffer {
    pub const CHANNELS: usize = 3;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * Self::CHANNELS],
            transferred: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Capacity in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn transferred(&self) -> usize {
        self.transferred
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Writable pixel storage for the engine
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Record how many bytes were written, capped at the capacity
    pub fn set_transferred(&mut self, bytes: usize) {
        self.transferred = bytes.min(self.data.len());
    }

    /// Copy the pixels into a 3-channel, 8-bit image
    pub fn to_image(&self) -> Image {
        Image::from_rgb8(self.width, self.height, self.data.clone())
    }
}

/// Completion callback of a pixel readback
///
/// Invoked exactly once per request, on a thread chosen by the engine,
/// with the buffer that was handed to [`FrameRenderer::read_pixels`].
pub type ReadPixelsCallback = Box<dyn FnOnce(PixelBuffer) + Send + 'static>;

/// Source of an engine resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLoadRequest {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ResourceLoadRequest {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ResourceLoadRequest::Path(path.into())
    }

    /// Load the request's bytes
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            ResourceLoadRequest::Path(path) => Ok(std::fs::read(path)?),
            ResourceLoadRequest::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ResourceLoadRequest::Path(path) => path.display().to_string(),
            ResourceLoadRequest::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

/// Built-in material templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Colors surfaces by their normal direction
    Normals,
    Lit,
    Unlit,
}

/// Texture handle per material slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureMaps {
    pub albedo_map: TextureHandle,
    pub normal_map: TextureHandle,
    pub ambient_occlusion_map: TextureHandle,
    pub roughness_map: TextureHandle,
    pub metallic_map: TextureHandle,
    pub reflectance_map: TextureHandle,
    pub clear_coat_map: TextureHandle,
    pub clear_coat_roughness_map: TextureHandle,
    pub anisotropy_map: TextureHandle,
}

impl Default for TextureMaps {
    fn default() -> Self {
        let t = TextureHandle::DEFAULT_TEXTURE;
        Self {
            albedo_map: t,
            normal_map: TextureHandle::DEFAULT_NORMAL_MAP,
            ambient_occlusion_map: t,
            roughness_map: t,
            metallic_map: t,
            reflectance_map: t,
            clear_coat_map: t,
            clear_coat_roughness_map: t,
            anisotropy_map: t,
        }
    }
}

/// Values pushed into a material instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParameters {
    pub base_color: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub reflectance: f32,
    pub clear_coat: f32,
    pub clear_coat_roughness: f32,
    pub anisotropy: f32,
    pub point_size: f32,
    pub maps: TextureMaps,
}

impl Default for MaterialParameters {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.7,
            reflectance: 0.5,
            clear_coat: 0.0,
            clear_coat_roughness: 0.0,
            anisotropy: 0.0,
            point_size: 3.0,
            maps: TextureMaps::default(),
        }
    }
}

/// Camera state of a view
///
/// `projection` follows the OpenGL clip-space convention (depth in
/// [-1, 1]); engines convert to their own convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub eye: Point3<f32>,
}

/// Frame and readback operations
pub trait FrameRenderer {
    /// Start a frame on `swap_chain`; `false` means the engine declined
    fn begin_frame(&mut self, swap_chain: SwapChainHandle) -> bool;

    /// Draw a view into the current frame
    fn render(&mut self, view: ViewHandle);

    /// Request an asynchronous copy of `rect` into `buffer`
    ///
    /// The engine owns `buffer` until it hands it back through `callback`.
    fn read_pixels(&mut self, rect: PixelRect, buffer: PixelBuffer, callback: ReadPixelsCallback);

    /// Finish the current frame; a no-op when no frame is open
    fn end_frame(&mut self);
}

/// Resource, scene and view management on top of [`FrameRenderer`]
pub trait RenderEngine: FrameRenderer {
    fn add_texture(&mut self, image: &Image) -> Result<TextureHandle>;

    fn add_indirect_light(&mut self, request: &ResourceLoadRequest) -> Result<IndirectLightHandle>;

    fn add_skybox(&mut self, request: &ResourceLoadRequest) -> Result<SkyboxHandle>;

    fn create_material_instance(&mut self, kind: MaterialKind) -> Result<MaterialInstanceHandle>;

    fn update_material_instance(
        &mut self,
        instance: MaterialInstanceHandle,
        params: &MaterialParameters,
    ) -> Result<()>;

    fn create_scene(&mut self) -> SceneHandle;

    /// Upload geometry and add it to `scene` bound to `material`
    fn add_geometry(
        &mut self,
        scene: SceneHandle,
        geometry: &Geometry,
        material: MaterialInstanceHandle,
    ) -> Result<EntityHandle>;

    fn scene_entities(&self, scene: SceneHandle) -> Vec<EntityHandle>;

    fn entity_bounding_box(&self, entity: EntityHandle) -> Option<AxisAlignedBoundingBox>;

    fn set_indirect_light(&mut self, scene: SceneHandle, light: IndirectLightHandle, intensity: f32) -> Result<()>;

    fn set_skybox(&mut self, scene: SceneHandle, skybox: SkyboxHandle) -> Result<()>;

    fn create_view(&mut self, scene: SceneHandle, viewport: Viewport) -> Result<ViewHandle>;

    fn set_camera(&mut self, view: ViewHandle, camera: &CameraMatrices) -> Result<()>;

    fn set_clear_color(&mut self, view: ViewHandle, color: [f32; 4]) -> Result<()>;

    /// Off-screen, read-back capable render target
    fn create_swap_chain(&mut self, width: u32, height: u32) -> Result<SwapChainHandle>;
}
