//! Scripted rendering engine for pipeline tests
//!
//! Records every call and completes readbacks on its own threads, optionally
//! after a delay, with empty pixels, or never.

use nalgebra::Point3;
use std::thread::JoinHandle;
use std::time::Duration;
use viscrate_core::{AxisAlignedBoundingBox, Drawable, Error, Geometry, Image, Result};
use viscrate_gpu::*;

/// How the engine answers a readback request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readback {
    /// Fill every byte with the value and report the full size
    Fill(u8),
    /// Report zero bytes transferred
    Empty,
    /// Keep the callback alive without ever calling it
    Never,
    /// Drop the callback without calling it
    Drop,
}

#[derive(Debug, Default)]
pub struct FakeScene {
    pub entities: Vec<EntityHandle>,
    pub indirect_light: Option<(IndirectLightHandle, f32)>,
    pub skybox: Option<SkyboxHandle>,
}

#[derive(Debug)]
pub struct FakeView {
    pub scene: SceneHandle,
    pub viewport: Viewport,
    pub camera: Option<CameraMatrices>,
    pub clear_color: [f32; 4],
}

pub struct FakeEngine {
    pub readback: Readback,
    pub callback_delay: Duration,
    /// Number of upcoming `begin_frame` calls to decline
    pub declines: u32,

    pub textures: Vec<Image>,
    pub materials: Vec<(MaterialKind, MaterialParameters)>,
    pub scenes: Vec<FakeScene>,
    pub entities: Vec<(AxisAlignedBoundingBox, MaterialInstanceHandle)>,
    pub views: Vec<FakeView>,
    pub swap_chains: Vec<(u32, u32)>,
    pub indirect_lights: usize,
    pub skyboxes: usize,

    pub begin_calls: u32,
    pub end_calls: u32,
    pub render_calls: u32,
    /// Camera eye at every `render` call
    pub rendered_eyes: Vec<Point3<f32>>,

    frame_open: bool,
    pending: Option<(PixelBuffer, ReadPixelsCallback)>,
    stalled: Vec<ReadPixelsCallback>,
    workers: Vec<JoinHandle<()>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        let mut engine = Self {
            readback: Readback::Fill(90),
            callback_delay: Duration::ZERO,
            declines: 0,
            textures: Vec::new(),
            materials: Vec::new(),
            scenes: Vec::new(),
            entities: Vec::new(),
            views: Vec::new(),
            swap_chains: Vec::new(),
            indirect_lights: 0,
            skyboxes: 0,
            begin_calls: 0,
            end_calls: 0,
            render_calls: 0,
            rendered_eyes: Vec::new(),
            frame_open: false,
            pending: None,
            stalled: Vec::new(),
            workers: Vec::new(),
        };
        // default texture and default normal map
        engine.textures.push(Image::from_rgb8(1, 1, vec![255, 255, 255]));
        engine.textures.push(Image::from_rgb8(1, 1, vec![128, 128, 255]));
        engine
    }

    pub fn material(&self, handle: MaterialInstanceHandle) -> &(MaterialKind, MaterialParameters) {
        &self.materials[handle.index()]
    }

    /// Wait for every readback thread
    pub fn join(&mut self) {
        for worker in self.workers.drain(..) {
            worker.join().unwrap();
        }
    }
}

impl FrameRenderer for FakeEngine {
    fn begin_frame(&mut self, swap_chain: SwapChainHandle) -> bool {
        self.begin_calls += 1;
        assert!(swap_chain.index() < self.swap_chains.len());
        if self.declines > 0 {
            self.declines -= 1;
            return false;
        }
        self.frame_open = true;
        true
    }

    fn render(&mut self, view: ViewHandle) {
        assert!(self.frame_open, "render outside a frame");
        self.render_calls += 1;
        if let Some(camera) = self.views[view.index()].camera {
            self.rendered_eyes.push(camera.eye);
        }
    }

    fn read_pixels(&mut self, rect: PixelRect, buffer: PixelBuffer, callback: ReadPixelsCallback) {
        assert!(self.frame_open, "readback outside a frame");
        assert!(self.pending.is_none(), "second readback in one frame");
        assert_eq!((rect.width, rect.height), (buffer.width(), buffer.height()));
        self.pending = Some((buffer, callback));
    }

    fn end_frame(&mut self) {
        self.end_calls += 1;
        self.frame_open = false;

        let Some((mut buffer, callback)) = self.pending.take() else {
            return;
        };
        match self.readback {
            Readback::Fill(value) => {
                let delay = self.callback_delay;
                self.workers.push(std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    buffer.data_mut().fill(value);
                    let len = buffer.len();
                    buffer.set_transferred(len);
                    callback(buffer);
                }));
            }
            Readback::Empty => {
                self.workers.push(std::thread::spawn(move || callback(buffer)));
            }
            Readback::Never => self.stalled.push(callback),
            Readback::Drop => drop(callback),
        }
    }
}

impl RenderEngine for FakeEngine {
    fn add_texture(&mut self, image: &Image) -> Result<TextureHandle> {
        if image.to_rgba8().is_none() {
            return Err(Error::Unsupported("fake engine takes 8-bit textures only".to_string()));
        }
        self.textures.push(image.clone());
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn add_indirect_light(&mut self, request: &ResourceLoadRequest) -> Result<IndirectLightHandle> {
        request.read()?;
        self.indirect_lights += 1;
        Ok(IndirectLightHandle(self.indirect_lights as u32 - 1))
    }

    fn add_skybox(&mut self, request: &ResourceLoadRequest) -> Result<SkyboxHandle> {
        request.read()?;
        self.skyboxes += 1;
        Ok(SkyboxHandle(self.skyboxes as u32 - 1))
    }

    fn create_material_instance(&mut self, kind: MaterialKind) -> Result<MaterialInstanceHandle> {
        self.materials.push((kind, MaterialParameters::default()));
        Ok(MaterialInstanceHandle(self.materials.len() as u32 - 1))
    }

    fn update_material_instance(&mut self, instance: MaterialInstanceHandle, params: &MaterialParameters) -> Result<()> {
        self.materials[instance.index()].1 = *params;
        Ok(())
    }

    fn create_scene(&mut self) -> SceneHandle {
        self.scenes.push(FakeScene::default());
        SceneHandle(self.scenes.len() as u32 - 1)
    }

    fn add_geometry(&mut self, scene: SceneHandle, geometry: &Geometry, material: MaterialInstanceHandle) -> Result<EntityHandle> {
        let bounds = geometry.bounding_box();
        if bounds.is_empty() {
            return Err(Error::InvalidData("empty geometry".to_string()));
        }
        self.entities.push((bounds, material));
        let entity = EntityHandle(self.entities.len() as u32 - 1);
        self.scenes[scene.index()].entities.push(entity);
        Ok(entity)
    }

    fn scene_entities(&self, scene: SceneHandle) -> Vec<EntityHandle> {
        self.scenes[scene.index()].entities.clone()
    }

    fn entity_bounding_box(&self, entity: EntityHandle) -> Option<AxisAlignedBoundingBox> {
        self.entities.get(entity.index()).map(|(bounds, _)| *bounds)
    }

    fn set_indirect_light(&mut self, scene: SceneHandle, light: IndirectLightHandle, intensity: f32) -> Result<()> {
        self.scenes[scene.index()].indirect_light = Some((light, intensity));
        Ok(())
    }

    fn set_skybox(&mut self, scene: SceneHandle, skybox: SkyboxHandle) -> Result<()> {
        self.scenes[scene.index()].skybox = Some(skybox);
        Ok(())
    }

    fn create_view(&mut self, scene: SceneHandle, viewport: Viewport) -> Result<ViewHandle> {
        self.views.push(FakeView {
            scene,
            viewport,
            camera: None,
            clear_color: [0.0; 4],
        });
        Ok(ViewHandle(self.views.len() as u32 - 1))
    }

    fn set_camera(&mut self, view: ViewHandle, camera: &CameraMatrices) -> Result<()> {
        self.views[view.index()].camera = Some(*camera);
        Ok(())
    }

    fn set_clear_color(&mut self, view: ViewHandle, color: [f32; 4]) -> Result<()> {
        self.views[view.index()].clear_color = color;
        Ok(())
    }

    fn create_swap_chain(&mut self, width: u32, height: u32) -> Result<SwapChainHandle> {
        self.swap_chains.push((width, height));
        Ok(SwapChainHandle(self.swap_chains.len() as u32 - 1))
    }
}
