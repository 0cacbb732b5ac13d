//! Scene assembly and initial camera framing

use crate::camera::Camera;
use crate::materials::HeadlessMaterials;
use nalgebra::{Point3, Vector3};
use viscrate_core::{AxisAlignedBoundingBox, Geometry, Result};
use viscrate_gpu::{MaterialKind, PixelRect, RenderEngine, SceneHandle, SwapChainHandle, ViewHandle};

/// Camera distance as a multiple of the largest bounding box side
pub const FRAMING_DISTANCE_FACTOR: f32 = 1.25;

/// Distance used when the geometry has no extent (a single point)
const MIN_FRAMING_RADIUS: f32 = 1.0;

const CLEAR_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Everything the capture loop needs to render one geometry
#[derive(Debug, Clone)]
pub struct HeadlessScene {
    pub scene: SceneHandle,
    pub view: ViewHandle,
    pub swap_chain: SwapChainHandle,
    pub width: u32,
    pub height: u32,
    pub bounds: AxisAlignedBoundingBox,
    pub radius: f32,
    pub camera: Camera,
}

impl HeadlessScene {
    /// Center of the framed geometry
    pub fn center(&self) -> Point3<f32> {
        self.bounds.center()
    }

    /// Move the camera to `eye`, looking at the geometry center with +Y up
    pub fn set_eye<E: RenderEngine + ?Sized>(&mut self, engine: &mut E, eye: Point3<f32>) -> Result<()> {
        self.camera.look_at(self.center(), eye, Vector3::y());
        engine.set_camera(self.view, &self.camera.matrices())
    }
}

/// Union of the bounding boxes of every entity in `scene`
pub fn scene_bounds<E: RenderEngine + ?Sized>(engine: &E, scene: SceneHandle) -> AxisAlignedBoundingBox {
    let mut bounds = AxisAlignedBoundingBox::empty();
    for entity in engine.scene_entities(scene) {
        if let Some(b) = engine.entity_bounding_box(entity) {
            bounds += b;
        }
    }
    bounds
}

/// Build a scene holding `geometry` and frame it with the camera
///
/// The geometry is bound to the material chosen by `material`; the normals
/// visualization gets an instance of its own.
pub fn assemble_scene<E: RenderEngine + ?Sized>(
    engine: &mut E,
    geometry: &Geometry,
    materials: &HeadlessMaterials,
    material: MaterialKind,
    width: u32,
    height: u32,
) -> Result<HeadlessScene> {
    let scene = engine.create_scene();
    let view = engine.create_view(scene, PixelRect::full(width, height))?;
    engine.set_clear_color(view, CLEAR_COLOR)?;
    let swap_chain = engine.create_swap_chain(width, height)?;

    let instance = match materials.instance_for(material) {
        Some(instance) => instance,
        None => engine.create_material_instance(material)?,
    };
    engine.add_geometry(scene, geometry, instance)?;

    let bounds = scene_bounds(engine, scene);
    let mut radius = FRAMING_DISTANCE_FACTOR * bounds.max_extent();
    if !radius.is_finite() || radius <= f32::EPSILON {
        log::warn!("geometry has no extent, framing at distance {}", MIN_FRAMING_RADIUS);
        radius = MIN_FRAMING_RADIUS;
    }

    let mut assembled = HeadlessScene {
        scene,
        view,
        swap_chain,
        width,
        height,
        bounds,
        radius,
        camera: Camera::for_viewport(width, height),
    };
    let eye = assembled.center() + Vector3::new(0.0, 0.0, radius);
    assembled.set_eye(engine, eye)?;

    log::info!(
        "scene assembled: center {:?}, extent {:?}, camera radius {}",
        assembled.center(),
        bounds.extent(),
        radius
    );
    Ok(assembled)
}
