//! Headless render application: load, set up, orbit and capture

use crate::capture::CaptureOptions;
use crate::lighting::{lighting_file_names, setup_lighting};
use crate::loader::load_geometry;
use crate::materials::HeadlessMaterials;
use crate::orbit::{run_orbit, OrbitSummary, DEFAULT_ORBIT_FRAMES};
use crate::resources::ResourceLocator;
use crate::scene::assemble_scene;
use std::path::PathBuf;
use viscrate_core::{Error, Geometry, Result};
use viscrate_gpu::{MaterialKind, RenderEngine};

/// IBL basename used when none is given
pub const DEFAULT_IBL: &str = "hall";

/// Headless renderer configuration
#[derive(Clone, Debug)]
pub struct HeadlessConfig {
    pub model: PathBuf,
    /// Basename of the `<name>_ibl.ktx` / `<name>_skybox.ktx` pair
    pub ibl: String,
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub output_dir: PathBuf,
    pub material: MaterialKind,
    /// Resource directory; located automatically when `None`
    pub resource_path: Option<PathBuf>,
    pub capture: CaptureOptions,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::new(),
            ibl: DEFAULT_IBL.to_string(),
            width: 1920,
            height: 1080,
            frames: DEFAULT_ORBIT_FRAMES,
            output_dir: PathBuf::from("headless_out"),
            material: MaterialKind::Normals,
            resource_path: None,
            capture: CaptureOptions::default(),
        }
    }
}

/// Render an orbit of already loaded geometry
pub fn render_geometry<E: RenderEngine + ?Sized>(
    engine: &mut E,
    geometry: &Geometry,
    config: &HeadlessConfig,
) -> Result<OrbitSummary> {
    if config.width == 0 || config.height == 0 {
        return Err(Error::InvalidData(format!(
            "output size {}x{} has no pixels",
            config.width, config.height
        )));
    }
    let resources = ResourceLocator::locate(config.resource_path.clone())?;
    log::info!("resources from {}", resources.root().display());

    let mut materials = HeadlessMaterials::new(engine)?;
    materials.prepare_geometry(geometry, engine);
    materials.set_material_properties(engine)?;

    let mut scene = assemble_scene(engine, geometry, &materials, config.material, config.width, config.height)?;

    let (ibl_name, sky_name) = lighting_file_names(&config.ibl);
    let lights = setup_lighting(engine, scene.scene, &resources, &ibl_name, &sky_name);
    log::debug!("lighting: {:?}", lights);

    run_orbit(engine, &mut scene, &config.output_dir, config.frames, &config.capture)
}

/// Load `config.model` and render its orbit
pub fn run<E: RenderEngine + ?Sized>(engine: &mut E, config: &HeadlessConfig) -> Result<OrbitSummary> {
    let geometry = load_geometry(&config.model)
        .ok_or_else(|| Error::InvalidData(format!("could not load geometry from {}", config.model.display())))?;
    render_geometry(engine, &geometry, config)
}
