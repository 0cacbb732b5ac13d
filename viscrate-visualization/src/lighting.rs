//! Image based lighting and skybox setup

use crate::resources::ResourceLocator;
use viscrate_gpu::{IndirectLightHandle, RenderEngine, ResourceLoadRequest, SceneHandle, SkyboxHandle};

/// Indirect light intensity applied to every scene
pub const IBL_INTENSITY: f32 = 45_000.0;

/// Lighting resources attached to a scene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightSettings {
    pub ibl: Option<IndirectLightHandle>,
    pub sky: Option<SkyboxHandle>,
}

/// File names of the lighting assets for an IBL basename
pub fn lighting_file_names(basename: &str) -> (String, String) {
    (format!("{}_ibl.ktx", basename), format!("{}_skybox.ktx", basename))
}

/// Load the indirect light and skybox and attach them to `scene`
///
/// Either half may fail independently; the failure is logged and the scene
/// renders without it.
pub fn setup_lighting<E: RenderEngine + ?Sized>(
    engine: &mut E,
    scene: SceneHandle,
    resources: &ResourceLocator,
    ibl_name: &str,
    sky_name: &str,
) -> LightSettings {
    let mut settings = LightSettings::default();

    let ibl_path = resources.resolve(ibl_name);
    let ibl = engine
        .add_indirect_light(&ResourceLoadRequest::from_path(&ibl_path))
        .and_then(|light| engine.set_indirect_light(scene, light, IBL_INTENSITY).map(|_| light));
    match ibl {
        Ok(light) => settings.ibl = Some(light),
        Err(e) => log::warn!("could not load indirect light {}: {}", ibl_path.display(), e),
    }

    let sky_path = resources.resolve(sky_name);
    let sky = engine
        .add_skybox(&ResourceLoadRequest::from_path(&sky_path))
        .and_then(|sky| engine.set_skybox(scene, sky).map(|_| sky));
    match sky {
        Ok(sky) => settings.sky = Some(sky),
        Err(e) => log::warn!("could not load skybox {}: {}", sky_path.display(), e),
    }

    settings
}
