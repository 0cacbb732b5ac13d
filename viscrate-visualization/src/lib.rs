//! Headless visualization for 3D data
//!
//! This crate turns a mesh or point cloud file into a sequence of rendered
//! frames without a window:
//! - Geometry loading with mesh-to-point-cloud fallback
//! - Material and texture binding
//! - Scene assembly, lighting and camera framing
//! - Synchronous frame capture over an asynchronous readback
//! - Orbit camera path
//!
//! Rendering goes through the [`viscrate_gpu::RenderEngine`] trait.

pub mod camera;
pub mod capture;
pub mod headless;
pub mod lighting;
pub mod loader;
pub mod materials;
pub mod orbit;
pub mod resources;
pub mod scene;

#[cfg(test)]
mod tests;

pub use camera::*;
pub use capture::{render_snapshot, CaptureOptions, CaptureOutcome, CaptureState};
pub use headless::{render_geometry, run, HeadlessConfig, DEFAULT_IBL};
pub use lighting::{lighting_file_names, setup_lighting, LightSettings, IBL_INTENSITY};
pub use loader::load_geometry;
pub use materials::{HeadlessMaterials, MaterialProperties};
pub use orbit::{frame_file_name, orbit_eye, run_orbit, OrbitSummary, DEFAULT_ORBIT_FRAMES};
pub use resources::{ResourceLocator, RESOURCE_PATH_ENV};
pub use scene::{assemble_scene, scene_bounds, HeadlessScene};
