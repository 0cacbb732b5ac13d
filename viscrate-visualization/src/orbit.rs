//! Orbit camera path and the per-frame capture loop

use crate::capture::{render_snapshot, CaptureOptions, CaptureOutcome};
use crate::scene::HeadlessScene;
use nalgebra::{Point3, Vector3};
use std::path::{Path, PathBuf};
use viscrate_core::Result;
use viscrate_gpu::RenderEngine;

/// Frames in a full orbit, one per degree
pub const DEFAULT_ORBIT_FRAMES: u32 = 360;
/// Amplitude of the vertical bob, in scene units
const ORBIT_BOB_HEIGHT: f32 = 2.0;

/// Eye position of frame `index`
///
/// The azimuth advances one degree per frame; the eye bobs up and down
/// twice per revolution.
pub fn orbit_eye(center: Point3<f32>, radius: f32, index: u32) -> Point3<f32> {
    let azimuth = (index as f32).to_radians();
    center
        + Vector3::new(
            azimuth.sin() * radius,
            (2.0 * azimuth).sin() * ORBIT_BOB_HEIGHT,
            azimuth.cos() * radius,
        )
}

/// File name of frame `index`
pub fn frame_file_name(index: u32) -> String {
    format!("out_{:05}.png", index)
}

/// Counts of what happened to each captured frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrbitSummary {
    pub saved: u32,
    pub write_failed: u32,
    pub discarded: u32,
}

impl OrbitSummary {
    fn record(&mut self, outcome: CaptureOutcome) {
        match outcome {
            CaptureOutcome::Saved => self.saved += 1,
            CaptureOutcome::WriteFailed => self.write_failed += 1,
            CaptureOutcome::Discarded => self.discarded += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.saved + self.write_failed + self.discarded
    }
}

/// Render `frames` frames around the scene into `output_dir`
///
/// Frames are captured strictly one after another. A capture error stops
/// the orbit; frames that could not be saved are only counted.
pub fn run_orbit<E: RenderEngine + ?Sized>(
    engine: &mut E,
    scene: &mut HeadlessScene,
    output_dir: &Path,
    frames: u32,
    options: &CaptureOptions,
) -> Result<OrbitSummary> {
    std::fs::create_dir_all(output_dir)?;

    let center = scene.center();
    let mut summary = OrbitSummary::default();

    for i in 0..frames {
        scene.set_eye(engine, orbit_eye(center, scene.radius, i))?;

        let filename: PathBuf = output_dir.join(frame_file_name(i));
        let outcome = render_snapshot(
            engine,
            scene.view,
            scene.swap_chain,
            scene.width,
            scene.height,
            &filename,
            options,
        )?;
        summary.record(outcome);

        if (i + 1) % 30 == 0 || i + 1 == frames {
            log::info!("captured {}/{} frames", i + 1, frames);
        }
    }

    log::info!(
        "orbit finished: {} saved, {} failed to write, {} discarded",
        summary.saved,
        summary.write_failed,
        summary.discarded
    );
    log::info!(
        "to make a video: ffmpeg -framerate 30 -i {}/out_%05d.png -c:v libx264 -pix_fmt yuv420p orbit.mp4",
        output_dir.display()
    );
    Ok(summary)
}
