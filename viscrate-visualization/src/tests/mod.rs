//! Pipeline tests against a scripted rendering engine

pub mod fake_engine;

mod pipeline_tests;

use std::path::PathBuf;

/// Fresh, empty directory under the system temp dir
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("viscrate_vis_{}_{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
