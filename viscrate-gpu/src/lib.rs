//! # Viscrate GPU
//!
//! Off-screen rendering for meshes and point clouds on wgpu.
//!
//! [`RenderEngine`] and [`FrameRenderer`] describe what the headless
//! pipeline needs from a renderer; [`WgpuEngine`] implements them on any
//! adapter wgpu can open without a window.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use viscrate_gpu::{RenderEngine, WgpuEngine};
//!
//! fn example() -> viscrate_core::Result<()> {
//!     let mut engine = WgpuEngine::new()?;
//!     let scene = engine.create_scene();
//!     let swap_chain = engine.create_swap_chain(640, 480)?;
//!     # let _ = (scene, swap_chain);
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod engine;
pub mod mesh;
pub mod wgpu_engine;

// Re-export commonly used items
pub use device::GpuContext;
pub use engine::*;
pub use mesh::{geometry_vertices, mesh_vertices, point_cloud_vertices, MeshVertex};
pub use wgpu_engine::WgpuEngine;
