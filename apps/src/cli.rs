// cli.rs - Command-line interface of the headless renderer
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use viscrate_gpu::MaterialKind;
use viscrate_visualization::{CaptureOptions, HeadlessConfig, DEFAULT_IBL};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialArg {
    /// Color by surface normal
    Normals,
    Lit,
    Unlit,
}

impl From<MaterialArg> for MaterialKind {
    fn from(arg: MaterialArg) -> Self {
        match arg {
            MaterialArg::Normals => MaterialKind::Normals,
            MaterialArg::Lit => MaterialKind::Lit,
            MaterialArg::Unlit => MaterialKind::Unlit,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "viscrate-headless")]
#[command(about = "Render an orbit of a mesh or point cloud to PNG frames", long_about = None)]
pub struct Cli {
    /// Mesh or point cloud to render (.ply, .obj, .xyz)
    pub model: Option<PathBuf>,

    /// Basename of the <name>_ibl.ktx and <name>_skybox.ktx lighting files
    #[arg(default_value = DEFAULT_IBL)]
    pub ibl: String,

    #[arg(long, default_value_t = 1920)]
    pub width: u32,

    #[arg(long, default_value_t = 1080)]
    pub height: u32,

    /// Number of orbit frames, one degree apart
    #[arg(long, default_value_t = 360)]
    pub frames: u32,

    #[arg(long, default_value = "headless_out")]
    pub output_dir: PathBuf,

    /// Material the geometry is drawn with
    #[arg(long, value_enum, default_value_t = MaterialArg::Normals)]
    pub material: MaterialArg,

    /// Directory holding the lighting files
    #[arg(long)]
    pub resource_path: Option<PathBuf>,

    /// Seconds to wait for each frame readback
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Frame starts to try before a capture fails
    #[arg(long, default_value_t = 3)]
    pub begin_attempts: u32,
}

impl Cli {
    /// Renderer configuration for `model`
    pub fn config(&self, model: PathBuf) -> HeadlessConfig {
        HeadlessConfig {
            model,
            ibl: self.ibl.clone(),
            width: self.width,
            height: self.height,
            frames: self.frames,
            output_dir: self.output_dir.clone(),
            material: self.material.into(),
            resource_path: self.resource_path.clone(),
            capture: CaptureOptions {
                timeout: Duration::from_secs(self.timeout_secs),
                begin_attempts: self.begin_attempts,
            },
        }
    }
}
