//! Resource directory lookup

use std::path::{Path, PathBuf};
use viscrate_core::{Error, Result};

/// Environment variable that overrides the resource directory
pub const RESOURCE_PATH_ENV: &str = "VISCRATE_RESOURCE_PATH";

/// Resolves material and lighting asset names against a root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    root: PathBuf,
}

impl ResourceLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Pick the resource root: `explicit`, else `$VISCRATE_RESOURCE_PATH`,
    /// else `resources/` next to the running executable
    pub fn locate(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = explicit {
            return Ok(Self::new(root));
        }
        if let Some(root) = std::env::var_os(RESOURCE_PATH_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(root));
        }

        let exe = std::env::current_exe()?;
        let dir = exe
            .parent()
            .ok_or_else(|| Error::InvalidData(format!("executable path {} has no parent", exe.display())))?;
        Ok(Self::new(dir.join("resources")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}
