//! Scene file dispatch by extension.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::manifest::{load_manifest, ManifestError};
use crate::scene::Scene;
use crate::usd::{load_usda, LoadError};

/// Errors that can occur while reading a scene file.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Unsupported scene file '{}' (expected .json, .usda or .usd)", .0.display())]
    Unsupported(PathBuf),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Usd(#[from] LoadError),
}

/// Result type for scene reading.
pub type ReadResult<T> = Result<T, ReadError>;

/// Scene file formats levelgen reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneFormat {
    /// JSON scene dump written by a host script
    Json,
    /// ASCII USD layer
    Usda,
}

impl SceneFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(SceneFormat::Json),
            "usda" | "usd" => Some(SceneFormat::Usda),
            _ => None,
        }
    }
}

/// Read a scene file in any supported format.
pub fn read_scene<P: AsRef<Path>>(path: P) -> ReadResult<Scene> {
    let path = path.as_ref();
    let scene = match SceneFormat::from_path(path) {
        Some(SceneFormat::Json) => load_manifest(path)?,
        Some(SceneFormat::Usda) => load_usda(path)?,
        None => return Err(ReadError::Unsupported(path.to_path_buf())),
    };
    log::info!("Read {} ({} objects)", path.display(), scene.object_count());
    Ok(scene)
}
