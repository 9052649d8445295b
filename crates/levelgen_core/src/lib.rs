//! levelgen core - scene flattening and C++ level header generation.
//!
//! This crate provides:
//!
//! - **Scene model**: `Scene`, `SceneObject`, `Collection`, `Library`
//! - **Flattening**: resolve instance collections to concrete meshes
//! - **Header emission**: the `gltf::Node nodes[]` array with Y-up transforms
//! - **Readers**: JSON scene dumps and a USDA subset
//!
//! # Example
//!
//! ```ignore
//! use levelgen_core::{export_scene, read_scene, ExportOptions};
//!
//! let scene = read_scene("levels/forest.json")?;
//! let summary = export_scene(&scene, &ExportOptions::default())?;
//! println!("Wrote {} nodes to {}", summary.record_count, summary.output.display());
//! ```

pub mod export;
pub mod flatten;
pub mod header;
pub mod manifest;
pub mod output;
pub mod reader;
pub mod scene;
pub mod source;
pub mod usd;

// Re-export commonly used types
pub use export::{export_scene, render_header, ExportError, ExportOptions, ExportSummary};
pub use flatten::{flatten, ExportRecord, FlattenError, FlattenedScene};
pub use header::{EmitOptions, HeaderEmitter, HeaderError};
pub use manifest::{load_manifest, load_manifest_from_str, ManifestError};
pub use reader::{read_scene, ReadError, SceneFormat};
pub use scene::{
    Collection, CollectionId, DataBlock, Library, LibraryId, ObjectId, ObjectKind, ObjectTransform, Rotation, Scene,
    SceneObject,
};
pub use source::SceneSource;
pub use usd::{load_usda, load_usda_from_string};
