//! Level export: flatten, emit, write.
//!
//! This is the entry point callers use. Nothing is written unless the whole
//! scene resolves and the header text is complete.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::flatten::{flatten, FlattenError};
use crate::header::{file_base_name, EmitOptions, HeaderEmitter, HeaderError};
use crate::output::write_atomic;
use crate::source::SceneSource;

/// Errors that can occur during export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Export settings.
#[derive(Clone, Debug, Default)]
pub struct ExportOptions {
    /// Header path; defaults to `<scene dir>/<scene base name>.h`
    pub output: Option<PathBuf>,

    /// Text generation settings
    pub emit: EmitOptions,
}

impl ExportOptions {
    /// Resolve the header path for a scene file.
    pub fn output_path(&self, scene_path: &str) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => default_output_path(scene_path),
        }
    }
}

/// `<scene dir>/<scene base name>.h`.
pub fn default_output_path(scene_path: &str) -> PathBuf {
    let dir = Path::new(scene_path).parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{}.h", file_base_name(scene_path)))
}

/// What an export produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    /// Header that was written
    pub output: PathBuf,

    /// Number of array entries
    pub record_count: usize,

    /// Origin files included, in include order
    pub linked_files: Vec<String>,
}

/// Flatten and emit a scene without touching the filesystem.
pub fn render_header<S: SceneSource + ?Sized>(source: &S, options: &EmitOptions) -> ExportResult<String> {
    let flat = flatten(source)?;
    if flat.is_empty() {
        log::warn!("{}: no exportable objects", source.scene_path());
    }
    let text = HeaderEmitter::new(options.clone()).emit(&flat)?;
    Ok(text)
}

/// Export a scene to its level header.
///
/// On failure the existing header (if any) is left untouched.
pub fn export_scene<S: SceneSource + ?Sized>(source: &S, options: &ExportOptions) -> ExportResult<ExportSummary> {
    let flat = flatten(source)?;
    if flat.is_empty() {
        log::warn!("{}: no exportable objects", source.scene_path());
    }
    let text = HeaderEmitter::new(options.emit.clone()).emit(&flat)?;

    let output = options.output_path(source.scene_path());
    write_atomic(&output, &text).map_err(|e| ExportError::Io {
        path: output.clone(),
        source: e,
    })?;

    log::info!(
        "Write: {} ({} nodes, {} includes)",
        output.display(),
        flat.record_count(),
        flat.linked_files.len()
    );

    Ok(ExportSummary {
        output,
        record_count: flat.record_count(),
        linked_files: flat.linked_files.iter().map(|f| f.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DataBlock, ObjectKind, ObjectTransform, Scene, SceneObject};
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("levelgen_export_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn simple_scene(dir: &Path) -> Scene {
        let mut scene = Scene::new(dir.join("arena.blend").to_string_lossy());
        scene.add_object(SceneObject::mesh("Floor", DataBlock::local("Floor"), ObjectTransform::default()));
        scene
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(default_output_path("/levels/forest.blend"), PathBuf::from("/levels/forest.h"));
        assert_eq!(default_output_path("forest.usda"), PathBuf::from("forest.h"));
    }

    #[test]
    fn test_export_writes_header_next_to_scene() {
        let dir = scratch_dir("default");
        let scene = simple_scene(&dir);

        let summary = export_scene(&scene, &ExportOptions::default()).unwrap();
        assert_eq!(summary.output, dir.join("arena.h"));
        assert_eq!(summary.record_count, 1);
        assert_eq!(summary.linked_files.len(), 1);

        let text = fs::read_to_string(&summary.output).unwrap();
        assert_eq!(text, render_header(&scene, &EmitOptions::default()).unwrap());
        assert!(text.contains("&assets::objects::arena::Floor_mesh,"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = scratch_dir("rerun");
        let scene = simple_scene(&dir);
        let options = ExportOptions::default();

        let first = export_scene(&scene, &options).unwrap();
        let before = fs::read(&first.output).unwrap();
        let second = export_scene(&scene, &options).unwrap();
        let after = fs::read(&second.output).unwrap();

        assert_eq!(before, after);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_failed_export_keeps_previous_header() {
        let dir = scratch_dir("keep");
        let out = dir.join("level.h");
        fs::write(&out, "previous").unwrap();

        let mut scene = simple_scene(&dir);
        let lib = scene.library_id("//fx.blend");
        let light = scene.add_object(SceneObject {
            name: "Glow".to_string(),
            kind: ObjectKind::Light,
            data: Some(DataBlock::linked("Glow", lib)),
            instance_collection: None,
            transform: ObjectTransform::default(),
        });
        let fx = scene.add_collection("Fx", Some(lib));
        scene.link_to_collection(fx, light);
        scene.add_object(SceneObject::collection_instance("Fx.001", fx, ObjectTransform::default()));

        let options = ExportOptions {
            output: Some(out.clone()),
            ..Default::default()
        };
        let err = export_scene(&scene, &options).unwrap_err();
        assert!(matches!(
            err,
            ExportError::Flatten(FlattenError::UnresolvableInstanceCollection(ref name)) if name == "Fx"
        ));
        assert_eq!(fs::read_to_string(&out).unwrap(), "previous");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unwritable_output_reports_path() {
        let dir = scratch_dir("unwritable");
        let scene = simple_scene(&dir);
        let options = ExportOptions {
            output: Some(dir.join("missing").join("arena.h")),
            ..Default::default()
        };

        let err = export_scene(&scene, &options).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
        assert!(err.to_string().contains("arena.h"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
