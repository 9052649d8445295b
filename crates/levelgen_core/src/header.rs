//! C++ level header generation.
//!
//! Produces a header declaring one static `gltf::Node` array per level. Each
//! entry points at a mesh constant generated for the file that authored the
//! mesh, and carries the placement's transform converted to the engine's
//! Y-up convention.

use std::fmt::Write;

use levelgen_math::{QuatExt, Vec3Ext};
use thiserror::Error;

use crate::flatten::{normalize_mesh_name, ExportRecord, FlattenedScene};

/// Errors that can occur during header generation.
#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("object '{object}' has a non-finite {component} and cannot be written as a float literal")]
    NonFinite {
        object: String,
        component: &'static str,
    },

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Result type for header generation.
pub type HeaderResult<T> = Result<T, HeaderError>;

/// Names and paths baked into the generated text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitOptions {
    /// Directory prefix of the per-file object headers
    pub include_dir: String,

    /// Namespace enclosing every level
    pub level_namespace: String,

    /// Namespace enclosing every per-file mesh constant
    pub object_namespace: String,

    /// C++ type of an array element
    pub node_type: String,

    /// Name of the emitted array
    pub array_name: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            include_dir: "gen/objects".to_string(),
            level_namespace: "assets::levels".to_string(),
            object_namespace: "assets::objects".to_string(),
            node_type: "gltf::Node".to_string(),
            array_name: "nodes".to_string(),
        }
    }
}

/// File name without directory or final extension.
///
/// Both `/` and `\` count as separators; host library paths such as
/// `//props/tree.blend` reduce to `tree`.
pub fn file_base_name(path: &str) -> &str {
    let file = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path);
    match file.rfind('.') {
        Some(0) | None => file,
        Some(dot) => &file[..dot],
    }
}

/// Format a float as a C++ `float` literal, e.g. `1.0f`, `-0.5f`, `1e-7f`.
///
/// Uses the shortest representation that reads back to the same `f32`, which
/// always carries a fractional part or an exponent.
pub fn float_literal(value: f32) -> String {
    format!("{:?}f", value)
}

/// Writes level headers from flattened scenes.
#[derive(Clone, Debug, Default)]
pub struct HeaderEmitter {
    options: EmitOptions,
}

impl HeaderEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// Generate the complete header text.
    pub fn emit(&self, flat: &FlattenedScene<'_>) -> HeaderResult<String> {
        let opts = &self.options;
        let mut out = String::new();

        out.push_str("#pragma once\n");
        for file in &flat.linked_files {
            writeln!(out, "#include \"{}/{}.h\"", opts.include_dir, file_base_name(file))?;
        }
        write!(
            out,
            "namespace {}::{} {{\n\n    const {} {}[] = {{",
            opts.level_namespace,
            file_base_name(flat.scene_path),
            opts.node_type,
            opts.array_name
        )?;

        let mut delim = "";
        for record in &flat.records {
            out.push_str(delim);
            self.write_entry(&mut out, record)?;
            delim = ",";
        }

        out.push_str("\n    };\n}\n");
        Ok(out)
    }

    /// Write one array initializer entry.
    fn write_entry(&self, out: &mut String, record: &ExportRecord<'_>) -> HeaderResult<()> {
        let object = &record.placement.name;
        let transform = &record.placement.transform;

        let t = transform.location.to_y_up();
        let r = transform.rotation.to_quat().to_y_up();
        let s = transform.scale.to_y_up_scale();

        check_finite(object, "location", &t.to_array())?;
        check_finite(object, "rotation", &[r.w, r.x, r.y, r.z])?;
        check_finite(object, "scale", &s.to_array())?;

        let indent = "            ";
        out.push_str("\n        {\n");
        writeln!(out, "{indent}\"\",")?;
        writeln!(
            out,
            "{indent}&{}::{}::{}_mesh,",
            self.options.object_namespace,
            file_base_name(record.origin_file),
            normalize_mesh_name(record.mesh_name())
        )?;
        writeln!(
            out,
            "{indent}{{{}, {}, {}}},",
            float_literal(t.x),
            float_literal(t.y),
            float_literal(t.z)
        )?;
        writeln!(
            out,
            "{indent}{{{}, {}, {}, {}}},",
            float_literal(r.w),
            float_literal(r.x),
            float_literal(r.y),
            float_literal(r.z)
        )?;
        writeln!(
            out,
            "{indent}{{{}, {}, {}}},",
            float_literal(s.x),
            float_literal(s.y),
            float_literal(s.z)
        )?;
        // parent, children, children_size
        writeln!(out, "{indent}nullptr,")?;
        writeln!(out, "{indent}nullptr,")?;
        writeln!(out, "{indent}0")?;
        out.push_str("        }");
        Ok(())
    }
}

fn check_finite(object: &str, component: &'static str, values: &[f32]) -> HeaderResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(HeaderError::NonFinite {
            object: object.to_string(),
            component,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::scene::{DataBlock, ObjectTransform, Rotation, Scene, SceneObject};
    use levelgen_math::{EulerOrder, Quat, Vec3};
    use std::f32::consts::FRAC_PI_2;

    fn emit(scene: &Scene) -> String {
        let flat = flatten(scene).unwrap();
        HeaderEmitter::default().emit(&flat).unwrap()
    }

    #[test]
    fn test_file_base_name() {
        assert_eq!(file_base_name("/levels/forest.blend"), "forest");
        assert_eq!(file_base_name("//props/tree.blend"), "tree");
        assert_eq!(file_base_name("C:\\assets\\rock.blend"), "rock");
        assert_eq!(file_base_name("props/tree.v2.usda"), "tree.v2");
        assert_eq!(file_base_name("noext"), "noext");
        assert_eq!(file_base_name(".hidden"), ".hidden");
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(float_literal(1.0), "1.0f");
        assert_eq!(float_literal(0.0), "0.0f");
        assert_eq!(float_literal(-0.0), "-0.0f");
        assert_eq!(float_literal(-2.5), "-2.5f");
        assert_eq!(float_literal(0.1), "0.1f");
    }

    #[test]
    fn test_identity_entry_exact_text() {
        let mut scene = Scene::new("/levels/test_level.blend");
        scene.add_object(SceneObject::mesh(
            "Cube",
            DataBlock::local("Cube.001"),
            ObjectTransform::default().with_rotation(Rotation::Quaternion(Quat::IDENTITY)),
        ));

        let expected = "#pragma once\n\
#include \"gen/objects/test_level.h\"\n\
namespace assets::levels::test_level {\n\
\n    const gltf::Node nodes[] = {\n        {\n            \"\",\n            &assets::objects::test_level::Cube_001_mesh,\n            {0.0f, 0.0f, -0.0f},\n            {1.0f, 0.0f, 0.0f, -0.0f},\n            {1.0f, 1.0f, 1.0f},\n            nullptr,\n            nullptr,\n            0\n        }\n    };\n}\n";

        assert_eq!(emit(&scene), expected);
    }

    #[test]
    fn test_entries_are_comma_separated() {
        let mut scene = Scene::new("level.blend");
        scene.add_object(SceneObject::mesh("A", DataBlock::local("A"), ObjectTransform::default()));
        scene.add_object(SceneObject::mesh("B", DataBlock::local("B"), ObjectTransform::default()));

        let text = emit(&scene);
        assert!(text.contains("            0\n        },\n        {\n"));
        assert!(text.ends_with("            0\n        }\n    };\n}\n"));
        assert_eq!(text.matches("_mesh,").count(), 2);
    }

    #[test]
    fn test_translation_and_scale_remap() {
        let mut scene = Scene::new("level.blend");
        let transform = ObjectTransform::from_location(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(Vec3::new(1.0, 2.0, 3.0));
        scene.add_object(SceneObject::mesh("A", DataBlock::local("A"), transform));

        let text = emit(&scene);
        assert!(text.contains("{1.0f, 3.0f, -2.0f},"));
        assert!(text.contains("{1.0f, 3.0f, 2.0f},"));
    }

    #[test]
    fn test_quaternion_rotation_remap() {
        let mut scene = Scene::new("level.blend");
        let q = Quat::from_xyzw(0.5, 0.25, 0.125, 0.75);
        let transform = ObjectTransform::default().with_rotation(Rotation::Quaternion(q));
        scene.add_object(SceneObject::mesh("A", DataBlock::local("A"), transform));

        let text = emit(&scene);
        assert!(text.contains("{0.75f, 0.5f, 0.125f, -0.25f},"));
    }

    /// Numeric rows (`{a, b, c},`) of every entry, in order.
    fn vector_rows(text: &str) -> Vec<Vec<f32>> {
        text.lines()
            .map(str::trim)
            .filter(|l| l.starts_with('{') && l.ends_with("},"))
            .map(|l| {
                l.trim_start_matches('{')
                    .trim_end_matches("},")
                    .split(", ")
                    .map(|v| v.trim_end_matches('f').parse::<f32>().unwrap())
                    .collect()
            })
            .collect()
    }

    fn assert_row(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_quarter_turn_about_up_axis() {
        let mut scene = Scene::new("level.blend");
        let transform = ObjectTransform::default().with_rotation(Rotation::Euler {
            angles: Vec3::new(0.0, 0.0, FRAC_PI_2),
            order: EulerOrder::Xyz,
        });
        scene.add_object(SceneObject::mesh("A", DataBlock::local("A"), transform));

        let rows = vector_rows(&emit(&scene));
        assert_eq!(rows.len(), 3);
        // Source Z-up quarter turn (w, 0, 0, s) becomes a Y-up quarter turn (w, 0, s, 0)
        let (sin, cos) = (FRAC_PI_2 / 2.0).sin_cos();
        assert_row(&rows[1], &[cos, 0.0, sin, 0.0]);
    }

    #[test]
    fn test_quarter_turn_about_x_axis() {
        let mut scene = Scene::new("level.blend");
        let transform = ObjectTransform::default().with_rotation(Rotation::Euler {
            angles: Vec3::new(FRAC_PI_2, 0.0, 0.0),
            order: EulerOrder::Xyz,
        });
        scene.add_object(SceneObject::mesh("A", DataBlock::local("A"), transform));

        let rows = vector_rows(&emit(&scene));
        let (sin, cos) = (FRAC_PI_2 / 2.0).sin_cos();
        assert_row(&rows[0], &[0.0, 0.0, 0.0]);
        assert_row(&rows[1], &[cos, sin, 0.0, 0.0]);
        assert_row(&rows[2], &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_includes_and_mesh_namespaces() {
        let mut scene = Scene::new("/levels/forest.blend");
        let lib = scene.library_id("//props/tree.blend");
        let tree_mesh = scene.add_object(SceneObject::mesh(
            "TreeMesh",
            DataBlock::linked("Tree.002", lib),
            ObjectTransform::default(),
        ));
        let tree = scene.add_collection("Tree", Some(lib));
        scene.link_to_collection(tree, tree_mesh);
        scene.add_object(SceneObject::collection_instance("Tree.001", tree, ObjectTransform::default()));
        scene.add_object(SceneObject::mesh("Ground", DataBlock::local("Ground"), ObjectTransform::default()));
        scene.add_object(SceneObject::collection_instance("Tree.003", tree, ObjectTransform::default()));

        let text = emit(&scene);
        let includes: Vec<&str> = text.lines().filter(|l| l.starts_with("#include")).collect();
        assert_eq!(
            includes,
            vec!["#include \"gen/objects/tree.h\"", "#include \"gen/objects/forest.h\""]
        );
        assert!(text.contains("namespace assets::levels::forest {"));
        assert_eq!(text.matches("&assets::objects::tree::Tree_002_mesh,").count(), 2);
        assert!(text.contains("&assets::objects::forest::Ground_mesh,"));
    }

    #[test]
    fn test_custom_options() {
        let mut scene = Scene::new("arena.blend");
        scene.add_object(SceneObject::mesh("A", DataBlock::local("A"), ObjectTransform::default()));
        let flat = flatten(&scene).unwrap();

        let emitter = HeaderEmitter::new(EmitOptions {
            include_dir: "generated".to_string(),
            array_name: "arena_nodes".to_string(),
            ..Default::default()
        });
        let text = emitter.emit(&flat).unwrap();
        assert!(text.contains("#include \"generated/arena.h\""));
        assert!(text.contains("const gltf::Node arena_nodes[] = {"));
    }

    #[test]
    fn test_empty_scene() {
        let scene = Scene::new("empty.blend");
        assert_eq!(
            emit(&scene),
            "#pragma once\nnamespace assets::levels::empty {\n\n    const gltf::Node nodes[] = {\n    };\n}\n"
        );
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let mut scene = Scene::new("level.blend");
        let transform = ObjectTransform::from_location(Vec3::new(f32::NAN, 0.0, 0.0));
        scene.add_object(SceneObject::mesh("Broken", DataBlock::local("Broken"), transform));
        let flat = flatten(&scene).unwrap();

        let err = HeaderEmitter::default().emit(&flat).unwrap_err();
        assert!(matches!(err, HeaderError::NonFinite { component: "location", .. }));
    }

    #[test]
    fn test_output_is_deterministic() {
        let mut scene = Scene::new("level.blend");
        let transform = ObjectTransform::from_location(Vec3::new(0.1, -7.25, 3.0))
            .with_rotation(Rotation::Euler {
                angles: Vec3::new(0.3, 0.2, 0.1),
                order: EulerOrder::Zxy,
            });
        scene.add_object(SceneObject::mesh("A", DataBlock::local("A.001"), transform));

        assert_eq!(emit(&scene), emit(&scene));
    }
}
