//! Scene flattening: resolve every placement object to a concrete mesh.
//!
//! Objects are visited once, in host order. A local mesh object resolves to
//! itself; an object instancing a collection resolves to the first mesh-typed
//! member of that collection. The result is an ordered list of
//! [`ExportRecord`]s plus the set of files those meshes come from.

use thiserror::Error;

use crate::scene::{ObjectId, SceneObject};
use crate::source::SceneSource;

/// Errors that can occur while flattening a scene.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
    #[error("no mesh object found in instance collection '{0}'")]
    UnresolvableInstanceCollection(String),

    #[error("object {0:?} is listed by the scene but cannot be resolved")]
    MissingObject(ObjectId),

    #[error("object '{object}' instances a collection that does not exist")]
    MissingCollection { object: String },

    #[error("object '{object}' resolves to a mesh with an empty name")]
    EmptyMeshName { object: String },
}

/// Result type for flattening.
pub type FlattenResult<T> = Result<T, FlattenError>;

/// One resolved placement: where it is, which file owns its mesh, and the mesh object.
#[derive(Clone, Copy, Debug)]
pub struct ExportRecord<'a> {
    /// The object carrying the transform
    pub placement: &'a SceneObject,

    /// File that authored the mesh (scene file or linked library)
    pub origin_file: &'a str,

    /// The object whose mesh data is referenced
    pub mesh: &'a SceneObject,
}

impl<'a> ExportRecord<'a> {
    /// Name of the referenced mesh data block, as authored.
    pub fn mesh_name(&self) -> &'a str {
        self.mesh.data.as_ref().map(|d| d.name.as_str()).unwrap_or("")
    }
}

/// A scene reduced to export records.
#[derive(Clone, Debug)]
pub struct FlattenedScene<'a> {
    /// Path of the scene file being exported
    pub scene_path: &'a str,

    /// Records in discovery order
    pub records: Vec<ExportRecord<'a>>,

    /// Distinct origin files, in first-seen order
    pub linked_files: Vec<&'a str>,
}

impl FlattenedScene<'_> {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Replace characters that are not valid in a C++ identifier fragment.
///
/// Host data-block names use `.` for numbered duplicates (`Cube.001`).
pub fn normalize_mesh_name(name: &str) -> String {
    name.replace('.', "_")
}

/// Flatten a scene into export records.
///
/// Fails on the first instance collection that has no mesh-typed member.
pub fn flatten<S: SceneSource + ?Sized>(source: &S) -> FlattenResult<FlattenedScene<'_>> {
    let scene_path = source.scene_path();
    let mut records = Vec::new();
    let mut linked_files: Vec<&str> = Vec::new();

    for id in source.list_objects() {
        let object = source.object(id).ok_or(FlattenError::MissingObject(id))?;

        let resolved = match object.instance_collection {
            None => resolve_direct(source, id, object),
            Some(collection_id) => {
                let collection = source
                    .collection(collection_id)
                    .ok_or_else(|| FlattenError::MissingCollection {
                        object: object.name.clone(),
                    })?;

                let member = source
                    .resolve_collection_members(collection_id)
                    .into_iter()
                    .filter_map(|member_id| source.object(member_id))
                    .find(|member| member.kind.is_mesh())
                    .ok_or_else(|| FlattenError::UnresolvableInstanceCollection(collection.name.clone()))?;

                log::debug!(
                    "{}: instance of '{}' resolved to '{}'",
                    object.name,
                    collection.name,
                    member.name
                );
                Some(ExportRecord {
                    placement: object,
                    origin_file: source.origin_file(collection.library),
                    mesh: member,
                })
            }
        };

        let Some(record) = resolved else {
            continue;
        };

        if normalize_mesh_name(record.mesh_name()).is_empty() {
            return Err(FlattenError::EmptyMeshName {
                object: object.name.clone(),
            });
        }

        if !linked_files.contains(&record.origin_file) {
            linked_files.push(record.origin_file);
        }
        records.push(record);
    }

    Ok(FlattenedScene {
        scene_path,
        records,
        linked_files,
    })
}

/// Resolve an object without an instance collection.
fn resolve_direct<'a, S: SceneSource + ?Sized>(
    source: &'a S,
    id: ObjectId,
    object: &'a SceneObject,
) -> Option<ExportRecord<'a>> {
    match source.resolve_mesh(id) {
        Some(data) if !data.is_linked() => Some(ExportRecord {
            placement: object,
            origin_file: source.scene_path(),
            mesh: object,
        }),
        Some(_) => {
            log::debug!("{}: linked object, skipped", object.name);
            None
        }
        None => {
            log::debug!("{}: no local mesh data ({:?}), skipped", object.name, object.kind);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{CollectionId, DataBlock, ObjectKind, ObjectTransform, Scene};

    fn mesh(name: &str, data: DataBlock) -> SceneObject {
        SceneObject::mesh(name, data, ObjectTransform::default())
    }

    /// Scene with one local cube, two tree instances and one rock instance.
    fn forest() -> Scene {
        let mut scene = Scene::new("/levels/forest.blend");
        let tree_lib = scene.library_id("//props/tree.blend");
        let rock_lib = scene.library_id("//props/rock.blend");

        scene.add_object(mesh("Ground", DataBlock::local("Plane.001")));

        let trunk_empty = scene.add_object(SceneObject {
            name: "TreeRoot".to_string(),
            kind: ObjectKind::Empty,
            data: None,
            instance_collection: None,
            transform: ObjectTransform::default(),
        });
        let tree_mesh = scene.add_object(mesh("TreeMesh", DataBlock::linked("Tree.002", tree_lib)));
        let leaves = scene.add_object(mesh("Leaves", DataBlock::linked("Leaves", tree_lib)));
        let rock_mesh = scene.add_object(mesh("Rock", DataBlock::linked("Rock", rock_lib)));

        let tree = scene.add_collection("Tree", Some(tree_lib));
        scene.link_to_collection(tree, trunk_empty);
        scene.link_to_collection(tree, tree_mesh);
        scene.link_to_collection(tree, leaves);
        let rock = scene.add_collection("Rock", Some(rock_lib));
        scene.link_to_collection(rock, rock_mesh);

        scene.add_object(SceneObject::collection_instance("Tree.001", tree, ObjectTransform::default()));
        scene.add_object(SceneObject::collection_instance("Rock.001", rock, ObjectTransform::default()));
        scene.add_object(SceneObject::collection_instance("Tree.003", tree, ObjectTransform::default()));
        scene
    }

    #[test]
    fn test_direct_mesh_resolves_to_itself() {
        let scene = forest();
        let flat = flatten(&scene).unwrap();

        let ground = &flat.records[0];
        assert_eq!(ground.placement.name, "Ground");
        assert_eq!(ground.mesh.name, "Ground");
        assert_eq!(ground.origin_file, "/levels/forest.blend");
        assert_eq!(ground.mesh_name(), "Plane.001");
    }

    #[test]
    fn test_instance_resolves_to_first_mesh_member() {
        let scene = forest();
        let flat = flatten(&scene).unwrap();

        assert_eq!(flat.record_count(), 4);
        let tree = &flat.records[1];
        assert_eq!(tree.placement.name, "Tree.001");
        assert_eq!(tree.mesh.name, "TreeMesh");
        assert_eq!(tree.mesh_name(), "Tree.002");
        assert_eq!(tree.origin_file, "//props/tree.blend");

        let rock = &flat.records[2];
        assert_eq!(rock.placement.name, "Rock.001");
        assert_eq!(rock.origin_file, "//props/rock.blend");
    }

    #[test]
    fn test_linked_objects_are_skipped() {
        let scene = forest();
        let flat = flatten(&scene).unwrap();

        let placements: Vec<&str> = flat.records.iter().map(|r| r.placement.name.as_str()).collect();
        assert_eq!(placements, vec!["Ground", "Tree.001", "Rock.001", "Tree.003"]);
    }

    #[test]
    fn test_linked_files_first_seen_order() {
        let scene = forest();
        let flat = flatten(&scene).unwrap();

        assert_eq!(
            flat.linked_files,
            vec!["/levels/forest.blend", "//props/tree.blend", "//props/rock.blend"]
        );
    }

    #[test]
    fn test_collection_without_mesh_is_fatal() {
        let mut scene = Scene::new("level.blend");
        let lib = scene.library_id("//lights.blend");
        let lamp = scene.add_object(SceneObject {
            name: "Lamp".to_string(),
            kind: ObjectKind::Light,
            data: Some(DataBlock::linked("Lamp", lib)),
            instance_collection: None,
            transform: ObjectTransform::default(),
        });
        let lights = scene.add_collection("Lights", Some(lib));
        scene.link_to_collection(lights, lamp);
        scene.add_object(mesh("Cube", DataBlock::local("Cube")));
        scene.add_object(SceneObject::collection_instance("Lights.001", lights, ObjectTransform::default()));

        let err = flatten(&scene).unwrap_err();
        assert_eq!(err, FlattenError::UnresolvableInstanceCollection("Lights".to_string()));
        assert!(err.to_string().contains("Lights"));
    }

    #[test]
    fn test_local_collection_uses_scene_file() {
        let mut scene = Scene::new("/levels/town.blend");
        let house = scene.add_object(mesh("House", DataBlock::local("House")));
        let coll = scene.add_collection("Houses", None);
        scene.link_to_collection(coll, house);
        scene.add_object(SceneObject::collection_instance("House.001", coll, ObjectTransform::default()));

        let flat = flatten(&scene).unwrap();
        assert_eq!(flat.record_count(), 2);
        assert_eq!(flat.records[1].origin_file, "/levels/town.blend");
        assert_eq!(flat.linked_files, vec!["/levels/town.blend"]);
    }

    #[test]
    fn test_dangling_collection() {
        let mut scene = Scene::new("level.blend");
        scene.add_object(SceneObject::collection_instance("Ghost", CollectionId(4), ObjectTransform::default()));

        let err = flatten(&scene).unwrap_err();
        assert_eq!(err, FlattenError::MissingCollection { object: "Ghost".to_string() });
    }

    #[test]
    fn test_empty_mesh_name_is_rejected() {
        let mut scene = Scene::new("level.blend");
        scene.add_object(mesh("Nameless", DataBlock::local("")));

        let err = flatten(&scene).unwrap_err();
        assert_eq!(err, FlattenError::EmptyMeshName { object: "Nameless".to_string() });
    }

    #[test]
    fn test_normalize_mesh_name() {
        assert_eq!(normalize_mesh_name("Cube.001"), "Cube_001");
        assert_eq!(normalize_mesh_name("a.b.c"), "a_b_c");
        assert_eq!(normalize_mesh_name("Plain"), "Plain");
    }
}
