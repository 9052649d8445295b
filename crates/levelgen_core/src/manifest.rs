//! JSON scene dumps.
//!
//! A scene dump is the host's object list written out as-is by a small
//! in-host script: every object (linked ones included), the collections they
//! instance, and the library each data block or collection comes from.
//!
//! ```json
//! {
//!   "filepath": "/levels/forest.blend",
//!   "collections": [
//!     { "name": "Tree", "library": "//props/tree.blend", "objects": ["TreeMesh"] }
//!   ],
//!   "objects": [
//!     { "name": "Ground", "type": "MESH", "data": { "name": "Plane.001" } },
//!     { "name": "Tree.001", "type": "EMPTY", "instance_collection": "Tree",
//!       "location": [4, 2, 0] },
//!     { "name": "TreeMesh", "type": "MESH",
//!       "data": { "name": "TreeMesh", "library": "//props/tree.blend" } }
//!   ]
//! }
//! ```

use std::path::Path;

use levelgen_math::{EulerOrder, Quat, Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::scene::{CollectionId, DataBlock, LibraryId, ObjectKind, ObjectTransform, Rotation, Scene, SceneObject};

/// Errors that can occur while reading a scene dump.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("object '{object}' has unknown rotation mode '{mode}'")]
    RotationMode { object: String, mode: String },

    #[error("object '{object}' instances unknown collection '{collection}'")]
    UnknownCollection { object: String, collection: String },

    #[error("collection '{collection}' lists unknown object '{object}'")]
    UnknownMember { collection: String, object: String },
}

/// Result type for scene dump loading.
pub type ManifestResult<T> = Result<T, ManifestError>;

#[derive(Debug, Deserialize)]
struct SceneDump {
    filepath: String,
    #[serde(default)]
    collections: Vec<CollectionDump>,
    #[serde(default)]
    objects: Vec<ObjectDump>,
}

#[derive(Debug, Deserialize)]
struct CollectionDump {
    name: String,
    #[serde(default)]
    library: Option<String>,
    #[serde(default)]
    objects: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DataDump {
    name: String,
    #[serde(default)]
    library: Option<String>,
}

/// A collection reference: a bare name, or a name plus library.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CollectionRef {
    Name(String),
    Linked {
        name: String,
        #[serde(default)]
        library: Option<String>,
    },
}

impl CollectionRef {
    fn name(&self) -> &str {
        match self {
            CollectionRef::Name(name) => name,
            CollectionRef::Linked { name, .. } => name,
        }
    }

    fn library(&self) -> Option<&str> {
        match self {
            CollectionRef::Name(_) => None,
            CollectionRef::Linked { library, .. } => library.as_deref(),
        }
    }
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_rotation_mode() -> String {
    "XYZ".to_string()
}

fn default_quaternion() -> [f32; 4] {
    [1.0, 0.0, 0.0, 0.0]
}

fn default_axis_angle() -> [f32; 4] {
    [0.0, 0.0, 1.0, 0.0]
}

#[derive(Debug, Deserialize)]
struct ObjectDump {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<DataDump>,
    #[serde(default)]
    instance_collection: Option<CollectionRef>,
    #[serde(default)]
    location: [f32; 3],
    #[serde(default = "default_rotation_mode")]
    rotation_mode: String,
    #[serde(default)]
    rotation_euler: [f32; 3],
    /// (w, x, y, z)
    #[serde(default = "default_quaternion")]
    rotation_quaternion: [f32; 4],
    /// (angle, x, y, z)
    #[serde(default = "default_axis_angle")]
    rotation_axis_angle: [f32; 4],
    #[serde(default = "default_scale")]
    scale: [f32; 3],
}

impl ObjectDump {
    fn transform(&self) -> ManifestResult<ObjectTransform> {
        let rotation = match self.rotation_mode.as_str() {
            "QUATERNION" => {
                let [w, x, y, z] = self.rotation_quaternion;
                Rotation::Quaternion(Quat::from_xyzw(x, y, z, w))
            }
            "AXIS_ANGLE" => {
                let [angle, x, y, z] = self.rotation_axis_angle;
                Rotation::AxisAngle {
                    axis: Vec3::new(x, y, z),
                    angle,
                }
            }
            mode => {
                let order = mode.parse::<EulerOrder>().map_err(|_| ManifestError::RotationMode {
                    object: self.name.clone(),
                    mode: mode.to_string(),
                })?;
                Rotation::Euler {
                    angles: Vec3::from_array(self.rotation_euler),
                    order,
                }
            }
        };

        Ok(ObjectTransform {
            location: Vec3::from_array(self.location),
            rotation,
            scale: Vec3::from_array(self.scale),
        })
    }
}

/// Load a scene dump from a JSON file.
pub fn load_manifest<P: AsRef<Path>>(path: P) -> ManifestResult<Scene> {
    let content = std::fs::read_to_string(path.as_ref())?;
    load_manifest_from_str(&content)
}

/// Load a scene dump from a JSON string (useful for testing).
pub fn load_manifest_from_str(content: &str) -> ManifestResult<Scene> {
    let dump: SceneDump = serde_json::from_str(content)?;
    let mut scene = Scene::new(dump.filepath.clone());

    // Collections first so objects can point at them
    for coll in &dump.collections {
        let library = coll.library.as_deref().map(|l| scene.library_id(l));
        scene.add_collection(coll.name.clone(), library);
    }

    for obj in &dump.objects {
        let transform = obj.transform()?;
        let data = obj.data.as_ref().map(|d| DataBlock {
            name: d.name.clone(),
            library: d.library.as_deref().map(|l| scene.library_id(l)),
        });

        let instance_collection = match &obj.instance_collection {
            None => None,
            Some(reference) => Some(resolve_collection(&scene, obj, reference)?),
        };

        scene.add_object(SceneObject {
            name: obj.name.clone(),
            kind: ObjectKind::from_host_name(&obj.kind),
            data,
            instance_collection,
            transform,
        });
    }

    for (index, coll) in dump.collections.iter().enumerate() {
        let collection = CollectionId(index);
        let library = scene.collections[index].library;
        for member in &coll.objects {
            let id = scene
                .find_object(member, library)
                .ok_or_else(|| ManifestError::UnknownMember {
                    collection: coll.name.clone(),
                    object: member.clone(),
                })?;
            scene.link_to_collection(collection, id);
        }
    }

    log::debug!(
        "Loaded scene dump {}: {} objects, {} collections, {} libraries",
        scene.filepath,
        scene.object_count(),
        scene.collection_count(),
        scene.libraries.len()
    );

    Ok(scene)
}

fn resolve_collection(
    scene: &Scene,
    obj: &ObjectDump,
    reference: &CollectionRef,
) -> ManifestResult<CollectionId> {
    let name = reference.name();
    let by_library = reference.library().and_then(|path| {
        let library = scene.libraries.iter().position(|l| l.filepath == path)?;
        scene.find_collection(name, Some(LibraryId(library)))
    });

    by_library
        .or_else(|| {
            scene
                .collections
                .iter()
                .position(|c| c.name == name)
                .map(CollectionId)
        })
        .ok_or_else(|| ManifestError::UnknownCollection {
            object: obj.name.clone(),
            collection: name.to_string(),
        })
}
