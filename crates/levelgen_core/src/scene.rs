//! Scene graph types for levelgen.
//!
//! This module defines the in-memory scene that the exporter walks. It mirrors
//! the host application's object model closely: placement objects with data
//! blocks, instance collections, and linked library files.

use levelgen_math::{EulerOrder, Quat, Vec3};

/// Index of an object within a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

/// Index of a collection within a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId(pub usize);

/// Index of a linked library within a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryId(pub usize);

/// The host's object type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh,
    Empty,
    Camera,
    Light,
    Curve,
    Other(String),
}

impl ObjectKind {
    /// Parse the host's upper-case type name (`"MESH"`, `"EMPTY"`, ...).
    pub fn from_host_name(name: &str) -> Self {
        match name {
            "MESH" => ObjectKind::Mesh,
            "EMPTY" => ObjectKind::Empty,
            "CAMERA" => ObjectKind::Camera,
            "LIGHT" => ObjectKind::Light,
            "CURVE" => ObjectKind::Curve,
            other => ObjectKind::Other(other.to_string()),
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self, ObjectKind::Mesh)
    }
}

/// Object rotation as stored by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rotation {
    /// Quaternion rotation mode
    Quaternion(Quat),

    /// Euler angles in radians, applied in `order`
    Euler { angles: Vec3, order: EulerOrder },

    /// Rotation of `angle` radians about `axis`
    AxisAngle { axis: Vec3, angle: f32 },
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::Euler {
            angles: Vec3::ZERO,
            order: EulerOrder::Xyz,
        }
    }
}

impl Rotation {
    /// The equivalent quaternion. Quaternion rotations are returned unchanged.
    pub fn to_quat(&self) -> Quat {
        match *self {
            Rotation::Quaternion(q) => q,
            Rotation::Euler { angles, order } => order.to_quat(angles),
            Rotation::AxisAngle { axis, angle } => {
                if axis.length_squared() == 0.0 {
                    Quat::IDENTITY
                } else {
                    Quat::from_axis_angle(axis.normalize(), angle)
                }
            }
        }
    }
}

/// Object transform components as authored (not a composed matrix).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectTransform {
    /// Location
    pub location: Vec3,

    /// Rotation in the object's rotation mode
    pub rotation: Rotation,

    /// Per-axis scale
    pub scale: Vec3,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: Rotation::default(),
            scale: Vec3::ONE,
        }
    }
}

impl ObjectTransform {
    /// Create a new transform with only a location.
    pub fn from_location(location: Vec3) -> Self {
        Self {
            location,
            ..Default::default()
        }
    }

    /// Replace the rotation.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Replace the scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

/// An object's data block, identified by name and origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataBlock {
    /// Data block name (e.g. `Cube.001`)
    pub name: String,

    /// Library the data was linked from; `None` when authored in the scene file
    pub library: Option<LibraryId>,
}

impl DataBlock {
    /// A data block authored in the current scene file.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            library: None,
        }
    }

    /// A data block linked from a library.
    pub fn linked(name: impl Into<String>, library: LibraryId) -> Self {
        Self {
            name: name.into(),
            library: Some(library),
        }
    }

    pub fn is_linked(&self) -> bool {
        self.library.is_some()
    }
}

/// A placement node in the scene.
#[derive(Clone, Debug)]
pub struct SceneObject {
    /// Object name
    pub name: String,

    /// Object type
    pub kind: ObjectKind,

    /// Object data (mesh, camera, ...); empties have none
    pub data: Option<DataBlock>,

    /// Collection instanced by this object, if any
    pub instance_collection: Option<CollectionId>,

    /// Object transform
    pub transform: ObjectTransform,
}

impl SceneObject {
    /// A mesh object with the given data block.
    pub fn mesh(name: impl Into<String>, data: DataBlock, transform: ObjectTransform) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Mesh,
            data: Some(data),
            instance_collection: None,
            transform,
        }
    }

    /// An empty object instancing a collection.
    pub fn collection_instance(
        name: impl Into<String>,
        collection: CollectionId,
        transform: ObjectTransform,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Empty,
            data: None,
            instance_collection: Some(collection),
            transform,
        }
    }
}

/// A named, ordered group of objects used as an instance source.
#[derive(Clone, Debug)]
pub struct Collection {
    /// Collection name
    pub name: String,

    /// Library the collection was linked from
    pub library: Option<LibraryId>,

    /// Member objects in their defined order
    pub objects: Vec<ObjectId>,
}

/// A linked external file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Library {
    /// File path as authored by the host (may be relative, e.g. `//props/tree.blend`)
    pub filepath: String,
}

/// A complete scene: every object the host lists, plus collections and libraries.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Path of the scene file itself
    pub filepath: String,

    /// All objects, in host order (linked objects included)
    pub objects: Vec<SceneObject>,

    /// Collections referenced by instancing objects
    pub collections: Vec<Collection>,

    /// Linked library files
    pub libraries: Vec<Library>,
}

impl Scene {
    /// Create an empty scene for the given scene file path.
    pub fn new(filepath: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
            ..Default::default()
        }
    }

    /// Add an object and return its ID.
    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(object);
        id
    }

    /// Add an empty collection and return its ID.
    pub fn add_collection(&mut self, name: impl Into<String>, library: Option<LibraryId>) -> CollectionId {
        let id = CollectionId(self.collections.len());
        self.collections.push(Collection {
            name: name.into(),
            library,
            objects: Vec::new(),
        });
        id
    }

    /// Append an object to a collection's member list.
    ///
    /// Returns `false` if the collection does not exist.
    pub fn link_to_collection(&mut self, collection: CollectionId, object: ObjectId) -> bool {
        match self.collections.get_mut(collection.0) {
            Some(c) => {
                c.objects.push(object);
                true
            }
            None => false,
        }
    }

    /// Return the ID of the library with this path, adding it if needed.
    pub fn library_id(&mut self, filepath: &str) -> LibraryId {
        if let Some(pos) = self.libraries.iter().position(|l| l.filepath == filepath) {
            return LibraryId(pos);
        }
        let id = LibraryId(self.libraries.len());
        self.libraries.push(Library {
            filepath: filepath.to_string(),
        });
        id
    }

    /// Find a collection by name and library.
    pub fn find_collection(&self, name: &str, library: Option<LibraryId>) -> Option<CollectionId> {
        self.collections
            .iter()
            .position(|c| c.name == name && c.library == library)
            .map(CollectionId)
    }

    /// Find an object by name, preferring one whose data comes from `library`.
    pub fn find_object(&self, name: &str, library: Option<LibraryId>) -> Option<ObjectId> {
        let data_library = |o: &SceneObject| o.data.as_ref().and_then(|d| d.library);

        self.objects
            .iter()
            .position(|o| o.name == name && data_library(o) == library)
            .or_else(|| self.objects.iter().position(|o| o.name == name))
            .map(ObjectId)
    }

    /// Get object count.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Get collection count.
    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }
}
