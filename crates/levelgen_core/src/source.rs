//! Read-only query interface over a host scene graph.
//!
//! The exporter never touches the host directly. Anything that can answer
//! these queries (the in-memory [`Scene`], or an adapter over a live host
//! session) can be flattened and emitted.

use crate::scene::{Collection, CollectionId, DataBlock, Library, LibraryId, ObjectId, Scene, SceneObject};

/// Queries the exporter issues against a scene.
pub trait SceneSource {
    /// Path of the current scene file.
    fn scene_path(&self) -> &str;

    /// Every placement object, in host order.
    fn list_objects(&self) -> Vec<ObjectId>;

    fn object(&self, id: ObjectId) -> Option<&SceneObject>;

    fn collection(&self, id: CollectionId) -> Option<&Collection>;

    fn library(&self, id: LibraryId) -> Option<&Library>;

    /// The object's mesh data block, or `None` for non-mesh objects.
    fn resolve_mesh(&self, id: ObjectId) -> Option<&DataBlock> {
        self.object(id)
            .filter(|o| o.kind.is_mesh())
            .and_then(|o| o.data.as_ref())
    }

    /// Member objects of a collection in their defined order.
    fn resolve_collection_members(&self, id: CollectionId) -> Vec<ObjectId> {
        self.collection(id)
            .map(|c| c.objects.clone())
            .unwrap_or_default()
    }

    /// File that authored data from `library`; local data belongs to the scene file.
    fn origin_file(&self, library: Option<LibraryId>) -> &str {
        library
            .and_then(|id| self.library(id))
            .map(|l| l.filepath.as_str())
            .unwrap_or_else(|| self.scene_path())
    }
}

impl SceneSource for Scene {
    fn scene_path(&self) -> &str {
        &self.filepath
    }

    fn list_objects(&self) -> Vec<ObjectId> {
        (0..self.objects.len()).map(ObjectId).collect()
    }

    fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    fn collection(&self, id: CollectionId) -> Option<&Collection> {
        self.collections.get(id.0)
    }

    fn library(&self, id: LibraryId) -> Option<&Library> {
        self.libraries.get(id.0)
    }
}
