//! High-level USDA scene loading.
//!
//! Converts parsed prims into the levelgen scene model. References play the
//! role of linked-library instance collections: the referencing prim becomes
//! an empty instancing a collection, and the referenced prims become linked
//! member objects.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use levelgen_math::{EulerOrder, Mat4, Quat, Vec3};
use thiserror::Error;

use crate::scene::{
    CollectionId, DataBlock, LibraryId, ObjectId, ObjectKind, ObjectTransform, Rotation, Scene, SceneObject,
};
use crate::header::file_base_name;
use crate::usd::parser::{parse_usda, ParseError};
use crate::usd::types::{
    compose_xform_ops, degrees_to_radians, split_trs, UsdLayer, UsdPrim, UsdReference, XformOp,
};

/// Errors that can occur during USD loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to load reference '{asset}': {source}")]
    Reference {
        asset: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse reference '{asset}': {source}")]
    ReferenceParse {
        asset: String,
        #[source]
        source: ParseError,
    },

    #[error("Prim '{prim}' not found in '{asset}'")]
    MissingPrim { asset: String, prim: String },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Load a USDA file and return a levelgen Scene.
///
/// References are resolved relative to the file's directory.
///
/// # Example
///
/// ```ignore
/// use levelgen_core::usd::load_usda;
///
/// let scene = load_usda("levels/forest.usda")?;
/// println!("Loaded {} objects", scene.object_count());
/// ```
pub fn load_usda<P: AsRef<Path>>(path: P) -> LoadResult<Scene> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let base_dir = path.parent().map(|p| p.to_path_buf());
    load_usda_from_string(&content, path.to_string_lossy().as_ref(), base_dir)
}

/// Load USDA from a string (useful for testing).
pub fn load_usda_from_string(content: &str, scene_path: &str, base_dir: Option<PathBuf>) -> LoadResult<Scene> {
    let layer = parse_usda(content)?;

    match layer.up_axis.as_deref() {
        Some("Z") | None => {}
        Some(axis) => log::warn!("{}: upAxis is {}, transforms are treated as Z-up", scene_path, axis),
    }

    let mut builder = SceneBuilder::new(scene_path, base_dir);
    for prim in &layer.prims {
        builder.process_prim(prim, Mat4::IDENTITY)?;
    }

    let scene = builder.scene;
    log::debug!(
        "Loaded {}: {} objects, {} collections, {} libraries",
        scene.filepath,
        scene.object_count(),
        scene.collection_count(),
        scene.libraries.len()
    );
    Ok(scene)
}

/// Internal builder for constructing a Scene from USD prims.
struct SceneBuilder {
    scene: Scene,
    /// Base directory for resolving relative references
    base_dir: Option<PathBuf>,
    /// Parsed referenced files, keyed by authored asset path
    reference_cache: HashMap<String, UsdLayer>,
    /// Collections already built, keyed by (asset path, target prim)
    collection_map: HashMap<(String, String), CollectionId>,
}

impl SceneBuilder {
    fn new(scene_path: &str, base_dir: Option<PathBuf>) -> Self {
        Self {
            scene: Scene::new(scene_path),
            base_dir,
            reference_cache: HashMap::new(),
            collection_map: HashMap::new(),
        }
    }

    /// Process a USD prim recursively.
    fn process_prim(&mut self, prim: &UsdPrim, parent_transform: Mat4) -> LoadResult<()> {
        match prim {
            UsdPrim::Xform(xform) => {
                let world_transform = parent_transform * compose_xform_ops(&xform.xform_ops);

                match xform.wrapped_mesh() {
                    // Object wrapping its mesh data; child objects still follow
                    Some(mesh) => {
                        let transform = object_transform(parent_transform, &xform.xform_ops);
                        self.scene
                            .add_object(SceneObject::mesh(&xform.name, DataBlock::local(&mesh.name), transform));
                        for child in xform.children.iter().filter(|c| !matches!(c, UsdPrim::Mesh(_))) {
                            self.process_prim(child, world_transform)?;
                        }
                    }
                    // Group: accumulate into children
                    None => {
                        for child in &xform.children {
                            self.process_prim(child, world_transform)?;
                        }
                    }
                }
                Ok(())
            }
            UsdPrim::Mesh(mesh) => {
                let transform = object_transform(parent_transform, &mesh.xform_ops);
                self.scene
                    .add_object(SceneObject::mesh(&mesh.name, DataBlock::local(&mesh.name), transform));
                Ok(())
            }
            UsdPrim::Reference(reference) => self.process_reference(reference, parent_transform),
            UsdPrim::Unknown(_) => Ok(()), // Skip unknown prims
        }
    }

    /// Process a Reference prim: an empty instancing the referenced collection.
    fn process_reference(&mut self, reference: &UsdReference, parent_transform: Mat4) -> LoadResult<()> {
        let collection = self.reference_collection(reference)?;
        let transform = object_transform(parent_transform, &reference.xform_ops);

        if !reference.children.is_empty() {
            log::debug!("{}: ignoring {} override prims", reference.path, reference.children.len());
        }

        self.scene
            .add_object(SceneObject::collection_instance(&reference.name, collection, transform));
        Ok(())
    }

    /// Get or build the collection standing in for a reference target.
    fn reference_collection(&mut self, reference: &UsdReference) -> LoadResult<CollectionId> {
        let key = (
            reference.asset_path.clone(),
            reference.target_prim_path.clone().unwrap_or_default(),
        );
        if let Some(&id) = self.collection_map.get(&key) {
            return Ok(id);
        }

        let layer = self.load_reference(&reference.asset_path)?;
        let library = self.scene.library_id(&reference.asset_path);

        let target_path = reference
            .target_prim_path
            .clone()
            .or_else(|| layer.default_prim.as_ref().map(|p| format!("/{}", p)));

        let (name, members): (String, Vec<&UsdPrim>) = match target_path {
            Some(target) => {
                let prim = layer.find_prim(&target).ok_or_else(|| LoadError::MissingPrim {
                    asset: reference.asset_path.clone(),
                    prim: target.clone(),
                })?;
                let name = prim.name().unwrap_or_default().to_string();
                (name, collection_members(prim))
            }
            None => (
                file_base_name(&reference.asset_path).to_string(),
                layer.prims.iter().collect(),
            ),
        };

        let collection = self.scene.add_collection(name, Some(library));
        for member in members {
            if let Some(object) = self.add_linked_object(member, library) {
                self.scene.link_to_collection(collection, object);
            }
        }

        log::debug!(
            "Collection {} from {}: {} members",
            self.scene.collections[collection.0].name,
            reference.asset_path,
            self.scene.collections[collection.0].objects.len()
        );

        self.collection_map.insert(key, collection);
        Ok(collection)
    }

    /// Add a prim from a referenced file as a linked object.
    fn add_linked_object(&mut self, prim: &UsdPrim, library: LibraryId) -> Option<ObjectId> {
        let transform = object_transform(Mat4::IDENTITY, prim.xform_ops());

        let object = match prim {
            UsdPrim::Mesh(mesh) => SceneObject::mesh(&mesh.name, DataBlock::linked(&mesh.name, library), transform),
            UsdPrim::Xform(xform) => match xform.wrapped_mesh() {
                Some(mesh) => SceneObject::mesh(&xform.name, DataBlock::linked(&mesh.name, library), transform),
                None => linked_empty(&xform.name, transform),
            },
            UsdPrim::Reference(nested) => linked_empty(&nested.name, transform),
            UsdPrim::Unknown(_) => return None,
        };

        Some(self.scene.add_object(object))
    }

    /// Read and parse a referenced file, caching by asset path.
    fn load_reference(&mut self, asset_path: &str) -> LoadResult<UsdLayer> {
        if let Some(cached) = self.reference_cache.get(asset_path) {
            return Ok(cached.clone());
        }

        // Resolve the asset path relative to the base directory
        let path = match &self.base_dir {
            Some(base_dir) => base_dir.join(asset_path),
            None => PathBuf::from(asset_path),
        };

        let content = std::fs::read_to_string(&path).map_err(|e| LoadError::Reference {
            asset: asset_path.to_string(),
            source: e,
        })?;
        let layer = parse_usda(&content).map_err(|e| LoadError::ReferenceParse {
            asset: asset_path.to_string(),
            source: e,
        })?;

        log::debug!("Loaded reference {} ({} root prims)", path.display(), layer.prims.len());
        self.reference_cache.insert(asset_path.to_string(), layer.clone());
        Ok(layer)
    }
}

/// Prims that become collection members for a reference target.
///
/// A target that is itself a mesh (or wraps one) is the only member;
/// otherwise its children are, in order.
fn collection_members(target: &UsdPrim) -> Vec<&UsdPrim> {
    match target {
        UsdPrim::Mesh(_) => vec![target],
        UsdPrim::Xform(xform) if xform.wrapped_mesh().is_some() => vec![target],
        _ => target.children().iter().collect(),
    }
}

fn linked_empty(name: &str, transform: ObjectTransform) -> SceneObject {
    SceneObject {
        name: name.to_string(),
        kind: ObjectKind::Empty,
        data: None,
        instance_collection: None,
        transform,
    }
}

/// Build an object transform from authored ops under `parent`.
///
/// Authored components are kept when they fit translate-rotate-scale and
/// there is no parent transform; anything else goes through a matrix.
fn object_transform(parent: Mat4, ops: &[XformOp]) -> ObjectTransform {
    if parent == Mat4::IDENTITY {
        if let Some((translate, rotate, scale)) = split_trs(ops) {
            let location = match translate {
                Some(XformOp::Translate(t)) => *t,
                _ => Vec3::ZERO,
            };
            let scale = match scale {
                Some(XformOp::Scale(s)) => *s,
                _ => Vec3::ONE,
            };
            let rotation = match rotate {
                None => Rotation::default(),
                Some(XformOp::RotateX(deg)) => euler_xyz(Vec3::new(deg.to_radians(), 0.0, 0.0)),
                Some(XformOp::RotateY(deg)) => euler_xyz(Vec3::new(0.0, deg.to_radians(), 0.0)),
                Some(XformOp::RotateZ(deg)) => euler_xyz(Vec3::new(0.0, 0.0, deg.to_radians())),
                Some(XformOp::Rotate { order, degrees }) => Rotation::Euler {
                    angles: degrees_to_radians(*degrees),
                    order: *order,
                },
                Some(XformOp::Orient(q)) => Rotation::Quaternion(*q),
                Some(op) => Rotation::Quaternion(Quat::from_mat4(&op.to_matrix())),
            };
            return ObjectTransform {
                location,
                rotation,
                scale,
            };
        }
    }

    let (scale, rotation, location) = (parent * compose_xform_ops(ops)).to_scale_rotation_translation();
    ObjectTransform {
        location,
        rotation: Rotation::Quaternion(rotation),
        scale,
    }
}

fn euler_xyz(angles: Vec3) -> Rotation {
    Rotation::Euler {
        angles,
        order: EulerOrder::Xyz,
    }
}
