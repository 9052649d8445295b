//! USD primitive types for intermediate representation.
//!
//! These types represent parsed USD prims before conversion to levelgen scene types.

use levelgen_math::{EulerOrder, Mat4, Quat, Vec3};

/// A parsed USDA layer: root prims plus the layer metadata the loader cares about.
#[derive(Clone, Debug, Default)]
pub struct UsdLayer {
    /// `defaultPrim` metadata, used by references without a target prim
    pub default_prim: Option<String>,

    /// `upAxis` metadata (`"Y"` or `"Z"`)
    pub up_axis: Option<String>,

    /// Root prims in file order
    pub prims: Vec<UsdPrim>,
}

impl UsdLayer {
    /// Find a prim anywhere in the layer by absolute path (`/Tree`) or trailing path.
    pub fn find_prim(&self, target_path: &str) -> Option<&UsdPrim> {
        fn walk<'a>(prims: &'a [UsdPrim], target: &str) -> Option<&'a UsdPrim> {
            for prim in prims {
                if prim.matches_path(target) {
                    return Some(prim);
                }
                if let Some(found) = walk(prim.children(), target) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.prims, target_path)
    }
}

/// A parsed USD prim (generic container).
#[derive(Clone, Debug)]
pub enum UsdPrim {
    /// A transform node (also used for `Scope`)
    Xform(UsdXform),

    /// A mesh geometry
    Mesh(UsdMesh),

    /// A prim carrying a reference to an external USD file
    Reference(UsdReference),

    /// An unknown or unsupported prim type
    Unknown(String),
}

impl UsdPrim {
    /// Prim path, or `None` for unknown prims.
    pub fn path(&self) -> Option<&str> {
        match self {
            UsdPrim::Xform(x) => Some(&x.path),
            UsdPrim::Mesh(m) => Some(&m.path),
            UsdPrim::Reference(r) => Some(&r.path),
            UsdPrim::Unknown(_) => None,
        }
    }

    /// Prim name, or `None` for unknown prims.
    pub fn name(&self) -> Option<&str> {
        match self {
            UsdPrim::Xform(x) => Some(&x.name),
            UsdPrim::Mesh(m) => Some(&m.name),
            UsdPrim::Reference(r) => Some(&r.name),
            UsdPrim::Unknown(_) => None,
        }
    }

    /// Child prims (empty for meshes and unknown prims).
    pub fn children(&self) -> &[UsdPrim] {
        match self {
            UsdPrim::Xform(x) => &x.children,
            UsdPrim::Reference(r) => &r.children,
            UsdPrim::Mesh(_) | UsdPrim::Unknown(_) => &[],
        }
    }

    /// Authored transform operations.
    pub fn xform_ops(&self) -> &[XformOp] {
        match self {
            UsdPrim::Xform(x) => &x.xform_ops,
            UsdPrim::Mesh(m) => &m.xform_ops,
            UsdPrim::Reference(r) => &r.xform_ops,
            UsdPrim::Unknown(_) => &[],
        }
    }

    /// Match full path, or a trailing path like `Tree` against `/Props/Tree`.
    pub fn matches_path(&self, target_path: &str) -> bool {
        match self.path() {
            Some(path) if target_path.starts_with('/') => path == target_path,
            Some(path) => path
                .strip_suffix(target_path)
                .is_some_and(|rest| rest.ends_with('/')),
            None => false,
        }
    }
}

/// A prim with a reference to an external file.
/// Syntax: `references = @path/to/file.usda@</PrimPath>`
#[derive(Clone, Debug, Default)]
pub struct UsdReference {
    /// Prim path in current file
    pub path: String,

    /// Prim name
    pub name: String,

    /// Path to the external USD file, as authored
    pub asset_path: String,

    /// Optional prim path within the referenced file (e.g., "/Tree")
    pub target_prim_path: Option<String>,

    /// Transform ops authored on the referencing prim
    pub xform_ops: Vec<XformOp>,

    /// Child prims (overrides or additional content)
    pub children: Vec<UsdPrim>,
}

/// A USD Xform (transform) prim.
#[derive(Clone, Debug, Default)]
pub struct UsdXform {
    /// Prim path (e.g., "/World/Model")
    pub path: String,

    /// Prim name (last component of path)
    pub name: String,

    /// Transform ops in authored order
    pub xform_ops: Vec<XformOp>,

    /// Child prims
    pub children: Vec<UsdPrim>,
}

impl UsdXform {
    /// The mesh data this Xform wraps, if it is an object wrapper.
    ///
    /// An exporter writes an object as an Xform holding exactly one Mesh with
    /// no transform of its own. Xforms with several meshes, or a mesh that is
    /// placed relative to the Xform, are groups.
    pub fn wrapped_mesh(&self) -> Option<&UsdMesh> {
        let mut meshes = self.children.iter().filter_map(|child| match child {
            UsdPrim::Mesh(mesh) => Some(mesh),
            _ => None,
        });
        match (meshes.next(), meshes.next()) {
            (Some(mesh), None) if mesh.xform_ops.is_empty() => Some(mesh),
            _ => None,
        }
    }
}

/// A USD Mesh prim. Geometry is not retained.
#[derive(Clone, Debug, Default)]
pub struct UsdMesh {
    /// Prim path
    pub path: String,

    /// Prim name
    pub name: String,

    /// Transform ops in authored order
    pub xform_ops: Vec<XformOp>,
}

/// Transform operation types found in USD xformOps.
#[derive(Clone, Debug, PartialEq)]
pub enum XformOp {
    /// Translation (xformOp:translate)
    Translate(Vec3),

    /// Rotation in degrees around X axis
    RotateX(f32),

    /// Rotation in degrees around Y axis
    RotateY(f32),

    /// Rotation in degrees around Z axis
    RotateZ(f32),

    /// Three-axis rotation in degrees (xformOp:rotateXYZ and friends)
    Rotate { order: EulerOrder, degrees: Vec3 },

    /// Quaternion orientation (xformOp:orient)
    Orient(Quat),

    /// Scale (uniform or non-uniform)
    Scale(Vec3),

    /// Full 4x4 transform matrix
    Transform(Mat4),
}

impl XformOp {
    /// Convert this operation to a transformation matrix.
    pub fn to_matrix(&self) -> Mat4 {
        match self {
            XformOp::Translate(t) => Mat4::from_translation(*t),
            XformOp::RotateX(deg) => Mat4::from_rotation_x(deg.to_radians()),
            XformOp::RotateY(deg) => Mat4::from_rotation_y(deg.to_radians()),
            XformOp::RotateZ(deg) => Mat4::from_rotation_z(deg.to_radians()),
            XformOp::Rotate { order, degrees } => Mat4::from_quat(order.to_quat(degrees_to_radians(*degrees))),
            XformOp::Orient(q) => Mat4::from_quat(*q),
            XformOp::Scale(s) => Mat4::from_scale(*s),
            XformOp::Transform(m) => *m,
        }
    }

    fn is_translate(&self) -> bool {
        matches!(self, XformOp::Translate(_))
    }

    fn is_rotation(&self) -> bool {
        matches!(
            self,
            XformOp::RotateX(_) | XformOp::RotateY(_) | XformOp::RotateZ(_) | XformOp::Rotate { .. } | XformOp::Orient(_)
        )
    }

    fn is_scale(&self) -> bool {
        matches!(self, XformOp::Scale(_))
    }
}

pub(crate) fn degrees_to_radians(degrees: Vec3) -> Vec3 {
    Vec3::new(degrees.x.to_radians(), degrees.y.to_radians(), degrees.z.to_radians())
}

/// Combine a list of xformOps into a single matrix.
pub fn compose_xform_ops(ops: &[XformOp]) -> Mat4 {
    let mut result = Mat4::IDENTITY;
    for op in ops {
        result = result * op.to_matrix();
    }
    result
}

/// Split ops into at most one translate, rotation and scale, in that order.
///
/// Returns `None` when the ops do not fit the translate-rotate-scale pattern
/// and have to be composed into a matrix instead.
pub fn split_trs(ops: &[XformOp]) -> Option<TrsOps<'_>> {
    let mut rest = ops;

    let translate = take_op(&mut rest, XformOp::is_translate);
    let rotate = take_op(&mut rest, XformOp::is_rotation);
    let scale = take_op(&mut rest, XformOp::is_scale);

    rest.is_empty().then_some((translate, rotate, scale))
}

/// Optional translate, rotation and scale ops.
pub type TrsOps<'a> = (Option<&'a XformOp>, Option<&'a XformOp>, Option<&'a XformOp>);

fn take_op<'a>(rest: &mut &'a [XformOp], pred: fn(&XformOp) -> bool) -> Option<&'a XformOp> {
    let ops: &'a [XformOp] = rest;
    match ops.split_first() {
        Some((op, tail)) if pred(op) => {
            *rest = tail;
            Some(op)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xform_ops() {
        let translate = XformOp::Translate(Vec3::new(1.0, 2.0, 3.0));
        let matrix = translate.to_matrix();

        let origin = matrix.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 2.0, 3.0)).length() < 0.001);
    }

    #[test]
    fn test_compose_is_trs() {
        let ops = [
            XformOp::Translate(Vec3::new(10.0, 0.0, 0.0)),
            XformOp::RotateZ(90.0),
            XformOp::Scale(Vec3::splat(2.0)),
        ];
        let p = compose_xform_ops(&ops).transform_point3(Vec3::X);
        // Scale to (2,0,0), rotate to (0,2,0), translate to (10,2,0)
        assert!((p - Vec3::new(10.0, 2.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_split_trs() {
        let t = XformOp::Translate(Vec3::ONE);
        let r = XformOp::RotateY(45.0);
        let s = XformOp::Scale(Vec3::ONE);

        let ops = [t.clone(), r.clone(), s.clone()];
        assert_eq!(split_trs(&ops), Some((Some(&t), Some(&r), Some(&s))));

        let ops = [r.clone()];
        assert_eq!(split_trs(&ops), Some((None, Some(&r), None)));

        assert_eq!(split_trs(&[]), Some((None, None, None)));

        // Out of order or repeated ops need a matrix
        assert_eq!(split_trs(&[s.clone(), t.clone()]), None);
        assert_eq!(split_trs(&[t.clone(), t.clone()]), None);
        assert_eq!(split_trs(&[XformOp::Transform(Mat4::IDENTITY)]), None);
    }

    #[test]
    fn test_wrapped_mesh() {
        let mesh = |name: &str, xform_ops: Vec<XformOp>| {
            UsdPrim::Mesh(UsdMesh {
                path: format!("/Obj/{}", name),
                name: name.to_string(),
                xform_ops,
            })
        };
        let xform = |children: Vec<UsdPrim>| UsdXform {
            path: "/Obj".to_string(),
            name: "Obj".to_string(),
            xform_ops: Vec::new(),
            children,
        };

        let wrapper = xform(vec![mesh("Data", Vec::new()), UsdPrim::Unknown("Camera".to_string())]);
        assert_eq!(wrapper.wrapped_mesh().map(|m| m.name.as_str()), Some("Data"));

        assert!(xform(vec![mesh("A", Vec::new()), mesh("B", Vec::new())]).wrapped_mesh().is_none());
        assert!(xform(vec![mesh("A", vec![XformOp::Translate(Vec3::Z)])]).wrapped_mesh().is_none());
        assert!(xform(Vec::new()).wrapped_mesh().is_none());
    }

    #[test]
    fn test_matches_path() {
        let prim = UsdPrim::Xform(UsdXform {
            path: "/Props/Tree".to_string(),
            name: "Tree".to_string(),
            ..Default::default()
        });
        assert!(prim.matches_path("/Props/Tree"));
        assert!(prim.matches_path("Tree"));
        assert!(!prim.matches_path("ree"));
        assert!(!prim.matches_path("/Tree"));
    }
}
