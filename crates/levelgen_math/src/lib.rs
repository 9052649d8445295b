// Re-export glam for convenience
pub use glam::*;

// levelgen math types
mod axis;
mod euler;
pub use axis::{QuatExt, Vec3Ext};
pub use euler::{EulerOrder, ParseEulerOrderError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_quat_components() {
        let q = Quat::from_xyzw(0.1, 0.2, 0.3, 0.9);
        assert_eq!(q.w, 0.9);
        assert_eq!(q.x, 0.1);
    }
}
