// Coordinate convention conversion
//
// Source scenes are Z-up, the engine is Y-up. The mapping (x, y, z) -> (x, z, -y)
// is a proper rotation, so vectors, points and quaternion imaginary parts all
// follow it. Scale factors are magnitudes along axes and only get permuted.

use glam::{Quat, Vec3};

/// Extension trait for Vec3 converting Z-up values into the Y-up convention.
pub trait Vec3Ext {
    /// Convert a position or direction: (x, y, z) -> (x, z, -y).
    fn to_y_up(self) -> Vec3;

    /// Convert per-axis scale factors: (x, y, z) -> (x, z, y).
    fn to_y_up_scale(self) -> Vec3;
}

impl Vec3Ext for Vec3 {
    fn to_y_up(self) -> Vec3 {
        Vec3::new(self.x, self.z, -self.y)
    }

    fn to_y_up_scale(self) -> Vec3 {
        Vec3::new(self.x, self.z, self.y)
    }
}

/// Extension trait for Quat converting a Z-up rotation into the Y-up convention.
pub trait QuatExt {
    /// Convert a rotation: (w, x, y, z) -> (w, x, z, -y).
    fn to_y_up(self) -> Quat;
}

impl QuatExt for Quat {
    fn to_y_up(self) -> Quat {
        Quat::from_xyzw(self.x, self.z, -self.y, self.w)
    }
}
