// Euler angle conventions
//
// An order names the axes in the sequence they are applied to the object, in
// the fixed (extrinsic) frame. "XYZ" rotates about X first, then Y, then Z,
// which composes to Rz * Ry * Rx.

use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};
use thiserror::Error;

/// Error returned when an Euler order string is not one of the six axis orders.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown Euler rotation order: {0}")]
pub struct ParseEulerOrderError(pub String);

/// Axis application order for Euler rotations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EulerOrder {
    #[default]
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

impl EulerOrder {
    pub const ALL: [EulerOrder; 6] = [
        EulerOrder::Xyz,
        EulerOrder::Xzy,
        EulerOrder::Yxz,
        EulerOrder::Yzx,
        EulerOrder::Zxy,
        EulerOrder::Zyx,
    ];

    /// Upper-case axis names, e.g. `"XYZ"`.
    pub fn as_str(self) -> &'static str {
        match self {
            EulerOrder::Xyz => "XYZ",
            EulerOrder::Xzy => "XZY",
            EulerOrder::Yxz => "YXZ",
            EulerOrder::Yzx => "YZX",
            EulerOrder::Zxy => "ZXY",
            EulerOrder::Zyx => "ZYX",
        }
    }

    /// Convert Euler angles (radians, indexed by axis) to a quaternion.
    pub fn to_quat(self, angles: Vec3) -> Quat {
        let x = Quat::from_rotation_x(angles.x);
        let y = Quat::from_rotation_y(angles.y);
        let z = Quat::from_rotation_z(angles.z);

        // First applied axis sits rightmost
        match self {
            EulerOrder::Xyz => z * y * x,
            EulerOrder::Xzy => y * z * x,
            EulerOrder::Yxz => z * x * y,
            EulerOrder::Yzx => x * z * y,
            EulerOrder::Zxy => y * x * z,
            EulerOrder::Zyx => x * y * z,
        }
    }
}

impl fmt::Display for EulerOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EulerOrder {
    type Err = ParseEulerOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EulerOrder::ALL
            .into_iter()
            .find(|order| order.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEulerOrderError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_zero_angles_are_identity() {
        for order in EulerOrder::ALL {
            let q = order.to_quat(Vec3::ZERO);
            assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6), "{order}");
        }
    }

    #[test]
    fn test_single_axis_matches_axis_rotation() {
        let q = EulerOrder::Xyz.to_quat(Vec3::new(FRAC_PI_2, 0.0, 0.0));
        assert!(q.abs_diff_eq(Quat::from_rotation_x(FRAC_PI_2), 1e-6));

        let q = EulerOrder::Zyx.to_quat(Vec3::new(0.0, 0.0, FRAC_PI_2));
        assert!(q.abs_diff_eq(Quat::from_rotation_z(FRAC_PI_2), 1e-6));
    }

    #[test]
    fn test_xyz_applies_x_first() {
        // X then Z: the +Y axis is first turned to +Z by X, and Z leaves it there.
        let q = EulerOrder::Xyz.to_quat(Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        let v = q * Vec3::Y;
        assert!((v - Vec3::Z).length() < 1e-5);

        // Z then X: +Y is first turned to -X by Z, and X leaves it there.
        let q = EulerOrder::Zyx.to_quat(Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        let v = q * Vec3::Y;
        assert!((v - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_parse_orders() {
        assert_eq!("XYZ".parse::<EulerOrder>(), Ok(EulerOrder::Xyz));
        assert_eq!("zxy".parse::<EulerOrder>(), Ok(EulerOrder::Zxy));
        assert!("QUATERNION".parse::<EulerOrder>().is_err());
        assert_eq!(EulerOrder::Yzx.to_string(), "YZX");
    }
}
