//! Hardcoded parameters of the reference arm

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use nalgebra::{Matrix4, Vector3};

use crate::chain::{ArmSide, DhChain, DhLink};
use crate::parameters::ArmParameters;
use crate::tripod::TripodParameters;

impl TripodParameters {
    /// Torso tripod of the reference arm.
    pub fn torso() -> Self {
        TripodParameters::new(0.09, 0.0, 0.17, 30.0)
    }

    /// Lower arm (wrist) tripod of the reference arm.
    pub fn lower_arm() -> Self {
        TripodParameters::new(0.018, 0.0, 0.03, 35.0)
    }
}

impl DhLink {
    /// Link with the joint limits given in degrees.
    fn limited(a: f64, d: f64, alpha: f64, offset: f64, min_deg: f64, max_deg: f64) -> Self {
        DhLink::new(a, d, alpha, offset, min_deg.to_radians(), max_deg.to_radians())
    }
}

impl DhChain {
    /// Six joint upper arm: shoulder pitch, roll and yaw, elbow, forearm twist, wrist pitch.
    /// The left arm mirrors the right one about the sagittal plane.
    pub fn upper_arm(side: ArmSide) -> Self {
        let s = match side {
            ArmSide::Right => 1.0,
            ArmSide::Left => -1.0,
        };
        // Mirrored joints swap and negate their limits
        let mirrored = |min: f64, max: f64| if s > 0.0 { (min, max) } else { (-max, -min) };

        let (roll_min, roll_max) = mirrored(0.0, 110.0);
        let (yaw_min, yaw_max) = mirrored(-60.0, 60.0);
        let (twist_min, twist_max) = mirrored(-90.0, 90.0);

        let links = vec![
            DhLink::limited(0.0, 0.0, -FRAC_PI_2, 0.0, -90.0, 30.0),
            DhLink::limited(0.0, 0.0, FRAC_PI_2, -FRAC_PI_2, roll_min, roll_max),
            DhLink::limited(0.0, -0.22, -FRAC_PI_2, -FRAC_PI_2, yaw_min, yaw_max),
            DhLink::limited(0.0, 0.0, FRAC_PI_2, 0.0, 0.0, 100.0),
            DhLink::limited(0.0, -0.20, -FRAC_PI_2, 0.0, twist_min, twist_max),
            DhLink::limited(0.0, 0.0, FRAC_PI_2, -FRAC_PI_2, -35.0, 35.0),
        ];

        // Shoulder above the torso platform, offset sideways
        let h0 = Matrix4::new_translation(&Vector3::new(0.0, -s * 0.12, 0.25));
        DhChain::with_head_and_tail(links, h0, Matrix4::identity())
    }
}

impl ArmParameters {
    /// Reference arm mounted on the given side.
    pub fn reference(side: ArmSide) -> Self {
        ArmParameters {
            torso: TripodParameters::torso(),
            upper_arm: Arc::new(DhChain::upper_arm(side)),
            lower_arm: TripodParameters::lower_arm(),
            t0: Matrix4::new_translation(&Vector3::new(0.0, 0.0, 0.5)),
            tn: Matrix4::new_translation(&Vector3::new(0.0, 0.0, 0.06)),
        }
    }
}

impl Default for ArmParameters {
    /// Right reference arm.
    fn default() -> Self {
        ArmParameters::reference(ArmSide::Right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::SerialChain;

    #[test]
    fn test_reference_dimensions() {
        let arm = ArmParameters::default();
        assert_eq!(arm.chain_dof(), 6);
        assert_eq!(arm.dof(), 12);
        assert_eq!(arm.torso.radius, 0.09);
        assert_eq!(arm.lower_arm.l_max, 0.03);
    }

    #[test]
    fn test_sides_mirror() {
        let right = DhChain::upper_arm(ArmSide::Right);
        let left = DhChain::upper_arm(ArmSide::Left);
        assert_eq!(left.h0[(1, 3)], -right.h0[(1, 3)]);
        for joint in 0..right.dof() {
            assert!(right.joint_min(joint) < right.joint_max(joint));
            assert!(left.joint_min(joint) < left.joint_max(joint));
        }
        assert_eq!(left.joint_min(1), -right.joint_max(1));
        assert_eq!(left.joint_max(0), right.joint_max(0));
    }
}
