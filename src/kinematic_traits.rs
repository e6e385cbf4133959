extern crate nalgebra as na;

use na::Matrix4;

/// Homogeneous 4x4 transform (rotation block plus translation column), as used
/// for every frame of the arm.
/// ```
/// extern crate nalgebra as na;
/// use na::{Matrix4, Vector3};
///
/// type Transform = Matrix4<f64>;
///
/// // Half meter up along z
/// let transform: Transform = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 0.5));
/// assert_eq!(transform[(2, 3)], 0.5);
/// ```
pub type Transform = Matrix4<f64>;

/// Number of actuators of a single tripod platform.
pub const TRIPOD_LEGS: usize = 3;

/// Serial revolute chain placed between the two tripod platforms. Joint values
/// are always in radians here; conversion to degrees is done at the solver boundary.
pub trait SerialChain {
    /// Number of joints of the chain.
    fn dof(&self) -> usize;

    /// Lower limit of the given joint, radians.
    fn joint_min(&self, joint: usize) -> f64;

    /// Upper limit of the given joint, radians.
    fn joint_max(&self, joint: usize) -> f64;

    /// Transform from the chain base to the chain tip for the given joint values,
    /// including any fixed head and tail transforms of the chain.
    fn transform(&self, joints: &[f64]) -> Transform;

    /// Transform from the chain base to the end of the given link (head transform included,
    /// tail transform not). Used to report intermediate frames.
    fn link_transform(&self, joints: &[f64], link: usize) -> Transform;
}

/// Selects the frame returned by forward kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmFrame {
    /// Top of the proximal (torso) platform, base offset included.
    ProximalPlatform,
    /// End of the given link of the serial chain.
    ChainLink(usize),
    /// Top of the distal (lower arm) platform, tip offset not included.
    DistalPlatform,
    /// Tip of the arm, all offsets included.
    EndEffector,
}

impl ArmFrame {
    /// Maps the integer frame index of the external interface: 0 is the proximal
    /// platform, 1..=dof are the chain links, dof + 1 is the distal platform.
    /// Negative values and anything past the distal platform select the end effector.
    pub fn from_index(frame: i32, chain_dof: usize) -> Self {
        if frame < 0 {
            return ArmFrame::EndEffector;
        }
        let frame = frame as usize;
        if frame == 0 {
            ArmFrame::ProximalPlatform
        } else if frame <= chain_dof {
            ArmFrame::ChainLink(frame - 1)
        } else if frame == chain_dof + 1 {
            ArmFrame::DistalPlatform
        } else {
            ArmFrame::EndEffector
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_from_index() {
        assert_eq!(ArmFrame::from_index(-1, 6), ArmFrame::EndEffector);
        assert_eq!(ArmFrame::from_index(0, 6), ArmFrame::ProximalPlatform);
        assert_eq!(ArmFrame::from_index(1, 6), ArmFrame::ChainLink(0));
        assert_eq!(ArmFrame::from_index(6, 6), ArmFrame::ChainLink(5));
        assert_eq!(ArmFrame::from_index(7, 6), ArmFrame::DistalPlatform);
        assert_eq!(ArmFrame::from_index(8, 6), ArmFrame::EndEffector);
        assert_eq!(ArmFrame::from_index(100, 6), ArmFrame::EndEffector);
    }
}
