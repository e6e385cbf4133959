//! Forward kinematics of the complete arm.
//!
//! The configuration vector holds the three torso actuator lengths, the joints of the
//! serial chain and the three lower arm actuator lengths, in this order. Internally the
//! chain joints are in radians; the public interface uses degrees.

use crate::kinematic_traits::{ArmFrame, Transform, TRIPOD_LEGS};
use crate::parameters::ArmParameters;
use crate::tripod::{Tripod, TripodState};

/// Composes both tripods and the serial chain into the end-effector transform.
pub struct ArmKinematicsModel<'a> {
    params: &'a ArmParameters,
}

impl<'a> ArmKinematicsModel<'a> {
    pub fn new(params: &'a ArmParameters) -> Self {
        ArmKinematicsModel { params }
    }

    pub fn parameters(&self) -> &ArmParameters {
        self.params
    }

    pub fn chain_dof(&self) -> usize {
        self.params.chain_dof()
    }

    /// Length of the configuration vector.
    pub fn dof(&self) -> usize {
        self.params.dof()
    }

    /// Range of the chain joints within the configuration vector.
    pub fn chain_range(&self) -> std::ops::Range<usize> {
        TRIPOD_LEGS..TRIPOD_LEGS + self.chain_dof()
    }

    /// Range of the actuator lengths of the given tripod within the configuration vector.
    pub fn tripod_range(&self, which: Tripod) -> std::ops::Range<usize> {
        let offset = which.offset(self.chain_dof());
        offset..offset + TRIPOD_LEGS
    }

    /// Forward kinematics of one tripod, taking its lengths from the configuration vector.
    pub fn tripod(&self, which: Tripod, x: &[f64]) -> TripodState {
        let offset = which.offset(self.chain_dof());
        let lengths = [x[offset], x[offset + 1], x[offset + 2]];
        self.params.tripod(which).fkin(&lengths)
    }

    /// End-effector transform for the configuration (chain joints in radians).
    pub fn fkin(&self, x: &[f64]) -> Transform {
        self.fkin_frame(x, ArmFrame::EndEffector)
    }

    /// Transform of the requested frame for the configuration (chain joints in radians).
    pub fn fkin_frame(&self, x: &[f64], frame: ArmFrame) -> Transform {
        let p = self.params;
        let joints = &x[self.chain_range()];
        let torso = self.params.t0 * self.tripod(Tripod::Proximal, x).t;

        match frame {
            ArmFrame::ProximalPlatform => torso,
            ArmFrame::ChainLink(link) => {
                let link = link.min(self.chain_dof().saturating_sub(1));
                torso * p.upper_arm.link_transform(joints, link)
            }
            ArmFrame::DistalPlatform => {
                torso * p.upper_arm.transform(joints) * self.tripod(Tripod::Distal, x).t
            }
            ArmFrame::EndEffector => {
                torso * p.upper_arm.transform(joints) * self.tripod(Tripod::Distal, x).t * p.tn
            }
        }
    }

    /// Lower and upper bounds of the configuration (chain joints in radians).
    pub fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        let p = self.params;
        let mut lower = Vec::with_capacity(self.dof());
        let mut upper = Vec::with_capacity(self.dof());

        lower.extend([p.torso.l_min; TRIPOD_LEGS]);
        upper.extend([p.torso.l_max; TRIPOD_LEGS]);
        for joint in 0..self.chain_dof() {
            lower.push(p.upper_arm.joint_min(joint));
            upper.push(p.upper_arm.joint_max(joint));
        }
        lower.extend([p.lower_arm.l_min; TRIPOD_LEGS]);
        upper.extend([p.lower_arm.l_max; TRIPOD_LEGS]);

        (lower, upper)
    }

    /// Rest configuration (radians): tripods retracted as far as allowed towards zero,
    /// chain joints in the middle of their ranges.
    pub fn rest_configuration(&self) -> Vec<f64> {
        let (lower, upper) = self.bounds();
        let mut x = vec![0.0; self.dof()];
        for which in Tripod::BOTH {
            for i in self.tripod_range(which) {
                x[i] = 0.0_f64.max(lower[i]).min(upper[i]);
            }
        }
        for i in self.chain_range() {
            x[i] = 0.5 * (lower[i] + upper[i]);
        }
        x
    }

    /// Converts an externally supplied guess (chain joints in degrees) into the internal
    /// representation, clamping every entry into its bounds.
    pub fn clamp_initial_guess(&self, q0: &[f64]) -> Vec<f64> {
        let (lower, upper) = self.bounds();
        self.to_internal(q0)
            .iter()
            .zip(lower.iter().zip(&upper))
            .map(|(x, (lo, hi))| x.max(*lo).min(*hi))
            .collect()
    }

    /// Chain joints degrees to radians; tripod lengths are passed through.
    pub fn to_internal(&self, q: &[f64]) -> Vec<f64> {
        let chain = self.chain_range();
        q.iter()
            .take(self.dof())
            .enumerate()
            .map(|(i, v)| if chain.contains(&i) { v.to_radians() } else { *v })
            .collect()
    }

    /// Chain joints radians to degrees; tripod lengths are passed through.
    pub fn to_public(&self, x: &[f64]) -> Vec<f64> {
        let chain = self.chain_range();
        x.iter()
            .take(self.dof())
            .enumerate()
            .map(|(i, v)| if chain.contains(&i) { v.to_degrees() } else { *v })
            .collect()
    }
}
