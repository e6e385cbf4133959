//! Defines the arm and solver parameter data structures

use std::fmt;
use std::sync::Arc;

use crate::differencing::Differencing;
use crate::kinematic_traits::{SerialChain, Transform, TRIPOD_LEGS};
use crate::tripod::{Tripod, TripodParameters};

/// Geometry of the whole arm: torso tripod, serial upper arm, lower arm tripod and the
/// two fixed offsets. See [parameters_robots.rs](parameters_robots.rs) for the reference arm.
///
/// The parameters are never mutated by the solver, so the same instance (and the same
/// chain behind the `Arc`) can be shared by several solvers.
#[derive(Clone)]
pub struct ArmParameters {
    /// Proximal tripod.
    pub torso: TripodParameters,

    /// Serial chain between the two tripods.
    pub upper_arm: Arc<dyn SerialChain + Send + Sync>,

    /// Distal tripod.
    pub lower_arm: TripodParameters,

    /// Transform from the arm base to the proximal tripod base.
    pub t0: Transform,

    /// Transform from the distal tripod platform to the arm tip.
    pub tn: Transform,
}

impl ArmParameters {
    /// Parameters of the given tripod.
    pub fn tripod(&self, which: Tripod) -> &TripodParameters {
        match which {
            Tripod::Proximal => &self.torso,
            Tripod::Distal => &self.lower_arm,
        }
    }

    /// Degrees of freedom of the serial chain.
    pub fn chain_dof(&self) -> usize {
        self.upper_arm.dof()
    }

    /// Length of the configuration vector: both tripods and the chain.
    pub fn dof(&self) -> usize {
        TRIPOD_LEGS + self.chain_dof() + TRIPOD_LEGS
    }
}

impl fmt::Debug for ArmParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArmParameters")
            .field("torso", &self.torso)
            .field("upper_arm_dof", &self.upper_arm.dof())
            .field("lower_arm", &self.lower_arm)
            .field("t0", &self.t0)
            .field("tn", &self.tn)
            .finish()
    }
}

/// Parameters of a single inverse kinematics solve. May change between solves.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverParameters {
    /// Match the full pose (position and orientation) rather than only the position.
    pub full_pose: bool,

    /// Hold both tripods at the requested heights.
    pub can_heave: bool,

    /// How the constraint Jacobian is approximated.
    pub differencing: Differencing,

    /// Convergence tolerance of the optimizer.
    pub tol: f64,

    /// Tolerated constraint violation.
    pub constr_tol: f64,

    /// Iteration cap of the optimizer.
    pub max_iter: usize,

    /// Requested torso platform height, meters. Only used when `can_heave` is set.
    pub torso_heave: f64,

    /// Requested lower arm platform height, meters. Only used when `can_heave` is set.
    pub lower_arm_heave: f64,

    /// Weight of keeping the torso close to the initial guess.
    pub weight_postural_torso: f64,

    /// Weight of keeping the upper arm close to the initial guess.
    pub weight_postural_upper_arm: f64,
}

impl Default for SolverParameters {
    fn default() -> Self {
        SolverParameters {
            full_pose: true,
            can_heave: false,
            differencing: Differencing::Forward,
            tol: 1e-7,
            constr_tol: 1e-6,
            max_iter: 2000,
            torso_heave: 0.0,
            lower_arm_heave: 0.0,
            weight_postural_torso: 0.0,
            weight_postural_upper_arm: 0.0,
        }
    }
}

impl SolverParameters {
    /// Convert to string yaml representation (quick viewing, etc).
    pub fn to_yaml(&self) -> String {
        format!(
            "solver:\n  \
              full_pose: {}\n  \
              can_heave: {}\n  \
              differencing: {}\n  \
              tol: {:e}\n  \
              constr_tol: {:e}\n  \
              max_iter: {}\n  \
              torso_heave: {}\n  \
              lower_arm_heave: {}\n  \
              weight_postural_torso: {}\n  \
              weight_postural_upper_arm: {}\n",
            self.full_pose,
            self.can_heave,
            self.differencing.name(),
            self.tol,
            self.constr_tol,
            self.max_iter,
            self.torso_heave,
            self.lower_arm_heave,
            self.weight_postural_torso,
            self.weight_postural_upper_arm,
        )
    }
}
