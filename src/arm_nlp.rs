//! Inverse kinematics of the arm as a nonlinear program.
//!
//! Four variants exist, combining full pose or position-only matching with free or held
//! platform heights. They share the variables, bounds and objective structure and differ
//! in the orientation term and in the constraint rows, so they are expressed as one type
//! tagged with a [`ProblemVariant`].

use nalgebra::{UnitQuaternion, Vector3};

use crate::arm_model::ArmKinematicsModel;
use crate::differencing::Differencing;
use crate::kinematic_traits::{Transform, TRIPOD_LEGS};
use crate::optimizer::{ApplicationReturnStatus, NonlinearProgram, ProblemInfo};
use crate::tripod::Tripod;
use crate::utils::{rotation, rotation_error, rotation_vector, translation};

/// What part of the target pose is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseMatching {
    /// Position and orientation.
    FullPose,
    /// Position only.
    XyzOnly,
}

/// Whether the tripod platforms are held at requested heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaveMode {
    Heave,
    NoHeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemVariant {
    pub matching: PoseMatching,
    pub heave: HeaveMode,
}

impl ProblemVariant {
    pub fn from_flags(full_pose: bool, can_heave: bool) -> Self {
        ProblemVariant {
            matching: if full_pose { PoseMatching::FullPose } else { PoseMatching::XyzOnly },
            heave: if can_heave { HeaveMode::Heave } else { HeaveMode::NoHeave },
        }
    }

    pub fn name(&self) -> &'static str {
        match (self.matching, self.heave) {
            (PoseMatching::FullPose, HeaveMode::NoHeave) => "full_pose",
            (PoseMatching::FullPose, HeaveMode::Heave) => "full_pose+heave",
            (PoseMatching::XyzOnly, HeaveMode::NoHeave) => "xyz_pose",
            (PoseMatching::XyzOnly, HeaveMode::Heave) => "xyz_pose+heave",
        }
    }

    /// Constraint rows contributed by each tripod: the tilt row, preceded by the heave
    /// row when heights are held.
    pub fn rows_per_tripod(&self) -> usize {
        match self.heave {
            HeaveMode::Heave => 2,
            HeaveMode::NoHeave => 1,
        }
    }

    pub fn constraint_count(&self) -> usize {
        Tripod::BOTH.len() * self.rows_per_tripod()
    }
}

/// Final point handed back by the optimizer.
#[derive(Debug, Clone)]
struct FinalPoint {
    status: ApplicationReturnStatus,
    x: Vec<f64>,
    objective: f64,
}

/// One inverse kinematics problem. Built fresh for every solve.
pub struct ArmNlp<'a> {
    model: ArmKinematicsModel<'a>,
    variant: ProblemVariant,
    differencing: Differencing,

    /// Starting point and postural reference, internal units.
    x0: Vec<f64>,

    xd: Vector3<f64>,
    rd: UnitQuaternion<f64>,
    ud: Vector3<f64>,

    /// Requested platform heights, proximal then distal.
    heave: [f64; 2],

    weight_torso: f64,
    weight_upper_arm: f64,

    solution: Option<FinalPoint>,
}

impl<'a> ArmNlp<'a> {
    /// The problem starts from the rest configuration of the model with the identity
    /// target until told otherwise.
    pub fn new(model: ArmKinematicsModel<'a>, variant: ProblemVariant, differencing: Differencing) -> Self {
        let x0 = model.rest_configuration();
        ArmNlp {
            model,
            variant,
            differencing,
            x0,
            xd: Vector3::zeros(),
            rd: UnitQuaternion::identity(),
            ud: Vector3::zeros(),
            heave: [0.0; 2],
            weight_torso: 0.0,
            weight_upper_arm: 0.0,
            solution: None,
        }
    }

    pub fn variant(&self) -> ProblemVariant {
        self.variant
    }

    /// Variant name for logging.
    pub fn mode(&self) -> &'static str {
        self.variant.name()
    }

    pub fn model(&self) -> &ArmKinematicsModel<'a> {
        &self.model
    }

    /// Sets the starting point and postural reference from a guess in public units.
    /// Entries are clamped into their bounds.
    pub fn set_q0(&mut self, q0: &[f64]) {
        self.x0 = self.model.clamp_initial_guess(q0);
    }

    /// Starting point in internal units.
    pub fn q0(&self) -> &[f64] {
        &self.x0
    }

    pub fn set_target(&mut self, hd: &Transform) {
        self.xd = translation(hd);
        self.rd = rotation(hd);
        self.ud = rotation_vector(&self.rd);
    }

    /// Desired orientation as a rotation vector.
    pub fn target_rotation_vector(&self) -> Vector3<f64> {
        self.ud
    }

    pub fn target_position(&self) -> Vector3<f64> {
        self.xd
    }

    /// Heights the proximal and distal platforms are held at in the heave variants.
    pub fn set_heave(&mut self, torso: f64, lower_arm: f64) {
        self.heave = [torso, lower_arm];
    }

    pub fn set_postural_weights(&mut self, torso: f64, upper_arm: f64) {
        self.weight_torso = torso;
        self.weight_upper_arm = upper_arm;
    }

    /// Status of the finished solve.
    pub fn status(&self) -> Option<ApplicationReturnStatus> {
        self.solution.as_ref().map(|s| s.status)
    }

    /// Final objective value of the finished solve.
    pub fn final_objective(&self) -> Option<f64> {
        self.solution.as_ref().map(|s| s.objective)
    }

    /// Final point in internal units.
    pub fn internal_result(&self) -> Option<&[f64]> {
        self.solution.as_ref().map(|s| s.x.as_slice())
    }

    /// Final point in public units (chain joints in degrees).
    pub fn result(&self) -> Option<Vec<f64>> {
        self.internal_result().map(|x| self.model.to_public(x))
    }

    fn heave_target(&self, which: Tripod) -> f64 {
        match which {
            Tripod::Proximal => self.heave[0],
            Tripod::Distal => self.heave[1],
        }
    }

    /// Constraint rows of one tripod: optionally the squared height error, then `n_z`.
    fn tripod_rows(&self, which: Tripod, x: &[f64], rows: &mut [f64]) {
        let state = self.model.tripod(which, x);
        match self.variant.heave {
            HeaveMode::Heave => {
                let dz = self.heave_target(which) - state.p.z;
                rows[0] = dz * dz;
                rows[1] = state.n.z;
            }
            HeaveMode::NoHeave => {
                rows[0] = state.n.z;
            }
        }
    }

    fn postural(weight: f64, x: &[f64], x0: &[f64]) -> f64 {
        if weight == 0.0 {
            return 0.0;
        }
        weight * x.iter().zip(x0).map(|(a, b)| (a - b) * (a - b)).sum::<f64>()
    }
}

impl NonlinearProgram for ArmNlp<'_> {
    fn info(&self) -> ProblemInfo {
        let m = self.variant.constraint_count();
        ProblemInfo { n: self.model.dof(), m, nnz_jac_g: m * TRIPOD_LEGS }
    }

    fn bounds(&self, x_l: &mut [f64], x_u: &mut [f64], g_l: &mut [f64], g_u: &mut [f64]) {
        let (lower, upper) = self.model.bounds();
        x_l.copy_from_slice(&lower);
        x_u.copy_from_slice(&upper);

        let per_tripod = self.variant.rows_per_tripod();
        for (k, which) in Tripod::BOTH.into_iter().enumerate() {
            let first = k * per_tripod;
            if self.variant.heave == HeaveMode::Heave {
                g_l[first] = 0.0;
                g_u[first] = 0.0;
            }
            let tilt = first + per_tripod - 1;
            g_l[tilt] = self.model.parameters().tripod(which).cos_alpha_max;
            g_u[tilt] = 1.0;
        }
    }

    fn starting_point(&self, x: &mut [f64]) {
        x.copy_from_slice(&self.x0);
    }

    fn objective(&self, x: &[f64]) -> f64 {
        let h = self.model.fkin(x);
        let mut f = (self.xd - translation(&h)).norm_squared();
        if self.variant.matching == PoseMatching::FullPose {
            f += rotation_error(&self.rd, &rotation(&h)).norm_squared();
        }

        let torso = self.model.tripod_range(Tripod::Proximal);
        let chain = self.model.chain_range();
        f += Self::postural(self.weight_torso, &x[torso.clone()], &self.x0[torso]);
        f += Self::postural(self.weight_upper_arm, &x[chain.clone()], &self.x0[chain]);
        f
    }

    fn constraints(&self, x: &[f64], g: &mut [f64]) {
        let per_tripod = self.variant.rows_per_tripod();
        for (k, which) in Tripod::BOTH.into_iter().enumerate() {
            self.tripod_rows(which, x, &mut g[k * per_tripod..(k + 1) * per_tripod]);
        }
    }

    fn jacobian_structure(&self, rows: &mut [usize], cols: &mut [usize]) {
        let per_tripod = self.variant.rows_per_tripod();
        let mut entry = 0;
        for (k, which) in Tripod::BOTH.into_iter().enumerate() {
            for row in k * per_tripod..(k + 1) * per_tripod {
                for col in self.model.tripod_range(which) {
                    rows[entry] = row;
                    cols[entry] = col;
                    entry += 1;
                }
            }
        }
    }

    fn jacobian_values(&self, x: &[f64], values: &mut [f64]) {
        let per_tripod = self.variant.rows_per_tripod();
        let block = per_tripod * TRIPOD_LEGS;
        for (k, which) in Tripod::BOTH.into_iter().enumerate() {
            self.differencing.jacobian_block(
                x,
                self.model.tripod_range(which),
                per_tripod,
                |x, rows| self.tripod_rows(which, x, rows),
                &mut values[k * block..(k + 1) * block],
            );
        }
    }

    fn finalize_solution(&mut self, status: ApplicationReturnStatus, x: &[f64], objective: f64) {
        self.solution = Some(FinalPoint { status, x: x.to_vec(), objective });
    }
}
