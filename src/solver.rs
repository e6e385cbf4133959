//! Inverse and forward kinematics of the arm behind one solver object.

use std::time::Instant;

use nalgebra::DMatrix;
use tracing::{info, warn};

use crate::arm_model::ArmKinematicsModel;
use crate::arm_nlp::{ArmNlp, HeaveMode, PoseMatching, ProblemVariant};
use crate::augmented_lagrangian::AugmentedLagrangian;
use crate::kinematic_traits::{ArmFrame, Transform};
use crate::kinematics_error::KinematicsError;
use crate::optimizer::{
    ApplicationReturnStatus, HessianApproximation, MuStrategy, Optimizer, OptimizerOptions,
    ScalingMethod,
};
use crate::parameters::{ArmParameters, SolverParameters};
use crate::tripod::Tripod;
use crate::utils::{
    format_configuration, homogeneous_transform_defect, orthonormalize, rotation, rotation_vector, translation,
};

/// Verbosity above which the optimizer starts to log its own progress.
const OPTIMIZER_VERBOSITY_OFFSET: u32 = 5;

/// Optimizer print level from which the Jacobian is checked against finite differences.
const DERIVATIVE_TEST_PRINT_LEVEL: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// Created, no initial guess supplied yet (the rest configuration is used).
    Idle,
    /// Initial guess supplied.
    Configured,
    Solving,
    /// The last solve ended with a successful status.
    Succeeded,
    /// The last solve ended with a failure status. Its point was still returned.
    Failed,
}

/// Outcome of an inverse kinematics solve.
#[derive(Debug, Clone, PartialEq)]
pub struct IkSolution {
    /// Final configuration, tripod lengths in meters and chain joints in degrees. Returned
    /// whether or not the solve succeeded.
    pub q: Vec<f64>,
    /// Successful optimizer status and, with heave, both platforms within `constr_tol`
    /// of their heights.
    pub success: bool,
    pub status: ApplicationReturnStatus,
}

impl IkSolution {
    /// Raw optimizer status code.
    pub fn raw_status(&self) -> i32 {
        self.status.code()
    }
}

/// Solver for the tripod, serial chain, tripod arm.
///
/// ```
/// use tripod_arm_kinematics::parameters::{ArmParameters, SolverParameters};
/// use tripod_arm_kinematics::kinematic_traits::ArmFrame;
/// use tripod_arm_kinematics::solver::ArmSolver;
///
/// let mut solver = ArmSolver::new(ArmParameters::default(), SolverParameters::default(), 0);
/// let q = solver.initial_guess().to_vec();
/// let target = solver.fkin(&q, ArmFrame::EndEffector).unwrap();
/// let solution = solver.ikin(&target).unwrap();
/// assert!(solution.success);
/// ```
pub struct ArmSolver<O: Optimizer = AugmentedLagrangian> {
    arm: ArmParameters,
    slv: SolverParameters,
    verbosity: u32,
    optimizer: O,

    /// Clamped initial guess, public units.
    q0: Vec<f64>,
    state: SolverState,
}

impl ArmSolver<AugmentedLagrangian> {
    pub fn new(arm: ArmParameters, slv: SolverParameters, verbosity: u32) -> Self {
        Self::with_optimizer(arm, slv, verbosity, AugmentedLagrangian::default())
    }
}

impl<O: Optimizer> ArmSolver<O> {
    pub fn with_optimizer(arm: ArmParameters, slv: SolverParameters, verbosity: u32, optimizer: O) -> Self {
        let q0 = Self::rest_guess(&arm);
        ArmSolver { arm, slv, verbosity, optimizer, q0, state: SolverState::Idle }
    }

    fn rest_guess(arm: &ArmParameters) -> Vec<f64> {
        let model = ArmKinematicsModel::new(arm);
        model.to_public(&model.rest_configuration())
    }

    fn model(&self) -> ArmKinematicsModel<'_> {
        ArmKinematicsModel::new(&self.arm)
    }

    pub fn arm_parameters(&self) -> &ArmParameters {
        &self.arm
    }

    /// Replaces the arm. The stored initial guess is clamped into the new bounds, or reset
    /// to the rest configuration if the number of joints changed.
    pub fn set_arm_parameters(&mut self, arm: ArmParameters) {
        let same_size = arm.dof() == self.arm.dof();
        self.arm = arm;
        self.q0 = if same_size {
            let model = self.model();
            model.to_public(&model.clamp_initial_guess(&self.q0))
        } else {
            Self::rest_guess(&self.arm)
        };
    }

    pub fn solver_parameters(&self) -> &SolverParameters {
        &self.slv
    }

    pub fn set_solver_parameters(&mut self, slv: SolverParameters) {
        self.slv = slv;
    }

    pub fn verbosity(&self) -> u32 {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: u32) {
        self.verbosity = verbosity;
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Stored initial guess, clamped into the bounds, public units.
    pub fn initial_guess(&self) -> &[f64] {
        &self.q0
    }

    /// Sets the starting point and postural reference of the following solves. Trailing
    /// entries beyond the arm configuration are ignored; a shorter vector is rejected and
    /// leaves the stored guess untouched.
    pub fn set_initial_guess(&mut self, q0: &[f64]) -> Result<(), KinematicsError> {
        self.check_size(q0)?;
        let model = self.model();
        self.q0 = model.to_public(&model.clamp_initial_guess(q0));
        self.state = SolverState::Configured;
        Ok(())
    }

    fn check_size(&self, q: &[f64]) -> Result<(), KinematicsError> {
        let expected = self.arm.dof();
        if q.len() < expected {
            return Err(KinematicsError::SizeMismatch { expected, found: q.len() });
        }
        Ok(())
    }

    /// Transform of the given frame for the configuration in public units.
    pub fn fkin(&self, q: &[f64], frame: ArmFrame) -> Result<Transform, KinematicsError> {
        self.check_size(q)?;
        let model = self.model();
        Ok(model.fkin_frame(&model.to_internal(q), frame))
    }

    /// Solves for the configuration reaching the target pose. Failing to converge is not an
    /// error: the best point found is returned with `success` unset.
    pub fn ikin(&mut self, hd: &Transform) -> Result<IkSolution, KinematicsError> {
        if let Some(defect) = homogeneous_transform_defect(hd) {
            return Err(KinematicsError::NotATransform(defect));
        }
        let hd = &orthonormalize(hd);

        let variant = ProblemVariant::from_flags(self.slv.full_pose, self.slv.can_heave);
        let options = self.optimizer_options();
        self.optimizer.configure(options);

        let arm = &self.arm;
        let mut nlp = ArmNlp::new(ArmKinematicsModel::new(arm), variant, self.slv.differencing);
        nlp.set_q0(&self.q0);
        nlp.set_target(hd);
        nlp.set_heave(self.slv.torso_heave, self.slv.lower_arm_heave);
        nlp.set_postural_weights(self.slv.weight_postural_torso, self.slv.weight_postural_upper_arm);

        self.state = SolverState::Solving;
        let started = Instant::now();
        let status = self.optimizer.solve(&mut nlp);
        let elapsed = started.elapsed();

        let q = match nlp.result() {
            Some(q) => q,
            None => {
                // The optimizer did not hand back a point; report the starting one
                nlp.model().to_public(nlp.q0())
            }
        };
        let mut success = status.is_success();
        if success {
            let heave_error = self.heave_error(&nlp, &q);
            if heave_error > self.slv.constr_tol {
                warn!("arm solver: platform height off by {:e}, more than constr_tol", heave_error);
                success = false;
            }
        }

        if self.verbosity > 0 {
            self.report(&nlp, &q, elapsed.as_secs_f64());
        }
        if success {
            self.state = SolverState::Succeeded;
        } else {
            self.state = SolverState::Failed;
            if self.verbosity > 0 {
                warn!("arm solver: {} failed with status {}", nlp.mode(), status);
            }
        }

        Ok(IkSolution { q, success, status })
    }

    /// As [`ArmSolver::ikin`] for a target of unchecked shape.
    pub fn ikin_dynamic(&mut self, hd: &DMatrix<f64>) -> Result<IkSolution, KinematicsError> {
        if hd.nrows() != 4 || hd.ncols() != 4 {
            return Err(KinematicsError::InvalidShape { rows: hd.nrows(), cols: hd.ncols() });
        }
        let hd: Transform = hd.fixed_view::<4, 4>(0, 0).into_owned();
        self.ikin(&hd)
    }

    /// Largest distance of a platform from its heave height, zero without heave.
    fn heave_error(&self, nlp: &ArmNlp, q: &[f64]) -> f64 {
        if nlp.variant().heave != HeaveMode::Heave {
            return 0.0;
        }
        let model = nlp.model();
        let x = model.to_internal(q);
        let torso = model.tripod(Tripod::Proximal, &x);
        let lower_arm = model.tripod(Tripod::Distal, &x);
        (self.slv.torso_heave - torso.p.z).abs().max((self.slv.lower_arm_heave - lower_arm.p.z).abs())
    }

    fn optimizer_options(&self) -> OptimizerOptions {
        let print_level = self.verbosity.saturating_sub(OPTIMIZER_VERBOSITY_OFFSET) as usize;
        // Heave rows are squared height errors
        let constr_viol_tol = if self.slv.can_heave { self.slv.constr_tol.powi(2) } else { self.slv.constr_tol };
        OptimizerOptions {
            tol: self.slv.tol,
            constr_viol_tol,
            acceptable_iter: 0,
            mu_strategy: MuStrategy::Adaptive,
            max_iter: self.slv.max_iter,
            nlp_scaling_method: ScalingMethod::GradientBased,
            hessian_approximation: HessianApproximation::LimitedMemory,
            derivative_test: print_level > DERIVATIVE_TEST_PRINT_LEVEL,
            print_level,
            ..self.optimizer.options().clone()
        }
    }

    fn report(&self, nlp: &ArmNlp, q: &[f64], elapsed: f64) {
        let model = nlp.model();
        let x = model.to_internal(q);
        let h = model.fkin(&x);
        let torso = model.tripod(Tripod::Proximal, &x);
        let lower_arm = model.tripod(Tripod::Distal, &x);
        let variant = nlp.variant();

        info!(" *** Arm Solver ******************************");
        info!(" *** Arm Solver:          arm = {}-DOF chain", model.chain_dof());
        info!(" *** Arm Solver:         mode = {}", nlp.mode());
        info!(" *** Arm Solver:          tol = {:e}", self.slv.tol);
        info!(" *** Arm Solver:   constr_tol = {:e}", self.slv.constr_tol);
        info!(" *** Arm Solver:       q0 [*] = ({})", format_configuration(&self.q0));
        info!(" *** Arm Solver:       xd [m] = {:.3?}", nlp.target_position().as_slice());
        info!(" *** Arm Solver:     ud [rad] = {:.3?}", nlp.target_rotation_vector().as_slice());
        info!(" *** Arm Solver:        q [*] = ({})", format_configuration(q));
        info!(" *** Arm Solver:      e_x [m] = {:e}", (nlp.target_position() - translation(&h)).norm());
        if variant.matching == PoseMatching::FullPose {
            let u = rotation_vector(&rotation(&h));
            info!(" *** Arm Solver:    e_u [rad] = {:e}", (nlp.target_rotation_vector() - u).norm());
        }
        if variant.heave == HeaveMode::Heave {
            info!(" *** Arm Solver:     e_z1 [m] = {:e}", (self.slv.torso_heave - torso.p.z).abs());
            info!(" *** Arm Solver:     e_z2 [m] = {:e}", (self.slv.lower_arm_heave - lower_arm.p.z).abs());
        }
        info!(" *** Arm Solver: alpha1 [deg] = {:.3}", torso.tilt().to_degrees());
        info!(" *** Arm Solver: alpha2 [deg] = {:.3}", lower_arm.tilt().to_degrees());
        info!(" *** Arm Solver:      dt [ms] = {:.3}", 1000.0 * elapsed);
        if let Some(status) = nlp.status() {
            info!(" *** Arm Solver:       status = {}", status);
        }
        info!(" *** Arm Solver ******************************");
    }
}
