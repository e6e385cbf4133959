//! Contract between the arm problems and a constrained nonlinear optimizer.
//!
//! The protocol follows the usual interior-point solver interface: the optimizer first
//! queries the problem dimensions, bounds and the structure of the constraint Jacobian,
//! then repeatedly asks for values at points of its choice, and finally hands the last
//! point back to the problem. Problems solved here are
//!
//! ```text
//! minimize f(x)  subject to  g_l <= g(x) <= g_u,  x_l <= x <= x_u
//! ```
//!
//! Equality constraints have `g_l == g_u`.

use std::fmt;

/// Dimensions of a nonlinear program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemInfo {
    /// Number of variables.
    pub n: usize,
    /// Number of constraints.
    pub m: usize,
    /// Number of nonzero entries of the constraint Jacobian.
    pub nnz_jac_g: usize,
}

/// Nonlinear program as seen by the optimizer. Evaluations never modify the problem;
/// only [`NonlinearProgram::finalize_solution`] does.
pub trait NonlinearProgram {
    fn info(&self) -> ProblemInfo;

    /// Fills variable bounds (`n` entries each) and constraint bounds (`m` entries each).
    fn bounds(&self, x_l: &mut [f64], x_u: &mut [f64], g_l: &mut [f64], g_u: &mut [f64]);

    /// Fills the starting point.
    fn starting_point(&self, x: &mut [f64]);

    fn objective(&self, x: &[f64]) -> f64;

    /// Analytic gradient of the objective. Returns false when the problem does not
    /// provide one, in which case the optimizer approximates it.
    fn objective_gradient(&self, _x: &[f64], _gradient: &mut [f64]) -> bool {
        false
    }

    /// Fills the `m` constraint values.
    fn constraints(&self, x: &[f64], g: &mut [f64]);

    /// Structure pass: row and column of each of the `nnz_jac_g` Jacobian entries.
    fn jacobian_structure(&self, rows: &mut [usize], cols: &mut [usize]);

    /// Value pass: the `nnz_jac_g` Jacobian entries at `x`, in the order of the structure pass.
    fn jacobian_values(&self, x: &[f64], values: &mut [f64]);

    /// Receives the final point, whatever the outcome of the solve.
    fn finalize_solution(&mut self, status: ApplicationReturnStatus, x: &[f64], objective: f64);
}

/// Outcome of a solve. Codes follow the common interior-point solver convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationReturnStatus {
    SolveSucceeded,
    SolvedToAcceptableLevel,
    InfeasibleProblemDetected,
    SearchDirectionBecomesTooSmall,
    DivergingIterates,
    UserRequestedStop,
    FeasiblePointFound,
    MaximumIterationsExceeded,
    RestorationFailed,
    ErrorInStepComputation,
    MaximumCpuTimeExceeded,
    NotEnoughDegreesOfFreedom,
    InvalidProblemDefinition,
    InvalidOption,
    InvalidNumberDetected,
    UnrecoverableException,
    InternalError,
}

impl ApplicationReturnStatus {
    /// Raw status code.
    pub fn code(&self) -> i32 {
        use ApplicationReturnStatus::*;
        match self {
            SolveSucceeded => 0,
            SolvedToAcceptableLevel => 1,
            InfeasibleProblemDetected => 2,
            SearchDirectionBecomesTooSmall => 3,
            DivergingIterates => 4,
            UserRequestedStop => 5,
            FeasiblePointFound => 6,
            MaximumIterationsExceeded => -1,
            RestorationFailed => -2,
            ErrorInStepComputation => -3,
            MaximumCpuTimeExceeded => -4,
            NotEnoughDegreesOfFreedom => -10,
            InvalidProblemDefinition => -11,
            InvalidOption => -12,
            InvalidNumberDetected => -13,
            UnrecoverableException => -100,
            InternalError => -199,
        }
    }

    /// Status from the raw code, if known.
    pub fn from_code(code: i32) -> Option<Self> {
        use ApplicationReturnStatus::*;
        [
            SolveSucceeded, SolvedToAcceptableLevel, InfeasibleProblemDetected,
            SearchDirectionBecomesTooSmall, DivergingIterates, UserRequestedStop,
            FeasiblePointFound, MaximumIterationsExceeded, RestorationFailed,
            ErrorInStepComputation, MaximumCpuTimeExceeded, NotEnoughDegreesOfFreedom,
            InvalidProblemDefinition, InvalidOption, InvalidNumberDetected,
            UnrecoverableException, InternalError,
        ]
        .into_iter()
        .find(|status| status.code() == code)
    }

    /// Solved, solved to acceptable level, or at least a feasible point was found.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ApplicationReturnStatus::SolveSucceeded
                | ApplicationReturnStatus::SolvedToAcceptableLevel
                | ApplicationReturnStatus::FeasiblePointFound
        )
    }
}

impl fmt::Display for ApplicationReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// How the penalty (barrier) parameter is updated between outer iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuStrategy {
    /// Increase only when the infeasibility does not decrease fast enough.
    Adaptive,
    /// Increase on every outer iteration.
    Monotone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HessianApproximation {
    /// Exact second derivatives, requires a Hessian from the problem.
    Exact,
    /// Limited-memory quasi-Newton approximation.
    LimitedMemory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingMethod {
    None,
    /// Scale the objective so its initial gradient is not larger than 100.
    GradientBased,
}

/// Optimizer options.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerOptions {
    /// Convergence tolerance on the stationarity error.
    pub tol: f64,
    /// Tolerated constraint violation.
    pub constr_viol_tol: f64,
    /// Stationarity error accepted after `acceptable_iter` consecutive acceptable iterations.
    pub acceptable_tol: f64,
    /// Constraint violation accepted for acceptable termination.
    pub acceptable_constr_viol_tol: f64,
    /// Consecutive acceptable iterations before terminating; 0 disables acceptable termination.
    pub acceptable_iter: usize,
    pub mu_strategy: MuStrategy,
    pub max_iter: usize,
    pub nlp_scaling_method: ScalingMethod,
    pub hessian_approximation: HessianApproximation,
    /// Number of correction pairs kept by the limited-memory approximation.
    pub limited_memory_max_history: usize,
    /// Compare the Jacobian of the problem against finite differences at the starting point.
    pub derivative_test: bool,
    /// 0 is silent; higher values log more of the optimizer progress.
    pub print_level: usize,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        OptimizerOptions {
            tol: 1e-8,
            constr_viol_tol: 1e-4,
            acceptable_tol: 1e-6,
            acceptable_constr_viol_tol: 1e-2,
            acceptable_iter: 15,
            mu_strategy: MuStrategy::Monotone,
            max_iter: 3000,
            nlp_scaling_method: ScalingMethod::GradientBased,
            hessian_approximation: HessianApproximation::LimitedMemory,
            limited_memory_max_history: 6,
            derivative_test: false,
            print_level: 0,
        }
    }
}

impl OptimizerOptions {
    /// Describes the first invalid option, if any.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.tol > 0.0) {
            return Err(format!("tol must be positive, got {}", self.tol));
        }
        if !(self.constr_viol_tol > 0.0) {
            return Err(format!("constr_viol_tol must be positive, got {}", self.constr_viol_tol));
        }
        if !(self.acceptable_tol > 0.0) || !(self.acceptable_constr_viol_tol > 0.0) {
            return Err("acceptable tolerances must be positive".to_string());
        }
        if self.limited_memory_max_history == 0 {
            return Err("limited_memory_max_history must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Constrained nonlinear optimizer.
pub trait Optimizer {
    fn configure(&mut self, options: OptimizerOptions);

    fn options(&self) -> &OptimizerOptions;

    /// Runs the solve to completion. The final point is always passed to
    /// [`NonlinearProgram::finalize_solution`], whatever the status.
    fn solve(&mut self, problem: &mut dyn NonlinearProgram) -> ApplicationReturnStatus;
}
