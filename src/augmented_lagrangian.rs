//! Augmented Lagrangian optimizer on top of the `optimization_engine` crate (OpEn).
//!
//! Two-sided constraints `g_l <= g(x) <= g_u` become the OpEn mapping `F1(x)` constrained
//! to the box `C = [g_l, g_u]`. OpEn minimizes the augmented Lagrangian over the variable
//! box with PANOC and updates the multipliers and the penalty between outer iterations.
//! Problems without constraints are handed to PANOC directly.
//!
//! Variables are rescaled by the width of their box relative to the widest one, so a short
//! actuator in meters and a joint in radians move in proportion to their range. The
//! objective gradient is taken from the problem when it provides one and approximated by
//! central differences otherwise. Only the limited-memory Hessian approximation is
//! supported.

use optimization_engine::alm::{
    AlmCache, AlmFactory, AlmOptimizer, AlmProblem, NO_JACOBIAN_MAPPING, NO_MAPPING,
};
use optimization_engine::constraints::{Ball2, Rectangle};
use optimization_engine::core::ExitStatus;
use optimization_engine::panoc::{PANOCCache, PANOCOptimizer};
use optimization_engine::{Optimizer as _, Problem, SolverError};
use tracing::{debug, warn};

use crate::differencing::Differencing;
use crate::optimizer::{
    ApplicationReturnStatus, HessianApproximation, MuStrategy, NonlinearProgram, Optimizer,
    OptimizerOptions, ProblemInfo, ScalingMethod,
};

const INITIAL_PENALTY: f64 = 10.0;
const PENALTY_GROWTH: f64 = 5.0;

/// Adaptive strategy: the multiplier update must shrink at least by this factor per outer
/// iteration, otherwise the penalty grows.
const SUFFICIENT_DECREASE: f64 = 0.1;

/// Monotone strategy: the penalty grows unless the multiplier update collapses.
const MONOTONE_DECREASE: f64 = 1e-6;

const MAX_OUTER_ITERATIONS: usize = 50;
const INITIAL_INNER_TOLERANCE: f64 = 0.1;

/// Radius of the ball the multipliers are kept in.
const MAX_MULTIPLIER: f64 = 1e12;

const GRADIENT_SCALING_LIMIT: f64 = 100.0;
const DERIVATIVE_TEST_TOLERANCE: f64 = 1e-4;

/// Built-in [`Optimizer`].
#[derive(Debug, Clone, Default)]
pub struct AugmentedLagrangian {
    options: OptimizerOptions,
}

impl AugmentedLagrangian {
    pub fn new(options: OptimizerOptions) -> Self {
        AugmentedLagrangian { options }
    }
}

/// What the engine reports back after a solve.
#[derive(Debug, Clone, Copy)]
struct Outcome {
    exit: ExitStatus,
    outer_iterations: usize,
    inner_iterations: usize,
    /// Norm of the fixed-point residual of the last inner problem.
    stationarity: f64,
}

/// Problem data queried once, plus the evaluations in scaled variables `u = x / scale`
/// that the engine works with.
struct Evaluator<'p> {
    problem: &'p dyn NonlinearProgram,
    info: ProblemInfo,
    x_l: Vec<f64>,
    x_u: Vec<f64>,
    g_l: Vec<f64>,
    g_u: Vec<f64>,
    rows: Vec<usize>,
    cols: Vec<usize>,
    objective_scale: f64,
    /// Box widths relative to the widest box, 1 for unbounded or fixed variables.
    variable_scale: Vec<f64>,
}

fn finite(values: &[f64]) -> Result<(), SolverError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SolverError::NotFiniteComputation)
    }
}

impl<'p> Evaluator<'p> {
    fn new(problem: &'p dyn NonlinearProgram) -> Result<Self, String> {
        let info = problem.info();
        let (n, m) = (info.n, info.m);
        if n == 0 {
            return Err("problem has no variables".to_string());
        }

        let mut x_l = vec![0.0; n];
        let mut x_u = vec![0.0; n];
        let mut g_l = vec![0.0; m];
        let mut g_u = vec![0.0; m];
        problem.bounds(&mut x_l, &mut x_u, &mut g_l, &mut g_u);

        for (i, (lo, hi)) in x_l.iter().zip(&x_u).enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(format!("invalid bounds [{}, {}] of variable {}", lo, hi, i));
            }
        }
        for (i, (lo, hi)) in g_l.iter().zip(&g_u).enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(format!("invalid bounds [{}, {}] of constraint {}", lo, hi, i));
            }
        }

        let mut rows = vec![0; info.nnz_jac_g];
        let mut cols = vec![0; info.nnz_jac_g];
        problem.jacobian_structure(&mut rows, &mut cols);
        if rows.iter().any(|&r| r >= m) || cols.iter().any(|&c| c >= n) {
            return Err("Jacobian structure refers to entries outside of the problem".to_string());
        }

        let widest = x_l
            .iter()
            .zip(&x_u)
            .map(|(lo, hi)| hi - lo)
            .filter(|width| width.is_finite())
            .fold(0.0, f64::max);
        let variable_scale = x_l
            .iter()
            .zip(&x_u)
            .map(|(lo, hi)| {
                let width = hi - lo;
                if width.is_finite() && width > 0.0 { width / widest } else { 1.0 }
            })
            .collect();

        Ok(Evaluator {
            problem,
            info,
            x_l,
            x_u,
            g_l,
            g_u,
            rows,
            cols,
            objective_scale: 1.0,
            variable_scale,
        })
    }

    fn project(&self, x: &mut [f64]) {
        for (v, (lo, hi)) in x.iter_mut().zip(self.x_l.iter().zip(&self.x_u)) {
            *v = v.max(*lo).min(*hi);
        }
    }

    fn to_scaled(&self, x: &[f64]) -> Vec<f64> {
        x.iter().zip(&self.variable_scale).map(|(v, s)| v / s).collect()
    }

    fn to_original(&self, u: &[f64]) -> Vec<f64> {
        u.iter().zip(&self.variable_scale).map(|(v, s)| v * s).collect()
    }

    fn scaled_bounds(&self) -> (Vec<f64>, Vec<f64>) {
        (self.to_scaled(&self.x_l), self.to_scaled(&self.x_u))
    }

    /// Gradient of the scaled objective with respect to the original variables.
    fn objective_gradient(&self, x: &[f64], gradient: &mut [f64]) {
        if !self.problem.objective_gradient(x, gradient) {
            Differencing::Central.gradient(x, |x| self.problem.objective(x), gradient);
        }
        for g in gradient.iter_mut() {
            *g *= self.objective_scale;
        }
    }

    fn constraints(&self, x: &[f64]) -> Vec<f64> {
        let mut g = vec![0.0; self.info.m];
        self.problem.constraints(x, &mut g);
        g
    }

    fn jacobian(&self, x: &[f64]) -> Vec<f64> {
        let mut values = vec![0.0; self.info.nnz_jac_g];
        self.problem.jacobian_values(x, &mut values);
        values
    }

    /// Largest violation of the constraint bounds.
    fn violation(&self, g: &[f64]) -> f64 {
        g.iter()
            .zip(self.g_l.iter().zip(&self.g_u))
            .map(|(v, (lo, hi))| (lo - v).max(v - hi).max(0.0))
            .fold(0.0, f64::max)
    }

    fn cost(&self, u: &[f64], cost: &mut f64) -> Result<(), SolverError> {
        *cost = self.objective_scale * self.problem.objective(&self.to_original(u));
        finite(&[*cost])
    }

    fn gradient(&self, u: &[f64], gradient: &mut [f64]) -> Result<(), SolverError> {
        self.objective_gradient(&self.to_original(u), gradient);
        for (g, s) in gradient.iter_mut().zip(&self.variable_scale) {
            *g *= s;
        }
        finite(gradient)
    }

    /// The constraint mapping `F1(u) = g(x)`.
    fn mapping(&self, u: &[f64], g: &mut [f64]) -> Result<(), SolverError> {
        self.problem.constraints(&self.to_original(u), g);
        finite(g)
    }

    /// `JF1(u)^T d`, assembled from the sparse constraint Jacobian.
    fn jacobian_product(&self, u: &[f64], d: &[f64], product: &mut [f64]) -> Result<(), SolverError> {
        let jacobian = self.jacobian(&self.to_original(u));
        product.fill(0.0);
        for ((row, col), value) in self.rows.iter().zip(&self.cols).zip(&jacobian) {
            product[*col] += value * d[*row];
        }
        for (p, s) in product.iter_mut().zip(&self.variable_scale) {
            *p *= s;
        }
        finite(product)
    }
}

impl AugmentedLagrangian {
    /// PANOC on the variable box, for problems without constraints.
    fn minimize(&self, eval: &Evaluator, bounds: &Rectangle, u: &mut [f64]) -> Result<Outcome, SolverError> {
        let mut cache = PANOCCache::new(u.len(), self.options.tol, self.options.limited_memory_max_history);
        let problem = Problem::new(
            bounds,
            |u: &[f64], gradient: &mut [f64]| eval.gradient(u, gradient),
            |u: &[f64], cost: &mut f64| eval.cost(u, cost),
        );
        let mut panoc = PANOCOptimizer::new(problem, &mut cache).with_max_iter(self.options.max_iter);
        let status = panoc.solve(u)?;

        Ok(Outcome {
            exit: status.exit_status(),
            outer_iterations: 1,
            inner_iterations: status.iterations(),
            stationarity: status.norm_fpr(),
        })
    }

    /// OpEn augmented Lagrangian with PANOC inner solves.
    fn minimize_constrained(
        &self,
        eval: &Evaluator,
        bounds: &Rectangle,
        u: &mut [f64],
    ) -> Result<Outcome, SolverError> {
        let options = &self.options;
        let (n, m) = (eval.info.n, eval.info.m);

        let set_c = Rectangle::new(Some(eval.g_l.as_slice()), Some(eval.g_u.as_slice()));
        let f1 = |u: &[f64], g: &mut [f64]| eval.mapping(u, g);
        let f1_jacobian = |u: &[f64], d: &[f64], product: &mut [f64]| eval.jacobian_product(u, d, product);
        let factory = AlmFactory::new(
            |u: &[f64], cost: &mut f64| eval.cost(u, cost),
            |u: &[f64], gradient: &mut [f64]| eval.gradient(u, gradient),
            Some(f1),
            Some(f1_jacobian),
            NO_MAPPING,
            NO_JACOBIAN_MAPPING,
            Some(set_c.clone()),
            0,
        );
        let problem = AlmProblem::new(
            bounds.clone(),
            Some(set_c),
            Some(Ball2::new(None, MAX_MULTIPLIER)),
            |u: &[f64], xi: &[f64], cost: &mut f64| factory.psi(u, xi, cost),
            |u: &[f64], xi: &[f64], gradient: &mut [f64]| factory.d_psi(u, xi, gradient),
            Some(f1),
            NO_MAPPING,
            m,
            0,
        );

        let decrease = match options.mu_strategy {
            MuStrategy::Adaptive => SUFFICIENT_DECREASE,
            MuStrategy::Monotone => MONOTONE_DECREASE,
        };
        let panoc_cache = PANOCCache::new(n, options.tol, options.limited_memory_max_history);
        let mut cache = AlmCache::new(panoc_cache, m, 0);
        let mut alm = AlmOptimizer::new(&mut cache, problem)
            .with_delta_tolerance(options.constr_viol_tol)
            .with_epsilon_tolerance(options.tol)
            .with_initial_inner_tolerance(INITIAL_INNER_TOLERANCE.max(options.tol))
            .with_max_outer_iterations(MAX_OUTER_ITERATIONS)
            .with_max_inner_iterations(options.max_iter)
            .with_initial_penalty(INITIAL_PENALTY)
            .with_penalty_update_factor(PENALTY_GROWTH)
            .with_sufficient_decrease_coefficient(decrease);
        let status = alm.solve(u)?;

        if options.print_level > 0 {
            debug!(
                "augmented Lagrangian: penalty {:e}, multiplier change {:e}, cost {:e}",
                status.penalty(),
                status.delta_y_norm_over_c(),
                status.cost()
            );
        }
        Ok(Outcome {
            exit: status.exit_status(),
            outer_iterations: status.num_outer_iterations(),
            inner_iterations: status.num_inner_iterations(),
            stationarity: status.last_problem_norm_fpr(),
        })
    }

    /// Compares the Jacobian of the problem with central differences and logs mismatches.
    fn derivative_test(&self, eval: &Evaluator, x: &[f64]) {
        let jacobian = eval.jacobian(x);
        let mut mismatches = 0;
        for ((row, col), value) in eval.rows.iter().zip(&eval.cols).zip(&jacobian) {
            let reference = Differencing::Central.derivative(x, *col, |x| eval.constraints(x)[*row]);
            let error = (value - reference).abs() / reference.abs().max(1.0);
            if error > DERIVATIVE_TEST_TOLERANCE {
                mismatches += 1;
                warn!("derivative test: jac_g[{},{}] = {:e}, finite difference {:e}", row, col, value, reference);
            }
        }
        debug!("derivative test: {} of {} Jacobian entries mismatch", mismatches, jacobian.len());
    }

    fn run(&self, eval: &mut Evaluator, x: &mut Vec<f64>) -> ApplicationReturnStatus {
        let options = &self.options;

        if options.nlp_scaling_method == ScalingMethod::GradientBased {
            let mut gradient = vec![0.0; x.len()];
            eval.objective_gradient(x, &mut gradient);
            let largest = gradient.iter().fold(0.0, |largest: f64, g| largest.max(g.abs()));
            if largest.is_finite() && largest > GRADIENT_SCALING_LIMIT {
                eval.objective_scale = GRADIENT_SCALING_LIMIT / largest;
            }
        }
        let eval: &Evaluator = eval;
        if options.derivative_test {
            self.derivative_test(eval, x);
        }

        let mut u = eval.to_scaled(x);
        let mut cost = 0.0;
        let mut gradient = vec![0.0; u.len()];
        if eval.cost(&u, &mut cost).and_then(|_| eval.gradient(&u, &mut gradient)).is_err() {
            warn!("objective or its gradient is not finite at the starting point");
            return ApplicationReturnStatus::InvalidNumberDetected;
        }
        if options.max_iter == 0 {
            return ApplicationReturnStatus::MaximumIterationsExceeded;
        }

        let (lower, upper) = eval.scaled_bounds();
        let bounds = Rectangle::new(Some(lower.as_slice()), Some(upper.as_slice()));
        let result = if eval.info.m == 0 {
            self.minimize(eval, &bounds, &mut u)
        } else {
            self.minimize_constrained(eval, &bounds, &mut u)
        };
        *x = eval.to_original(&u);
        eval.project(x);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(SolverError::NotFiniteComputation) => return ApplicationReturnStatus::InvalidNumberDetected,
            Err(error) => {
                warn!("optimization engine failed: {:?}", error);
                return ApplicationReturnStatus::InternalError;
            }
        };

        let violation = eval.violation(&eval.constraints(x));
        if options.print_level > 0 {
            debug!(
                "{:?} after {} outer and {} inner iterations, stationarity {:e}, violation {:e}",
                outcome.exit, outcome.outer_iterations, outcome.inner_iterations, outcome.stationarity, violation
            );
        }

        match outcome.exit {
            ExitStatus::Converged => ApplicationReturnStatus::SolveSucceeded,
            ExitStatus::NotConvergedOutOfTime => ApplicationReturnStatus::MaximumCpuTimeExceeded,
            ExitStatus::NotConvergedIterations => {
                if options.acceptable_iter > 0
                    && violation <= options.acceptable_constr_viol_tol
                    && outcome.stationarity <= options.acceptable_tol
                {
                    ApplicationReturnStatus::SolvedToAcceptableLevel
                } else if outcome.outer_iterations >= MAX_OUTER_ITERATIONS && violation > options.constr_viol_tol {
                    ApplicationReturnStatus::InfeasibleProblemDetected
                } else {
                    ApplicationReturnStatus::MaximumIterationsExceeded
                }
            }
        }
    }
}

impl Optimizer for AugmentedLagrangian {
    fn configure(&mut self, options: OptimizerOptions) {
        self.options = options;
    }

    fn options(&self) -> &OptimizerOptions {
        &self.options
    }

    fn solve(&mut self, problem: &mut dyn NonlinearProgram) -> ApplicationReturnStatus {
        let info = problem.info();
        let mut x = vec![0.0; info.n];
        problem.starting_point(&mut x);

        if let Err(reason) = self.options.validate() {
            warn!("invalid optimizer option: {}", reason);
            let objective = problem.objective(&x);
            problem.finalize_solution(ApplicationReturnStatus::InvalidOption, &x, objective);
            return ApplicationReturnStatus::InvalidOption;
        }
        if self.options.hessian_approximation == HessianApproximation::Exact {
            warn!("exact Hessian is not supported, use the limited-memory approximation");
            let objective = problem.objective(&x);
            problem.finalize_solution(ApplicationReturnStatus::InvalidOption, &x, objective);
            return ApplicationReturnStatus::InvalidOption;
        }

        let status = match Evaluator::new(&*problem) {
            Ok(mut eval) => {
                eval.project(&mut x);
                self.run(&mut eval, &mut x)
            }
            Err(reason) => {
                warn!("invalid problem definition: {}", reason);
                ApplicationReturnStatus::InvalidProblemDefinition
            }
        };

        let objective = problem.objective(&x);
        problem.finalize_solution(status, &x, objective);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// At most one constraint row, dense over all variables.
    struct TestProblem {
        x_l: Vec<f64>,
        x_u: Vec<f64>,
        start: Vec<f64>,
        objective: fn(&[f64]) -> f64,
        gradient: Option<fn(&[f64], &mut [f64])>,
        constraint: Option<(fn(&[f64]) -> f64, fn(&[f64], &mut [f64]), f64, f64)>,
        result: Option<(ApplicationReturnStatus, Vec<f64>)>,
    }

    impl TestProblem {
        fn bounded(x_l: Vec<f64>, x_u: Vec<f64>, start: Vec<f64>, objective: fn(&[f64]) -> f64) -> Self {
            TestProblem { x_l, x_u, start, objective, gradient: None, constraint: None, result: None }
        }

        fn solution(&self) -> &[f64] {
            &self.result.as_ref().expect("finalized").1
        }
    }

    impl NonlinearProgram for TestProblem {
        fn info(&self) -> ProblemInfo {
            let n = self.start.len();
            match self.constraint {
                Some(_) => ProblemInfo { n, m: 1, nnz_jac_g: n },
                None => ProblemInfo { n, m: 0, nnz_jac_g: 0 },
            }
        }

        fn bounds(&self, x_l: &mut [f64], x_u: &mut [f64], g_l: &mut [f64], g_u: &mut [f64]) {
            x_l.copy_from_slice(&self.x_l);
            x_u.copy_from_slice(&self.x_u);
            if let Some((_, _, lo, hi)) = self.constraint {
                g_l[0] = lo;
                g_u[0] = hi;
            }
        }

        fn starting_point(&self, x: &mut [f64]) {
            x.copy_from_slice(&self.start);
        }

        fn objective(&self, x: &[f64]) -> f64 {
            (self.objective)(x)
        }

        fn objective_gradient(&self, x: &[f64], gradient: &mut [f64]) -> bool {
            match self.gradient {
                Some(f) => {
                    f(x, gradient);
                    true
                }
                None => false,
            }
        }

        fn constraints(&self, x: &[f64], g: &mut [f64]) {
            if let Some((c, _, _, _)) = self.constraint {
                g[0] = c(x);
            }
        }

        fn jacobian_structure(&self, rows: &mut [usize], cols: &mut [usize]) {
            for (i, (r, c)) in rows.iter_mut().zip(cols.iter_mut()).enumerate() {
                *r = 0;
                *c = i;
            }
        }

        fn jacobian_values(&self, x: &[f64], values: &mut [f64]) {
            if let Some((_, dc, _, _)) = self.constraint {
                dc(x, values);
            }
        }

        fn finalize_solution(&mut self, status: ApplicationReturnStatus, x: &[f64], _objective: f64) {
            self.result = Some((status, x.to_vec()));
        }
    }

    fn shifted_quadratic(x: &[f64]) -> f64 {
        (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2)
    }

    fn squared_norm(x: &[f64]) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    fn sum(x: &[f64]) -> f64 {
        x.iter().sum()
    }

    fn sum_gradient(_x: &[f64], values: &mut [f64]) {
        values.fill(1.0);
    }

    fn rosenbrock(x: &[f64]) -> f64 {
        (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
    }

    #[test]
    fn test_bound_constrained_quadratic() {
        let mut problem = TestProblem::bounded(vec![0.0, 0.0], vec![1.0, 1.0], vec![0.5, 0.5], shifted_quadratic);
        let status = AugmentedLagrangian::default().solve(&mut problem);
        assert_eq!(status, ApplicationReturnStatus::SolveSucceeded);
        let x = problem.solution();
        assert!((x[0] - 1.0).abs() < 1e-9, "{:?}", x);
        assert!(x[1].abs() < 1e-9, "{:?}", x);
    }

    #[test]
    fn test_starting_point_projected() {
        // Start outside the box and already past the optimum along both axes
        let mut problem = TestProblem::bounded(vec![0.0, 0.0], vec![1.0, 1.0], vec![5.0, -5.0], shifted_quadratic);
        let status = AugmentedLagrangian::default().solve(&mut problem);
        assert!(status.is_success(), "{}", status);
        let x = problem.solution();
        assert!((x[0] - 1.0).abs() < 1e-9 && x[1].abs() < 1e-9, "{:?}", x);
    }

    #[test]
    fn test_equality_constraint() {
        let mut problem = TestProblem::bounded(vec![-10.0; 2], vec![10.0; 2], vec![3.0, -1.0], squared_norm);
        problem.constraint = Some((sum, sum_gradient, 1.0, 1.0));
        let status = AugmentedLagrangian::default().solve(&mut problem);
        assert!(status.is_success(), "{}", status);
        let x = problem.solution();
        assert!((x[0] - 0.5).abs() < 1e-3 && (x[1] - 0.5).abs() < 1e-3, "{:?}", x);
        assert!((sum(x) - 1.0).abs() <= 1e-4);
    }

    #[test]
    fn test_inequality_constraint_with_gradient() {
        fn objective(x: &[f64]) -> f64 {
            (x[0] - 3.0).powi(2)
        }
        fn gradient(x: &[f64], g: &mut [f64]) {
            g[0] = 2.0 * (x[0] - 3.0);
        }
        let mut problem = TestProblem::bounded(vec![-10.0], vec![10.0], vec![0.0], objective);
        problem.gradient = Some(gradient);
        problem.constraint = Some((sum, sum_gradient, f64::NEG_INFINITY, 1.0));
        let status = AugmentedLagrangian::default().solve(&mut problem);
        assert!(status.is_success(), "{}", status);
        assert!((problem.solution()[0] - 1.0).abs() < 1e-3, "{:?}", problem.solution());
    }

    #[test]
    fn test_inactive_constraint() {
        let mut problem = TestProblem::bounded(vec![-10.0; 2], vec![10.0; 2], vec![1.0, 1.0], shifted_quadratic);
        problem.constraint = Some((sum, sum_gradient, -5.0, 5.0));
        let status = AugmentedLagrangian::default().solve(&mut problem);
        assert_eq!(status, ApplicationReturnStatus::SolveSucceeded);
        let x = problem.solution();
        assert!((x[0] - 2.0).abs() < 1e-6 && (x[1] + 1.0).abs() < 1e-6, "{:?}", x);
    }

    #[test]
    fn test_squared_residual_row() {
        // The violation tolerance bounds the squared residual, so a tolerance of 1e-12
        // holds the residual itself within 1e-6
        fn objective(x: &[f64]) -> f64 {
            (x[0] - 0.25).powi(2) + x[1] * x[1]
        }
        fn squared_offset(x: &[f64]) -> f64 {
            (x[0] - 0.25).powi(2)
        }
        fn squared_offset_gradient(x: &[f64], values: &mut [f64]) {
            values[0] = 2.0 * (x[0] - 0.25);
            values[1] = 0.0;
        }
        let mut problem = TestProblem::bounded(vec![0.0; 2], vec![1.0; 2], vec![0.8, 0.8], objective);
        problem.constraint = Some((squared_offset, squared_offset_gradient, 0.0, 0.0));
        let mut optimizer = AugmentedLagrangian::new(OptimizerOptions {
            constr_viol_tol: 1e-12,
            mu_strategy: MuStrategy::Adaptive,
            ..OptimizerOptions::default()
        });
        assert_eq!(optimizer.solve(&mut problem), ApplicationReturnStatus::SolveSucceeded);
        let x = problem.solution();
        assert!((x[0] - 0.25).abs() <= 1e-6, "{:?}", x);
        assert!(x[1].abs() < 1e-6, "{:?}", x);
    }

    #[test]
    fn test_badly_scaled_variables() {
        // A short actuator in meters next to a joint in radians
        fn objective(x: &[f64]) -> f64 {
            (200.0 * x[0] - 1.0).powi(2) + (x[1] - 2.0).powi(2)
        }
        let mut problem = TestProblem::bounded(vec![0.0, -3.0], vec![0.01, 3.0], vec![0.0, 0.0], objective);
        let mut optimizer = AugmentedLagrangian::new(OptimizerOptions { max_iter: 100, ..OptimizerOptions::default() });
        assert_eq!(optimizer.solve(&mut problem), ApplicationReturnStatus::SolveSucceeded);
        let x = problem.solution();
        assert!((x[0] - 0.005).abs() < 1e-6 && (x[1] - 2.0).abs() < 1e-5, "{:?}", x);
    }

    #[test]
    fn test_iteration_budget_status() {
        let start = vec![-1.2, 1.0];
        let mut problem = TestProblem::bounded(vec![-2.0; 2], vec![2.0; 2], start.clone(), rosenbrock);
        let mut optimizer = AugmentedLagrangian::new(OptimizerOptions { max_iter: 1, ..OptimizerOptions::default() });
        assert_eq!(optimizer.solve(&mut problem), ApplicationReturnStatus::MaximumIterationsExceeded);
        assert!(problem.solution().iter().all(|v| (-2.0..=2.0).contains(v)), "{:?}", problem.solution());

        // Same budget, but any point is acceptable
        let mut problem = TestProblem::bounded(vec![-2.0; 2], vec![2.0; 2], start, rosenbrock);
        optimizer.configure(OptimizerOptions {
            max_iter: 1,
            acceptable_iter: 1,
            acceptable_tol: 1e9,
            ..OptimizerOptions::default()
        });
        assert_eq!(optimizer.solve(&mut problem), ApplicationReturnStatus::SolvedToAcceptableLevel);
    }

    #[test]
    fn test_invalid_problem_definition() {
        let mut problem = TestProblem::bounded(vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5], shifted_quadratic);
        let status = AugmentedLagrangian::default().solve(&mut problem);
        assert_eq!(status, ApplicationReturnStatus::InvalidProblemDefinition);
        assert_eq!(problem.result.as_ref().map(|r| r.0), Some(status));
    }

    #[test]
    fn test_invalid_options() {
        let mut problem = TestProblem::bounded(vec![0.0; 2], vec![1.0; 2], vec![0.5, 0.5], shifted_quadratic);
        let mut optimizer = AugmentedLagrangian::new(OptimizerOptions { tol: 0.0, ..OptimizerOptions::default() });
        assert_eq!(optimizer.solve(&mut problem), ApplicationReturnStatus::InvalidOption);

        optimizer.configure(OptimizerOptions {
            hessian_approximation: HessianApproximation::Exact,
            ..OptimizerOptions::default()
        });
        assert_eq!(optimizer.solve(&mut problem), ApplicationReturnStatus::InvalidOption);
        assert_eq!(problem.solution(), &[0.5, 0.5]);
    }

    #[test]
    fn test_iteration_limit() {
        let mut problem = TestProblem::bounded(vec![-10.0; 2], vec![10.0; 2], vec![0.0, 0.0], shifted_quadratic);
        let mut optimizer = AugmentedLagrangian::new(OptimizerOptions { max_iter: 0, ..OptimizerOptions::default() });
        assert_eq!(optimizer.solve(&mut problem), ApplicationReturnStatus::MaximumIterationsExceeded);
        assert_eq!(problem.solution(), &[0.0, 0.0]);
    }

    #[test]
    fn test_invalid_number() {
        fn broken(_x: &[f64]) -> f64 {
            f64::NAN
        }
        let mut problem = TestProblem::bounded(vec![-1.0], vec![1.0], vec![0.0], broken);
        let status = AugmentedLagrangian::default().solve(&mut problem);
        assert_eq!(status, ApplicationReturnStatus::InvalidNumberDetected);
    }

    #[test]
    fn test_infeasible() {
        // x in [0, 1] can never reach x = 5
        let mut problem = TestProblem::bounded(vec![0.0], vec![1.0], vec![0.5], squared_norm);
        problem.constraint = Some((sum, sum_gradient, 5.0, 5.0));
        let status = AugmentedLagrangian::default().solve(&mut problem);
        assert!(!status.is_success(), "{}", status);
        assert!((problem.solution()[0] - 1.0).abs() < 1e-9, "{:?}", problem.solution());
    }
}
