//! Finite-difference strategies.
//!
//! The constraints of the arm problems have no analytic derivatives. Every constraint row
//! depends on the three actuator lengths of one tripod only, so the Jacobian is built block
//! by block: a multi-row function is evaluated around the point and differenced along each
//! column of the block.

use std::ops::Range;

/// Step used for all finite differences, in the internal units (meters, radians).
pub const DIFFERENCING_STEP: f64 = 1e-6;

/// Largest number of rows a block function may return.
pub const MAX_BLOCK_ROWS: usize = 2;

/// Finite-difference scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Differencing {
    /// `(g(x + e) - g(x)) / e`, one extra evaluation per column.
    #[default]
    Forward,
    /// `(g(x + e) - g(x - e)) / 2e`, two extra evaluations per column, second order accurate.
    Central,
}

impl Differencing {
    /// Scheme from the "enable central difference" flag.
    pub fn from_central_flag(central: bool) -> Self {
        if central { Differencing::Central } else { Differencing::Forward }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Differencing::Forward => "forward",
            Differencing::Central => "central",
        }
    }

    /// Parses the name as produced by [`Differencing::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "forward" => Some(Differencing::Forward),
            "central" => Some(Differencing::Central),
            _ => None,
        }
    }

    /// Derivative of the scalar function along the given variable.
    pub fn derivative<F>(&self, x: &[f64], variable: usize, f: F) -> f64
    where
        F: Fn(&[f64]) -> f64,
    {
        let base = match self {
            Differencing::Forward => f(x),
            Differencing::Central => 0.0,
        };
        let mut x_dx = x.to_vec();
        self.derivative_with(&mut x_dx, x, variable, base, &f)
    }

    /// Gradient of the scalar function. The base value is evaluated once for the forward scheme.
    pub fn gradient<F>(&self, x: &[f64], f: F, gradient: &mut [f64])
    where
        F: Fn(&[f64]) -> f64,
    {
        let base = match self {
            Differencing::Forward => f(x),
            Differencing::Central => 0.0,
        };
        let mut x_dx = x.to_vec();
        for (variable, g) in gradient.iter_mut().enumerate() {
            *g = self.derivative_with(&mut x_dx, x, variable, base, &f);
        }
    }

    fn derivative_with<F>(&self, x_dx: &mut [f64], x: &[f64], variable: usize, base: f64, f: &F) -> f64
    where
        F: Fn(&[f64]) -> f64,
    {
        let h = DIFFERENCING_STEP;
        x_dx[variable] = x[variable] + h;
        let forward = f(x_dx);
        let derivative = match self {
            Differencing::Forward => (forward - base) / h,
            Differencing::Central => {
                x_dx[variable] = x[variable] - h;
                let backward = f(x_dx);
                (forward - backward) / (2.0 * h)
            }
        };
        x_dx[variable] = x[variable];
        derivative
    }

    /// Derivatives of a function returning `rows` values (at most [`MAX_BLOCK_ROWS`]) with
    /// respect to the variables in `columns`. The result is written row-major into `values`,
    /// which must hold `rows * columns.len()` entries.
    pub fn jacobian_block<F>(&self, x: &[f64], columns: Range<usize>, rows: usize, eval: F, values: &mut [f64])
    where
        F: Fn(&[f64], &mut [f64]),
    {
        debug_assert!(rows <= MAX_BLOCK_ROWS);
        debug_assert_eq!(values.len(), rows * columns.len());

        let h = DIFFERENCING_STEP;
        let width = columns.len();
        let mut base = [0.0; MAX_BLOCK_ROWS];
        let mut forward = [0.0; MAX_BLOCK_ROWS];
        let mut backward = [0.0; MAX_BLOCK_ROWS];

        if *self == Differencing::Forward {
            eval(x, &mut base[..rows]);
        }

        let mut x_dx = x.to_vec();
        for (k, column) in columns.enumerate() {
            x_dx[column] = x[column] + h;
            eval(&x_dx, &mut forward[..rows]);
            match self {
                Differencing::Forward => {
                    for row in 0..rows {
                        values[row * width + k] = (forward[row] - base[row]) / h;
                    }
                }
                Differencing::Central => {
                    x_dx[column] = x[column] - h;
                    eval(&x_dx, &mut backward[..rows]);
                    for row in 0..rows {
                        values[row * width + k] = (forward[row] - backward[row]) / (2.0 * h);
                    }
                }
            }
            x_dx[column] = x[column];
        }
    }
}
