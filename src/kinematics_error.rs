//! Errors reported by the arm solver for malformed input.
//!
//! Failing to converge is not an error: it is reported through the solution itself.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// The joint vector is shorter than the arm configuration.
    SizeMismatch { expected: usize, found: usize },
    /// The target is not a 4x4 matrix.
    InvalidShape { rows: usize, cols: usize },
    /// The target is 4x4 but not a rigid homogeneous transform.
    NotATransform(String),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            KinematicsError::SizeMismatch { expected, found } =>
                write!(f, "Mis-sized DOFs vector: expected at least {}, found {}", expected, found),
            KinematicsError::InvalidShape { rows, cols } =>
                write!(f, "Mis-sized desired end-effector frame: expected 4x4, found {}x{}", rows, cols),
            KinematicsError::NotATransform(ref reason) =>
                write!(f, "Desired end-effector frame is not a homogeneous transform: {}", reason),
        }
    }
}

impl std::error::Error for KinematicsError {}
