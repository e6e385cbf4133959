//! Rust implementation of forward and inverse kinematics for hybrid robotic limbs made of a
//! tripod parallel platform (torso), a serial chain (upper arm) and a second tripod
//! (lower arm, wrist).
//!
//! A tripod is a platform raised by three linear actuators attached at 120° around a circle.
//! Its pose follows from the three actuator lengths in closed form, including the flat
//! configuration where all lengths are equal. The whole arm is the product
//!
//! ```text
//! T0 * torso(l1, l2, l3) * chain(q1 .. qN) * lower_arm(l4, l5, l6) * TN
//! ```
//!
//! # Features
//!
//! - Closed-form forward kinematics of both tripods, with tilt and height reporting.
//! - Forward kinematics of the whole arm and of intermediate frames (torso platform, each
//!   chain link, lower arm platform).
//! - Inverse kinematics as a constrained nonlinear program: full pose or position only,
//!   with optional fixed platform heights (heave), tilt limits of both platforms as
//!   constraints, and optional postural terms keeping the solution close to the initial
//!   guess.
//! - Built-in augmented Lagrangian optimizer on top of the `optimization_engine` crate
//!   (OpEn). Any other optimizer can be plugged in by implementing
//!   [`optimizer::Optimizer`].
//! - Forward or central finite differences of the tripod constraints.
//! - Reading arm and solver parameters from YAML files.
//!
//! # Units
//!
//! Lengths are in meters. Chain joints are in degrees in the public interface and in radians
//! internally. Orientations are reported as rotation vectors (unit axis times angle in radians).
//!
//! # Example
//!
//! ```
//! use tripod_arm_kinematics::kinematic_traits::ArmFrame;
//! use tripod_arm_kinematics::parameters::{ArmParameters, SolverParameters};
//! use tripod_arm_kinematics::solver::ArmSolver;
//!
//! let mut solver = ArmSolver::new(ArmParameters::default(), SolverParameters::default(), 0);
//! let mut q = solver.initial_guess().to_vec();
//! q[0] = 0.02; // raise one torso leg
//! let target = solver.fkin(&q, ArmFrame::EndEffector).unwrap();
//! let solution = solver.ikin(&target).unwrap();
//! println!("{} -> {:?}", solution.status, solution.q);
//! ```

pub mod kinematic_traits;
pub mod tripod;
pub mod chain;

pub mod parameters;
pub mod parameters_robots;

#[cfg(feature = "allow_filesystem")]
pub mod parameters_from_file;

#[cfg(feature = "allow_filesystem")]
pub mod parameter_error;

pub mod kinematics_error;

#[path = "utils/utils.rs"]
pub mod utils;

pub mod arm_model;
pub mod differencing;
pub mod arm_nlp;

pub mod optimizer;
pub mod augmented_lagrangian;

pub mod solver;

#[cfg(test)]
#[cfg(feature = "allow_filesystem")]
mod tests;
