//! Closed-form forward kinematics of a tripod platform.
//!
//! A tripod is a parallel mechanism with three linear actuators placed at 120 degrees
//! on a circle of radius `r`. The three actuator lengths determine the platform
//! height (heave) and a two degrees of freedom tilt. The platform is never rotated
//! about its own axis, so the orientation is fully described by the platform normal.
//!
//! When all three lengths are equal the platform is flat. This is a singular
//! configuration for the tilt axis (it is undefined), which is handled by a separate
//! closed form: identity orientation, height equal to the common length.

extern crate nalgebra as na;

use na::{Matrix4, Vector3};
use crate::kinematic_traits::{Transform, TRIPOD_LEGS};

/// Static geometry of one tripod platform. Use [`TripodParameters::new`] so that the
/// derived geometry (attachment points, normal, tilt cosine) stays consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct TripodParameters {
    /// Radius of the circle where the legs are attached, meters.
    pub radius: f64,

    /// Minimal actuator length, meters.
    pub l_min: f64,

    /// Maximal actuator length, meters.
    pub l_max: f64,

    /// Maximal allowed tilt of the platform, degrees.
    pub alpha_max: f64,

    /// Leg attachment points on the base plane.
    pub attachments: [Vector3<f64>; TRIPOD_LEGS],

    /// Reference normal of the platform (its principal axis).
    pub normal: Vector3<f64>,

    /// Cosine of `alpha_max`, the lower bound of the normal z component.
    pub cos_alpha_max: f64,
}

impl TripodParameters {
    pub fn new(radius: f64, l_min: f64, l_max: f64, alpha_max: f64) -> Self {
        let half_sqrt3 = 0.5 * 3.0_f64.sqrt();
        TripodParameters {
            radius,
            l_min,
            l_max,
            alpha_max,
            attachments: [
                Vector3::new(radius, 0.0, 0.0),
                Vector3::new(-0.5 * radius, half_sqrt3 * radius, 0.0),
                Vector3::new(-0.5 * radius, -half_sqrt3 * radius, 0.0),
            ],
            normal: Vector3::z(),
            cos_alpha_max: alpha_max.to_radians().cos(),
        }
    }

    /// Clamps the actuator length into `[l_min, l_max]`.
    pub fn clamp_length(&self, length: f64) -> f64 {
        length.max(self.l_min).min(self.l_max)
    }

    /// Cosine of the platform tilt for the given actuator lengths. Equals 1 when the
    /// platform is flat.
    pub fn tilt_cosine(&self, lengths: &[f64; TRIPOD_LEGS]) -> f64 {
        let [l1, l2, l3] = *lengths;
        let r = self.radius;
        27.0_f64.sqrt() * r
            / (12.0 * (l3 * l3 - (l1 + l2) * l3 + l2 * l2 - l1 * l2 + l1 * l1
                + (27.0 / 12.0) * r * r))
                .sqrt()
    }

    /// Forward kinematics of the platform for the given actuator lengths.
    pub fn fkin(&self, lengths: &[f64; TRIPOD_LEGS]) -> TripodState {
        let q33 = self.tilt_cosine(lengths);

        if q33 >= 1.0 {
            return self.flat(lengths[0]);
        }

        let [v1, v2, v3] = [0, 1, 2].map(|i| self.attachments[i] + lengths[i] * self.normal);
        let n = (v2 - v1).cross(&(v3 - v1)).normalize();

        // Equals sqrt(1 - q33^2) but keeps the tilt axis unit length close to the flat pose
        let sin_theta = n[0].hypot(n[1]);
        if sin_theta == 0.0 {
            return self.flat(lengths[0]);
        }
        let axis = Vector3::new(-n[1] / sin_theta, n[0] / sin_theta, 0.0);

        let tmp = 1.0 - q33;
        let q11 = tmp * axis[0] * axis[0] + q33;
        let q22 = tmp * axis[1] * axis[1] + q33;
        let q21 = tmp * axis[0] * axis[1];
        let q31 = -sin_theta * axis[1];
        let q32 = sin_theta * axis[0];

        let m1 = self.radius / q33 * (-0.5 * q11 + 1.5 * q22);
        let p = Vector3::new(
            self.radius - m1 * q11,
            -m1 * q21,
            lengths[0] - m1 * q31,
        );

        #[rustfmt::skip]
        let t = Matrix4::new(
            q11, q21, -q31, p[0],
            q21, q22, -q32, p[1],
            q31, q32,  q33, p[2],
            0.0, 0.0,  0.0, 1.0,
        );

        TripodState {
            n,
            u: axis * sin_theta.atan2(q33),
            p,
            t,
        }
    }

    /// Flat platform at the given height, tilt axis undefined.
    fn flat(&self, height: f64) -> TripodState {
        TripodState {
            n: self.normal,
            u: Vector3::zeros(),
            p: Vector3::new(0.0, 0.0, height),
            t: Matrix4::new_translation(&Vector3::new(0.0, 0.0, height)),
        }
    }
}

/// Computed state of a tripod platform. Recomputed on every evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct TripodState {
    /// Unit normal of the platform.
    pub n: Vector3<f64>,

    /// Orientation of the platform as a rotation vector (axis times angle, radians).
    pub u: Vector3<f64>,

    /// Position of the platform center, meters.
    pub p: Vector3<f64>,

    /// Homogeneous transform of the platform.
    pub t: Transform,
}

impl TripodState {
    /// Platform tilt, radians.
    pub fn tilt(&self) -> f64 {
        self.n[2].clamp(-1.0, 1.0).acos()
    }
}

/// Selects one of the two tripods of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tripod {
    /// Torso platform, first in the chain.
    Proximal,
    /// Lower arm platform, after the serial chain.
    Distal,
}

impl Tripod {
    pub const BOTH: [Tripod; 2] = [Tripod::Proximal, Tripod::Distal];

    /// Index of the first actuator length of this tripod in the configuration vector.
    pub fn offset(self, chain_dof: usize) -> usize {
        match self {
            Tripod::Proximal => 0,
            Tripod::Distal => TRIPOD_LEGS + chain_dof,
        }
    }
}
