//! Serial chain described by Denavit-Hartenberg parameters.
//!
//! Each link contributes `Rz(q + offset) * Tz(d) * Tx(a) * Rx(alpha)`. The chain
//! may be placed with a fixed head transform and may carry a fixed tail transform.

extern crate nalgebra as na;

use na::Matrix4;
use crate::kinematic_traits::{SerialChain, Transform};

/// Single revolute link with its joint limits (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DhLink {
    pub a: f64,
    pub d: f64,
    pub alpha: f64,
    pub offset: f64,
    pub min: f64,
    pub max: f64,
}

impl DhLink {
    pub fn new(a: f64, d: f64, alpha: f64, offset: f64, min: f64, max: f64) -> Self {
        DhLink { a, d, alpha, offset, min, max }
    }

    /// Transform of this link for the given joint value (radians).
    pub fn transform(&self, q: f64) -> Transform {
        let (st, ct) = (q + self.offset).sin_cos();
        let (sa, ca) = self.alpha.sin_cos();

        #[rustfmt::skip]
        let transform = Matrix4::new(
            ct, -st * ca,  st * sa, self.a * ct,
            st,  ct * ca, -ct * sa, self.a * st,
            0.0,      sa,       ca, self.d,
            0.0,     0.0,      0.0, 1.0,
        );
        transform
    }
}

/// Which side the arm is mounted on. Mirrors the shoulder placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmSide {
    Left,
    Right,
}

/// Serial chain of DH links with fixed head (`h0`) and tail (`hn`) transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct DhChain {
    pub links: Vec<DhLink>,
    pub h0: Transform,
    pub hn: Transform,
}

impl DhChain {
    pub fn new(links: Vec<DhLink>) -> Self {
        DhChain { links, h0: Transform::identity(), hn: Transform::identity() }
    }

    pub fn with_head_and_tail(links: Vec<DhLink>, h0: Transform, hn: Transform) -> Self {
        DhChain { links, h0, hn }
    }

    /// Joint values at the middle of each joint range.
    pub fn mid_range(&self) -> Vec<f64> {
        self.links.iter().map(|link| 0.5 * (link.min + link.max)).collect()
    }
}

impl SerialChain for DhChain {
    fn dof(&self) -> usize {
        self.links.len()
    }

    fn joint_min(&self, joint: usize) -> f64 {
        self.links[joint].min
    }

    fn joint_max(&self, joint: usize) -> f64 {
        self.links[joint].max
    }

    fn transform(&self, joints: &[f64]) -> Transform {
        let mut h = self.h0;
        for (link, q) in self.links.iter().zip(joints) {
            h *= link.transform(*q);
        }
        h * self.hn
    }

    fn link_transform(&self, joints: &[f64], link: usize) -> Transform {
        let mut h = self.h0;
        for (dh, q) in self.links.iter().zip(joints).take(link + 1) {
            h *= dh.transform(*q);
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPSILON: f64 = 1e-12;

    /// Planar two link arm, unit links, both joints about z.
    fn planar() -> DhChain {
        DhChain::new(vec![
            DhLink::new(1.0, 0.0, 0.0, 0.0, -FRAC_PI_2, FRAC_PI_2),
            DhLink::new(1.0, 0.0, 0.0, 0.0, -FRAC_PI_2, FRAC_PI_2),
        ])
    }

    #[test]
    fn test_planar_forward() {
        let chain = planar();
        let h = chain.transform(&[0.0, 0.0]);
        assert!((h[(0, 3)] - 2.0).abs() < EPSILON);
        assert!(h[(1, 3)].abs() < EPSILON);

        let h = chain.transform(&[FRAC_PI_2, 0.0]);
        assert!(h[(0, 3)].abs() < EPSILON);
        assert!((h[(1, 3)] - 2.0).abs() < EPSILON);

        let h = chain.transform(&[0.0, FRAC_PI_2]);
        assert!((h[(0, 3)] - 1.0).abs() < EPSILON);
        assert!((h[(1, 3)] - 1.0).abs() < EPSILON);
        // End effector turned by 90 degrees
        assert!((h[(1, 0)] - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_link_transform() {
        let chain = planar();
        let h = chain.link_transform(&[FRAC_PI_2, FRAC_PI_2], 0);
        assert!(h[(0, 3)].abs() < EPSILON);
        assert!((h[(1, 3)] - 1.0).abs() < EPSILON);
        let full = chain.link_transform(&[FRAC_PI_2, FRAC_PI_2], 1);
        assert!((full - chain.transform(&[FRAC_PI_2, FRAC_PI_2])).norm() < EPSILON);
    }

    #[test]
    fn test_head_and_tail() {
        let h0 = Matrix4::new_translation(&na::Vector3::new(0.0, 0.0, 0.5));
        let hn = Matrix4::new_translation(&na::Vector3::new(0.25, 0.0, 0.0));
        let chain = DhChain::with_head_and_tail(planar().links, h0, hn);
        let h = chain.transform(&[0.0, 0.0]);
        assert!((h[(0, 3)] - 2.25).abs() < EPSILON);
        assert!((h[(2, 3)] - 0.5).abs() < EPSILON);
        // Tail is not part of the link frames
        let last = chain.link_transform(&[0.0, 0.0], 1);
        assert!((last[(0, 3)] - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_limits_and_mid_range() {
        let chain = planar();
        assert_eq!(chain.dof(), 2);
        assert_eq!(chain.joint_min(1), -FRAC_PI_2);
        assert_eq!(chain.joint_max(0), FRAC_PI_2);
        assert_eq!(chain.mid_range(), vec![0.0, 0.0]);
    }
}
