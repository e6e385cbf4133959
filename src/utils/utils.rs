//! Helper functions

use nalgebra::{Matrix3, Rotation3, RowVector4, UnitQuaternion, Vector3};
use crate::kinematic_traits::Transform;

/// Tolerance on the last row of a homogeneous transform.
pub const TRANSFORM_TOLERANCE: f64 = 1e-6;

/// Tolerance on the orthonormality of the rotation block. Loose enough for rotations
/// written out with a few decimals; [`orthonormalize`] removes the remaining defect.
pub const ORTHONORMALITY_TOLERANCE: f64 = 1e-3;

/// Translation column of the transform.
pub fn translation(transform: &Transform) -> Vector3<f64> {
    transform.fixed_view::<3, 1>(0, 3).into_owned()
}

/// Rotation block of the transform.
pub fn rotation_matrix(transform: &Transform) -> Matrix3<f64> {
    transform.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Rotation of the transform as a unit quaternion. The rotation block is assumed
/// orthonormal.
pub fn rotation(transform: &Transform) -> UnitQuaternion<f64> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation_matrix(transform)))
}

/// Rotation vector (unit axis scaled by the angle in radians) of the quaternion.
///
/// Computed from the quaternion with `atan2`, so it stays accurate for angles close
/// to zero where `acos` of the matrix trace would not.
pub fn rotation_vector(rotation: &UnitQuaternion<f64>) -> Vector3<f64> {
    let q = rotation.quaternion();
    let (w, v) = if q.w < 0.0 { (-q.w, -q.imag()) } else { (q.w, q.imag()) };
    let sin_half = v.norm();
    if sin_half == 0.0 {
        return Vector3::zeros();
    }
    let angle = 2.0 * sin_half.atan2(w);
    v * (angle / sin_half)
}

/// Orientation residual between the desired and the achieved rotation, as the rotation
/// vector of `desired * achieved^-1`.
pub fn rotation_error(desired: &UnitQuaternion<f64>, achieved: &UnitQuaternion<f64>) -> Vector3<f64> {
    rotation_vector(&(desired * achieved.inverse()))
}

/// Checks that the matrix is a rigid homogeneous transform: finite, last row `[0 0 0 1]`
/// and orthonormal rotation block with positive determinant.
pub fn homogeneous_transform_defect(transform: &Transform) -> Option<String> {
    if transform.iter().any(|v| !v.is_finite()) {
        return Some("contains non-finite values".to_string());
    }
    let last_row = transform.fixed_view::<1, 4>(3, 0);
    if (last_row - RowVector4::new(0.0, 0.0, 0.0, 1.0)).amax() > TRANSFORM_TOLERANCE {
        return Some(format!("last row is {} rather than [0 0 0 1]", last_row));
    }
    let r = rotation_matrix(transform);
    let orthogonality = (r * r.transpose() - Matrix3::identity()).amax();
    if orthogonality > ORTHONORMALITY_TOLERANCE {
        return Some(format!("rotation block is not orthonormal (defect {:e})", orthogonality));
    }
    if r.determinant() < 0.0 {
        return Some("rotation block is a reflection".to_string());
    }
    None
}

/// The transform with its rotation block replaced by the closest rotation and its last
/// row set to `[0 0 0 1]`.
pub fn orthonormalize(transform: &Transform) -> Transform {
    let closest = Rotation3::from_matrix(&rotation_matrix(transform));
    let mut result = *transform;
    result.fixed_view_mut::<3, 3>(0, 0).copy_from(closest.matrix());
    result.fixed_view_mut::<1, 4>(3, 0).copy_from(&RowVector4::new(0.0, 0.0, 0.0, 1.0));
    result
}

/// Formats the configuration vector, tripod lengths in meters and chain joints in degrees.
pub fn format_configuration(q: &[f64]) -> String {
    q.iter().map(|v| format!("{:.3}", v)).collect::<Vec<_>>().join(" ")
}

/// Print position and rotation vector of the transform.
pub fn dump_transform(transform: &Transform) {
    let t = translation(transform);
    let u = rotation_vector(&rotation(transform));
    println!(
        "x: {:.5}, y: {:.5}, z: {:.5},  u: {:.5},{:.5},{:.5}",
        t.x, t.y, t.z, u.x, u.y, u.z
    );
}

/// Panics if the transforms differ more than allowed in position (meters)
/// or orientation (radians).
pub fn assert_transform_eq(ta: &Transform, tb: &Transform,
                           distance_tolerance: f64, angular_tolerance: f64) -> bool {
    fn bad(ta: &Transform, tb: &Transform) {
        dump_transform(ta);
        dump_transform(tb);
    }

    let translation_distance = (translation(ta) - translation(tb)).norm();
    let angular_distance = rotation(ta).angle_to(&rotation(tb));

    if translation_distance > distance_tolerance {
        bad(ta, tb);
        panic!("Transforms have too different translations: {}", translation_distance);
    }

    if angular_distance > angular_tolerance {
        bad(ta, tb);
        panic!("Transforms have too different angles: {}", angular_distance);
    }
    true
}
