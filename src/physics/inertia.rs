//! Inertia tensor initialisation
//!
//! Bodies approximate their mass distribution as a uniform solid box sized by
//! the shape's bounding box. The tensor is computed once, at creation.

use glam::{Mat3, Vec3};

/// Principal moments below this are treated as zero (no rotational response).
const MIN_MOMENT: f32 = 1e-9;

/// Principal moments of a uniform solid box with dimensions (w, h, d)
#[must_use]
pub fn box_inertia(size: Vec3, mass: f32) -> Vec3 {
    let sq = size * size;
    Vec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) * (mass / 12.0)
}

/// Inverse of [`box_inertia`] as a diagonal matrix
///
/// Axes with a vanishing moment (a flat or point-like box) get a zero inverse
/// instead of infinity.
#[must_use]
pub fn inverse_box_inertia(size: Vec3, mass: f32) -> Mat3 {
    Mat3::from_diagonal(invert_moments(box_inertia(size, mass)))
}

/// Recover the inertia tensor from a diagonal inverse, honouring zero inverses
#[must_use]
pub(crate) fn inertia_from_inverse(inverse: Mat3) -> Mat3 {
    let diag = Vec3::new(inverse.x_axis.x, inverse.y_axis.y, inverse.z_axis.z);
    Mat3::from_diagonal(invert_moments(diag))
}

fn invert_moments(moments: Vec3) -> Vec3 {
    let inv = |m: f32| if m > MIN_MOMENT { 1.0 / m } else { 0.0 };
    Vec3::new(inv(moments.x), inv(moments.y), inv(moments.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_box_inertia_diagonal() {
        let (w, h, d) = (2.0_f32, 3.0_f32, 4.0_f32);
        let m = 5.0_f32;
        let inv = inverse_box_inertia(Vec3::new(w, h, d), m);

        assert_relative_eq!(inv.x_axis.x, 12.0 / (m * (h * h + d * d)), epsilon = 1e-6);
        assert_relative_eq!(inv.y_axis.y, 12.0 / (m * (w * w + d * d)), epsilon = 1e-6);
        assert_relative_eq!(inv.z_axis.z, 12.0 / (m * (w * w + h * h)), epsilon = 1e-6);

        // Off-diagonal terms stay zero
        assert_eq!(inv.x_axis.y, 0.0);
        assert_eq!(inv.y_axis.z, 0.0);
        assert_eq!(inv.z_axis.x, 0.0);
    }

    #[test]
    fn test_degenerate_box_has_no_infinite_terms() {
        // A rod along X has no moment about X
        let inv = inverse_box_inertia(Vec3::new(1.0, 0.0, 0.0), 1.0);

        assert_eq!(inv.x_axis.x, 0.0);
        assert!(inv.y_axis.y.is_finite());
        assert!(inv.z_axis.z.is_finite());
    }

    #[test]
    fn test_inertia_from_inverse() {
        let size = Vec3::new(1.0, 2.0, 3.0);
        let inertia = inertia_from_inverse(inverse_box_inertia(size, 2.0));
        let expected = box_inertia(size, 2.0);

        assert_relative_eq!(inertia.x_axis.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(inertia.y_axis.y, expected.y, epsilon = 1e-5);
        assert_relative_eq!(inertia.z_axis.z, expected.z, epsilon = 1e-5);
    }
}
