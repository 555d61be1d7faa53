//! Semi-implicit Euler integration

use glam::{Quat, Vec3};

use super::body::RigidBody;

/// Advance one body by `dt` seconds under constant gravity
///
/// Velocity is updated first and the new velocity moves the body
/// (semi-implicit Euler). Orientation is composed with the rotation of
/// `ω·dt`. There is no damping.
pub fn integrate(body: &mut RigidBody, gravity: Vec3, dt: f32) {
    let linear = body.linear_velocity() + gravity * dt;
    body.set_linear_velocity(linear);
    body.translate(linear * dt);

    let spin = rotation_increment(body.angular_velocity(), dt);
    body.set_orientation(spin * body.orientation());
}

/// Rotation of angle |ω|·dt about ω̂
#[must_use]
pub fn rotation_increment(angular_velocity: Vec3, dt: f32) -> Quat {
    let scaled = angular_velocity * dt;
    if scaled.length_squared() <= f32::EPSILON * f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_scaled_axis(scaled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyBuilder, Shape};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn body() -> RigidBody {
        BodyBuilder::new()
            .shape(Shape::point(Vec3::ONE))
            .position(Vec3::new(0.0, 10.0, 0.0))
            .linear_velocity(Vec3::new(1.0, 0.0, 0.0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_gravity_then_position() {
        let mut body = body();
        integrate(&mut body, Vec3::new(0.0, -10.0, 0.0), 0.5);

        assert_relative_eq!(body.linear_velocity().y, -5.0);
        // Position uses the updated velocity
        assert_relative_eq!(body.position().y, 7.5);
        assert_relative_eq!(body.position().x, 0.5);
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let mut body = body();
        let before = body.position();
        integrate(&mut body, Vec3::new(0.0, -9.81, 0.0), 0.0);

        assert_eq!(body.position(), before);
        assert_eq!(body.orientation(), Quat::IDENTITY);
    }

    #[test]
    fn test_angular_velocity_rotates() {
        let mut body = body();
        body.set_angular_velocity(Vec3::new(0.0, std::f32::consts::PI, 0.0));
        integrate(&mut body, Vec3::ZERO, 0.5);

        let expected = Quat::from_rotation_y(FRAC_PI_2);
        assert!(body.orientation().abs_diff_eq(expected, 1e-5));
        assert_relative_eq!(body.orientation().length(), 1.0, epsilon = 1e-6);
    }
}
