//! Error types for body creation and simulation

use hecs::Entity;
use thiserror::Error;

/// Errors that can occur while creating or operating on rigid bodies.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// No shape (or an empty vertex list) was supplied at creation.
    #[error("rigid body has no shape")]
    MissingShape,

    /// Mass must be finite and strictly positive.
    #[error("invalid mass {0}: must be finite and > 0")]
    InvalidMass(f32),

    /// Restitution must lie in [0, 1].
    #[error("invalid restitution {0}: must be within [0, 1]")]
    InvalidRestitution(f32),

    /// Friction coefficients must be finite and non-negative.
    #[error("invalid {kind} friction {value}: must be finite and >= 0")]
    InvalidFriction {
        /// Which coefficient was rejected ("static" or "dynamic").
        kind: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// Fracture threshold must be finite and strictly positive.
    #[error("invalid fracture threshold {0}: must be finite and > 0")]
    InvalidFractureThreshold(f32),

    /// The handle does not refer to a live body (never existed or destroyed).
    #[error("no such body: {0:?}")]
    NoSuchBody(Entity),

    /// A fragment template listed under a body could not be found.
    #[error("fragment template {0:?} is missing")]
    MissingFragmentTemplate(Entity),
}
