//! Rigid-body simulation with ground contact and pre-authored fracture
//!
//! This crate provides:
//! - Semi-implicit Euler integration of rigid bodies
//! - Vertex-versus-ground-plane contacts resolved with impulses and friction
//! - Fracture of fast-moving bodies into fragment templates
//! - A hecs-backed body registry, an event queue and RON/JSON scenes

pub mod core;
pub mod ecs;
pub mod physics;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::{Scene, SimEvent, SimulationConfig, StepStats, Time};
    pub use crate::ecs::{Name, Transform, Velocity, World};
    pub use crate::physics::{
        BodyBuilder, FragmentTemplate, GroundPlane, LayerMask, PhysicsError, PoseSink, RigidBody,
        Shape, Simulation,
    };
    pub use glam::{Quat, Vec3};
    pub use hecs::Entity;
}
