//! Rigid body state and the validating builder that creates it

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::collision::LayerMask;
use super::error::PhysicsError;
use super::inertia::{inertia_from_inverse, inverse_box_inertia};
use super::shape::Shape;
use crate::ecs::Velocity;

/// Surface response coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Bounciness in [0, 1] (0 = inelastic, 1 = elastic)
    pub restitution: f32,
    /// Coulomb coefficient used by the friction impulse
    pub static_friction: f32,
    /// Accepted and stored, never read by the contact resolver
    pub dynamic_friction: f32,
}

impl Material {
    /// Check every coefficient against its allowed range
    ///
    /// # Errors
    ///
    /// Returns the first coefficient that is out of range
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(PhysicsError::InvalidRestitution(self.restitution));
        }
        if !self.static_friction.is_finite() || self.static_friction < 0.0 {
            return Err(PhysicsError::InvalidFriction {
                kind: "static",
                value: self.static_friction,
            });
        }
        if !self.dynamic_friction.is_finite() || self.dynamic_friction < 0.0 {
            return Err(PhysicsError::InvalidFriction {
                kind: "dynamic",
                value: self.dynamic_friction,
            });
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.5,
            static_friction: 0.6,
            dynamic_friction: 0.4,
        }
    }
}

/// A simulated rigid body
///
/// Fields are private: mass, material, shape and inertia are fixed at
/// creation, and the kinematic state is only changed through the methods
/// below.
#[derive(Debug, Clone)]
pub struct RigidBody {
    position: Vec3,
    orientation: Quat,
    velocity: Velocity,
    mass: f32,
    inv_inertia: Mat3,
    shape: Shape,
    material: Material,
    fracture_threshold: f32,
    ground_layers: LayerMask,
    fractured: bool,
}

impl RigidBody {
    /// Centre of mass in world space
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// World orientation
    #[must_use]
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Linear and angular velocity
    #[must_use]
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Linear velocity
    #[must_use]
    pub fn linear_velocity(&self) -> Vec3 {
        self.velocity.linear
    }

    /// Angular velocity (radians per second, world axes)
    #[must_use]
    pub fn angular_velocity(&self) -> Vec3 {
        self.velocity.angular
    }

    /// Mass, always > 0
    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// 1 / mass
    #[must_use]
    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.mass
    }

    /// Body-local inverse inertia tensor, fixed at creation
    #[must_use]
    pub fn inverse_inertia(&self) -> Mat3 {
        self.inv_inertia
    }

    /// Inverse inertia rotated into world axes: R · I⁻¹ · Rᵀ
    #[must_use]
    pub fn world_inverse_inertia(&self) -> Mat3 {
        let rot = Mat3::from_quat(self.orientation);
        rot * self.inv_inertia * rot.transpose()
    }

    /// Inertia tensor rotated into world axes
    #[must_use]
    pub fn world_inertia(&self) -> Mat3 {
        let rot = Mat3::from_quat(self.orientation);
        rot * inertia_from_inverse(self.inv_inertia) * rot.transpose()
    }

    /// Collision geometry
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Surface coefficients
    #[must_use]
    pub fn material(&self) -> Material {
        self.material
    }

    /// Restitution coefficient
    #[must_use]
    pub fn restitution(&self) -> f32 {
        self.material.restitution
    }

    /// Speed above which the body fractures
    #[must_use]
    pub fn fracture_threshold(&self) -> f32 {
        self.fracture_threshold
    }

    /// Layers this body treats as ground
    #[must_use]
    pub fn ground_layers(&self) -> LayerMask {
        self.ground_layers
    }

    /// Whether the body has already broken apart
    #[must_use]
    pub fn is_fractured(&self) -> bool {
        self.fractured
    }

    /// Transform a local-space point into world space
    #[must_use]
    pub fn world_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }

    /// Velocity of a world-space point rigidly attached to the body
    #[must_use]
    pub fn velocity_at(&self, point: Vec3) -> Vec3 {
        self.velocity.linear + self.velocity.angular.cross(point - self.position)
    }

    /// Kinetic energy of the linear motion, ½·m·|v|²
    #[must_use]
    pub fn linear_kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.linear.length_squared()
    }

    /// Set the linear velocity
    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.velocity.linear = velocity;
    }

    /// Set the angular velocity
    pub fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.velocity.angular = velocity;
    }

    /// Teleport the body
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Set the orientation (normalised on write)
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
    }

    /// Move the body by a delta
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Apply an impulse at lever arm `r` from the centre of mass
    ///
    /// Δv = impulse / m, Δω = I⁻¹ (r × impulse)
    pub fn apply_impulse_at(&mut self, impulse: Vec3, r: Vec3) {
        self.velocity.linear += impulse * self.inverse_mass();
        self.velocity.angular += self.world_inverse_inertia() * r.cross(impulse);
    }

    /// Flip the fractured flag. Returns false if it was already set.
    pub(crate) fn mark_fractured(&mut self) -> bool {
        if self.fractured {
            return false;
        }
        self.fractured = true;
        true
    }
}

/// Builder for creating rigid bodies with validated parameters
#[derive(Debug, Clone)]
pub struct BodyBuilder {
    shape: Option<Shape>,
    position: Vec3,
    orientation: Quat,
    velocity: Velocity,
    mass: f32,
    material: Material,
    fracture_threshold: f32,
    ground_layers: LayerMask,
}

impl BodyBuilder {
    /// Default speed above which bodies fracture
    pub const DEFAULT_FRACTURE_THRESHOLD: f32 = 10.0;

    /// Create a builder with unit mass, default material and no shape
    pub fn new() -> Self {
        Self {
            shape: None,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Velocity::default(),
            mass: 1.0,
            material: Material::default(),
            fracture_threshold: Self::DEFAULT_FRACTURE_THRESHOLD,
            ground_layers: LayerMask::ALL,
        }
    }

    /// Set the collision shape
    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Set the collision shape, or clear it
    pub fn maybe_shape(mut self, shape: Option<Shape>) -> Self {
        self.shape = shape;
        self
    }

    /// Set the initial position
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the initial orientation
    pub fn orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the initial linear velocity
    pub fn linear_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity.linear = velocity;
        self
    }

    /// Set the initial angular velocity (radians per second)
    pub fn angular_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity.angular = velocity;
        self
    }

    /// Set the mass (must be > 0)
    pub fn mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Set all surface coefficients at once
    pub fn material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Set restitution (0.0 = no bounce, 1.0 = perfect bounce)
    pub fn restitution(mut self, restitution: f32) -> Self {
        self.material.restitution = restitution;
        self
    }

    /// Set the static friction coefficient
    pub fn static_friction(mut self, friction: f32) -> Self {
        self.material.static_friction = friction;
        self
    }

    /// Set the dynamic friction coefficient
    pub fn dynamic_friction(mut self, friction: f32) -> Self {
        self.material.dynamic_friction = friction;
        self
    }

    /// Set the fracture speed threshold (must be > 0)
    pub fn fracture_threshold(mut self, threshold: f32) -> Self {
        self.fracture_threshold = threshold;
        self
    }

    /// Restrict which ground layers the body collides with
    pub fn ground_layers(mut self, layers: LayerMask) -> Self {
        self.ground_layers = layers;
        self
    }

    /// Validate parameters and build the body
    ///
    /// The inverse inertia tensor is computed here and never again.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::MissingShape`] if no shape or an empty shape was
    /// given, or the matching error for an out-of-range parameter
    pub fn build(self) -> Result<RigidBody, PhysicsError> {
        let shape = match self.shape {
            Some(shape) if !shape.is_empty() => shape,
            _ => return Err(PhysicsError::MissingShape),
        };
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(self.mass));
        }
        self.material.validate()?;
        if !self.fracture_threshold.is_finite() || self.fracture_threshold <= 0.0 {
            return Err(PhysicsError::InvalidFractureThreshold(
                self.fracture_threshold,
            ));
        }

        let inv_inertia = inverse_box_inertia(shape.size(), self.mass);

        Ok(RigidBody {
            position: self.position,
            orientation: self.orientation.normalize(),
            velocity: self.velocity,
            mass: self.mass,
            inv_inertia,
            shape,
            material: self.material,
            fracture_threshold: self.fracture_threshold,
            ground_layers: self.ground_layers,
            fractured: false,
        })
    }
}

impl Default for BodyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
