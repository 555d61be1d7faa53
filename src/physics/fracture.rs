//! Fracture: replacing one body with its pre-authored fragments
//!
//! The parent's kinetic energy at the instant of fracture is split evenly
//! between the fragments and fed back as random velocity perturbations.
//! Planning is pure (no world access), so a failed plan leaves nothing
//! half-applied.

use glam::{Quat, Vec3};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::body::{BodyBuilder, RigidBody};
use super::error::PhysicsError;
use super::shape::Shape;

/// A pre-authored piece a body breaks into
///
/// Unset overrides are inherited from the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentTemplate {
    /// Collision geometry of the piece
    pub shape: Shape,
    /// Offset from the parent's centre of mass, in parent space
    #[serde(default)]
    pub local_position: Vec3,
    /// Rotation relative to the parent
    #[serde(default)]
    pub local_rotation: Quat,
    /// Mass override
    #[serde(default)]
    pub mass: Option<f32>,
    /// Restitution override
    #[serde(default)]
    pub restitution: Option<f32>,
    /// Static friction override
    #[serde(default)]
    pub static_friction: Option<f32>,
    /// Dynamic friction override
    #[serde(default)]
    pub dynamic_friction: Option<f32>,
    /// Fracture threshold override
    #[serde(default)]
    pub fracture_threshold: Option<f32>,
}

impl FragmentTemplate {
    /// Template with the given shape, centred on the parent, inheriting everything
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            mass: None,
            restitution: None,
            static_friction: None,
            dynamic_friction: None,
            fracture_threshold: None,
        }
    }

    /// Place the fragment relative to the parent
    #[must_use]
    pub fn with_offset(mut self, local_position: Vec3, local_rotation: Quat) -> Self {
        self.local_position = local_position;
        self.local_rotation = local_rotation;
        self
    }

    /// Give the fragment its own mass
    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Give the fragment its own restitution
    #[must_use]
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = Some(restitution);
        self
    }

    /// Give the fragment its own fracture threshold
    #[must_use]
    pub fn with_fracture_threshold(mut self, threshold: f32) -> Self {
        self.fracture_threshold = Some(threshold);
        self
    }
}

/// Which speed is compared against the fracture threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FractureTrigger {
    /// The larger of the speed entering and leaving the contact
    #[default]
    Impact,
    /// Linear speed after the contact response only
    PostResolution,
}

/// How the rotational part of the parent's kinetic energy is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationalEnergy {
    /// ½ ωᵀ I ω with the body's world inertia tensor
    #[default]
    Tensor,
    /// ½ m |ω|², ignoring the mass distribution
    MassProxy,
}

/// Fracture tuning shared by every body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractureSettings {
    /// Which speed trips the threshold
    pub trigger: FractureTrigger,
    /// Rotational energy measure
    pub rotational_energy: RotationalEnergy,
    /// Scale of the random spin added to each fragment (rad/s)
    pub energy_transfer_coefficient: f32,
}

impl Default for FractureSettings {
    fn default() -> Self {
        Self {
            trigger: FractureTrigger::Impact,
            rotational_energy: RotationalEnergy::Tensor,
            energy_transfer_coefficient: 2.0,
        }
    }
}

/// Outcome of a threshold check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractureCheck {
    /// Below threshold
    Intact,
    /// The body already broke; it is never checked again
    AlreadyFractured,
    /// Above threshold but there is nothing to break into
    NoFragments,
    /// Break now
    Fracture,
}

/// Decide whether a body breaks after a contact
#[must_use]
pub fn check_fracture(body: &RigidBody, trigger_speed: f32, fragment_count: usize) -> FractureCheck {
    if body.is_fractured() {
        FractureCheck::AlreadyFractured
    } else if trigger_speed <= body.fracture_threshold() {
        FractureCheck::Intact
    } else if fragment_count == 0 {
        FractureCheck::NoFragments
    } else {
        FractureCheck::Fracture
    }
}

/// Total kinetic energy of a body under the given rotational model
#[must_use]
pub fn kinetic_energy(body: &RigidBody, model: RotationalEnergy) -> f32 {
    let omega = body.angular_velocity();
    let rotational = match model {
        RotationalEnergy::Tensor => 0.5 * omega.dot(body.world_inertia() * omega),
        RotationalEnergy::MassProxy => 0.5 * body.mass() * omega.length_squared(),
    };
    body.linear_kinetic_energy() + rotational
}

/// Uniform random point inside the unit ball (rejection sampled)
pub fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            rng.random_range(-1.0f32..=1.0),
            rng.random_range(-1.0f32..=1.0),
            rng.random_range(-1.0f32..=1.0),
        );
        if p.length_squared() <= 1.0 {
            return p;
        }
    }
}

/// Fully computed fracture, ready to be applied
#[derive(Debug, Clone)]
pub struct FracturePlan {
    /// Parent linear velocity at the fracture instant
    pub parent_velocity: Vec3,
    /// Parent angular velocity at the fracture instant
    pub parent_angular_velocity: Vec3,
    /// Total kinetic energy E
    pub energy: f32,
    /// E / N
    pub energy_per_fragment: f32,
    /// One body per template, in template order
    pub fragments: Vec<RigidBody>,
}

/// Build the fragment bodies for `parent`
///
/// Each fragment gets `v/N + u·sqrt(2·E_f/m_f)` and `ω + u'·k`, with `u`, `u'`
/// drawn from the unit ball.
///
/// # Errors
///
/// Fails without side effects if any template produces an invalid body
pub fn plan_fracture(
    parent: &RigidBody,
    templates: &[FragmentTemplate],
    settings: &FractureSettings,
    rng: &mut dyn RngCore,
) -> Result<FracturePlan, PhysicsError> {
    let count = templates.len();
    let energy = kinetic_energy(parent, settings.rotational_energy);
    let energy_per_fragment = if count > 0 { energy / count as f32 } else { 0.0 };
    let share = parent.linear_velocity() / count.max(1) as f32;
    let parent_material = parent.material();

    let mut fragments = Vec::with_capacity(count);
    for template in templates {
        let mass = template.mass.unwrap_or(parent.mass());
        let burst = if mass > 0.0 {
            (2.0 * energy_per_fragment / mass).max(0.0).sqrt()
        } else {
            0.0
        };
        let linear = share + random_in_unit_sphere(rng) * burst;
        let angular = parent.angular_velocity()
            + random_in_unit_sphere(rng) * settings.energy_transfer_coefficient;

        let body = BodyBuilder::new()
            .shape(template.shape.clone())
            .position(parent.world_point(template.local_position))
            .orientation(parent.orientation() * template.local_rotation)
            .linear_velocity(linear)
            .angular_velocity(angular)
            .mass(mass)
            .restitution(template.restitution.unwrap_or(parent_material.restitution))
            .static_friction(
                template
                    .static_friction
                    .unwrap_or(parent_material.static_friction),
            )
            .dynamic_friction(
                template
                    .dynamic_friction
                    .unwrap_or(parent_material.dynamic_friction),
            )
            .fracture_threshold(
                template
                    .fracture_threshold
                    .unwrap_or(parent.fracture_threshold()),
            )
            .ground_layers(parent.ground_layers())
            .build()?;
        fragments.push(body);
    }

    Ok(FracturePlan {
        parent_velocity: parent.linear_velocity(),
        parent_angular_velocity: parent.angular_velocity(),
        energy,
        energy_per_fragment,
        fragments,
    })
}
