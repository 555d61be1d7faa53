//! Simulation configuration

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::physics::{
    ContactResponse, DEFAULT_FRICTION_EPSILON, DEFAULT_SOLVER_ITERATIONS, FractureSettings,
    FractureTrigger, GroundPlane, RotationalEnergy, SolverSettings,
};

/// Process-wide simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Constant acceleration applied to every body
    pub gravity: Vec3,
    /// The one static surface bodies collide with
    pub ground: GroundPlane,
    /// Velocity response model for contacts
    pub contact_response: ContactResponse,
    /// Fracture tuning
    pub fracture: FractureSettings,
    /// Tangential speed below which friction is skipped
    pub friction_epsilon: f32,
    /// Maximum solver passes over one body's contacts per tick
    pub solver_iterations: u32,
    /// Seed for fracture randomness (None = seeded from the OS)
    pub seed: Option<u64>,
    /// Tick length used by fixed-step drivers
    pub fixed_timestep: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            ground: GroundPlane::default(),
            contact_response: ContactResponse::default(),
            fracture: FractureSettings::default(),
            friction_epsilon: DEFAULT_FRICTION_EPSILON,
            solver_iterations: DEFAULT_SOLVER_ITERATIONS,
            seed: None,
            fixed_timestep: 1.0 / 60.0,
        }
    }
}

impl SimulationConfig {
    /// Set gravity
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the ground plane
    pub fn with_ground(mut self, ground: GroundPlane) -> Self {
        self.ground = ground;
        self
    }

    /// Set the contact response model
    pub fn with_contact_response(mut self, response: ContactResponse) -> Self {
        self.contact_response = response;
        self
    }

    /// Set the maximum solver passes per body and tick (at least one runs)
    pub fn with_solver_iterations(mut self, iterations: u32) -> Self {
        self.solver_iterations = iterations;
        self
    }

    /// Contact solver settings derived from this config
    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            response: self.contact_response,
            friction_epsilon: self.friction_epsilon,
            iterations: self.solver_iterations,
        }
    }

    /// Set which speed trips fracture thresholds
    pub fn with_fracture_trigger(mut self, trigger: FractureTrigger) -> Self {
        self.fracture.trigger = trigger;
        self
    }

    /// Set the rotational energy model used when splitting energy
    pub fn with_rotational_energy(mut self, model: RotationalEnergy) -> Self {
        self.fracture.rotational_energy = model;
        self
    }

    /// Set the random spin scale given to fragments
    pub fn with_energy_transfer(mut self, coefficient: f32) -> Self {
        self.fracture.energy_transfer_coefficient = coefficient;
        self
    }

    /// Seed fracture randomness for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the fixed tick length
    pub fn with_fixed_timestep(mut self, dt: f32) -> Self {
        self.fixed_timestep = dt;
        self
    }
}
