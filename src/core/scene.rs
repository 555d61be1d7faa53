//! Scene serialization and deserialization
//!
//! A scene lists bodies and the fragments each one breaks into. Scenes are
//! stored as RON (Rusty Object Notation) or JSON and spawned into a
//! [`Simulation`] with [`Scene::spawn_into`].

use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};
use hecs::Entity;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::SimulationConfig;
use super::events::SimEvent;
use crate::ecs::{Name, Velocity};
use crate::physics::{
    BodyBuilder, FragmentTemplate, LayerMask, Material, PhysicsError, Shape, Simulation,
};

/// Collision geometry as written in a scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeDesc {
    /// Box with the given half extents
    Cuboid {
        /// Half size along each axis
        half_extents: Vec3,
    },
    /// Explicit vertex list
    Mesh {
        /// Local-space vertices
        vertices: Vec<Vec3>,
        /// Inertia box size; the vertex bounds when omitted
        #[serde(default)]
        size: Option<Vec3>,
    },
}

impl ShapeDesc {
    /// Build the shape
    pub fn to_shape(&self) -> Shape {
        match self {
            Self::Cuboid { half_extents } => Shape::cuboid(*half_extents),
            Self::Mesh {
                vertices,
                size: Some(size),
            } => Shape::new(vertices.clone(), *size),
            Self::Mesh {
                vertices,
                size: None,
            } => Shape::from_vertices(vertices.clone()),
        }
    }
}

/// A body entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneBody {
    /// Optional body name
    pub name: Option<String>,
    /// Collision geometry (required to spawn)
    pub shape: Option<ShapeDesc>,
    /// Mass in kg
    pub mass: f32,
    /// Bounciness in [0, 1]
    pub restitution: f32,
    /// Friction coefficient used by contacts
    pub static_friction: f32,
    /// Stored friction coefficient
    pub dynamic_friction: f32,
    /// Speed above which the body breaks
    pub fracture_threshold: f32,
    /// World position
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
    /// Initial velocity
    pub velocity: Velocity,
    /// Ground layers the body collides with
    pub layers: LayerMask,
    /// Pieces the body breaks into
    pub fragments: Vec<SceneFragment>,
}

impl Default for SceneBody {
    fn default() -> Self {
        let material = Material::default();
        Self {
            name: None,
            shape: None,
            mass: 1.0,
            restitution: material.restitution,
            static_friction: material.static_friction,
            dynamic_friction: material.dynamic_friction,
            fracture_threshold: BodyBuilder::DEFAULT_FRACTURE_THRESHOLD,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Velocity::default(),
            layers: LayerMask::ALL,
            fragments: Vec::new(),
        }
    }
}

impl SceneBody {
    /// Builder carrying this entry's properties
    pub fn to_builder(&self) -> BodyBuilder {
        BodyBuilder::new()
            .maybe_shape(self.shape.as_ref().map(ShapeDesc::to_shape))
            .mass(self.mass)
            .restitution(self.restitution)
            .static_friction(self.static_friction)
            .dynamic_friction(self.dynamic_friction)
            .fracture_threshold(self.fracture_threshold)
            .position(self.position)
            .orientation(self.orientation)
            .linear_velocity(self.velocity.linear)
            .angular_velocity(self.velocity.angular)
            .ground_layers(self.layers)
    }
}

/// A fragment entry; unset overrides come from the body it breaks off
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneFragment {
    /// Optional fragment name
    pub name: Option<String>,
    /// Collision geometry (required to attach)
    pub shape: Option<ShapeDesc>,
    /// Offset in parent space
    pub offset: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Mass override
    pub mass: Option<f32>,
    /// Restitution override
    pub restitution: Option<f32>,
    /// Static friction override
    pub static_friction: Option<f32>,
    /// Dynamic friction override
    pub dynamic_friction: Option<f32>,
    /// Fracture threshold override
    pub fracture_threshold: Option<f32>,
    /// Pieces this fragment breaks into once it is a body
    pub fragments: Vec<SceneFragment>,
}

impl SceneFragment {
    /// Template for this entry
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::MissingShape`] if the entry has no shape
    pub fn to_template(&self) -> Result<FragmentTemplate, PhysicsError> {
        let shape = self.shape.as_ref().ok_or(PhysicsError::MissingShape)?;
        let mut template =
            FragmentTemplate::new(shape.to_shape()).with_offset(self.offset, self.rotation);
        template.mass = self.mass;
        template.restitution = self.restitution;
        template.static_friction = self.static_friction;
        template.dynamic_friction = self.dynamic_friction;
        template.fracture_threshold = self.fracture_threshold;
        Ok(template)
    }
}

/// A serializable scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name
    pub name: String,
    /// Scene version for compatibility
    pub version: u32,
    /// Simulation settings; defaults are used when omitted
    #[serde(default)]
    pub config: Option<SimulationConfig>,
    /// All bodies in the scene
    #[serde(default)]
    pub bodies: Vec<SceneBody>,
}

/// What [`Scene::spawn_into`] created
#[derive(Debug, Default)]
pub struct SpawnReport {
    /// Spawned bodies, in scene order
    pub spawned: Vec<Entity>,
    /// Named bodies and fragment templates
    pub by_name: FxHashMap<String, Entity>,
    /// Entries that were skipped and why
    pub rejected: Vec<(Option<String>, PhysicsError)>,
}

impl Scene {
    /// Create a new empty scene
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            config: None,
            bodies: Vec::new(),
        }
    }

    /// Add a body to the scene
    pub fn add_body(&mut self, body: SceneBody) -> usize {
        let index = self.bodies.len();
        self.bodies.push(body);
        index
    }

    /// Parse a scene from RON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scene
    pub fn from_ron_str(content: &str) -> Result<Self, SceneError> {
        ron::from_str(content).map_err(|e| SceneError::Deserialize(e.to_string()))
    }

    /// Parse a scene from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scene
    pub fn from_json_str(content: &str) -> Result<Self, SceneError> {
        serde_json::from_str(content).map_err(|e| SceneError::Deserialize(e.to_string()))
    }

    /// Save the scene to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::Serialize(e.to_string()))?;
        fs::write(path, ron_string)?;
        Ok(())
    }

    /// Load a scene from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Save the scene to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let json_string =
            serde_json::to_string_pretty(self).map_err(|e| SceneError::Serialize(e.to_string()))?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load a scene from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load a scene, picking the format from the file extension (RON unless `.json`)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::load_json(path),
            _ => Self::load_ron(path),
        }
    }

    /// Get the number of bodies
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Check if the scene is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Create a simulation from the scene's settings and spawn the scene into it
    #[must_use]
    pub fn instantiate(&self) -> (Simulation, SpawnReport) {
        let mut sim = Simulation::new(self.config.clone().unwrap_or_default());
        let report = self.spawn_into(&mut sim);
        (sim, report)
    }

    /// Spawn every valid body and attach its fragment templates
    ///
    /// Invalid entries are skipped, logged and reported as
    /// [`SimEvent::BodyRejected`] after the next step.
    pub fn spawn_into(&self, sim: &mut Simulation) -> SpawnReport {
        let mut report = SpawnReport::default();

        for entry in &self.bodies {
            match sim.spawn(entry.to_builder()) {
                Ok(entity) => {
                    name_entity(sim, entity, entry.name.as_deref(), &mut report);
                    report.spawned.push(entity);
                    attach_fragments(sim, entity, &entry.fragments, &mut report);
                }
                Err(err) => reject(sim, entry.name.clone(), err, &mut report),
            }
        }

        log::info!(
            "Scene '{}': spawned {} bodies, rejected {} entries",
            self.name,
            report.spawned.len(),
            report.rejected.len()
        );
        report
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

fn name_entity(
    sim: &mut Simulation,
    entity: Entity,
    name: Option<&str>,
    report: &mut SpawnReport,
) {
    if let Some(name) = name {
        sim.world_mut().insert(entity, (Name::new(name),)).ok();
        report.by_name.insert(name.to_string(), entity);
    }
}

fn attach_fragments(
    sim: &mut Simulation,
    owner: Entity,
    fragments: &[SceneFragment],
    report: &mut SpawnReport,
) {
    for fragment in fragments {
        let attached = fragment
            .to_template()
            .and_then(|template| sim.attach_fragment(owner, template));
        match attached {
            Ok(entity) => {
                name_entity(sim, entity, fragment.name.as_deref(), report);
                attach_fragments(sim, entity, &fragment.fragments, report);
            }
            Err(err) => reject(sim, fragment.name.clone(), err, report),
        }
    }
}

fn reject(sim: &mut Simulation, name: Option<String>, err: PhysicsError, report: &mut SpawnReport) {
    log::warn!(
        "Skipping scene entry '{}': {err}",
        name.as_deref().unwrap_or("<unnamed>")
    );
    sim.events_mut().push(SimEvent::BodyRejected {
        name: name.clone(),
        reason: err.to_string(),
    });
    report.rejected.push((name, err));
}

/// Errors that can occur during scene operations
#[derive(Error, Debug)]
pub enum SceneError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
