//! Physics simulation module
//!
//! Rigid bodies against a single ground plane, with pre-authored fracture

mod body;
mod collision;
mod error;
mod fracture;
mod inertia;
mod integrator;
mod resolver;
mod shape;
mod world;

pub use body::{BodyBuilder, Material, RigidBody};
pub use collision::{Contact, Contacts, GroundPlane, LayerMask, detect_ground_contacts};
pub use error::PhysicsError;
pub use fracture::{
    FractureCheck, FracturePlan, FractureSettings, FractureTrigger, FragmentTemplate,
    RotationalEnergy, check_fracture, kinetic_energy, plan_fracture, random_in_unit_sphere,
};
pub use inertia::{box_inertia, inverse_box_inertia};
pub use integrator::{integrate, rotation_increment};
pub use resolver::{
    BodyResolution, ContactResolution, ContactResponse, DEFAULT_FRICTION_EPSILON,
    DEFAULT_SOLVER_ITERATIONS, SolverSettings, resolve_contacts,
};
pub use shape::Shape;
pub use world::{PoseSink, Simulation};
