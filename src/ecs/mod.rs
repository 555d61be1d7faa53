//! Entity Component System module
//!
//! Built on top of the hecs ECS library. Bodies, their fragment templates and
//! rendered poses all live in one [`World`].

mod components;
mod hierarchy;
mod world;

pub use components::{Name, Transform, Velocity};
pub use hierarchy::{FragmentOf, Fragments};
pub use world::World;
