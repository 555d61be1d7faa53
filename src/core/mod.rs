//! Core simulation module
//!
//! Configuration, the fixed-step time source, events, scenes and statistics

mod config;
mod debug;
mod events;
mod scene;
mod time;

pub use config::SimulationConfig;
pub use debug::{StepStats, TickCounters};
pub use events::{EventQueue, SimEvent};
pub use scene::{Scene, SceneBody, SceneError, SceneFragment, ShapeDesc, SpawnReport};
pub use time::Time;
