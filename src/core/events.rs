//! Simulation event queue
//!
//! Contacts, fractures and rejected scene entries are recorded while a step
//! runs and published when it ends. Published events stay readable until the
//! next step ends.
//!
//! # Example
//!
//! ```ignore
//! sim.step(dt);
//! for event in sim.events().iter() {
//!     if let SimEvent::Fractured { parent, fragments, .. } = event {
//!         spawn_debris_sound(*parent, fragments.len());
//!     }
//! }
//! ```

use glam::Vec3;
use hecs::Entity;
use smallvec::SmallVec;

// ============================================================================
// Event Types
// ============================================================================

/// Simulation events for consumers outside the physics core
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SimEvent {
    /// A body vertex was resolved against the ground.
    GroundContact {
        /// The body
        entity: Entity,
        /// Contact point on the ground
        point: Vec3,
        /// Ground normal
        normal: Vec3,
        /// Depth the body was pushed out by
        correction: f32,
        /// Normal impulse magnitude
        impulse: f32,
    },

    /// A body broke into fragments and was destroyed.
    Fractured {
        /// The destroyed body (its handle is now invalid)
        parent: Entity,
        /// The new bodies, in template order
        fragments: SmallVec<[Entity; 8]>,
        /// Parent velocity at the fracture instant
        parent_velocity: Vec3,
        /// Kinetic energy split between the fragments
        energy: f32,
        /// Energy given to each fragment
        energy_per_fragment: f32,
    },

    /// A body exceeded its threshold but had no fragments to break into.
    FractureSkipped {
        /// The body, still intact
        entity: Entity,
        /// Speed that tripped the threshold
        speed: f32,
    },

    /// A fracture could not be planned; nothing changed.
    FractureFailed {
        /// The body, still intact
        entity: Entity,
        /// Why the plan was rejected
        reason: String,
    },

    /// A scene entry was not turned into a body.
    BodyRejected {
        /// Scene name of the entry, if any
        name: Option<String>,
        /// Why it was rejected
        reason: String,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Events of the step in progress and of the last finished step.
///
/// Readers only ever see [`published`](Self::iter) events, so everything they
/// observe belongs to one complete step.
#[derive(Debug, Default)]
pub struct EventQueue {
    /// Written during the current step
    current: Vec<SimEvent>,
    /// The last finished step
    published: Vec<SimEvent>,
}

impl EventQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue with room for `capacity` events per step
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            current: Vec::with_capacity(capacity),
            published: Vec::with_capacity(capacity),
        }
    }

    /// Record an event for the step in progress
    #[inline]
    pub fn push(&mut self, event: SimEvent) {
        self.current.push(event);
    }

    /// Finish a step: its events replace the previously published ones
    pub fn publish(&mut self) {
        std::mem::swap(&mut self.current, &mut self.published);
        self.current.clear();
    }

    /// Events of the last finished step, in the order they happened
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.published.iter()
    }

    /// Take the events of the last finished step
    pub fn drain(&mut self) -> impl Iterator<Item = SimEvent> + '_ {
        self.published.drain(..)
    }

    /// Check if the last finished step produced no (undrained) events
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }

    /// Number of published events
    #[must_use]
    pub fn len(&self) -> usize {
        self.published.len()
    }

    /// Number of events recorded for the step in progress
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.current.len()
    }

    /// Forget everything, published or not
    pub fn clear(&mut self) {
        self.current.clear();
        self.published.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn skipped(speed: f32) -> SimEvent {
        let mut world = hecs::World::new();
        SimEvent::FractureSkipped {
            entity: world.spawn(()),
            speed,
        }
    }

    fn speeds(queue: &EventQueue) -> Vec<f32> {
        queue
            .iter()
            .filter_map(|event| match event {
                SimEvent::FractureSkipped { speed, .. } => Some(*speed),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_events_hidden_until_published() {
        let mut queue = EventQueue::new();

        queue.push(skipped(1.0));
        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 1);

        queue.publish();
        assert_eq!(speeds(&queue), vec![1.0]);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_publish_replaces_previous_step() {
        let mut queue = EventQueue::with_capacity(4);

        queue.push(skipped(1.0));
        queue.push(skipped(2.0));
        queue.publish();
        queue.push(skipped(3.0));
        assert_eq!(speeds(&queue), vec![1.0, 2.0]);

        queue.publish();
        assert_eq!(speeds(&queue), vec![3.0]);

        queue.publish();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_and_clear() {
        let mut queue = EventQueue::new();

        queue.push(SimEvent::BodyRejected {
            name: Some("crate".to_string()),
            reason: "rigid body has no shape".to_string(),
        });
        queue.push(skipped(3.0));
        queue.publish();
        queue.push(skipped(4.0));

        assert_eq!(queue.drain().count(), 2);
        assert!(queue.is_empty());

        queue.clear();
        assert_eq!(queue.pending_count(), 0);
    }
}
