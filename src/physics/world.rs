//! Simulation world: the body registry and the per-tick pipeline
//!
//! One call to [`Simulation::step`] advances every live body exactly once:
//! integrate, detect ground contacts, solve the whole contact set, then check
//! for fracture. Fractures are applied after every body
//! has been stepped, so fragments are first integrated on the next tick.

use glam::{Quat, Vec3};
use hecs::Entity;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use smallvec::SmallVec;

use super::body::{BodyBuilder, RigidBody};
use super::collision::detect_ground_contacts;
use super::error::PhysicsError;
use super::fracture::{
    FractureCheck, FracturePlan, FragmentTemplate, FractureTrigger, check_fracture, plan_fracture,
};
use super::integrator::integrate;
use super::resolver::resolve_contacts;
use crate::core::{EventQueue, SimEvent, SimulationConfig, StepStats, TickCounters};
use crate::ecs::{Name, Transform, World};

/// Consumer of body poses (e.g. a renderer)
pub trait PoseSink {
    /// Receive the current pose of one body
    fn write_pose(&mut self, entity: Entity, position: Vec3, orientation: Quat);
}

impl<F: FnMut(Entity, Vec3, Quat)> PoseSink for F {
    fn write_pose(&mut self, entity: Entity, position: Vec3, orientation: Quat) {
        self(entity, position, orientation);
    }
}

/// A planned fracture waiting for the end of the tick
struct PendingFracture {
    parent: Entity,
    templates: Vec<Entity>,
    plan: FracturePlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyOutcome {
    Settled,
    Fracture,
}

/// Per-tick state shared by every body step
struct TickContext<'a> {
    config: &'a SimulationConfig,
    dt: f32,
    events: &'a mut EventQueue,
    counters: &'a mut TickCounters,
}

impl TickContext<'_> {
    fn advance(&mut self, entity: Entity, body: &mut RigidBody, fragment_count: usize) -> BodyOutcome {
        integrate(body, self.config.gravity, self.dt);
        self.counters.bodies_integrated += 1;

        let contacts = detect_ground_contacts(body, &self.config.ground);
        if contacts.is_empty() {
            return BodyOutcome::Settled;
        }

        let resolution = resolve_contacts(body, &contacts, &self.config.solver_settings());
        for (contact, result) in contacts.iter().zip(&resolution.contacts) {
            self.counters.contacts += 1;
            self.events.push(SimEvent::GroundContact {
                entity,
                point: contact.point,
                normal: contact.normal,
                correction: result.correction,
                impulse: result.normal_impulse,
            });
        }

        let speed = match self.config.fracture.trigger {
            FractureTrigger::Impact => resolution.speed_before.max(resolution.speed_after),
            FractureTrigger::PostResolution => resolution.speed_after,
        };
        match check_fracture(body, speed, fragment_count) {
            FractureCheck::Fracture => {
                log::debug!(
                    "{entity:?} breaks at {speed:.2} m/s (threshold {:.2})",
                    body.fracture_threshold()
                );
                BodyOutcome::Fracture
            }
            FractureCheck::NoFragments => {
                log::warn!(
                    "{entity:?} exceeded its fracture threshold at {speed:.2} m/s but has no fragments"
                );
                self.counters.skipped_fractures += 1;
                self.events.push(SimEvent::FractureSkipped { entity, speed });
                BodyOutcome::Settled
            }
            FractureCheck::Intact | FractureCheck::AlreadyFractured => BodyOutcome::Settled,
        }
    }
}

/// Simulation-owned collection of rigid bodies
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    rng: Box<dyn RngCore>,
    events: EventQueue,
    stats: StepStats,
}

impl Simulation {
    /// Create an empty simulation, seeding fracture randomness from the config
    pub fn new(config: SimulationConfig) -> Self {
        let rng: Box<dyn RngCore> = match config.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_os_rng()),
        };
        Self::with_rng(config, rng)
    }

    /// Create an empty simulation with a caller-supplied random source
    pub fn with_rng(config: SimulationConfig, rng: Box<dyn RngCore>) -> Self {
        Self {
            config,
            world: World::new(),
            rng,
            events: EventQueue::new(),
            stats: StepStats::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Get the entity world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get the entity world mutably (for attaching extra components)
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Events from the last step
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Events from the last step, mutably (for draining)
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Step statistics
    pub fn stats(&self) -> &StepStats {
        &self.stats
    }

    /// Build a body and register it
    ///
    /// # Errors
    ///
    /// Returns the builder's validation error; nothing is registered then
    pub fn spawn(&mut self, builder: BodyBuilder) -> Result<Entity, PhysicsError> {
        let body = builder.build()?;
        Ok(self.insert_body(body))
    }

    /// Build a named body and register it
    ///
    /// # Errors
    ///
    /// Returns the builder's validation error; nothing is registered then
    pub fn spawn_named(
        &mut self,
        name: impl Into<String>,
        builder: BodyBuilder,
    ) -> Result<Entity, PhysicsError> {
        let entity = self.spawn(builder)?;
        self.world
            .insert(entity, (Name::new(name),))
            .map_err(|_| PhysicsError::NoSuchBody(entity))?;
        Ok(entity)
    }

    /// Register an already built body
    pub fn insert_body(&mut self, body: RigidBody) -> Entity {
        let transform = Transform::from_position_rotation(body.position(), body.orientation());
        self.world.spawn((body, transform))
    }

    /// Attach a fragment template to a body, or to another template for
    /// multi-stage fracture
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::NoSuchBody`] if `owner` is neither a live body
    /// nor a template
    pub fn attach_fragment(
        &mut self,
        owner: Entity,
        template: FragmentTemplate,
    ) -> Result<Entity, PhysicsError> {
        if !self.world.has::<RigidBody>(owner) && !self.world.has::<FragmentTemplate>(owner) {
            return Err(PhysicsError::NoSuchBody(owner));
        }
        let entity = self.world.spawn((template,));
        if self.world.attach(owner, entity).is_err() {
            self.world.despawn(entity).ok();
            return Err(PhysicsError::NoSuchBody(owner));
        }
        Ok(entity)
    }

    /// Check if a handle refers to a live body
    pub fn contains(&self, entity: Entity) -> bool {
        self.world.has::<RigidBody>(entity)
    }

    /// Get a body
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::NoSuchBody`] for unknown or destroyed handles
    pub fn body(&self, entity: Entity) -> Result<hecs::Ref<'_, RigidBody>, PhysicsError> {
        self.world
            .get::<RigidBody>(entity)
            .map_err(|_| PhysicsError::NoSuchBody(entity))
    }

    /// Get a body mutably
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::NoSuchBody`] for unknown or destroyed handles
    pub fn body_mut(&mut self, entity: Entity) -> Result<hecs::RefMut<'_, RigidBody>, PhysicsError> {
        self.world
            .get_mut::<RigidBody>(entity)
            .map_err(|_| PhysicsError::NoSuchBody(entity))
    }

    /// Handles of every live body
    pub fn bodies(&self) -> Vec<Entity> {
        self.world
            .query::<&RigidBody>()
            .iter()
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.world.query::<&RigidBody>().iter().count()
    }

    /// Templates currently attached to a body (or template)
    pub fn fragment_templates(&self, entity: Entity) -> Vec<Entity> {
        self.world
            .fragments_of(entity)
            .into_iter()
            .filter(|&child| self.world.has::<FragmentTemplate>(child))
            .collect()
    }

    /// Number of templates attached to a body
    pub fn fragment_count(&self, entity: Entity) -> usize {
        self.fragment_templates(entity).len()
    }

    /// Destroy a body together with its unused templates
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::NoSuchBody`] for unknown or destroyed handles
    pub fn remove_body(&mut self, entity: Entity) -> Result<(), PhysicsError> {
        if !self.contains(entity) {
            return Err(PhysicsError::NoSuchBody(entity));
        }
        self.despawn_tree(entity);
        Ok(())
    }

    fn despawn_tree(&mut self, entity: Entity) {
        for child in self.world.fragments_of(entity) {
            self.despawn_tree(child);
        }
        self.world.despawn(entity).ok();
    }

    /// Advance every live body by `dt` seconds
    ///
    /// Negative or non-finite `dt` is treated as zero.
    pub fn step(&mut self, dt: f32) {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            log::warn!("ignoring invalid time step {dt}");
            0.0
        };

        let mut counters = TickCounters::default();
        let mut pending = Vec::new();

        for entity in self.bodies() {
            let fragment_count = self.fragment_count(entity);
            let outcome = {
                let Ok(mut body) = self.world.get_mut::<RigidBody>(entity) else {
                    continue;
                };
                let mut tick = TickContext {
                    config: &self.config,
                    dt,
                    events: &mut self.events,
                    counters: &mut counters,
                };
                tick.advance(entity, &mut body, fragment_count)
            };

            if outcome == BodyOutcome::Fracture {
                match self.plan_fracture_of(entity) {
                    Ok(fracture) => pending.push(fracture),
                    Err(err) => {
                        log::warn!("{entity:?} could not fracture: {err}");
                        self.events.push(SimEvent::FractureFailed {
                            entity,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }

        for fracture in pending {
            self.apply_fracture(fracture);
            counters.fractures += 1;
        }

        self.sync_transforms();
        let live = u32::try_from(self.body_count()).unwrap_or(u32::MAX);
        self.stats.record_tick(counters, live);
        self.events.publish();
    }

    /// Send every body's pose to a sink
    pub fn publish_poses<S: PoseSink + ?Sized>(&self, sink: &mut S) {
        for (entity, body) in self.world.query::<&RigidBody>().iter() {
            sink.write_pose(entity, body.position(), body.orientation());
        }
    }

    fn plan_fracture_of(&mut self, entity: Entity) -> Result<PendingFracture, PhysicsError> {
        let template_entities = self.fragment_templates(entity);
        let mut templates = Vec::with_capacity(template_entities.len());
        for &template in &template_entities {
            let template_ref = self
                .world
                .get::<FragmentTemplate>(template)
                .map_err(|_| PhysicsError::MissingFragmentTemplate(template))?;
            templates.push(FragmentTemplate::clone(&template_ref));
        }

        let plan = {
            let body = self
                .world
                .get::<RigidBody>(entity)
                .map_err(|_| PhysicsError::NoSuchBody(entity))?;
            plan_fracture(&body, &templates, &self.config.fracture, self.rng.as_mut())?
        };

        self.body_mut(entity)?.mark_fractured();
        Ok(PendingFracture {
            parent: entity,
            templates: template_entities,
            plan,
        })
    }

    /// Turn each template entity into its fragment body, then destroy the parent
    fn apply_fracture(&mut self, fracture: PendingFracture) {
        let PendingFracture {
            parent,
            templates,
            plan,
        } = fracture;
        let mut fragments = SmallVec::<[Entity; 8]>::new();

        for (template, body) in templates.into_iter().zip(plan.fragments) {
            self.world.detach(template);
            self.world.remove_one::<FragmentTemplate>(template).ok();
            let transform = Transform::from_position_rotation(body.position(), body.orientation());
            match self.world.insert(template, (body, transform)) {
                Ok(()) => fragments.push(template),
                Err(_) => log::error!("fragment {template:?} of {parent:?} vanished mid-tick"),
            }
        }

        self.world.despawn(parent).ok();
        log::info!(
            "{parent:?} fractured into {} fragments ({:.1} J)",
            fragments.len(),
            plan.energy
        );
        self.events.push(SimEvent::Fractured {
            parent,
            fragments,
            parent_velocity: plan.parent_velocity,
            energy: plan.energy,
            energy_per_fragment: plan.energy_per_fragment,
        });
    }

    fn sync_transforms(&mut self) {
        for (_, (body, transform)) in self.world.query_mut::<(&RigidBody, &mut Transform)>() {
            transform.position = body.position();
            transform.rotation = body.orientation();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{GroundPlane, LayerMask, Shape};
    use approx::assert_relative_eq;

    fn config() -> SimulationConfig {
        SimulationConfig::default().with_seed(1234)
    }

    fn fractured(sim: &Simulation) -> Option<(SmallVec<[Entity; 8]>, Vec3, f32)> {
        sim.events().iter().find_map(|event| match event {
            SimEvent::Fractured {
                fragments,
                parent_velocity,
                energy_per_fragment,
                ..
            } => Some((fragments.clone(), *parent_velocity, *energy_per_fragment)),
            _ => None,
        })
    }

    fn halves() -> [FragmentTemplate; 2] {
        let shape = Shape::cuboid(Vec3::new(0.25, 0.5, 0.5));
        [
            FragmentTemplate::new(shape.clone())
                .with_offset(Vec3::new(-0.25, 0.0, 0.0), Quat::IDENTITY),
            FragmentTemplate::new(shape).with_offset(Vec3::new(0.25, 0.0, 0.0), Quat::IDENTITY),
        ]
    }

    fn crate_body(velocity: Vec3) -> BodyBuilder {
        BodyBuilder::new()
            .shape(Shape::cuboid(Vec3::splat(0.5)))
            .mass(1.0)
            .position(Vec3::new(0.0, 0.5, 0.0))
            .linear_velocity(velocity)
            .restitution(0.8)
            .fracture_threshold(100.0)
    }

    #[test]
    fn test_impact_fractures_into_two_fragments() {
        let mut sim = Simulation::new(config());
        let parent = sim.spawn(crate_body(Vec3::new(0.0, -120.0, 0.0))).unwrap();
        for template in halves() {
            sim.attach_fragment(parent, template).unwrap();
        }

        sim.step(1.0 / 600.0);

        let (fragments, parent_velocity, energy_per_fragment) =
            fractured(&sim).expect("parent should fracture on impact");
        assert_eq!(fragments.len(), 2);
        assert_eq!(sim.body_count(), 2);
        assert!(!sim.contains(parent));
        assert_eq!(sim.body(parent).unwrap_err(), PhysicsError::NoSuchBody(parent));

        let half_speed = parent_velocity.length() / 2.0;
        let perturbation = (2.0 * energy_per_fragment / 1.0).sqrt();
        for &fragment in &fragments {
            assert_ne!(fragment, parent);
            let speed = sim.body(fragment).unwrap().linear_velocity().length();
            assert!(speed >= half_speed - perturbation - 1e-3);
            assert!(speed <= half_speed + perturbation + 1e-3);
        }
    }

    #[test]
    fn test_fragments_wait_a_tick_before_integrating() {
        let mut sim = Simulation::new(config());
        let parent = sim.spawn(crate_body(Vec3::new(0.0, -120.0, 0.0))).unwrap();
        for template in halves() {
            sim.attach_fragment(parent, template).unwrap();
        }

        sim.step(1.0 / 600.0);
        assert_eq!(sim.stats().last_tick().bodies_integrated, 1);
        assert_eq!(sim.stats().last_tick().fractures, 1);

        sim.step(1.0 / 600.0);
        assert_eq!(sim.stats().last_tick().bodies_integrated, 2);
    }

    #[test]
    fn test_fragments_take_template_overrides() {
        let mut sim = Simulation::new(config());
        let parent = sim.spawn(crate_body(Vec3::new(0.0, -120.0, 0.0))).unwrap();
        let [light, heavy] = halves();
        let light = sim.attach_fragment(parent, light.with_mass(0.25)).unwrap();
        let heavy = sim.attach_fragment(parent, heavy.with_mass(0.75)).unwrap();

        sim.step(1.0 / 600.0);

        assert_relative_eq!(sim.body(light).unwrap().mass(), 0.25);
        assert_relative_eq!(sim.body(heavy).unwrap().mass(), 0.75);
        assert!(!sim.world().has::<FragmentTemplate>(light));
        assert_eq!(
            sim.world().get::<Transform>(heavy).unwrap().position,
            sim.body(heavy).unwrap().position()
        );
    }

    #[test]
    fn test_post_resolution_trigger_respects_bounce_loss() {
        // e = 0.8 leaves 96 m/s after the impact, under the 100 m/s threshold
        let mut sim =
            Simulation::new(config().with_fracture_trigger(FractureTrigger::PostResolution));
        let parent = sim
            .spawn(
                crate_body(Vec3::new(0.0, -120.0, 0.0))
                    .shape(Shape::point(Vec3::ONE))
                    .position(Vec3::new(0.0, 0.0, 0.0)),
            )
            .unwrap();
        for template in halves() {
            sim.attach_fragment(parent, template).unwrap();
        }

        sim.step(1.0 / 600.0);

        assert!(sim.contains(parent));
        assert!(fractured(&sim).is_none());
        assert_relative_eq!(
            sim.body(parent).unwrap().linear_velocity().y,
            0.8 * (120.0 + 9.81 / 600.0),
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_fracture_happens_once() {
        let mut sim = Simulation::new(config());
        let parent = sim.spawn(crate_body(Vec3::new(0.0, -120.0, 0.0))).unwrap();
        for template in halves() {
            sim.attach_fragment(parent, template).unwrap();
        }

        for _ in 0..240 {
            sim.step(1.0 / 120.0);
        }

        assert_eq!(sim.stats().total_fractures(), 1);
        assert_eq!(sim.body_count(), 2);
        assert!(sim.body_mut(parent).is_err());
        assert_eq!(sim.fragment_count(parent), 0);
    }

    #[test]
    fn test_no_fragments_stays_intact() {
        let mut sim = Simulation::new(config());
        let body = sim.spawn(crate_body(Vec3::new(0.0, -120.0, 0.0))).unwrap();

        sim.step(1.0 / 600.0);

        assert!(sim.contains(body));
        assert_eq!(sim.body_count(), 1);
        assert_eq!(sim.world().len(), 1);
        assert!(!sim.body(body).unwrap().is_fractured());
        assert_eq!(sim.stats().last_tick().skipped_fractures, 1);
        assert!(
            sim.events()
                .iter()
                .any(|e| matches!(e, SimEvent::FractureSkipped { entity, .. } if *entity == body))
        );
    }

    #[test]
    fn test_failed_plan_changes_nothing() {
        let mut sim = Simulation::new(config());
        let parent = sim.spawn(crate_body(Vec3::new(0.0, -120.0, 0.0))).unwrap();
        let [good, mut bad] = halves();
        bad.mass = Some(-1.0);
        sim.attach_fragment(parent, good).unwrap();
        sim.attach_fragment(parent, bad).unwrap();

        sim.step(1.0 / 600.0);

        assert!(sim.contains(parent));
        assert!(!sim.body(parent).unwrap().is_fractured());
        assert_eq!(sim.fragment_count(parent), 2);
        assert_eq!(sim.body_count(), 1);
        assert!(
            sim.events()
                .iter()
                .any(|e| matches!(e, SimEvent::FractureFailed { .. }))
        );
    }

    #[test]
    fn test_elastic_bounce_returns_to_drop_height() {
        let mut sim = Simulation::new(config());
        let ball = sim
            .spawn(
                BodyBuilder::new()
                    .shape(Shape::point(Vec3::ONE))
                    .position(Vec3::new(0.0, 5.0, 0.0))
                    .restitution(1.0)
                    .static_friction(0.0)
                    .dynamic_friction(0.0)
                    .fracture_threshold(1e6),
            )
            .unwrap();

        let mut bounced = false;
        let mut apex = f32::MIN;
        for _ in 0..600 {
            sim.step(1.0 / 240.0);
            if sim.stats().last_tick().contacts > 0 {
                bounced = true;
            }
            if bounced {
                apex = apex.max(sim.body(ball).unwrap().position().y);
            }
        }

        assert!(bounced);
        assert!((apex - 5.0).abs() < 0.15, "apex after bounce was {apex}");
    }

    #[test]
    fn test_inelastic_landing_stops_normal_motion() {
        let mut sim = Simulation::new(config());
        let body = sim
            .spawn(
                BodyBuilder::new()
                    .shape(Shape::point(Vec3::ONE))
                    .position(Vec3::new(0.0, 0.05, 0.0))
                    .linear_velocity(Vec3::new(0.0, -5.0, 0.0))
                    .restitution(0.0),
            )
            .unwrap();

        sim.step(1.0 / 60.0);

        assert_eq!(sim.stats().last_tick().contacts, 1);
        assert!(sim.body(body).unwrap().linear_velocity().y.abs() < 1e-4);
        assert_relative_eq!(sim.body(body).unwrap().position().y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_elastic_cube_bounces_flat() {
        let mut sim = Simulation::new(config());
        let cube = sim
            .spawn(
                BodyBuilder::new()
                    .shape(Shape::cuboid(Vec3::splat(0.5)))
                    .position(Vec3::new(0.0, 5.0, 0.0))
                    .restitution(1.0)
                    .static_friction(0.0)
                    .dynamic_friction(0.0)
                    .fracture_threshold(1e6),
            )
            .unwrap();

        let mut bounced = false;
        let mut apex = f32::MIN;
        for _ in 0..600 {
            sim.step(1.0 / 240.0);
            if sim.stats().last_tick().contacts > 0 {
                bounced = true;
            }
            if bounced {
                apex = apex.max(sim.body(cube).unwrap().position().y);
            }
        }

        let body = sim.body(cube).unwrap();
        assert!(bounced);
        assert!((apex - 5.0).abs() < 0.15, "apex after bounce was {apex}");
        assert!(body.angular_velocity().length() < 1e-2);
        assert!(body.orientation().angle_between(Quat::IDENTITY) < 1e-2);
    }

    #[test]
    fn test_inelastic_cube_lands_at_rest() {
        let mut sim = Simulation::new(config());
        let cube = sim
            .spawn(
                BodyBuilder::new()
                    .shape(Shape::cuboid(Vec3::splat(0.5)))
                    .position(Vec3::new(0.0, 0.55, 0.0))
                    .linear_velocity(Vec3::new(0.0, -5.0, 0.0))
                    .restitution(0.0),
            )
            .unwrap();

        sim.step(1.0 / 60.0);

        let body = sim.body(cube).unwrap();
        let v = body.linear_velocity();
        assert_eq!(sim.stats().last_tick().contacts, 4);
        assert!(v.y.abs() < 1e-3, "normal velocity {v}");
        assert!(Vec3::new(v.x, 0.0, v.z).length() < 1e-3, "drift {v}");
        assert!(body.angular_velocity().length() < 1e-3);
        assert_relative_eq!(body.position().y, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_nested_templates_fracture_in_stages() {
        let mut sim = Simulation::new(config());
        let parent = sim
            .spawn(
                crate_body(Vec3::new(0.0, -15.0, 0.0))
                    .fracture_threshold(10.0)
                    .restitution(0.0),
            )
            .unwrap();
        let shard = sim
            .attach_fragment(
                parent,
                FragmentTemplate::new(Shape::cuboid(Vec3::splat(0.25)))
                    .with_fracture_threshold(1.0),
            )
            .unwrap();
        let splinter = sim
            .attach_fragment(shard, FragmentTemplate::new(Shape::cuboid(Vec3::splat(0.1))))
            .unwrap();

        sim.step(1.0 / 120.0);
        assert!(sim.contains(shard));
        assert!(!sim.contains(splinter));
        assert_eq!(sim.fragment_count(shard), 1);

        for _ in 0..2400 {
            sim.step(1.0 / 120.0);
        }
        assert_eq!(sim.stats().total_fractures(), 2);
        assert!(!sim.contains(shard));
        assert!(sim.contains(splinter));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let mut sim = Simulation::new(config().with_seed(99));
            let parent = sim.spawn(crate_body(Vec3::new(0.0, -120.0, 0.0))).unwrap();
            for template in halves() {
                sim.attach_fragment(parent, template).unwrap();
            }
            sim.step(1.0 / 600.0);
            let (fragments, _, _) = fractured(&sim).unwrap();
            fragments
                .iter()
                .map(|&f| sim.body(f).unwrap().linear_velocity())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_layer_mismatch_falls_through() {
        let mut sim = Simulation::new(config().with_ground(GroundPlane::new(0.0).with_layer(0)));
        let body = sim
            .spawn(
                BodyBuilder::new()
                    .shape(Shape::cuboid(Vec3::splat(0.5)))
                    .position(Vec3::new(0.0, 0.6, 0.0))
                    .ground_layers(LayerMask::layer(1)),
            )
            .unwrap();

        for _ in 0..60 {
            sim.step(1.0 / 60.0);
        }

        assert_eq!(sim.stats().total_contacts(), 0);
        assert!(sim.body(body).unwrap().position().y < 0.0);
    }

    #[test]
    fn test_poses_reach_sink_and_transforms() {
        let mut sim = Simulation::new(config());
        let body = sim
            .spawn_named(
                "ball",
                BodyBuilder::new()
                    .shape(Shape::point(Vec3::ONE))
                    .position(Vec3::new(0.0, 10.0, 0.0)),
            )
            .unwrap();

        sim.step(0.5);

        let mut poses = Vec::new();
        sim.publish_poses(&mut |entity: Entity, position: Vec3, _orientation: Quat| {
            poses.push((entity, position));
        });
        assert_eq!(poses.len(), 1);
        assert_eq!(poses[0].0, body);

        let transform = *sim.world().get::<Transform>(body).unwrap();
        assert_eq!(transform.position, poses[0].1);
        assert_eq!(sim.world().get::<Name>(body).unwrap().0, "ball");
    }

    #[test]
    fn test_spawn_named_rejects_invalid_body() {
        let mut sim = Simulation::new(config());
        let err = sim
            .spawn_named("nothing", BodyBuilder::new().mass(1.0))
            .unwrap_err();

        assert_eq!(err, PhysicsError::MissingShape);
        assert!(sim.world().is_empty());
    }

    #[test]
    fn test_invalid_dt_does_not_move_bodies() {
        let mut sim = Simulation::new(config());
        let body = sim
            .spawn(
                BodyBuilder::new()
                    .shape(Shape::point(Vec3::ONE))
                    .position(Vec3::new(0.0, 3.0, 0.0)),
            )
            .unwrap();

        sim.step(-1.0);
        sim.step(f32::NAN);

        assert_eq!(sim.body(body).unwrap().position(), Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_attach_to_missing_body() {
        let mut sim = Simulation::new(config());
        let body = sim
            .spawn(BodyBuilder::new().shape(Shape::point(Vec3::ONE)))
            .unwrap();
        sim.remove_body(body).unwrap();

        let template = FragmentTemplate::new(Shape::point(Vec3::ONE));
        assert_eq!(
            sim.attach_fragment(body, template).unwrap_err(),
            PhysicsError::NoSuchBody(body)
        );
        assert!(sim.world().is_empty());
    }
}
