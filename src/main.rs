//! Headless fracture demo
//!
//! Usage: `shatter [scene.ron | scene.json]`. Without a path a built-in scene
//! of crates dropped onto the ground is simulated.

use std::error::Error;

use shatter::core::{SceneBody, SceneFragment, ShapeDesc};
use shatter::prelude::*;

/// Simulated seconds to run
const RUN_SECONDS: f32 = 4.0;
/// Wall time fed to the fixed-step clock per frame
const FRAME_SECONDS: f32 = 1.0 / 30.0;

fn cuboid(half_extents: Vec3) -> Option<ShapeDesc> {
    Some(ShapeDesc::Cuboid { half_extents })
}

/// One quarter of a unit crate, optionally splitting again into two slabs
fn quarter(name: &str, offset: Vec3, splits: bool) -> SceneFragment {
    let fragments = if splits {
        [-0.125, 0.125]
            .into_iter()
            .map(|x| SceneFragment {
                shape: cuboid(Vec3::new(0.125, 0.25, 0.5)),
                offset: Vec3::new(x, 0.0, 0.0),
                rotation: Quat::IDENTITY,
                ..Default::default()
            })
            .collect()
    } else {
        Vec::new()
    };

    SceneFragment {
        name: Some(name.to_string()),
        shape: cuboid(Vec3::new(0.25, 0.25, 0.5)),
        offset,
        rotation: Quat::IDENTITY,
        mass: Some(0.25),
        fracture_threshold: Some(6.0),
        fragments,
        ..Default::default()
    }
}

fn demo_scene() -> Scene {
    let mut scene = Scene::new("Demo");
    scene.config = Some(
        SimulationConfig::default()
            .with_fixed_timestep(1.0 / 120.0)
            .with_energy_transfer(1.5)
            .with_seed(7),
    );

    scene.add_body(SceneBody {
        name: Some("crate".to_string()),
        shape: cuboid(Vec3::splat(0.5)),
        position: Vec3::new(0.0, 3.0, 0.0),
        orientation: Quat::from_rotation_z(0.2),
        velocity: Velocity::new(Vec3::new(0.0, -8.0, 0.0), Vec3::ZERO),
        restitution: 0.3,
        fracture_threshold: 9.0,
        fragments: vec![
            quarter("top-left", Vec3::new(-0.25, 0.25, 0.0), true),
            quarter("top-right", Vec3::new(0.25, 0.25, 0.0), false),
            quarter("bottom-left", Vec3::new(-0.25, -0.25, 0.0), false),
            quarter("bottom-right", Vec3::new(0.25, -0.25, 0.0), true),
        ],
        ..Default::default()
    });
    scene.add_body(SceneBody {
        name: Some("ball".to_string()),
        shape: Some(ShapeDesc::Mesh {
            vertices: vec![Vec3::ZERO],
            size: Some(Vec3::splat(0.4)),
        }),
        position: Vec3::new(2.0, 1.0, 0.0),
        restitution: 0.9,
        fracture_threshold: 50.0,
        ..Default::default()
    });

    scene
}

fn report_events(sim: &mut Simulation) {
    for event in sim.events_mut().drain() {
        match event {
            SimEvent::Fractured {
                parent, fragments, ..
            } => log::info!("{parent:?} shattered into {fragments:?}"),
            SimEvent::FractureSkipped { entity, speed } => {
                log::debug!("{entity:?} hit at {speed:.2} m/s with nothing left to break into");
            }
            SimEvent::FractureFailed { entity, reason } => {
                log::warn!("{entity:?} failed to fracture: {reason}");
            }
            SimEvent::BodyRejected { name, reason } => {
                log::warn!("Rejected {}: {reason}", name.as_deref().unwrap_or("<unnamed>"));
            }
            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scene = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading scene from {path}");
            Scene::load(&path)?
        }
        None => demo_scene(),
    };

    let (mut sim, report) = scene.instantiate();
    log::info!(
        "Simulating '{}' with {} bodies for {RUN_SECONDS}s",
        scene.name,
        report.spawned.len()
    );

    let mut time = Time::new(sim.config().fixed_timestep);
    let frames = (RUN_SECONDS / FRAME_SECONDS).round() as u32;
    for frame in 0..frames {
        for _ in 0..time.advance(FRAME_SECONDS) {
            sim.step(time.fixed_delta());
            report_events(&mut sim);
        }

        if frame % 15 == 0 {
            log::debug!("frame {frame}: {:.2} of a tick pending", time.alpha());
            sim.publish_poses(&mut |entity: Entity, position: Vec3, orientation: Quat| {
                log::debug!("{entity:?} at {position} facing {orientation}");
            });
            log::info!("{}", sim.stats().format_stats());
        }
    }

    log::info!(
        "Finished after {:.2}s: {}",
        time.elapsed_seconds(),
        sim.stats().format_stats()
    );
    Ok(())
}
