//! Contact resolution against the immovable ground
//!
//! All contacts of one body are resolved together. Each contact first gets a
//! full positional correction. Then sequential impulses run over the whole set
//! until no contact is still approaching: per contact, an accumulated normal
//! impulse (never pulling) drives the normal velocity to `-e·v₀`, and a friction
//! impulse cancels the slip within the Coulomb bound `μs·J`. Only the body is
//! changed.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::body::RigidBody;
use super::collision::Contact;

/// Denominators below this skip the impulse instead of dividing
const MIN_EFFECTIVE_MASS: f32 = 1e-9;

/// A pass whose largest impulse change is below this ends the solve
const CONVERGED_IMPULSE: f32 = 1e-6;

/// Default tangential speed under which friction is skipped
pub const DEFAULT_FRICTION_EPSILON: f32 = 1e-4;

/// Default number of passes over a body's contact set
pub const DEFAULT_SOLVER_ITERATIONS: u32 = 16;

/// How the velocity response to a contact is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContactResponse {
    /// Analytic impulse with restitution, then friction
    #[default]
    Impulse,
    /// Reflect both velocities scaled by restitution, then run the impulse
    /// and friction steps on the result. Restitution is effectively applied
    /// twice on approaching contacts.
    ReflectThenImpulse,
}

/// Solver tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Velocity response model
    pub response: ContactResponse,
    /// Tangential speed under which friction is skipped
    pub friction_epsilon: f32,
    /// Maximum passes over the contact set
    pub iterations: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            response: ContactResponse::default(),
            friction_epsilon: DEFAULT_FRICTION_EPSILON,
            iterations: DEFAULT_SOLVER_ITERATIONS,
        }
    }
}

/// What happened at one contact
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactResolution {
    /// Distance the body was pushed out along the normal
    pub correction: f32,
    /// Total normal impulse J applied here (0 when separating)
    pub normal_impulse: f32,
    /// Magnitude of the total friction impulse (0 when skipped)
    pub friction_impulse: f32,
}

/// What happened to one body's contact set
#[derive(Debug, Clone, Default)]
pub struct BodyResolution {
    /// One entry per contact, in contact order
    pub contacts: SmallVec<[ContactResolution; 8]>,
    /// Linear speed before the response
    pub speed_before: f32,
    /// Linear speed after the response
    pub speed_after: f32,
    /// Passes actually run
    pub iterations: u32,
}

/// Per-contact solver state
struct Row {
    r: Vec3,
    point: Vec3,
    target: f32,
    normal_mass: f32,
    normal: f32,
    friction: Vec3,
}

/// Resolve every ground contact of one body
///
/// Vertices are re-measured against the plane before correcting, since an
/// earlier correction in the same set may already have lifted them. Whatever
/// depth remains is corrected in full.
pub fn resolve_contacts(
    body: &mut RigidBody,
    contacts: &[Contact],
    settings: &SolverSettings,
) -> BodyResolution {
    let speed_before = body.linear_velocity().length();
    let mut result = BodyResolution {
        speed_before,
        speed_after: speed_before,
        ..Default::default()
    };
    if contacts.is_empty() {
        return result;
    }

    for contact in contacts {
        let world = body.world_point(contact.local_point);
        let depth = (contact.point - world).dot(contact.normal).max(0.0);
        body.translate(contact.normal * depth);
        result.contacts.push(ContactResolution {
            correction: depth,
            ..Default::default()
        });
    }

    if settings.response == ContactResponse::ReflectThenImpulse {
        reflect(body, contacts[0].normal);
    }

    let e = body.restitution();
    let inv_mass = body.inverse_mass();
    let inv_inertia = body.world_inverse_inertia();
    let mut rows: SmallVec<[Row; 8]> = contacts
        .iter()
        .map(|contact| {
            let n = contact.normal;
            let point = body.world_point(contact.local_point);
            let r = point - body.position();
            let approach = body.velocity_at(point).dot(n);
            Row {
                r,
                point,
                target: (-e * approach).max(0.0),
                normal_mass: inv_mass + n.dot((inv_inertia * r.cross(n)).cross(r)),
                normal: 0.0,
                friction: Vec3::ZERO,
            }
        })
        .collect();

    let mu = body.material().static_friction;
    for pass in 1..=settings.iterations.max(1) {
        result.iterations = pass;
        let mut largest = 0.0_f32;

        for (row, contact) in rows.iter_mut().zip(contacts) {
            let n = contact.normal;

            // Normal impulse, accumulated and never pulling
            if row.normal_mass > MIN_EFFECTIVE_MASS {
                let v_n = body.velocity_at(row.point).dot(n);
                let total = (row.normal + (row.target - v_n) / row.normal_mass).max(0.0);
                let delta = total - row.normal;
                row.normal = total;
                if delta != 0.0 {
                    body.apply_impulse_at(n * delta, row.r);
                    largest = largest.max(delta.abs());
                }
            }

            // Friction opposes whatever tangential slip is left
            let v_rel = body.velocity_at(row.point);
            let tangential = v_rel - n * v_rel.dot(n);
            let slip = tangential.length();
            if slip > settings.friction_epsilon {
                let t = tangential / slip;
                let tangent_mass = inv_mass + t.dot((inv_inertia * row.r.cross(t)).cross(row.r));
                if tangent_mass > MIN_EFFECTIVE_MASS {
                    let total = (row.friction - tangential / tangent_mass)
                        .clamp_length_max(mu * row.normal);
                    let delta = total - row.friction;
                    row.friction = total;
                    body.apply_impulse_at(delta, row.r);
                    largest = largest.max(delta.length());
                }
            }
        }

        if largest < CONVERGED_IMPULSE {
            break;
        }
    }

    for (out, row) in result.contacts.iter_mut().zip(&rows) {
        out.normal_impulse = row.normal;
        out.friction_impulse = row.friction.length();
    }
    result.speed_after = body.linear_velocity().length();
    result
}

/// Mirror both velocities about the contact plane, scaled by restitution
fn reflect(body: &mut RigidBody, n: Vec3) {
    let e = body.restitution();
    let v = body.linear_velocity();
    let w = body.angular_velocity();
    body.set_linear_velocity((v - 2.0 * v.dot(n) * n) * e);
    body.set_angular_velocity((w - 2.0 * w.dot(n) * n) * e);
}
