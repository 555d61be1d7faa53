//! Ground-plane contact detection
//!
//! Every shape vertex is tested against a horizontal plane. This is the only
//! collision geometry there is: no body-body contacts, and no sweep between
//! ticks, so a body fast enough to pass entirely through the plane in one
//! step is not caught.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::body::RigidBody;

/// Bit mask selecting ground layers (bit `n` = layer `n`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Collide with every layer
    pub const ALL: Self = Self(u32::MAX);
    /// Collide with nothing
    pub const NONE: Self = Self(0);

    /// Mask containing a single layer
    #[must_use]
    pub const fn layer(layer: u32) -> Self {
        if layer < 32 { Self(1 << layer) } else { Self::NONE }
    }

    /// Check if the mask includes a layer
    #[must_use]
    pub const fn contains(self, layer: u32) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }

    /// Union of two masks
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Static, infinite ground plane with +Y normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    /// World Y of the surface
    pub height: f32,
    /// Layer this surface belongs to
    pub layer: u32,
}

impl GroundPlane {
    /// Surface normal
    pub const UP: Vec3 = Vec3::Y;

    /// Ground at the given height on layer 0
    #[must_use]
    pub const fn new(height: f32) -> Self {
        Self { height, layer: 0 }
    }

    /// Move the surface to another layer
    #[must_use]
    pub const fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    /// How far a world point lies below the surface (negative when above)
    #[must_use]
    pub fn depth_of(&self, point: Vec3) -> f32 {
        self.height - point.y
    }

    /// Project a world point onto the surface
    #[must_use]
    pub fn project(&self, point: Vec3) -> Vec3 {
        Vec3::new(point.x, self.height, point.z)
    }
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// One penetrating vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The vertex in body-local space
    pub local_point: Vec3,
    /// World vertex projected onto the ground
    pub point: Vec3,
    /// Surface normal (ground up-vector)
    pub normal: Vec3,
    /// Penetration depth at detection time, > 0
    pub depth: f32,
}

/// Contacts for one body in one tick
pub type Contacts = SmallVec<[Contact; 8]>;

/// Find all vertices of `body` below the ground
///
/// Runs in time linear in the vertex count. Bodies whose layer mask excludes
/// the ground layer never touch it.
#[must_use]
pub fn detect_ground_contacts(body: &RigidBody, ground: &GroundPlane) -> Contacts {
    let mut contacts = Contacts::new();
    if !body.ground_layers().contains(ground.layer) {
        return contacts;
    }

    for &local in body.shape().vertices() {
        let world = body.world_point(local);
        let depth = ground.depth_of(world);
        if depth > 0.0 {
            contacts.push(Contact {
                local_point: local,
                point: ground.project(world),
                normal: GroundPlane::UP,
                depth,
            });
        }
    }

    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyBuilder, Shape};
    use approx::assert_relative_eq;

    fn cube_at(y: f32) -> RigidBody {
        BodyBuilder::new()
            .shape(Shape::cuboid(Vec3::splat(0.5)))
            .position(Vec3::new(0.0, y, 0.0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_resting_above_ground_has_no_contacts() {
        let contacts = detect_ground_contacts(&cube_at(0.6), &GroundPlane::new(0.0));
        assert!(contacts.is_empty());
    }

    #[test]
    fn test_bottom_face_penetrates() {
        let contacts = detect_ground_contacts(&cube_at(0.4), &GroundPlane::new(0.0));

        assert_eq!(contacts.len(), 4);
        for contact in &contacts {
            assert_relative_eq!(contact.depth, 0.1, epsilon = 1e-6);
            assert_relative_eq!(contact.point.y, 0.0);
            assert_eq!(contact.normal, Vec3::Y);
            assert_relative_eq!(contact.local_point.y, -0.5);
        }
    }

    #[test]
    fn test_rotated_body_uses_world_vertices() {
        let mut body = cube_at(0.6);
        body.set_orientation(glam::Quat::from_rotation_z(std::f32::consts::FRAC_PI_4));

        // The lowest edge sits at 0.6 - √2/2 ≈ -0.107
        let contacts = detect_ground_contacts(&body, &GroundPlane::new(0.0));
        assert_eq!(contacts.len(), 2);
        assert_relative_eq!(contacts[0].depth, 0.5_f32.sqrt() - 0.6, epsilon = 1e-5);
    }

    #[test]
    fn test_layer_mask_filters_ground() {
        let body = BodyBuilder::new()
            .shape(Shape::cuboid(Vec3::splat(0.5)))
            .ground_layers(LayerMask::layer(2))
            .build()
            .unwrap();

        assert!(detect_ground_contacts(&body, &GroundPlane::new(0.0)).is_empty());
        let ground = GroundPlane::new(0.0).with_layer(2);
        assert_eq!(detect_ground_contacts(&body, &ground).len(), 4);
    }

    #[test]
    fn test_layer_mask_bits() {
        let mask = LayerMask::layer(1).with(LayerMask::layer(4));

        assert!(mask.contains(1));
        assert!(mask.contains(4));
        assert!(!mask.contains(0));
        assert!(!LayerMask::ALL.contains(40));
        assert_eq!(LayerMask::layer(40), LayerMask::NONE);
    }
}
