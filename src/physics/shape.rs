//! Collision geometry supplied by the shape provider

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Immutable local-space collision geometry.
///
/// The vertices are tested against the ground every tick. The bounding size is
/// only read once, when the inertia tensor is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    vertices: Vec<Vec3>,
    size: Vec3,
}

impl Shape {
    /// Create a shape from explicit vertices and bounding-box size
    #[must_use]
    pub fn new(vertices: Vec<Vec3>, size: Vec3) -> Self {
        Self {
            vertices,
            size: size.abs(),
        }
    }

    /// Create a shape whose bounding size is the extent of its vertices
    #[must_use]
    pub fn from_vertices(vertices: Vec<Vec3>) -> Self {
        let size = bounding_size(&vertices);
        Self { vertices, size }
    }

    /// Eight corners of a box centred on the local origin
    #[must_use]
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents.abs();
        let mut vertices = Vec::with_capacity(8);
        for &x in &[-h.x, h.x] {
            for &y in &[-h.y, h.y] {
                for &z in &[-h.z, h.z] {
                    vertices.push(Vec3::new(x, y, z));
                }
            }
        }
        Self {
            vertices,
            size: h * 2.0,
        }
    }

    /// A single contact point at the origin with the given box size for inertia
    #[must_use]
    pub fn point(size: Vec3) -> Self {
        Self::new(vec![Vec3::ZERO], size)
    }

    /// Local-space vertices in authoring order
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Bounding-box size (width, height, depth)
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// Number of collision vertices
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the shape has no geometry at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

fn bounding_size(vertices: &[Vec3]) -> Vec3 {
    let Some(first) = vertices.first() else {
        return Vec3::ZERO;
    };
    let (min, max) = vertices
        .iter()
        .fold((*first, *first), |(min, max), v| (min.min(*v), max.max(*v)));
    max - min
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_corners() {
        let shape = Shape::cuboid(Vec3::new(1.0, 0.5, 2.0));

        assert_eq!(shape.vertex_count(), 8);
        assert_eq!(shape.size(), Vec3::new(2.0, 1.0, 4.0));
        assert!(shape.vertices().contains(&Vec3::new(-1.0, -0.5, -2.0)));
        assert!(shape.vertices().contains(&Vec3::new(1.0, 0.5, 2.0)));
    }

    #[test]
    fn test_size_from_vertices() {
        let shape = Shape::from_vertices(vec![
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(2.0, 3.0, 0.5),
            Vec3::new(0.0, -1.0, -0.5),
        ]);

        assert_eq!(shape.size(), Vec3::new(3.0, 4.0, 1.0));
        assert!(Shape::from_vertices(Vec::new()).is_empty());
    }
}
