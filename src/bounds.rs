//! Axis aligned bounds.
use bevy::math::{Mat4, Vec3};

/// Axis aligned box stored as center and half extents.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Bounds {
    /// Creates bounds from a center and a full size.
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Bounds {
            center,
            extents: size * 0.5,
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Bounds {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    pub fn size(&self) -> Vec3 {
        self.extents * 2.0
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let min = self.min();
        let max = self.max();
        point.cmpge(min).all() && point.cmple(max).all()
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min().cmple(other.max()).all() && self.max().cmpge(other.min()).all()
    }

    /// Grows the bounds to include `point`.
    pub fn encapsulate(&mut self, point: Vec3) {
        *self = Bounds::from_min_max(self.min().min(point), self.max().max(point));
    }

    /// The eight corners, min corner first.
    pub fn corners(&self) -> [Vec3; 8] {
        let min = self.min();
        let max = self.max();
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ]
    }

    /// Axis aligned bounds of these bounds after transforming every corner by `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Bounds {
        let corners = self.corners();
        let first = matrix.transform_point3(corners[0]);
        let (min, max) = corners[1..]
            .iter()
            .map(|c| matrix.transform_point3(*c))
            .fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Bounds::from_min_max(min, max)
    }
}
