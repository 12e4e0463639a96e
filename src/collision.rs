//! Oriented box and sphere colliders with the intersection tests used to flag grid regions.
//!
//! Box–box uses the separating axis theorem over 15 candidate axes: the three face
//! normals of each box and the nine cross products of their edges. Cross products of
//! near-parallel edges are skipped. Spans that only touch count as separated.
use bevy::math::{Mat4, Quat, Vec3};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{bounds::Bounds, error::CollisionError};

const AXIS_EPSILON: f32 = 1e-6;

/// An oriented box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCollider {
    center: Vec3,
    rotation: Quat,
    half_extents: Vec3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
    to_world: Mat4,
    to_local: Mat4,
    bounds: Bounds,
    vertices: [Vec3; 8],
}

impl BoxCollider {
    /// A box of full `size` centered at `center`, rotated by `rotation`.
    pub fn new(center: Vec3, size: Vec3, rotation: Quat) -> Self {
        let half_extents = size.abs() * 0.5;
        let to_world = Mat4::from_rotation_translation(rotation, center);

        let local = Bounds {
            center: Vec3::ZERO,
            extents: half_extents,
        };
        let vertices = local.corners().map(|c| to_world.transform_point3(c));
        let first = vertices[0];
        let (min, max) = vertices
            .iter()
            .fold((first, first), |(min, max), v| (min.min(*v), max.max(*v)));

        BoxCollider {
            center,
            rotation,
            half_extents,
            right: rotation * Vec3::X,
            up: rotation * Vec3::Y,
            forward: rotation * Vec3::Z,
            to_world,
            to_local: to_world.inverse(),
            bounds: Bounds::from_min_max(min, max),
            vertices,
        }
    }

    /// A unit cube placed by a transform, the scale becoming the box size.
    pub fn from_transform(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        BoxCollider::new(position, scale, rotation)
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    /// Local x, y and z axes in world space.
    pub fn axes(&self) -> [Vec3; 3] {
        [self.right, self.up, self.forward]
    }

    /// World space axis aligned bounds.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The eight corners in world space.
    pub fn vertices(&self) -> &[Vec3; 8] {
        &self.vertices
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.to_local.transform_point3(world)
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.to_world.transform_point3(local)
    }

    /// Closest point on or inside the box. Points inside are returned unchanged.
    pub fn closest_position(&self, point: Vec3) -> Vec3 {
        let local = self.to_local(point).clamp(-self.half_extents, self.half_extents);
        self.to_world(local)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let local = self.to_local(point);
        local.abs().cmple(self.half_extents).all()
    }
}

/// A sphere in world space. The effective center is `center + offset` and the
/// effective radius `radius * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCollider {
    pub center: Vec3,
    pub offset: Vec3,
    pub radius: f32,
    pub scale: f32,
}

impl SphereCollider {
    pub fn new(center: Vec3, radius: f32) -> Self {
        SphereCollider {
            center,
            offset: Vec3::ZERO,
            radius,
            scale: 1.0,
        }
    }

    pub fn with_offset(center: Vec3, offset: Vec3, radius: f32, scale: f32) -> Self {
        SphereCollider {
            center,
            offset,
            radius,
            scale,
        }
    }

    /// A sphere placed by a transform. Non-uniform scale uses the largest axis.
    pub fn from_transform(position: Vec3, offset: Vec3, radius: f32, scale: Vec3) -> Self {
        SphereCollider::with_offset(position, offset * scale, radius, scale.abs().max_element())
    }

    pub fn world_center(&self) -> Vec3 {
        self.center + self.offset
    }

    pub fn scaled_radius(&self) -> f32 {
        self.radius * self.scale
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.world_center(), Vec3::splat(self.scaled_radius() * 2.0))
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.world_center().distance(point) <= self.scaled_radius()
    }

    /// Closest point on or inside the sphere. Points inside are returned unchanged.
    pub fn closest_position(&self, point: Vec3) -> Vec3 {
        if self.contains(point) {
            return point;
        }
        let center = self.world_center();
        center + (point - center).normalize_or_zero() * self.scaled_radius()
    }
}

/// Shape tag of a [`Collider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ColliderKind {
    Empty,
    Box,
    Sphere,
}

/// Any collider the crate can test. `Empty` stands for shapes that couldn't be
/// classified and fails every query with [`CollisionError::UnsupportedShape`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Collider {
    #[default]
    Empty,
    Box(BoxCollider),
    Sphere(SphereCollider),
}

impl From<BoxCollider> for Collider {
    fn from(value: BoxCollider) -> Self {
        Collider::Box(value)
    }
}

impl From<SphereCollider> for Collider {
    fn from(value: SphereCollider) -> Self {
        Collider::Sphere(value)
    }
}

impl Collider {
    pub fn kind(&self) -> ColliderKind {
        match self {
            Collider::Empty => ColliderKind::Empty,
            Collider::Box(_) => ColliderKind::Box,
            Collider::Sphere(_) => ColliderKind::Sphere,
        }
    }

    pub fn bounds(&self) -> Result<Bounds, CollisionError> {
        match self {
            Collider::Box(b) => Ok(b.bounds()),
            Collider::Sphere(s) => Ok(s.bounds()),
            Collider::Empty => Err(CollisionError::UnsupportedShape(ColliderKind::Empty)),
        }
    }

    pub fn contains(&self, point: Vec3) -> Result<bool, CollisionError> {
        match self {
            Collider::Box(b) => Ok(b.contains(point)),
            Collider::Sphere(s) => Ok(s.contains(point)),
            Collider::Empty => Err(CollisionError::UnsupportedShape(ColliderKind::Empty)),
        }
    }

    pub fn closest_position(&self, point: Vec3) -> Result<Vec3, CollisionError> {
        match self {
            Collider::Box(b) => Ok(b.closest_position(point)),
            Collider::Sphere(s) => Ok(s.closest_position(point)),
            Collider::Empty => Err(CollisionError::UnsupportedShape(ColliderKind::Empty)),
        }
    }

    pub fn intersects(&self, other: &Collider) -> Result<bool, CollisionError> {
        match (self, other) {
            (Collider::Box(a), Collider::Box(b)) => Ok(box_box_intersects(a, b)),
            (Collider::Box(a), Collider::Sphere(b)) => Ok(box_sphere_intersects(a, b)),
            (Collider::Sphere(a), Collider::Box(b)) => Ok(box_sphere_intersects(b, a)),
            (Collider::Sphere(a), Collider::Sphere(b)) => Ok(sphere_sphere_intersects(a, b)),
            (a, b) => {
                let kind = if a.kind() == ColliderKind::Empty {
                    a.kind()
                } else {
                    b.kind()
                };
                Err(CollisionError::UnsupportedShape(kind))
            }
        }
    }
}

/// Details of a box–sphere test.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntersectionInfo {
    pub is_intersecting: bool,
    /// Distance between the shapes, negative when overlapping.
    pub gap_distance: f32,
    pub gap_direction: Vec3,
    pub penetration_direction: Vec3,
    pub penetration_distance: f32,
    /// Closest point on the box.
    pub point_on_a: Vec3,
    /// Matching point on the sphere surface.
    pub point_on_b: Vec3,
}

pub fn box_box_intersects(a: &BoxCollider, b: &BoxCollider) -> bool {
    let a_axes = a.axes();
    let b_axes = b.axes();

    for axis in a_axes.iter().chain(b_axes.iter()) {
        if is_separated(&a.vertices, &b.vertices, *axis) {
            return false;
        }
    }

    for a_axis in a_axes.iter() {
        for b_axis in b_axes.iter() {
            if is_separated(&a.vertices, &b.vertices, a_axis.cross(*b_axis)) {
                return false;
            }
        }
    }

    true
}

pub fn box_sphere_intersects(a: &BoxCollider, b: &SphereCollider) -> bool {
    let center = b.world_center();
    let closest = a.closest_position(center);
    center.distance(closest) - b.scaled_radius() <= 0.0
}

pub fn sphere_sphere_intersects(a: &SphereCollider, b: &SphereCollider) -> bool {
    a.world_center().distance(b.world_center()) <= a.scaled_radius() + b.scaled_radius()
}

/// Box–sphere test that also reports the gap or penetration.
pub fn box_sphere_intersection(a: &BoxCollider, b: &SphereCollider) -> IntersectionInfo {
    let center = b.world_center();
    let radius = b.scaled_radius();

    let closest = a.closest_position(center);
    let distance = center.distance(closest);
    let gap_distance = distance - radius;
    let overlap = (radius - distance) * (closest - center).normalize_or_zero();

    let mut info = IntersectionInfo {
        is_intersecting: gap_distance <= 0.0,
        gap_distance,
        point_on_a: closest,
        point_on_b: closest + overlap,
        ..Default::default()
    };

    if info.is_intersecting {
        info.penetration_direction = overlap;
        info.penetration_distance = overlap.length();
    } else {
        info.gap_direction = overlap;
    }

    info
}

/// Indices of the colliders in `others` that intersect `test`.
pub fn intersecting(test: &Collider, others: &[Collider]) -> Result<Vec<usize>, CollisionError> {
    #[cfg(feature = "parallel")]
    let hits: Result<Vec<Option<usize>>, CollisionError> = others
        .par_iter()
        .enumerate()
        .map(|(i, other)| test.intersects(other).map(|hit| hit.then_some(i)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let hits: Result<Vec<Option<usize>>, CollisionError> = others
        .iter()
        .enumerate()
        .map(|(i, other)| test.intersects(other).map(|hit| hit.then_some(i)))
        .collect();

    Ok(hits?.into_iter().flatten().collect())
}

fn is_separated(a: &[Vec3; 8], b: &[Vec3; 8], axis: Vec3) -> bool {
    if axis.length_squared() < AXIS_EPSILON {
        return false;
    }

    let (a_min, a_max) = project(a, axis);
    let (b_min, b_max) = project(b, axis);

    let long_span = a_max.max(b_max) - a_min.min(b_min);
    let sum_span = (a_max - a_min) + (b_max - b_min);
    // Flat spans that coincide still overlap.
    long_span >= sum_span && long_span > 0.0
}

fn project(vertices: &[Vec3; 8], axis: Vec3) -> (f32, f32) {
    vertices.iter().fold((f32::MAX, f32::MIN), |(min, max), v| {
        let d = v.dot(axis);
        (min.min(d), max.max(d))
    })
}
