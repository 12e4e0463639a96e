//! Local ↔ world placement of a grid.
use bevy::math::{Mat4, Quat, Vec3};

/// Position, rotation and scale of a grid in the world, with both matrices cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    to_world: Mat4,
    to_local: Mat4,
}

impl Default for GridTransform {
    fn default() -> Self {
        GridTransform::new(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }
}

impl GridTransform {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let to_world = Mat4::from_scale_rotation_translation(scale, rotation, position);
        GridTransform {
            position,
            rotation,
            scale,
            to_world,
            to_local: to_world.inverse(),
        }
    }

    /// Replaces the placement and rebuilds both matrices.
    pub fn set(&mut self, position: Vec3, rotation: Quat, scale: Vec3) {
        *self = GridTransform::new(position, rotation, scale);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn to_world_matrix(&self) -> Mat4 {
        self.to_world
    }

    pub fn to_local_matrix(&self) -> Mat4 {
        self.to_local
    }

    pub fn world_position(&self, local: Vec3) -> Vec3 {
        self.to_world.transform_point3(local)
    }

    pub fn local_position(&self, world: Vec3) -> Vec3 {
        self.to_local.transform_point3(world)
    }
}
