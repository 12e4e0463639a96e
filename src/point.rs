//! Integer cell coordinates.
use std::hash::{Hash, Hasher};

use bevy::math::{IVec3, Vec3};

/// [`GridPoint`] identifies a single cell of a [`crate::grid::NavigationGrid`].
///
/// The point doubles as the element type of [`crate::queue::MinPriorityQueue`], so it
/// carries the queue bookkeeping alongside the coordinates. Equality and hashing only
/// look at the coordinates.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// 1-based slot in the owning heap, 0 when not queued.
    pub(crate) queue_index: usize,
    pub(crate) priority: f32,
}

impl GridPoint {
    pub const ZERO: GridPoint = GridPoint::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        GridPoint {
            x,
            y,
            z,
            queue_index: 0,
            priority: 0.0,
        }
    }

    pub fn from_ivec3(v: IVec3) -> Self {
        GridPoint::new(v.x, v.y, v.z)
    }

    pub fn as_ivec3(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// Priority the point was last queued with.
    pub fn priority(&self) -> f32 {
        self.priority
    }

    /// Chebyshev distance, the number of 26-neighborhood steps between two cells.
    pub fn chebyshev_distance(&self, other: &GridPoint) -> i32 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }
}

impl PartialEq for GridPoint {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl Eq for GridPoint {}

impl Hash for GridPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
        self.z.hash(state);
    }
}

impl From<IVec3> for GridPoint {
    fn from(v: IVec3) -> Self {
        GridPoint::from_ivec3(v)
    }
}

impl From<(i32, i32, i32)> for GridPoint {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        GridPoint::new(x, y, z)
    }
}
