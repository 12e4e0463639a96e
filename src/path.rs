//! This module defines [`Path`], the result of a pathfinding query.
use bevy::math::Vec3;
use std::collections::VecDeque;

use crate::point::GridPoint;

/// Outcome of the last search run by a pathfinder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display)]
pub enum PathStatus {
    /// No search has run yet.
    #[default]
    None,
    /// The goal was reached.
    Complete,
    /// The goal was unreachable; the path ends at the explored cell closest to it.
    Partial,
}

/// The cells and world positions of a path, start first.
///
/// `next` and `pop` walk the world positions front to back so an agent can consume
/// the path as it moves. The cell list is left intact.
#[derive(Debug, Clone, Default)]
pub struct Path {
    status: PathStatus,
    cells: Vec<GridPoint>,
    points: VecDeque<Vec3>,
    cost: f32,
}

impl Path {
    /// Create a new path.
    /// # Arguments
    /// * `status` - Whether the goal was reached.
    /// * `cells` - Grid cells from start to end.
    /// * `points` - World positions matching `cells`.
    /// * `cost` - Accumulated cost of the last cell.
    pub fn new(status: PathStatus, cells: Vec<GridPoint>, points: Vec<Vec3>, cost: f32) -> Self {
        Path {
            status,
            cells,
            points: points.into(),
            cost,
        }
    }

    pub fn status(&self) -> PathStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == PathStatus::Complete
    }

    /// Cost accumulated along the path, including area weights.
    pub fn cost(&self) -> f32 {
        self.cost
    }

    /// Number of cells in the path.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[GridPoint] {
        &self.cells
    }

    /// World positions not yet consumed by [`Path::pop`].
    pub fn points(&self) -> &VecDeque<Vec3> {
        &self.points
    }

    pub fn first(&self) -> Option<GridPoint> {
        self.cells.first().copied()
    }

    pub fn last(&self) -> Option<GridPoint> {
        self.cells.last().copied()
    }

    /// Returns true if the path goes through `point`.
    pub fn contains(&self, point: GridPoint) -> bool {
        self.cells.contains(&point)
    }

    /// The next world position without removing it.
    pub fn next(&self) -> Option<Vec3> {
        self.points.front().copied()
    }

    /// Removes and returns the next world position.
    pub fn pop(&mut self) -> Option<Vec3> {
        self.points.pop_front()
    }

    pub(crate) fn clear(&mut self) {
        self.status = PathStatus::None;
        self.cells.clear();
        self.points.clear();
        self.cost = 0.0;
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status && self.cells == other.cells
    }
}

impl IntoIterator for Path {
    type Item = Vec3;
    type IntoIter = std::collections::vec_deque::IntoIter<Vec3>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}
