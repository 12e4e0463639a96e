//! This module defines [`Pathfinder`], a reusable A* query object bound to an allow mask and area weights.
use bevy::{log, math::Vec3};

use crate::{
    area::AreaDefinitionSet,
    astar::astar_grid,
    flags::NodeFlags,
    grid::NavigationGrid,
    path::{Path, PathStatus},
    point::GridPoint,
    queue::MinPriorityQueue,
};

/// Settings for a [`Pathfinder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathfinderSettings {
    /// Cells are entered only if they carry one of these flags.
    pub allow_flags: NodeFlags,
    /// Cells carrying any of these flags are never entered, even when allowed.
    pub block_flags: NodeFlags,
    /// Longest path returned; longer paths keep the cells closest to their end.
    pub max_path_points: usize,
    /// How many shells [`Pathfinder::get_path_world`] searches when snapping
    /// world positions to cells.
    pub closest_node_rings: i32,
    /// The open set is sized to the cell count divided by this.
    pub queue_capacity_divisor: usize,
    /// Floor each step cost at zero so heavy area weights can't make a path cheaper
    /// than standing still.
    pub clamp_negative_costs: bool,
}

impl Default for PathfinderSettings {
    fn default() -> Self {
        PathfinderSettings {
            allow_flags: NodeFlags::ALLOW_WALK,
            block_flags: NodeFlags::empty(),
            max_path_points: 500,
            closest_node_rings: 20,
            queue_capacity_divisor: 8,
            clamp_negative_costs: false,
        }
    }
}

impl PathfinderSettings {
    /// Open set capacity for a grid of `cells` cells.
    pub fn queue_capacity(&self, cells: usize) -> usize {
        (cells / self.queue_capacity_divisor.max(1)).max(1)
    }
}

/// Runs A* searches and keeps the last result.
///
/// The open set is kept between searches so repeated queries on the same grid don't
/// reallocate. One pathfinder can serve any number of grids.
///
/// ```
/// use bevy::math::{Quat, Vec3};
/// use bevy_voxelnav::prelude::*;
///
/// let mut grid = NavigationGrid::create(8, 1, 8, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 1.0)
///     .unwrap();
/// grid.set_all_flags(NodeFlags::ALLOW_WALK);
///
/// let mut pathfinder = Pathfinder::new(PathfinderSettings::default());
/// let path = pathfinder.get_path(&mut grid, GridPoint::new(0, 0, 0), GridPoint::new(7, 0, 3));
///
/// assert_eq!(path.status(), PathStatus::Complete);
/// assert_eq!(path.last(), Some(GridPoint::new(7, 0, 3)));
/// ```
#[derive(Debug, Clone)]
pub struct Pathfinder {
    settings: PathfinderSettings,
    areas: AreaDefinitionSet,
    queue: MinPriorityQueue,
    path: Path,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Pathfinder::new(PathfinderSettings::default())
    }
}

impl Pathfinder {
    pub fn new(settings: PathfinderSettings) -> Self {
        Pathfinder {
            settings,
            areas: AreaDefinitionSet::default(),
            queue: MinPriorityQueue::with_capacity(0),
            path: Path::default(),
        }
    }

    pub fn with_areas(mut self, areas: AreaDefinitionSet) -> Self {
        self.areas = areas;
        self
    }

    pub fn settings(&self) -> &PathfinderSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PathfinderSettings {
        &mut self.settings
    }

    pub fn areas(&self) -> &AreaDefinitionSet {
        &self.areas
    }

    pub fn areas_mut(&mut self) -> &mut AreaDefinitionSet {
        &mut self.areas
    }

    /// Status of the last search, [`PathStatus::None`] before the first one.
    pub fn status(&self) -> PathStatus {
        self.path.status()
    }

    /// Result of the last search.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hands over the last result, leaving the pathfinder idle.
    pub fn take_path(&mut self) -> Path {
        std::mem::take(&mut self.path)
    }

    /// Forgets the last result.
    pub fn clear(&mut self) {
        self.path.clear();
    }

    /// Searches from `from` to `to`. Out of range cells are clamped into the grid.
    pub fn get_path(&mut self, grid: &mut NavigationGrid, from: GridPoint, to: GridPoint) -> &Path {
        let capacity = self.settings.queue_capacity(grid.len());
        if self.queue.capacity() < capacity {
            self.queue = MinPriorityQueue::with_capacity(capacity);
        }

        self.path = astar_grid(
            grid,
            &mut self.queue,
            from,
            to,
            &self.areas,
            &self.settings,
        );

        &self.path
    }

    /// Snaps two world positions to the closest cells carrying the allow flags and none
    /// of the block flags, then searches between them.
    ///
    /// # Returns
    /// `None`, leaving the last result untouched, if either position has no such cell
    /// within [`PathfinderSettings::closest_node_rings`] shells.
    pub fn get_path_world(
        &mut self,
        grid: &mut NavigationGrid,
        from: Vec3,
        to: Vec3,
    ) -> Option<&Path> {
        let rings = self.settings.closest_node_rings;
        let flags = self.settings.allow_flags;
        let blocked = self.settings.block_flags;

        let Some(start) = grid.find_closest_unblocked_node(from, flags, blocked, rings) else {
            log::warn!("No cell with {:?} near start {}", flags, from);
            return None;
        };
        let Some(goal) = grid.find_closest_unblocked_node(to, flags, blocked, rings) else {
            log::warn!("No cell with {:?} near goal {}", flags, to);
            return None;
        };

        Some(self.get_path(grid, start, goal))
    }
}
