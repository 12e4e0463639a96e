//! This module defines [`GridNode`], the per-cell record stored in the grid.
use bevy::math::Vec3;

use crate::{bounds::Bounds, flags::NodeFlags, point::GridPoint};

/// A single cell of a [`crate::grid::NavigationGrid`].
///
/// Geometry is stored in grid-local space. The score fields are scratch state owned
/// by whichever search last stamped `open_id`/`closed_id`; they are meaningless unless
/// the stamp equals the id of the search reading them.
#[derive(Debug, Default, Clone)]
pub struct GridNode {
    pub center: Vec3,
    /// Where an agent stands inside this cell. Starts at `center`, snapped to the
    /// walkable surface by surface tracing.
    pub navigable_center: Vec3,
    pub normal: Vec3,
    pub size: Vec3,
    pub bounds: Bounds,
    pub point: GridPoint,
    pub flags: NodeFlags,

    pub(crate) g_score: f32,
    pub(crate) h_score: f32,
    pub(crate) f_score: f32,
    pub(crate) parent: GridPoint,
    pub(crate) open_id: u32,
    pub(crate) closed_id: u32,
}

impl GridNode {
    /// Creates a cell centered at `center` with a cubic size of `cell_size`.
    pub fn new(center: Vec3, cell_size: f32, flags: NodeFlags) -> Self {
        let size = Vec3::splat(cell_size);
        GridNode {
            center,
            navigable_center: center,
            normal: Vec3::Y,
            size,
            bounds: Bounds::new(center, size),
            flags,
            ..Default::default()
        }
    }

    /// Adds `flags`, returns false if `flags` is empty.
    pub fn add_flags(&mut self, flags: NodeFlags) -> bool {
        if flags.is_empty() {
            return false;
        }
        self.flags |= flags;
        true
    }

    /// Removes `flags`, returns false if `flags` is empty.
    pub fn remove_flags(&mut self, flags: NodeFlags) -> bool {
        if flags.is_empty() {
            return false;
        }
        self.flags &= !flags;
        true
    }

    pub fn set_flag(&mut self, flag: NodeFlags, value: bool) {
        if value {
            self.add_flags(flag);
        } else {
            self.remove_flags(flag);
        }
    }

    /// True if any bit of `flags` is set on this cell.
    pub fn has_flag(&self, flags: NodeFlags) -> bool {
        self.flags.matches(flags)
    }

    pub fn is_walkable(&self) -> bool {
        self.flags.contains(NodeFlags::ALLOW_WALK)
    }

    pub fn g_score(&self) -> f32 {
        self.g_score
    }

    /// Straight line distance to the goal of the last search that visited this cell.
    pub fn h_score(&self) -> f32 {
        self.h_score
    }

    pub fn f_score(&self) -> f32 {
        self.f_score
    }

    /// Cell this one was reached from in the last search that visited it.
    pub fn parent(&self) -> GridPoint {
        self.parent
    }

    /// Invalidates the scratch state so no query id can match it.
    pub(crate) fn reset_search_state(&mut self) {
        self.g_score = 0.0;
        self.h_score = 0.0;
        self.f_score = 0.0;
        self.parent = GridPoint::ZERO;
        self.open_id = 0;
        self.closed_id = 0;
    }
}
