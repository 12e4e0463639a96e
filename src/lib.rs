//! Navigation on dense voxel grids.
//!
//! A [`grid::NavigationGrid`] stores one [`node::GridNode`] per cell, each carrying
//! [`flags::NodeFlags`] that searches and region volumes test against. Searches run A*
//! over the 26-neighborhood with per-flag area weights, moving volumes flag the cells
//! they cover incrementally, and a walkable surface can be traced into the grid.
use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

mod astar;
mod macros;

pub mod area;
pub mod bounds;
pub mod collision;
pub mod error;
pub mod flags;
pub mod grid;
pub mod node;
pub mod path;
pub mod pathfind;
pub mod point;
pub mod queue;
pub mod raycast;
pub mod region;
pub mod surface;
pub mod transform;

pub mod prelude {
    pub use crate::area::{AreaDefinition, AreaDefinitionSet};
    pub use crate::bounds::Bounds;
    pub use crate::collision::{
        box_box_intersects, box_sphere_intersection, box_sphere_intersects, intersecting,
        sphere_sphere_intersects, BoxCollider, Collider, ColliderKind, IntersectionInfo,
        SphereCollider,
    };
    pub use crate::error::{CollisionError, GridError};
    pub use crate::flags::NodeFlags;
    pub use crate::grid::{
        GridSettings, GridSettingsBuilder, NavigationGrid, NearestNodeInfo, PlacementSettings,
    };
    pub use crate::node::GridNode;
    pub use crate::path::{Path, PathStatus};
    pub use crate::pathfind::{Pathfinder, PathfinderSettings};
    pub use crate::point::GridPoint;
    pub use crate::queue::MinPriorityQueue;
    pub use crate::region::{
        apply_box_region, apply_collider_region, apply_region_diff, apply_sphere_region,
        RegionTracker, RegionVolume,
    };
    pub use crate::surface::{NavigableSurface, SurfaceEdges, SurfaceTraceSettings};
    pub use crate::transform::GridTransform;
}

pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
