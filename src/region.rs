//! Incremental flagging of the cells covered by moving volumes.
//!
//! A volume's previous footprint is stored as the linear indices of the cells it
//! flagged. Moving it clears those cells and rescans only the cells under the new
//! world bounds, so the cost is proportional to the volume size instead of the grid.
use bevy::{
    log,
    math::{IVec3, Vec3},
};

use crate::{
    bounds::Bounds,
    collision::{BoxCollider, Collider, SphereCollider},
    error::CollisionError,
    flags::NodeFlags,
    grid::NavigationGrid,
    point::GridPoint,
};

/// A world space volume that can flag grid cells.
pub trait RegionVolume {
    /// World space axis aligned bounds enclosing the volume.
    fn world_bounds(&self) -> Bounds;
    /// True if the world space point lies in the volume.
    fn contains(&self, world: Vec3) -> bool;
}

impl RegionVolume for BoxCollider {
    fn world_bounds(&self) -> Bounds {
        self.bounds()
    }

    fn contains(&self, world: Vec3) -> bool {
        BoxCollider::contains(self, world)
    }
}

impl RegionVolume for SphereCollider {
    fn world_bounds(&self) -> Bounds {
        self.bounds()
    }

    fn contains(&self, world: Vec3) -> bool {
        SphereCollider::contains(self, world)
    }
}

/// Moves a volume's flags from its previous footprint to its current one.
///
/// # Arguments
/// * `grid` - The grid to flag.
/// * `flags` - Flags owned by the volume.
/// * `volume` - The volume at its current placement.
/// * `previous` - Linear indices returned by the last call for this volume, empty the first time.
///
/// # Returns
/// The linear indices of the cells whose navigable center now lies in the volume.
pub fn apply_region_diff<V: RegionVolume + ?Sized>(
    grid: &mut NavigationGrid,
    flags: NodeFlags,
    volume: &V,
    previous: &[usize],
) -> Vec<usize> {
    for &index in previous {
        if let Some(node) = grid.node_at_index_mut(index) {
            node.remove_flags(flags);
        }
    }

    let (min, max) = local_cell_range(grid, &volume.world_bounds());
    let upper = GridPoint::new(max.x + 1, max.y + 1, max.z + 1);

    let mut touched = Vec::new();
    let candidates: Vec<GridPoint> = grid.enumerate_range(min, upper).collect();

    for point in candidates {
        let Some(index) = grid.index_of(point) else {
            continue;
        };
        let world = {
            let node = grid.nearest_node(point);
            grid.world_position(node.navigable_center)
        };

        if volume.contains(world) {
            grid.nearest_node_mut(point).add_flags(flags);
            touched.push(index);
        }
    }

    log::debug!(
        "Region diff cleared {} cells and flagged {} cells",
        previous.len(),
        touched.len()
    );

    touched
}

pub fn apply_box_region(
    grid: &mut NavigationGrid,
    flags: NodeFlags,
    volume: &BoxCollider,
    previous: &[usize],
) -> Vec<usize> {
    apply_region_diff(grid, flags, volume, previous)
}

pub fn apply_sphere_region(
    grid: &mut NavigationGrid,
    flags: NodeFlags,
    volume: &SphereCollider,
    previous: &[usize],
) -> Vec<usize> {
    apply_region_diff(grid, flags, volume, previous)
}

/// Same as [`apply_region_diff`] for a [`Collider`].
/// Fails without touching the grid if the collider is [`Collider::Empty`].
pub fn apply_collider_region(
    grid: &mut NavigationGrid,
    flags: NodeFlags,
    volume: &Collider,
    previous: &[usize],
) -> Result<Vec<usize>, CollisionError> {
    match volume {
        Collider::Box(b) => Ok(apply_region_diff(grid, flags, b, previous)),
        Collider::Sphere(s) => Ok(apply_region_diff(grid, flags, s, previous)),
        Collider::Empty => Err(CollisionError::UnsupportedShape(volume.kind())),
    }
}

// Inclusive cell range covering world bounds, clamped to the array.
fn local_cell_range(grid: &NavigationGrid, bounds: &Bounds) -> (GridPoint, GridPoint) {
    let local = bounds.transformed(&grid.transform().to_local_matrix());
    let cell_size = grid.cell_size();
    let last = grid.dimensions().as_ivec3() - 1;

    let min = (local.min() / cell_size).floor().as_ivec3().clamp(IVec3::ZERO, last);
    let max = (local.max() / cell_size).floor().as_ivec3().clamp(IVec3::ZERO, last);

    (GridPoint::from_ivec3(min), GridPoint::from_ivec3(max))
}

/// Key of a volume registered with a [`RegionTracker`].
pub type RegionId = usize;

/// A volume tracked by a [`RegionTracker`].
#[derive(Debug, Clone)]
pub struct TrackedRegion {
    pub collider: Collider,
    pub flags: NodeFlags,
    touched: Vec<usize>,
}

impl TrackedRegion {
    /// Cells currently flagged by this volume.
    pub fn touched(&self) -> &[usize] {
        &self.touched
    }
}

/// Keeps the footprints of many moving volumes on one grid.
///
/// When a volume moves or is removed, any other volume sharing one of its flags has
/// those flags restored on its own cells, so overlapping volumes don't erase each other.
#[derive(Debug, Default, Clone)]
pub struct RegionTracker {
    regions: slab::Slab<TrackedRegion>,
}

impl RegionTracker {
    pub fn new() -> Self {
        RegionTracker {
            regions: slab::Slab::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: RegionId) -> Option<&TrackedRegion> {
        self.regions.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &TrackedRegion)> {
        self.regions.iter()
    }

    /// Registers a volume and flags the cells under it.
    pub fn insert(
        &mut self,
        grid: &mut NavigationGrid,
        collider: Collider,
        flags: NodeFlags,
    ) -> Result<RegionId, CollisionError> {
        let touched = apply_collider_region(grid, flags, &collider, &[])?;
        Ok(self.regions.insert(TrackedRegion {
            collider,
            flags,
            touched,
        }))
    }

    /// Moves a registered volume. Returns `Ok(false)` if `id` isn't registered.
    pub fn update(
        &mut self,
        grid: &mut NavigationGrid,
        id: RegionId,
        collider: Collider,
    ) -> Result<bool, CollisionError> {
        let Some(region) = self.regions.get_mut(id) else {
            return Ok(false);
        };

        let touched = apply_collider_region(grid, region.flags, &collider, &region.touched)?;
        region.collider = collider;
        region.touched = touched;

        let flags = region.flags;
        self.restore_others(grid, id, flags);
        Ok(true)
    }

    /// Unregisters a volume and clears its flags.
    pub fn remove(&mut self, grid: &mut NavigationGrid, id: RegionId) -> Option<TrackedRegion> {
        let region = self.regions.try_remove(id)?;

        for &index in &region.touched {
            if let Some(node) = grid.node_at_index_mut(index) {
                node.remove_flags(region.flags);
            }
        }

        self.restore_others(grid, id, region.flags);
        Some(region)
    }

    /// Rescans every volume, e.g. after the grid was moved or retraced.
    pub fn refresh(&mut self, grid: &mut NavigationGrid) -> Result<(), CollisionError> {
        for (_, region) in self.regions.iter_mut() {
            region.touched =
                apply_collider_region(grid, region.flags, &region.collider, &region.touched)?;
        }
        Ok(())
    }

    fn restore_others(&self, grid: &mut NavigationGrid, except: RegionId, flags: NodeFlags) {
        for (id, other) in self.regions.iter() {
            if id == except || !other.flags.intersects(flags) {
                continue;
            }
            for &index in &other.touched {
                if let Some(node) = grid.node_at_index_mut(index) {
                    node.add_flags(other.flags);
                }
            }
        }
    }
}
