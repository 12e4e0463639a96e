//! This module contains [`NavigationGrid`], the dense voxel grid every other part of the crate works on.
use bevy::{
    log,
    math::{IVec3, Quat, UVec3, Vec3},
};
use ndarray::{Array3, ArrayView3};
use smallvec::SmallVec;

use crate::{
    area::AreaDefinitionSet,
    astar::astar_grid,
    bounds::Bounds,
    error::GridError,
    flags::NodeFlags,
    node::GridNode,
    path::Path,
    pathfind::PathfinderSettings,
    point::GridPoint,
    queue::MinPriorityQueue,
    raycast::bresenham_line,
    surface::{trace_node, NavigableSurface, SurfaceEdges, SurfaceTraceSettings},
    transform::GridTransform,
};

/// Where the grid sits in the world.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlacementSettings {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        PlacementSettings {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Holder for validated grid settings.
#[derive(Copy, Clone, Debug)]
pub struct GridSettings(pub(crate) GridInternalSettings);

/// Builder for [`GridSettings`].
///
/// Example usage:
/// ```
/// use bevy::math::Vec3;
/// use bevy_voxelnav::prelude::*;
///
/// let settings = GridSettingsBuilder::new(32, 4, 32)
///     .cell_size(0.5)
///     .position(Vec3::new(-8.0, 0.0, -8.0))
///     .default_flags(NodeFlags::ALLOW_WALK)
///     .build();
///
/// let grid = NavigationGrid::new(&settings);
/// assert_eq!(grid.len(), 32 * 4 * 32);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct GridSettingsBuilder {
    dimensions: UVec3,
    cell_size: f32,
    placement: PlacementSettings,
    default_flags: NodeFlags,
    empty: bool,
}

impl Default for GridSettingsBuilder {
    fn default() -> Self {
        GridSettingsBuilder {
            dimensions: UVec3::new(32, 8, 32),
            cell_size: 1.0,
            placement: PlacementSettings::default(),
            default_flags: NodeFlags::empty(),
            empty: false,
        }
    }
}

impl GridSettingsBuilder {
    /// Starts a builder for a grid of `x` by `y` by `z` cells.
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        GridSettingsBuilder {
            dimensions: UVec3::new(x, y, z),
            ..Default::default()
        }
    }

    /// Edge length of each cubic cell in grid-local units.
    pub fn cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.placement.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.placement.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.placement.scale = scale;
        self
    }

    /// Pass in [`PlacementSettings`] instead of setting position, rotation and scale individually.
    pub fn placement(mut self, placement: PlacementSettings) -> Self {
        self.placement = placement;
        self
    }

    /// Flags every cell starts with.
    pub fn default_flags(mut self, flags: NodeFlags) -> Self {
        self.default_flags = flags;
        self
    }

    /// Skip seeding cell geometry. The whole array counts as occupied and the caller
    /// is expected to fill it with [`NavigationGrid::update`].
    pub fn empty(mut self) -> Self {
        self.empty = true;
        self
    }

    /// Validates the builder state.
    pub fn try_build(self) -> Result<GridSettings, GridError> {
        let UVec3 { x, y, z } = self.dimensions;
        if x == 0 || y == 0 || z == 0 {
            return Err(GridError::EmptyDimensions { x, y, z });
        }

        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(GridError::InvalidCellSize(self.cell_size));
        }

        // Coordinates are i32 and the query id stamps are per cell, keep both addressable.
        let cells = x as u64 * y as u64 * z as u64;
        if x > i32::MAX as u32 || y > i32::MAX as u32 || z > i32::MAX as u32 || cells > isize::MAX as u64
        {
            return Err(GridError::TooLarge(cells));
        }

        Ok(GridSettings(GridInternalSettings {
            dimensions: self.dimensions,
            cell_size: self.cell_size,
            placement: self.placement,
            default_flags: self.default_flags,
            empty: self.empty,
        }))
    }

    /// Builds the [`GridSettings`], panicking on invalid input.
    /// Use [`GridSettingsBuilder::try_build`] to handle the error instead.
    pub fn build(self) -> GridSettings {
        match self.try_build() {
            Ok(settings) => settings,
            Err(e) => panic!("Invalid grid settings: {e}"),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct GridInternalSettings {
    pub(crate) dimensions: UVec3,
    pub(crate) cell_size: f32,
    pub(crate) placement: PlacementSettings,
    pub(crate) default_flags: NodeFlags,
    pub(crate) empty: bool,
}

impl Default for GridInternalSettings {
    fn default() -> Self {
        GridSettingsBuilder::default().build().0
    }
}

/// Result of [`NavigationGrid::nearest_node_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearestNodeInfo {
    /// The cell that was looked up, after clamping.
    pub point: GridPoint,
    /// The coordinate the position snapped to before clamping.
    pub requested: GridPoint,
    /// True when no clamping was needed.
    pub exact: bool,
}

/// A dense 3D grid of [`GridNode`]s with a local ↔ world transform.
///
/// Cells are stored in one contiguous row-major array, so the linear index of
/// `(x, y, z)` is `x * (Y * Z) + y * Z + z`. Cell `(i, j, k)` is centered at
/// `((i, j, k) + 0.5) * cell_size` in grid-local space.
///
/// Public lookups clamp out of range coordinates instead of failing. The grid tracks
/// an occupied range, grown only by [`NavigationGrid::update`], which bounds neighbor
/// and ring searches.
///
/// # Example
/// ```
/// use bevy::math::{Quat, Vec3};
/// use bevy_voxelnav::prelude::*;
///
/// let mut grid = NavigationGrid::create(10, 10, 10, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 1.0)
///     .unwrap();
/// grid.set_all_flags(NodeFlags::ALLOW_WALK);
///
/// let closest = grid
///     .find_closest_node(Vec3::new(5.5, 0.5, 5.5), NodeFlags::ALLOW_WALK, 20)
///     .unwrap();
/// assert_eq!(closest, GridPoint::new(5, 0, 5));
///
/// let path = grid.pathfind(
///     GridPoint::new(0, 0, 0),
///     GridPoint::new(9, 0, 9),
///     NodeFlags::ALLOW_WALK,
///     NodeFlags::OBSTACLE,
///     &AreaDefinitionSet::default(),
/// );
/// assert_eq!(path.status(), PathStatus::Complete);
/// ```
#[derive(Debug, Clone)]
pub struct NavigationGrid {
    nodes: Array3<GridNode>,
    dimensions: UVec3,
    cell_size: f32,
    transform: GridTransform,
    default_flags: NodeFlags,

    min: IVec3,
    max: IVec3,

    query_id: u32,
}

impl NavigationGrid {
    /// Creates a new [`NavigationGrid`] from [`GridSettings`].
    /// Use the [`GridSettingsBuilder`] to generate the settings.
    pub fn new(settings: &GridSettings) -> Self {
        let GridInternalSettings {
            dimensions,
            cell_size,
            placement,
            default_flags,
            empty,
        } = settings.0;

        let UVec3 { x, y, z } = dimensions;
        let shape = (x as usize, y as usize, z as usize);

        let mut grid = NavigationGrid {
            nodes: Array3::from_elem(shape, GridNode::default()),
            dimensions,
            cell_size,
            transform: GridTransform::new(placement.position, placement.rotation, placement.scale),
            default_flags,
            min: IVec3::splat(i32::MAX),
            max: IVec3::ZERO,
            query_id: 0,
        };

        if empty {
            grid.min = IVec3::ZERO;
            grid.max = dimensions.as_ivec3() - IVec3::ONE;
            for node in grid.nodes.iter_mut() {
                node.flags = default_flags;
            }
        } else {
            let half = cell_size * 0.5;
            let lattice = Array3::from_shape_fn(shape, |(i, j, k)| {
                let center = Vec3::new(i as f32, j as f32, k as f32) * cell_size + Vec3::splat(half);
                GridNode::new(center, cell_size, default_flags)
            });
            grid.update(lattice.into_raw_vec_and_offset().0);
        }

        log::info!(
            "Created {}x{}x{} navigation grid, cell size {}",
            x,
            y,
            z,
            cell_size
        );

        grid
    }

    /// Creates a grid of `size_x * size_y * size_z` cells with seeded cell geometry.
    pub fn create(
        size_x: u32,
        size_y: u32,
        size_z: u32,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
        cell_size: f32,
    ) -> Result<Self, GridError> {
        let settings = GridSettingsBuilder::new(size_x, size_y, size_z)
            .cell_size(cell_size)
            .position(position)
            .rotation(rotation)
            .scale(scale)
            .try_build()?;

        Ok(NavigationGrid::new(&settings))
    }

    /// Like [`NavigationGrid::create`] but leaves every cell default initialized and treats
    /// the whole array as occupied.
    pub fn create_empty(
        size_x: u32,
        size_y: u32,
        size_z: u32,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
        cell_size: f32,
    ) -> Result<Self, GridError> {
        let settings = GridSettingsBuilder::new(size_x, size_y, size_z)
            .cell_size(cell_size)
            .position(position)
            .rotation(rotation)
            .scale(scale)
            .empty()
            .try_build()?;

        Ok(NavigationGrid::new(&settings))
    }

    /// Inserts nodes in bulk. Each node is snapped to the cell its center falls in,
    /// its [`GridNode::point`] is set, and the occupied range grows to include it.
    /// Nodes whose center lands outside the array are dropped.
    pub fn update(&mut self, mut nodes: Vec<GridNode>) {
        nodes.sort_by(|a, b| {
            a.center
                .x
                .total_cmp(&b.center.x)
                .then(a.center.y.total_cmp(&b.center.y))
        });

        let count = nodes.len();
        let mut dropped = 0;

        for mut node in nodes {
            let point = self.to_grid_point(node.center);
            let Some(slot) = self.slot(point) else {
                dropped += 1;
                continue;
            };

            node.point = point;
            self.nodes[slot] = node;

            let p = point.as_ivec3();
            self.min = self.min.min(p);
            self.max = self.max.max(p);
        }

        if dropped > 0 {
            log::warn!("Dropped {} of {} nodes outside the grid", dropped, count);
        }

        log::debug!(
            "Updated grid with {} nodes, occupied range {:?}..={:?}",
            count - dropped,
            self.min,
            self.max
        );
    }

    /// Returns an [`ndarray::ArrayView3<GridNode>`] for read-only access to the grid data.
    pub fn view(&self) -> ArrayView3<GridNode> {
        self.nodes.view()
    }

    /// Number of cells along each axis.
    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Same as [`NavigationGrid::len`].
    pub fn node_count(&self) -> usize {
        self.len()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn default_flags(&self) -> NodeFlags {
        self.default_flags
    }

    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    /// Moves the grid in the world. Cell geometry is local and stays untouched.
    pub fn set_transform(&mut self, position: Vec3, rotation: Quat, scale: Vec3) {
        self.transform.set(position, rotation, scale);
    }

    /// Lowest occupied coordinate on each axis.
    pub fn min(&self) -> IVec3 {
        self.min
    }

    /// Highest occupied coordinate on each axis.
    pub fn max(&self) -> IVec3 {
        self.max
    }

    pub fn world_position(&self, local: Vec3) -> Vec3 {
        self.transform.world_position(local)
    }

    pub fn local_position(&self, world: Vec3) -> Vec3 {
        self.transform.local_position(world)
    }

    /// Snaps a grid-local distance along one axis to a cell coordinate.
    /// Halves round away from zero.
    pub fn to_grid_distance(&self, value: f32) -> i32 {
        ((value - self.cell_size * 0.5) / self.cell_size).round() as i32
    }

    /// Snaps a grid-local position to a cell coordinate. The result may be out of range.
    pub fn to_grid_point(&self, local: Vec3) -> GridPoint {
        GridPoint::new(
            self.to_grid_distance(local.x),
            self.to_grid_distance(local.y),
            self.to_grid_distance(local.z),
        )
    }

    /// Linear index of `point`, `None` if it lies outside the array.
    pub fn index_of(&self, point: GridPoint) -> Option<usize> {
        let [x, y, z] = self.slot(point)?;
        let UVec3 { y: dy, z: dz, .. } = self.dimensions;
        Some(x * (dy as usize * dz as usize) + y * dz as usize + z)
    }

    /// Inverse of [`NavigationGrid::index_of`].
    pub fn coords_of(&self, index: usize) -> Option<GridPoint> {
        if index >= self.len() {
            return None;
        }

        let dy = self.dimensions.y as usize;
        let dz = self.dimensions.z as usize;
        let x = index / (dy * dz);
        let rem = index % (dy * dz);
        Some(GridPoint::new(x as i32, (rem / dz) as i32, (rem % dz) as i32))
    }

    /// Clamps `point` to `[0, max]` on each axis.
    pub fn clamp(&self, point: GridPoint) -> GridPoint {
        let max = self.max.max(IVec3::ZERO);
        GridPoint::from_ivec3(point.as_ivec3().clamp(IVec3::ZERO, max))
    }

    /// True if `point` lies within `[0, max]` on every axis.
    pub fn is_inside_bounds(&self, point: GridPoint) -> bool {
        let p = point.as_ivec3();
        p.cmpge(IVec3::ZERO).all() && p.cmple(self.max).all()
    }

    pub fn is_walkable(&self, point: GridPoint) -> bool {
        self.is_inside_bounds(point) && self.nearest_node(point).is_walkable()
    }

    /// Node at `point`, clamped into range.
    pub fn nearest_node(&self, point: GridPoint) -> &GridNode {
        let p = self.clamp(point);
        &self.nodes[Self::unchecked_slot(p)]
    }

    pub fn nearest_node_mut(&mut self, point: GridPoint) -> &mut GridNode {
        let p = self.clamp(point);
        &mut self.nodes[Self::unchecked_slot(p)]
    }

    /// Node containing the grid-local position `local`, clamped into range.
    pub fn nearest_node_to(&self, local: Vec3) -> &GridNode {
        self.nearest_node(self.to_grid_point(local))
    }

    /// Snaps a grid-local position and reports whether clamping was needed.
    pub fn nearest_node_info(&self, local: Vec3) -> NearestNodeInfo {
        let requested = self.to_grid_point(local);
        let point = self.clamp(requested);
        NearestNodeInfo {
            point,
            requested,
            exact: point == requested,
        }
    }

    pub fn node_at_index(&self, index: usize) -> Option<&GridNode> {
        let point = self.coords_of(index)?;
        Some(&self.nodes[Self::unchecked_slot(point)])
    }

    pub fn node_at_index_mut(&mut self, index: usize) -> Option<&mut GridNode> {
        let point = self.coords_of(index)?;
        Some(&mut self.nodes[Self::unchecked_slot(point)])
    }

    /// All cells within `distance` of `origin` on every axis, excluding `origin`,
    /// limited to the occupied range.
    pub fn neighbors(&self, origin: GridPoint, distance: i32) -> SmallVec<[GridPoint; 26]> {
        let mut neighbors = SmallVec::new();
        let lo = (origin.as_ivec3() - IVec3::splat(distance)).max(IVec3::ZERO);
        let hi = (origin.as_ivec3() + IVec3::splat(distance)).min(self.max);

        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    let point = GridPoint::new(x, y, z);
                    if point != origin {
                        neighbors.push(point);
                    }
                }
            }
        }

        neighbors
    }

    /// The 26-neighborhood of `origin`, limited to the array instead of the occupied range.
    pub(crate) fn adjacent(&self, origin: GridPoint) -> SmallVec<[GridPoint; 26]> {
        let mut neighbors = SmallVec::new();
        let last = self.dimensions.as_ivec3() - IVec3::ONE;
        let lo = (origin.as_ivec3() - IVec3::ONE).max(IVec3::ZERO);
        let hi = (origin.as_ivec3() + IVec3::ONE).min(last);

        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    let point = GridPoint::new(x, y, z);
                    if point != origin {
                        neighbors.push(point);
                    }
                }
            }
        }

        neighbors
    }

    /// Yields cells in cubic shells of growing radius around `origin`, up to `max_distance`.
    ///
    /// Within a shell the y axis is the outermost loop, so horizontal layers are
    /// visited before moving further vertically. The origin and the interior of each
    /// shell are skipped and cells outside the occupied range are left out.
    pub fn search_nodes(
        &self,
        origin: GridPoint,
        max_distance: i32,
    ) -> impl Iterator<Item = GridPoint> {
        let max = self.max;
        (1..=max_distance).flat_map(move |ring| {
            (origin.y - ring..=origin.y + ring)
                .filter(move |y| (0..=max.y).contains(y))
                .flat_map(move |y| {
                    (origin.x - ring..=origin.x + ring)
                        .filter(move |x| (0..=max.x).contains(x))
                        .flat_map(move |x| {
                            (origin.z - ring..=origin.z + ring)
                                .filter(move |z| (0..=max.z).contains(z))
                                .map(move |z| GridPoint::new(x, y, z))
                        })
                })
                .filter(move |p| p.chebyshev_distance(&origin) == ring)
        })
    }

    /// Cells in the half-open box `[min, max)`, clamped to the array.
    pub fn enumerate_range(&self, min: GridPoint, max: GridPoint) -> impl Iterator<Item = GridPoint> {
        let lo = min.as_ivec3().max(IVec3::ZERO);
        let hi = max.as_ivec3().min(self.dimensions.as_ivec3());
        (lo.x..hi.x).flat_map(move |x| {
            (lo.y..hi.y).flat_map(move |y| (lo.z..hi.z).map(move |z| GridPoint::new(x, y, z)))
        })
    }

    /// Finds the cell nearest to the world position `world` that carries any of `flags`.
    ///
    /// The cell the position snaps to is returned directly if it matches (an empty mask
    /// matches anything). Otherwise up to `max_rings` shells around it are searched.
    pub fn find_closest_node(
        &self,
        world: Vec3,
        flags: NodeFlags,
        max_rings: i32,
    ) -> Option<GridPoint> {
        let local = self.local_position(world);
        self.find_closest_to_local(local, flags, NodeFlags::empty(), max_rings)
    }

    /// Same as [`NavigationGrid::find_closest_node`], skipping cells that carry any of
    /// `blocked`.
    pub fn find_closest_unblocked_node(
        &self,
        world: Vec3,
        flags: NodeFlags,
        blocked: NodeFlags,
        max_rings: i32,
    ) -> Option<GridPoint> {
        let local = self.local_position(world);
        self.find_closest_to_local(local, flags, blocked, max_rings)
    }

    /// Same as [`NavigationGrid::find_closest_node`] starting from an existing node's navigable center.
    pub fn find_closest_node_to(
        &self,
        node: &GridNode,
        flags: NodeFlags,
        max_rings: i32,
    ) -> Option<GridPoint> {
        self.find_closest_to_local(node.navigable_center, flags, NodeFlags::empty(), max_rings)
    }

    fn find_closest_to_local(
        &self,
        local: Vec3,
        flags: NodeFlags,
        blocked: NodeFlags,
        max_rings: i32,
    ) -> Option<GridPoint> {
        let accepts = |point: GridPoint| {
            let node = self.nearest_node(point);
            (flags.is_empty() || node.has_flag(flags)) && !node.flags.intersects(blocked)
        };

        let info = self.nearest_node_info(local);
        if accepts(info.point) {
            return Some(info.point);
        }

        self.search_nodes(info.point, max_rings).find(|p| accepts(*p))
    }

    /// Overwrites the flags of every cell.
    pub fn set_all_flags(&mut self, flags: NodeFlags) {
        crate::timed!("Set all flags", {
            #[cfg(feature = "parallel")]
            self.nodes.par_map_inplace(|node| node.flags = flags);

            #[cfg(not(feature = "parallel"))]
            self.nodes.map_inplace(|node| node.flags = flags);
        });
    }

    /// Adds `flags` to every cell in the inclusive box `[min, max]`, clamped to the array.
    pub fn set_flags_in_range(&mut self, flags: NodeFlags, min: GridPoint, max: GridPoint) {
        let upper = GridPoint::from_ivec3(max.as_ivec3() + IVec3::ONE);
        let points: Vec<GridPoint> = self.enumerate_range(min, upper).collect();
        for point in points {
            self.nodes[Self::unchecked_slot(point)].add_flags(flags);
        }
    }

    /// Grid-local bounds covering every occupied cell.
    pub fn local_data_bounds(&self) -> Bounds {
        let min = self.min.min(self.max).as_vec3() * self.cell_size;
        let max = (self.max + IVec3::ONE).as_vec3() * self.cell_size;
        Bounds::from_min_max(min, max)
    }

    /// Allocates the id for a new search. Stamps from earlier searches never match it.
    ///
    /// Searches that run on the same grid must each hold their own id; the grid hands
    /// out a new one per call and never returns 0.
    pub fn next_query_id(&mut self) -> u32 {
        self.query_id = self.query_id.wrapping_add(1);
        if self.query_id == 0 {
            log::debug!("Query ids wrapped, resetting search state");
            self.nodes.map_inplace(|node| node.reset_search_state());
            self.query_id = 1;
        }
        self.query_id
    }

    /// Runs an A* search from `start` to `goal` through cells carrying any of
    /// `allow_flags` and none of `block_flags`.
    ///
    /// This allocates a fresh open set per call; keep a [`crate::pathfind::Pathfinder`]
    /// around to reuse one across searches.
    ///
    /// # Returns
    /// A [`Path`] with status [`crate::path::PathStatus::Complete`] when the goal was
    /// reached, or [`crate::path::PathStatus::Partial`] ending at the explored cell
    /// closest to the goal.
    pub fn pathfind(
        &mut self,
        start: GridPoint,
        goal: GridPoint,
        allow_flags: NodeFlags,
        block_flags: NodeFlags,
        areas: &AreaDefinitionSet,
    ) -> Path {
        let settings = PathfinderSettings {
            allow_flags,
            block_flags,
            ..Default::default()
        };
        let mut queue = MinPriorityQueue::with_capacity(settings.queue_capacity(self.len()));
        astar_grid(self, &mut queue, start, goal, areas, &settings)
    }

    /// Cells crossed by the straight line between two world positions.
    ///
    /// Both ends are clamped into the array first, so far away positions trace the
    /// same cells [`NavigationGrid::nearest_node`] would snap them to.
    pub fn ray_line(&self, from: Vec3, to: Vec3) -> impl Iterator<Item = GridPoint> {
        let from = self.clamp(self.to_grid_point(self.local_position(from)));
        let to = self.clamp(self.to_grid_point(self.local_position(to)));
        bresenham_line(from, to)
    }

    /// Cells crossed by the straight line between two cells.
    pub fn local_ray_line(&self, from: GridPoint, to: GridPoint) -> impl Iterator<Item = GridPoint> {
        bresenham_line(from, to)
    }

    /// True if every cell on the line between two world positions is walkable.
    /// Stops at the first cell that isn't.
    pub fn can_ray_walk(&self, from: Vec3, to: Vec3) -> bool {
        self.ray_line(from, to)
            .all(|p| self.nearest_node(p).is_walkable())
    }

    /// True if every cell on the line between two cells lies in the array and carries
    /// any of `flags`. Stops at the first cell that doesn't.
    pub fn can_local_ray_walk(&self, from: GridPoint, to: GridPoint, flags: NodeFlags) -> bool {
        bresenham_line(from, to).all(|p| {
            self.slot(p)
                .is_some_and(|slot| self.nodes[slot].has_flag(flags))
        })
    }

    /// Classifies every cell against a walkable surface.
    ///
    /// Each cell is reset to the grid's default flags (when those are non-empty) and
    /// sampled at its center. Cells whose sample lies horizontally close to the center
    /// get `settings.walkable_flags` and a navigable center snapped onto the surface;
    /// those close to a boundary edge additionally get `settings.near_edge_flags`.
    pub fn trace_surface<S: NavigableSurface>(
        &mut self,
        surface: &S,
        edges: &SurfaceEdges,
        settings: &SurfaceTraceSettings,
    ) {
        let transform = self.transform;
        let default_flags = self.default_flags;

        crate::timed!("Traced surface", {
            #[cfg(feature = "parallel")]
            self.nodes.par_map_inplace(|node| {
                trace_node(node, &transform, surface, edges, settings, default_flags)
            });

            #[cfg(not(feature = "parallel"))]
            self.nodes.map_inplace(|node| {
                trace_node(node, &transform, surface, edges, settings, default_flags)
            });
        });
    }

    pub(crate) fn node(&self, point: GridPoint) -> Option<&GridNode> {
        let slot = self.slot(point)?;
        Some(&self.nodes[slot])
    }

    pub(crate) fn node_mut(&mut self, point: GridPoint) -> Option<&mut GridNode> {
        let slot = self.slot(point)?;
        Some(&mut self.nodes[slot])
    }

    fn slot(&self, point: GridPoint) -> Option<[usize; 3]> {
        let p = point.as_ivec3();
        if p.cmplt(IVec3::ZERO).any() || p.cmpge(self.dimensions.as_ivec3()).any() {
            return None;
        }
        Some(Self::unchecked_slot(point))
    }

    // Callers guarantee the point is in the array.
    fn unchecked_slot(point: GridPoint) -> [usize; 3] {
        [point.x as usize, point.y as usize, point.z as usize]
    }
}
