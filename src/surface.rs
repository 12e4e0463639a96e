//! Classifying grid cells against a walkable surface such as a navigation mesh.
use bevy::{
    log,
    math::{IVec3, Vec3},
};

use crate::{flags::NodeFlags, node::GridNode, transform::GridTransform, FxIndexMap};

// Two vertices closer than this are the same vertex when matching triangle edges.
const VERTEX_WELD: f32 = 0.1;
// Edges further than this above or below a position are ignored.
const EDGE_VERTICAL_TOLERANCE: f32 = 0.5;

/// A source of walkable positions, usually a navigation mesh.
pub trait NavigableSurface: Sync {
    /// Closest walkable position to `world` within the box of half size `extents`
    /// around it, `None` if there is none.
    fn sample_position(&self, world: Vec3, extents: Vec3) -> Option<Vec3>;
}

impl<F> NavigableSurface for F
where
    F: Fn(Vec3, Vec3) -> Option<Vec3> + Sync,
{
    fn sample_position(&self, world: Vec3, extents: Vec3) -> Option<Vec3> {
        self(world, extents)
    }
}

/// A boundary segment of a walkable surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceEdge {
    pub start: Vec3,
    pub end: Vec3,
}

impl SurfaceEdge {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        SurfaceEdge { start, end }
    }

    pub fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize_or_zero()
    }

    /// Closest point on the segment to `point`.
    pub fn project(&self, point: Vec3) -> Vec3 {
        let segment = self.end - self.start;
        let length_squared = segment.length_squared();
        if length_squared <= f32::EPSILON {
            return self.start;
        }
        let t = ((point - self.start).dot(segment) / length_squared).clamp(0.0, 1.0);
        self.start + segment * t
    }
}

/// Result of [`SurfaceEdges::closest_edge`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    pub edge: SurfaceEdge,
    /// Horizontal manhattan distance to `position`.
    pub distance: f32,
    /// Closest point on the edge.
    pub position: Vec3,
}

/// The outside edges of a triangulated surface.
///
/// Build it once from the surface triangles and rebuild it whenever the surface
/// changes; it is passed explicitly to [`crate::grid::NavigationGrid::trace_surface`].
#[derive(Debug, Clone, Default)]
pub struct SurfaceEdges {
    edges: Vec<SurfaceEdge>,
}

impl SurfaceEdges {
    /// Collects the edges used by exactly one triangle of an indexed triangle list.
    /// Vertices are matched by position so duplicated vertices still share edges.
    pub fn from_triangles(vertices: &[Vec3], indices: &[u32]) -> Self {
        let mut open: FxIndexMap<(IVec3, IVec3), SurfaceEdge> = FxIndexMap::default();
        let mut skipped = 0;

        for triangle in indices.chunks_exact(3) {
            let corners: Option<Vec<Vec3>> = triangle
                .iter()
                .map(|i| vertices.get(*i as usize).copied())
                .collect();
            let Some(corners) = corners else {
                skipped += 1;
                continue;
            };

            for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                let edge = SurfaceEdge::new(corners[a], corners[b]);
                let key = edge_key(edge.start, edge.end);
                if open.shift_remove(&key).is_none() {
                    open.insert(key, edge);
                }
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} triangles with out of range indices", skipped);
        }

        let edges: Vec<SurfaceEdge> = open.into_values().collect();
        log::debug!("Collected {} surface edges", edges.len());

        SurfaceEdges { edges }
    }

    pub fn from_edges(edges: Vec<SurfaceEdge>) -> Self {
        SurfaceEdges { edges }
    }

    pub fn edges(&self) -> &[SurfaceEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The edge horizontally closest to `position`, ignoring edges whose closest
    /// point is more than half a unit above or below it.
    pub fn closest_edge(&self, position: Vec3) -> Option<EdgeHit> {
        let mut best: Option<EdgeHit> = None;

        for edge in &self.edges {
            let nearest = edge.project(position);
            let distance = manhattan_xz(nearest, position);

            if best.is_some_and(|b| distance >= b.distance) {
                continue;
            }
            if (nearest.y - position.y).abs() > EDGE_VERTICAL_TOLERANCE {
                continue;
            }

            best = Some(EdgeHit {
                edge: *edge,
                distance,
                position: nearest,
            });
        }

        best
    }
}

fn manhattan_xz(a: Vec3, b: Vec3) -> f32 {
    (a.x - b.x).abs() + (a.z - b.z).abs()
}

fn edge_key(a: Vec3, b: Vec3) -> (IVec3, IVec3) {
    let a = (a / VERTEX_WELD).round().as_ivec3();
    let b = (b / VERTEX_WELD).round().as_ivec3();
    if a.to_array() <= b.to_array() {
        (a, b)
    } else {
        (b, a)
    }
}

/// Settings for [`crate::grid::NavigationGrid::trace_surface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTraceSettings {
    /// Added to cells whose center sits on the surface.
    pub walkable_flags: NodeFlags,
    /// Added to walkable cells close to a surface edge.
    pub near_edge_flags: NodeFlags,
    /// How close to an edge a walkable cell has to be to count as near it.
    pub edge_width: f32,
    /// Largest horizontal offset between a cell center and its surface sample,
    /// as a fraction of the cell half size.
    pub alignment: f32,
    /// Edges closer than this fraction of the cell half size are treated as
    /// lying inside the cell.
    pub edge_adjustment: f32,
}

impl Default for SurfaceTraceSettings {
    fn default() -> Self {
        SurfaceTraceSettings {
            walkable_flags: NodeFlags::NAVIGATION,
            near_edge_flags: NodeFlags::NEAR_EDGE,
            edge_width: 0.2,
            alignment: 0.15,
            edge_adjustment: 0.95,
        }
    }
}

pub(crate) fn trace_node<S: NavigableSurface + ?Sized>(
    node: &mut GridNode,
    transform: &GridTransform,
    surface: &S,
    edges: &SurfaceEdges,
    settings: &SurfaceTraceSettings,
    default_flags: NodeFlags,
) {
    if !default_flags.is_empty() {
        node.flags = default_flags;
    }

    let world = transform.world_position(node.center);
    let extents = node.bounds.extents;

    let Some(hit) = surface.sample_position(world, extents) else {
        return;
    };

    let tolerance = extents.x * settings.alignment;
    if (hit.x - world.x).abs() >= tolerance || (hit.z - world.z).abs() >= tolerance {
        return;
    }

    node.flags |= settings.walkable_flags;
    node.navigable_center = transform.local_position(hit);

    let Some(edge) = edges.closest_edge(hit) else {
        return;
    };

    let distance = if edge.distance < extents.x * settings.edge_adjustment {
        edge.distance - extents.x
    } else {
        edge.distance
    };

    if distance <= settings.edge_width {
        node.flags |= settings.near_edge_flags;
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::Quat;

    use super::*;
    use crate::{grid::GridSettingsBuilder, grid::NavigationGrid, point::GridPoint};

    /// A horizontal rectangle at y = 0.
    struct Plane {
        min: Vec3,
        max: Vec3,
    }

    impl Plane {
        fn corners(&self) -> Vec<Vec3> {
            vec![
                Vec3::new(self.min.x, 0.0, self.min.z),
                Vec3::new(self.max.x, 0.0, self.min.z),
                Vec3::new(self.max.x, 0.0, self.max.z),
                Vec3::new(self.min.x, 0.0, self.max.z),
            ]
        }

        fn edges(&self) -> SurfaceEdges {
            SurfaceEdges::from_triangles(&self.corners(), &[0, 1, 2, 0, 2, 3])
        }
    }

    impl NavigableSurface for Plane {
        fn sample_position(&self, world: Vec3, extents: Vec3) -> Option<Vec3> {
            let on_plane = Vec3::new(world.x, 0.0, world.z).clamp(self.min, self.max);
            let offset = (on_plane - world).abs();
            offset.cmple(extents).all().then_some(on_plane)
        }
    }

    fn plane() -> Plane {
        Plane {
            min: Vec3::new(0.25, 0.0, 0.25),
            max: Vec3::new(5.25, 0.0, 9.75),
        }
    }

    #[test]
    fn test_outside_edges() {
        let edges = plane().edges();
        // The shared diagonal is dropped.
        assert_eq!(edges.len(), 4);
        assert!(edges
            .edges()
            .iter()
            .all(|e| e.start.x == e.end.x || e.start.z == e.end.z));
    }

    #[test]
    fn test_welded_vertices_share_edges() {
        let vertices = [
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 0.0, 1.0),
            // Duplicates of 0 and 2 with float noise.
            Vec3::new(0.001, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.999),
            Vec3::Z,
        ];
        let edges = SurfaceEdges::from_triangles(&vertices, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(edges.len(), 4);
    }

    #[test]
    fn test_out_of_range_triangle_skipped() {
        let edges = SurfaceEdges::from_triangles(&[Vec3::ZERO, Vec3::X], &[0, 1, 2]);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_closest_edge() {
        let edges = plane().edges();
        let hit = edges.closest_edge(Vec3::new(1.0, 0.0, 5.0)).unwrap();
        assert_eq!(hit.distance, 0.75);
        assert_eq!(hit.position, Vec3::new(0.25, 0.0, 5.0));

        // Too far above every edge.
        assert!(edges.closest_edge(Vec3::new(1.0, 2.0, 5.0)).is_none());
        assert!(SurfaceEdges::default().closest_edge(Vec3::ZERO).is_none());
    }

    #[test]
    fn test_project_onto_segment() {
        let edge = SurfaceEdge::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(edge.project(Vec3::new(1.0, 0.0, 3.0)), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(edge.project(Vec3::new(-4.0, 0.0, 0.0)), Vec3::ZERO);
        assert_eq!(edge.project(Vec3::new(9.0, 1.0, 0.0)), Vec3::new(2.0, 0.0, 0.0));

        let degenerate = SurfaceEdge::new(Vec3::ONE, Vec3::ONE);
        assert_eq!(degenerate.project(Vec3::ZERO), Vec3::ONE);
    }

    #[test]
    fn test_trace_surface() {
        let surface = plane();
        let mut grid =
            NavigationGrid::create(10, 2, 10, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 1.0).unwrap();

        grid.trace_surface(&surface, &surface.edges(), &SurfaceTraceSettings::default());

        let navigable: Vec<GridPoint> = grid
            .view()
            .iter()
            .filter(|n| n.has_flag(NodeFlags::NAVIGATION))
            .map(|n| n.point)
            .collect();
        assert_eq!(navigable.len(), 5 * 10);
        assert!(navigable.iter().all(|p| p.y == 0 && p.x <= 4));

        // Snapped down onto the plane.
        let node = grid.nearest_node(GridPoint::new(2, 0, 2));
        assert_eq!(node.navigable_center, Vec3::new(2.5, 0.0, 2.5));
        assert_eq!(node.center, Vec3::new(2.5, 0.5, 2.5));

        // The sample for x = 5 is clamped a quarter cell away from its center.
        assert!(!grid
            .nearest_node(GridPoint::new(5, 0, 3))
            .has_flag(NodeFlags::NAVIGATION));

        let near_edge = grid
            .view()
            .iter()
            .filter(|n| n.has_flag(NodeFlags::NEAR_EDGE))
            .count();
        // The x = 0 column plus the z = 0 and z = 9 rows.
        assert_eq!(near_edge, 10 + 2 * 4);
        assert!(grid
            .nearest_node(GridPoint::new(0, 0, 4))
            .has_flag(NodeFlags::NEAR_EDGE));
        assert!(!grid
            .nearest_node(GridPoint::new(4, 0, 4))
            .has_flag(NodeFlags::NEAR_EDGE));
    }

    #[test]
    fn test_trace_resets_to_default_flags() {
        let settings = GridSettingsBuilder::new(4, 1, 4)
            .default_flags(NodeFlags::ALLOW_FLIER)
            .build();
        let mut grid = NavigationGrid::new(&settings);
        grid.set_all_flags(NodeFlags::OBSTACLE);

        let nothing = |_: Vec3, _: Vec3| -> Option<Vec3> { None };
        grid.trace_surface(&nothing, &SurfaceEdges::default(), &SurfaceTraceSettings::default());

        assert!(grid.view().iter().all(|n| n.flags == NodeFlags::ALLOW_FLIER));
    }

    #[test]
    fn test_trace_keeps_flags_without_default() {
        let mut grid =
            NavigationGrid::create(4, 1, 4, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 1.0).unwrap();
        grid.set_all_flags(NodeFlags::OBSTACLE);

        let flat = |world: Vec3, _: Vec3| Some(Vec3::new(world.x, 0.0, world.z));
        let settings = SurfaceTraceSettings {
            walkable_flags: NodeFlags::ALLOW_WALK,
            ..Default::default()
        };
        grid.trace_surface(&flat, &SurfaceEdges::default(), &settings);

        assert!(grid
            .view()
            .iter()
            .all(|n| n.flags == NodeFlags::OBSTACLE | NodeFlags::ALLOW_WALK));
    }

    #[test]
    fn test_trace_translated_grid() {
        let surface = plane();
        let mut grid = NavigationGrid::create(
            4,
            1,
            4,
            Vec3::new(1.0, 0.0, 0.0),
            Quat::IDENTITY,
            Vec3::ONE,
            1.0,
        )
        .unwrap();

        grid.trace_surface(&surface, &surface.edges(), &SurfaceTraceSettings::default());

        // World x of cell 3 is 4.5, still on the plane. Navigable centers stay local.
        let node = grid.nearest_node(GridPoint::new(3, 0, 1));
        assert!(node.has_flag(NodeFlags::NAVIGATION));
        assert_eq!(node.navigable_center, Vec3::new(3.5, 0.0, 1.5));
    }
}
