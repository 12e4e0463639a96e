//! A* search over a [`NavigationGrid`].
use bevy::{log, math::Vec3};

use crate::{
    area::AreaDefinitionSet,
    grid::NavigationGrid,
    path::{Path, PathStatus},
    pathfind::PathfinderSettings,
    point::GridPoint,
    queue::MinPriorityQueue,
};

/// A* search across the 26-neighborhood of each cell.
///
/// Search state lives on the grid cells and is stamped with a fresh query id, so
/// nothing needs resetting between searches. Step cost is the distance between
/// navigable centers minus the weights of the areas the current cell belongs to.
/// The heuristic is the straight line distance to the goal's navigable center.
///
/// # Arguments
/// * `grid` - The grid to search. Only the search fields of its cells are written.
/// * `queue` - Open set, cleared before use.
/// * `start` - The starting cell, clamped into the grid.
/// * `goal` - The goal cell, clamped into the grid.
/// * `areas` - Area weights.
/// * `settings` - Allow and block masks, path length cap and cost clamping.
///
/// # Returns
/// * A [`Path`] with [`PathStatus::Complete`] if the goal was reached, otherwise a
///   [`PathStatus::Partial`] path to the explored cell nearest the goal.
pub(crate) fn astar_grid(
    grid: &mut NavigationGrid,
    queue: &mut MinPriorityQueue,
    start: GridPoint,
    goal: GridPoint,
    areas: &AreaDefinitionSet,
    settings: &PathfinderSettings,
) -> Path {
    let start = clamp_endpoint(grid, start, "Start");
    let goal = clamp_endpoint(grid, goal, "Goal");
    let allow_flags = settings.allow_flags;
    let block_flags = settings.block_flags;

    crate::timed!("A* search", {
        let query = grid.next_query_id();
        queue.clear();

        let Some(goal_center) = grid.node(goal).map(|n| n.navigable_center) else {
            return Path::default();
        };

        let mut closest = start;
        let mut closest_h;
        {
            let Some(node) = grid.node_mut(start) else {
                return Path::default();
            };
            let h = node.navigable_center.distance(goal_center);
            node.g_score = 0.0;
            node.h_score = h;
            node.f_score = h;
            node.parent = start;
            node.open_id = query;
            closest_h = h;
        }
        queue.enqueue(start, closest_h);

        let mut expanded = 0usize;

        while let Some(point) = queue.dequeue() {
            let (current_center, current_flags, current_g) = {
                let Some(current) = grid.node_mut(point) else {
                    continue;
                };
                // Stale duplicate of a cell that was already expanded.
                if current.closed_id == query {
                    continue;
                }
                current.open_id = query;
                current.closed_id = query;
                (current.navigable_center, current.flags, current.g_score)
            };
            expanded += 1;

            if point == goal {
                log::debug!("Reached goal {:?} after expanding {} cells", goal, expanded);
                return retrace(grid, start, goal, PathStatus::Complete, settings);
            }

            for neighbor in grid.adjacent(point) {
                let Some(node) = grid.node_mut(neighbor) else {
                    continue;
                };

                if !node.flags.intersects(allow_flags)
                    || node.flags.intersects(block_flags)
                    || node.closed_id == query
                {
                    continue;
                }

                let distance = current_center.distance(node.navigable_center);
                let mut step = distance - areas.modifier(current_flags, distance);
                if settings.clamp_negative_costs {
                    step = step.max(0.0);
                }
                let new_g = current_g + step;

                let is_open = node.open_id == query;
                if is_open && new_g >= node.g_score {
                    continue;
                }

                let h = node.navigable_center.distance(goal_center);
                node.g_score = new_g;
                node.h_score = h;
                node.f_score = new_g + h;
                node.parent = point;
                node.open_id = query;

                if h < closest_h {
                    closest = neighbor;
                    closest_h = h;
                }

                // Improved cells are queued again; the old entry is skipped once closed.
                queue.enqueue(neighbor, new_g + h);
            }
        }

        log::debug!(
            "Goal {:?} unreachable after expanding {} cells, ending at {:?}",
            goal,
            expanded,
            closest
        );
        retrace(grid, start, closest, PathStatus::Partial, settings)
    })
}

fn clamp_endpoint(grid: &NavigationGrid, point: GridPoint, name: &str) -> GridPoint {
    if grid.index_of(point).is_some() {
        return point;
    }
    let clamped = grid.clamp(point);
    log::warn!("{} {:?} is out of bounds, using {:?}", name, point, clamped);
    clamped
}

fn retrace(
    grid: &NavigationGrid,
    start: GridPoint,
    end: GridPoint,
    status: PathStatus,
    settings: &PathfinderSettings,
) -> Path {
    let cost = grid.node(end).map(|n| n.g_score).unwrap_or_default();

    let mut cells = Vec::new();
    let mut current = end;
    while current != start && cells.len() < settings.max_path_points {
        cells.push(current);
        match grid.node(current) {
            Some(node) => current = node.parent,
            None => break,
        }
    }

    if cells.len() >= settings.max_path_points {
        log::warn!(
            "Path from {:?} to {:?} truncated at {} points",
            start,
            end,
            settings.max_path_points
        );
    }

    cells.push(start);
    cells.reverse();

    let points: Vec<Vec3> = cells
        .iter()
        .filter_map(|p| grid.node(*p))
        .map(|node| grid.world_position(node.navigable_center))
        .collect();

    Path::new(status, cells, points, cost)
}

#[cfg(test)]
mod tests {
    use bevy::math::{Quat, Vec3};

    use super::*;
    use crate::{
        flags::NodeFlags,
        grid::{GridSettingsBuilder, NavigationGrid},
    };

    fn grid(x: u32, y: u32, z: u32) -> NavigationGrid {
        let settings = GridSettingsBuilder::new(x, y, z)
            .default_flags(NodeFlags::ALLOW_WALK)
            .build();
        NavigationGrid::new(&settings)
    }

    fn search(grid: &mut NavigationGrid, start: GridPoint, goal: GridPoint) -> Path {
        search_with(grid, start, goal, &AreaDefinitionSet::default(), &PathfinderSettings::default())
    }

    fn search_with(
        grid: &mut NavigationGrid,
        start: GridPoint,
        goal: GridPoint,
        areas: &AreaDefinitionSet,
        settings: &PathfinderSettings,
    ) -> Path {
        let mut queue = MinPriorityQueue::with_capacity(64);
        astar_grid(grid, &mut queue, start, goal, areas, settings)
    }

    fn assert_contiguous(path: &Path) {
        assert!(path
            .cells()
            .windows(2)
            .all(|w| w[0].chebyshev_distance(&w[1]) == 1));
    }

    #[test]
    fn test_straight_line() {
        let mut grid = grid(10, 1, 10);
        let path = search(&mut grid, GridPoint::new(0, 0, 0), GridPoint::new(9, 0, 0));

        assert_eq!(path.status(), PathStatus::Complete);
        assert_eq!(path.len(), 10);
        assert_eq!(path.first(), Some(GridPoint::new(0, 0, 0)));
        assert_eq!(path.last(), Some(GridPoint::new(9, 0, 0)));
        assert!((path.cost() - 9.0).abs() < 1e-4);
        assert_contiguous(&path);
    }

    #[test]
    fn test_diagonal_within_bound() {
        let mut grid = grid(10, 10, 10);
        let path = search(&mut grid, GridPoint::new(0, 0, 0), GridPoint::new(9, 0, 9));

        assert_eq!(path.status(), PathStatus::Complete);
        assert_contiguous(&path);
        let straight = Vec3::new(9.0, 0.0, 9.0).length();
        assert!(path.cost() <= straight * std::f32::consts::SQRT_2 + 1e-3);
        assert_eq!(path.points().len(), path.len());
        assert_eq!(path.next(), Some(Vec3::new(0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_start_is_goal() {
        let mut grid = grid(4, 4, 4);
        let path = search(&mut grid, GridPoint::new(2, 1, 2), GridPoint::new(2, 1, 2));
        assert_eq!(path.status(), PathStatus::Complete);
        assert_eq!(path.cells(), &[GridPoint::new(2, 1, 2)]);
        assert_eq!(path.cost(), 0.0);
    }

    #[test]
    fn test_avoids_obstacle() {
        let mut grid = grid(10, 1, 10);
        // A wall across x = 5 with a gap at z = 9.
        for z in 0..9 {
            grid.nearest_node_mut(GridPoint::new(5, 0, z))
                .remove_flags(NodeFlags::ALLOW_WALK);
        }

        let path = search(&mut grid, GridPoint::new(0, 0, 0), GridPoint::new(9, 0, 0));
        assert_eq!(path.status(), PathStatus::Complete);
        assert_contiguous(&path);
        assert!(path.contains(GridPoint::new(5, 0, 9)));
        assert!(path
            .cells()
            .iter()
            .all(|p| grid.nearest_node(*p).is_walkable()));
    }

    #[test]
    fn test_block_flags_mask_out_walkable_cells() {
        let mut grid = grid(10, 1, 10);
        for z in 0..9 {
            grid.nearest_node_mut(GridPoint::new(5, 0, z))
                .add_flags(NodeFlags::OBSTACLE);
        }

        let open = search(&mut grid, GridPoint::new(0, 0, 0), GridPoint::new(9, 0, 0));
        assert_eq!(open.len(), 10);

        let settings = PathfinderSettings {
            block_flags: NodeFlags::OBSTACLE,
            ..Default::default()
        };
        let path = search_with(
            &mut grid,
            GridPoint::new(0, 0, 0),
            GridPoint::new(9, 0, 0),
            &AreaDefinitionSet::default(),
            &settings,
        );
        assert_eq!(path.status(), PathStatus::Complete);
        assert!(path.contains(GridPoint::new(5, 0, 9)));
        assert!(path
            .cells()
            .iter()
            .all(|p| !grid.nearest_node(*p).has_flag(NodeFlags::OBSTACLE)));
    }

    #[test]
    fn test_partial_ends_near_goal() {
        let mut grid = grid(10, 1, 10);
        for z in 0..10 {
            grid.nearest_node_mut(GridPoint::new(5, 0, z))
                .remove_flags(NodeFlags::ALLOW_WALK);
        }

        let path = search(&mut grid, GridPoint::new(0, 0, 5), GridPoint::new(9, 0, 5));
        assert_eq!(path.status(), PathStatus::Partial);
        assert_eq!(path.first(), Some(GridPoint::new(0, 0, 5)));
        assert_eq!(path.last(), Some(GridPoint::new(4, 0, 5)));
        assert_contiguous(&path);
    }

    #[test]
    fn test_partial_boxed_in_start() {
        let mut grid = grid(3, 1, 3);
        grid.set_all_flags(NodeFlags::empty());
        grid.nearest_node_mut(GridPoint::new(1, 0, 1))
            .add_flags(NodeFlags::ALLOW_WALK);

        let path = search(&mut grid, GridPoint::new(1, 0, 1), GridPoint::new(2, 0, 2));
        assert_eq!(path.status(), PathStatus::Partial);
        assert_eq!(path.cells(), &[GridPoint::new(1, 0, 1)]);
    }

    #[test]
    fn test_out_of_bounds_endpoints_clamped() {
        let mut grid = grid(5, 1, 5);
        let path = search(&mut grid, GridPoint::new(-3, 0, 0), GridPoint::new(4, 0, 12));
        assert_eq!(path.status(), PathStatus::Complete);
        assert_eq!(path.first(), Some(GridPoint::new(0, 0, 0)));
        assert_eq!(path.last(), Some(GridPoint::new(4, 0, 4)));
    }

    #[test]
    fn test_repeated_searches_reuse_grid() {
        let mut grid = grid(8, 1, 8);
        let first = search(&mut grid, GridPoint::new(0, 0, 0), GridPoint::new(7, 0, 7));
        let second = search(&mut grid, GridPoint::new(0, 0, 0), GridPoint::new(7, 0, 7));
        assert_eq!(first, second);

        let back = search(&mut grid, GridPoint::new(7, 0, 7), GridPoint::new(0, 0, 0));
        assert_eq!(back.len(), first.len());
        assert_eq!(back.status(), PathStatus::Complete);
    }

    #[test]
    fn test_area_weight_repels_path() {
        let mut grid = grid(9, 1, 3);
        for x in 1..8 {
            grid.nearest_node_mut(GridPoint::new(x, 0, 1))
                .add_flags(NodeFlags::AVOIDANCE);
        }
        let areas: AreaDefinitionSet = [(NodeFlags::AVOIDANCE, -2.0)].into_iter().collect();

        let plain = search(&mut grid, GridPoint::new(0, 0, 1), GridPoint::new(8, 0, 1));
        assert!(plain.contains(GridPoint::new(4, 0, 1)));

        let weighted = search_with(
            &mut grid,
            GridPoint::new(0, 0, 1),
            GridPoint::new(8, 0, 1),
            &areas,
            &PathfinderSettings::default(),
        );
        assert_eq!(weighted.status(), PathStatus::Complete);
        assert_contiguous(&weighted);
        assert!((1..8).all(|x| !weighted.contains(GridPoint::new(x, 0, 1))));
        assert!(weighted.cost() > plain.cost());
    }

    #[test]
    fn test_clamped_negative_costs() {
        let mut grid = grid(6, 1, 1);
        grid.set_all_flags(NodeFlags::ALLOW_WALK | NodeFlags::COMBAT);
        let areas: AreaDefinitionSet = [(NodeFlags::COMBAT, 2.0)].into_iter().collect();

        let free = search_with(
            &mut grid,
            GridPoint::new(0, 0, 0),
            GridPoint::new(5, 0, 0),
            &areas,
            &PathfinderSettings::default(),
        );
        assert_eq!(free.status(), PathStatus::Complete);
        assert!(free.cost() < 0.0);

        let settings = PathfinderSettings {
            clamp_negative_costs: true,
            ..Default::default()
        };
        let clamped = search_with(
            &mut grid,
            GridPoint::new(0, 0, 0),
            GridPoint::new(5, 0, 0),
            &areas,
            &settings,
        );
        assert_eq!(clamped.status(), PathStatus::Complete);
        assert_eq!(clamped.cost(), 0.0);
    }

    #[test]
    fn test_max_path_points() {
        let mut grid = grid(20, 1, 1);
        let settings = PathfinderSettings {
            max_path_points: 5,
            ..Default::default()
        };
        let path = search_with(
            &mut grid,
            GridPoint::new(0, 0, 0),
            GridPoint::new(19, 0, 0),
            &AreaDefinitionSet::default(),
            &settings,
        );
        // Five cells back from the goal, then the start.
        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(GridPoint::new(0, 0, 0)));
        assert_eq!(path.last(), Some(GridPoint::new(19, 0, 0)));
    }

    #[test]
    fn test_world_points_follow_transform() {
        let settings = GridSettingsBuilder::new(4, 1, 1)
            .position(Vec3::new(10.0, 0.0, 0.0))
            .rotation(Quat::IDENTITY)
            .default_flags(NodeFlags::ALLOW_WALK)
            .build();
        let mut grid = NavigationGrid::new(&settings);

        let path = search(&mut grid, GridPoint::new(0, 0, 0), GridPoint::new(3, 0, 0));
        let points: Vec<Vec3> = path.points().iter().copied().collect();
        assert_eq!(points[0], Vec3::new(10.5, 0.5, 0.5));
        assert_eq!(points[3], Vec3::new(13.5, 0.5, 0.5));
    }
}
