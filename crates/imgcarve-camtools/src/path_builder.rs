//! Path Builder
//!
//! Assembles unordered feature points into ordered tool strokes.
//!
//! Without adjacency (edge mode) points are grouped into components of
//! points closer than the neighbor radius and each component is walked
//! greedily, always stepping to the nearest unvisited point. With adjacency
//! (centerline mode) the skeleton graph is split at endpoints and branch
//! points so every edge is traced by exactly one path; pure cycles come out
//! as closed paths.
//!
//! Isolated points cannot form a stroke and are returned separately as
//! dropped stubs.

use imgcarve_core::{Adjacency, ConfigurationError, Path, PathCollection, Point, PointSet, Result};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Neighbor radius that links 8-connected pixels and nothing further
pub const DEFAULT_NEIGHBOR_RADIUS: f64 = 1.5;

/// Output of path building
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltPaths {
    /// Strokes of two or more points
    pub paths: PathCollection,
    /// Points that could not be joined to any other point
    pub dropped_stubs: Vec<Point>,
}

/// Build paths, tracing the skeleton graph when adjacency is available
pub fn build_paths(
    points: &PointSet,
    adjacency: Option<&Adjacency>,
    neighbor_radius: f64,
) -> Result<BuiltPaths> {
    match adjacency {
        Some(adjacency) => build_centerline_paths(points, adjacency),
        None => build_edge_paths(points, neighbor_radius),
    }
}

/// Bucketed point lookup for radius queries
struct SpatialGrid {
    cell: f64,
    cells: HashMap<(i64, i64), Vec<Point>>,
}

impl SpatialGrid {
    fn new(points: &[Point], cell: f64) -> Self {
        let mut cells: HashMap<(i64, i64), Vec<Point>> = HashMap::new();
        for p in points {
            cells.entry(Self::key(p, cell)).or_default().push(*p);
        }
        Self { cell, cells }
    }

    fn key(p: &Point, cell: f64) -> (i64, i64) {
        ((p.x() / cell).floor() as i64, (p.y() / cell).floor() as i64)
    }

    /// Points within `self.cell` of `p`, excluding `p` itself
    fn within<'a>(&'a self, p: &'a Point) -> impl Iterator<Item = &'a Point> + 'a {
        let (cx, cy) = Self::key(p, self.cell);
        let radius_sq = self.cell * self.cell;
        (cx - 1..=cx + 1)
            .flat_map(move |x| (cy - 1..=cy + 1).map(move |y| (x, y)))
            .filter_map(move |k| self.cells.get(&k))
            .flatten()
            .filter(move |q| *q != p && q.distance_squared(p) <= radius_sq)
    }

    /// Closest point within radius accepted by `filter`; ties go to the smaller point
    fn nearest<F>(&self, p: &Point, filter: F) -> Option<Point>
    where
        F: Fn(&Point) -> bool,
    {
        self.within(p)
            .filter(|q| filter(*q))
            .min_by(|a, b| {
                a.distance_squared(p)
                    .total_cmp(&b.distance_squared(p))
                    .then_with(|| a.cmp(b))
            })
            .copied()
    }
}

/// Group points into components linked by the grid radius, each sorted
fn components(points: &PointSet, grid: &SpatialGrid) -> Vec<Vec<Point>> {
    let mut assigned: BTreeSet<Point> = BTreeSet::new();
    let mut result = Vec::new();

    for start in points {
        if assigned.contains(start) {
            continue;
        }
        let mut component = vec![*start];
        assigned.insert(*start);
        let mut stack = vec![*start];

        while let Some(p) = stack.pop() {
            for q in grid.within(&p) {
                if assigned.insert(*q) {
                    component.push(*q);
                    stack.push(*q);
                }
            }
        }
        component.sort();
        result.push(component);
    }
    result
}

/// Build strokes from edge points by greedy nearest-neighbor walks
pub fn build_edge_paths(points: &PointSet, neighbor_radius: f64) -> Result<BuiltPaths> {
    if !(neighbor_radius.is_finite() && neighbor_radius > 0.0) {
        return Err(ConfigurationError::InvalidValue {
            name: "neighbor_radius".to_string(),
            reason: format!("must be > 0 (got {})", neighbor_radius),
        }
        .into());
    }

    let all: Vec<Point> = points.iter().copied().collect();
    let grid = SpatialGrid::new(&all, neighbor_radius);
    let mut built = BuiltPaths::default();

    for component in components(points, &grid) {
        if component.len() == 1 {
            built.dropped_stubs.push(component[0]);
            continue;
        }

        let mut unvisited: BTreeSet<Point> = component.iter().copied().collect();
        let mut visited: BTreeSet<Point> = BTreeSet::new();

        while let Some(start) = unvisited.pop_first() {
            let mut stroke = Vec::new();
            if let Some(anchor) = grid.nearest(&start, |q| visited.contains(q)) {
                stroke.push(anchor);
            }
            stroke.push(start);
            visited.insert(start);

            let mut current = start;
            while let Some(next) = grid.nearest(&current, |q| unvisited.contains(q)) {
                unvisited.remove(&next);
                visited.insert(next);
                stroke.push(next);
                current = next;
            }

            let first = stroke[0];
            if stroke.len() >= 3
                && current != first
                && current.distance_squared(&first) <= neighbor_radius * neighbor_radius
            {
                stroke.push(first);
            }

            if stroke.len() >= 2 {
                built.paths.push(Path::new(stroke));
            } else {
                built.dropped_stubs.push(start);
            }
        }
    }

    report(&built, points.len(), "edge");
    Ok(built)
}

fn edge_key(a: Point, b: Point) -> (Point, Point) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Walk from `start` along unvisited edges, passing only through degree-2 nodes
/// when `through_chains` is set, otherwise until no unvisited edge remains.
fn trace(
    adjacency: &Adjacency,
    visited: &mut BTreeSet<(Point, Point)>,
    start: Point,
    first_step: Point,
    through_chains: bool,
) -> Path {
    visited.insert(edge_key(start, first_step));
    let mut points = vec![start, first_step];
    let mut current = first_step;

    while !through_chains || adjacency.degree(&current) == 2 {
        let next = adjacency
            .neighbors(&current)
            .find(|n| !visited.contains(&edge_key(current, **n)))
            .copied();
        match next {
            Some(next) => {
                visited.insert(edge_key(current, next));
                points.push(next);
                current = next;
            }
            None => break,
        }
    }
    Path::new(points)
}

/// Decompose a skeleton graph into paths covering every edge exactly once
pub fn build_centerline_paths(points: &PointSet, adjacency: &Adjacency) -> Result<BuiltPaths> {
    adjacency.validate(points)?;

    let mut built = BuiltPaths::default();
    let mut visited: BTreeSet<(Point, Point)> = BTreeSet::new();

    built.dropped_stubs = points
        .iter()
        .filter(|p| adjacency.degree(p) == 0)
        .copied()
        .collect();

    let endpoints = adjacency.nodes().filter(|p| adjacency.degree(p) == 1);
    let branches = adjacency.nodes().filter(|p| adjacency.degree(p) >= 3);
    let starts: Vec<Point> = endpoints.chain(branches).copied().collect();

    for start in starts {
        let steps: Vec<Point> = adjacency.neighbors(&start).copied().collect();
        for step in steps {
            if visited.contains(&edge_key(start, step)) {
                continue;
            }
            built
                .paths
                .push(trace(adjacency, &mut visited, start, step, true));
        }
    }

    // Remaining edges belong to components made only of degree-2 nodes
    let nodes: Vec<Point> = adjacency.nodes().copied().collect();
    for start in nodes {
        let step = adjacency
            .neighbors(&start)
            .find(|n| !visited.contains(&edge_key(start, **n)))
            .copied();
        if let Some(step) = step {
            built
                .paths
                .push(trace(adjacency, &mut visited, start, step, false));
        }
    }

    report(&built, points.len(), "centerline");
    Ok(built)
}

fn report(built: &BuiltPaths, input: usize, mode: &str) {
    if input == 0 {
        warn!("No feature points to build {} paths from", mode);
    }
    if !built.dropped_stubs.is_empty() {
        warn!(
            "Dropped {} single-point stub(s) while building {} paths",
            built.dropped_stubs.len(),
            mode
        );
    }
    debug!(
        "Built {} {} path(s) through {} points from {} input points",
        built.paths.len(),
        mode,
        built.paths.point_count(),
        input
    );
}
