//! Geometry data model
//!
//! Pixel-space points, unordered feature point sets, centerline adjacency
//! graphs and ordered tool strokes. Every coordinate in this module is in
//! source-image pixels; conversion to machine units happens in the generator.

use crate::error::TopologyError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A pixel-space coordinate.
///
/// Equality, hashing and ordering are by coordinate. The total order is
/// lexicographic on `(x, y)` and is the tie-break used by every stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Create a point. `-0.0` is normalized to `0.0` so equal points hash equally.
    pub fn new(x: f64, y: f64) -> Self {
        debug_assert!(
            x.is_finite() && y.is_finite(),
            "Point coordinates must be finite: x={x}, y={y}"
        );
        Self {
            x: x + 0.0,
            y: y + 0.0,
        }
    }

    /// Create a point at the given pixel column and row
    pub fn from_pixel(x: u32, y: u32) -> Self {
        Self::new(x as f64, y as f64)
    }

    /// Horizontal position (pixels from left edge)
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Vertical position (pixels from top edge)
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Squared Euclidean distance to another point
    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Distance from this point to the infinite line through `a` and `b`.
    ///
    /// Falls back to the distance to `a` when the chord is degenerate
    /// (`a == b`), which is what closed paths need.
    pub fn perpendicular_distance(&self, a: &Point, b: &Point) -> f64 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.distance(a);
        }
        ((self.x - a.x) * dy - (self.y - a.y) * dx).abs() / len_sq.sqrt()
    }

    /// Scale both coordinates by a linear factor
    pub fn scaled(&self, factor: f64) -> (f64, f64) {
        (self.x * factor, self.y * factor)
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An unordered set of unique feature points.
///
/// Backed by a `BTreeSet`, so iteration is always in `Point` order and every
/// stage consuming a `PointSet` is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointSet {
    points: BTreeSet<Point>,
}

impl PointSet {
    /// Create an empty point set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a point, returning false if it was already present
    pub fn insert(&mut self, point: Point) -> bool {
        self.points.insert(point)
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.points.contains(point)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate in `Point` order
    pub fn iter(&self) -> impl Iterator<Item = &Point> + '_ {
        self.points.iter()
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PointSet {
    type Item = Point;
    type IntoIter = std::collections::btree_set::IntoIter<Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point;
    type IntoIter = std::collections::btree_set::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Undirected adjacency between centerline points.
///
/// Edges are stored in both directions. Isolated points keep an empty entry
/// so their degree can be queried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    neighbors: BTreeMap<Point, BTreeSet<Point>>,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a point with no neighbors (no-op if already present)
    pub fn add_node(&mut self, point: Point) {
        self.neighbors.entry(point).or_default();
    }

    /// Link two points in both directions
    pub fn add_edge(&mut self, a: Point, b: Point) {
        if a == b {
            return;
        }
        self.neighbors.entry(a).or_default().insert(b);
        self.neighbors.entry(b).or_default().insert(a);
    }

    /// Record a one-directional neighbor claim.
    ///
    /// Used when importing adjacency lists produced elsewhere; `validate`
    /// reports any claim that does not resolve to a known point.
    pub fn insert_claim(&mut self, point: Point, neighbor: Point) {
        self.neighbors.entry(point).or_default().insert(neighbor);
    }

    /// Neighbors of a point in `Point` order
    pub fn neighbors(&self, point: &Point) -> impl Iterator<Item = &Point> + '_ {
        self.neighbors.get(point).into_iter().flatten()
    }

    pub fn degree(&self, point: &Point) -> usize {
        self.neighbors.get(point).map_or(0, BTreeSet::len)
    }

    pub fn contains_edge(&self, a: &Point, b: &Point) -> bool {
        self.neighbors.get(a).is_some_and(|set| set.contains(b))
    }

    /// All nodes in `Point` order
    pub fn nodes(&self) -> impl Iterator<Item = &Point> + '_ {
        self.neighbors.keys()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.neighbors
            .iter()
            .flat_map(|(p, set)| set.iter().map(move |n| (p, n)))
            .filter(|(p, n)| p < n)
            .count()
    }

    /// Check that every node and every claimed neighbor belongs to `points`
    pub fn validate(&self, points: &PointSet) -> Result<(), TopologyError> {
        for (point, set) in &self.neighbors {
            if !points.contains(point) {
                return Err(TopologyError::UnknownNode { point: *point });
            }
            for neighbor in set {
                if !points.contains(neighbor) {
                    return Err(TopologyError::MissingNeighbor {
                        point: *point,
                        neighbor: *neighbor,
                    });
                }
            }
        }
        Ok(())
    }
}

/// An ordered tool stroke through pixel-space points.
///
/// A path is closed when its first and last points coincide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Point>,
}

impl Path {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True for paths of at least three points whose ends coincide
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 3 && self.points.first() == self.points.last()
    }
}

impl FromIterator<Point> for Path {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// An ordered sequence of paths, carved in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathCollection {
    paths: Vec<Path>,
}

impl PathCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: Path) {
        self.paths.push(path);
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Path> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Total number of points across all paths (shared endpoints counted per path)
    pub fn point_count(&self) -> usize {
        self.paths.iter().map(Path::len).sum()
    }

    /// Union of the points of every path
    pub fn point_set(&self) -> PointSet {
        self.paths
            .iter()
            .flat_map(|p| p.points().iter().copied())
            .collect()
    }
}

impl From<Vec<Path>> for PathCollection {
    fn from(paths: Vec<Path>) -> Self {
        Self { paths }
    }
}

impl FromIterator<Path> for PathCollection {
    fn from_iter<I: IntoIterator<Item = Path>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PathCollection {
    type Item = Path;
    type IntoIter = std::vec::IntoIter<Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl<'a> IntoIterator for &'a PathCollection {
    type Item = &'a Path;
    type IntoIter = std::slice::Iter<'a, Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_point_equality_ignores_signed_zero() {
        let a = Point::new(0.0, -0.0);
        let b = Point::new(-0.0, 0.0);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_point_order_is_lexicographic() {
        let mut points = vec![
            Point::new(1.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(0.0, 1.0),
        ];
        points.sort();
        assert_eq!(
            points,
            vec![
                Point::new(0.0, 1.0),
                Point::new(0.0, 5.0),
                Point::new(1.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_perpendicular_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(Point::new(5.0, 3.0).perpendicular_distance(&a, &b), 3.0);
        // Degenerate chord measures straight to the anchor
        assert_eq!(Point::new(3.0, 4.0).perpendicular_distance(&a, &a), 5.0);
    }

    #[test]
    fn test_adjacency_validation() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        let points: PointSet = [a, b].into_iter().collect();

        let mut adjacency = Adjacency::new();
        adjacency.add_edge(a, b);
        assert!(adjacency.validate(&points).is_ok());
        assert_eq!(adjacency.edge_count(), 1);

        let ghost = Point::new(5.0, 5.0);
        adjacency.insert_claim(a, ghost);
        assert_eq!(
            adjacency.validate(&points),
            Err(TopologyError::MissingNeighbor {
                point: a,
                neighbor: ghost
            })
        );
    }

    #[test]
    fn test_path_closed() {
        let path: Path = [
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 4.0),
            Point::new(0.0, 0.0),
        ]
        .into_iter()
        .collect();
        assert!(path.is_closed());
        assert_eq!(path.len(), 4);

        let open = Path::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(!open.is_closed());
    }

    #[test]
    fn test_collection_point_set_is_union() {
        let shared = Point::new(1.0, 1.0);
        let paths = PathCollection::from(vec![
            Path::new(vec![Point::new(0.0, 0.0), shared]),
            Path::new(vec![shared, Point::new(2.0, 2.0)]),
        ]);
        assert_eq!(paths.point_count(), 4);
        assert_eq!(paths.point_set().len(), 3);
    }

    #[test]
    fn test_serde_round_trip() {
        let path = Path::new(vec![Point::new(1.5, 2.0), Point::new(3.0, -4.25)]);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"{"points":[{"x":1.5,"y":2.0},{"x":3.0,"y":-4.25}]}"#);
        let parsed: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, path);

        let points: PointSet = path.points().iter().copied().collect();
        let json = serde_json::to_string(&points).unwrap();
        assert_eq!(serde_json::from_str::<PointSet>(&json).unwrap(), points);
    }
}
