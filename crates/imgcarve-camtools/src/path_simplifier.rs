//! Path Simplifier
//!
//! Ramer-Douglas-Peucker reduction of each path in a collection. Endpoints are
//! always kept. A span is split at its farthest interior point when that point
//! lies beyond the tolerance from the span's chord, so every dropped point is
//! within tolerance of the output segment covering it. A kept point is only
//! measured against the chord of the span it split, not against its final
//! neighbours. For closed paths the shared start/end point anchors the
//! reduction and distances are measured to that point.

use imgcarve_core::{ConfigurationError, Path, PathCollection, Result};
use tracing::debug;

/// Simplify every path in the collection
pub fn compress(paths: PathCollection, tolerance: f64) -> Result<PathCollection> {
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(ConfigurationError::NegativeTolerance(tolerance).into());
    }

    let before = paths.point_count();
    let compressed: PathCollection = paths
        .into_iter()
        .map(|path| compress_path(&path, tolerance))
        .collect();

    debug!(
        "Simplified {} path(s): {} -> {} points (tolerance {:.3} px)",
        compressed.len(),
        before,
        compressed.point_count(),
        tolerance
    );
    Ok(compressed)
}

/// Simplify one path. Callers must pass a non-negative tolerance.
pub fn compress_path(path: &Path, tolerance: f64) -> Path {
    let points = path.points();
    if points.len() <= 2 {
        return path.clone();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0, last)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_distance = 0.0;
        let mut split = start;
        for (i, p) in points.iter().enumerate().take(end).skip(start + 1) {
            let distance = p.perpendicular_distance(&points[start], &points[end]);
            if distance > max_distance {
                max_distance = distance;
                split = i;
            }
        }

        if split != start && max_distance > tolerance {
            keep[split] = true;
            stack.push((split, end));
            stack.push((start, split));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter(|(_, kept)| *kept)
        .map(|(p, _)| *p)
        .collect()
}
