use image::{GrayImage, Luma};
use imgcarve_camtools::feature_extractor::{
    extract_centerline_points, extract_edge_points, CenterlineOptions, EdgeOptions,
};
use imgcarve_camtools::path_builder::{build_paths, DEFAULT_NEIGHBOR_RADIUS};
use imgcarve_camtools::path_simplifier::compress;
use imgcarve_core::{Point, PointSet};
use std::collections::BTreeSet;

fn draw(width: u32, height: u32, on: impl Fn(u32, u32) -> bool) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| if on(x, y) { Luma([0]) } else { Luma([255]) })
}

fn samples() -> Vec<GrayImage> {
    vec![
        draw(10, 10, |x, y| (2..=7).contains(&x) && (2..=7).contains(&y)),
        draw(12, 12, |x, y| {
            let dx = x as f64 - 5.5;
            let dy = y as f64 - 5.5;
            let r = (dx * dx + dy * dy).sqrt();
            (2.5..=4.5).contains(&r)
        }),
        draw(11, 11, |x, y| (4..=6).contains(&x) || (4..=6).contains(&y)),
        draw(9, 4, |x, y| x % 4 == 0 && y == 1),
    ]
}

#[test]
fn test_edge_paths_cover_every_point() {
    for img in samples() {
        let points = extract_edge_points(&img, &EdgeOptions::default()).unwrap();
        let built = build_paths(&points, None, DEFAULT_NEIGHBOR_RADIUS).unwrap();

        let mut covered = built.paths.point_set();
        for stub in &built.dropped_stubs {
            assert!(covered.insert(*stub), "stub {} also in a path", stub);
        }
        assert_eq!(covered, points);
        assert!(built.paths.iter().all(|p| p.len() >= 2));
    }
}

#[test]
fn test_edge_paths_step_between_neighbors() {
    for img in samples() {
        let points = extract_edge_points(&img, &EdgeOptions::default()).unwrap();
        let built = build_paths(&points, None, DEFAULT_NEIGHBOR_RADIUS).unwrap();
        for path in &built.paths {
            for pair in path.points().windows(2) {
                assert!(pair[0].distance(&pair[1]) <= DEFAULT_NEIGHBOR_RADIUS);
            }
        }
    }
}

#[test]
fn test_edge_paths_are_deterministic() {
    let img = &samples()[1];
    let points = extract_edge_points(img, &EdgeOptions::default()).unwrap();
    let first = build_paths(&points, None, DEFAULT_NEIGHBOR_RADIUS).unwrap();
    let second = build_paths(&points, None, DEFAULT_NEIGHBOR_RADIUS).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_centerline_paths_cover_each_edge_once() {
    for img in samples() {
        let skeleton = extract_centerline_points(&img, &CenterlineOptions::default()).unwrap();
        let built = build_paths(&skeleton.points, Some(&skeleton.adjacency), 0.0).unwrap();

        let mut seen: BTreeSet<(Point, Point)> = BTreeSet::new();
        for path in &built.paths {
            for pair in path.points().windows(2) {
                let key = if pair[0] < pair[1] {
                    (pair[0], pair[1])
                } else {
                    (pair[1], pair[0])
                };
                assert!(skeleton.adjacency.contains_edge(&pair[0], &pair[1]));
                assert!(seen.insert(key), "edge {:?} traced twice", key);
            }
        }
        assert_eq!(seen.len(), skeleton.adjacency.edge_count());

        let mut covered: PointSet = built.paths.point_set();
        for stub in &built.dropped_stubs {
            covered.insert(*stub);
        }
        assert_eq!(covered, skeleton.points);
    }
}

#[test]
fn test_isolated_dots_become_stubs() {
    let img = &samples()[3];
    let skeleton = extract_centerline_points(img, &CenterlineOptions::default()).unwrap();
    let built = build_paths(&skeleton.points, Some(&skeleton.adjacency), 0.0).unwrap();
    assert!(built.paths.is_empty());
    assert_eq!(built.dropped_stubs.len(), 3);
}

#[test]
fn test_horizontal_line_compresses_to_endpoints() {
    let img = draw(16, 5, |x, y| y == 2 && (3..13).contains(&x));
    let skeleton = extract_centerline_points(&img, &CenterlineOptions::default()).unwrap();
    let built = build_paths(&skeleton.points, Some(&skeleton.adjacency), 0.0).unwrap();
    assert_eq!(built.paths.len(), 1);

    let path = &built.paths.paths()[0];
    assert!(!path.is_closed());
    assert_eq!(path.len(), 10);
    assert_eq!(path.first(), Some(&Point::new(3.0, 2.0)));
    assert_eq!(path.last(), Some(&Point::new(12.0, 2.0)));

    let compressed = compress(built.paths, 0.5).unwrap();
    assert_eq!(
        compressed.paths()[0].points(),
        &[Point::new(3.0, 2.0), Point::new(12.0, 2.0)]
    );
}

#[test]
fn test_compress_keeps_endpoints_and_is_idempotent() {
    for img in samples() {
        let points = extract_edge_points(&img, &EdgeOptions::default()).unwrap();
        let built = build_paths(&points, None, DEFAULT_NEIGHBOR_RADIUS).unwrap();
        for tolerance in [0.0, 0.5, 1.5] {
            let once = compress(built.paths.clone(), tolerance).unwrap();
            for (before, after) in built.paths.iter().zip(once.iter()) {
                assert_eq!(before.first(), after.first());
                assert_eq!(before.last(), after.last());
                assert!(after.len() <= before.len());
            }
            let twice = compress(once.clone(), tolerance).unwrap();
            assert_eq!(once, twice);
        }
    }
}
