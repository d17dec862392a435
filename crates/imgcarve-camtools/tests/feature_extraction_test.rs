use image::{GrayImage, Luma};
use imgcarve_camtools::feature_extractor::{
    binarize, count_components, extract_centerline_points, extract_edge_points, thin, BinaryMask,
    CenterlineOptions, EdgeOptions, Neighborhood,
};
use imgcarve_camtools::heightmap_builder::{build_heightmap, HeightmapOptions};
use imgcarve_camtools::image_source::{Color, ImageSource};
use imgcarve_core::{Error, InputError, Point};

fn draw(width: u32, height: u32, on: impl Fn(u32, u32) -> bool) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| if on(x, y) { Luma([0]) } else { Luma([255]) })
}

#[test]
fn test_single_black_pixel_edge_points() {
    let img = draw(3, 3, |x, y| x == 1 && y == 1);
    let points = extract_edge_points(&img, &EdgeOptions::default()).unwrap();
    assert_eq!(points.len(), 1);
    assert!(points.contains(&Point::new(1.0, 1.0)));
}

#[test]
fn test_edge_points_stay_in_bounds() {
    let img = draw(6, 4, |x, y| (x + y) % 3 == 0);
    let points = extract_edge_points(&img, &EdgeOptions::default()).unwrap();
    assert!(!points.is_empty());
    for p in &points {
        assert!(p.x() >= 0.0 && p.x() < 6.0);
        assert!(p.y() >= 0.0 && p.y() < 4.0);
    }
}

#[test]
fn test_edge_threshold_ignores_similar_colors() {
    // A faint gray smudge within the similarity threshold of white
    let img = GrayImage::from_fn(4, 4, |x, _| if x < 2 { Luma([250]) } else { Luma([255]) });
    let points = extract_edge_points(&img, &EdgeOptions::default()).unwrap();
    assert!(points.is_empty());
}

#[test]
fn test_neighborhood_serializes_lowercase() {
    let json = serde_json::to_string(&Neighborhood::Eight).unwrap();
    assert_eq!(json, "\"eight\"");
    let parsed: Neighborhood = serde_json::from_str("\"four\"").unwrap();
    assert_eq!(parsed, Neighborhood::Four);
}

#[test]
fn test_horizontal_line_skeleton_is_itself() {
    let img = draw(12, 5, |x, y| y == 2 && (2..10).contains(&x));
    let skeleton = extract_centerline_points(&img, &CenterlineOptions::default()).unwrap();
    assert_eq!(skeleton.points.len(), 8);
    assert!(skeleton.stubs.is_empty());
    assert_eq!(skeleton.adjacency.edge_count(), 7);
}

#[test]
fn test_thick_bar_thins_to_single_row_band() {
    let img = draw(10, 6, |x, y| (1..=7).contains(&x) && (2..=4).contains(&y));
    let skeleton = extract_centerline_points(&img, &CenterlineOptions::default()).unwrap();
    assert!(!skeleton.points.is_empty());
    assert!(skeleton.points.len() < 21);
    for p in &skeleton.points {
        assert!((1.0..=7.0).contains(&p.x()));
        assert!((2.0..=4.0).contains(&p.y()));
    }
}

#[test]
fn test_thinning_preserves_component_count() {
    let shapes: Vec<GrayImage> = vec![
        // Filled square
        draw(9, 9, |x, y| (1..=7).contains(&x) && (1..=7).contains(&y)),
        // Ring
        draw(9, 9, |x, y| {
            let inside = (1..=7).contains(&x) && (1..=7).contains(&y);
            let hole = (3..=5).contains(&x) && (3..=5).contains(&y);
            inside && !hole
        }),
        // Two blobs and a diagonal
        draw(12, 8, |x, y| {
            ((1..=3).contains(&x) && (1..=3).contains(&y))
                || ((8..=10).contains(&x) && (4..=6).contains(&y))
                || (x == y && x >= 5 && x <= 7)
        }),
        // Cross
        draw(11, 11, |x, y| (4..=6).contains(&x) || (4..=6).contains(&y)),
        // Pixel-level checkerboard
        draw(6, 6, |x, y| (x + y) % 2 == 0),
    ];

    for img in shapes {
        let mut mask = binarize(&img, &CenterlineOptions::default()).unwrap();
        let before = count_components(&mask);
        thin(&mut mask);
        assert_eq!(count_components(&mask), before);
    }
}

#[test]
fn test_thinning_reaches_fixed_point() {
    let mut mask = BinaryMask::from_fn(15, 9, |x, y| (2..=12).contains(&x) && (2..=6).contains(&y));
    thin(&mut mask);
    let once = mask.clone();
    let iterations = thin(&mut mask);
    assert_eq!(iterations, 1);
    assert_eq!(mask, once);
}

#[test]
fn test_ring_keeps_a_cycle() {
    let img = draw(9, 9, |x, y| {
        let inside = (1..=7).contains(&x) && (1..=7).contains(&y);
        let hole = (3..=5).contains(&x) && (3..=5).contains(&y);
        inside && !hole
    });
    let skeleton = extract_centerline_points(&img, &CenterlineOptions::default()).unwrap();
    // A connected graph keeps a cycle exactly when it has as many edges as nodes
    assert_eq!(skeleton.points.len(), 17);
    assert!(skeleton.adjacency.edge_count() >= skeleton.points.len());
}

#[test]
fn test_blank_image_has_no_centerline() {
    let img = GrayImage::from_pixel(5, 5, Luma([255]));
    let skeleton = extract_centerline_points(&img, &CenterlineOptions::default()).unwrap();
    assert!(skeleton.points.is_empty());
}

/// Source that reports more pixels than its buffer holds
struct Truncated {
    buffer: GrayImage,
    width: u32,
    height: u32,
}

impl ImageSource for Truncated {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.buffer.pixel(x, y)
    }
}

#[test]
fn test_unreadable_pixel_is_an_input_error() {
    let source = Truncated {
        buffer: draw(2, 2, |x, y| x == y),
        width: 4,
        height: 4,
    };

    let err = extract_edge_points(&source, &EdgeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Input(InputError::PixelOutOfRange { width: 4, height: 4, .. })
    ));
    assert!(extract_centerline_points(&source, &CenterlineOptions::default())
        .unwrap_err()
        .is_input_error());
    assert!(build_heightmap(&source, &HeightmapOptions::default())
        .unwrap_err()
        .is_input_error());
}
