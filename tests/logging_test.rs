use imgcarve::log_filter;
use tracing_subscriber::filter::LevelFilter;

// Kept in its own test binary because it mutates RUST_LOG.
#[test]
fn test_log_filter_honours_rust_log() {
    std::env::set_var("RUST_LOG", "debug");
    assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::DEBUG));

    std::env::set_var("RUST_LOG", "imgcarve_camtools=trace");
    assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::TRACE));

    std::env::remove_var("RUST_LOG");
    assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::INFO));
}
