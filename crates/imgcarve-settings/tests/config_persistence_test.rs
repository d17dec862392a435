use imgcarve_camtools::Neighborhood;
use imgcarve_settings::{Config, ConfigError, SettingsError};
use tempfile::TempDir;

#[test]
fn test_save_and_load_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::new();
    config.machine.mm_per_pixel = 0.2;
    config.extraction.neighborhood = Neighborhood::Eight;
    config.carve.depth_step_mm = Some(0.75);

    config.save_to_file(&path).unwrap();
    assert!(path.exists());

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_and_load_json() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.json");

    let mut config = Config::new();
    config.heightmap.both_directions = false;
    config.heightmap.max_depth_mm = 4.0;
    config.save_to_file(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"both_directions\": false"));
    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[simplification]\ntolerance_pixels = -2.0\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Config(ConfigError::ValueOutOfRange { .. })
    ));
}

#[test]
fn test_malformed_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[machine\nmm_per_pixel = ").unwrap();
    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::TomlError(_))
    ));
}

#[test]
fn test_load_or_default() {
    assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    let missing = std::path::Path::new("/nonexistent/imgcarve/config.toml");
    assert!(matches!(
        Config::load_or_default(Some(missing)),
        Err(SettingsError::IoError(_))
    ));
}

#[test]
fn test_default_path_layout() {
    if let Ok(path) = Config::default_path() {
        assert!(path.ends_with("imgcarve/config.toml"));
    }
}
