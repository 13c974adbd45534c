//! Config Validation Tests
//!
//! Typo detection on raw TOML and range validation on the parsed
//! `EngineConfig`, exercised independently of the monitor.

use tender_engine::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use tender_engine::config::{ConfigError, EngineConfig};
use tender_engine::types::TruckClass;

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_monitor_section_warns_with_suggestion() {
    let toml_str = r#"
[monitor]
interval_sec = 600
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "monitor.interval_sec");
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("monitor.interval_secs")
    );
}

#[test]
fn typo_in_budget_section_warns() {
    let toml_str = r#"
[budget]
base_rate_per_tonne = 55000.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("budget.base_rate_per_ton")
    );
}

#[test]
fn typo_inside_truck_class_table_warns() {
    let toml_str = r#"
[[truck_classes]]
class = "SMALL_TRUCK"
radius = 5.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "truck_classes.radius");
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("truck_classes.radius_km")
    );
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[monitor]
interval_secs = 900
call_timeout_secs = 20
shutdown_grace_secs = 45

[clustering]
radius_km = 3.0

[[truck_classes]]
class = "SMALL_TRUCK"
min_volume_tons = 0.5
max_volume_tons = 1.0
small_sacks = { min = 10, max = 20 }
large_sacks = { min = 5, max = 10 }
radius_km = 5.0
time_window_hours = 24
vehicle_capacity_tons = 1.0

[budget]
base_rate_per_ton = 50000.0
distance_rate_per_km = 10000.0
volume_rate_per_ton = 5000.0

[requirements.environmental]
waste_segregation = true

[requirements.quality]
response_time = "WITHIN_12_HOURS"

[storage]
data_dir = "/var/lib/tender-engine"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(
        warnings.is_empty(),
        "Valid config should produce 0 warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn unknown_section_warns() {
    let toml_str = r#"
[dashboard]
port = 8080
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.iter().any(|w| w.field == "dashboard"));
    assert!(warnings.iter().any(|w| w.field == "dashboard.port"));
}

#[test]
fn empty_toml_produces_zero_warnings() {
    assert!(validate_unknown_keys("").is_empty());
}

#[test]
fn known_keys_set_is_complete() {
    // Every key the default config serializes must be known
    let toml_str = EngineConfig::default()
        .to_toml()
        .expect("Default config should serialize");
    let warnings = validate_unknown_keys(&toml_str);
    assert!(
        warnings.is_empty(),
        "Default config serialization should produce 0 unknown-key warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn suggest_correction_returns_none_for_garbage() {
    let known = known_config_keys();
    assert!(suggest_correction("zzz_completely_invalid_xyz_12345", &known).is_none());
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn all_defaults_pass_validation() {
    let config = EngineConfig::default();
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty(), "Default config should have 0 errors: {errors:?}");
    assert!(warnings.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn zero_interval_is_error() {
    let mut config = EngineConfig::default();
    config.monitor.interval_secs = 0;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("interval_secs")));
}

#[test]
fn timeout_not_shorter_than_interval_is_warning() {
    let mut config = EngineConfig::default();
    config.monitor.interval_secs = 30;
    config.monitor.call_timeout_secs = 30;
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings.iter().any(|w| w.field == "monitor.call_timeout_secs"));
}

#[test]
fn overlapping_bands_are_error() {
    let mut config = EngineConfig::default();
    config.truck_classes[1].min_volume_tons = 0.8;
    let (errors, _) = validate_ranges(&config);
    assert!(
        errors.iter().any(|e| e.contains("overlaps")),
        "MEDIUM starting inside SMALL should overlap: {errors:?}"
    );
}

#[test]
fn touching_bands_are_allowed() {
    // Default MEDIUM ends at 8.0 where LARGE begins
    let config = EngineConfig::default();
    let (errors, _) = validate_ranges(&config);
    assert!(!errors.iter().any(|e| e.contains("overlaps")));
}

#[test]
fn inverted_band_is_error() {
    let mut config = EngineConfig::default();
    config.truck_classes[0].min_volume_tons = 2.0;
    config.truck_classes[0].max_volume_tons = 1.0;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("min_volume_tons")));
}

#[test]
fn non_positive_radius_is_error() {
    let mut config = EngineConfig::default();
    config.truck_classes[2].radius_km = 0.0;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("LARGE_TRUCK") && e.contains("radius_km")));
}

#[test]
fn non_finite_bound_is_error() {
    let mut config = EngineConfig::default();
    config.truck_classes[0].max_volume_tons = f64::NAN;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("must be finite")));
}

#[test]
fn duplicate_class_is_error() {
    let mut config = EngineConfig::default();
    config.truck_classes[1].class = TruckClass::SmallTruck;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("more than once")));
}

#[test]
fn empty_table_is_error() {
    let mut config = EngineConfig::default();
    config.truck_classes.clear();
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("at least one band")));
}

#[test]
fn negative_rate_is_error() {
    let mut config = EngineConfig::default();
    config.budget.distance_rate_per_km = -1.0;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("budget.distance_rate_per_km")));
}

#[test]
fn clustering_radius_wider_than_smallest_band_is_error() {
    let mut config = EngineConfig::default();
    config.clustering.radius_km = Some(12.0);
    let (errors, _) = validate_ranges(&config);
    assert!(errors
        .iter()
        .any(|e| e.contains("clustering.radius_km") && e.contains("smallest truck-class radius")));
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn clustering_radius_equal_to_smallest_band_is_accepted() {
    let mut config = EngineConfig::default();
    config.clustering.radius_km = Some(5.0);
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty(), "{errors:?}");
    assert!(warnings.is_empty());
}

#[test]
fn zero_clustering_radius_is_error() {
    let mut config = EngineConfig::default();
    config.clustering.radius_km = Some(0.0);
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("clustering.radius_km")));
}

// ============================================================================
// Integration: validate() surfaces range errors
// ============================================================================

#[test]
fn validate_rejects_overlap() {
    let mut config = EngineConfig::default();
    config.truck_classes[2].min_volume_tons = 6.0;
    match config.validate() {
        Err(ConfigError::Validation(errors)) => assert!(!errors.is_empty()),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn config_roundtrip_passes_validation() {
    let mut original = EngineConfig::default();
    original.monitor.interval_secs = 600;
    original.budget.base_rate_per_ton = 45_000.0;

    let toml_str = original.to_toml().expect("Serialization should work");
    let roundtripped: EngineConfig =
        toml::from_str(&toml_str).expect("Deserialization should work");

    assert_eq!(roundtripped.monitor.interval_secs, 600);
    assert!((roundtripped.budget.base_rate_per_ton - 45_000.0).abs() < f64::EPSILON);
    assert_eq!(roundtripped.truck_classes, original.truck_classes);
    assert!(roundtripped.validate().is_ok());
}
