//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks on business parameters.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::EngineConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, "; did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for EngineConfig.
///
/// Entries of the `[[truck_classes]]` array share one path per field.
/// Any new field added to EngineConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [monitor]
        "monitor",
        "monitor.interval_secs",
        "monitor.call_timeout_secs",
        "monitor.shutdown_grace_secs",
        // [clustering]
        "clustering",
        "clustering.radius_km",
        // [[truck_classes]]
        "truck_classes",
        "truck_classes.class",
        "truck_classes.min_volume_tons",
        "truck_classes.max_volume_tons",
        "truck_classes.small_sacks",
        "truck_classes.small_sacks.min",
        "truck_classes.small_sacks.max",
        "truck_classes.large_sacks",
        "truck_classes.large_sacks.min",
        "truck_classes.large_sacks.max",
        "truck_classes.radius_km",
        "truck_classes.time_window_hours",
        "truck_classes.vehicle_capacity_tons",
        // [budget]
        "budget",
        "budget.base_rate_per_ton",
        "budget.distance_rate_per_km",
        "budget.volume_rate_per_ton",
        // [requirements]
        "requirements",
        "requirements.environmental",
        "requirements.environmental.waste_segregation",
        "requirements.environmental.recycling_compliance",
        "requirements.environmental.environmental_impact",
        "requirements.environmental.disposal_method",
        "requirements.quality",
        "requirements.quality.service_quality",
        "requirements.quality.response_time",
        "requirements.quality.customer_satisfaction",
        "requirements.quality.completion_rate",
        // [storage]
        "storage",
        "storage.data_dir",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Tables inside arrays contribute their keys under
/// the array's own path, once per distinct key.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            } else if let Some(items) = v.as_array() {
                for item in items.iter().filter(|i| i.is_table()) {
                    for nested in walk_toml_keys(item, &path) {
                        if !keys.contains(&nested) {
                            keys.push(nested);
                        }
                    }
                }
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so output is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed EngineConfig.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_ranges(config: &EngineConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let m = &config.monitor;
    if m.interval_secs == 0 {
        errors.push("monitor.interval_secs must be > 0".to_string());
    }
    if m.call_timeout_secs == 0 {
        errors.push("monitor.call_timeout_secs must be > 0".to_string());
    }
    if m.shutdown_grace_secs == 0 {
        errors.push("monitor.shutdown_grace_secs must be > 0".to_string());
    }
    if m.interval_secs > 0 && m.call_timeout_secs >= m.interval_secs {
        warnings.push(ValidationWarning {
            field: "monitor.call_timeout_secs".to_string(),
            message: format!(
                "monitor.call_timeout_secs ({}) is not shorter than the tick interval ({}); a stuck call can delay the next tick",
                m.call_timeout_secs, m.interval_secs
            ),
            suggestion: None,
        });
    }

    validate_truck_classes(config, &mut errors);

    if let Some(radius) = config.clustering.radius_km {
        if !radius.is_finite() || radius <= 0.0 {
            errors.push(format!("clustering.radius_km = {radius} must be a positive number"));
        } else if let Some(smallest) = config
            .truck_classes
            .iter()
            .map(|b| b.radius_km)
            .reduce(f64::min)
        {
            if radius > smallest {
                errors.push(format!(
                    "clustering.radius_km = {radius:.1} exceeds the smallest truck-class radius ({smallest:.1} km); cluster members would fall outside their tender's service area"
                ));
            }
        }
    }

    let b = &config.budget;
    for (name, value) in [
        ("budget.base_rate_per_ton", b.base_rate_per_ton),
        ("budget.distance_rate_per_km", b.distance_rate_per_km),
        ("budget.volume_rate_per_ton", b.volume_rate_per_ton),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!("{name} = {value} must be a finite, non-negative rate"));
        }
    }

    (errors, warnings)
}

fn validate_truck_classes(config: &EngineConfig, errors: &mut Vec<String>) {
    let bands = &config.truck_classes;
    if bands.is_empty() {
        errors.push("truck_classes must define at least one band".to_string());
        return;
    }

    let mut seen = HashSet::new();
    for band in bands {
        let name = band.class.as_str();
        if !seen.insert(band.class) {
            errors.push(format!("truck_classes: {name} is defined more than once"));
        }
        for (field, value) in [
            ("min_volume_tons", band.min_volume_tons),
            ("max_volume_tons", band.max_volume_tons),
            ("radius_km", band.radius_km),
            ("vehicle_capacity_tons", band.vehicle_capacity_tons),
        ] {
            if !value.is_finite() {
                errors.push(format!("truck_classes[{name}].{field} must be finite (got {value})"));
            }
        }
        if band.min_volume_tons < 0.0 {
            errors.push(format!("truck_classes[{name}].min_volume_tons cannot be negative"));
        }
        if band.min_volume_tons > band.max_volume_tons {
            errors.push(format!(
                "truck_classes[{name}]: min_volume_tons ({:.2}) must be <= max_volume_tons ({:.2})",
                band.min_volume_tons, band.max_volume_tons
            ));
        }
        if band.radius_km <= 0.0 {
            errors.push(format!("truck_classes[{name}].radius_km must be > 0"));
        }
        if band.vehicle_capacity_tons <= 0.0 {
            errors.push(format!("truck_classes[{name}].vehicle_capacity_tons must be > 0"));
        }
        if band.small_sacks.min > band.small_sacks.max {
            errors.push(format!("truck_classes[{name}].small_sacks: min must be <= max"));
        }
        if band.large_sacks.min > band.large_sacks.max {
            errors.push(format!("truck_classes[{name}].large_sacks: min must be <= max"));
        }
    }

    // Bands may touch (first match wins) but must not overlap
    let mut ordered: Vec<_> = bands.iter().collect();
    ordered.sort_by(|a, b| a.min_volume_tons.total_cmp(&b.min_volume_tons));
    for pair in ordered.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        if upper.min_volume_tons < lower.max_volume_tons {
            errors.push(format!(
                "truck_classes: {} [{:.2}, {:.2}] overlaps {} [{:.2}, {:.2}]",
                lower.class,
                lower.min_volume_tons,
                lower.max_volume_tons,
                upper.class,
                upper.min_volume_tons,
                upper.max_volume_tons
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn test_walk_collects_array_table_keys_once() {
        let value: toml::Value = r#"
[[truck_classes]]
class = "SMALL_TRUCK"
radius_km = 5.0

[[truck_classes]]
class = "MEDIUM_TRUCK"
radius_km = 12.0
"#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&value, "");
        assert_eq!(
            keys,
            vec!["truck_classes", "truck_classes.class", "truck_classes.radius_km"]
        );
    }

    #[test]
    fn test_default_ranges_clean() {
        let (errors, warnings) = validate_ranges(&EngineConfig::default());
        assert!(errors.is_empty(), "{errors:?}");
        assert!(warnings.is_empty());
    }
}
