// cloudscan_core/src/config/mod.rs

//! The laser scan configuration record and its settings-document loader.

mod loader;

pub use loader::{
    load_file, parse_document, parse_section, parse_str, parse_toml_str, ConfigStore,
};

use crate::error::ConfigError;
use serde::Serialize;
use std::f64::consts::PI;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// The top-level key that holds the scan settings in a settings document.
pub const SECTION: &str = "laser_scan_config";

/// Upper bound on `bucket_count` accepted by `validate`.
///
/// Far above any real sensor (0.001 degree over a full turn is 360 000
/// buckets), low enough that allocating the ranges never fails.
pub const MAX_BUCKETS: usize = 1 << 20;

/// # LaserScanConfig
/// An immutable snapshot of everything the projector needs for one frame.
///
/// Serializes with the settings-document keys (`enable_scan`, `use_inf`, ...),
/// so `to_json_value` output feeds straight back into the loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaserScanConfig {
    /// Master switch. When false the projector emits nothing.
    #[serde(rename = "enable_scan")]
    pub enable: bool,
    /// Lowest `z` kept, inclusive.
    pub min_height: f64,
    /// Highest `z` kept, inclusive.
    pub max_height: f64,
    /// Start of the bearing window, radians.
    pub angle_min: f64,
    /// End of the bearing window, radians.
    pub angle_max: f64,
    /// Bucket width, radians. Must be positive.
    pub angle_increment: f64,
    /// Informational; copied into each scan.
    #[serde(rename = "scan_time")]
    pub scan_duration: f64,
    pub range_min: f64,
    pub range_max: f64,
    /// Fill empty buckets with `+inf` instead of `range_max + empty_range_epsilon`.
    #[serde(rename = "use_inf")]
    pub use_infinity_for_empty: bool,
    #[serde(rename = "inf_epsilon")]
    pub empty_range_epsilon: f64,
    /// Replaces the input frame label when non-empty.
    #[serde(rename = "target_frame")]
    pub target_frame_label: String,
    /// Not used by the projector; carried for whoever transforms the scan.
    pub transform_tolerance: f64,
}

impl Default for LaserScanConfig {
    fn default() -> Self {
        Self {
            enable: false,
            min_height: -1.0,
            max_height: 1.0,
            angle_min: -PI,
            angle_max: PI,
            angle_increment: PI / 180.0, // 1 degree
            scan_duration: 1.0 / 30.0,   // 30 Hz
            range_min: 0.45,
            range_max: 100.0,
            use_infinity_for_empty: true,
            empty_range_epsilon: 1.0,
            target_frame_label: String::new(),
            transform_tolerance: 0.01,
        }
    }
}

impl LaserScanConfig {
    /// Number of angular buckets: `ceil((angle_max - angle_min) / angle_increment)`.
    ///
    /// An empty, inverted, or NaN window yields zero buckets.
    pub fn bucket_count(&self) -> usize {
        let buckets = ((self.angle_max - self.angle_min) / self.angle_increment).ceil();
        if buckets > 0.0 {
            buckets as usize
        } else {
            0
        }
    }

    /// The value written into buckets no point landed in.
    pub fn empty_range(&self) -> f64 {
        if self.use_infinity_for_empty {
            f64::INFINITY
        } else {
            self.range_max + self.empty_range_epsilon
        }
    }

    /// The frame label an output scan carries for the given input label.
    pub fn output_frame<'a>(&'a self, input_frame: &'a str) -> &'a str {
        if self.target_frame_label.is_empty() {
            input_frame
        } else {
            &self.target_frame_label
        }
    }

    /// Rejects values the projector cannot produce a meaningful scan from.
    ///
    /// Every numeric field must be finite, so a validated record always
    /// survives `to_json_value` (JSON has no `inf` or `NaN`). The projector
    /// itself assumes these hold and does not re-check them.
    pub fn validate(&self) -> Result<()> {
        let numbers = [
            ("min_height", self.min_height),
            ("max_height", self.max_height),
            ("angle_min", self.angle_min),
            ("angle_max", self.angle_max),
            ("angle_increment", self.angle_increment),
            ("scan_time", self.scan_duration),
            ("range_min", self.range_min),
            ("range_max", self.range_max),
            ("inf_epsilon", self.empty_range_epsilon),
            ("transform_tolerance", self.transform_tolerance),
        ];
        for (field, value) in numbers {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be finite, got {}", value),
                });
            }
        }

        if self.angle_increment <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "angle_increment",
                reason: format!("must be positive, got {}", self.angle_increment),
            });
        }
        if self.angle_max < self.angle_min {
            return Err(ConfigError::Invalid {
                field: "angle_max",
                reason: format!(
                    "must not be below angle_min ({} < {})",
                    self.angle_max, self.angle_min
                ),
            });
        }
        let buckets = ((self.angle_max - self.angle_min) / self.angle_increment).ceil();
        if buckets > MAX_BUCKETS as f64 {
            return Err(ConfigError::Invalid {
                field: "angle_increment",
                reason: format!(
                    "gives {} buckets over [{}, {}], more than {}",
                    buckets, self.angle_min, self.angle_max, MAX_BUCKETS
                ),
            });
        }
        if self.range_max < self.range_min {
            return Err(ConfigError::Invalid {
                field: "range_max",
                reason: format!(
                    "must not be below range_min ({} < {})",
                    self.range_max, self.range_min
                ),
            });
        }
        if self.max_height < self.min_height {
            return Err(ConfigError::Invalid {
                field: "max_height",
                reason: format!(
                    "must not be below min_height ({} < {})",
                    self.max_height, self.min_height
                ),
            });
        }
        // A finite sentinel has to sit above every range the filter accepts.
        if !self.use_infinity_for_empty && self.empty_range_epsilon <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "inf_epsilon",
                reason: format!(
                    "must be positive when use_inf is false, got {}",
                    self.empty_range_epsilon
                ),
            });
        }
        Ok(())
    }

    /// This record as a settings document: `{"laser_scan_config": {...}}`.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({ SECTION: self })
    }

    /// Pretty-printed settings document text.
    pub fn to_json_string(&self) -> String {
        format!("{:#}", self.to_json_value())
    }
}
