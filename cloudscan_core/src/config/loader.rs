// cloudscan_core/src/config/loader.rs

//! Reads a `LaserScanConfig` out of a settings document.
//!
//! A document is any JSON (or TOML) value tree. The scan settings live under
//! the `laser_scan_config` key; a document without that key yields the
//! default configuration. Each recognized field is type-checked on its own and
//! the first mismatch aborts the whole parse, so callers only ever see a
//! complete record or an error. Unknown fields are ignored.

use super::{LaserScanConfig, Result, SECTION};
use crate::error::{ConfigError, SchemaErrorKind};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

// Each field is looked up under its document key first, then under its alias.
const ENABLE: &[&str] = &["enable_scan", "enable"];
const MIN_HEIGHT: &[&str] = &["min_height"];
const MAX_HEIGHT: &[&str] = &["max_height"];
const ANGLE_MIN: &[&str] = &["angle_min"];
const ANGLE_MAX: &[&str] = &["angle_max"];
const ANGLE_INCREMENT: &[&str] = &["angle_increment"];
const SCAN_DURATION: &[&str] = &["scan_time", "scan_duration"];
const RANGE_MIN: &[&str] = &["range_min"];
const RANGE_MAX: &[&str] = &["range_max"];
const USE_INF: &[&str] = &["use_inf", "use_infinity_for_empty"];
const INF_EPSILON: &[&str] = &["inf_epsilon", "empty_range_epsilon"];
const TARGET_FRAME: &[&str] = &["target_frame", "target_frame_label"];
const TRANSFORM_TOLERANCE: &[&str] = &["transform_tolerance"];

/// Parses a whole settings document.
///
/// Returns the default configuration when the document has no
/// `laser_scan_config` section.
pub fn parse_document(document: &Value) -> Result<LaserScanConfig> {
    match document.get(SECTION) {
        Some(section) => parse_section(section),
        None => {
            debug!("No '{}' section found, using default scan settings.", SECTION);
            Ok(LaserScanConfig::default())
        }
    }
}

/// Parses the contents of the `laser_scan_config` section itself.
pub fn parse_section(section: &Value) -> Result<LaserScanConfig> {
    let Some(fields) = section.as_object() else {
        return Err(schema_error(SECTION, SchemaErrorKind::NotAnObject));
    };

    let mut config = LaserScanConfig::default();

    if let Some(v) = bool_field(fields, ENABLE)? {
        config.enable = v;
    }
    if let Some(v) = number_field(fields, MIN_HEIGHT)? {
        config.min_height = v;
    }
    if let Some(v) = number_field(fields, MAX_HEIGHT)? {
        config.max_height = v;
    }
    if let Some(v) = number_field(fields, ANGLE_MIN)? {
        config.angle_min = v;
    }
    if let Some(v) = number_field(fields, ANGLE_MAX)? {
        config.angle_max = v;
    }
    if let Some(v) = number_field(fields, ANGLE_INCREMENT)? {
        config.angle_increment = v;
    }
    if let Some(v) = number_field(fields, SCAN_DURATION)? {
        config.scan_duration = v;
    }
    if let Some(v) = number_field(fields, RANGE_MIN)? {
        config.range_min = v;
    }
    if let Some(v) = number_field(fields, RANGE_MAX)? {
        config.range_max = v;
    }
    if let Some(v) = bool_field(fields, USE_INF)? {
        config.use_infinity_for_empty = v;
    }
    if let Some(v) = number_field(fields, INF_EPSILON)? {
        config.empty_range_epsilon = v;
    }
    if let Some(v) = string_field(fields, TARGET_FRAME)? {
        config.target_frame_label = v.to_owned();
    }
    if let Some(v) = number_field(fields, TRANSFORM_TOLERANCE)? {
        config.transform_tolerance = v;
    }

    if let Err(e) = config.validate() {
        warn!("Rejected scan settings: {}", e);
        return Err(e);
    }
    Ok(config)
}

/// Parses JSON settings text.
pub fn parse_str(text: &str) -> Result<LaserScanConfig> {
    let document: Value = serde_json::from_str(text).map_err(|e| {
        let err = ConfigError::from(e);
        warn!("Failed to parse config JSON: {}", err);
        err
    })?;
    parse_document(&document)
}

/// Parses TOML settings text laid out like the JSON document
/// (a `[laser_scan_config]` table with the same keys).
pub fn parse_toml_str(text: &str) -> Result<LaserScanConfig> {
    let document: Value = toml::from_str(text).map_err(|e| {
        let (line, column) = e
            .span()
            .map(|span| line_column(text, span.start))
            .unwrap_or((0, 0));
        let err = ConfigError::Syntax {
            line,
            column,
            message: e.message().to_string(),
        };
        warn!("Failed to parse config TOML: {}", err);
        err
    })?;
    parse_document(&document)
}

/// Loads settings from a UTF-8 file. Files ending in `.toml` are read as
/// TOML, everything else as JSON.
pub fn load_file(path: impl AsRef<Path>) -> Result<LaserScanConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| {
        error!("Failed to open config file {:?}: {}", path, source);
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    let config = if is_toml {
        parse_toml_str(&text)?
    } else {
        parse_str(&text)?
    };

    info!(
        "Loaded scan settings from {:?} (enabled: {}, {} buckets).",
        path,
        config.enable,
        config.bucket_count()
    );
    Ok(config)
}

// =========================================================================
// == Active Configuration ==
// =========================================================================

/// Holds the configuration snapshot currently in effect.
///
/// Reloads swap in a whole new snapshot and only on success; on any error the
/// previous snapshot stays active. Snapshots already handed out keep the
/// values they were taken with.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    current: Arc<LaserScanConfig>,
}

impl ConfigStore {
    pub fn new(config: LaserScanConfig) -> Self {
        Self {
            current: Arc::new(config),
        }
    }

    /// The configuration in effect right now.
    pub fn snapshot(&self) -> Arc<LaserScanConfig> {
        Arc::clone(&self.current)
    }

    /// Validates and activates an already-built configuration.
    pub fn replace(&mut self, config: LaserScanConfig) -> Result<()> {
        config.validate()?;
        self.current = Arc::new(config);
        Ok(())
    }

    pub fn reload_document(&mut self, document: &Value) -> Result<()> {
        self.current = Arc::new(parse_document(document)?);
        Ok(())
    }

    pub fn reload_str(&mut self, text: &str) -> Result<()> {
        self.current = Arc::new(parse_str(text)?);
        Ok(())
    }

    pub fn reload_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.current = Arc::new(load_file(path)?);
        Ok(())
    }
}

// --- Field helpers ---

/// Finds the first of `keys` present in the section.
fn lookup<'a>(
    fields: &'a Map<String, Value>,
    keys: &[&'static str],
) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|&key| fields.get(key).map(|value| (key, value)))
}

fn bool_field(fields: &Map<String, Value>, keys: &[&'static str]) -> Result<Option<bool>> {
    match lookup(fields, keys) {
        None => Ok(None),
        Some((key, value)) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| schema_error(key, SchemaErrorKind::ExpectedBool)),
    }
}

fn number_field(fields: &Map<String, Value>, keys: &[&'static str]) -> Result<Option<f64>> {
    match lookup(fields, keys) {
        None => Ok(None),
        Some((key, value)) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| schema_error(key, SchemaErrorKind::ExpectedNumber)),
    }
}

fn string_field<'a>(
    fields: &'a Map<String, Value>,
    keys: &[&'static str],
) -> Result<Option<&'a str>> {
    match lookup(fields, keys) {
        None => Ok(None),
        Some((key, value)) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| schema_error(key, SchemaErrorKind::ExpectedString)),
    }
}

fn schema_error(field: &'static str, kind: SchemaErrorKind) -> ConfigError {
    let err = ConfigError::Schema { field, kind };
    warn!("Rejected scan settings: {}", err);
    err
}

/// 1-based line and column of a byte offset.
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}
