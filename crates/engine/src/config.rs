//! Extension configuration via `strata-relational.toml`
//!
//! Every setting has a default, so an empty file (or no file) gives the
//! stock behavior: 384-dimension cosine search with limit 10 and threshold
//! 0.7, and system versioning on MariaDB 10.3.0 or later with
//! `row_start`/`row_end` period columns.

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_core::{validate_identifier, Error, PeriodColumns, Result};
use strata_temporal::{EngineVersion, TemporalPolicy};
use strata_vector::{DistanceMetric, SearchOptions, VectorField};

/// Config file name looked up next to the application's data.
pub const CONFIG_FILE_NAME: &str = "strata-relational.toml";

/// `[vector]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Elements per stored embedding.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Maximum results returned by a similarity search.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Minimum score a candidate must reach.
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,
    /// `"cosine"`, `"euclidean"` or `"dot_product"`.
    #[serde(default = "default_metric_str")]
    pub metric: String,
}

fn default_dimension() -> usize {
    strata_vector::DEFAULT_DIMENSION
}

fn default_limit() -> usize {
    strata_vector::DEFAULT_LIMIT
}

fn default_threshold() -> f64 {
    strata_vector::DEFAULT_THRESHOLD
}

fn default_metric_str() -> String {
    "cosine".to_string()
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            default_limit: default_limit(),
            default_threshold: default_threshold(),
            metric: default_metric_str(),
        }
    }
}

impl VectorConfig {
    /// Parse the metric string.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the metric name is not recognized.
    pub fn metric(&self) -> Result<DistanceMetric> {
        DistanceMetric::parse(&self.metric).ok_or_else(|| {
            Error::Config(format!(
                "Invalid metric '{}' in {}. Expected \"cosine\", \"euclidean\" or \"dot_product\".",
                self.metric, CONFIG_FILE_NAME
            ))
        })
    }

    /// Search options carrying the configured defaults.
    pub fn search_options(&self) -> Result<SearchOptions> {
        Ok(SearchOptions::default()
            .with_limit(self.default_limit)
            .with_threshold(self.default_threshold)
            .with_metric(self.metric()?))
    }

    /// Vector column `name` sized to the configured dimension.
    pub fn field(&self, name: impl Into<String>) -> VectorField {
        VectorField::new(name, self.dimension)
    }

    fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::Config(format!(
                "vector.dimension must be positive in {}",
                CONFIG_FILE_NAME
            )));
        }
        if !self.default_threshold.is_finite() {
            return Err(Error::Config(format!(
                "vector.default_threshold must be a finite number in {}",
                CONFIG_FILE_NAME
            )));
        }
        self.metric()?;
        Ok(())
    }
}

/// `[temporal]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalConfig {
    /// Lowest engine version allowed to enable system versioning.
    #[serde(default = "default_min_engine_version")]
    pub min_engine_version: String,
    /// Name of the row-start period column.
    #[serde(default = "default_period_start")]
    pub period_start: String,
    /// Name of the row-end period column.
    #[serde(default = "default_period_end")]
    pub period_end: String,
}

fn default_min_engine_version() -> String {
    EngineVersion::MIN_SYSTEM_VERSIONING.to_string()
}

fn default_period_start() -> String {
    PeriodColumns::default().start
}

fn default_period_end() -> String {
    PeriodColumns::default().end
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            min_engine_version: default_min_engine_version(),
            period_start: default_period_start(),
            period_end: default_period_end(),
        }
    }
}

impl TemporalConfig {
    /// Parse the configured minimum version.
    pub fn min_version(&self) -> Result<EngineVersion> {
        self.min_engine_version.parse().map_err(|e| {
            Error::Config(format!(
                "temporal.min_engine_version in {}: {}",
                CONFIG_FILE_NAME, e
            ))
        })
    }

    /// Enablement policy for the temporal controller.
    pub fn policy(&self) -> Result<TemporalPolicy> {
        Ok(TemporalPolicy {
            min_version: self.min_version()?,
            columns: PeriodColumns {
                start: self.period_start.clone(),
                end: self.period_end.clone(),
            },
        })
    }

    fn validate(&self) -> Result<()> {
        self.min_version()?;
        for (key, name) in [
            ("period_start", &self.period_start),
            ("period_end", &self.period_end),
        ] {
            validate_identifier(name)
                .map_err(|e| Error::Config(format!("temporal.{}: {}", key, e)))?;
        }
        if self.period_start == self.period_end {
            return Err(Error::Config(
                "temporal.period_start and temporal.period_end must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Extension configuration loaded from `strata-relational.toml`.
///
/// # Example
///
/// ```toml
/// [vector]
/// dimension = 384
/// metric = "cosine"
///
/// [temporal]
/// min_engine_version = "10.3.0"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationalConfig {
    /// Vector codec and search settings.
    #[serde(default)]
    pub vector: VectorConfig,
    /// System versioning settings.
    #[serde(default)]
    pub temporal: TemporalConfig,
}

impl RelationalConfig {
    /// Commented text written by [`write_default_if_missing`](Self::write_default_if_missing)
    pub fn default_toml() -> &'static str {
        r#"# Strata relational extension configuration

[vector]
# Elements per stored embedding; columns hold dimension * 8 bytes
dimension = 384

# Similarity search defaults
default_limit = 10
default_threshold = 0.7

# Metric: "cosine" (default), "euclidean" or "dot_product"
metric = "cosine"

[temporal]
# System versioning requires MariaDB at or above this version
min_engine_version = "10.3.0"

# Period columns added when versioning is enabled
period_start = "row_start"
period_end = "row_end"
"#
    }

    /// Parse and validate config text
    ///
    /// # Errors
    ///
    /// `Config` for malformed TOML or an out-of-range value.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RelationalConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, naming the file in any error
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| file_error("read", path, e))?;
        let config = Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        tracing::debug!(
            target: "strata::engine",
            path = %path.display(),
            dimension = config.vector.dimension,
            metric = %config.vector.metric,
            "Loaded relational config"
        );
        Ok(config)
    }

    /// Create `path` with [`default_toml`](Self::default_toml) unless it exists
    ///
    /// An existing file is left untouched, even an empty one.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| file_error("create", path, e))
    }

    /// Save this config as TOML (comments are not preserved)
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot encode config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| file_error("write", path, e))
    }

    /// Check every value; called by the loaders.
    pub fn validate(&self) -> Result<()> {
        self.vector.validate()?;
        self.temporal.validate()
    }
}

fn file_error(action: &str, path: &Path, e: std::io::Error) -> Error {
    Error::Config(format!("cannot {} {}: {}", action, path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_stock_behavior() {
        let config = RelationalConfig::default();
        assert_eq!(config.vector.dimension, 384);
        let options = config.vector.search_options().unwrap();
        assert_eq!(options.limit, 10);
        assert_eq!(options.threshold, 0.7);
        assert_eq!(options.metric, DistanceMetric::Cosine);

        let policy = config.temporal.policy().unwrap();
        assert_eq!(policy, TemporalPolicy::default());
    }

    #[test]
    fn default_toml_parses_correctly() {
        let config = RelationalConfig::from_toml_str(RelationalConfig::default_toml()).unwrap();
        assert_eq!(config, RelationalConfig::default());
    }

    #[test]
    fn parse_partial_sections() {
        let config = RelationalConfig::from_toml_str(
            "[vector]\ndimension = 3\nmetric = \"dot\"\n\n[temporal]\nmin_engine_version = \"10.5\"\n",
        )
        .unwrap();
        assert_eq!(config.vector.dimension, 3);
        assert_eq!(config.vector.default_limit, 10);
        assert_eq!(config.vector.metric().unwrap(), DistanceMetric::DotProduct);
        assert_eq!(
            config.temporal.min_version().unwrap(),
            EngineVersion::new(10, 5, 0)
        );
        assert_eq!(config.temporal.period_end, "row_end");
    }

    #[test]
    fn vector_field_takes_configured_dimension() {
        let config = RelationalConfig::from_toml_str("[vector]\ndimension = 3\n").unwrap();
        let field = config.vector.field("embedding");
        assert_eq!(field.name(), "embedding");
        assert_eq!(field.dimension(), 3);

        assert!(field.to_value(Some(&[0.1, 0.2, 0.3])).is_ok());
        assert!(matches!(
            field.to_value(Some(&[0.1, 0.2])),
            Err(Error::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for text in [
            "[vector]\nmetric = \"manhattan\"\n",
            "[vector]\ndimension = 0\n",
            "[temporal]\nmin_engine_version = \"ten\"\n",
            "[temporal]\nperiod_start = \"row start`\"\n",
            "[temporal]\nperiod_start = \"valid\"\nperiod_end = \"valid\"\n",
            "[vector\n",
        ] {
            assert!(
                matches!(RelationalConfig::from_toml_str(text), Err(Error::Config(_))),
                "accepted: {text}"
            );
        }
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        RelationalConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());

        let config = RelationalConfig::from_file(&path).unwrap();
        assert_eq!(config.vector.metric, "cosine");
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "[vector]\ndefault_limit = 3\n").unwrap();
        RelationalConfig::write_default_if_missing(&path).unwrap();

        let config = RelationalConfig::from_file(&path).unwrap();
        assert_eq!(config.vector.default_limit, 3);
    }

    #[test]
    fn from_file_with_empty_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();

        let config = RelationalConfig::from_file(&path).unwrap();
        assert_eq!(config, RelationalConfig::default());
    }

    #[test]
    fn from_file_missing_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = RelationalConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = RelationalConfig::default();
        config.vector.dimension = 8;
        config.vector.default_threshold = 0.25;
        config.temporal.period_start = "valid_from".to_string();
        config.write_to_file(&path).unwrap();

        let parsed = RelationalConfig::from_file(&path).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.temporal.policy().unwrap().columns.start, "valid_from");
    }
}
