//! Configuration loading from gauge.toml
//!
//! Gauge configuration can be specified in a `gauge.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
    /// A duration string could not be understood
    #[error("invalid duration '{0}': {1}")]
    Duration(String, &'static str),
}

/// Gauge configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GaugeConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Measurement target per benchmark (e.g., "500ms", "1s")
    #[serde(default = "default_duration")]
    pub duration: String,
    /// Advisory timeout for a single trial (e.g., "3s")
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            timeout: default_timeout(),
        }
    }
}

fn default_duration() -> String {
    "500ms".to_string()
}
fn default_timeout() -> String {
    "3s".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl GaugeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(&dir)
    }

    /// Walk up from `start` looking for `gauge.toml`
    pub fn discover_from(start: &Path) -> Option<Self> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join("gauge.toml");
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(err) => {
                        tracing::warn!(%err, "ignoring configuration file");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Gauge Configuration

[runner]
# How long each benchmark's final trial must run
duration = "500ms"
# Advisory timeout for one trial (asynchronous benchmarks are aborted after it)
timeout = "3s"

[output]
# Default output format: human, json
format = "human"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> Result<u64, ConfigError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::Duration(s.to_string(), "empty duration"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic() || *c == 'µ')
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| ConfigError::Duration(s.to_string(), "invalid number"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Duration(s.to_string(), "must be non-negative"));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(ConfigError::Duration(s.to_string(), "unknown unit")),
        };

        Ok((value * multiplier as f64) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GaugeConfig::default();
        assert_eq!(config.runner.duration, "500ms");
        assert_eq!(config.runner.timeout, "3s");
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(GaugeConfig::parse_duration("3s").unwrap(), 3_000_000_000);
        assert_eq!(GaugeConfig::parse_duration("500ms").unwrap(), 500_000_000);
        assert_eq!(GaugeConfig::parse_duration("100us").unwrap(), 100_000);
        assert_eq!(GaugeConfig::parse_duration("100µs").unwrap(), 100_000);
        assert_eq!(GaugeConfig::parse_duration("1000ns").unwrap(), 1000);
        assert_eq!(GaugeConfig::parse_duration("2m").unwrap(), 120_000_000_000);
        assert_eq!(GaugeConfig::parse_duration("1.5s").unwrap(), 1_500_000_000);
        assert_eq!(GaugeConfig::parse_duration("2").unwrap(), 2_000_000_000);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(GaugeConfig::parse_duration("").is_err());
        assert!(GaugeConfig::parse_duration("fast").is_err());
        assert!(GaugeConfig::parse_duration("10 parsecs").is_err());
        assert!(GaugeConfig::parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            duration = "10ms"
        "#;

        let config: GaugeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.duration, "10ms");
        // Defaults should still apply
        assert_eq!(config.runner.timeout, "3s");
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_default_toml_parses() {
        let config: GaugeConfig = toml::from_str(&GaugeConfig::default_toml()).unwrap();
        assert_eq!(config.runner.duration, "500ms");
    }

    #[test]
    fn test_discover_walks_up() {
        let root = std::env::temp_dir().join(format!("gauge-discover-{}", std::process::id()));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            root.join("gauge.toml"),
            "[output]\nformat = \"json\"\n",
        )
        .unwrap();

        let config = GaugeConfig::discover_from(&nested).unwrap();
        assert_eq!(config.output.format, "json");

        std::fs::remove_dir_all(&root).unwrap();
    }
}
