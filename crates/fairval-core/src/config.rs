//! TOML configuration.
//!
//! Precedence, lowest to highest: built-in defaults, the config file,
//! `FAIRVAL_*` environment variables, then CLI flags (applied by the caller).
//!
//! ```toml
//! [http]
//! timeout_ms = 10000
//!
//! [fundamentals]
//! source = "auto"
//! period = "quarterly"
//! alphavantage_api_key = "..."
//!
//! [prices]
//! default_start = "2000-01-01"
//!
//! [analysis]
//! max_match_distance_days = 7
//! default_multiple = 15.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use time::Date;
use tracing::debug;

use crate::domain::calendar::parse_date;
use crate::http_client::{DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT};
use crate::{FundamentalsSourceKind, Multiple, ReportingPeriod};

pub const DEFAULT_CONFIG_FILE: &str = "fairval.toml";
pub const ENV_ALPHAVANTAGE_API_KEY: &str = "FAIRVAL_ALPHAVANTAGE_API_KEY";
pub const ENV_TIMEOUT_MS: &str = "FAIRVAL_TIMEOUT_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FairvalConfig {
    pub http: HttpConfig,
    pub fundamentals: FundamentalsConfig,
    pub prices: PricesConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FundamentalsConfig {
    pub source: FundamentalsSourceKind,
    pub period: ReportingPeriod,
    pub alphavantage_api_key: Option<String>,
}

impl Default for FundamentalsConfig {
    fn default() -> Self {
        Self {
            source: FundamentalsSourceKind::Auto,
            period: ReportingPeriod::Quarterly,
            alphavantage_api_key: None,
        }
    }
}

impl std::fmt::Debug for FundamentalsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundamentalsConfig")
            .field("source", &self.source)
            .field("period", &self.period)
            .field(
                "alphavantage_api_key",
                &self.alphavantage_api_key.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricesConfig {
    /// Price history start when no fundamental data bounds it.
    pub default_start: String,
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            default_start: String::from("2000-01-01"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Farthest a close may sit from a fiscal period end and still be paired.
    pub max_match_distance_days: u32,
    pub default_multiple: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_match_distance_days: 7,
            default_multiple: Multiple::DEFAULT.get(),
        }
    }
}

impl FairvalConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&contents, path)
    }

    /// Load `explicit`, else `fairval.toml` in the working directory when it
    /// exists, else defaults. Environment overrides are applied on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };

        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `FAIRVAL_*` overrides read through `lookup`.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(key) = lookup(ENV_ALPHAVANTAGE_API_KEY) {
            let key = key.trim();
            if !key.is_empty() {
                self.fundamentals.alphavantage_api_key = Some(key.to_owned());
            }
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.http.timeout_ms = raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::invalid(
                    "http.timeout_ms",
                    format!("{ENV_TIMEOUT_MS}='{raw}' is not an integer"),
                )
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "http.timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("http.user_agent", "cannot be empty"));
        }
        self.default_multiple()?;
        self.default_start()?;
        Ok(())
    }

    pub fn default_multiple(&self) -> Result<Multiple, ConfigError> {
        Multiple::new(self.analysis.default_multiple)
            .map_err(|e| ConfigError::invalid("analysis.default_multiple", e.to_string()))
    }

    pub fn default_start(&self) -> Result<Date, ConfigError> {
        parse_date(&self.prices.default_start)
            .map_err(|e| ConfigError::invalid("prices.default_start", e.to_string()))
    }

    /// Alpha Vantage key, ignoring blank values.
    pub fn alphavantage_api_key(&self) -> Option<&str> {
        self.fundamentals
            .alphavantage_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use time::macros::date;

    fn parse(toml_str: &str) -> Result<FairvalConfig, ConfigError> {
        FairvalConfig::from_toml_str(toml_str, Path::new("fairval.toml"))
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse("").expect("config should parse");
        assert_eq!(config, FairvalConfig::default());
        assert_eq!(config.http.timeout_ms, 10_000);
        assert_eq!(config.fundamentals.period, ReportingPeriod::Quarterly);
        assert_eq!(config.default_start().expect("date"), date!(2000 - 01 - 01));
    }

    #[test]
    fn parses_partial_sections() {
        let config = parse(
            r#"
[fundamentals]
source = "yahoo"
period = "annual"

[analysis]
default_multiple = 20.0
"#,
        )
        .expect("config should parse");

        assert_eq!(config.fundamentals.source, FundamentalsSourceKind::Yahoo);
        assert_eq!(config.fundamentals.period, ReportingPeriod::Annual);
        assert_eq!(config.analysis.max_match_distance_days, 7);
        assert_eq!(config.default_multiple().expect("multiple").get(), 20.0);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = parse("[http]\nretries = 3\n").expect_err("must fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_zero_timeout_and_bad_dates() {
        assert!(matches!(
            parse("[http]\ntimeout_ms = 0\n"),
            Err(ConfigError::Invalid { field: "http.timeout_ms", .. })
        ));
        assert!(matches!(
            parse("[prices]\ndefault_start = \"01/01/2000\"\n"),
            Err(ConfigError::Invalid { field: "prices.default_start", .. })
        ));
        assert!(matches!(
            parse("[analysis]\ndefault_multiple = -1.0\n"),
            Err(ConfigError::Invalid { field: "analysis.default_multiple", .. })
        ));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env = HashMap::from([
            (ENV_ALPHAVANTAGE_API_KEY, "demo-key"),
            (ENV_TIMEOUT_MS, "2500"),
        ]);
        let config = FairvalConfig::default()
            .with_env_overrides(|key| env.get(key).map(|value| value.to_string()))
            .expect("overrides are valid");

        assert_eq!(config.alphavantage_api_key(), Some("demo-key"));
        assert_eq!(config.http.timeout_ms, 2500);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let mut config = FairvalConfig::default();
        config.fundamentals.alphavantage_api_key = Some(String::from("secret-key"));
        assert!(!format!("{config:?}").contains("secret-key"));
    }
}
