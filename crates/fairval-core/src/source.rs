use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical provider identifiers used in metadata and envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Yahoo,
    Alphavantage,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Alphavantage => "alphavantage",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which provider serves fundamental series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FundamentalsSourceKind {
    /// Alpha Vantage when a key is configured, otherwise Yahoo.
    #[default]
    Auto,
    Alphavantage,
    Yahoo,
    /// Never fetch fundamentals; charts are price-only.
    None,
}

impl FundamentalsSourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Alphavantage => "alphavantage",
            Self::Yahoo => "yahoo",
            Self::None => "none",
        }
    }
}

impl Display for FundamentalsSourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FundamentalsSourceKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "alphavantage" => Ok(Self::Alphavantage),
            "yahoo" => Ok(Self::Yahoo),
            "none" => Ok(Self::None),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
