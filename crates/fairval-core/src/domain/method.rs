use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Fundamental basis for the fair-value line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValuationMethod {
    #[serde(rename = "eps")]
    Earnings,
    #[serde(rename = "ocf")]
    OperatingCashFlow,
}

impl ValuationMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earnings => "eps",
            Self::OperatingCashFlow => "ocf",
        }
    }

    /// Fundamental series fetched for this method.
    pub const fn metric(self) -> FundamentalMetric {
        match self {
            Self::Earnings => FundamentalMetric::EarningsPerShare,
            Self::OperatingCashFlow => FundamentalMetric::OperatingCashFlow,
        }
    }

    /// Whether the fetched series must be divided by shares outstanding.
    pub const fn needs_per_share(self) -> bool {
        matches!(self, Self::OperatingCashFlow)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Earnings => "EPS",
            Self::OperatingCashFlow => "OCF/share",
        }
    }
}

impl Display for ValuationMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValuationMethod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "eps" | "earnings" => Ok(Self::Earnings),
            "ocf" | "cashflow" | "operating-cash-flow" => Ok(Self::OperatingCashFlow),
            other => Err(ValidationError::InvalidMethod {
                value: other.to_owned(),
            }),
        }
    }
}

/// Reporting cadence of a fundamental series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportingPeriod {
    Annual,
    Quarterly,
}

impl ReportingPeriod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
        }
    }
}

impl Display for ReportingPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportingPeriod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "annual" => Ok(Self::Annual),
            "quarterly" => Ok(Self::Quarterly),
            other => Err(ValidationError::InvalidPeriod {
                value: other.to_owned(),
            }),
        }
    }
}

/// Upstream fundamental field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundamentalMetric {
    EarningsPerShare,
    OperatingCashFlow,
    SharesOutstanding,
}

impl FundamentalMetric {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EarningsPerShare => "earnings_per_share",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::SharesOutstanding => "shares_outstanding",
        }
    }
}

impl Display for FundamentalMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_aliases() {
        assert_eq!(
            ValuationMethod::from_str("EPS").expect("must parse"),
            ValuationMethod::Earnings
        );
        assert_eq!(
            ValuationMethod::from_str("cashflow").expect("must parse"),
            ValuationMethod::OperatingCashFlow
        );
    }

    #[test]
    fn rejects_unknown_method() {
        let err = ValuationMethod::from_str("ebitda").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidMethod { .. }));
    }

    #[test]
    fn parses_reporting_period_case_insensitively() {
        assert_eq!(
            ReportingPeriod::from_str(" Annual ").expect("must parse"),
            ReportingPeriod::Annual
        );
        assert!(matches!(
            ReportingPeriod::from_str("monthly"),
            Err(ValidationError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn only_cash_flow_needs_per_share_step() {
        assert!(!ValuationMethod::Earnings.needs_per_share());
        assert!(ValuationMethod::OperatingCashFlow.needs_per_share());
    }
}
