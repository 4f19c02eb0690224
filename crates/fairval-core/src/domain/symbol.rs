use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Longest ticker the quote providers accept, exchange suffix included.
const MAX_TICKER_LEN: usize = 12;

/// Ticker as the providers expect it: uppercase, optionally with an exchange
/// suffix (`7203.T`), a share class (`BRK-B`), an index caret (`^GSPC`) or a
/// currency pair marker (`EURUSD=X`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalizes free-text ticker input. Surrounding whitespace and a
    /// leading cashtag `$` are dropped.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let ticker = trimmed.strip_prefix('$').unwrap_or(trimmed).to_ascii_uppercase();
        if ticker.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }

        let len = ticker.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(ValidationError::TickerTooLong {
                ticker,
                max: MAX_TICKER_LEN,
            });
        }

        let root = ticker.strip_prefix('^').unwrap_or(&ticker);
        if let Some((index, ch)) = root
            .char_indices()
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '=')))
        {
            return Err(ValidationError::TickerInvalidChar { ticker, ch, index });
        }

        let starts_ok = root.starts_with(|ch: char| ch.is_ascii_alphanumeric());
        let ends_ok = root.ends_with(|ch: char| ch.is_ascii_alphanumeric());
        if !starts_ok || !ends_ok {
            return Err(ValidationError::TickerMalformed { ticker });
        }

        Ok(Self(ticker))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
