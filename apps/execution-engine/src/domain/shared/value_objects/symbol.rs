//! Symbol value object for equity tickers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// A trading symbol (equity ticker such as "AAPL" or "BRK.B").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    ///
    /// The symbol is trimmed and normalized to uppercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Validate the symbol for order submission.
    ///
    /// # Errors
    ///
    /// Returns error if symbol is empty, too long, or contains invalid characters.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            return Err(DomainError::invalid_value("symbol", "Symbol cannot be empty"));
        }

        if self.0.len() > 12 {
            return Err(DomainError::invalid_value(
                "symbol",
                "Symbol exceeds maximum length",
            ));
        }

        // Share-class separators ("BRK.B", "BF/B") are the only non-alphanumerics
        if !self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '/')
        {
            return Err(DomainError::invalid_value(
                "symbol",
                "Symbol contains invalid characters",
            ));
        }

        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_new_normalizes_case_and_whitespace() {
        assert_eq!(Symbol::new(" aapl ").as_str(), "AAPL");
    }

    #[test]
    fn symbol_validate_empty() {
        assert!(Symbol::new("").validate().is_err());
    }

    #[test]
    fn symbol_validate_too_long() {
        assert!(Symbol::new("A".repeat(13)).validate().is_err());
    }

    #[test]
    fn symbol_validate_invalid_chars() {
        assert!(Symbol::new("AAPL!").validate().is_err());
        assert!(Symbol::new("AA PL").validate().is_err());
    }

    #[test]
    fn symbol_validate_share_class() {
        assert!(Symbol::new("BRK.B").validate().is_ok());
        assert!(Symbol::new("AAPL").validate().is_ok());
    }

    #[test]
    fn symbol_ordering_is_lexicographic() {
        let mut symbols = vec![Symbol::new("MSFT"), Symbol::new("AAPL"), Symbol::new("BIL")];
        symbols.sort();
        assert_eq!(symbols[0].as_str(), "AAPL");
        assert_eq!(symbols[2].as_str(), "MSFT");
    }

    #[test]
    fn symbol_serde_roundtrip() {
        let s = Symbol::new("AAPL");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"AAPL\"");
    }
}
