//! Asset pairs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An ordered `(base, quote)` pair of denominations, written `base:quote`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    pub base: String,
    pub quote: String,
}

/// Error parsing an [`AssetPair`] from its string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid asset pair '{0}': expected 'base:quote'")]
pub struct ParsePairError(pub String);

impl AssetPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.base, self.quote)
    }
}

impl FromStr for AssetPair {
    type Err = ParsePairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((base, quote))
                if !base.is_empty() && !quote.is_empty() && !quote.contains(':') =>
            {
                Ok(Self::new(base, quote))
            }
            _ => Err(ParsePairError(s.to_string())),
        }
    }
}
