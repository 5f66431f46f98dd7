use rust_decimal::Decimal;
use serde::Deserialize;

use crate::util::convert;

/// 報價來源回傳的一筆幣對報價
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub source_currency: Option<String>,
    #[serde(default)]
    pub target_currency: Option<String>,
    #[serde(default, deserialize_with = "convert::deserialize_optional_decimal")]
    pub amount: Option<Decimal>,
}

impl Quote {
    pub fn new(source: &str, target: &str, amount: Option<Decimal>) -> Self {
        Quote {
            source_currency: Some(source.to_string()),
            target_currency: Some(target.to_string()),
            amount,
        }
    }

    /// Exact, case-sensitive pair match.
    pub fn is_pair(&self, source: &str, target: &str) -> bool {
        self.source_currency.as_deref() == Some(source)
            && self.target_currency.as_deref() == Some(target)
    }
}

/// What one poll cycle ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The price changed and the board was redrawn.
    Rendered(String),
    /// The price matched what is already on screen.
    Unchanged(String),
    /// No quote for the pair, or the quote had no amount.
    NoMatch,
    /// The cycle failed; the message was shown on screen.
    Failed(String),
}
