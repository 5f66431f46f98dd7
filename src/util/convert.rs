use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};

use crate::util::text;

/// serde helper for amounts that arrive either as a JSON number or as a numeric string.
///
/// `null` and a missing field both map to `None`. Strings may carry
/// surrounding whitespace; any other string fails the whole decode.
pub fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(serde_json::Number),
        Text(String),
    }

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => text::parse_decimal(&n.to_string())
            .map(Some)
            .map_err(de::Error::custom),
        Some(NumberOrText::Text(s)) => text::parse_decimal(&s)
            .map(Some)
            .map_err(de::Error::custom),
    }
}
