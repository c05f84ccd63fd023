//! Decimal helpers: lenient number decoding and summary arithmetic.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer};

/// A JSON value the upstream may send either as a number or as a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

/// Parse a decimal from plain or scientific notation.
pub fn parse_decimal(text: &str) -> Result<Decimal, String> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| format!("invalid decimal value {text:?}"))
}

fn coerce(value: NumberOrString) -> Result<Decimal, String> {
    match value {
        NumberOrString::Number(n) => parse_decimal(&n.to_string()),
        NumberOrString::Text(s) => parse_decimal(&s),
    }
}

/// Deserialize a required decimal from a JSON number or numeric string.
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = NumberOrString::deserialize(deserializer)?;
    coerce(value).map_err(serde::de::Error::custom)
}

/// Deserialize an optional decimal. `null` and empty strings mean "not provided";
/// anything else must parse. Pair with `#[serde(default)]` for absent fields.
pub fn deserialize_decimal_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => coerce(value).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Deserialize an integer (timestamps, enum codes) sent as a number or numeric string.
pub fn deserialize_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::Text(s) => s,
    };
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| {
            parse_decimal(text)
                .ok()
                .and_then(|d| i64::try_from(d.trunc()).ok())
        })
        .ok_or_else(|| serde::de::Error::custom(format!("invalid integer {text:?}")))
}

/// Optional variant of [`deserialize_integer`].
pub fn deserialize_integer_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_integer")] i64);

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => Wrapper::deserialize(value)
            .map(|w| Some(w.0))
            .map_err(serde::de::Error::custom),
    }
}

/// Safe division that returns zero if divisor is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Express a USD amount in millions.
pub fn to_millions(value: Decimal) -> Decimal {
    value / dec!(1_000_000)
}

/// Express a fractional rate as a percentage.
pub fn to_percent(rate: Decimal) -> Decimal {
    rate * dec!(100)
}
