//! Agent-facing tools built on top of [`CoinglassService`].
//!
//! Each tool decodes its JSON arguments, normalizes symbols and intervals for
//! the endpoints it calls, and renders either a short summary followed by the
//! data, or the data alone. Failures are rendered as text; nothing here
//! retries or validates upstream responses.

mod funding_rate;
mod hyperliquid;
mod liquidations;
mod long_short_ratio;
mod open_interest;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::coinglass::{CoinglassError, CoinglassService};

pub use funding_rate::FundingRateTool;
pub use hyperliquid::{WhaleAlertTool, WhalePositionTool};
pub use liquidations::{CoinLiquidationsTool, PairLiquidationsTool};
pub use long_short_ratio::LongShortRatioTool;
pub use open_interest::OpenInterestTool;

/// Text returned to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON Schema of the accepted arguments.
    fn input_schema(&self) -> Value;
    async fn call(&self, service: &CoinglassService, arguments: Value) -> ToolOutput;
}

/// All tools, bound to one shared service.
pub struct ToolRegistry {
    service: CoinglassService,
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new(service: CoinglassService) -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(OpenInterestTool),
            Box::new(PairLiquidationsTool),
            Box::new(CoinLiquidationsTool),
            Box::new(LongShortRatioTool),
            Box::new(FundingRateTool),
            Box::new(WhaleAlertTool),
            Box::new(WhalePositionTool),
        ];
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, tool)| (tool.name(), i))
            .collect();

        Self {
            service,
            tools,
            index,
        }
    }

    pub fn tools(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|tool| tool.as_ref())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// Invoke a tool by name. Returns `None` when no such tool exists.
    pub async fn call(&self, name: &str, arguments: Value) -> Option<ToolOutput> {
        let tool = self.get(name)?;
        info!(tool = name, "Calling tool");
        let output = tool.call(&self.service, arguments).await;
        if output.is_error {
            warn!(tool = name, "Tool call failed");
        }
        Some(output)
    }
}

/// Decode tool arguments; a missing argument object counts as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, String> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {e}"))
}

pub(crate) fn invalid_arguments(message: impl Into<String>) -> ToolOutput {
    ToolOutput::error(message)
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("Invalid arguments: `{field}` must not be empty"))
    } else {
        Ok(())
    }
}

/// Largest history window the upstream accepts.
pub(crate) const MAX_LIMIT: u32 = 4500;

pub(crate) fn check_limit(limit: Option<u32>) -> Result<(), String> {
    match limit {
        Some(l) if !(1..=MAX_LIMIT).contains(&l) => Err(format!(
            "Invalid arguments: `limit` must be between 1 and {MAX_LIMIT}"
        )),
        _ => Ok(()),
    }
}

/// Render a client failure for the host, including a hint about what to do.
pub(crate) fn fetch_error(what: &str, err: &CoinglassError) -> ToolOutput {
    ToolOutput::error(format!(
        "Error fetching {what}: {err}\nHint: {}",
        err.kind().hint()
    ))
}

pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

/// Upper-cased coin with any trailing `USDT` removed (`btcusdt` -> `BTC`).
pub(crate) fn base_coin(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    match upper.strip_suffix("USDT") {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => upper,
    }
}

/// Upper-cased pair with `USDT` appended when missing (`btc` -> `BTCUSDT`).
pub(crate) fn pair_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    if upper.ends_with("USDT") {
        upper
    } else {
        format!("{upper}USDT")
    }
}

/// Exchange used for pair-level endpoints when the caller names none.
pub(crate) const DEFAULT_EXCHANGE: &str = "Binance";

pub(crate) fn default_true() -> bool {
    true
}

/// Millisecond timestamp as RFC 3339, or `unknown`.
pub(crate) fn format_millis(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .filter(|_| ms > 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Summary period accepted by the snapshot tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "12h")]
    H12,
    #[default]
    #[serde(rename = "24h")]
    H24,
}

impl Period {
    /// Interval name the upstream expects.
    pub fn upstream_interval(&self) -> &'static str {
        match self {
            Period::H1 => "1h",
            Period::H4 => "4h",
            Period::H12 => "12h",
            Period::H24 => "1d",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::H1 => "1h",
            Period::H4 => "4h",
            Period::H12 => "12h",
            Period::H24 => "24h",
        }
    }
}

/// Candle interval accepted by the liquidation tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "8h")]
    H8,
    #[serde(rename = "12h")]
    H12,
    #[default]
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

impl Interval {
    pub const ALL: [&'static str; 12] = [
        "1m", "3m", "5m", "15m", "30m", "1h", "4h", "6h", "8h", "12h", "1d", "1w",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M3 => "3m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H4 => "4h",
            Interval::H6 => "6h",
            Interval::H8 => "8h",
            Interval::H12 => "12h",
            Interval::D1 => "1d",
            Interval::W1 => "1w",
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::coinglass::client::testing::{client, ScriptedTransport};
    use crate::coinglass::CoinglassService;

    pub fn service(transport: Arc<ScriptedTransport>) -> CoinglassService {
        CoinglassService::new(Arc::new(client(transport, 0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coinglass::client::testing::{ok, ScriptedTransport};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("btc", "BTC")]
    #[case("BTCUSDT", "BTC")]
    #[case(" ethusdt ", "ETH")]
    #[case("USDT", "USDT")]
    fn test_base_coin(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(base_coin(input), expected);
    }

    #[rstest]
    #[case("btc", "BTCUSDT")]
    #[case("BTCUSDT", "BTCUSDT")]
    #[case("solusdt", "SOLUSDT")]
    fn test_pair_symbol(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(pair_symbol(input), expected);
    }

    #[test]
    fn test_period_maps_24h_to_daily() {
        assert_eq!(Period::default().upstream_interval(), "1d");
        let p: Period = serde_json::from_value(json!("4h")).unwrap();
        assert_eq!(p.upstream_interval(), "4h");
        assert!(serde_json::from_value::<Period>(json!("2h")).is_err());
    }

    #[test]
    fn test_interval_names_round_trip_through_serde() {
        for name in Interval::ALL {
            let interval: Interval = serde_json::from_value(json!(name)).unwrap();
            assert_eq!(interval.as_str(), name);
        }
    }

    #[test]
    fn test_check_limit_bounds() {
        assert!(check_limit(None).is_ok());
        assert!(check_limit(Some(1)).is_ok());
        assert!(check_limit(Some(4500)).is_ok());
        assert!(check_limit(Some(0)).is_err());
        assert!(check_limit(Some(4501)).is_err());
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(1_745_222_400_000), "2025-04-21T08:00:00Z");
        assert_eq!(format_millis(0), "unknown");
    }

    #[tokio::test]
    async fn test_registry_lists_and_dispatches() {
        let transport = ScriptedTransport::new(vec![ok(r#"{"code":"0","data":[]}"#)]);
        let registry = ToolRegistry::new(testing::service(transport.clone()));

        let names: Vec<_> = registry.tools().map(|t| t.name()).collect();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"COINGLASS_FUNDING_RATE"));

        assert!(registry.call("NOPE", Value::Null).await.is_none());

        let output = registry
            .call("COINGLASS_HYPERLIQUID_WHALE_ALERT", Value::Null)
            .await
            .unwrap();
        assert!(!output.is_error);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_every_schema_is_an_object_schema() {
        let registry = ToolRegistry::new(testing::service(ScriptedTransport::new(vec![])));
        for tool in registry.tools() {
            let schema = tool.input_schema();
            assert_eq!(schema["type"], "object", "{}", tool.name());
            assert!(!tool.description().is_empty());
        }
    }
}
