//! `COINGLASS_FUNDING_RATE`

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{
    base_coin, default_true, fetch_error, format_millis, invalid_arguments, parse_args,
    require_non_empty, to_pretty_json, Tool, ToolOutput,
};
use crate::coinglass::{CoinglassService, FundingRateSymbolItem};
use crate::utils::decimal::{safe_div, to_percent};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    symbol: String,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default = "default_true")]
    pretty_format: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeRate {
    exchange: String,
    rate: Decimal,
    next_funding_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct FundingSnapshot {
    average_rate: Decimal,
    next_funding_time: Option<i64>,
    exchanges: Vec<ExchangeRate>,
}

/// Average the stablecoin-margined rates and find the soonest settlement.
fn snapshot(items: &[FundingRateSymbolItem], exchange: Option<&str>) -> FundingSnapshot {
    let exchanges: Vec<ExchangeRate> = items
        .iter()
        .flat_map(|item| item.stablecoin_margin_list.iter())
        .filter(|entry| exchange.map_or(true, |e| entry.exchange.eq_ignore_ascii_case(e)))
        .map(|entry| ExchangeRate {
            exchange: entry.exchange.clone(),
            rate: entry.funding_rate,
            next_funding_time: entry.next_funding_time.filter(|t| *t > 0),
        })
        .collect();

    let sum: Decimal = exchanges.iter().map(|e| e.rate).sum();
    let average_rate = safe_div(sum, Decimal::from(exchanges.len()));
    let next_funding_time = exchanges.iter().filter_map(|e| e.next_funding_time).min();

    FundingSnapshot {
        average_rate,
        next_funding_time,
        exchanges,
    }
}

pub struct FundingRateTool;

#[async_trait]
impl Tool for FundingRateTool {
    fn name(&self) -> &'static str {
        "COINGLASS_FUNDING_RATE"
    }

    fn description(&self) -> &'static str {
        "Get current funding rate across exchanges for a symbol"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {"type": "string", "minLength": 1, "description": "Base asset symbol, e.g., BTC or BTCUSDT"},
                "exchange": {"type": "string", "description": "Optional exchange filter, e.g., Binance"},
                "prettyFormat": {"type": "boolean", "default": true}
            },
            "required": ["symbol"]
        })
    }

    async fn call(&self, service: &CoinglassService, arguments: Value) -> ToolOutput {
        let args: Args = match parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return invalid_arguments(e),
        };
        if let Err(e) = require_non_empty("symbol", &args.symbol) {
            return invalid_arguments(e);
        }

        let coin = base_coin(&args.symbol);
        let exchange = args.exchange.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let items = match service.funding_rate_exchange_list(&coin, exchange).await {
            Ok(items) => items,
            Err(e) => return fetch_error("funding rate", &e),
        };

        if !args.pretty_format {
            return ToolOutput::text(to_pretty_json(&json!({ "raw": items })));
        }

        let snapshot = snapshot(&items, exchange);
        let summary = format!(
            "Funding Rate for {coin}USDT:\nAverage: {:.4}% | Next Funding: {}\nExchanges: {}",
            to_percent(snapshot.average_rate),
            snapshot
                .next_funding_time
                .map(format_millis)
                .unwrap_or_else(|| "unknown".to_string()),
            snapshot.exchanges.len(),
        );
        ToolOutput::text(format!("{summary}\n\n{}", to_pretty_json(&snapshot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coinglass::client::testing::{ok, ScriptedTransport};
    use crate::tools::testing::service;
    use rust_decimal_macros::dec;

    const BODY: &str = r#"{"code":"0","data":[{"symbol":"BTC","stablecoin_margin_list":[
        {"exchange":"Binance","funding_rate":"0.0001","next_funding_time":1745251200000},
        {"exchange":"OKX","funding_rate":0.0003,"next_funding_time":1745222400000}
    ],"token_margin_list":[{"exchange":"Binance","funding_rate":"0.01"}]}]}"#;

    #[tokio::test]
    async fn test_average_and_next_funding() {
        let transport = ScriptedTransport::new(vec![ok(BODY)]);
        let output = FundingRateTool
            .call(&service(transport.clone()), json!({"symbol": "BTCUSDT"}))
            .await;

        assert!(!output.is_error, "{}", output.text);
        assert!(output.text.starts_with("Funding Rate for BTCUSDT:"));
        assert!(output.text.contains("Average: 0.0200%"));
        assert!(output.text.contains("Next Funding: 2025-04-21T08:00:00Z"));
        assert!(output.text.contains("Exchanges: 2"));
        assert_eq!(
            transport.requests()[0].query,
            vec![("symbol".to_string(), "BTC".to_string())]
        );
    }

    #[test]
    fn test_exchange_filter_and_empty_average() {
        let items: Vec<FundingRateSymbolItem> =
            serde_json::from_value(serde_json::from_str::<Value>(BODY).unwrap()["data"].clone())
                .unwrap();

        let okx = snapshot(&items, Some("okx"));
        assert_eq!(okx.exchanges.len(), 1);
        assert_eq!(okx.average_rate, dec!(0.0003));

        let none = snapshot(&items, Some("Bybit"));
        assert_eq!(none.average_rate, Decimal::ZERO);
        assert_eq!(none.next_funding_time, None);
    }
}
