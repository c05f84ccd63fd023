//! `COINGLASS_OPEN_INTEREST`

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    base_coin, default_true, fetch_error, invalid_arguments, pair_symbol, parse_args,
    require_non_empty, to_pretty_json, Period, Tool, ToolOutput, DEFAULT_EXCHANGE,
};
use crate::coinglass::{CoinglassService, HistoryQuery, OpenInterestExchangeItem};

/// Candles fetched when history is requested.
const HISTORY_POINTS: u32 = 48;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    symbol: String,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default)]
    include_history: bool,
    #[serde(default)]
    period: Period,
    #[serde(default = "default_true")]
    pretty_format: bool,
}

pub struct OpenInterestTool;

#[async_trait]
impl Tool for OpenInterestTool {
    fn name(&self) -> &'static str {
        "COINGLASS_OPEN_INTEREST"
    }

    fn description(&self) -> &'static str {
        "Get open interest exchange list and optional OI history for a symbol"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {"type": "string", "minLength": 1, "description": "Base asset symbol, e.g., BTC or BTCUSDT"},
                "exchange": {"type": "string", "description": "Optional exchange filter for history, e.g., Binance"},
                "includeHistory": {"type": "boolean", "default": false},
                "period": {"type": "string", "enum": ["1h", "4h", "12h", "24h"], "default": "24h"},
                "prettyFormat": {"type": "boolean", "default": true, "description": "When true (default), returns a human-readable summary; when false, returns raw API-shaped data."}
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
        let exchange_list = match service.open_interest_exchange_list(&coin).await {
            Ok(items) => items,
            Err(e) => return fetch_error("open interest", &e),
        };

        let history = if args.include_history {
            let query = HistoryQuery {
                symbol: pair_symbol(&args.symbol),
                exchange: Some(
                    args.exchange
                        .clone()
                        .unwrap_or_else(|| DEFAULT_EXCHANGE.to_string()),
                ),
                interval: args.period.upstream_interval().to_string(),
                limit: Some(HISTORY_POINTS),
            };
            match service.open_interest_history(&query).await {
                Ok(points) => Some(points),
                Err(e) => return fetch_error("open interest history", &e),
            }
        } else {
            None
        };

        let data = json!({ "exchangeList": exchange_list, "history": history });
        if args.pretty_format {
            ToolOutput::text(format!(
                "{}\n\n{}",
                summarize(&coin, &exchange_list),
                to_pretty_json(&data)
            ))
        } else {
            ToolOutput::text(to_pretty_json(&data))
        }
    }
}

fn summarize(coin: &str, items: &[OpenInterestExchangeItem]) -> String {
    let aggregate = items.iter().find(|item| item.is_aggregate());
    let total = aggregate.map(|a| a.open_interest_usd).unwrap_or_default();
    // Missing change is shown as flat.
    let change_24h = aggregate
        .and_then(|a| a.open_interest_change_percent_24h)
        .unwrap_or(Decimal::ZERO);

    format!(
        "Open Interest for {coin}:\nTotal OI (All): ${:.0}\n24h Change: {:.2}%",
        total, change_24h
    )
}
