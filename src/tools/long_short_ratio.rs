//! `COINGLASS_LONG_SHORT_RATIO`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    default_true, fetch_error, invalid_arguments, pair_symbol, parse_args, require_non_empty,
    to_pretty_json, Period, Tool, ToolOutput, DEFAULT_EXCHANGE,
};
use crate::coinglass::{CoinglassService, GlobalAccountRatioPoint, HistoryQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    symbol: String,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default)]
    period: Period,
    #[serde(default = "default_true")]
    pretty_format: bool,
}

pub struct LongShortRatioTool;

#[async_trait]
impl Tool for LongShortRatioTool {
    fn name(&self) -> &'static str {
        "COINGLASS_LONG_SHORT_RATIO"
    }

    fn description(&self) -> &'static str {
        "Get global account long/short ratio history snapshot for a symbol"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {"type": "string", "minLength": 1, "description": "Coin or pair, e.g., BTC or BTCUSDT"},
                "exchange": {"type": "string", "description": "Exchange, defaults to Binance"},
                "period": {"type": "string", "enum": ["1h", "4h", "12h", "24h"], "default": "24h"},
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

        let symbol = pair_symbol(&args.symbol);
        let query = HistoryQuery {
            symbol: symbol.clone(),
            exchange: Some(
                args.exchange
                    .unwrap_or_else(|| DEFAULT_EXCHANGE.to_string()),
            ),
            interval: args.period.upstream_interval().to_string(),
            limit: Some(1),
        };
        let points = match service.global_account_ratio_history(&query).await {
            Ok(points) => points,
            Err(e) => return fetch_error("long/short ratio", &e),
        };

        let data = json!({ "raw": points });
        if args.pretty_format {
            ToolOutput::text(format!(
                "{}\n\n{}",
                summarize(&symbol, args.period, points.last()),
                to_pretty_json(&data)
            ))
        } else {
            ToolOutput::text(to_pretty_json(&data))
        }
    }
}

fn summarize(symbol: &str, period: Period, latest: Option<&GlobalAccountRatioPoint>) -> String {
    match latest {
        Some(point) => format!(
            "Long/Short Ratio for {symbol} ({}):\nLong: {:.1}% | Short: {:.1}% | Ratio: {:.2}",
            period.label(),
            point.global_account_long_percent,
            point.global_account_short_percent,
            point.global_account_long_short_ratio,
        ),
        None => format!(
            "Long/Short Ratio for {symbol} ({}):\nNo data returned",
            period.label()
        ),
    }
}
