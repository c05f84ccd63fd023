//! `COINGLASS_LIQUIDATIONS_PAIR` and `COINGLASS_LIQUIDATIONS_COIN`

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    base_coin, check_limit, default_true, fetch_error, invalid_arguments, pair_symbol,
    parse_args, require_non_empty, to_pretty_json, Interval, Tool, ToolOutput, MAX_LIMIT,
};
use crate::coinglass::{
    CoinAggregatedLiquidationPoint, CoinLiquidationQuery, CoinglassService,
    PairLiquidationPoint, PairLiquidationQuery,
};
use crate::utils::decimal::to_millions;

#[derive(Debug, Deserialize)]
struct PairArgs {
    exchange: String,
    symbol: String,
    #[serde(default)]
    interval: Interval,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    start_time: Option<i64>,
    #[serde(default)]
    end_time: Option<i64>,
    #[serde(default = "default_true", rename = "prettyFormat")]
    pretty_format: bool,
}

#[derive(Debug, Deserialize)]
struct CoinArgs {
    exchange_list: String,
    symbol: String,
    #[serde(default)]
    interval: Interval,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    start_time: Option<i64>,
    #[serde(default)]
    end_time: Option<i64>,
    #[serde(default = "default_true", rename = "prettyFormat")]
    pretty_format: bool,
}

fn history_properties() -> Value {
    json!({
        "interval": {"type": "string", "enum": Interval::ALL, "default": "1d"},
        "limit": {"type": "integer", "minimum": 1, "maximum": MAX_LIMIT},
        "start_time": {"type": "integer", "description": "Start timestamp in milliseconds"},
        "end_time": {"type": "integer", "description": "End timestamp in milliseconds"},
        "prettyFormat": {"type": "boolean", "default": true, "description": "When true (default), returns a human-readable summary; when false, returns raw API-shaped data."}
    })
}

fn schema_with(extra: Value, required: &[&str]) -> Value {
    let mut properties = history_properties();
    if let (Some(props), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        props.extend(extra);
    }
    json!({"type": "object", "properties": properties, "required": required})
}

/// Running long/short totals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Totals {
    long: Decimal,
    short: Decimal,
}

fn render(title: &str, count: usize, latest: Option<Totals>, totals: Totals) -> String {
    let latest = latest.unwrap_or_default();
    format!(
        "{title} [{count} points]:\nLatest: Long ${:.2}M | Short ${:.2}M\nTotals: Long ${:.2}M | Short ${:.2}M",
        to_millions(latest.long),
        to_millions(latest.short),
        to_millions(totals.long),
        to_millions(totals.short),
    )
}

fn summarize_pair(symbol: &str, points: &[PairLiquidationPoint]) -> (String, Totals) {
    let as_totals = |p: &PairLiquidationPoint| Totals {
        long: p.long_liquidation_usd,
        short: p.short_liquidation_usd,
    };
    let totals = points.iter().map(as_totals).fold(Totals::default(), |acc, t| Totals {
        long: acc.long + t.long,
        short: acc.short + t.short,
    });
    let text = render(
        &format!("Liquidations (Pair) for {symbol}"),
        points.len(),
        points.last().map(as_totals),
        totals,
    );
    (text, totals)
}

fn summarize_coin(symbol: &str, points: &[CoinAggregatedLiquidationPoint]) -> (String, Totals) {
    let as_totals = |p: &CoinAggregatedLiquidationPoint| Totals {
        long: p.aggregated_long_liquidation_usd,
        short: p.aggregated_short_liquidation_usd,
    };
    let totals = points.iter().map(as_totals).fold(Totals::default(), |acc, t| Totals {
        long: acc.long + t.long,
        short: acc.short + t.short,
    });
    let text = render(
        &format!("Liquidations (Coin Aggregated) for {symbol}"),
        points.len(),
        points.last().map(as_totals),
        totals,
    );
    (text, totals)
}

pub struct PairLiquidationsTool;

#[async_trait]
impl Tool for PairLiquidationsTool {
    fn name(&self) -> &'static str {
        "COINGLASS_LIQUIDATIONS_PAIR"
    }

    fn description(&self) -> &'static str {
        "Get liquidation history for a specific futures pair"
    }

    fn input_schema(&self) -> Value {
        schema_with(
            json!({
                "exchange": {"type": "string", "minLength": 1, "description": "Futures exchange, e.g., Binance"},
                "symbol": {"type": "string", "minLength": 1, "description": "Trading pair, e.g., BTCUSDT"}
            }),
            &["exchange", "symbol"],
        )
    }

    async fn call(&self, service: &CoinglassService, arguments: Value) -> ToolOutput {
        let args: PairArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return invalid_arguments(e),
        };
        if let Err(e) = require_non_empty("exchange", &args.exchange)
            .and_then(|_| require_non_empty("symbol", &args.symbol))
            .and_then(|_| check_limit(args.limit))
        {
            return invalid_arguments(e);
        }

        let symbol = pair_symbol(&args.symbol);
        let query = PairLiquidationQuery {
            exchange: args.exchange.trim().to_string(),
            symbol: symbol.clone(),
            interval: args.interval.as_str().to_string(),
            limit: args.limit,
            start_time: args.start_time,
            end_time: args.end_time,
        };
        let points = match service.pair_liquidation_history(&query).await {
            Ok(points) => points,
            Err(e) => return fetch_error("pair liquidations", &e),
        };

        if !args.pretty_format {
            return ToolOutput::text(to_pretty_json(&json!({ "raw": points })));
        }

        let (summary, totals) = summarize_pair(&symbol, &points);
        let data = json!({
            "latest": points.last(),
            "totals": {"long": totals.long, "short": totals.short},
            "points": points,
        });
        ToolOutput::text(format!("{summary}\n\n{}", to_pretty_json(&data)))
    }
}

pub struct CoinLiquidationsTool;

#[async_trait]
impl Tool for CoinLiquidationsTool {
    fn name(&self) -> &'static str {
        "COINGLASS_LIQUIDATIONS_COIN"
    }

    fn description(&self) -> &'static str {
        "Get aggregated liquidation history for a coin across exchanges"
    }

    fn input_schema(&self) -> Value {
        schema_with(
            json!({
                "exchange_list": {"type": "string", "minLength": 1, "description": "Comma-separated exchanges to aggregate, e.g., Binance,OKX,Bybit"},
                "symbol": {"type": "string", "minLength": 1, "description": "Coin symbol, e.g., BTC"}
            }),
            &["exchange_list", "symbol"],
        )
    }

    async fn call(&self, service: &CoinglassService, arguments: Value) -> ToolOutput {
        let args: CoinArgs = match parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return invalid_arguments(e),
        };
        if let Err(e) = require_non_empty("exchange_list", &args.exchange_list)
            .and_then(|_| require_non_empty("symbol", &args.symbol))
            .and_then(|_| check_limit(args.limit))
        {
            return invalid_arguments(e);
        }

        let symbol = base_coin(&args.symbol);
        let exchange_list = args
            .exchange_list
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        let query = CoinLiquidationQuery {
            exchange_list,
            symbol: symbol.clone(),
            interval: args.interval.as_str().to_string(),
            limit: args.limit,
            start_time: args.start_time,
            end_time: args.end_time,
        };
        let points = match service.coin_aggregated_liquidation_history(&query).await {
            Ok(points) => points,
            Err(e) => return fetch_error("coin aggregated liquidations", &e),
        };

        if !args.pretty_format {
            return ToolOutput::text(to_pretty_json(&json!({ "raw": points })));
        }

        let (summary, totals) = summarize_coin(&symbol, &points);
        let data = json!({
            "latest": points.last(),
            "totals": {"long": totals.long, "short": totals.short},
            "points": points,
        });
        ToolOutput::text(format!("{summary}\n\n{}", to_pretty_json(&data)))
    }
}
