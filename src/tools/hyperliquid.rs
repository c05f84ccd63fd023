//! `COINGLASS_HYPERLIQUID_WHALE_ALERT` and `COINGLASS_HYPERLIQUID_WHALE_POSITION`

use std::cmp::Reverse;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    default_true, fetch_error, format_millis, invalid_arguments, parse_args, to_pretty_json, Tool,
    ToolOutput,
};
use crate::coinglass::{
    CoinglassService, HyperliquidWhaleAlertItem, HyperliquidWhalePositionItem,
};
use crate::utils::decimal::to_millions;

/// Rows shown in the summary.
const SUMMARY_ROWS: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    #[serde(default = "default_true")]
    pretty_format: bool,
}

fn no_arguments_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "prettyFormat": {"type": "boolean", "default": true}
        }
    })
}

fn side(position_size: rust_decimal::Decimal) -> &'static str {
    if position_size.is_sign_negative() {
        "short"
    } else {
        "long"
    }
}

fn summarize_alerts(items: &[HyperliquidWhaleAlertItem]) -> String {
    let mut text = format!("Hyperliquid Whale Alerts: {} events", items.len());
    for item in items.iter().take(SUMMARY_ROWS) {
        text.push_str(&format!(
            "\n- {} {} {} ${:.2}M @ {} ({})",
            item.symbol,
            item.action(),
            side(item.position_size),
            to_millions(item.position_value_usd),
            item.entry_price.normalize(),
            format_millis(item.create_time),
        ));
    }
    text
}

fn summarize_positions(items: &[HyperliquidWhalePositionItem]) -> String {
    let mut largest: Vec<&HyperliquidWhalePositionItem> = items.iter().collect();
    largest.sort_by_key(|item| Reverse(item.position_value_usd.abs()));

    let mut text = format!("Hyperliquid Whale Positions: {} positions", items.len());
    for item in largest.into_iter().take(SUMMARY_ROWS) {
        text.push_str(&format!(
            "\n- {} {} ${:.2}M | {}x | uPnL ${:.0} | liq {}",
            item.symbol,
            side(item.position_size),
            to_millions(item.position_value_usd),
            item.leverage.normalize(),
            item.unrealized_pnl,
            item.liq_price.normalize(),
        ));
    }
    text
}

pub struct WhaleAlertTool;

#[async_trait]
impl Tool for WhaleAlertTool {
    fn name(&self) -> &'static str {
        "COINGLASS_HYPERLIQUID_WHALE_ALERT"
    }

    fn description(&self) -> &'static str {
        "Get recent Hyperliquid whale alerts (large position opens and closes)"
    }

    fn input_schema(&self) -> Value {
        no_arguments_schema()
    }

    async fn call(&self, service: &CoinglassService, arguments: Value) -> ToolOutput {
        let args: Args = match parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return invalid_arguments(e),
        };
        let items = match service.hyperliquid_whale_alerts().await {
            Ok(items) => items,
            Err(e) => return fetch_error("Hyperliquid whale alerts", &e),
        };

        let data = json!({ "raw": items });
        if args.pretty_format {
            ToolOutput::text(format!("{}\n\n{}", summarize_alerts(&items), to_pretty_json(&data)))
        } else {
            ToolOutput::text(to_pretty_json(&data))
        }
    }
}

pub struct WhalePositionTool;

#[async_trait]
impl Tool for WhalePositionTool {
    fn name(&self) -> &'static str {
        "COINGLASS_HYPERLIQUID_WHALE_POSITION"
    }

    fn description(&self) -> &'static str {
        "Get current Hyperliquid whale positions"
    }

    fn input_schema(&self) -> Value {
        no_arguments_schema()
    }

    async fn call(&self, service: &CoinglassService, arguments: Value) -> ToolOutput {
        let args: Args = match parse_args(arguments) {
            Ok(args) => args,
            Err(e) => return invalid_arguments(e),
        };
        let items = match service.hyperliquid_whale_positions().await {
            Ok(items) => items,
            Err(e) => return fetch_error("Hyperliquid whale positions", &e),
        };

        let data = json!({ "raw": items });
        if args.pretty_format {
            ToolOutput::text(format!(
                "{}\n\n{}",
                summarize_positions(&items),
                to_pretty_json(&data)
            ))
        } else {
            ToolOutput::text(to_pretty_json(&data))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coinglass::client::testing::{ok, status, ScriptedTransport};
    use crate::tools::testing::service;

    const ALERTS: &str = r#"{"code":"0","data":[
        {"user":"0xa","symbol":"ETH","position_size":"-1200.5","entry_price":3150.2,"liq_price":"4100","position_value_usd":3781000,"position_action":2,"create_time":1745222400000},
        {"user":"0xb","symbol":"BTC","position_size":"30","entry_price":"93000","liq_price":"80000","position_value_usd":"2790000","position_action":1,"create_time":1745222460000}
    ]}"#;

    fn position(symbol: &str, size: &str, value: &str) -> Value {
        json!({
            "user": "0x1", "symbol": symbol, "position_size": size, "entry_price": "1",
            "mark_price": "1", "liq_price": "0.5", "leverage": "10", "margin_balance": "100",
            "position_value_usd": value, "unrealized_pnl": "-1234.4", "funding_fee": "0",
            "margin_mode": "cross", "create_time": 1, "update_time": 2
        })
    }

    #[tokio::test]
    async fn test_alert_summary_lists_events() {
        let transport = ScriptedTransport::new(vec![ok(ALERTS)]);
        let output = WhaleAlertTool.call(&service(transport), json!({})).await;

        assert!(!output.is_error, "{}", output.text);
        assert!(output.text.starts_with("Hyperliquid Whale Alerts: 2 events"));
        assert!(output.text.contains("- ETH close short $3.78M @ 3150.2 (2025-04-21T08:00:00Z)"));
        assert!(output.text.contains("- BTC open long $2.79M"));
    }

    #[tokio::test]
    async fn test_alert_raw_output() {
        let transport = ScriptedTransport::new(vec![ok(ALERTS)]);
        let output = WhaleAlertTool
            .call(&service(transport), json!({"prettyFormat": false}))
            .await;

        let data: Value = serde_json::from_str(&output.text).unwrap();
        assert_eq!(data["raw"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_positions_sorted_by_value() {
        let body = json!({
            "code": "0",
            "data": [
                position("SOL", "10", "1000000"),
                position("BTC", "-5", "9000000"),
                position("ETH", "3", "4000000"),
            ]
        });
        let transport = ScriptedTransport::new(vec![ok(&body.to_string())]);
        let output = WhalePositionTool.call(&service(transport), Value::Null).await;

        assert!(!output.is_error, "{}", output.text);
        let lines: Vec<&str> = output.text.lines().collect();
        assert_eq!(lines[0], "Hyperliquid Whale Positions: 3 positions");
        assert!(lines[1].starts_with("- BTC short $9.00M | 10x"));
        assert!(lines[2].starts_with("- ETH long"));
        assert!(lines[3].starts_with("- SOL long"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_failure_is_rendered() {
        let transport =
            ScriptedTransport::new(vec![status(503), status(503), status(503), status(503)]);
        let output = WhalePositionTool.call(&service(transport), json!({})).await;
        assert!(output.is_error);
        assert!(output.text.starts_with("Error fetching Hyperliquid whale positions:"));
    }
}
