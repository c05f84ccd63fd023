//! Typed payload records for Coinglass endpoints.
//!
//! Numeric fields are delivered as JSON numbers or numeric strings depending
//! on endpoint and mood; both are coerced to `Decimal` here and anything that
//! does not parse is rejected.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::decimal::{
    deserialize_decimal, deserialize_decimal_opt, deserialize_integer, deserialize_integer_opt,
};

/// One row of `/api/futures/open-interest/exchange-list`.
///
/// The row with `exchange == "All"` aggregates every venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestExchangeItem {
    #[serde(default)]
    pub exchange: Option<String>,
    pub symbol: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub open_interest_usd: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_by_coin_margin: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_by_stable_coin_margin: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_quantity_by_coin_margin: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_quantity_by_stable_coin_margin: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_change_percent_5m: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_change_percent_15m: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_change_percent_30m: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_change_percent_1h: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_change_percent_4h: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    pub open_interest_change_percent_24h: Option<Decimal>,
}

impl OpenInterestExchangeItem {
    /// Whether this is the cross-exchange aggregate row.
    pub fn is_aggregate(&self) -> bool {
        self.exchange.as_deref() == Some("All")
    }
}

/// One OHLC candle of `/api/futures/open-interest/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestHistoryPoint {
    #[serde(deserialize_with = "deserialize_integer")]
    pub time: i64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub open: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub high: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub low: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub close: Decimal,
}

/// Funding data for one exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRateEntry {
    pub exchange: String,
    #[serde(alias = "fundingRate", deserialize_with = "deserialize_decimal")]
    pub funding_rate: Decimal,
    /// Settlement interval in hours
    #[serde(
        default,
        alias = "fundingRateInterval",
        deserialize_with = "deserialize_integer_opt"
    )]
    pub funding_rate_interval: Option<i64>,
    #[serde(
        default,
        alias = "predictedFundingRate",
        deserialize_with = "deserialize_decimal_opt"
    )]
    pub predicted_funding_rate: Option<Decimal>,
    #[serde(
        default,
        alias = "nextFundingTime",
        deserialize_with = "deserialize_integer_opt"
    )]
    pub next_funding_time: Option<i64>,
}

/// One symbol of `/api/futures/funding-rate/exchange-list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRateSymbolItem {
    pub symbol: String,
    /// USDT/USD-margined contracts
    #[serde(default, alias = "usdtOrUsdMarginList")]
    pub stablecoin_margin_list: Vec<FundingRateEntry>,
    /// Coin-margined contracts
    #[serde(default, alias = "tokenMarginList")]
    pub token_margin_list: Vec<FundingRateEntry>,
}

/// One bucket of `/api/futures/liquidation/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairLiquidationPoint {
    #[serde(deserialize_with = "deserialize_integer")]
    pub time: i64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub long_liquidation_usd: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub short_liquidation_usd: Decimal,
}

/// One bucket of `/api/futures/liquidation/aggregated-history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinAggregatedLiquidationPoint {
    #[serde(deserialize_with = "deserialize_integer")]
    pub time: i64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub aggregated_long_liquidation_usd: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub aggregated_short_liquidation_usd: Decimal,
}

/// One bucket of `/api/futures/global-long-short-account-ratio/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalAccountRatioPoint {
    #[serde(deserialize_with = "deserialize_integer")]
    pub time: i64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub global_account_long_percent: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub global_account_short_percent: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub global_account_long_short_ratio: Decimal,
}

/// Whether a whale alert opened or closed a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionAction {
    Open,
    Close,
    Other(i64),
}

impl From<i64> for PositionAction {
    fn from(code: i64) -> Self {
        match code {
            1 => PositionAction::Open,
            2 => PositionAction::Close,
            other => PositionAction::Other(other),
        }
    }
}

impl fmt::Display for PositionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionAction::Open => write!(f, "open"),
            PositionAction::Close => write!(f, "close"),
            PositionAction::Other(code) => write!(f, "action {code}"),
        }
    }
}

/// One event of `/api/hyperliquid/whale-alert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperliquidWhaleAlertItem {
    pub user: String,
    pub symbol: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub position_size: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub entry_price: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub liq_price: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub position_value_usd: Decimal,
    /// 1 = open, 2 = close
    #[serde(deserialize_with = "deserialize_integer")]
    pub position_action: i64,
    #[serde(deserialize_with = "deserialize_integer")]
    pub create_time: i64,
}

impl HyperliquidWhaleAlertItem {
    pub fn action(&self) -> PositionAction {
        PositionAction::from(self.position_action)
    }
}

/// One position of `/api/hyperliquid/whale-position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperliquidWhalePositionItem {
    pub user: String,
    pub symbol: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub position_size: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub entry_price: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub mark_price: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub liq_price: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub leverage: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub margin_balance: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub position_value_usd: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub unrealized_pnl: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub funding_fee: Decimal,
    pub margin_mode: String,
    #[serde(deserialize_with = "deserialize_integer")]
    pub create_time: i64,
    #[serde(deserialize_with = "deserialize_integer")]
    pub update_time: i64,
}
