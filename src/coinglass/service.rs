//! One accessor per Coinglass endpoint.
//!
//! Accessors only build query parameters and pick the payload type; retry,
//! rate limiting and validation all live in the client and envelope layers.
//! Symbols are forwarded exactly as given.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::client::{CoinglassClient, Query};
use super::error::Result;
use super::types::*;

/// Endpoint paths.
pub mod paths {
    pub const OPEN_INTEREST_EXCHANGE_LIST: &str = "/api/futures/open-interest/exchange-list";
    pub const OPEN_INTEREST_HISTORY: &str = "/api/futures/open-interest/history";
    pub const FUNDING_RATE_EXCHANGE_LIST: &str = "/api/futures/funding-rate/exchange-list";
    pub const PAIR_LIQUIDATION_HISTORY: &str = "/api/futures/liquidation/history";
    pub const COIN_LIQUIDATION_HISTORY: &str = "/api/futures/liquidation/aggregated-history";
    pub const GLOBAL_ACCOUNT_RATIO_HISTORY: &str =
        "/api/futures/global-long-short-account-ratio/history";
    pub const HYPERLIQUID_WHALE_ALERT: &str = "/api/hyperliquid/whale-alert";
    pub const HYPERLIQUID_WHALE_POSITION: &str = "/api/hyperliquid/whale-position";
}

/// History length requested when the caller does not specify one.
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

/// Parameters shared by the symbol/exchange/interval history endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub symbol: String,
    pub exchange: Option<String>,
    pub interval: String,
    pub limit: Option<u32>,
}

impl HistoryQuery {
    fn to_query(&self) -> Query {
        Query::new()
            .param("symbol", &self.symbol)
            .opt("exchange", self.exchange.as_deref())
            .param("interval", &self.interval)
            .param("limit", self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
    }
}

/// Parameters for pair liquidation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairLiquidationQuery {
    pub exchange: String,
    pub symbol: String,
    pub interval: String,
    pub limit: Option<u32>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

/// Parameters for coin-aggregated liquidation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinLiquidationQuery {
    /// Comma-separated exchanges, e.g. `Binance,OKX,Bybit`
    pub exchange_list: String,
    pub symbol: String,
    pub interval: String,
    pub limit: Option<u32>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

/// Typed access to the Coinglass endpoints used by the tools.
#[derive(Clone)]
pub struct CoinglassService {
    client: Arc<CoinglassClient>,
}

impl CoinglassService {
    pub fn new(client: Arc<CoinglassClient>) -> Self {
        Self { client }
    }

    /// Open interest per exchange for a coin.
    #[instrument(skip(self))]
    pub async fn open_interest_exchange_list(
        &self,
        symbol: &str,
    ) -> Result<Vec<OpenInterestExchangeItem>> {
        let query = Query::new().param("symbol", symbol);
        let items: Vec<OpenInterestExchangeItem> = self
            .client
            .get(paths::OPEN_INTEREST_EXCHANGE_LIST, &query)
            .await?;

        debug!("Fetched {} open interest rows for {}", items.len(), symbol);
        Ok(items)
    }

    /// Open interest OHLC history.
    #[instrument(skip(self))]
    pub async fn open_interest_history(
        &self,
        params: &HistoryQuery,
    ) -> Result<Vec<OpenInterestHistoryPoint>> {
        self.client
            .get(paths::OPEN_INTEREST_HISTORY, &params.to_query())
            .await
    }

    /// Current funding rates across exchanges.
    #[instrument(skip(self))]
    pub async fn funding_rate_exchange_list(
        &self,
        symbol: &str,
        exchange: Option<&str>,
    ) -> Result<Vec<FundingRateSymbolItem>> {
        let query = Query::new()
            .param("symbol", symbol)
            .opt("exchange", exchange);
        let items: Vec<FundingRateSymbolItem> = self
            .client
            .get(paths::FUNDING_RATE_EXCHANGE_LIST, &query)
            .await?;

        debug!("Fetched funding rates for {} symbols", items.len());
        Ok(items)
    }

    /// Liquidation history for one exchange pair.
    #[instrument(skip(self))]
    pub async fn pair_liquidation_history(
        &self,
        params: &PairLiquidationQuery,
    ) -> Result<Vec<PairLiquidationPoint>> {
        let query = Query::new()
            .param("exchange", &params.exchange)
            .param("symbol", &params.symbol)
            .param("interval", &params.interval)
            .param("limit", params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .opt("start_time", params.start_time)
            .opt("end_time", params.end_time);

        self.client
            .get(paths::PAIR_LIQUIDATION_HISTORY, &query)
            .await
    }

    /// Liquidation history for a coin summed over several exchanges.
    #[instrument(skip(self))]
    pub async fn coin_aggregated_liquidation_history(
        &self,
        params: &CoinLiquidationQuery,
    ) -> Result<Vec<CoinAggregatedLiquidationPoint>> {
        let query = Query::new()
            .param("exchange_list", &params.exchange_list)
            .param("symbol", &params.symbol)
            .param("interval", &params.interval)
            .param("limit", params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .opt("start_time", params.start_time)
            .opt("end_time", params.end_time);

        self.client
            .get(paths::COIN_LIQUIDATION_HISTORY, &query)
            .await
    }

    /// Global long/short account ratio history.
    #[instrument(skip(self))]
    pub async fn global_account_ratio_history(
        &self,
        params: &HistoryQuery,
    ) -> Result<Vec<GlobalAccountRatioPoint>> {
        self.client
            .get(paths::GLOBAL_ACCOUNT_RATIO_HISTORY, &params.to_query())
            .await
    }

    /// Recent Hyperliquid whale alerts.
    #[instrument(skip(self))]
    pub async fn hyperliquid_whale_alerts(&self) -> Result<Vec<HyperliquidWhaleAlertItem>> {
        let items: Vec<HyperliquidWhaleAlertItem> = self
            .client
            .get(paths::HYPERLIQUID_WHALE_ALERT, &Query::new())
            .await?;

        debug!("Fetched {} Hyperliquid whale alerts", items.len());
        Ok(items)
    }

    /// Current Hyperliquid whale positions.
    #[instrument(skip(self))]
    pub async fn hyperliquid_whale_positions(&self) -> Result<Vec<HyperliquidWhalePositionItem>> {
        let items: Vec<HyperliquidWhalePositionItem> = self
            .client
            .get(paths::HYPERLIQUID_WHALE_POSITION, &Query::new())
            .await?;

        debug!("Fetched {} Hyperliquid whale positions", items.len());
        Ok(items)
    }
}
