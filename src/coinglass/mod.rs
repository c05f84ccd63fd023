//! Coinglass v4 REST access layer.
//!
//! ## Layers
//! - `transport`: one GET over `reqwest` (or a test double)
//! - `client`: shared rate limiter, retry policy, auth header
//! - `envelope`: `statusCode`/`payload` validation and payload decoding
//! - `service`: one accessor per endpoint
//!
//! Construct a single [`CoinglassClient`], wrap it in an `Arc`, and hand it
//! to everything that needs market data so the rate limiter is shared.

pub(crate) mod client;
pub mod envelope;
mod error;
mod rate_limit;
mod retry;
mod service;
pub mod transport;
mod types;

pub use client::{CoinglassClient, Query, API_KEY_HEADER};
pub use error::{CoinglassError, EnvelopeFailure, ErrorKind, Result};
pub use rate_limit::RateLimiter;
pub use retry::{AttemptFailure, RetryPolicy};
pub use service::{
    paths, CoinLiquidationQuery, CoinglassService, HistoryQuery, PairLiquidationQuery,
    DEFAULT_HISTORY_LIMIT,
};
pub use transport::{
    HttpTransport, OutboundRequest, ReqwestTransport, TransportFailure, TransportResponse,
};
pub use types::*;
