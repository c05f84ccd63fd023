//! # Coinglass MCP
//!
//! Exposes Coinglass v4 derivatives market data (open interest, funding
//! rates, liquidations, long/short ratios, Hyperliquid whales) as MCP tools.
//!
//! ## Architecture
//!
//! - `config`: Settings loading and client configuration
//! - `coinglass`: Rate-limited, retrying REST client and typed endpoint accessors
//! - `tools`: Agent-facing tools with argument validation and summaries
//! - `server`: MCP server over stdio, built on rmcp
//! - `logging`: stderr and rolling-file tracing setup
//! - `utils`: Shared utilities and decimal coercion

pub mod coinglass;
pub mod config;
pub mod logging;
pub mod server;
pub mod tools;
pub mod utils;

pub use config::{ClientConfig, Settings};
