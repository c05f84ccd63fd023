//! Error taxonomy for the Coinglass access layer.

use std::fmt;

use thiserror::Error;

use super::transport::TransportFailure;

pub type Result<T> = std::result::Result<T, CoinglassError>;

/// Errors raised by the Coinglass client, envelope validator and accessors.
///
/// Every variant that originates from a request carries the endpoint path so
/// that callers converting the error to text lose no diagnostic value.
#[derive(Debug, Error)]
pub enum CoinglassError {
    /// Invalid or missing configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network, connection or timeout failure after retries were exhausted.
    #[error("transport error on {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: TransportFailure,
    },

    /// The remote returned a non-success HTTP status.
    #[error("HTTP error {status} on {endpoint}: {body}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body did not validate against the expected envelope.
    #[error("{reason} from {endpoint}\nRaw response:\n{raw}")]
    Envelope {
        endpoint: String,
        reason: EnvelopeFailure,
        upstream_message: Option<String>,
        raw: String,
    },
}

/// Why an envelope was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeFailure {
    /// The body was not JSON at all.
    NotJson(String),
    /// The body was JSON but not an object.
    NotAnObject,
    /// `statusCode` was absent or not a string.
    MissingStatusCode,
    /// The upstream reported a business-level failure.
    Rejected {
        status_code: String,
        message: Option<String>,
    },
    /// `payload` was absent.
    MissingPayload,
    /// The payload did not match the expected per-endpoint shape.
    PayloadMismatch(String),
}

impl fmt::Display for EnvelopeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson(e) => write!(f, "response body is not valid JSON ({e})"),
            Self::NotAnObject => write!(f, "response body is not a JSON object"),
            Self::MissingStatusCode => write!(f, "response is missing a string statusCode"),
            Self::Rejected {
                status_code,
                message: Some(message),
            } => write!(f, "upstream rejected request with code {status_code}: {message}"),
            Self::Rejected {
                status_code,
                message: None,
            } => write!(f, "upstream rejected request with code {status_code}"),
            Self::MissingPayload => write!(f, "response is missing its payload"),
            Self::PayloadMismatch(e) => write!(f, "payload does not match expected shape: {e}"),
        }
    }
}

/// Coarse classification used to pick a user-facing hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The API key is missing, invalid or lacks access.
    Credentials,
    /// The remote throttled us.
    RateLimited,
    /// Network trouble or a remote server error.
    Transient,
    /// The upstream returned something we could not validate.
    MalformedResponse,
    /// The request itself was rejected (bad symbol, bad interval, ...).
    BadRequest,
    /// Local configuration problem.
    Config,
}

impl ErrorKind {
    /// Short advice for the person reading the error.
    pub fn hint(&self) -> &'static str {
        match self {
            ErrorKind::Credentials => "check COINGLASS_API_KEY and your plan's endpoint access",
            ErrorKind::RateLimited => "rate limited by Coinglass, try again later",
            ErrorKind::Transient => "temporary upstream or network failure, try again later",
            ErrorKind::MalformedResponse => "unexpected response shape, the upstream API may have changed",
            ErrorKind::BadRequest => "request rejected, check the symbol, exchange and interval",
            ErrorKind::Config => "fix the server configuration and restart",
        }
    }
}

impl CoinglassError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error for presentation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Transport { .. } => ErrorKind::Transient,
            Self::HttpStatus { status, .. } => match *status {
                401 | 403 => ErrorKind::Credentials,
                429 => ErrorKind::RateLimited,
                s if s >= 500 => ErrorKind::Transient,
                _ => ErrorKind::BadRequest,
            },
            Self::Envelope {
                reason: EnvelopeFailure::Rejected { .. },
                ..
            } => ErrorKind::BadRequest,
            Self::Envelope { .. } => ErrorKind::MalformedResponse,
        }
    }

    /// HTTP status, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Endpoint path the failing request targeted.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Config(_) => None,
            Self::Transport { endpoint, .. }
            | Self::HttpStatus { endpoint, .. }
            | Self::Envelope { endpoint, .. } => Some(endpoint),
        }
    }
}
