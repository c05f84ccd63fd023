//! Validation of the `{statusCode, message, payload}` response envelope.
//!
//! Coinglass wraps every body in an envelope whose string status code is
//! `"0"` on success. The upstream's own field names (`code`, `msg`, `data`)
//! are accepted alongside `statusCode`, `message` and `payload`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::{CoinglassError, EnvelopeFailure};

const STATUS_KEYS: [&str; 2] = ["statusCode", "code"];
const MESSAGE_KEYS: [&str; 2] = ["message", "msg"];
const PAYLOAD_KEYS: [&str; 2] = ["payload", "data"];

/// Status code meaning success.
pub const SUCCESS_CODE: &str = "0";

/// Longest raw body kept in an error for a response that is not JSON.
const MAX_RAW_BODY_CHARS: usize = 2_000;

/// A validated envelope.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<T> {
    pub status_code: String,
    pub message: Option<String>,
    pub payload: T,
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| obj.get(*key)).find(|v| !v.is_null())
}

/// Pretty-printed rendering of a JSON response for error reports.
pub fn pretty(raw: &Value) -> String {
    serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string())
}

/// Raw text body for error reports, truncated when very long.
pub fn raw_snapshot(body: &str) -> String {
    match body.char_indices().nth(MAX_RAW_BODY_CHARS) {
        Some((cut, _)) => format!(
            "{}... (truncated, {} bytes total)",
            &body[..cut],
            body.len()
        ),
        None => body.to_string(),
    }
}

/// Validate `raw` and decode its payload as `T`.
pub fn decode<T: DeserializeOwned>(
    raw: &Value,
    endpoint: &str,
) -> Result<ResponseEnvelope<T>, CoinglassError> {
    let fail = |reason: EnvelopeFailure, upstream_message: Option<String>| {
        CoinglassError::Envelope {
            endpoint: endpoint.to_string(),
            reason,
            upstream_message,
            raw: pretty(raw),
        }
    };

    let obj = raw
        .as_object()
        .ok_or_else(|| fail(EnvelopeFailure::NotAnObject, None))?;

    let message = field(obj, &MESSAGE_KEYS)
        .and_then(Value::as_str)
        .map(str::to_string);

    let status_code = field(obj, &STATUS_KEYS)
        .and_then(Value::as_str)
        .ok_or_else(|| fail(EnvelopeFailure::MissingStatusCode, message.clone()))?
        .to_string();

    if status_code != SUCCESS_CODE {
        return Err(fail(
            EnvelopeFailure::Rejected {
                status_code,
                message: message.clone(),
            },
            message,
        ));
    }

    let payload = field(obj, &PAYLOAD_KEYS)
        .ok_or_else(|| fail(EnvelopeFailure::MissingPayload, message.clone()))?;

    let payload = T::deserialize(payload)
        .map_err(|e| fail(EnvelopeFailure::PayloadMismatch(e.to_string()), message.clone()))?;

    Ok(ResponseEnvelope {
        status_code,
        message,
        payload,
    })
}

/// Validate `raw` and return only its payload.
pub fn unwrap<T: DeserializeOwned>(raw: Value, endpoint: &str) -> Result<T, CoinglassError> {
    decode(&raw, endpoint).map(|envelope| envelope.payload)
}
