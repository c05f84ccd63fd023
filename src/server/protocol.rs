//! Line screening in front of the MCP session.
//!
//! rmcp's codec ends the session on a frame it cannot decode. Each input line
//! is checked here first: lines rmcp understands are forwarded, anything else
//! gets a JSON-RPC error reply and the session carries on.

use rmcp::model::ClientJsonRpcMessage;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// Methods the session answers; a malformed request for one of these is a
/// params error rather than an unknown method.
const SERVED_METHODS: [&str; 4] = ["initialize", "ping", "tools/list", "tools/call"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {detail}"))
    }

    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self::new(INVALID_REQUEST, format!("Invalid request: {detail}"))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {detail}"))
    }
}

/// Error reply written for a line that never reaches the session.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub error: RpcError,
}

impl Response {
    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }

    /// One line of output, without the trailing newline.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"jsonrpc":"2.0","id":null,"error":{{"code":-32603,"message":"unserializable response: {e}"}}}}"#
            )
        })
    }
}

/// Verdict on one raw input line.
#[derive(Debug)]
pub enum Screened {
    /// Hand the line to the session. `call_id` is set for `tools/call`.
    Forward { line: String, call_id: Option<String> },
    Reject(Response),
    Skip,
}

pub fn screen(raw: &[u8]) -> Screened {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text.trim(),
        Err(e) => {
            warn!("Request is not valid UTF-8: {}", e);
            return Screened::Reject(Response::error(Value::Null, RpcError::parse_error(e)));
        }
    };
    if text.is_empty() {
        return Screened::Skip;
    }

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unparseable request: {}", e);
            return Screened::Reject(Response::error(Value::Null, RpcError::parse_error(e)));
        }
    };
    let Some(object) = value.as_object() else {
        return Screened::Reject(Response::error(
            Value::Null,
            RpcError::invalid_request("expected a JSON object"),
        ));
    };

    let id = object.get("id").cloned();
    let method = object.get("method").and_then(Value::as_str);
    let reply_id = id.clone().unwrap_or(Value::Null);

    if method.is_none() && !object.contains_key("result") && !object.contains_key("error") {
        return Screened::Reject(Response::error(
            reply_id,
            RpcError::invalid_request("missing method"),
        ));
    }

    if method == Some("tools/call") && id.is_some() {
        let named = object
            .get("params")
            .and_then(|p| p.get("name"))
            .is_some_and(Value::is_string);
        if !named {
            return Screened::Reject(Response::error(
                reply_id,
                RpcError::invalid_params("tools/call needs a tool name"),
            ));
        }
    }

    match serde_json::from_value::<ClientJsonRpcMessage>(value.clone()) {
        Ok(_) => {
            debug!(method = method.unwrap_or("<response>"), "Forwarding");
            let call_id = match (method, &id) {
                (Some("tools/call"), Some(id)) => Some(id.to_string()),
                _ => None,
            };
            Screened::Forward {
                line: text.to_string(),
                call_id,
            }
        }
        Err(e) => match (id, method) {
            (None, _) => {
                warn!("Dropping undecodable notification: {}", e);
                Screened::Skip
            }
            (Some(id), Some(m)) if SERVED_METHODS.contains(&m) => {
                Screened::Reject(Response::error(id, RpcError::invalid_params(e)))
            }
            (Some(id), Some(m)) => {
                Screened::Reject(Response::error(id, RpcError::method_not_found(m)))
            }
            (Some(id), None) => {
                Screened::Reject(Response::error(id, RpcError::invalid_request(e)))
            }
        },
    }
}
