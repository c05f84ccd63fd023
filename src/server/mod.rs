//! MCP server on rmcp.
//!
//! [`CoinglassHandler`] adapts the [`ToolRegistry`] to rmcp's server handler.
//! The session runs over rmcp's async read/write transport, fed through two
//! in-process pipes: a reader task screens every input line before it reaches
//! the session, and a writer task merges the session's output with the error
//! replies for screened-out lines. Tool calls still in flight when input
//! closes get their replies before the session shuts down.

pub mod protocol;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, JsonObject, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, instrument, warn};

use crate::tools::{Tool, ToolOutput, ToolRegistry};
use protocol::{screen, Screened};

pub const SERVER_NAME: &str = "coinglass-mcp";

/// Pipe capacity between the screening tasks and the session.
const PIPE_CAPACITY: usize = 1 << 16;

/// rmcp handler over the tool registry.
#[derive(Clone)]
pub struct CoinglassHandler {
    registry: Arc<ToolRegistry>,
}

impl CoinglassHandler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

fn descriptor(tool: &dyn Tool) -> McpTool {
    let schema = match tool.input_schema() {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    McpTool::new(tool.name(), tool.description(), schema)
}

fn call_result(output: ToolOutput) -> CallToolResult {
    let content = vec![Content::text(output.text)];
    if output.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for CoinglassHandler {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.protocol_version = ProtocolVersion::V_2024_11_05;
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = SERVER_NAME.to_string();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools: Vec<McpTool> = self.registry.tools().map(descriptor).collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    #[instrument(skip_all, fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        match self.registry.call(&request.name, arguments).await {
            Some(output) => Ok(call_result(output)),
            None => Err(ErrorData::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            )),
        }
    }
}

/// Ids of forwarded `tools/call` requests that have not been answered yet.
#[derive(Default)]
struct InFlight {
    ids: Mutex<HashSet<String>>,
    drained: Notify,
}

impl InFlight {
    fn start(&self, id: String) {
        if let Ok(mut ids) = self.ids.lock() {
            ids.insert(id);
        }
    }

    /// Record a session output line; clears the id if it answers a call.
    fn finish(&self, line: &str) {
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            return;
        };
        let Some(id) = value.get("id") else {
            return;
        };
        if value.get("result").is_none() && value.get("error").is_none() {
            return;
        }
        if let Ok(mut ids) = self.ids.lock() {
            if ids.remove(&id.to_string()) && ids.is_empty() {
                self.drained.notify_waiters();
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.ids.lock().map(|ids| ids.is_empty()).unwrap_or(true)
    }

    async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            if self.is_empty() {
                return;
            }
            notified.await;
        }
    }
}

pub struct McpServer {
    handler: CoinglassHandler,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            handler: CoinglassHandler::new(registry),
        }
    }

    /// Serve on the process's stdin and stdout.
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve until `input` reaches EOF and every in-flight tool call has replied.
    pub async fn serve<R, W>(&self, input: R, output: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (to_session, session_in) = tokio::io::duplex(PIPE_CAPACITY);
        let (session_out, from_session) = tokio::io::duplex(PIPE_CAPACITY);
        let (reject_tx, reject_rx) = mpsc::unbounded_channel::<String>();
        let inflight = Arc::new(InFlight::default());

        let reader = tokio::spawn(read_requests(input, to_session, reject_tx, inflight.clone()));
        let writer = tokio::spawn(write_responses(output, from_session, reject_rx, inflight));

        info!("MCP server ready");
        match self.handler.clone().serve((session_in, session_out)).await {
            Ok(running) => {
                let reason = running.waiting().await.context("MCP session task failed")?;
                debug!("Session ended: {:?}", reason);
            }
            Err(e) => warn!("MCP session did not initialize: {}", e),
        }

        reader.abort();
        writer.await.context("Writer task panicked")??;
        info!("MCP server stopped");
        Ok(())
    }
}

async fn read_requests<R>(
    input: R,
    mut to_session: DuplexStream,
    reject_tx: mpsc::UnboundedSender<String>,
    inflight: Arc<InFlight>,
) where
    R: AsyncRead + Unpin,
{
    let mut input = BufReader::new(input);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to read request: {}", e);
                break;
            }
        }

        match screen(&buf) {
            Screened::Forward { line, call_id } => {
                if let Some(id) = call_id {
                    inflight.start(id);
                }
                let mut frame = line.into_bytes();
                frame.push(b'\n');
                if let Err(e) = to_session.write_all(&frame).await {
                    warn!("Session input closed: {}", e);
                    return;
                }
            }
            Screened::Reject(response) => {
                let _ = reject_tx.send(response.to_line());
            }
            Screened::Skip => {}
        }
    }

    debug!("Input closed; waiting for in-flight calls");
    inflight.wait_drained().await;
    to_session.shutdown().await.ok();
}

async fn write_responses<W>(
    mut output: W,
    from_session: DuplexStream,
    mut reject_rx: mpsc::UnboundedReceiver<String>,
    inflight: Arc<InFlight>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut session_lines = BufReader::new(from_session).lines();
    let mut session_open = true;
    let mut rejects_open = true;

    while session_open || rejects_open {
        let line = tokio::select! {
            next = session_lines.next_line(), if session_open => match next {
                Ok(Some(line)) => {
                    inflight.finish(&line);
                    line
                }
                Ok(None) => {
                    session_open = false;
                    continue;
                }
                Err(e) => {
                    warn!("Failed to read session output: {}", e);
                    session_open = false;
                    continue;
                }
            },
            next = reject_rx.recv(), if rejects_open => match next {
                Some(line) => line,
                None => {
                    rejects_open = false;
                    continue;
                }
            },
        };

        output
            .write_all(line.as_bytes())
            .await
            .context("Failed to write response")?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }

    output.shutdown().await.ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coinglass::client::testing::{ok, ScriptedTransport};
    use crate::tools::testing::service;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::io::AsyncReadExt;

    const HANDSHAKE: &str = concat!(
        r#"{"jsonrpc":"2.0","id":0,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"t","version":"0"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
    );

    async fn run(transport: Arc<ScriptedTransport>, body: &[u8]) -> HashMap<String, Value> {
        let mut input = HANDSHAKE.as_bytes().to_vec();
        input.extend_from_slice(body);

        let server = McpServer::new(Arc::new(ToolRegistry::new(service(transport))));
        let (output, mut client) = tokio::io::duplex(1 << 16);

        let handle =
            tokio::spawn(async move { server.serve(std::io::Cursor::new(input), output).await });
        let mut text = String::new();
        client.read_to_string(&mut text).await.unwrap();
        handle.await.unwrap().unwrap();

        text.lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap())
            .map(|r| (r["id"].to_string(), r))
            .collect()
    }

    #[tokio::test]
    async fn test_handshake_and_listing() {
        let replies = run(
            ScriptedTransport::new(vec![]),
            concat!(
                "\n",
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
                "\n",
                r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
                "\n",
            )
            .as_bytes(),
        )
        .await;

        assert_eq!(replies.len(), 3);
        let init = &replies["0"]["result"];
        assert_eq!(init["protocolVersion"], "2024-11-05");
        assert_eq!(init["serverInfo"]["name"], SERVER_NAME);
        assert!(init["capabilities"]["tools"].is_object());

        let tools = replies["2"]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
        assert!(tools
            .iter()
            .any(|t| t["name"] == "COINGLASS_FUNDING_RATE" && t["description"].is_string()));

        assert!(replies["3"]["result"].is_object());
        assert!(replies["3"].get("error").is_none());
    }

    #[tokio::test]
    async fn test_tool_call_replies_with_text_content() {
        let transport = ScriptedTransport::new(vec![ok(r#"{"code":"0","data":[]}"#)]);
        let replies = run(
            transport.clone(),
            concat!(
                r#"{"jsonrpc":"2.0","id":"c1","method":"tools/call","params":{"name":"COINGLASS_HYPERLIQUID_WHALE_ALERT","arguments":{"prettyFormat":false}}}"#,
                "\n",
                r#"{"jsonrpc":"2.0","id":"c2","method":"tools/call","params":{"name":"COINGLASS_FUNDING_RATE","arguments":{}}}"#,
                "\n",
            )
            .as_bytes(),
        )
        .await;

        let ok = &replies[r#""c1""#]["result"];
        assert_eq!(ok["isError"], false);
        assert_eq!(ok["content"][0]["type"], "text");
        let data: Value = serde_json::from_str(ok["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(data, json!({"raw": []}));

        // Argument errors are tool results, not protocol errors.
        let bad = &replies[r#""c2""#]["result"];
        assert_eq!(bad["isError"], true);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let replies = run(
            ScriptedTransport::new(vec![]),
            concat!(
                "{not json\n",
                r#"{"jsonrpc":"2.0","id":5,"method":"coinglass/bogus"}"#,
                "\n",
                r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"NOPE"}}"#,
                "\n",
                r#"{"jsonrpc":"2.0","id":7,"method":"tools/call"}"#,
                "\n",
                r#"{"jsonrpc":"2.0","id":8}"#,
                "\n",
            )
            .as_bytes(),
        )
        .await;

        assert_eq!(replies["null"]["error"]["code"], protocol::PARSE_ERROR);
        assert_eq!(replies["5"]["error"]["code"], protocol::METHOD_NOT_FOUND);
        assert_eq!(replies["6"]["error"]["code"], protocol::INVALID_PARAMS);
        assert!(replies["6"]["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Unknown tool: NOPE"));
        assert_eq!(replies["7"]["error"]["code"], protocol::INVALID_PARAMS);
        assert_eq!(replies["8"]["error"]["code"], protocol::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_session() {
        let mut body = Vec::new();
        body.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        body.extend_from_slice(b"\n\xff\xfe garbage\n");
        body.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        body.push(b'\n');

        let replies = run(ScriptedTransport::new(vec![]), &body).await;

        assert_eq!(replies["null"]["error"]["code"], protocol::PARSE_ERROR);
        assert!(replies["1"]["result"].is_object());
        assert!(replies["2"]["result"].is_object());
    }

    #[test]
    fn test_descriptor_carries_schema() {
        let registry = ToolRegistry::new(service(ScriptedTransport::new(vec![])));
        let tool = registry.get("COINGLASS_FUNDING_RATE").unwrap();
        let value = serde_json::to_value(descriptor(tool)).unwrap();

        assert_eq!(value["name"], "COINGLASS_FUNDING_RATE");
        assert_eq!(value["inputSchema"]["type"], "object");
    }

    #[test]
    fn test_call_result_flags_errors() {
        let value = serde_json::to_value(call_result(ToolOutput::error("boom"))).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(value["content"][0], json!({"type": "text", "text": "boom"}));
    }
}
