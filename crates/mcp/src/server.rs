// Newline-delimited JSON-RPC transport over stdio

use crate::dispatch::Dispatcher;
use crate::protocol::{JsonRpcError, JsonRpcResponse, ToolCallRequest};
use anyhow::{Context, Result};
use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, FramedRead, FramedWrite, LinesCodec, LinesCodecError};

/// Upper bound on a single request line
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Line decoder that hands undecodable lines to the caller instead of failing.
///
/// Over-long lines and lines that are not UTF-8 come out as `Err` items so
/// the server can answer them and read on; only I/O failures end the stream.
#[derive(Debug)]
pub struct RequestLineCodec {
    lines: LinesCodec,
}

impl RequestLineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn recover(
        decoded: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<Result<String, LinesCodecError>>, LinesCodecError> {
        match decoded {
            Ok(line) => Ok(line.map(Ok)),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Ok(Some(Err(LinesCodecError::MaxLineLengthExceeded)))
            }
            // The inner codec reports bad UTF-8 as InvalidData after consuming the line
            Err(LinesCodecError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                Ok(Some(Err(LinesCodecError::Io(e))))
            }
            Err(e) => Err(e),
        }
    }
}

impl Decoder for RequestLineCodec {
    type Item = Result<String, LinesCodecError>;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Self::recover(self.lines.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Self::recover(self.lines.decode_eof(buf))
    }
}

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_TOOLS_LIST: &str = "tools/list";

/// Serves tool calls read line by line from an input stream
pub struct McpServer {
    dispatcher: Dispatcher,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Serve stdin/stdout until stdin closes
    pub async fn start(&self) -> Result<()> {
        tracing::info!(
            tools = self.dispatcher.registry().len(),
            "MCP server listening on stdio"
        );
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = FramedRead::new(reader, RequestLineCodec::new(MAX_LINE_LENGTH));
        let mut out = FramedWrite::new(writer, LinesCodec::new());

        while let Some(line) = lines.next().await {
            let response = match line.context("Failed to read request line")? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(&line).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Undecodable request line");
                    JsonRpcResponse::error(serde_json::Value::Null, JsonRpcError::parse_error(e))
                }
            };
            let encoded = serde_json::to_string(&response).context("Failed to encode response")?;
            out.send(encoded).await.context("Failed to write response")?;
        }

        tracing::info!("Input closed, MCP server stopping");
        Ok(())
    }

    /// Answer one request line
    pub async fn handle_line(&self, line: &str) -> JsonRpcResponse {
        let request: ToolCallRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable request line");
                return JsonRpcResponse::error(serde_json::Value::Null, JsonRpcError::parse_error(e));
            }
        };

        match request.method_name() {
            Some(METHOD_INITIALIZE) => {
                discovery_response(request.id, &self.dispatcher.initialize())
            }
            Some(METHOD_TOOLS_LIST) => {
                discovery_response(request.id, &self.dispatcher.list_tools())
            }
            _ => self.dispatcher.dispatch(request).await,
        }
    }
}

fn discovery_response(id: serde_json::Value, payload: &impl serde::Serialize) -> JsonRpcResponse {
    match serde_json::to_value(payload) {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::tool_execution(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolDescriptor, ToolRegistry};
    use std::sync::Arc;
    use study_core::ToolResult;

    struct PingTool;

    #[async_trait::async_trait]
    impl Tool for PingTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::builder("ping", "Reply with pong").build()
        }

        async fn execute(&self, _arguments: serde_json::Value) -> ToolResult<String> {
            Ok("pong".to_string())
        }
    }

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PingTool)).unwrap();
        McpServer::new(Dispatcher::new(Arc::new(registry)))
    }

    #[tokio::test]
    async fn test_serve_answers_each_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"id":2,"method":"tools/list"}"#,
            "\n",
            "not json\n",
        );
        let mut output = Vec::new();

        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["result"], "pong");
        assert_eq!(lines[1]["id"], 2);
        assert_eq!(lines[1]["result"]["tools"][0]["name"], "ping");
        assert_eq!(lines[2]["error"]["code"], -32700);
        assert!(lines[2]["id"].is_null());
    }

    #[tokio::test]
    async fn test_bad_lines_do_not_stop_the_server() {
        let mut input = b"\xff\xfe\n".to_vec();
        input.extend(std::iter::repeat(b'a').take(MAX_LINE_LENGTH + 10));
        input.extend(b"\n{\"id\":2,\"method\":\"tools/list\"}\n");
        input.extend(br#"{"id":3,"method":123}"#);
        let mut output = Vec::new();

        server().serve(input.as_slice(), &mut output).await.unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["error"]["code"], -32700);
        assert_eq!(lines[1]["error"]["code"], -32700);
        assert_eq!(lines[2]["id"], 2);
        assert_eq!(lines[2]["result"]["tools"][0]["name"], "ping");
        assert_eq!(lines[3]["id"], 3);
        assert_eq!(lines[3]["error"]["code"], -32601);
        assert_eq!(lines[3]["error"]["message"], "Method '123' not found");
    }

    #[tokio::test]
    async fn test_initialize_over_stdio() {
        let response = server()
            .handle_line(r#"{"id":"init","method":"initialize"}"#)
            .await;

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "1.0");
        assert_eq!(result["tools"][0]["name"], "ping");
    }
}
