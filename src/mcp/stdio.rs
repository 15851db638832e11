//! Single-stream transport: newline-delimited JSON-RPC over stdin/stdout.
//!
//! The whole process serves exactly one session, so no session id is carried
//! and the session registry is not involved.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::errors::TransportError;
use crate::mcp::router::generate_session_id;
use crate::mcp::rpc::json_rpc_error;
use crate::mcp::server::handle_json_rpc_payload;
use crate::mcp::session::SessionContext;
use crate::operations::OperationRegistry;

pub struct StdioTransport {
    session: SessionContext,
}

impl StdioTransport {
    pub fn new(operations: Arc<OperationRegistry>) -> Self {
        Self {
            session: SessionContext::new(generate_session_id(), operations),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn run(&self) -> Result<(), TransportError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serves requests until the reader hits EOF, then closes the session.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), TransportError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(session_id = %self.session.id(), "stdio transport started");
        let mut line = String::new();

        let outcome = loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("EOF on stdin, shutting down");
                    break Ok(());
                }
                Ok(_) => {}
                Err(err) => break Err(TransportError::Io(err)),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Value>(trimmed) {
                Ok(payload) => handle_json_rpc_payload(&self.session, payload).await,
                Err(err) => {
                    warn!(error = %err, "failed to parse stdio frame");
                    Some(json_rpc_error(None, -32700, "Parse error"))
                }
            };

            if let Some(response) = response {
                if let Err(err) = write_frame(&mut writer, &response).await {
                    break Err(err);
                }
            }
        };

        self.session.close();
        outcome
    }
}

async fn write_frame<W>(writer: &mut W, value: &Value) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = serde_json::to_string(value)?;
    frame.push('\n');
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
