//! Line-delimited STDIO transport
//!
//! One JSON-RPC request per input line, one response per output line.
//! Blank lines are skipped.

use crate::{Result, RpcServer};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// STDIO transport for the RPC server
pub struct StdioTransport {
    server: Arc<RpcServer>,
}

impl StdioTransport {
    pub fn new(server: Arc<RpcServer>) -> Self {
        Self { server }
    }

    /// Serve stdin/stdout until EOF (blocking)
    pub fn run_blocking(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.serve_blocking(stdin.lock(), stdout.lock())
    }

    /// Serve stdin/stdout until EOF (async)
    pub async fn run_async(&self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve any line reader and writer until EOF
    pub fn serve_blocking<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<()> {
        let mut handled = 0usize;
        for line in reader.lines() {
            let request = line?;

            // Skip empty lines
            if request.trim().is_empty() {
                continue;
            }

            let response = self.server.handle_request(&request)?;
            writeln!(writer, "{}", response)?;
            writer.flush()?;
            handled += 1;
        }

        tracing::debug!(handled, "stdio transport reached EOF");
        Ok(())
    }

    /// Async counterpart of [`serve_blocking`](Self::serve_blocking)
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();
        let mut handled = 0usize;

        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;

            // EOF
            if n == 0 {
                break;
            }

            if line.trim().is_empty() {
                continue;
            }

            let response = self.server.handle_request(line.trim_end())?;
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            handled += 1;
        }

        tracing::debug!(handled, "stdio transport reached EOF");
        Ok(())
    }
}
