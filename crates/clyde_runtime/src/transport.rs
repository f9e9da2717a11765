//! The send capability and a line-oriented console transport.

use crate::dispatcher::DispatcherHandle;
use anyhow::{Context, Result};
use async_trait::async_trait;
use clyde_core::{ClydeConfig, Incoming, Outgoing};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Somewhere replies can be sent. Failures are reported, never retried.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, msg: &Outgoing) -> Result<()>;

    fn name(&self) -> &'static str;
}

// ============================================================================
// Console transport
// ============================================================================

/// Reads `channel/instance sender: text` lines and prints replies the same way.
///
/// A line without a sender prefix is treated as coming from `you` on the home
/// channel. Console input is always considered authenticated.
pub struct ConsoleTransport {
    sender: String,
    home_channel: String,
    home_instance: String,
    out: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl ConsoleTransport {
    pub fn new(config: &ClydeConfig, out: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self {
            sender: config.identity.sender.clone(),
            home_channel: config.identity.home_channel.clone(),
            home_instance: config.identity.home_instance.clone(),
            out: Mutex::new(out),
        }
    }

    pub fn stdout(config: &ClydeConfig) -> Self {
        Self::new(config, Box::new(tokio::io::stdout()))
    }

    /// Parse one input line. Blank lines yield `None`.
    pub fn parse_line(&self, line: &str) -> Option<Incoming> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let parsed = line.split_once(": ").and_then(|(head, text)| {
            let (place, sender) = head.rsplit_once(' ')?;
            let (channel, instance) = place
                .split_once('/')
                .unwrap_or((place, self.home_instance.as_str()));
            Some(Incoming::new(sender, channel, instance, "", text))
        });
        Some(parsed.unwrap_or_else(|| {
            Incoming::new("you", &self.home_channel, &self.home_instance, "", line)
        }))
    }

    /// Render an outgoing message; continuation lines are indented.
    pub fn format(&self, msg: &Outgoing) -> String {
        let body = msg.body.lines().collect::<Vec<_>>().join("\n    ");
        format!(
            "{}/{} {} ({}): {}\n",
            msg.channel, msg.instance, self.sender, msg.signature, body
        )
    }

    /// Feed every line of `reader` to the dispatcher until EOF or `quit`.
    pub async fn read_lines<R: AsyncBufRead + Unpin>(
        &self,
        reader: R,
        handle: &DispatcherHandle,
    ) -> Result<()> {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await.context("Failed to read console input")? {
            if matches!(line.trim(), "quit" | "exit") {
                break;
            }
            if let Some(msg) = self.parse_line(&line) {
                handle.deliver(msg).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send(&self, msg: &Outgoing) -> Result<()> {
        let text = self.format(msg);
        let mut out = self.out.lock().await;
        out.write_all(text.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
