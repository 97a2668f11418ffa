use anyhow::Context;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

/// Owns the write side of a connection until the response is out.
///
/// [`ResponseWriter::send`] consumes the writer, so each connection carries
/// exactly one response and is shut down right after it.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    stream: W,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(stream: W) -> Self {
        Self { stream }
    }

    /// Serializes `response`, writes it out and closes the stream.
    pub async fn send(mut self, response: &Response) -> anyhow::Result<W> {
        let buffer = response.to_bytes();

        self.stream
            .write_all(&buffer)
            .await
            .context("failed to write response")?;
        self.stream.flush().await?;
        self.stream
            .shutdown()
            .await
            .context("failed to close connection")?;

        tracing::trace!(bytes = buffer.len(), "Response written");
        Ok(self.stream)
    }
}
