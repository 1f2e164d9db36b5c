//! Destination writers for relayed process output

use futures::io::{AllowStdIo, AsyncWrite};
use futures::lock::Mutex;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, PoisonError};
use std::task::{Context, Poll};

/// Type alias for a writer shared between a runner and its executions
pub type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// Wrap a writer so it can be shared with executions
pub fn shared_writer<W>(writer: W) -> SharedWriter
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    Arc::new(Mutex::new(Box::new(writer)))
}

/// The current process's standard output
pub fn stdout_writer() -> SharedWriter {
    shared_writer(AllowStdIo::new(io::stdout()))
}

/// The current process's standard error
pub fn stderr_writer() -> SharedWriter {
    shared_writer(AllowStdIo::new(io::stderr()))
}

/// In-memory writer that captures everything written to it.
///
/// Clones share the same buffer, so one clone can be handed to a runner
/// while another is kept to inspect the output afterwards.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    buf: Arc<std::sync::Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    /// Create an empty capture buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes captured so far
    pub fn bytes(&self) -> Vec<u8> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captured output decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    /// Discard everything captured so far
    pub fn clear(&self) {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl AsyncWrite for CapturedOutput {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::AsyncWriteExt;

    #[smol_potat::test]
    async fn test_captured_output_is_shared() {
        let capture = CapturedOutput::new();
        let writer = shared_writer(capture.clone());

        writer.lock().await.write_all(b"Test out").await.unwrap();
        assert_eq!(capture.text(), "Test out");

        capture.clear();
        assert!(capture.bytes().is_empty());
    }
}
