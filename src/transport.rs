//! Stream transport
//!
//! Owns one outbound streaming request and exposes its body as a pull-based
//! sequence of decoded events. Failures are classified before the first
//! event where possible; after that, timeout, cancellation, and read errors
//! all surface as one terminal error item followed by end-of-stream.

use crate::error::ChatError;
use crate::protocol::{ChatRequest, FrameDecoder, StreamEvent};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::VecDeque;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Opens streaming sends against a single endpoint.
pub struct StreamTransport {
    client: reqwest::Client,
    url: String,
    idle_timeout: Duration,
}

impl StreamTransport {
    pub fn new(client: reqwest::Client, url: impl Into<String>, idle_timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            idle_timeout,
        }
    }

    /// Issue the streaming request. Fails before yielding any event on
    /// connect errors and non-success statuses.
    pub async fn open(&self, request: &ChatRequest) -> Result<EventStream, ChatError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::timeout(format!("Stream request timed out: {e}"))
                } else if e.is_connect() {
                    ChatError::transport(format!("Connection failed: {e}"))
                } else {
                    ChatError::transport(format!("Stream request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Stream request rejected");
            return Err(
                ChatError::transport(format!("Stream request failed: HTTP {status}: {body}"))
                    .with_status(status.as_u16()),
            );
        }

        let bytes = response
            .bytes_stream()
            .map(|item| match item {
                Ok(chunk) => Ok(chunk.to_vec()),
                Err(e) => Err(ChatError::transport(format!("Stream read failed: {e}"))),
            })
            .boxed();

        Ok(EventStream::from_bytes(bytes, self.idle_timeout))
    }
}

/// Idempotent cancellation handle for one [`EventStream`].
///
/// Safe to invoke any number of times, including after the stream has
/// already completed naturally.
#[derive(Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Pull-based lazy sequence of stream events.
///
/// `next_event` yields decoded events in arrival order until the body ends,
/// the idle timeout fires, the handle is cancelled, or a read fails. The
/// three failure cases each yield exactly one `Err` item; afterwards the
/// stream yields `None` forever.
pub struct EventStream {
    bytes: BoxStream<'static, Result<Vec<u8>, ChatError>>,
    decoder: FrameDecoder,
    ready: VecDeque<StreamEvent>,
    idle_timeout: Duration,
    cancel: CancellationToken,
    finished: bool,
}

impl EventStream {
    /// Build an event stream over any chunked byte source. The HTTP path
    /// uses this internally; tests feed scripted bytes through the same
    /// decoder and timeout machinery.
    pub fn from_bytes(
        bytes: BoxStream<'static, Result<Vec<u8>, ChatError>>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            bytes,
            decoder: FrameDecoder::new(),
            ready: VecDeque::new(),
            idle_timeout,
            cancel: CancellationToken::new(),
            finished: false,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.cancel.clone(),
        }
    }

    /// Next decoded event, or a terminal error, or `None` once the stream
    /// is over.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, ChatError>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }

            let read = tokio::select! {
                () = self.cancel.cancelled() => {
                    self.finished = true;
                    return Some(Err(ChatError::transport("Stream cancelled")));
                }
                read = tokio::time::timeout(self.idle_timeout, self.bytes.next()) => read,
            };

            match read {
                Err(_elapsed) => {
                    self.finished = true;
                    return Some(Err(ChatError::timeout(format!(
                        "No stream activity within {}s",
                        self.idle_timeout.as_secs()
                    ))));
                }
                Ok(None) => {
                    self.finished = true;
                    if self.decoder.has_partial() {
                        tracing::debug!("Discarding unterminated trailing frame at end of stream");
                    }
                    return None;
                }
                Ok(Some(Err(err))) => {
                    self.finished = true;
                    return Some(Err(err));
                }
                Ok(Some(Ok(chunk))) => {
                    self.ready.extend(self.decoder.push(&chunk));
                }
            }
        }
    }
}
