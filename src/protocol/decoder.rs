//! Incremental frame decoder for the streaming channel
//!
//! The body arrives as raw byte chunks with no alignment guarantees: one
//! logical frame may span several chunks, several frames may share a chunk,
//! and a multi-byte character may be cut anywhere. The decoder carries the
//! undecodable byte suffix and the trailing partial frame across pushes, so
//! feeding the same bytes in any chunking yields the same event sequence.

use super::StreamEvent;

/// Frame delimiter on the wire: one blank line per frame
const FRAME_DELIMITER: &str = "\n\n";

/// Prefix of the payload line inside a frame
const PAYLOAD_PREFIX: &str = "data: ";

/// Stateful push decoder: bytes in, `StreamEvent`s out.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes not yet decodable as UTF-8 (at most one partial sequence)
    carry: Vec<u8>,
    /// Decoded text not yet terminated by a frame delimiter
    text: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of raw bytes, returning every event completed by it.
    ///
    /// Never fails: frames without a payload line, payloads that do not
    /// decode, and unrecognized event types are keep-alive noise and are
    /// dropped without interrupting the stream.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.decode_text(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.text.find(FRAME_DELIMITER) {
            let frame: String = self.text.drain(..end + FRAME_DELIMITER.len()).collect();
            if let Some(event) = parse_frame(&frame) {
                events.push(event);
            }
        }
        events
    }

    /// Bytes or text still buffered (an unterminated trailing frame).
    /// Whatever remains when the body ends is discarded by the caller.
    pub fn has_partial(&self) -> bool {
        !self.carry.is_empty() || !self.text.is_empty()
    }

    /// Incremental UTF-8 decode: appends to `self.text`, keeping an
    /// incomplete trailing sequence in `self.carry` rather than ever
    /// re-decoding from scratch.
    fn decode_text(&mut self, chunk: &[u8]) {
        self.carry.extend_from_slice(chunk);

        let mut offset = 0;
        loop {
            match std::str::from_utf8(&self.carry[offset..]) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    offset = self.carry.len();
                    break;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    self.text.push_str(&String::from_utf8_lossy(
                        &self.carry[offset..offset + valid_up_to],
                    ));
                    offset += valid_up_to;
                    match err.error_len() {
                        // Incomplete trailing sequence: wait for more bytes
                        None => break,
                        // Invalid bytes mid-stream: substitute and continue
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            offset += len;
                        }
                    }
                }
            }
        }
        self.carry.drain(..offset);
    }
}

/// Extract the payload line from one complete frame and decode it.
fn parse_frame(frame: &str) -> Option<StreamEvent> {
    let payload = frame
        .lines()
        .find_map(|line| line.strip_prefix(PAYLOAD_PREFIX))?;

    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::debug!(error = %err, "Dropping undecodable frame payload");
            None
        }
    }
}
