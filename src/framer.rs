//! Inbound framing: an unbounded byte trickle into discrete protocol events.

use crate::wire::{HANDSHAKE_MARKER, MESSAGE_END, MESSAGE_MARKER};

/// One framed protocol event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The device announced itself (connect or reconnect).
    Handshake,
    /// A marker-prefixed user line, marker stripped and whitespace-trimmed.
    Message(String),
    /// A CR-terminated line without the message marker. Diagnostic only.
    Malformed(String),
}

/// Accumulates raw bytes and classifies at most one frame per poll.
///
/// Purely a pull-based classifier: no rate limiting, no backpressure.
#[derive(Debug, Default)]
pub struct Framer {
    buffer: String,
}

impl Framer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly read bytes and classifies the buffer.
    ///
    /// Decoding is permissive: non-ASCII bytes are dropped rather than
    /// errored, so line noise cannot poison the buffer.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<Frame> {
        self.buffer
            .extend(bytes.iter().copied().filter(u8::is_ascii).map(char::from));
        self.poll()
    }

    /// Classifies the current buffer without new input.
    ///
    /// Handshake detection runs first and always wins: every byte around the
    /// marker, including a partially received message, is discarded.
    pub fn poll(&mut self) -> Option<Frame> {
        if self.buffer.contains(HANDSHAKE_MARKER) {
            self.buffer.clear();
            return Some(Frame::Handshake);
        }

        let end = self.buffer.find(MESSAGE_END)?;
        let candidate = self.buffer[..end].trim().to_string();
        self.buffer.clear();

        if let Some(at) = candidate.find(MESSAGE_MARKER) {
            let mut stripped = candidate;
            stripped.replace_range(at..at + MESSAGE_MARKER.len(), "");
            let text = stripped.trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(Frame::Message(text))
            }
        } else if candidate.is_empty() {
            None
        } else {
            Some(Frame::Malformed(candidate))
        }
    }

    /// Bytes currently buffered and not yet classified.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}
