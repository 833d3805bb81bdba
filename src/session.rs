//! Conversation history and connection/idle state.
//!
//! Owns no I/O: the clock enters as `Instant` arguments, so every transition
//! is testable without a channel or a responder.

use std::time::{Duration, Instant};

use chat_responder::Turn;

use crate::wire::IDLE_PROMPT;

/// Where a message entering the session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Framed off the serial line.
    Remote,
    /// Synthesized by the idle check.
    Idle,
}

/// Connection and conversation state owned by the bridge.
///
/// Invariants:
/// - the first turn is always the system turn and is never removed;
/// - reset replaces the whole history with that single system turn;
/// - turns are only appended: a user turn per framed message, an assistant
///   turn per completed response (success or error text).
#[derive(Debug)]
pub struct Session {
    system_prompt: String,
    conversation: Vec<Turn>,
    connected: bool,
    last_activity: Instant,
    auto_message_sent: bool,
}

impl Session {
    /// Creates a disconnected session holding only the system turn.
    #[must_use]
    pub fn new(system_prompt: impl Into<String>, now: Instant) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            conversation: vec![Turn::system(system_prompt.clone())],
            system_prompt,
            connected: false,
            last_activity: now,
            auto_message_sent: false,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Ordered turns, system turn first.
    #[must_use]
    pub fn conversation(&self) -> &[Turn] {
        &self.conversation
    }

    /// Handshake transition: enters `Connected` from any state.
    ///
    /// Idempotent on purpose: the device re-handshakes after a reset, and
    /// every occurrence replays the full reset (history, activity clock,
    /// idle-prompt arming).
    pub fn on_handshake(&mut self, now: Instant) {
        self.conversation.clear();
        self.conversation.push(Turn::system(self.system_prompt.clone()));
        self.connected = true;
        self.last_activity = now;
        self.auto_message_sent = false;
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.conversation.push(Turn::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.conversation.push(Turn::assistant(text));
    }

    pub fn mark_activity(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Returns the synthetic prompt when the idle window has elapsed.
    ///
    /// Fires at most once per connection; the next handshake re-arms it.
    pub fn idle_prompt_due(
        &mut self,
        idle_timeout: Duration,
        enabled: bool,
        now: Instant,
    ) -> Option<&'static str> {
        if !self.connected || self.auto_message_sent || !enabled {
            return None;
        }
        if now.duration_since(self.last_activity) <= idle_timeout {
            return None;
        }

        self.auto_message_sent = true;
        Some(IDLE_PROMPT)
    }
}
