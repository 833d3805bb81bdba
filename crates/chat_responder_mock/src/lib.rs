//! Deterministic mock implementation of the shared `chat_responder` contract.
//!
//! This crate contains no transport logic and is intended for local bridge
//! runs against a real device and for contract-level integration testing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chat_responder::{Responder, ResponderError, ResponderReply, Turn};

/// Stable responder identifier used for explicit startup selection.
pub const MOCK_RESPONDER_ID: &str = "mock";

/// One scripted reply, consumed in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyScript {
    /// A single complete response block.
    Complete(String),
    /// An eager fragment list delivered as a lazy stream.
    Fragments(Vec<String>),
    /// The respond call itself fails.
    Fail(ResponderError),
    /// The stream yields fragments, then fails mid-delivery.
    FailAfter {
        fragments: Vec<String>,
        error: ResponderError,
    },
}

/// Scripted responder used by `serial_bridge` local runs and core tests.
#[derive(Debug)]
pub struct MockResponder {
    script: Mutex<VecDeque<ReplyScript>>,
    fallback: Vec<String>,
}

impl MockResponder {
    /// Creates a mock whose scripted replies are consumed in order, falling
    /// back to the default canned reply once the script is exhausted.
    #[must_use]
    pub fn new(script: Vec<ReplyScript>) -> Self {
        Self::with_fallback(script, default_fallback())
    }

    /// Creates a mock with an explicit post-script fallback reply.
    #[must_use]
    pub fn with_fallback(script: Vec<ReplyScript>, fallback: Vec<String>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: sanitize_fallback(fallback),
        }
    }

    /// Remaining scripted replies not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        lock_unpoisoned(&self.script).len()
    }
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Responder for MockResponder {
    fn respond(&self, turns: &[Turn]) -> Result<ResponderReply, ResponderError> {
        if turns.is_empty() {
            return Err(ResponderError::Backend(
                "conversation must not be empty".to_string(),
            ));
        }

        let next = lock_unpoisoned(&self.script).pop_front();
        match next {
            Some(ReplyScript::Complete(text)) => Ok(ResponderReply::Complete(text)),
            Some(ReplyScript::Fragments(fragments)) => {
                Ok(ResponderReply::from_fragments(fragments))
            }
            Some(ReplyScript::Fail(error)) => Err(error),
            Some(ReplyScript::FailAfter { fragments, error }) => {
                let stream = fragments
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(error)));
                Ok(ResponderReply::Fragments(Box::new(stream)))
            }
            None => Ok(ResponderReply::from_fragments(self.fallback.clone())),
        }
    }
}

fn default_fallback() -> Vec<String> {
    vec![
        "Greetings from the modern side ".to_string(),
        "of the serial line. ".to_string(),
        "Ask me anything.".to_string(),
    ]
}

fn sanitize_fallback(fallback: Vec<String>) -> Vec<String> {
    if fallback.iter().all(|fragment| fragment.trim().is_empty()) {
        default_fallback()
    } else {
        fallback
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
