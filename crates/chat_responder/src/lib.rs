//! Minimal backend-agnostic contract for producing one chat response.
//!
//! This crate intentionally defines only the conversation turn shapes and the
//! response delivery contract. It excludes transport details, prompt
//! management, and every line-protocol concern.

use std::fmt;

/// Speaker tag for one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Returns the lowercase wire name used by chat backends.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One utterance in an ordered conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    /// Constructs a system turn.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }

    /// Constructs a user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Constructs an assistant turn.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Failure classes a backend may surface for one respond call.
///
/// Callers map each class to a distinct user-visible message; `Backend`
/// carries the backend's own human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    /// The backend rejected the configured credential.
    Auth,
    /// The backend refused the call due to rate or usage limits.
    RateLimit,
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => f.write_str("backend rejected the API credential"),
            Self::RateLimit => f.write_str("backend rate limit exceeded"),
            Self::Backend(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for ResponderError {}

/// Lazy sequence of response-text fragments.
///
/// A fragment may carry a mid-stream failure; iteration stops being
/// meaningful after the first `Err`.
pub type FragmentStream = Box<dyn Iterator<Item = Result<String, ResponderError>> + Send>;

/// Response delivery shape: one block, or a lazy fragment sequence.
///
/// A complete string is equivalent to a fragment stream yielding it once;
/// consumers treat both identically.
pub enum ResponderReply {
    Complete(String),
    Fragments(FragmentStream),
}

impl ResponderReply {
    /// Wraps an eager fragment list as a lazy stream.
    #[must_use]
    pub fn from_fragments(fragments: Vec<String>) -> Self {
        Self::Fragments(Box::new(fragments.into_iter().map(Ok)))
    }

    /// Drains the reply into its full concatenated text.
    pub fn collect_text(self) -> Result<String, ResponderError> {
        match self {
            Self::Complete(text) => Ok(text),
            Self::Fragments(fragments) => {
                let mut text = String::new();
                for fragment in fragments {
                    text.push_str(&fragment?);
                }
                Ok(text)
            }
        }
    }
}

impl fmt::Debug for ResponderReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Self::Fragments(_) => f.write_str("Fragments(..)"),
        }
    }
}

/// Backend interface for producing one response to an ordered conversation.
///
/// `turns` is the full history, system turn first. The call may block for the
/// duration of the backend round trip; the caller owns all pacing concerns.
pub trait Responder: Send + Sync {
    fn respond(&self, turns: &[Turn]) -> Result<ResponderReply, ResponderError>;
}

#[cfg(test)]
mod tests {
    use super::{Responder, ResponderError, ResponderReply, Role, Turn};

    struct EchoResponder;

    impl Responder for EchoResponder {
        fn respond(&self, turns: &[Turn]) -> Result<ResponderReply, ResponderError> {
            let last = turns
                .last()
                .ok_or_else(|| ResponderError::Backend("empty conversation".to_string()))?;
            Ok(ResponderReply::Complete(last.text.clone()))
        }
    }

    #[test]
    fn role_wire_names_are_lowercase() {
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn turn_constructors_tag_roles() {
        assert_eq!(
            Turn::system("instructions"),
            Turn {
                role: Role::System,
                text: "instructions".to_string(),
            }
        );
        assert_eq!(Turn::user("hello").role, Role::User);
        assert_eq!(Turn::assistant("hi").role, Role::Assistant);
    }

    #[test]
    fn error_display_gives_distinct_messages() {
        let auth = ResponderError::Auth.to_string();
        let rate = ResponderError::RateLimit.to_string();
        let backend = ResponderError::Backend("stream reset".to_string()).to_string();

        assert_ne!(auth, rate);
        assert_ne!(auth, backend);
        assert_eq!(backend, "stream reset");
    }

    #[test]
    fn from_fragments_preserves_order_and_content() {
        let reply = ResponderReply::from_fragments(vec!["Hi ".to_string(), "there".to_string()]);
        assert_eq!(
            reply.collect_text().expect("fragments should collect"),
            "Hi there"
        );
    }

    #[test]
    fn collect_text_surfaces_mid_stream_failure() {
        let fragments: super::FragmentStream = Box::new(
            vec![Ok("partial ".to_string()), Err(ResponderError::RateLimit)].into_iter(),
        );
        let collected = ResponderReply::Fragments(fragments).collect_text();
        assert_eq!(collected, Err(ResponderError::RateLimit));
    }

    #[test]
    fn responder_receives_full_history_in_order() {
        let turns = vec![
            Turn::system("be brief"),
            Turn::user("HELLO"),
            Turn::assistant("HI"),
            Turn::user("PING"),
        ];
        let reply = EchoResponder
            .respond(&turns)
            .expect("echo responder should succeed");
        assert_eq!(
            reply.collect_text().expect("complete reply collects"),
            "PING"
        );
    }
}
