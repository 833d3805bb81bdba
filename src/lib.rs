//! Line protocol and session state machine for bridging a retro serial chat
//! terminal to a conversational-AI responder.
//!
//! Invariant: single cooperative loop. Handshake detection always runs
//! before message extraction, and each poll processes at most one frame.
//!
//! # Public API Overview
//! - Bit-exact protocol markers in [`wire`].
//! - Swap transports behind [`ByteChannel`]; [`SerialPort`] implements it
//!   for Unix serial devices.
//! - Classify inbound bytes with [`Framer`] into [`Frame`] events.
//! - Track conversation history and connection/idle state in [`Session`],
//!   free of I/O.
//! - Deliver paced uppercase tokens with [`WordStreamer`].
//! - Tie the above to a [`chat_responder::Responder`] via [`Bridge`].

pub mod bridge;
pub mod channel;
pub mod config;
pub mod error;
pub mod framer;
pub mod platform;
pub mod session;
pub mod streamer;
pub mod wire;

pub use bridge::Bridge;
pub use channel::ByteChannel;
pub use config::BridgeConfig;
pub use error::{BridgeError, LinkError};
pub use framer::{Frame, Framer};
pub use session::{MessageOrigin, Session};
pub use streamer::{device_error_text, WordStreamer};

#[cfg(unix)]
pub use platform::SerialPort;
