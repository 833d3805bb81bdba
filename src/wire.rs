//! Bit-exact wire protocol constants shared with the device firmware.
//!
//! Everything here must match the device side byte for byte; local tuning
//! knobs live in [`crate::config::BridgeConfig`] instead.

use std::time::Duration;

/// Marker the device transmits while connecting or reconnecting.
pub const HANDSHAKE_MARKER: &str = "C64_CHAT_READY";

/// Acknowledgement byte the device scans for after its handshake.
pub const ACK_BYTE: u8 = b'C';

/// Number of acknowledgement bytes sent per handshake.
///
/// The device polls its ACIA between display updates and can miss a single
/// byte, so the protocol over-sends a short paced burst instead of running a
/// request/ack/retry cycle.
pub const ACK_REPEATS: u32 = 3;

/// Delay separating consecutive acknowledgement bytes.
pub const ACK_REPEAT_DELAY: Duration = Duration::from_millis(150);

/// Marker the device prefixes to every submitted line.
pub const MESSAGE_MARKER: &str = "MSG:";

/// Carriage return terminating every inbound line.
pub const MESSAGE_END: char = '\r';

/// Control byte signalling "response complete" to the device.
pub const TERMINATOR_BYTE: u8 = 0x04;

/// Fixed prompt injected when the remote side has been silent past the
/// configured idle threshold.
pub const IDLE_PROMPT: &str =
    "The user has been quiet for a while. Greet them and ask how their day is going.";
