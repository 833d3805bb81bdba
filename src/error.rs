use std::io;

use thiserror::Error;

/// Transport failure on the duplex byte channel.
///
/// Always fatal: the control loop terminates and the channel is released.
/// Backend failures never become a `LinkError`; they are surfaced to the
/// device as ordinary response text.
#[derive(Debug, Error)]
#[error("serial link failed while {operation}: {source}")]
pub struct LinkError {
    pub operation: &'static str,
    #[source]
    pub source: io::Error,
}

impl LinkError {
    #[must_use]
    pub fn new(operation: &'static str, source: io::Error) -> Self {
        Self { operation, source }
    }
}

/// Top-level bridge failure.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("unsupported baud rate {0}")]
    UnsupportedBaudRate(u32),
}
