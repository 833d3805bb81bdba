//! Abstract duplex byte channel between the bridge and the device.

use crate::error::LinkError;

/// Non-blocking duplex byte stream.
///
/// Absence of data is not an error: `read_available` returns an empty vector
/// when nothing is pending, and no operation blocks beyond a short bounded
/// interval. Implementations must have physically transmitted a write by the
/// time `flush` returns; the bridge flushes after every protocol-significant
/// unit (each ACK byte, each token, each separator, the terminator).
pub trait ByteChannel {
    /// Number of bytes ready to read without blocking.
    fn bytes_available(&mut self) -> Result<usize, LinkError>;

    /// Drains and returns all currently pending bytes, possibly none.
    fn read_available(&mut self) -> Result<Vec<u8>, LinkError>;

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError>;

    fn flush(&mut self) -> Result<(), LinkError>;
}
