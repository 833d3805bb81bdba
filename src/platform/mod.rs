//! Platform-backed channel implementations.

#[cfg(unix)]
pub mod serial_port;

#[cfg(unix)]
pub use serial_port::SerialPort;
