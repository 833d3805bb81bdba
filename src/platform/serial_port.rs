//! Unix serial port backed [`ByteChannel`].

use std::ffi::CString;
use std::io;

use libc::{self, c_int};

use crate::channel::ByteChannel;
use crate::error::{BridgeError, LinkError};

/// Serial device opened raw and non-blocking, closed on drop.
///
/// 8N1 framing with modem control lines ignored; the device side is a bare
/// three-wire ACIA hookup with no flow control.
#[derive(Debug)]
pub struct SerialPort {
    fd: c_int,
}

impl SerialPort {
    /// Opens `path` at `baud_rate`, configures raw mode, and drains any line
    /// noise accumulated before configuration.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, BridgeError> {
        let speed = baud_constant(baud_rate).ok_or(BridgeError::UnsupportedBaudRate(baud_rate))?;
        let c_path = CString::new(path).map_err(|_| {
            LinkError::new(
                "opening",
                io::Error::new(io::ErrorKind::InvalidInput, "device path contains NUL"),
            )
        })?;

        let flags = libc::O_RDWR | libc::O_NOCTTY | libc::O_NONBLOCK | libc::O_CLOEXEC;
        let fd = loop {
            let fd = unsafe { libc::open(c_path.as_ptr(), flags) };
            if fd >= 0 {
                break fd;
            }
            let error = io::Error::last_os_error();
            if error.kind() != io::ErrorKind::Interrupted {
                return Err(LinkError::new("opening", error).into());
            }
        };

        let port = Self { fd };
        port.configure(speed)?;
        unsafe { libc::tcflush(port.fd, libc::TCIOFLUSH) };
        Ok(port)
    }

    fn configure(&self, speed: libc::speed_t) -> Result<(), BridgeError> {
        let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
        if unsafe { libc::tcgetattr(self.fd, &mut termios) } != 0 {
            return Err(LinkError::new("configuring", io::Error::last_os_error()).into());
        }

        unsafe {
            libc::cfmakeraw(&mut termios);
            libc::cfsetispeed(&mut termios, speed);
            libc::cfsetospeed(&mut termios, speed);
        }
        termios.c_cflag |= libc::CREAD | libc::CLOCAL;
        // Reads return immediately with whatever is pending.
        termios.c_cc[libc::VMIN] = 0;
        termios.c_cc[libc::VTIME] = 0;

        if unsafe { libc::tcsetattr(self.fd, libc::TCSANOW, &termios) } != 0 {
            return Err(LinkError::new("configuring", io::Error::last_os_error()).into());
        }
        Ok(())
    }
}

impl ByteChannel for SerialPort {
    fn bytes_available(&mut self) -> Result<usize, LinkError> {
        let mut available: c_int = 0;
        if unsafe { libc::ioctl(self.fd, libc::FIONREAD, &mut available) } != 0 {
            return Err(LinkError::new("polling", io::Error::last_os_error()));
        }
        Ok(available.max(0) as usize)
    }

    fn read_available(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut out = Vec::new();
        let mut buffer = [0u8; 256];

        loop {
            let read = unsafe {
                libc::read(
                    self.fd,
                    buffer.as_mut_ptr() as *mut libc::c_void,
                    buffer.len(),
                )
            };
            if read > 0 {
                out.extend_from_slice(&buffer[..read as usize]);
                continue;
            }
            if read == 0 {
                break;
            }

            let error = io::Error::last_os_error();
            match error.kind() {
                io::ErrorKind::WouldBlock => break,
                io::ErrorKind::Interrupted => {}
                _ => return Err(LinkError::new("reading", error)),
            }
        }

        Ok(out)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut remaining = bytes;
        while !remaining.is_empty() {
            let written = unsafe {
                libc::write(
                    self.fd,
                    remaining.as_ptr() as *const libc::c_void,
                    remaining.len(),
                )
            };
            if written >= 0 {
                remaining = &remaining[written as usize..];
                continue;
            }

            let error = io::Error::last_os_error();
            match error.kind() {
                // The kernel buffer drains slowly at low baud rates; wait
                // until the fd is writable again.
                io::ErrorKind::WouldBlock => wait_for_pollout(self.fd)?,
                io::ErrorKind::Interrupted => {}
                _ => return Err(LinkError::new("writing", error)),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        loop {
            if unsafe { libc::tcdrain(self.fd) } == 0 {
                return Ok(());
            }
            let error = io::Error::last_os_error();
            if error.kind() != io::ErrorKind::Interrupted {
                return Err(LinkError::new("flushing", error));
            }
        }
    }
}

impl Drop for SerialPort {
    fn drop(&mut self) {
        let _ = unsafe { libc::close(self.fd) };
    }
}

fn wait_for_pollout(fd: c_int) -> Result<(), LinkError> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };

    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result > 0 {
            return Ok(());
        }
        let error = io::Error::last_os_error();
        if result < 0 && error.kind() != io::ErrorKind::Interrupted {
            return Err(LinkError::new("writing", error));
        }
    }
}

fn baud_constant(baud_rate: u32) -> Option<libc::speed_t> {
    Some(match baud_rate {
        300 => libc::B300,
        600 => libc::B600,
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        _ => return None,
    })
}
