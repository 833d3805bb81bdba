use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use retroline::{ByteChannel, LinkError};

/// Shared record of everything the bridge did to the channel.
#[derive(Debug, Default)]
pub struct ChannelTrace {
    pub reads: VecDeque<Vec<u8>>,
    pub writes: Vec<Vec<u8>>,
    pub flushes: usize,
}

/// Public-API channel double: serves scripted inbound chunks and records
/// writes/flushes into a shared trace.
pub struct TraceChannel {
    state: Arc<Mutex<ChannelTrace>>,
}

impl TraceChannel {
    pub fn new() -> (Self, Arc<Mutex<ChannelTrace>>) {
        let state = Arc::new(Mutex::new(ChannelTrace::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl ByteChannel for TraceChannel {
    fn bytes_available(&mut self) -> Result<usize, LinkError> {
        let state = lock_unpoisoned(&self.state);
        Ok(state.reads.front().map_or(0, Vec::len))
    }

    fn read_available(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut state = lock_unpoisoned(&self.state);
        Ok(state.reads.pop_front().unwrap_or_default())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut state = lock_unpoisoned(&self.state);
        state.writes.push(bytes.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        let mut state = lock_unpoisoned(&self.state);
        state.flushes += 1;
        Ok(())
    }
}

/// Channel whose reads fail: models losing the transport itself.
pub struct BrokenChannel;

impl ByteChannel for BrokenChannel {
    fn bytes_available(&mut self) -> Result<usize, LinkError> {
        Err(broken("polling"))
    }

    fn read_available(&mut self) -> Result<Vec<u8>, LinkError> {
        Err(broken("reading"))
    }

    fn write(&mut self, _bytes: &[u8]) -> Result<(), LinkError> {
        Err(broken("writing"))
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        Err(broken("flushing"))
    }
}

fn broken(operation: &'static str) -> LinkError {
    LinkError::new(
        operation,
        io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"),
    )
}

pub fn inject(state: &Arc<Mutex<ChannelTrace>>, bytes: &[u8]) {
    lock_unpoisoned(state).reads.push_back(bytes.to_vec());
}

pub fn written_chunks(state: &Arc<Mutex<ChannelTrace>>) -> Vec<Vec<u8>> {
    lock_unpoisoned(state).writes.clone()
}

pub fn clear_writes(state: &Arc<Mutex<ChannelTrace>>) {
    lock_unpoisoned(state).writes.clear();
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
