//! Bounded FIFO of pending commands.
//!
//! Single producer (the command builder), single consumer (the
//! transmitter). The queue owns the buffered values until dequeued.
//! Insertion waits a bounded time for space; removal waits forever.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration};

use crate::command::Command;
use crate::config::QUEUE_CAPACITY;
use crate::error::Error;

/// Bounded command queue between builder and transmitter.
pub struct CommandQueue<const N: usize = QUEUE_CAPACITY> {
    inner: Channel<CriticalSectionRawMutex, Command, N>,
}

impl<const N: usize> CommandQueue<N> {
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
        }
    }

    /// Insert a command, waiting up to `timeout` for space.
    ///
    /// A zero timeout never suspends: it returns [`Error::QueueFull`]
    /// immediately when the queue is at capacity.
    pub async fn enqueue(&self, cmd: Command, timeout: Duration) -> Result<(), Error> {
        if timeout.as_ticks() == 0 {
            return self.inner.try_send(cmd).map_err(|_| Error::QueueFull);
        }
        with_timeout(timeout, self.inner.send(cmd))
            .await
            .map_err(|_| Error::QueueFull)
    }

    /// Remove the oldest command, waiting indefinitely. Transmitter only.
    pub async fn dequeue(&self) -> Command {
        self.inner.receive().await
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for CommandQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
