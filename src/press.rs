//! Press hand-off from the capture context to the builder worker.
//!
//! The capture callback runs in interrupt context, so the hand-off
//! primitive must be non-blocking and non-allocating on the raise side.
//! [`PressSignal`] wraps an `embassy_sync` [`Signal`]: raising is a
//! short critical section that overwrites any previous value, so presses
//! arriving faster than the worker wakes collapse into a single wake
//! carrying the *latest* press. Only [`PressCounters`] preserves how
//! many presses actually happened.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::command::ButtonId;

/// One observed button press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Press {
    /// Which button fired.
    pub button: ButtonId,
    /// 0-based cumulative press index of that button at raise time.
    pub ordinal: u32,
}

/// Saturating wake signal between capture and the command builder.
///
/// Raise never blocks and never queues: a raise while one is already
/// pending replaces the pending value. Wait consumes the pending press.
pub struct PressSignal {
    inner: Signal<CriticalSectionRawMutex, Press>,
}

impl PressSignal {
    pub const fn new() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    /// Raise the signal. Safe from interrupt context: O(1), no blocking,
    /// no allocation.
    pub fn raise(&self, press: Press) {
        self.inner.signal(press);
    }

    /// Wait for the next press. Worker context only.
    pub async fn wait(&self) -> Press {
        self.inner.wait().await
    }

    /// Whether a press is pending (mostly useful in tests).
    pub fn is_raised(&self) -> bool {
        self.inner.signaled()
    }
}

impl Default for PressSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative per-button press counters since boot.
///
/// Written by the capture callback, read-only everywhere else.
pub struct PressCounters {
    counts: [AtomicU32; ButtonId::COUNT],
}

impl PressCounters {
    pub const fn new() -> Self {
        const ZERO: AtomicU32 = AtomicU32::new(0);
        Self {
            counts: [ZERO; ButtonId::COUNT],
        }
    }

    /// Record one press; returns the 0-based ordinal of this press.
    pub fn bump(&self, button: ButtonId) -> u32 {
        self.counts[button.index()].fetch_add(1, Ordering::Relaxed)
    }

    /// Total presses recorded for the button since boot.
    pub fn count(&self, button: ButtonId) -> u32 {
        self.counts[button.index()].load(Ordering::Relaxed)
    }
}

impl Default for PressCounters {
    fn default() -> Self {
        Self::new()
    }
}
