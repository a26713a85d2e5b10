//! Remote-switch facade and shared context.
//!
//! [`SwitchContext`] bundles every piece of state shared between the
//! capture callback, the workers and the platform event handlers. It is
//! an explicitly owned object rather than file-scope globals: firmware
//! puts one in a `static`, tests build one on the stack.
//!
//! [`RemoteSwitch`] orchestrates initialization and teardown ordering
//! on top of the context and the platform collaborators. Every
//! operation returns a result to its immediate caller and is logged;
//! nothing panics under normal conditions.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use log::{debug, error, info, warn};

use crate::capture::Capture;
use crate::command::{ButtonId, Command};
use crate::config::{
    LINK_EVENT_DEPTH, LINK_POLL_MS, LINK_UP_RETRIES, QUEUE_CAPACITY, STATE_ACCESS_BOUND_MS,
};
use crate::error::Error;
use crate::link::{ConnectionState, LinkDriver, LinkEvent, SharedLinkState};
use crate::press::{Press, PressCounters, PressSignal};
use crate::queue::CommandQueue;
use crate::transmitter::TxGate;

/// Everything the pipeline shares, in one place.
pub struct SwitchContext<const N: usize = QUEUE_CAPACITY> {
    /// Capture-to-builder wake signal.
    pub press: PressSignal,
    /// Cumulative press counters, written by the capture callback.
    pub counters: PressCounters,
    /// Pending commands between builder and transmitter.
    pub queue: CommandQueue<N>,
    /// The single connection-state value, behind its accessor.
    pub link_state: SharedLinkState,
    /// Driver events awaiting the link monitor.
    pub link_events: Channel<CriticalSectionRawMutex, LinkEvent, LINK_EVENT_DEPTH>,
    /// Desired transmitter state, published by the link monitor.
    /// Latest value wins: a run followed by a stop collapses to stop.
    pub tx_gate: Signal<CriticalSectionRawMutex, TxGate>,
    /// Raised during de-initialization to stop the builder worker.
    pub builder_stop: Signal<CriticalSectionRawMutex, ()>,
    initialized: AtomicBool,
}

impl<const N: usize> SwitchContext<N> {
    pub const fn new() -> Self {
        Self {
            press: PressSignal::new(),
            counters: PressCounters::new(),
            queue: CommandQueue::new(),
            link_state: SharedLinkState::new(),
            link_events: Channel::new(),
            tx_gate: Signal::new(),
            builder_stop: Signal::new(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Record a press: bump the counter and raise the saturating wake
    /// signal. This is the whole interrupt-context path.
    pub fn record_press(&self, button: ButtonId) {
        let ordinal = self.counters.bump(button);
        self.press.raise(Press { button, ordinal });
    }

    /// Cumulative presses of `button` since boot.
    pub fn press_count(&self, button: ButtonId) -> u32 {
        self.counters.count(button)
    }

    /// Post a driver event toward the link monitor. Non-blocking: the
    /// platform event-dispatch context must never stall here, so an
    /// overflowing event channel drops the event with a log line.
    pub fn post_link_event(&self, event: LinkEvent) {
        if self.link_events.try_send(event).is_err() {
            warn!("link: event channel full, {:?} dropped", event);
        }
    }

    /// Guarded insertion used by the command builder: the module must be
    /// initialized and the link `Connected` (confirmed through the
    /// bounded accessor) before the command may enter the queue.
    pub async fn submit(&self, cmd: Command, timeout: Duration) -> Result<(), Error> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(Error::NotInitialized);
        }

        let bound = Duration::from_millis(STATE_ACCESS_BOUND_MS);
        if self.link_state.get(bound).await? != ConnectionState::Connected {
            return Err(Error::SendTimeout);
        }

        self.queue.enqueue(cmd, timeout).await
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}

impl<const N: usize> Default for SwitchContext<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// How long `start_transport` keeps polling for `Connected`.
#[derive(Clone, Copy, Debug)]
pub struct StartPolicy {
    pub retries: u32,
    pub poll: Duration,
}

impl Default for StartPolicy {
    fn default() -> Self {
        Self {
            retries: LINK_UP_RETRIES,
            poll: Duration::from_millis(LINK_POLL_MS),
        }
    }
}

/// Facade over the pipeline: init / start / stop / de-init.
pub struct RemoteSwitch<'a, C: Capture, L: LinkDriver, const N: usize = QUEUE_CAPACITY> {
    ctx: &'a SwitchContext<N>,
    capture: C,
    link: L,
    policy: StartPolicy,
}

impl<'a, C: Capture, L: LinkDriver, const N: usize> RemoteSwitch<'a, C, L, N> {
    pub fn new(ctx: &'a SwitchContext<N>, capture: C, link: L) -> Self {
        Self {
            ctx,
            capture,
            link,
            policy: StartPolicy::default(),
        }
    }

    /// Override the bounded retry loop of [`start_transport`]; tests
    /// shrink it.
    pub fn with_start_policy(mut self, policy: StartPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn context(&self) -> &'a SwitchContext<N> {
        self.ctx
    }

    /// Initialize capture for the given button and mark the module
    /// ready. Worker futures are spawned by the caller's executor.
    pub fn init(&self, button: ButtonId) -> Result<(), Error> {
        let result = self.capture.init(button).map(|()| {
            self.ctx.initialized.store(true, Ordering::Release);
        });
        logged("init", result)
    }

    /// Bring the link up and block until `Connected` is observed, so
    /// the transmitter exists when this returns success.
    pub async fn start_transport(&mut self) -> Result<(), Error> {
        logged("start_transport", self.start_transport_inner().await)
    }

    async fn start_transport_inner(&mut self) -> Result<(), Error> {
        if !self.ctx.is_initialized() {
            return Err(Error::NotInitialized);
        }

        self.link.bring_up().await?;

        let bound = Duration::from_millis(STATE_ACCESS_BOUND_MS);
        for _ in 0..self.policy.retries {
            if self.ctx.link_state.get(bound).await? == ConnectionState::Connected {
                return Ok(());
            }
            info!("start_transport: waiting for connection");
            Timer::after(self.policy.poll).await;
        }
        Err(Error::LinkUpTimeout)
    }

    /// Tear the link down. The teardown is posted as an event so the
    /// link monitor's machine observes it like any other transition;
    /// the monitor moves the state to `Disconnected` and stops the
    /// transmitter. Queued commands stay queued.
    pub async fn stop_transport(&mut self) -> Result<(), Error> {
        let result = async {
            self.link.tear_down().await?;
            self.ctx.post_link_event(LinkEvent::Stopped);
            Ok(())
        }
        .await;
        logged("stop_transport", result)
    }

    /// Release capture resources and stop both workers.
    pub fn de_init(&self, button: ButtonId) -> Result<(), Error> {
        let result = self
            .capture
            .deinit(button)
            .map_err(|_| Error::Teardown)
            .map(|()| {
                self.ctx.builder_stop.signal(());
                self.ctx.tx_gate.signal(TxGate::Stop);
                self.ctx.initialized.store(false, Ordering::Release);
            });
        logged("de_init", result)
    }
}

/// Log an operation result with severity matching the outcome, then
/// hand it back unchanged.
fn logged(op: &str, result: Result<(), Error>) -> Result<(), Error> {
    match &result {
        Ok(()) => debug!("{}: ok", op),
        Err(err) => error!("{}: {:?}", op, err),
    }
    result
}
