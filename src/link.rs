//! Connectivity state machine and link monitoring.
//!
//! Link-layer and address-assignment events arrive on the platform's
//! event-dispatch context and are posted (non-blocking) onto a small
//! channel. The [`link_monitor`] worker drains that channel, advances
//! the pure [`LinkMachine`], publishes the resulting state through the
//! mutex-guarded [`SharedLinkState`] accessor, and publishes the
//! transmitter gate value:
//!
//! ```text
//! Disconnected ──Started──▶ Connecting ──AddressAssigned──▶ Connected
//!       ▲                       │                               │
//!       └────────Lost/Stopped───┴─────────Lost/Stopped──────────┘
//! ```
//!
//! Entering `Connected` gates the transmitter to `Run`; leaving it
//! gates to `Stop` (taking effect between transactions). Every
//! `Started` or `Lost` event also requests a new association attempt
//! from the link driver; a deliberate `Stopped` does not. The facade's
//! teardown is itself an event, so the machine is the only writer of
//! the published state.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration};
use log::{error, info};

use crate::config::STATE_ACCESS_BOUND_MS;
use crate::error::Error;
use crate::switch::SwitchContext;
use crate::transmitter::TxGate;

/// Wireless link availability, process-wide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Events fed to the state machine by the link driver and the facade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// The link layer started; association may be attempted.
    Started,
    /// The link dropped, from whatever state it was in.
    Lost,
    /// Address assignment completed; the network is usable.
    AddressAssigned,
    /// The facade tore the link down deliberately. Unlike `Lost`, no
    /// re-association is requested.
    Stopped,
}

/// Side effects a transition asks the runtime to perform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkActions {
    /// Ask the link driver for a (re-)association attempt.
    pub associate: bool,
    /// Bring the transmitter worker up.
    pub start_transmitter: bool,
    /// Take the transmitter worker down.
    pub stop_transmitter: bool,
}

/// Pure transition logic; no I/O, no locking.
pub struct LinkMachine {
    state: ConnectionState,
}

impl LinkMachine {
    pub const fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Advance on one event, returning the side effects to perform.
    ///
    /// `Connected` is only ever entered on `AddressAssigned`; any `Lost`
    /// drops straight to `Disconnected` regardless of the prior state.
    pub fn on_event(&mut self, event: LinkEvent) -> LinkActions {
        let mut actions = LinkActions::default();
        match event {
            LinkEvent::Started => {
                if self.state == ConnectionState::Disconnected {
                    self.state = ConnectionState::Connecting;
                }
                actions.associate = true;
            }
            LinkEvent::Lost => {
                actions.stop_transmitter = self.state == ConnectionState::Connected;
                self.state = ConnectionState::Disconnected;
                actions.associate = true;
            }
            LinkEvent::AddressAssigned => {
                self.state = ConnectionState::Connected;
                actions.start_transmitter = true;
            }
            LinkEvent::Stopped => {
                actions.stop_transmitter = self.state == ConnectionState::Connected;
                self.state = ConnectionState::Disconnected;
            }
        }
        actions
    }
}

impl Default for LinkMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutex-guarded accessor around the single connection-state value.
///
/// Every read and write goes through [`get`](Self::get) /
/// [`set`](Self::set) with a caller-supplied bound on the lock wait;
/// there is no other path to the state, so torn reads are impossible.
pub struct SharedLinkState {
    inner: Mutex<CriticalSectionRawMutex, ConnectionState>,
}

impl SharedLinkState {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(ConnectionState::Disconnected),
        }
    }

    /// Read the state, waiting at most `bound` for the lock.
    pub async fn get(&self, bound: Duration) -> Result<ConnectionState, Error> {
        let guard = with_timeout(bound, self.inner.lock())
            .await
            .map_err(|_| Error::SendTimeout)?;
        Ok(*guard)
    }

    /// Write the state, waiting at most `bound` for the lock.
    pub async fn set(&self, bound: Duration, state: ConnectionState) -> Result<(), Error> {
        let mut guard = with_timeout(bound, self.inner.lock())
            .await
            .map_err(|_| Error::SendTimeout)?;
        *guard = state;
        Ok(())
    }
}

impl Default for SharedLinkState {
    fn default() -> Self {
        Self::new()
    }
}

/// Link driver collaborator: radio bring-up mechanics live behind this.
#[allow(async_fn_in_trait)]
pub trait LinkDriver {
    /// Start the link layer; events begin flowing to the core.
    async fn bring_up(&mut self) -> Result<(), Error>;

    /// Stop the link layer; no further events are delivered.
    async fn tear_down(&mut self) -> Result<(), Error>;
}

/// Non-blocking handle the monitor uses to request association attempts.
///
/// Kept separate from [`LinkDriver`] so the monitor never needs mutable
/// access to the driver; implementations typically latch a signal the
/// driver task consumes.
pub trait Associate {
    fn request_associate(&self);
}

/// Link monitor worker: turns driver events into state updates and
/// transmitter lifecycle signals. Never returns; torn down only with
/// the executor.
pub async fn link_monitor<A: Associate, const N: usize>(
    ctx: &SwitchContext<N>,
    assoc: &A,
) -> ! {
    let mut machine = LinkMachine::new();
    let bound = Duration::from_millis(STATE_ACCESS_BOUND_MS);

    loop {
        let event = ctx.link_events.receive().await;
        let actions = machine.on_event(event);
        info!("link: {:?} -> {:?}", event, machine.state());

        if let Err(err) = ctx.link_state.set(bound, machine.state()).await {
            error!("link: state update failed: {:?}", err);
        }
        if actions.stop_transmitter {
            ctx.tx_gate.signal(TxGate::Stop);
        }
        if actions.start_transmitter {
            ctx.tx_gate.signal(TxGate::Run);
        }
        if actions.associate {
            assoc.request_associate();
        }
    }
}
