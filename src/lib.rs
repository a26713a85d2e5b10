//! # btn2net
//!
//! Button-to-network remote switch: a physical button press becomes a
//! small binary command sent over TCP to the LAN gateway of the current
//! wireless network.
//!
//! ## Architecture
//!
//! ```text
//! GPIO edge ──▶ PressSignal ──▶ command builder ──▶ CommandQueue ──▶ transmitter ──▶ gateway
//!                                                          ▲
//!                  link events ──▶ link monitor ───────────┘ (run / stop)
//! ```
//!
//! The press signal is saturating: presses arriving faster than the
//! builder wakes collapse into one wake carrying the latest press. The
//! command queue is a bounded FIFO between the builder and the
//! transmitter. The transmitter only runs while the connectivity state
//! machine reports `Connected`; commands queued across a link loss stay
//! queued and are sent after reconnection.
//!
//! All hardware access lives behind the `embedded` cargo feature and the
//! [`capture::Capture`] / [`link::LinkDriver`] / [`transmitter::Transport`]
//! collaborator traits, so the whole pipeline runs in host tests with
//! fakes.

#![cfg_attr(not(test), no_std)]

pub mod builder;
pub mod capture;
pub mod command;
pub mod config;
pub mod error;
pub mod link;
pub mod press;
pub mod queue;
pub mod switch;
pub mod transmitter;

#[cfg(feature = "embedded")]
pub mod hw;

pub use command::{Action, ActuatorId, ButtonId, ButtonRoles, Command};
pub use error::{Error, TransportError};
pub use link::{ConnectionState, LinkEvent};
pub use press::{Press, PressSignal};
pub use queue::CommandQueue;
pub use switch::{RemoteSwitch, StartPolicy, SwitchContext};
