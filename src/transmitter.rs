//! Transmitter worker: one network transaction per command.
//!
//! Delivery is at-most-once and best-effort: a failed connect or write
//! is logged and the worker moves on to the next command. Nothing is
//! retried or re-queued.
//!
//! The worker only runs while the link monitor's gate reads [`TxGate::Run`].
//! The gate is a single latest-value signal rather than a pair of
//! run/stop flags: a connect immediately followed by a loss collapses to
//! `Stop`, so a stale run can never revive the worker on a dead link.
//! Cancellation is cooperative and happens between transactions, never
//! mid-write; commands still queued when the link drops stay queued and
//! are drained after the next reconnect.

use core::net::SocketAddrV4;

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use embedded_io_async::Write;
use log::{info, warn};

use crate::command::Command;
use crate::config::GATEWAY_RETRY_MS;
use crate::error::TransportError;
use crate::switch::SwitchContext;

/// Desired transmitter state, published by the link monitor. Latest
/// value wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxGate {
    Run,
    Stop,
}

/// One open connection to the gateway, good for a single record.
#[allow(async_fn_in_trait)]
pub trait Connection: Write {
    /// Close the connection. Called regardless of the write outcome.
    async fn close(self);
}

/// Transport collaborator: connection-oriented, one session per record.
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Connection<'a>: Connection
    where
        Self: 'a;

    /// Resolve the gateway address. Called once per worker start.
    async fn gateway(&mut self) -> Result<SocketAddrV4, TransportError>;

    /// Open a new connection to the gateway.
    async fn connect(
        &mut self,
        gateway: SocketAddrV4,
    ) -> Result<Self::Connection<'_>, TransportError>;
}

/// Transmitter worker. Parks until the link monitor's gate reads `Run`,
/// then drains the queue one transaction at a time until the gate flips
/// back to `Stop`.
pub async fn transmitter<T: Transport, const N: usize>(
    ctx: &SwitchContext<N>,
    transport: &mut T,
) -> ! {
    loop {
        while ctx.tx_gate.wait().await != TxGate::Run {}

        'running: loop {
            let gateway = match transport.gateway().await {
                Ok(addr) => addr,
                Err(err) => {
                    warn!("transmitter: no gateway address: {:?}", err);
                    // The link may still be settling; retry unless told
                    // to stop in the meantime.
                    match select(
                        ctx.tx_gate.wait(),
                        Timer::after(Duration::from_millis(GATEWAY_RETRY_MS)),
                    )
                    .await
                    {
                        Either::First(TxGate::Stop) => break 'running,
                        _ => continue 'running,
                    }
                }
            };
            info!("transmitter: up, gateway {}", gateway);

            loop {
                match select(ctx.tx_gate.wait(), ctx.queue.dequeue()).await {
                    Either::First(TxGate::Stop) => {
                        info!(
                            "transmitter: stopped, {} command(s) left queued",
                            ctx.queue.len()
                        );
                        break 'running;
                    }
                    Either::First(TxGate::Run) => {}
                    Either::Second(cmd) => transact(transport, gateway, cmd).await,
                }
            }
        }
    }
}

/// Perform exactly one connect - write - close transaction.
async fn transact<T: Transport>(transport: &mut T, gateway: SocketAddrV4, cmd: Command) {
    let record = cmd.encode();

    let mut conn = match transport.connect(gateway).await {
        Ok(conn) => conn,
        Err(err) => {
            warn!(
                "transmitter: connect to {} failed: {:?}, dropping {:?}",
                gateway, err, cmd
            );
            return;
        }
    };

    if let Err(err) = conn.write_all(&record).await {
        warn!("transmitter: send failed: {:?}", err);
    }

    // Close regardless of the write outcome.
    conn.close().await;
}
