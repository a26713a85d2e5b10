//! Command builder worker.
//!
//! Wakes on the press signal, maps the press to a command through the
//! configured button roles, and hands it to the queue. Enqueue
//! failures are logged, never propagated; the press is simply lost
//! (at-most-once, like everything downstream).
//!
//! The worker runs for the life of the module and exits only through
//! the context's `builder_stop` signal during de-initialization.

use embassy_futures::select::{select, Either};
use embassy_time::Duration;
use log::{info, warn};

use crate::command::ButtonRoles;
use crate::config::ENQUEUE_TIMEOUT_MS;
use crate::switch::SwitchContext;

/// Command builder worker loop.
pub async fn command_builder<const N: usize>(ctx: &SwitchContext<N>, roles: ButtonRoles) {
    let timeout = Duration::from_millis(ENQUEUE_TIMEOUT_MS);

    loop {
        let press = match select(ctx.builder_stop.wait(), ctx.press.wait()).await {
            Either::First(()) => {
                info!("builder: stopped");
                return;
            }
            Either::Second(press) => press,
        };

        let Some(cmd) = roles.command_for(press.button, press.ordinal) else {
            // A button no role claims; deliberately produces nothing.
            warn!("builder: unmapped press of {:?}", press.button);
            continue;
        };

        if let Err(err) = ctx.submit(cmd, timeout).await {
            warn!("builder: dropped {:?}: {:?}", cmd, err);
        }
    }
}
