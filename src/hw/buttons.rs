//! GPIO button capture with async debouncing.
//!
//! The board buttons are active-high with an external pull-down. Each
//! button is handled by a task that waits for a GPIO edge, debounces
//! it, and invokes the capture callback (the default callback records
//! the press and raises the press signal).

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_time::{Duration, Timer};
use esp_hal::gpio::Input;
use log::info;

use crate::capture::{Capture, PressCallback};
use crate::command::ButtonId;
use crate::config::BUTTON_DEBOUNCE_MS;
use crate::error::Error;
use crate::switch::SwitchContext;

// Presses are discarded until `Capture::init` arms the button.
static ARMED: [AtomicBool; ButtonId::COUNT] = [AtomicBool::new(false), AtomicBool::new(false)];

/// Capture collaborator for the on-board buttons.
///
/// The GPIO tasks run for the life of the firmware; init/deinit only
/// arm and disarm delivery, which keeps `Capture` free of pin ownership.
pub struct GpioCapture;

impl Capture for GpioCapture {
    fn init(&self, button: ButtonId) -> Result<(), Error> {
        ARMED[button.index()].store(true, Ordering::Release);
        info!("capture: {:?} armed", button);
        Ok(())
    }

    fn deinit(&self, button: ButtonId) -> Result<(), Error> {
        ARMED[button.index()].store(false, Ordering::Release);
        info!("capture: {:?} disarmed", button);
        Ok(())
    }
}

/// Run one button's polling loop.
///
/// Waits for the rising edge, debounces, invokes the callback, then
/// waits for release before repeating.
#[embassy_executor::task(pool_size = 2)]
pub async fn capture_task(
    mut pin: Input<'static>,
    button: ButtonId,
    ctx: &'static SwitchContext,
    callback: PressCallback,
) {
    loop {
        pin.wait_for_rising_edge().await;

        // Debounce: wait and re-check.
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if pin.is_high() && ARMED[button.index()].load(Ordering::Acquire) {
            callback(ctx, button);
        }

        pin.wait_for_falling_edge().await;
    }
}
