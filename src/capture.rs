//! Capture subsystem boundary.
//!
//! GPIO configuration and debounce timing belong to the platform; the
//! core only needs to initialize/release a button and receive presses
//! through a callback. The callback is a replaceable extension point:
//! board integrators may substitute their own as long as it stays O(1),
//! non-blocking and non-allocating (it runs in interrupt context).

use crate::command::ButtonId;
use crate::error::Error;
use crate::switch::SwitchContext;

/// Platform capture collaborator: owns GPIO setup and debouncing for
/// the board buttons.
pub trait Capture {
    /// Prepare the given button to deliver presses.
    fn init(&self, button: ButtonId) -> Result<(), Error>;

    /// Release the button's capture resources.
    fn deinit(&self, button: ButtonId) -> Result<(), Error>;
}

/// Capture callback invoked on a debounced press.
///
/// Must be safe in interrupt context.
pub type PressCallback = fn(&SwitchContext, ButtonId);

/// Default capture callback: record the press ordinal and raise the
/// saturating press signal. This is all a callback is allowed to do.
pub fn default_callback(ctx: &SwitchContext, button: ButtonId) {
    ctx.record_press(button);
}
