//! ESP32 platform layer: GPIO capture, WiFi link driver, TCP transport.
//!
//! Everything in here is behind the `embedded` feature; the core never
//! touches hardware directly.

pub mod buttons;
pub mod net;
