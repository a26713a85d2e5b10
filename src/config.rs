//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, protocol constants and network settings live
//! here so they can be tuned in one place.

// Gateway protocol

/// TCP port the gateway listens on.
pub const GATEWAY_PORT: u16 = 3333;

/// Lowest level a `SetLevel` command may carry (percent).
pub const MIN_LEVEL: u8 = 20;

/// Highest level a `SetLevel` command may carry (percent).
pub const MAX_LEVEL: u8 = 100;

// Levels are percentages; reject out-of-range values at build time.
const _: () = assert!(MAX_LEVEL <= 100, "MAX_LEVEL must lie in [0, 100]");
const _: () = assert!(MIN_LEVEL <= MAX_LEVEL, "MIN_LEVEL must not exceed MAX_LEVEL");

// Command queue

/// Capacity of the pending-command queue between builder and transmitter.
pub const QUEUE_CAPACITY: usize = 10;

/// Maximum time the builder waits for queue space before dropping (ms).
pub const ENQUEUE_TIMEOUT_MS: u64 = 1000;

// Connectivity

/// Bound on any single access to the shared connection state (ms).
pub const STATE_ACCESS_BOUND_MS: u64 = 1000;

/// Depth of the link event channel fed by the driver callbacks.
pub const LINK_EVENT_DEPTH: usize = 4;

/// Sleep between connectivity polls while `start_transport` waits (ms).
pub const LINK_POLL_MS: u64 = 1000;

/// Number of connectivity polls before `start_transport` gives up.
pub const LINK_UP_RETRIES: u32 = 30;

/// Delay before the transmitter retries gateway resolution (ms).
pub const GATEWAY_RETRY_MS: u64 = 1000;

// Capture

/// Button debounce time (ms). Matches the board's mechanical switches.
pub const BUTTON_DEBOUNCE_MS: u64 = 800;

// WiFi station credentials (embedded builds only; replace for your network)

pub const WIFI_SSID: &str = "btn2net";
pub const WIFI_PASSWORD: &str = "change-me";
