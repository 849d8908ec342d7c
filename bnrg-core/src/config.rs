//! Timing and advertising configuration.
//!
//! Customize at compile time by creating your own const from the defaults:
//!
//! ```
//! use bnrg_core::{Config, DEFAULT_CONFIG};
//!
//! const SLOW_BOOT: Config = Config {
//!     settle_ms: 150,
//!     ..DEFAULT_CONFIG
//! };
//! assert_eq!(SLOW_BOOT.update_timeout_ms(), 10_000);
//! ```

use bnrg_proto::command::{ADDR_PUBLIC, ADV_IND, NO_WHITE_LIST_USE};

/// Transport framer timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportConfig {
    /// How long `send` keeps retrying a not-ready device.
    pub send_timeout_ms: u32,
    /// Width of the reset pulse and the wait after releasing it.
    pub reset_pulse_ms: u32,
}

/// Default transport timing of the BlueNRG-M0.
pub const DEFAULT_TRANSPORT_CONFIG: TransportConfig = TransportConfig {
    send_timeout_ms: 15,
    reset_pulse_ms: 5,
};

impl Default for TransportConfig {
    fn default() -> Self {
        DEFAULT_TRANSPORT_CONFIG
    }
}

/// Parameters of connectable advertising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingConfig {
    pub adv_type: u8,
    /// Minimum advertising interval (N x 0.625 ms).
    pub interval_min: u16,
    /// Maximum advertising interval (N x 0.625 ms).
    pub interval_max: u16,
    pub own_address_type: u8,
    pub filter_policy: u8,
    /// Preferred connection interval range (N x 1.25 ms), `None` to leave it to the central.
    pub conn_interval: Option<(u16, u16)>,
}

/// Connectable undirected advertising every 30 ms to 1 s from the public address.
pub const DEFAULT_ADVERTISING: AdvertisingConfig = AdvertisingConfig {
    adv_type: ADV_IND,
    interval_min: 0x0030,
    interval_max: 0x0640,
    own_address_type: ADDR_PUBLIC,
    filter_policy: NO_WHITE_LIST_USE,
    conn_interval: None,
};

/// Peripheral driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// How long to wait for the radio to answer a command.
    pub command_timeout_ms: u32,
    /// Update deadline as a multiple of `command_timeout_ms`.
    pub update_timeout_factor: u32,
    /// Wait after an HCI reset before the next command.
    pub settle_ms: u32,
    /// Length of the GAP device name characteristic.
    pub device_name_len: u8,
    pub advertising: AdvertisingConfig,
}

/// Default driver configuration.
pub const DEFAULT_CONFIG: Config = Config {
    command_timeout_ms: 1000,
    update_timeout_factor: 10,
    settle_ms: 100,
    device_name_len: 7,
    advertising: DEFAULT_ADVERTISING,
};

impl Config {
    /// Deadline of a flow-controlled characteristic update.
    #[inline]
    #[must_use]
    pub const fn update_timeout_ms(&self) -> u64 {
        self.command_timeout_ms as u64 * self.update_timeout_factor as u64
    }
}

impl Default for Config {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}
