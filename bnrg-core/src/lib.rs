//! Platform-agnostic BlueNRG-M0 peripheral driver.
//!
//! This crate drives a BlueNRG-M0 network co-processor from any host that
//! implements the `embedded-hal` 1.0 blocking traits. It has no platform
//! dependencies and runs both in `no_std` firmware and on host for testing.
//!
//! # Overview
//!
//! The driver is layered bottom-up:
//!
//! - [`transport`]: SPI framing with the 5-byte header handshake
//!   ([`SpiTransport`], [`Transport`])
//! - [`hci`]: command/response matching on top of a transport ([`HciLink`])
//! - [`radio`]: the command-level seam the driver is written against ([`Radio`])
//! - [`demux`]: turns event packets into state changes and callbacks
//! - [`connection`]: connection, advertising and MTU state ([`ConnectionState`])
//! - [`peripheral`]: bring-up, GATT registration and flow-controlled updates
//!   ([`Peripheral`])
//!
//! # Example
//!
//! ```ignore
//! use bnrg_core::{CharacteristicSpec, HciLink, Peripheral, SpiTransport};
//! use bnrg_proto::{CharProperties, Uuid};
//!
//! let transport = SpiTransport::new(spi, cs, reset, irq, delay, &clock, NoGate);
//! let mut ble = Peripheral::new(HciLink::new(transport, &clock), app, &clock);
//!
//! ble.init(None)?;
//! ble.stack_init()?;
//! let service = ble.add_service(&Uuid::parse("180D")?, 1)?;
//! let hr = ble.add_characteristic(
//!     &service,
//!     &CharacteristicSpec::new(Uuid::Uuid16(0x2A37), 2, CharProperties::NOTIFY),
//! )?;
//! ble.set_connectable_mode(true);
//!
//! loop {
//!     ble.process()?;
//!     if ble.is_connected() {
//!         ble.update_char_value(ble.conn_handle(), &hr, &[0x00, 72])?;
//!     }
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt (for embedded logging)
//! - **`log`**: Log through the `log` facade (for hosted builds)

#![cfg_attr(not(feature = "std"), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod connection;
pub mod demux;
pub mod error;
pub mod gatt;
pub mod handler;
pub mod hci;
pub mod peripheral;
pub mod radio;
pub mod transport;

#[cfg(test)]
mod mock;

pub use bnrg_proto;

// Re-export main types at crate root
pub use config::{
    AdvertisingConfig, Config, TransportConfig, DEFAULT_ADVERTISING, DEFAULT_CONFIG,
    DEFAULT_TRANSPORT_CONFIG,
};
pub use connection::{ConnectionState, Discoverability, MtuExchange, PollAction};
pub use error::Error;
pub use gatt::{Characteristic, CharacteristicSpec, Service};
pub use handler::EventHandler;
pub use hci::HciLink;
pub use peripheral::Peripheral;
pub use radio::Radio;
pub use transport::{Clock, InterruptGate, NoGate, SpiTransport, Transport};
