//! Wire formats for BlueNRG-M0 radio co-processors.
//!
//! The BlueNRG-M0 runs the whole Bluetooth Low Energy stack itself. The host
//! talks to it over a half-duplex SPI link plus one data-ready line, sending
//! HCI command packets and reading HCI event packets back. This crate holds
//! everything about those bytes and nothing about pins or timing:
//!
//! - [`spi`]: the 5-byte SPI header exchanged at the start of every bus
//!   transaction ([`DeviceHeader`], [`TransportError`])
//! - [`command`]: HCI/ACI command packets ([`Command`], [`Opcode`])
//! - [`event`]: HCI event envelope and the events the driver reacts to
//!   ([`EventPacket`], [`Event`])
//! - [`types`]: handles, status codes, characteristic properties and the
//!   advertised local name
//! - [`uuid`]: 16-bit and 128-bit UUIDs parsed from hex strings
//! - [`cccd`]: Client Characteristic Configuration Descriptor helpers
//!
//! # Example
//!
//! ```
//! use bnrg_proto::{Event, EventPacket};
//!
//! // Disconnection Complete, handle 0x0040, reason 0x13 (remote user terminated)
//! let raw = [0x04, 0x05, 0x04, 0x00, 0x40, 0x00, 0x13];
//! let packet = EventPacket::parse(&raw).unwrap();
//! match packet.decode() {
//!     Ok(Some(Event::DisconnectionComplete { connection, reason, .. })) => {
//!         assert_eq!(connection.0, 0x0040);
//!         assert_eq!(reason, 0x13);
//!     }
//!     _ => unreachable!(),
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod cccd;
pub mod command;
pub mod event;
pub mod spi;
pub mod types;
pub mod uuid;

pub use command::{
    CharacteristicParams, Command, DiscoverableParams, EncodeError, Opcode, UpdateParams,
    MAX_COMMAND_LEN, MAX_PARAMS_LEN,
};
pub use event::{decode, DecodeError, Event, EventPacket, READ_PACKET_SIZE};
pub use spi::{DeviceHeader, TransportError, HEADER_LEN};
pub use types::{
    AdvertisedName, AttributeHandle, BdAddr, CharProperties, ConnectionHandle, GattEventMask,
    Status, UpdateType,
};
pub use uuid::{Uuid, UuidError};
