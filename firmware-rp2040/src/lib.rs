//! BlueNRG-M0 BLE peripheral for RP2040.
//!
//! Board glue between Embassy and the platform-agnostic [`bnrg_core`] driver,
//! plus the demo application's event handler.
//!
//! # Hardware Configuration
//!
//! | Function  | GPIO | Description |
//! |-----------|------|-------------|
//! | SPI0 MISO | 16   | Radio to host |
//! | SPI0 CS   | 17   | Chip select (active low) |
//! | SPI0 SCK  | 18   | Bus clock, 1 MHz, mode 0 |
//! | SPI0 MOSI | 19   | Host to radio |
//! | RESET     | 20   | Radio reset (active low) |
//! | IRQ       | 21   | Data-ready line (active high) |
//! | LED       | 25   | On-board LED (connection indicator) |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with two tasks:
//!
//! - **Radio Task**: Owns the [`Peripheral`](bnrg_core::Peripheral), drains
//!   events when the data-ready line rises and advances the connection state
//!   machine on every tick
//! - **Sample Task**: Produces the value pushed to the peer
//!
//! Samples travel through an Embassy [`Signal`](embassy_sync::signal::Signal)
//! with "latest value wins" semantics.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

pub mod app;
pub mod clock;
pub mod gate;

pub use app::AppEvents;
pub use clock::EmbassyClock;
pub use gate::NvicGate;
