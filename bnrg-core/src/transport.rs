//! SPI transport framer for the BlueNRG-M0.
//!
//! Every bus transaction asserts chip-select, exchanges the 5-byte header
//! (see [`bnrg_proto::spi`]) and, if the device answered ready, moves the
//! payload in the same chip-select window. Chip-select is released at the
//! end of every attempt, whatever the outcome.
//!
//! The data-ready interrupt is masked through an [`InterruptGate`] for the
//! duration of each transaction so an edge cannot start a second exchange
//! on the bus mid-transfer.

use crate::config::{TransportConfig, DEFAULT_TRANSPORT_CONFIG};
use bnrg_proto::spi::{READ_FILLER, READ_HEADER, WRITE_HEADER};
use bnrg_proto::{DeviceHeader, TransportError};
use core::cmp::min;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

/// Millisecond time source.
pub trait Clock {
    /// Monotonic milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Masks the data-ready interrupt while the bus is in use.
pub trait InterruptGate {
    /// Mask the interrupt, returning whether it was enabled.
    fn disable(&mut self) -> bool;

    /// Restore the state returned by [`disable`](Self::disable).
    fn restore(&mut self, was_enabled: bool);
}

/// Gate for platforms that only poll the data-ready line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGate;

impl InterruptGate for NoGate {
    fn disable(&mut self) -> bool {
        false
    }

    fn restore(&mut self, _was_enabled: bool) {}
}

/// Byte-exchange protocol with the radio.
pub trait Transport {
    /// True while the radio holds the data-ready line asserted.
    fn data_available(&mut self) -> bool;

    /// Send one packet, retrying while the device is not ready.
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Read one packet into `buf`. Returns 0 if the device was not ready.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Pulse the reset line with chip-select released.
    fn hardware_reset(&mut self) -> Result<(), TransportError>;

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// [`Transport`] over an `embedded-hal` SPI bus and three GPIOs.
pub struct SpiTransport<SPI, CS, RST, IRQ, D, C, G = NoGate> {
    spi: SPI,
    cs: CS,
    reset: RST,
    data_ready: IRQ,
    delay: D,
    clock: C,
    gate: G,
    config: TransportConfig,
}

#[inline]
fn bus_error<E>(_: E) -> TransportError {
    TransportError::Bus
}

impl<SPI, CS, RST, IRQ, D, C, G> SpiTransport<SPI, CS, RST, IRQ, D, C, G>
where
    SPI: SpiBus,
    CS: OutputPin,
    RST: OutputPin,
    IRQ: InputPin,
    D: DelayNs,
    C: Clock,
    G: InterruptGate,
{
    /// Create a transport with the default timing.
    pub fn new(spi: SPI, cs: CS, reset: RST, data_ready: IRQ, delay: D, clock: C, gate: G) -> Self {
        Self::with_config(
            spi,
            cs,
            reset,
            data_ready,
            delay,
            clock,
            gate,
            DEFAULT_TRANSPORT_CONFIG,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_config(
        spi: SPI,
        cs: CS,
        reset: RST,
        data_ready: IRQ,
        delay: D,
        clock: C,
        gate: G,
        config: TransportConfig,
    ) -> Self {
        Self {
            spi,
            cs,
            reset,
            data_ready,
            delay,
            clock,
            gate,
            config,
        }
    }

    /// Get a mutable reference to the data-ready pin, e.g. to await an edge on it.
    pub fn data_ready_pin(&mut self) -> &mut IRQ {
        &mut self.data_ready
    }

    /// Get a reference to the SPI bus.
    pub fn bus(&self) -> &SPI {
        &self.spi
    }

    /// Decompose the transport into bus, chip-select, reset and data-ready.
    pub fn into_parts(self) -> (SPI, CS, RST, IRQ) {
        (self.spi, self.cs, self.reset, self.data_ready)
    }

    /// Run one chip-select window with the interrupt masked.
    fn transaction<R>(
        &mut self,
        f: impl FnOnce(&mut SPI) -> Result<R, TransportError>,
    ) -> Result<R, TransportError> {
        let was_enabled = self.gate.disable();
        let result = match self.cs.set_low() {
            Ok(()) => f(&mut self.spi)
                .and_then(|r| self.spi.flush().map(|()| r).map_err(bus_error)),
            Err(e) => Err(bus_error(e)),
        };
        let released = self.cs.set_high().map_err(bus_error);
        self.gate.restore(was_enabled);
        let value = result?;
        released?;
        Ok(value)
    }

    /// One send attempt. `Ok(false)` means the device was not ready.
    fn try_send(&mut self, payload: &[u8]) -> Result<bool, TransportError> {
        self.transaction(|spi| {
            let mut header = WRITE_HEADER;
            spi.transfer_in_place(&mut header).map_err(bus_error)?;
            match DeviceHeader::parse(&header) {
                DeviceHeader::NotReady => Ok(false),
                DeviceHeader::Ready { write_capacity, .. } => {
                    if payload.len() > write_capacity as usize {
                        return Err(TransportError::Capacity {
                            requested: payload.len(),
                            available: write_capacity,
                        });
                    }
                    spi.write(payload).map_err(bus_error)?;
                    Ok(true)
                }
            }
        })
    }
}

impl<SPI, CS, RST, IRQ, D, C, G> Transport for SpiTransport<SPI, CS, RST, IRQ, D, C, G>
where
    SPI: SpiBus,
    CS: OutputPin,
    RST: OutputPin,
    IRQ: InputPin,
    D: DelayNs,
    C: Clock,
    G: InterruptGate,
{
    fn data_available(&mut self) -> bool {
        self.data_ready.is_high().unwrap_or(false)
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let start = self.clock.now_ms();
        loop {
            if self.try_send(payload)? {
                return Ok(());
            }
            if self.clock.now_ms().saturating_sub(start) >= u64::from(self.config.send_timeout_ms) {
                warn!("spi send timed out, {} bytes", payload.len());
                return Err(TransportError::Timeout);
            }
        }
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.transaction(|spi| {
            let mut header = READ_HEADER;
            spi.transfer_in_place(&mut header).map_err(bus_error)?;
            let DeviceHeader::Ready { read_available, .. } = DeviceHeader::parse(&header) else {
                return Ok(0);
            };
            let len = min(read_available as usize, buf.len());
            for byte in &mut buf[..len] {
                let mut word = [READ_FILLER];
                spi.transfer_in_place(&mut word).map_err(bus_error)?;
                *byte = word[0];
            }
            Ok(len)
        })
    }

    fn hardware_reset(&mut self) -> Result<(), TransportError> {
        self.cs.set_high().map_err(bus_error)?;
        self.reset.set_low().map_err(bus_error)?;
        self.delay.delay_ms(self.config.reset_pulse_ms);
        self.reset.set_high().map_err(bus_error)?;
        self.delay.delay_ms(self.config.reset_pulse_ms);
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
