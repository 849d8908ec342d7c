//! Masks GPIO interrupts while the SPI bus is in use.

use bnrg_core::InterruptGate;
use embassy_rp::interrupt::{self, InterruptExt};

/// Masks `IO_IRQ_BANK0` for the duration of each bus exchange.
///
/// The data-ready waker lives on that interrupt; an edge raised mid-exchange
/// stays pending in the NVIC and fires once the mask is restored.
#[derive(Debug, Default)]
pub struct NvicGate;

impl InterruptGate for NvicGate {
    fn disable(&mut self) -> bool {
        let was_enabled = interrupt::IO_IRQ_BANK0.is_enabled();
        interrupt::IO_IRQ_BANK0.disable();
        was_enabled
    }

    fn restore(&mut self, was_enabled: bool) {
        if was_enabled {
            // SAFETY: only re-enables an interrupt Embassy had enabled itself.
            unsafe { interrupt::IO_IRQ_BANK0.enable() };
        }
    }
}
