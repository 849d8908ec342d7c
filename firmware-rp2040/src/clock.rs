//! Millisecond clock backed by the Embassy time driver.

use bnrg_core::Clock;
use embassy_time::Instant;

#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
