//! Command/response interface to the radio.

use crate::error::Error;
use bnrg_proto::Command;

/// Request/response access to the radio co-processor.
///
/// The peripheral driver only talks to the radio through this trait, so it
/// can run against [`HciLink`](crate::HciLink) on hardware or a scripted
/// radio in tests.
pub trait Radio {
    /// Pulse the reset line.
    fn hardware_reset(&mut self) -> Result<(), Error>;

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// True if an event is waiting to be read.
    fn data_available(&mut self) -> bool;

    /// Read the next event packet into `buf`. Returns 0 if nothing was read.
    fn read_event(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Issue `cmd` and wait for its completion.
    ///
    /// Return parameters following the status byte are copied into `ret`;
    /// the copied length is returned. A non-success status is
    /// [`Error::CommandRejected`].
    fn command(&mut self, cmd: &Command, ret: &mut [u8]) -> Result<usize, Error>;
}
