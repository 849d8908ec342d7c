//! Driver error type.

use bnrg_proto::{DecodeError, EncodeError, Status, TransportError, UuidError};

/// Error type for peripheral operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// SPI framing failed.
    Transport(TransportError),
    /// The radio answered a command with a non-success status.
    CommandRejected(Status),
    /// No Command Complete or Command Status arrived in time.
    CommandTimeout,
    /// The radio kept its output buffers full past the update deadline.
    UpdateTimeout,
    /// Malformed UUID, unknown connection or exhausted attribute handle space.
    InvalidIdentifier,
    /// Value or parameter block longer than allowed.
    InvalidLength,
    /// Response packet could not be decoded.
    Decode(DecodeError),
}

impl Error {
    /// True for the "output buffer full" rejection that callers may retry.
    #[inline]
    #[must_use]
    pub fn is_buffer_full(&self) -> bool {
        matches!(self, Error::CommandRejected(status) if status.is_buffer_full())
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Overflow => Error::InvalidLength,
        }
    }
}

impl From<UuidError> for Error {
    fn from(_: UuidError) -> Self {
        Error::InvalidIdentifier
    }
}
