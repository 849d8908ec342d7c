//! SPI header exchanged at the start of every bus transaction.
//!
//! With chip-select asserted the host clocks out five bytes and reads five
//! bytes back in the same transfer:
//!
//! ```text
//! host   -> device: [op, 0, 0, 0, 0]          op = 0x0A write, 0x0B read
//! device -> host:   [ready, wcap, _, rlo, rhi]
//! ```
//!
//! `ready` must be [`READY`] for the rest of the reply to mean anything.
//! `wcap` is how many payload bytes the device accepts right now and
//! `rlo`/`rhi` is the little-endian count of bytes it has waiting for the host.

/// Size of the SPI header in both directions.
pub const HEADER_LEN: usize = 5;

/// Readiness sentinel in byte 0 of the device reply.
pub const READY: u8 = 0x02;

/// Operation tag for a host-to-device transfer.
pub const OP_WRITE: u8 = 0x0A;

/// Operation tag for a device-to-host transfer.
pub const OP_READ: u8 = 0x0B;

/// Header the host sends before writing a packet.
pub const WRITE_HEADER: [u8; HEADER_LEN] = [OP_WRITE, 0x00, 0x00, 0x00, 0x00];

/// Header the host sends before reading a packet.
pub const READ_HEADER: [u8; HEADER_LEN] = [OP_READ, 0x00, 0x00, 0x00, 0x00];

/// Filler byte clocked out while reading payload bytes.
pub const READ_FILLER: u8 = 0xFF;

/// Decoded device side of a header exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceHeader {
    /// Device is busy (sleeping, still booting, or mid-operation). Try again.
    NotReady,
    /// Device is ready for the requested transfer.
    Ready {
        /// Payload bytes the device can accept in this transaction.
        write_capacity: u8,
        /// Payload bytes the device has queued for the host.
        read_available: u16,
    },
}

impl DeviceHeader {
    /// Decode the bytes the device returned during a header exchange.
    #[must_use]
    pub fn parse(reply: &[u8; HEADER_LEN]) -> Self {
        if reply[0] != READY {
            return DeviceHeader::NotReady;
        }
        DeviceHeader::Ready {
            write_capacity: reply[1],
            read_available: u16::from_le_bytes([reply[3], reply[4]]),
        }
    }

    /// True if the device answered with the ready sentinel.
    #[inline]
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, DeviceHeader::Ready { .. })
    }
}

/// Error type for SPI transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Device stayed not-ready until the send deadline passed.
    Timeout,
    /// Payload is larger than the capacity the device reported. Nothing was written.
    Capacity {
        /// Bytes the host tried to send.
        requested: usize,
        /// Bytes the device said it could take.
        available: u8,
    },
    /// SPI bus or GPIO error.
    Bus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_not_ready() {
        assert_eq!(
            DeviceHeader::parse(&[0x00, 0xFF, 0x00, 0x10, 0x00]),
            DeviceHeader::NotReady
        );
        assert_eq!(
            DeviceHeader::parse(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
            DeviceHeader::NotReady
        );
    }

    #[test]
    fn test_parse_write_capacity() {
        let header = DeviceHeader::parse(&[READY, 0x80, 0x00, 0x00, 0x00]);
        assert_eq!(
            header,
            DeviceHeader::Ready {
                write_capacity: 0x80,
                read_available: 0,
            }
        );
    }

    #[test]
    fn test_parse_read_available_little_endian() {
        let header = DeviceHeader::parse(&[READY, 0x00, 0x00, 0x2C, 0x01]);
        assert_eq!(
            header,
            DeviceHeader::Ready {
                write_capacity: 0,
                read_available: 0x012C,
            }
        );
        assert!(header.is_ready());
    }

    #[test]
    fn test_host_headers() {
        assert_eq!(WRITE_HEADER[0], 0x0A);
        assert_eq!(READ_HEADER[0], 0x0B);
        assert!(WRITE_HEADER[1..].iter().all(|&b| b == 0));
        assert!(READ_HEADER[1..].iter().all(|&b| b == 0));
    }
}
