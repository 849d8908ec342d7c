//! Client Characteristic Configuration Descriptor helpers.
//!
//! A CCCD holds a little-endian 16-bit flag field written by the peer:
//! bit 0 enables notifications, bit 1 enables indications.

/// Length of a CCCD value.
pub const CCCD_LEN: usize = 2;

const NOTIFY_BIT: u8 = 0x01;
const INDICATE_BIT: u8 = 0x02;

/// True if a CCCD write enables notifications.
#[inline]
#[must_use]
pub fn notifications_enabled(data: &[u8]) -> bool {
    matches!(data, [flags, _] if flags & NOTIFY_BIT != 0)
}

/// True if a CCCD write enables indications.
#[inline]
#[must_use]
pub fn indications_enabled(data: &[u8]) -> bool {
    matches!(data, [flags, _] if flags & INDICATE_BIT != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications() {
        assert!(notifications_enabled(&[0x01, 0x00]));
        assert!(notifications_enabled(&[0x03, 0x00]));
        assert!(!notifications_enabled(&[0x00, 0x00]));
        assert!(!notifications_enabled(&[0x02, 0x00]));
    }

    #[test]
    fn test_indications() {
        assert!(indications_enabled(&[0x02, 0x00]));
        assert!(!indications_enabled(&[0x01, 0x00]));
    }

    #[test]
    fn test_wrong_length_is_disabled() {
        assert!(!notifications_enabled(&[0x01]));
        assert!(!notifications_enabled(&[0x01, 0x00, 0x00]));
        assert!(!indications_enabled(&[]));
    }
}
