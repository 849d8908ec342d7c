//! Handles, status codes, characteristic flags and the advertised name.

use core::ops::{BitOr, BitOrAssign};

/// Connection handle assigned by the radio when a link forms.
///
/// Handles are 12 bits on the wire; the upper bits of the field are masked off
/// when decoding events. Zero is reserved by this driver for "no connection".
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionHandle(pub u16);

impl ConnectionHandle {
    /// Mask applied to the 16-bit handle field of HCI events.
    pub const MASK: u16 = 0x0FFF;

    /// True for the reserved "no connection" value.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// GATT attribute handle.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttributeHandle(pub u16);

/// Bluetooth device address in wire order (least significant byte first).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BdAddr(pub [u8; 6]);

impl BdAddr {
    /// Build an address from the human-readable order (`AA:BB:..` is `[0xAA, 0xBB, ..]`).
    #[must_use]
    pub fn from_msb_first(bytes: [u8; 6]) -> Self {
        let mut wire = bytes;
        wire.reverse();
        Self(wire)
    }
}

/// Status byte returned by the radio for every command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(pub u8);

impl Status {
    pub const SUCCESS: Self = Self(0x00);
    pub const UNKNOWN_COMMAND: Self = Self(0x01);
    pub const FAILED: Self = Self(0x41);
    pub const INVALID_PARAMS: Self = Self(0x42);
    pub const NOT_ALLOWED: Self = Self(0x46);
    pub const ERROR: Self = Self(0x47);
    /// The radio's output buffers are full. Retry after it frees some.
    pub const INSUFFICIENT_RESOURCES: Self = Self(0x64);
    pub const TIMEOUT: Self = Self(0xFF);

    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// True for the distinguished "output buffer full" status.
    #[inline]
    #[must_use]
    pub const fn is_buffer_full(self) -> bool {
        self.0 == Self::INSUFFICIENT_RESOURCES.0
    }
}

/// Characteristic properties as declared to the GATT server.
///
/// # Example
///
/// ```
/// use bnrg_proto::CharProperties;
///
/// let props = CharProperties::READ | CharProperties::NOTIFY;
/// assert!(props.contains(CharProperties::NOTIFY));
/// assert!(!props.contains(CharProperties::INDICATE));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharProperties(pub u8);

impl CharProperties {
    pub const NONE: Self = Self(0x00);
    pub const BROADCAST: Self = Self(0x01);
    pub const READ: Self = Self(0x02);
    pub const WRITE_WITHOUT_RESP: Self = Self(0x04);
    pub const WRITE: Self = Self(0x08);
    pub const NOTIFY: Self = Self(0x10);
    pub const INDICATE: Self = Self(0x20);
    pub const SIGNED_WRITE: Self = Self(0x40);
    pub const EXTENDED: Self = Self(0x80);

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl BitOr for CharProperties {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CharProperties {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// How a characteristic value update is propagated to the connected peer.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UpdateType(pub u8);

impl UpdateType {
    /// Only update the local database.
    pub const LOCAL: Self = Self(0x00);
    pub const NOTIFICATION: Self = Self(0x01);
    pub const INDICATION: Self = Self(0x02);

    /// Derive the update flags from the declared characteristic properties.
    #[must_use]
    pub const fn for_properties(props: CharProperties) -> Self {
        let mut flags = Self::LOCAL.0;
        if props.contains(CharProperties::NOTIFY) {
            flags |= Self::NOTIFICATION.0;
        }
        if props.contains(CharProperties::INDICATE) {
            flags |= Self::INDICATION.0;
        }
        Self(flags)
    }
}

impl BitOr for UpdateType {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Which GATT events the radio reports for a characteristic.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GattEventMask(pub u8);

impl GattEventMask {
    pub const NONE: Self = Self(0x00);
    /// Report attribute writes with an Attribute Modified event.
    pub const ATTRIBUTE_WRITE: Self = Self(0x01);
    /// Ask the host to permit each write request.
    pub const WRITE_REQ_AND_WAIT: Self = Self(0x02);
    /// Ask the host to permit each read request.
    pub const READ_REQ_AND_WAIT: Self = Self(0x04);
}

impl BitOr for GattEventMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// AD type tag for the complete local name.
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// Longest name that fits the advertising payload.
pub const MAX_LOCAL_NAME_LEN: usize = 20;

/// Name advertised until the application sets its own.
pub const DEFAULT_LOCAL_NAME: &[u8] = b"BNRGM0";

/// Advertised local name: AD type tag followed by up to 20 name bytes.
///
/// Longer names are truncated.
///
/// # Example
///
/// ```
/// use bnrg_proto::AdvertisedName;
///
/// let name = AdvertisedName::new(b"Sensor");
/// assert_eq!(name.as_bytes(), b"\x09Sensor");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisedName {
    data: [u8; MAX_LOCAL_NAME_LEN + 1],
    len: u8,
}

impl AdvertisedName {
    #[must_use]
    pub const fn new(name: &[u8]) -> Self {
        let name_len = if name.len() > MAX_LOCAL_NAME_LEN {
            MAX_LOCAL_NAME_LEN
        } else {
            name.len()
        };
        let mut data = [0u8; MAX_LOCAL_NAME_LEN + 1];
        data[0] = AD_TYPE_COMPLETE_LOCAL_NAME;
        let mut i = 0;
        while i < name_len {
            data[i + 1] = name[i];
            i += 1;
        }
        Self {
            data,
            len: (name_len + 1) as u8,
        }
    }

    /// Full advertising payload including the AD type tag.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Name bytes without the tag.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &[u8] {
        &self.data[1..self.len as usize]
    }
}

impl Default for AdvertisedName {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_NAME)
    }
}
