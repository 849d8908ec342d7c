//! 16-bit and 128-bit UUIDs.

/// UUID type code for a 16-bit UUID in GATT commands.
pub const UUID_TYPE_16: u8 = 0x01;

/// UUID type code for a 128-bit UUID in GATT commands.
pub const UUID_TYPE_128: u8 = 0x02;

/// Service or characteristic UUID.
///
/// 128-bit UUIDs are stored in wire order (least significant byte first).
///
/// # Example
///
/// ```
/// use bnrg_proto::Uuid;
///
/// assert_eq!(Uuid::parse("180D"), Ok(Uuid::Uuid16(0x180D)));
///
/// let uuid = Uuid::parse("6E400001B5A3F393E0A9E50E24DCCA9E").unwrap();
/// assert_eq!(uuid.wire_bytes()[0], 0x9E);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Uuid {
    Uuid16(u16),
    Uuid128([u8; 16]),
}

/// Error returned for a malformed UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UuidError {
    /// Neither 4 nor 32 hex digits.
    Length,
    /// A character outside `0-9a-fA-F`.
    Digit,
}

impl Uuid {
    /// Parse 4 hex digits (16-bit) or 32 hex digits (128-bit), most significant first.
    pub fn parse(s: &str) -> Result<Self, UuidError> {
        let digits = s.as_bytes();
        match digits.len() {
            4 => {
                let hi = hex_byte(digits[0], digits[1])?;
                let lo = hex_byte(digits[2], digits[3])?;
                Ok(Uuid::Uuid16(u16::from_be_bytes([hi, lo])))
            }
            32 => {
                let mut bytes = [0u8; 16];
                for (i, pair) in digits.chunks_exact(2).enumerate() {
                    bytes[15 - i] = hex_byte(pair[0], pair[1])?;
                }
                Ok(Uuid::Uuid128(bytes))
            }
            _ => Err(UuidError::Length),
        }
    }

    /// Type code used by GATT add-service and add-characteristic commands.
    #[inline]
    #[must_use]
    pub const fn type_code(&self) -> u8 {
        match self {
            Uuid::Uuid16(_) => UUID_TYPE_16,
            Uuid::Uuid128(_) => UUID_TYPE_128,
        }
    }

    /// UUID bytes as they appear on the wire.
    #[must_use]
    pub fn wire_bytes(&self) -> WireBytes {
        match self {
            Uuid::Uuid16(v) => {
                let mut data = [0u8; 16];
                data[..2].copy_from_slice(&v.to_le_bytes());
                WireBytes { data, len: 2 }
            }
            Uuid::Uuid128(bytes) => WireBytes {
                data: *bytes,
                len: 16,
            },
        }
    }
}

/// Little-endian UUID bytes, 2 or 16 long.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WireBytes {
    data: [u8; 16],
    len: usize,
}

impl core::ops::Deref for WireBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

fn hex_byte(hi: u8, lo: u8) -> Result<u8, UuidError> {
    Ok((hex_digit(hi)? << 4) | hex_digit(lo)?)
}

fn hex_digit(c: u8) -> Result<u8, UuidError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(UuidError::Digit),
    }
}
