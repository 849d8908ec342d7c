//! HCI command packets and the ACI commands used by the peripheral driver.
//!
//! Packet layout on the wire:
//!
//! ```text
//! [0x01, opcode_lo, opcode_hi, param_len, params...]
//! ```
//!
//! Parameter layouts follow the BlueNRG-MS (IDB05A1) ACI. Builders never
//! truncate: parameters that do not fit yield [`EncodeError::Overflow`].

use crate::event::{le_u16, DecodeError};
use crate::types::{
    AttributeHandle, BdAddr, CharProperties, ConnectionHandle, GattEventMask, UpdateType,
};
use crate::uuid::Uuid;
use core::fmt;

/// HCI packet indicator for commands.
pub const PACKET_TYPE_COMMAND: u8 = 0x01;

/// Packet indicator, opcode and parameter length.
pub const COMMAND_HEADER_LEN: usize = 4;

/// Largest parameter block the radio accepts.
pub const MAX_PARAMS_LEN: usize = 128;

/// Largest encoded command packet.
pub const MAX_COMMAND_LEN: usize = COMMAND_HEADER_LEN + MAX_PARAMS_LEN;

/// Largest scan response payload.
pub const MAX_SCAN_RESPONSE_LEN: usize = 31;

pub const SERVICE_PRIMARY: u8 = 0x01;
pub const SERVICE_SECONDARY: u8 = 0x02;
pub const ATTR_PERMISSION_NONE: u8 = 0x00;
pub const GAP_PERIPHERAL_ROLE: u8 = 0x01;
pub const DEFAULT_ENCRYPTION_KEY_SIZE: u8 = 16;
pub const CONFIG_DATA_PUBADDR_OFFSET: u8 = 0x00;
pub const CONFIG_DATA_PUBADDR_LEN: u8 = 6;

/// Connectable undirected advertising.
pub const ADV_IND: u8 = 0x00;
pub const ADV_SCAN_IND: u8 = 0x02;
pub const ADV_NONCONN_IND: u8 = 0x03;
pub const ADDR_PUBLIC: u8 = 0x00;
pub const ADDR_RANDOM: u8 = 0x01;
pub const NO_WHITE_LIST_USE: u8 = 0x00;

/// 16-bit HCI opcode: 6-bit group (OGF) and 10-bit command (OCF).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Opcode(pub u16);

impl Opcode {
    #[must_use]
    pub const fn new(ogf: u16, ocf: u16) -> Self {
        Self((ogf << 10) | (ocf & 0x03FF))
    }

    #[must_use]
    pub const fn ogf(self) -> u16 {
        self.0 >> 10
    }

    #[must_use]
    pub const fn ocf(self) -> u16 {
        self.0 & 0x03FF
    }
}

/// Opcodes of the commands this driver issues.
pub mod opcode {
    use super::Opcode;

    const OGF_HOST_CTL: u16 = 0x03;
    const OGF_LE_CTL: u16 = 0x08;
    const OGF_VENDOR: u16 = 0x3F;

    pub const HCI_RESET: Opcode = Opcode::new(OGF_HOST_CTL, 0x003);
    pub const LE_SET_SCAN_RESPONSE_DATA: Opcode = Opcode::new(OGF_LE_CTL, 0x009);
    pub const LE_RAND: Opcode = Opcode::new(OGF_LE_CTL, 0x018);
    pub const HAL_WRITE_CONFIG_DATA: Opcode = Opcode::new(OGF_VENDOR, 0x00C);
    pub const HAL_SET_TX_POWER_LEVEL: Opcode = Opcode::new(OGF_VENDOR, 0x00F);
    pub const GAP_SET_NON_DISCOVERABLE: Opcode = Opcode::new(OGF_VENDOR, 0x081);
    pub const GAP_SET_DISCOVERABLE: Opcode = Opcode::new(OGF_VENDOR, 0x083);
    pub const GAP_INIT: Opcode = Opcode::new(OGF_VENDOR, 0x08A);
    pub const GATT_INIT: Opcode = Opcode::new(OGF_VENDOR, 0x101);
    pub const GATT_ADD_SERVICE: Opcode = Opcode::new(OGF_VENDOR, 0x102);
    pub const GATT_ADD_CHARACTERISTIC: Opcode = Opcode::new(OGF_VENDOR, 0x104);
    pub const GATT_EXCHANGE_CONFIGURATION: Opcode = Opcode::new(OGF_VENDOR, 0x10B);
    pub const GATT_UPDATE_CHAR_VALUE_EXT: Opcode = Opcode::new(OGF_VENDOR, 0x12C);
}

/// Error type for command encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Parameters or output buffer too small.
    Overflow,
}

/// Parameters for GAP Set Discoverable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoverableParams<'a> {
    pub adv_type: u8,
    /// Minimum advertising interval (N x 0.625 ms).
    pub interval_min: u16,
    /// Maximum advertising interval (N x 0.625 ms).
    pub interval_max: u16,
    pub own_address_type: u8,
    pub filter_policy: u8,
    /// AD structure carrying the name, tag included.
    pub local_name: &'a [u8],
    /// AD structure listing service UUIDs, may be empty.
    pub service_uuids: &'a [u8],
    /// Preferred connection interval range (N x 1.25 ms), zero for none.
    pub conn_interval_min: u16,
    pub conn_interval_max: u16,
}

/// Parameters for GATT Add Characteristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacteristicParams<'a> {
    pub service: AttributeHandle,
    pub uuid: &'a Uuid,
    pub max_value_len: u8,
    pub properties: CharProperties,
    pub permissions: u8,
    pub event_mask: GattEventMask,
    pub encryption_key_size: u8,
    pub variable_len: bool,
}

/// Parameters for GATT Update Characteristic Value (extended).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateParams<'a> {
    pub service: AttributeHandle,
    /// Characteristic declaration handle.
    pub characteristic: AttributeHandle,
    pub update_type: UpdateType,
    /// Total length of the characteristic value after the update.
    pub total_len: u16,
    pub offset: u16,
    pub value: &'a [u8],
}

/// An encoded HCI command ready to be framed and sent.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Command {
    opcode: Opcode,
    len: u8,
    params: [u8; MAX_PARAMS_LEN],
}

impl Command {
    /// Command without parameters.
    #[must_use]
    pub const fn bare(opcode: Opcode) -> Self {
        Self {
            opcode,
            len: 0,
            params: [0; MAX_PARAMS_LEN],
        }
    }

    /// Command with an arbitrary parameter block.
    pub fn new(opcode: Opcode, params: &[u8]) -> Result<Self, EncodeError> {
        let mut cmd = Self::bare(opcode);
        cmd.put(params)?;
        Ok(cmd)
    }

    fn fixed<const L: usize>(opcode: Opcode, params: [u8; L]) -> Self {
        const { assert!(L <= MAX_PARAMS_LEN) };
        let mut cmd = Self::bare(opcode);
        cmd.params[..L].copy_from_slice(&params);
        cmd.len = L as u8;
        cmd
    }

    fn put(&mut self, bytes: &[u8]) -> Result<&mut Self, EncodeError> {
        let start = self.len as usize;
        let end = start + bytes.len();
        if end > MAX_PARAMS_LEN {
            return Err(EncodeError::Overflow);
        }
        self.params[start..end].copy_from_slice(bytes);
        self.len = end as u8;
        Ok(self)
    }

    fn put_u8(&mut self, value: u8) -> Result<&mut Self, EncodeError> {
        self.put(&[value])
    }

    fn put_u16(&mut self, value: u16) -> Result<&mut Self, EncodeError> {
        self.put(&value.to_le_bytes())
    }

    #[inline]
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &[u8] {
        &self.params[..self.len as usize]
    }

    /// Size of the encoded packet.
    #[inline]
    #[must_use]
    pub fn packet_len(&self) -> usize {
        COMMAND_HEADER_LEN + self.len as usize
    }

    /// Write the full packet into `out`, returning its length.
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, EncodeError> {
        let len = self.packet_len();
        let out = out.get_mut(..len).ok_or(EncodeError::Overflow)?;
        let [lo, hi] = self.opcode.0.to_le_bytes();
        out[..COMMAND_HEADER_LEN].copy_from_slice(&[PACKET_TYPE_COMMAND, lo, hi, self.len]);
        out[COMMAND_HEADER_LEN..].copy_from_slice(self.params());
        Ok(len)
    }

    // --- Command constructors ---

    #[must_use]
    pub const fn reset() -> Self {
        Self::bare(opcode::HCI_RESET)
    }

    #[must_use]
    pub const fn le_rand() -> Self {
        Self::bare(opcode::LE_RAND)
    }

    /// Scan response data, zero padded to 31 bytes.
    pub fn set_scan_response_data(data: &[u8]) -> Result<Self, EncodeError> {
        if data.len() > MAX_SCAN_RESPONSE_LEN {
            return Err(EncodeError::Overflow);
        }
        let mut padded = [0u8; MAX_SCAN_RESPONSE_LEN];
        padded[..data.len()].copy_from_slice(data);
        let mut cmd = Self::bare(opcode::LE_SET_SCAN_RESPONSE_DATA);
        cmd.put_u8(data.len() as u8)?.put(&padded)?;
        Ok(cmd)
    }

    pub fn write_config_data(offset: u8, data: &[u8]) -> Result<Self, EncodeError> {
        let len = u8::try_from(data.len()).map_err(|_| EncodeError::Overflow)?;
        let mut cmd = Self::bare(opcode::HAL_WRITE_CONFIG_DATA);
        cmd.put_u8(offset)?.put_u8(len)?.put(data)?;
        Ok(cmd)
    }

    #[must_use]
    pub fn write_public_address(addr: &BdAddr) -> Self {
        let a = addr.0;
        Self::fixed(
            opcode::HAL_WRITE_CONFIG_DATA,
            [
                CONFIG_DATA_PUBADDR_OFFSET,
                CONFIG_DATA_PUBADDR_LEN,
                a[0],
                a[1],
                a[2],
                a[3],
                a[4],
                a[5],
            ],
        )
    }

    #[must_use]
    pub fn set_tx_power_level(high_power: bool, pa_level: u8) -> Self {
        Self::fixed(
            opcode::HAL_SET_TX_POWER_LEVEL,
            [u8::from(high_power), pa_level],
        )
    }

    #[must_use]
    pub const fn gatt_init() -> Self {
        Self::bare(opcode::GATT_INIT)
    }

    #[must_use]
    pub fn gap_init(role: u8, privacy: bool, device_name_len: u8) -> Self {
        Self::fixed(
            opcode::GAP_INIT,
            [role, u8::from(privacy), device_name_len],
        )
    }

    pub fn add_service(
        uuid: &Uuid,
        service_type: u8,
        max_attribute_records: u8,
    ) -> Result<Self, EncodeError> {
        let mut cmd = Self::bare(opcode::GATT_ADD_SERVICE);
        cmd.put_u8(uuid.type_code())?
            .put(&uuid.wire_bytes())?
            .put_u8(service_type)?
            .put_u8(max_attribute_records)?;
        Ok(cmd)
    }

    pub fn add_characteristic(params: &CharacteristicParams<'_>) -> Result<Self, EncodeError> {
        let mut cmd = Self::bare(opcode::GATT_ADD_CHARACTERISTIC);
        cmd.put_u16(params.service.0)?
            .put_u8(params.uuid.type_code())?
            .put(&params.uuid.wire_bytes())?
            .put_u8(params.max_value_len)?
            .put_u8(params.properties.raw())?
            .put_u8(params.permissions)?
            .put_u8(params.event_mask.0)?
            .put_u8(params.encryption_key_size)?
            .put_u8(u8::from(params.variable_len))?;
        Ok(cmd)
    }

    pub fn update_char_value(params: &UpdateParams<'_>) -> Result<Self, EncodeError> {
        let value_len = u8::try_from(params.value.len()).map_err(|_| EncodeError::Overflow)?;
        let mut cmd = Self::bare(opcode::GATT_UPDATE_CHAR_VALUE_EXT);
        cmd.put_u16(params.service.0)?
            .put_u16(params.characteristic.0)?
            .put_u8(params.update_type.0)?
            .put_u16(params.total_len)?
            .put_u16(params.offset)?
            .put_u8(value_len)?
            .put(params.value)?;
        Ok(cmd)
    }

    pub fn set_discoverable(params: &DiscoverableParams<'_>) -> Result<Self, EncodeError> {
        let name_len = u8::try_from(params.local_name.len()).map_err(|_| EncodeError::Overflow)?;
        let uuids_len =
            u8::try_from(params.service_uuids.len()).map_err(|_| EncodeError::Overflow)?;
        let mut cmd = Self::bare(opcode::GAP_SET_DISCOVERABLE);
        cmd.put_u8(params.adv_type)?
            .put_u16(params.interval_min)?
            .put_u16(params.interval_max)?
            .put_u8(params.own_address_type)?
            .put_u8(params.filter_policy)?
            .put_u8(name_len)?
            .put(params.local_name)?
            .put_u8(uuids_len)?
            .put(params.service_uuids)?
            .put_u16(params.conn_interval_min)?
            .put_u16(params.conn_interval_max)?;
        Ok(cmd)
    }

    #[must_use]
    pub const fn set_non_discoverable() -> Self {
        Self::bare(opcode::GAP_SET_NON_DISCOVERABLE)
    }

    #[must_use]
    pub fn exchange_configuration(connection: ConnectionHandle) -> Self {
        Self::fixed(
            opcode::GATT_EXCHANGE_CONFIGURATION,
            connection.0.to_le_bytes(),
        )
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("opcode", &self.opcode)
            .field("params", &self.params())
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Command {{ opcode: {=u16:#x}, params: {=[u8]:x} }}",
            self.opcode.0,
            self.params()
        )
    }
}

/// Handles returned by GAP Init.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GapHandles {
    pub service: AttributeHandle,
    pub device_name: AttributeHandle,
    pub appearance: AttributeHandle,
}

impl GapHandles {
    /// Parse the return parameters (status byte already stripped).
    pub fn parse(ret: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            service: AttributeHandle(le_u16(ret, 0)?),
            device_name: AttributeHandle(le_u16(ret, 2)?),
            appearance: AttributeHandle(le_u16(ret, 4)?),
        })
    }
}

/// Parse the single handle returned by add-service and add-characteristic.
pub fn parse_handle(ret: &[u8]) -> Result<AttributeHandle, DecodeError> {
    Ok(AttributeHandle(le_u16(ret, 0)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_values() {
        assert_eq!(opcode::HCI_RESET.0, 0x0C03);
        assert_eq!(opcode::LE_RAND.0, 0x2018);
        assert_eq!(opcode::GAP_SET_DISCOVERABLE.0, 0xFC83);
        assert_eq!(opcode::GATT_UPDATE_CHAR_VALUE_EXT.0, 0xFD2C);
        assert_eq!(opcode::GATT_EXCHANGE_CONFIGURATION.ogf(), 0x3F);
        assert_eq!(opcode::GATT_EXCHANGE_CONFIGURATION.ocf(), 0x10B);
    }

    #[test]
    fn test_encode_bare_command() {
        let mut buf = [0u8; MAX_COMMAND_LEN];
        let len = Command::reset().encode(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[0x01, 0x03, 0x0C, 0x00]);
    }

    #[test]
    fn test_encode_exchange_configuration() {
        let cmd = Command::exchange_configuration(ConnectionHandle(0x0040));
        let mut buf = [0u8; 8];
        let len = cmd.encode(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[0x01, 0x0B, 0xFD, 0x02, 0x40, 0x00]);
    }

    #[test]
    fn test_encode_into_short_buffer() {
        let cmd = Command::exchange_configuration(ConnectionHandle(1));
        let mut buf = [0u8; 5];
        assert_eq!(cmd.encode(&mut buf), Err(EncodeError::Overflow));
    }

    #[test]
    fn test_set_discoverable_layout() {
        let name = b"\x09BNRGM0";
        let cmd = Command::set_discoverable(&DiscoverableParams {
            adv_type: ADV_IND,
            interval_min: 0x0030,
            interval_max: 0x0640,
            own_address_type: ADDR_PUBLIC,
            filter_policy: NO_WHITE_LIST_USE,
            local_name: name,
            service_uuids: &[],
            conn_interval_min: 0,
            conn_interval_max: 0,
        })
        .unwrap();
        let p = cmd.params();
        assert_eq!(&p[..7], &[0x00, 0x30, 0x00, 0x40, 0x06, 0x00, 0x00]);
        assert_eq!(p[7], 7);
        assert_eq!(&p[8..15], name);
        assert_eq!(&p[15..], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_add_characteristic_layout() {
        let uuid = Uuid::Uuid16(0x2A37);
        let cmd = Command::add_characteristic(&CharacteristicParams {
            service: AttributeHandle(0x000C),
            uuid: &uuid,
            max_value_len: 20,
            properties: CharProperties::READ | CharProperties::NOTIFY,
            permissions: ATTR_PERMISSION_NONE,
            event_mask: GattEventMask::ATTRIBUTE_WRITE,
            encryption_key_size: DEFAULT_ENCRYPTION_KEY_SIZE,
            variable_len: true,
        })
        .unwrap();
        assert_eq!(
            cmd.params(),
            &[0x0C, 0x00, 0x01, 0x37, 0x2A, 20, 0x12, 0x00, 0x01, 16, 0x01]
        );
    }

    #[test]
    fn test_update_char_value_layout() {
        let cmd = Command::update_char_value(&UpdateParams {
            service: AttributeHandle(0x000C),
            characteristic: AttributeHandle(0x000D),
            update_type: UpdateType::NOTIFICATION,
            total_len: 3,
            offset: 0,
            value: &[0xAA, 0xBB, 0xCC],
        })
        .unwrap();
        assert_eq!(
            cmd.params(),
            &[0x0C, 0x00, 0x0D, 0x00, 0x01, 0x03, 0x00, 0x00, 0x00, 0x03, 0xAA, 0xBB, 0xCC]
        );
    }

    #[test]
    fn test_update_char_value_too_long() {
        let value = [0u8; MAX_PARAMS_LEN];
        let result = Command::update_char_value(&UpdateParams {
            service: AttributeHandle(1),
            characteristic: AttributeHandle(2),
            update_type: UpdateType::LOCAL,
            total_len: value.len() as u16,
            offset: 0,
            value: &value,
        });
        assert_eq!(result, Err(EncodeError::Overflow));
    }

    #[test]
    fn test_scan_response_padded() {
        let cmd = Command::set_scan_response_data(&[]).unwrap();
        assert_eq!(cmd.params().len(), 1 + MAX_SCAN_RESPONSE_LEN);
        assert!(cmd.params().iter().all(|&b| b == 0));
        assert!(Command::set_scan_response_data(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_write_public_address() {
        let cmd = Command::write_public_address(&BdAddr([1, 2, 3, 4, 5, 6]));
        assert_eq!(cmd.opcode(), opcode::HAL_WRITE_CONFIG_DATA);
        assert_eq!(cmd.params(), &[0x00, 0x06, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_gap_handles() {
        let handles = GapHandles::parse(&[0x05, 0x00, 0x06, 0x00, 0x08, 0x00]).unwrap();
        assert_eq!(handles.service, AttributeHandle(5));
        assert_eq!(handles.device_name, AttributeHandle(6));
        assert_eq!(handles.appearance, AttributeHandle(8));
        assert_eq!(GapHandles::parse(&[0x05]), Err(DecodeError::Truncated));
    }
}
