//! HCI event envelope and the events the peripheral driver reacts to.
//!
//! Packet layout on the wire:
//!
//! ```text
//! [0x04, event_code, param_len, params...]
//! ```
//!
//! LE Meta events (`0x3E`) carry a one-byte sub-event code as the first
//! parameter, vendor events (`0xFF`) a little-endian 16-bit event code.
//! Only the fields the driver consumes are decoded; unknown codes decode to
//! `None` and are never an error.

use crate::command::Opcode;
use crate::types::{AttributeHandle, BdAddr, ConnectionHandle, Status};

/// HCI packet indicator for events.
pub const PACKET_TYPE_EVENT: u8 = 0x04;

/// Packet indicator, event code and parameter length.
pub const EVENT_HEADER_LEN: usize = 3;

/// Bytes reserved for one packet read from the radio.
pub const READ_PACKET_SIZE: usize = 128;

pub const EVT_DISCONNECTION_COMPLETE: u8 = 0x05;
pub const EVT_COMMAND_COMPLETE: u8 = 0x0E;
pub const EVT_COMMAND_STATUS: u8 = 0x0F;
pub const EVT_LE_META: u8 = 0x3E;
pub const EVT_VENDOR: u8 = 0xFF;

pub const EVT_LE_CONNECTION_COMPLETE: u8 = 0x01;

pub const EVT_VS_GATT_ATTRIBUTE_MODIFIED: u16 = 0x0C01;
pub const EVT_VS_ATT_EXCHANGE_MTU_RESP: u16 = 0x0C03;
pub const EVT_VS_GATT_NOTIFICATION: u16 = 0x0C0F;
pub const EVT_VS_GATT_TX_POOL_AVAILABLE: u16 = 0x0C16;

/// Error type for event decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Packet indicator is not an HCI event.
    NotEvent,
    /// Packet shorter than its header or a recognized event's layout.
    Truncated,
}

/// Event envelope: code plus opaque parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventPacket<'a> {
    pub code: u8,
    pub params: &'a [u8],
}

/// Decoded event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event<'a> {
    DisconnectionComplete {
        status: Status,
        connection: ConnectionHandle,
        reason: u8,
    },
    ConnectionComplete {
        status: Status,
        connection: ConnectionHandle,
        role: u8,
        peer_address_type: u8,
        peer_address: BdAddr,
    },
    /// A peer wrote an attribute of the local GATT server.
    AttributeModified {
        connection: ConnectionHandle,
        attribute: AttributeHandle,
        /// Write offset; bit 15 flags that more data follows.
        offset: u16,
        data: &'a [u8],
    },
    /// Notification from a remote GATT server.
    Notification {
        connection: ConnectionHandle,
        attribute: AttributeHandle,
        value: &'a [u8],
    },
    /// ATT MTU exchange finished, whichever side started it.
    MtuExchangeResponse {
        connection: ConnectionHandle,
        server_rx_mtu: u16,
    },
    /// The radio freed output buffers after reporting insufficient resources.
    TxPoolAvailable {
        connection: ConnectionHandle,
        available_buffers: u16,
    },
    CommandComplete {
        opcode: Opcode,
        /// Return parameters, status byte first.
        return_params: &'a [u8],
    },
    CommandStatus {
        status: Status,
        opcode: Opcode,
    },
}

impl<'a> EventPacket<'a> {
    /// Split a raw HCI packet into event code and parameters.
    pub fn parse(packet: &'a [u8]) -> Result<Self, DecodeError> {
        match packet {
            [PACKET_TYPE_EVENT, code, len, rest @ ..] => {
                let params = rest.get(..*len as usize).ok_or(DecodeError::Truncated)?;
                Ok(Self {
                    code: *code,
                    params,
                })
            }
            [] | [PACKET_TYPE_EVENT, ..] => Err(DecodeError::Truncated),
            _ => Err(DecodeError::NotEvent),
        }
    }

    /// Decode the recognized events. Unknown codes give `Ok(None)`.
    pub fn decode(&self) -> Result<Option<Event<'a>>, DecodeError> {
        let p = self.params;
        let event = match self.code {
            EVT_DISCONNECTION_COMPLETE => Event::DisconnectionComplete {
                status: Status(byte(p, 0)?),
                connection: connection(p, 1)?,
                reason: byte(p, 3)?,
            },
            EVT_LE_META => match byte(p, 0)? {
                EVT_LE_CONNECTION_COMPLETE => {
                    let addr = p.get(6..12).ok_or(DecodeError::Truncated)?;
                    let mut peer = [0u8; 6];
                    peer.copy_from_slice(addr);
                    Event::ConnectionComplete {
                        status: Status(byte(p, 1)?),
                        connection: connection(p, 2)?,
                        role: byte(p, 4)?,
                        peer_address_type: byte(p, 5)?,
                        peer_address: BdAddr(peer),
                    }
                }
                _ => return Ok(None),
            },
            EVT_VENDOR => return decode_vendor(le_u16(p, 0)?, &p[2..]),
            EVT_COMMAND_COMPLETE => Event::CommandComplete {
                opcode: Opcode(le_u16(p, 1)?),
                return_params: &p[3..],
            },
            EVT_COMMAND_STATUS => Event::CommandStatus {
                status: Status(byte(p, 0)?),
                opcode: Opcode(le_u16(p, 2)?),
            },
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

fn decode_vendor(ecode: u16, p: &[u8]) -> Result<Option<Event<'_>>, DecodeError> {
    let event = match ecode {
        EVT_VS_GATT_ATTRIBUTE_MODIFIED => {
            let len = byte(p, 4)? as usize;
            Event::AttributeModified {
                connection: connection(p, 0)?,
                attribute: AttributeHandle(le_u16(p, 2)?),
                offset: le_u16(p, 5)?,
                data: p.get(7..7 + len).ok_or(DecodeError::Truncated)?,
            }
        }
        EVT_VS_GATT_NOTIFICATION => {
            // Length covers the attribute handle and the value.
            let len = (byte(p, 2)? as usize).saturating_sub(2);
            Event::Notification {
                connection: connection(p, 0)?,
                attribute: AttributeHandle(le_u16(p, 3)?),
                value: p.get(5..5 + len).ok_or(DecodeError::Truncated)?,
            }
        }
        EVT_VS_ATT_EXCHANGE_MTU_RESP => Event::MtuExchangeResponse {
            connection: connection(p, 0)?,
            server_rx_mtu: le_u16(p, 3)?,
        },
        EVT_VS_GATT_TX_POOL_AVAILABLE => Event::TxPoolAvailable {
            connection: connection(p, 0)?,
            available_buffers: le_u16(p, 2)?,
        },
        _ => return Ok(None),
    };
    Ok(Some(event))
}

/// Decode a raw HCI packet in one step.
pub fn decode(packet: &[u8]) -> Result<Option<Event<'_>>, DecodeError> {
    EventPacket::parse(packet)?.decode()
}

#[inline]
fn byte(buf: &[u8], offset: usize) -> Result<u8, DecodeError> {
    buf.get(offset).copied().ok_or(DecodeError::Truncated)
}

#[inline]
pub(crate) fn le_u16(buf: &[u8], offset: usize) -> Result<u16, DecodeError> {
    match buf.get(offset..offset + 2) {
        Some(&[lo, hi]) => Ok(u16::from_le_bytes([lo, hi])),
        _ => Err(DecodeError::Truncated),
    }
}

#[inline]
fn connection(buf: &[u8], offset: usize) -> Result<ConnectionHandle, DecodeError> {
    Ok(ConnectionHandle(le_u16(buf, offset)? & ConnectionHandle::MASK))
}
