//! Registered services and characteristics.

use crate::error::Error;
use bnrg_proto::{AttributeHandle, CharProperties, GattEventMask, Uuid};

/// A primary service registered with the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Service {
    pub handle: AttributeHandle,
}

/// What to register with [`Peripheral::add_characteristic`](crate::Peripheral::add_characteristic).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicSpec {
    pub uuid: Uuid,
    /// Largest value accepted by updates.
    pub max_value_len: u8,
    pub variable_len: bool,
    pub properties: CharProperties,
    pub event_mask: GattEventMask,
}

impl CharacteristicSpec {
    /// Variable-length characteristic reporting peer writes.
    #[must_use]
    pub const fn new(uuid: Uuid, max_value_len: u8, properties: CharProperties) -> Self {
        Self {
            uuid,
            max_value_len,
            variable_len: true,
            properties,
            event_mask: GattEventMask::ATTRIBUTE_WRITE,
        }
    }
}

/// A registered characteristic and its contiguous handle triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Characteristic {
    service: AttributeHandle,
    declaration: AttributeHandle,
    value: AttributeHandle,
    cccd: AttributeHandle,
    properties: CharProperties,
    max_value_len: u8,
    variable_len: bool,
}

impl Characteristic {
    /// Assign the handle triple from the declaration handle returned by the radio.
    pub(crate) fn register(
        service: &Service,
        declaration: AttributeHandle,
        spec: &CharacteristicSpec,
    ) -> Result<Self, Error> {
        let value = declaration.0.checked_add(1).ok_or(Error::InvalidIdentifier)?;
        let cccd = declaration.0.checked_add(2).ok_or(Error::InvalidIdentifier)?;
        Ok(Self {
            service: service.handle,
            declaration,
            value: AttributeHandle(value),
            cccd: AttributeHandle(cccd),
            properties: spec.properties,
            max_value_len: spec.max_value_len,
            variable_len: spec.variable_len,
        })
    }

    #[inline]
    #[must_use]
    pub fn service(&self) -> AttributeHandle {
        self.service
    }

    #[inline]
    #[must_use]
    pub fn declaration_handle(&self) -> AttributeHandle {
        self.declaration
    }

    #[inline]
    #[must_use]
    pub fn value_handle(&self) -> AttributeHandle {
        self.value
    }

    #[inline]
    #[must_use]
    pub fn cccd_handle(&self) -> AttributeHandle {
        self.cccd
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> CharProperties {
        self.properties
    }

    #[inline]
    #[must_use]
    pub fn max_value_len(&self) -> u8 {
        self.max_value_len
    }

    #[inline]
    #[must_use]
    pub fn is_variable_len(&self) -> bool {
        self.variable_len
    }

    /// True if an attribute event refers to this characteristic's value.
    #[inline]
    #[must_use]
    pub fn is_value_handle(&self, attribute: AttributeHandle) -> bool {
        attribute == self.value
    }

    /// True if an attribute event refers to this characteristic's CCCD.
    #[inline]
    #[must_use]
    pub fn is_cccd_handle(&self, attribute: AttributeHandle) -> bool {
        attribute == self.cccd
    }
}
