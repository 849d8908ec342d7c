//! Application callbacks.

use bnrg_proto::{AttributeHandle, ConnectionHandle};

/// Callbacks invoked from [`Peripheral::service`](crate::Peripheral::service).
///
/// Every method has a no-op default, so implementors only override what
/// they care about. Callbacks run synchronously on the caller's thread and
/// never concurrently.
pub trait EventHandler {
    /// A central connected.
    fn on_connect(&mut self, _connection: ConnectionHandle) {}

    /// The connection dropped. `reason` is the HCI disconnection reason code.
    fn on_disconnect(&mut self, _connection: ConnectionHandle, _reason: u8) {}

    /// The peer wrote a local attribute, e.g. a CCCD.
    fn on_attribute_modified(
        &mut self,
        _connection: ConnectionHandle,
        _attribute: AttributeHandle,
        _data: &[u8],
    ) {
    }

    /// A remote GATT server notified a value.
    fn on_notification(
        &mut self,
        _connection: ConnectionHandle,
        _attribute: AttributeHandle,
        _value: &[u8],
    ) {
    }

    /// The ATT MTU for the connection is now known.
    fn on_mtu_resolved(&mut self, _connection: ConnectionHandle, _mtu: u16) {}
}

impl EventHandler for () {}

impl<H: EventHandler + ?Sized> EventHandler for &mut H {
    fn on_connect(&mut self, connection: ConnectionHandle) {
        (**self).on_connect(connection);
    }

    fn on_disconnect(&mut self, connection: ConnectionHandle, reason: u8) {
        (**self).on_disconnect(connection, reason);
    }

    fn on_attribute_modified(
        &mut self,
        connection: ConnectionHandle,
        attribute: AttributeHandle,
        data: &[u8],
    ) {
        (**self).on_attribute_modified(connection, attribute, data);
    }

    fn on_notification(
        &mut self,
        connection: ConnectionHandle,
        attribute: AttributeHandle,
        value: &[u8],
    ) {
        (**self).on_notification(connection, attribute, value);
    }

    fn on_mtu_resolved(&mut self, connection: ConnectionHandle, mtu: u16) {
        (**self).on_mtu_resolved(connection, mtu);
    }
}
