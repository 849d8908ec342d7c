//! Demo application callbacks.

use bnrg_core::EventHandler;
use bnrg_proto::{cccd, AttributeHandle, ConnectionHandle};
use defmt::{debug, info};

/// Tracks whether the peer subscribed to the sample characteristic.
#[derive(Debug, Default)]
pub struct AppEvents {
    cccd: AttributeHandle,
    notify: bool,
    mtu: Option<u16>,
}

impl AppEvents {
    /// Watch the CCCD at `cccd` for subscription changes.
    pub fn watch(&mut self, cccd: AttributeHandle) {
        self.cccd = cccd;
    }

    /// True while the connected peer has notifications enabled.
    #[must_use]
    pub fn notify_enabled(&self) -> bool {
        self.notify
    }

    #[must_use]
    pub fn mtu(&self) -> Option<u16> {
        self.mtu
    }
}

impl EventHandler for AppEvents {
    fn on_connect(&mut self, connection: ConnectionHandle) {
        info!("central connected on {=u16:#x}", connection.0);
        self.notify = false;
        self.mtu = None;
    }

    fn on_disconnect(&mut self, connection: ConnectionHandle, reason: u8) {
        info!("central on {=u16:#x} left, reason {=u8:#x}", connection.0, reason);
        self.notify = false;
        self.mtu = None;
    }

    fn on_attribute_modified(
        &mut self,
        _connection: ConnectionHandle,
        attribute: AttributeHandle,
        data: &[u8],
    ) {
        if attribute == self.cccd {
            self.notify = cccd::notifications_enabled(data);
            info!("notifications {}", if self.notify { "on" } else { "off" });
        } else {
            debug!("write to {=u16:#x} ignored", attribute.0);
        }
    }

    fn on_mtu_resolved(&mut self, _connection: ConnectionHandle, mtu: u16) {
        self.mtu = Some(mtu);
    }
}
