//! Event demultiplexer.
//!
//! Decodes one raw event packet, applies it to the [`ConnectionState`] and
//! forwards it to the matching [`EventHandler`] callback. Unknown events are
//! dropped silently; malformed ones are logged and dropped.

use crate::connection::ConnectionState;
use crate::handler::EventHandler;
use bnrg_proto::{Event, EventPacket};

/// Route one raw packet.
pub fn dispatch<H: EventHandler>(packet: &[u8], state: &mut ConnectionState, handler: &mut H) {
    let event = match EventPacket::parse(packet).and_then(|p| p.decode()) {
        Ok(Some(event)) => event,
        Ok(None) => return,
        Err(e) => {
            warn!("malformed event dropped: {:?}", e);
            return;
        }
    };
    route(event, state, handler);
}

/// Route one decoded event.
pub fn route<H: EventHandler>(event: Event<'_>, state: &mut ConnectionState, handler: &mut H) {
    match event {
        Event::ConnectionComplete {
            status,
            connection,
            peer_address,
            ..
        } => {
            if !status.is_success() {
                warn!("connection failed: {:?}", status);
                return;
            }
            info!("connected {:#x} peer {:?}", connection.0, peer_address);
            state.on_connect(connection);
            handler.on_connect(connection);
        }
        Event::DisconnectionComplete {
            status,
            connection,
            reason,
        } => {
            // The link is treated as gone whatever the status says.
            if !status.is_success() {
                warn!("disconnection status {:?}", status);
            }
            let active = state.on_disconnect(connection);
            info!("disconnected {:#x} reason {:#x}", active.0, reason);
            handler.on_disconnect(active, reason);
        }
        Event::AttributeModified {
            connection,
            attribute,
            data,
            ..
        } => handler.on_attribute_modified(connection, attribute, data),
        Event::Notification {
            connection,
            attribute,
            value,
        } => handler.on_notification(connection, attribute, value),
        Event::MtuExchangeResponse {
            connection,
            server_rx_mtu,
        } => {
            if state.on_mtu_response(connection) {
                info!("mtu {} on {:#x}", server_rx_mtu, connection.0);
                handler.on_mtu_resolved(connection, server_rx_mtu);
            } else {
                debug!("mtu response on {:#x} ignored", connection.0);
            }
        }
        Event::TxPoolAvailable {
            available_buffers, ..
        } => {
            trace!("tx pool available: {}", available_buffers);
            state.set_tx_buffer_full(false);
        }
        Event::CommandComplete { opcode, .. } | Event::CommandStatus { opcode, .. } => {
            debug!("stray response for {:#x}", opcode.0);
        }
    }
}
