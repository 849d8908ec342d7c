//! HCI command link over the SPI transport.
//!
//! Commands are framed as HCI command packets and answered by a Command
//! Complete or Command Status event carrying the same opcode. Events that
//! arrive while waiting are held back in a bounded FIFO and handed out by
//! [`read_event`](Radio::read_event) before anything newly read, so the
//! caller still sees them in radio order.

use crate::config::{Config, DEFAULT_CONFIG};
use crate::error::Error;
use crate::radio::Radio;
use crate::transport::{Clock, Transport};
use bnrg_proto::{Command, Event, EventPacket, Opcode, Status, MAX_COMMAND_LEN, READ_PACKET_SIZE};
use core::cmp::min;
use heapless::{Deque, Vec};

/// Events that can be held back while a command is in flight.
pub const PENDING_EVENTS: usize = 8;

type Packet = Vec<u8, READ_PACKET_SIZE>;

/// [`Radio`] implementation on top of a [`Transport`].
pub struct HciLink<T, C> {
    transport: T,
    clock: C,
    command_timeout_ms: u32,
    pending: Deque<Packet, PENDING_EVENTS>,
}

impl<T: Transport, C: Clock> HciLink<T, C> {
    pub fn new(transport: T, clock: C) -> Self {
        Self::with_config(transport, clock, &DEFAULT_CONFIG)
    }

    pub fn with_config(transport: T, clock: C, config: &Config) -> Self {
        Self {
            transport,
            clock,
            command_timeout_ms: config.command_timeout_ms,
            pending: Deque::new(),
        }
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Number of events held back while waiting for command responses.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn defer(&mut self, packet: &[u8]) {
        let Ok(packet) = Packet::from_slice(packet) else {
            warn!("oversized event dropped, {} bytes", packet.len());
            return;
        };
        if self.pending.push_back(packet).is_err() {
            warn!("event queue full, dropping event");
        }
    }
}

/// Match `packet` against the response expected for `opcode`.
///
/// `None` if the packet is something else and must be delivered later.
fn response(
    opcode: Opcode,
    packet: &[u8],
    ret: &mut [u8],
) -> Option<Result<usize, Error>> {
    let event = EventPacket::parse(packet).ok()?.decode().ok()??;
    match event {
        Event::CommandComplete {
            opcode: op,
            return_params,
        } if op == opcode => {
            let Some((&status, params)) = return_params.split_first() else {
                return Some(Err(Error::Decode(bnrg_proto::DecodeError::Truncated)));
            };
            let status = Status(status);
            if !status.is_success() {
                return Some(Err(Error::CommandRejected(status)));
            }
            let len = min(params.len(), ret.len());
            ret[..len].copy_from_slice(&params[..len]);
            Some(Ok(len))
        }
        Event::CommandStatus { status, opcode: op } if op == opcode => {
            if status.is_success() {
                Some(Ok(0))
            } else {
                Some(Err(Error::CommandRejected(status)))
            }
        }
        _ => None,
    }
}

impl<T: Transport, C: Clock> Radio for HciLink<T, C> {
    fn hardware_reset(&mut self) -> Result<(), Error> {
        self.pending.clear();
        self.transport.hardware_reset()?;
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.transport.delay_ms(ms);
    }

    fn data_available(&mut self) -> bool {
        !self.pending.is_empty() || self.transport.data_available()
    }

    fn read_event(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if let Some(packet) = self.pending.pop_front() {
            let len = min(packet.len(), buf.len());
            buf[..len].copy_from_slice(&packet[..len]);
            return Ok(len);
        }
        Ok(self.transport.receive(buf)?)
    }

    fn command(&mut self, cmd: &Command, ret: &mut [u8]) -> Result<usize, Error> {
        let mut out = [0u8; MAX_COMMAND_LEN];
        let len = cmd.encode(&mut out)?;
        trace!("hci command {:?}", cmd);
        self.transport.send(&out[..len])?;

        let start = self.clock.now_ms();
        let mut buf = [0u8; READ_PACKET_SIZE];
        loop {
            if self.transport.data_available() {
                let n = self.transport.receive(&mut buf)?;
                if n > 0 {
                    match response(cmd.opcode(), &buf[..n], ret) {
                        Some(result) => {
                            if let Err(e) = result {
                                debug!("command {:#x} failed: {:?}", cmd.opcode().0, e);
                            }
                            return result;
                        }
                        None => self.defer(&buf[..n]),
                    }
                    continue;
                }
            }
            if self.clock.now_ms().saturating_sub(start) >= u64::from(self.command_timeout_ms) {
                warn!("command {:#x} timed out", cmd.opcode().0);
                return Err(Error::CommandTimeout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::mock::{MockTransport, StepClock};
    use bnrg_proto::command::opcode;
    use bnrg_proto::{ConnectionHandle, TransportError};
    use std::vec;
    use std::vec::Vec;

    fn complete(op: Opcode, ret: &[u8]) -> Vec<u8> {
        let [lo, hi] = op.0.to_le_bytes();
        let mut packet = vec![0x04, 0x0E, (3 + ret.len()) as u8, 0x01, lo, hi];
        packet.extend_from_slice(ret);
        packet
    }

    fn disconnect(handle: u16) -> Vec<u8> {
        let [lo, hi] = handle.to_le_bytes();
        vec![0x04, 0x05, 0x04, 0x00, lo, hi, 0x13]
    }

    #[test]
    fn test_command_encodes_and_returns_params() {
        let mut transport = MockTransport::default();
        transport
            .incoming
            .push_back(complete(opcode::GATT_ADD_SERVICE, &[0x00, 0x0C, 0x00]));
        let mut link = HciLink::new(transport, StepClock::new(1));

        let cmd = Command::add_service(&bnrg_proto::Uuid::Uuid16(0x180D), 0x01, 4).unwrap();
        let mut ret = [0u8; 4];
        assert_eq!(link.command(&cmd, &mut ret), Ok(2));
        assert_eq!(&ret[..2], &[0x0C, 0x00]);

        let sent = &link.transport().sent[0];
        assert_eq!(&sent[..4], &[0x01, 0x02, 0xFD, 0x05]);
    }

    #[test]
    fn test_command_rejected_status() {
        let mut transport = MockTransport::default();
        transport
            .incoming
            .push_back(complete(opcode::GAP_SET_NON_DISCOVERABLE, &[0x0C]));
        let mut link = HciLink::new(transport, StepClock::new(1));

        assert_eq!(
            link.command(&Command::set_non_discoverable(), &mut []),
            Err(Error::CommandRejected(Status(0x0C)))
        );
    }

    #[test]
    fn test_response_for_other_opcode_is_deferred() {
        let mut transport = MockTransport::default();
        transport
            .incoming
            .push_back(complete(opcode::GAP_SET_DISCOVERABLE, &[0x00]));
        let mut link = HciLink::new(transport, StepClock::new(50));

        assert_eq!(
            link.command(&Command::set_non_discoverable(), &mut []),
            Err(Error::CommandTimeout)
        );
        assert_eq!(link.pending(), 1);
    }

    #[test]
    fn test_command_status_rejection() {
        let mut transport = MockTransport::default();
        transport
            .incoming
            .push_back(vec![0x04, 0x0F, 0x04, 0x64, 0x01, 0x0B, 0xFD]);
        let mut link = HciLink::new(transport, StepClock::new(1));

        let cmd = Command::exchange_configuration(ConnectionHandle(0x40));
        assert_eq!(
            link.command(&cmd, &mut []),
            Err(Error::CommandRejected(Status::INSUFFICIENT_RESOURCES))
        );
    }

    #[test]
    fn test_events_read_while_waiting_are_delivered_first() {
        let mut transport = MockTransport::default();
        transport.incoming.push_back(disconnect(0x40));
        transport.incoming.push_back(complete(opcode::HCI_RESET, &[0x00]));
        transport.incoming.push_back(disconnect(0x41));
        let mut link = HciLink::new(transport, StepClock::new(1));

        assert_eq!(link.command(&Command::reset(), &mut []), Ok(0));
        assert_eq!(link.pending(), 1);
        assert!(link.data_available());

        let mut buf = [0u8; READ_PACKET_SIZE];
        let n = link.read_event(&mut buf).unwrap();
        assert_eq!(&buf[..n], disconnect(0x40).as_slice());
        let n = link.read_event(&mut buf).unwrap();
        assert_eq!(&buf[..n], disconnect(0x41).as_slice());
        assert!(!link.data_available());
    }

    #[test]
    fn test_command_times_out() {
        let transport = MockTransport::default();
        let mut link = HciLink::new(transport, StepClock::new(10));
        assert_eq!(
            link.command(&Command::reset(), &mut []),
            Err(Error::CommandTimeout)
        );
    }

    #[test]
    fn test_send_failure_propagates() {
        let mut transport = MockTransport::default();
        transport.send_error = Some(TransportError::Timeout);
        let mut link = HciLink::new(transport, StepClock::new(1));
        assert_eq!(
            link.command(&Command::reset(), &mut []),
            Err(Error::Transport(TransportError::Timeout))
        );
    }

    #[test]
    fn test_pending_queue_is_bounded() {
        let mut transport = MockTransport::default();
        for handle in 0..(PENDING_EVENTS as u16 + 3) {
            transport.incoming.push_back(disconnect(handle + 1));
        }
        transport.incoming.push_back(complete(opcode::HCI_RESET, &[0x00]));
        let mut link = HciLink::new(transport, StepClock::new(1));

        assert_eq!(link.command(&Command::reset(), &mut []), Ok(0));
        assert_eq!(link.pending(), PENDING_EVENTS);
    }
}
