//! Hand-written test doubles shared by the unit tests.

extern crate std;

use crate::error::Error;
use crate::handler::EventHandler;
use crate::radio::Radio;
use crate::transport::{Clock, InterruptGate, Transport};
use bnrg_proto::spi::{HEADER_LEN, READ_FILLER};
use bnrg_proto::{AttributeHandle, Command, ConnectionHandle, Opcode, Status, TransportError};
use core::cell::Cell;
use core::convert::Infallible;
use std::collections::VecDeque;
use std::vec;
use std::vec::Vec;

/// Clock that advances by `step` milliseconds every time it is read.
pub struct StepClock {
    now: Cell<u64>,
    step: u64,
}

impl StepClock {
    pub fn new(step: u64) -> Self {
        Self {
            now: Cell::new(0),
            step,
        }
    }
}

impl StepClock {
    /// Time the next read will return.
    pub fn now(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for StepClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// SPI bus replaying scripted device headers.
///
/// A 5-byte transfer is a header exchange: the next scripted reply is
/// returned, or a not-ready reply once the script runs out. Single-byte
/// transfers read from `data`.
pub struct MockSpi {
    headers: VecDeque<[u8; HEADER_LEN]>,
    data: VecDeque<u8>,
    pub header_exchanges: usize,
    pub payload_writes: usize,
    pub written: Vec<u8>,
    pub bytes_read: usize,
    /// False if a read clocked out anything but the filler byte.
    pub fillers_ok: bool,
}

impl MockSpi {
    pub fn new(headers: Vec<[u8; HEADER_LEN]>, data: Vec<u8>) -> Self {
        Self {
            headers: headers.into(),
            data: data.into(),
            header_exchanges: 0,
            payload_writes: 0,
            written: Vec::new(),
            bytes_read: 0,
            fillers_ok: true,
        }
    }
}

impl embedded_hal::spi::ErrorType for MockSpi {
    type Error = Infallible;
}

impl embedded_hal::spi::SpiBus for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        for word in words {
            *word = self.data.pop_front().unwrap_or(0xFF);
            self.bytes_read += 1;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
        self.payload_writes += 1;
        self.written.extend_from_slice(words);
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
        let len = read.len().min(write.len());
        read[..len].copy_from_slice(&write[..len]);
        self.transfer_in_place(read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        if words.len() == HEADER_LEN {
            self.header_exchanges += 1;
            let reply = self.headers.pop_front().unwrap_or([0x00; HEADER_LEN]);
            words.copy_from_slice(&reply);
            return Ok(());
        }
        for word in words {
            if *word != READ_FILLER {
                self.fillers_ok = false;
            }
            *word = self.data.pop_front().unwrap_or(0xFF);
            self.bytes_read += 1;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// GPIO recording its level and how often it was driven low.
pub struct MockPin {
    pub is_high: bool,
    pub lows: usize,
}

impl MockPin {
    pub fn high() -> Self {
        Self {
            is_high: true,
            lows: 0,
        }
    }

    pub fn low() -> Self {
        Self {
            is_high: false,
            lows: 0,
        }
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.is_high = false;
        self.lows += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.is_high = true;
        Ok(())
    }
}

impl embedded_hal::digital::InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.is_high)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.is_high)
    }
}

#[derive(Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// Interrupt gate counting disable/restore pairs.
#[derive(Default)]
pub struct MockGate {
    disabled: Cell<usize>,
    restored: Cell<usize>,
}

impl MockGate {
    pub fn balance(&self) -> (usize, usize) {
        (self.disabled.get(), self.restored.get())
    }
}

impl InterruptGate for &MockGate {
    fn disable(&mut self) -> bool {
        self.disabled.set(self.disabled.get() + 1);
        true
    }

    fn restore(&mut self, was_enabled: bool) {
        assert!(was_enabled);
        self.restored.set(self.restored.get() + 1);
    }
}

/// Packet-level transport for exercising the HCI link.
#[derive(Default)]
pub struct MockTransport {
    pub incoming: VecDeque<Vec<u8>>,
    pub sent: Vec<Vec<u8>>,
    pub send_error: Option<TransportError>,
    pub resets: usize,
}

impl Transport for MockTransport {
    fn data_available(&mut self) -> bool {
        !self.incoming.is_empty()
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if let Some(e) = self.send_error {
            return Err(e);
        }
        self.sent.push(payload.to_vec());
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let Some(packet) = self.incoming.pop_front() else {
            return Ok(0);
        };
        let len = packet.len().min(buf.len());
        buf[..len].copy_from_slice(&packet[..len]);
        Ok(len)
    }

    fn hardware_reset(&mut self) -> Result<(), TransportError> {
        self.resets += 1;
        Ok(())
    }

    fn delay_ms(&mut self, _ms: u32) {}
}

/// Scripted radio recording every command it receives.
///
/// Commands succeed with empty return parameters unless a reply was
/// scripted for their opcode with [`reply`](Self::reply).
#[derive(Default)]
pub struct MockRadio {
    pub commands: Vec<Command>,
    pub events: VecDeque<Vec<u8>>,
    replies: Vec<(Opcode, Result<Vec<u8>, Status>)>,
    /// Queue a TX Pool Available event whenever a buffer-full status is returned.
    pub tx_pool_on_full: bool,
    pub resets: usize,
    pub delays: Vec<u32>,
}

impl MockRadio {
    /// Script the next reply for `opcode`. Replies for one opcode are used in order.
    pub fn reply(&mut self, opcode: Opcode, reply: Result<Vec<u8>, Status>) {
        self.replies.push((opcode, reply));
    }

    pub fn opcodes(&self) -> Vec<Opcode> {
        self.commands.iter().map(Command::opcode).collect()
    }

    pub fn count(&self, opcode: Opcode) -> usize {
        self.commands.iter().filter(|c| c.opcode() == opcode).count()
    }

    pub fn push_event(&mut self, packet: Vec<u8>) {
        self.events.push_back(packet);
    }
}

impl Radio for MockRadio {
    fn hardware_reset(&mut self) -> Result<(), Error> {
        self.resets += 1;
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }

    fn data_available(&mut self) -> bool {
        !self.events.is_empty()
    }

    fn read_event(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let Some(packet) = self.events.pop_front() else {
            return Ok(0);
        };
        let len = packet.len().min(buf.len());
        buf[..len].copy_from_slice(&packet[..len]);
        Ok(len)
    }

    fn command(&mut self, cmd: &Command, ret: &mut [u8]) -> Result<usize, Error> {
        self.commands.push(*cmd);
        let reply = match self.replies.iter().position(|(op, _)| *op == cmd.opcode()) {
            Some(i) => self.replies.remove(i).1,
            None => Ok(Vec::new()),
        };
        match reply {
            Ok(params) => {
                let len = params.len().min(ret.len());
                ret[..len].copy_from_slice(&params[..len]);
                Ok(len)
            }
            Err(status) => {
                if status.is_buffer_full() && self.tx_pool_on_full {
                    self.events.push_back(tx_pool_available(0x0040));
                }
                Err(Error::CommandRejected(status))
            }
        }
    }
}

pub fn connection_complete(handle: u16) -> Vec<u8> {
    let [lo, hi] = handle.to_le_bytes();
    vec![
        0x04, 0x3E, 0x13, 0x01, 0x00, lo, hi, 0x01, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x28,
        0x00, 0x00, 0x00, 0x2C, 0x01, 0x00,
    ]
}

pub fn disconnection_complete(handle: u16, reason: u8) -> Vec<u8> {
    let [lo, hi] = handle.to_le_bytes();
    vec![0x04, 0x05, 0x04, 0x00, lo, hi, reason]
}

pub fn mtu_response(handle: u16, mtu: u16) -> Vec<u8> {
    let [lo, hi] = handle.to_le_bytes();
    let [mlo, mhi] = mtu.to_le_bytes();
    vec![0x04, 0xFF, 0x07, 0x03, 0x0C, lo, hi, 0x02, mlo, mhi]
}

pub fn tx_pool_available(handle: u16) -> Vec<u8> {
    let [lo, hi] = handle.to_le_bytes();
    vec![0x04, 0xFF, 0x06, 0x16, 0x0C, lo, hi, 0x01, 0x00]
}

pub fn attribute_modified(handle: u16, attribute: u16, data: &[u8]) -> Vec<u8> {
    let [lo, hi] = handle.to_le_bytes();
    let [alo, ahi] = attribute.to_le_bytes();
    let mut packet = vec![
        0x04,
        0xFF,
        (9 + data.len()) as u8,
        0x01,
        0x0C,
        lo,
        hi,
        alo,
        ahi,
        data.len() as u8,
        0x00,
        0x00,
    ];
    packet.extend_from_slice(data);
    packet
}

/// Callback invocation seen by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(ConnectionHandle),
    Disconnect(ConnectionHandle, u8),
    AttributeModified(ConnectionHandle, AttributeHandle, Vec<u8>),
    Notification(ConnectionHandle, AttributeHandle, Vec<u8>),
    MtuResolved(ConnectionHandle, u16),
}

/// Event handler recording every callback.
#[derive(Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
}

impl EventHandler for Recorder {
    fn on_connect(&mut self, connection: ConnectionHandle) {
        self.calls.push(Call::Connect(connection));
    }

    fn on_disconnect(&mut self, connection: ConnectionHandle, reason: u8) {
        self.calls.push(Call::Disconnect(connection, reason));
    }

    fn on_attribute_modified(
        &mut self,
        connection: ConnectionHandle,
        attribute: AttributeHandle,
        data: &[u8],
    ) {
        self.calls
            .push(Call::AttributeModified(connection, attribute, data.to_vec()));
    }

    fn on_notification(
        &mut self,
        connection: ConnectionHandle,
        attribute: AttributeHandle,
        value: &[u8],
    ) {
        self.calls
            .push(Call::Notification(connection, attribute, value.to_vec()));
    }

    fn on_mtu_resolved(&mut self, connection: ConnectionHandle, mtu: u16) {
        self.calls.push(Call::MtuResolved(connection, mtu));
    }
}
