//! Connection, discoverability and MTU negotiation state.
//!
//! ```text
//!            enable + poll                      connection complete
//!  Idle/Stopped ─────────────▶ Idle/Started ──────────────────────▶ Connected/NotStarted
//!       ▲  ◀───────────────────────┘                                       │ poll
//!       │      disable + poll                                              ▼
//!       │                                                        Connected/InProgress
//!       │                  disconnection complete                          │ MTU response
//!       └──────────────────────────────────────────────────────── Connected/Completed
//! ```
//!
//! A connection always forces discoverability to `Stopped`: the radio stops
//! advertising by itself once a central connects.

use bnrg_proto::ConnectionHandle;

/// Whether connectable advertising is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Discoverability {
    #[default]
    Stopped,
    Started,
}

/// Progress of the ATT MTU exchange on the active connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MtuExchange {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// The one state-changing command a poll should issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollAction {
    StartAdvertising,
    StopAdvertising,
    ExchangeMtu(ConnectionHandle),
}

/// Protocol state of a single-connection peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionState {
    connection: Option<ConnectionHandle>,
    discoverability: Discoverability,
    mtu: MtuExchange,
    connectable: bool,
    tx_buffer_full: bool,
}

impl ConnectionState {
    /// Boot state: idle, not advertising, connectable mode off.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connection: None,
            discoverability: Discoverability::Stopped,
            mtu: MtuExchange::NotStarted,
            connectable: false,
            tx_buffer_full: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn connection(&self) -> Option<ConnectionHandle> {
        self.connection
    }

    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    #[inline]
    #[must_use]
    pub fn discoverability(&self) -> Discoverability {
        self.discoverability
    }

    #[inline]
    #[must_use]
    pub fn mtu_exchange(&self) -> MtuExchange {
        self.mtu
    }

    /// Whether the user asked for connectable advertising.
    #[inline]
    #[must_use]
    pub fn is_connectable(&self) -> bool {
        self.connectable
    }

    pub fn set_connectable(&mut self, enabled: bool) {
        self.connectable = enabled;
    }

    #[inline]
    #[must_use]
    pub fn tx_buffer_full(&self) -> bool {
        self.tx_buffer_full
    }

    pub fn set_tx_buffer_full(&mut self, full: bool) {
        self.tx_buffer_full = full;
    }

    /// Command the next poll should issue, if any.
    #[must_use]
    pub fn next_action(&self) -> Option<PollAction> {
        if let Some(handle) = self.connection {
            return match self.mtu {
                MtuExchange::NotStarted => Some(PollAction::ExchangeMtu(handle)),
                MtuExchange::InProgress | MtuExchange::Completed => None,
            };
        }
        match (self.connectable, self.discoverability) {
            (true, Discoverability::Stopped) => Some(PollAction::StartAdvertising),
            (false, Discoverability::Started) => Some(PollAction::StopAdvertising),
            _ => None,
        }
    }

    /// Record that discoverable mode was entered.
    pub fn advertising_started(&mut self) {
        if self.connection.is_none() {
            self.discoverability = Discoverability::Started;
        }
    }

    /// Record that discoverable mode was left.
    pub fn advertising_stopped(&mut self) {
        self.discoverability = Discoverability::Stopped;
    }

    /// Record that the host issued its own MTU exchange.
    pub fn mtu_exchange_started(&mut self) {
        if self.connection.is_some() && self.mtu == MtuExchange::NotStarted {
            self.mtu = MtuExchange::InProgress;
        }
    }

    /// A link formed.
    pub fn on_connect(&mut self, handle: ConnectionHandle) {
        self.connection = Some(handle);
        self.discoverability = Discoverability::Stopped;
        self.mtu = MtuExchange::NotStarted;
        self.tx_buffer_full = false;
    }

    /// The link dropped. Returns the handle that was active.
    pub fn on_disconnect(&mut self, handle: ConnectionHandle) -> ConnectionHandle {
        let active = self.connection.take().unwrap_or(handle);
        self.discoverability = Discoverability::Stopped;
        self.mtu = MtuExchange::NotStarted;
        self.tx_buffer_full = false;
        active
    }

    /// An MTU exchange finished. True only for the first response on the active connection.
    pub fn on_mtu_response(&mut self, handle: ConnectionHandle) -> bool {
        if self.connection != Some(handle) || self.mtu == MtuExchange::Completed {
            return false;
        }
        self.mtu = MtuExchange::Completed;
        true
    }
}
