//! Peripheral driver: bring-up, GATT registration, advertising control and
//! flow-controlled characteristic updates.
//!
//! The driver is a single owned value. Events are pulled with
//! [`service`](Peripheral::service) (call it whenever the data-ready line
//! fires) and the advertising/MTU state machine is advanced with
//! [`poll`](Peripheral::poll); [`process`](Peripheral::process) does both and
//! is meant to be called on every iteration of the application loop.
//!
//! Fallible operations return `Result` and also record the failure, which
//! [`last_error`](Peripheral::last_error) reports until the next operation.

use crate::config::{Config, DEFAULT_CONFIG};
use crate::connection::{ConnectionState, Discoverability, MtuExchange, PollAction};
use crate::demux;
use crate::error::Error;
use crate::gatt::{Characteristic, CharacteristicSpec, Service};
use crate::handler::EventHandler;
use crate::radio::Radio;
use crate::transport::Clock;
use bnrg_proto::command::{
    parse_handle, GapHandles, ATTR_PERMISSION_NONE, DEFAULT_ENCRYPTION_KEY_SIZE,
    GAP_PERIPHERAL_ROLE, SERVICE_PRIMARY,
};
use bnrg_proto::{
    AdvertisedName, BdAddr, CharacteristicParams, Command, ConnectionHandle, DecodeError,
    DiscoverableParams, UpdateParams, UpdateType, Uuid, READ_PACKET_SIZE,
};

/// Upper bytes of addresses derived from LE Rand (ST Microelectronics OUI).
const RANDOM_ADDRESS_PREFIX: [u8; 3] = [0xE1, 0x80, 0x02];

/// Single-connection BLE peripheral on top of a [`Radio`].
pub struct Peripheral<R, H, C> {
    radio: R,
    handler: H,
    clock: C,
    config: Config,
    state: ConnectionState,
    name: AdvertisedName,
    last_error: Option<Error>,
}

impl<R, H, C> Peripheral<R, H, C>
where
    R: Radio,
    H: EventHandler,
    C: Clock,
{
    /// Create a driver with the default configuration.
    pub fn new(radio: R, handler: H, clock: C) -> Self {
        Self::with_config(radio, handler, clock, DEFAULT_CONFIG)
    }

    pub fn with_config(radio: R, handler: H, clock: C, config: Config) -> Self {
        Self {
            radio,
            handler,
            clock,
            config,
            state: ConnectionState::new(),
            name: AdvertisedName::default(),
            last_error: None,
        }
    }

    /// Run `f`, recording its error as the last error.
    fn track<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        self.last_error = None;
        let result = f(self);
        if let Err(e) = &result {
            self.last_error = Some(*e);
        }
        result
    }

    /// HCI reset followed by the settle delay.
    fn soft_reset(&mut self) -> Result<(), Error> {
        self.radio.command(&Command::reset(), &mut [])?;
        self.radio.delay_ms(self.config.settle_ms);
        Ok(())
    }

    /// Reset the radio and program its public address.
    ///
    /// `public_address` is given most significant byte first, as printed.
    /// With `None` an address is derived from the radio's random number
    /// generator.
    pub fn init(&mut self, public_address: Option<[u8; 6]>) -> Result<(), Error> {
        self.track(|p| {
            let connectable = p.state.is_connectable();
            p.state = ConnectionState::new();
            p.state.set_connectable(connectable);

            p.radio.hardware_reset()?;
            p.soft_reset()?;

            let addr = match public_address {
                Some(addr) => BdAddr::from_msb_first(addr),
                None => {
                    let mut random = [0u8; 8];
                    let len = p.radio.command(&Command::le_rand(), &mut random)?;
                    if len < 7 {
                        return Err(Error::Decode(DecodeError::Truncated));
                    }
                    let [p0, p1, p2] = RANDOM_ADDRESS_PREFIX;
                    let addr = BdAddr([random[0], random[3], random[6], p0, p1, p2]);
                    // The address write must be the first command after a reset.
                    p.soft_reset()?;
                    addr
                }
            };
            p.radio
                .command(&Command::write_public_address(&addr), &mut [])?;
            info!("radio ready, address {:?}", addr);
            Ok(())
        })
    }

    /// Set the transmit power level.
    pub fn set_tx_power(&mut self, high_power: bool, pa_level: u8) -> Result<(), Error> {
        self.track(|p| {
            p.radio
                .command(&Command::set_tx_power_level(high_power, pa_level), &mut [])?;
            Ok(())
        })
    }

    /// Initialize GATT and GAP in the peripheral role.
    pub fn stack_init(&mut self) -> Result<GapHandles, Error> {
        self.track(|p| {
            p.radio.command(&Command::gatt_init(), &mut [])?;
            let mut ret = [0u8; 6];
            let len = p.radio.command(
                &Command::gap_init(GAP_PERIPHERAL_ROLE, false, p.config.device_name_len),
                &mut ret,
            )?;
            let handles = GapHandles::parse(&ret[..len])?;
            debug!("gap service {:#x}", handles.service.0);
            Ok(handles)
        })
    }

    /// Register a primary service with room for `characteristics` characteristics.
    pub fn add_service(&mut self, uuid: &Uuid, characteristics: u8) -> Result<Service, Error> {
        self.track(|p| {
            // Service declaration plus declaration, value and CCCD per characteristic.
            let records = characteristics
                .checked_mul(3)
                .and_then(|n| n.checked_add(1))
                .ok_or(Error::InvalidLength)?;
            let mut ret = [0u8; 2];
            let len = p.radio.command(
                &Command::add_service(uuid, SERVICE_PRIMARY, records)?,
                &mut ret,
            )?;
            let handle = parse_handle(&ret[..len])?;
            debug!("service {:?} at {:#x}", uuid, handle.0);
            Ok(Service { handle })
        })
    }

    /// Register a characteristic and assign its handle triple.
    pub fn add_characteristic(
        &mut self,
        service: &Service,
        spec: &CharacteristicSpec,
    ) -> Result<Characteristic, Error> {
        self.track(|p| {
            let cmd = Command::add_characteristic(&CharacteristicParams {
                service: service.handle,
                uuid: &spec.uuid,
                max_value_len: spec.max_value_len,
                properties: spec.properties,
                permissions: ATTR_PERMISSION_NONE,
                event_mask: spec.event_mask,
                encryption_key_size: DEFAULT_ENCRYPTION_KEY_SIZE,
                variable_len: spec.variable_len,
            })?;
            let mut ret = [0u8; 2];
            let len = p.radio.command(&cmd, &mut ret)?;
            let declaration = parse_handle(&ret[..len])?;
            Characteristic::register(service, declaration, spec)
        })
    }

    /// Push a new value to the connected peer.
    ///
    /// Notification and indication flags follow the characteristic's
    /// properties. While the radio reports its output buffers full the call
    /// keeps servicing events until a TX Pool Available event frees them,
    /// failing with [`Error::UpdateTimeout`] once the update deadline passes.
    /// The deadline is only checked after a service pass that left the
    /// buffers full.
    pub fn update_char_value(
        &mut self,
        connection: ConnectionHandle,
        characteristic: &Characteristic,
        value: &[u8],
    ) -> Result<(), Error> {
        self.track(|p| p.flow_controlled_update(connection, characteristic, value))
    }

    fn flow_controlled_update(
        &mut self,
        connection: ConnectionHandle,
        characteristic: &Characteristic,
        value: &[u8],
    ) -> Result<(), Error> {
        if connection.is_none() || self.state.connection() != Some(connection) {
            return Err(Error::InvalidIdentifier);
        }
        if value.len() > characteristic.max_value_len() as usize {
            return Err(Error::InvalidLength);
        }
        let cmd = Command::update_char_value(&UpdateParams {
            service: characteristic.service(),
            characteristic: characteristic.declaration_handle(),
            update_type: UpdateType::for_properties(characteristic.properties()),
            total_len: value.len() as u16,
            offset: 0,
            value,
        })?;

        let start = self.clock.now_ms();
        let deadline = self.config.update_timeout_ms();
        loop {
            match self.radio.command(&cmd, &mut []) {
                Ok(_) => return Ok(()),
                Err(e) if e.is_buffer_full() => {
                    trace!("tx buffer full, waiting");
                    self.state.set_tx_buffer_full(true);
                    loop {
                        self.service();
                        // Freed buffers win over an expired deadline.
                        if !self.state.tx_buffer_full() {
                            break;
                        }
                        if self.clock.now_ms().saturating_sub(start) > deadline {
                            warn!("update of {:#x} timed out", characteristic.value_handle().0);
                            return Err(Error::UpdateTimeout);
                        }
                    }
                    if self.state.connection() != Some(connection) {
                        return Err(Error::InvalidIdentifier);
                    }
                }
                Err(e) => {
                    warn!("update of {:#x} failed: {:?}", characteristic.value_handle().0, e);
                    return Err(e);
                }
            }
        }
    }

    /// Set the advertised complete local name, truncated to 20 bytes.
    ///
    /// Takes effect the next time advertising starts.
    pub fn set_local_name(&mut self, name: &[u8]) {
        self.name = AdvertisedName::new(name);
    }

    /// Request connectable advertising on or off. Applied by [`poll`](Self::poll).
    pub fn set_connectable_mode(&mut self, enabled: bool) {
        self.state.set_connectable(enabled);
    }

    /// Drain pending events and dispatch them. Returns how many were read.
    ///
    /// Stops when the radio has nothing more to report or a read fails.
    pub fn service(&mut self) -> usize {
        let mut buf = [0u8; READ_PACKET_SIZE];
        let mut handled = 0;
        while self.radio.data_available() {
            match self.radio.read_event(&mut buf) {
                Ok(0) => break,
                Ok(len) => {
                    demux::dispatch(&buf[..len], &mut self.state, &mut self.handler);
                    handled += 1;
                }
                Err(e) => {
                    warn!("event read failed: {:?}", e);
                    break;
                }
            }
        }
        handled
    }

    /// Issue at most one state-changing command.
    ///
    /// Returns the transition that was attempted, `None` if the state
    /// already matches what was requested.
    pub fn poll(&mut self) -> Result<Option<PollAction>, Error> {
        self.track(|p| {
            let Some(action) = p.state.next_action() else {
                return Ok(None);
            };
            match action {
                PollAction::StartAdvertising => {
                    p.start_advertising()?;
                    p.state.advertising_started();
                    info!("discoverable mode started");
                }
                PollAction::StopAdvertising => {
                    p.radio.command(&Command::set_non_discoverable(), &mut [])?;
                    p.state.advertising_stopped();
                    info!("discoverable mode stopped");
                }
                PollAction::ExchangeMtu(handle) => {
                    // Marked first: a failed exchange is not retried.
                    p.state.mtu_exchange_started();
                    p.radio
                        .command(&Command::exchange_configuration(handle), &mut [])?;
                    debug!("mtu exchange started on {:#x}", handle.0);
                }
            }
            Ok(Some(action))
        })
    }

    fn start_advertising(&mut self) -> Result<(), Error> {
        if let Err(e) = self
            .radio
            .command(&Command::set_scan_response_data(&[])?, &mut [])
        {
            warn!("clearing scan response failed: {:?}", e);
        }
        let adv = &self.config.advertising;
        let (conn_interval_min, conn_interval_max) = adv.conn_interval.unwrap_or((0, 0));
        let cmd = Command::set_discoverable(&DiscoverableParams {
            adv_type: adv.adv_type,
            interval_min: adv.interval_min,
            interval_max: adv.interval_max,
            own_address_type: adv.own_address_type,
            filter_policy: adv.filter_policy,
            local_name: self.name.as_bytes(),
            service_uuids: &[],
            conn_interval_min,
            conn_interval_max,
        })?;
        self.radio.command(&cmd, &mut [])?;
        Ok(())
    }

    /// Service pending events, then advance the state machine.
    pub fn process(&mut self) -> Result<Option<PollAction>, Error> {
        self.service();
        self.poll()
    }

    /// Active connection handle, zero when idle.
    #[must_use]
    pub fn conn_handle(&self) -> ConnectionHandle {
        self.state.connection().unwrap_or_default()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    #[must_use]
    pub fn discoverability(&self) -> Discoverability {
        self.state.discoverability()
    }

    #[must_use]
    pub fn mtu_exchange(&self) -> MtuExchange {
        self.state.mtu_exchange()
    }

    #[must_use]
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Error of the most recent fallible operation, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    #[must_use]
    pub fn local_name(&self) -> &AdvertisedName {
        &self.name
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }
}
