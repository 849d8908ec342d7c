#![no_std]
#![no_main]

use bnrg_core::{
    Characteristic, CharacteristicSpec, Error, HciLink, Peripheral, SpiTransport,
};
use bnrg_proto::{CharProperties, Uuid};
use bnrg_rp2040::{AppEvents, EmbassyClock, NvicGate};
use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Config as SpiConfig, Spi};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Duration, Ticker};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

type RadioTransport = SpiTransport<
    Spi<'static, SPI0, Blocking>,
    Output<'static>,
    Output<'static>,
    Input<'static>,
    Delay,
    EmbassyClock,
    NvicGate,
>;

type Ble = Peripheral<HciLink<RadioTransport, EmbassyClock>, AppEvents, EmbassyClock>;

/// Custom service carrying the sample counter.
const SERVICE_UUID: &str = "0B3F0001A5C94C5E8E2D6F1B2C3D4E5F";
const SAMPLE_UUID: &str = "0B3F0002A5C94C5E8E2D6F1B2C3D4E5F";

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Latest sample, consumed by the radio task.
static SAMPLE_SIGNAL: StaticCell<Signal<CriticalSectionRawMutex, u32>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("BlueNRG-M0 peripheral starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let signal = SAMPLE_SIGNAL.init(Signal::new());

    // --- SPI Setup ---
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = 1_000_000;

    let spi = Spi::new_blocking(
        p.SPI0,
        p.PIN_18, // SCK
        p.PIN_19, // MOSI
        p.PIN_16, // MISO
        spi_config,
    );
    let cs = Output::new(p.PIN_17, Level::High);
    let reset = Output::new(p.PIN_20, Level::High);
    let data_ready = Input::new(p.PIN_21, Pull::Down);

    // --- Radio Setup ---
    let transport = SpiTransport::new(spi, cs, reset, data_ready, Delay, EmbassyClock, NvicGate);
    let mut ble = Peripheral::new(
        HciLink::new(transport, EmbassyClock),
        AppEvents::default(),
        EmbassyClock,
    );

    let sample = match bring_up(&mut ble) {
        Ok(sample) => sample,
        Err(e) => {
            error!("Radio bring-up failed: {:?}", e);
            return;
        }
    };

    // On-board LED mirrors the connection state
    let led = Output::new(p.PIN_25, Level::Low);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(radio_task(ble, sample, signal, led).unwrap());
    spawner.spawn(sample_task(signal).unwrap());

    info!("Advertising, waiting for a central...");
}

/// Reset the radio and register the demo service.
fn bring_up(ble: &mut Ble) -> Result<Characteristic, Error> {
    ble.init(None)?;
    ble.set_tx_power(true, 4)?;
    ble.stack_init()?;

    let service = ble.add_service(&Uuid::parse(SERVICE_UUID)?, 1)?;
    let sample = ble.add_characteristic(
        &service,
        &CharacteristicSpec::new(
            Uuid::parse(SAMPLE_UUID)?,
            4,
            CharProperties::READ | CharProperties::NOTIFY,
        ),
    )?;
    ble.handler_mut().watch(sample.cccd_handle());

    ble.set_local_name(b"BNRG-Pico");
    ble.set_connectable_mode(true);
    Ok(sample)
}

/// Radio task - drains events on data-ready and drives the state machine.
#[embassy_executor::task]
async fn radio_task(
    mut ble: Ble,
    sample: Characteristic,
    signal: &'static Signal<CriticalSectionRawMutex, u32>,
    mut led: Output<'static>,
) {
    let mut ticker = Ticker::every(POLL_INTERVAL);

    loop {
        let data_ready = ble.radio_mut().transport_mut().data_ready_pin();
        let woke = select(data_ready.wait_for_high(), ticker.next()).await;

        match woke {
            Either::First(()) => {
                ble.service();
            }
            Either::Second(()) => {
                if let Err(e) = ble.process() {
                    warn!("Poll error: {:?}", e);
                }
            }
        }

        led.set_level(if ble.is_connected() {
            Level::High
        } else {
            Level::Low
        });

        // Only the latest sample matters; older ones were overwritten
        if let Some(value) = signal.try_take() {
            if ble.is_connected() && ble.handler().notify_enabled() {
                let connection = ble.conn_handle();
                if let Err(e) = ble.update_char_value(connection, &sample, &value.to_le_bytes()) {
                    error!("Update error: {:?}", e);
                }
            }
        }
    }
}

/// Sample task - produces a counter value at a fixed rate.
#[embassy_executor::task]
async fn sample_task(signal: &'static Signal<CriticalSectionRawMutex, u32>) {
    let mut ticker = Ticker::every(SAMPLE_INTERVAL);
    let mut counter: u32 = 0;

    loop {
        ticker.next().await;
        counter = counter.wrapping_add(1);
        signal.signal(counter);
    }
}
