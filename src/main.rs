#![no_std]
#![no_main]

use static_cell::{ConstStaticCell, StaticCell};

use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, mutex::Mutex};
use embassy_time::{Duration, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{self as hal};
use esp_println::logger::init_logger;
use esp_wifi::EspWifiController;

use hal::{
    i2c::master::{BusTimeout, I2c},
    rng::Rng,
    time::Rate,
    timer::timg::TimerGroup,
    Async,
};

use relayboard_core::relay::{RelayBoard, RelaySettings};

pub mod config;
pub mod constants;
mod controller;
mod mqtt;
pub mod transport;
mod wifi;

use config::CONFIG;
use constants::*;
use controller::{Buffers, Controller};
use wifi::Wifi;

/// Expander handle on the shared I2C0 bus
pub type I2cBus = I2cDevice<'static, NoopRawMutex, I2c<'static, Async>>;

static I2C_BUS: StaticCell<Mutex<NoopRawMutex, I2c<'static, Async>>> = StaticCell::new();
static WIFI_INIT: StaticCell<EspWifiController<'static>> = StaticCell::new();
static BUFFERS: ConstStaticCell<Buffers> = ConstStaticCell::new(Buffers::new());

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    init_logger(log::LevelFilter::Info);
    log::info!("relayboard {} starting", VERSION);
    log::debug!("{:?}", CONFIG);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    let rng = Rng::new(peripherals.RNG);

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let timg1 = TimerGroup::new(peripherals.TIMG1);

    esp_hal_embassy::init(timg0.timer0);

    // Relays go to a known state before the radio draws any current
    let (sda, scl) = (peripherals.GPIO21, peripherals.GPIO22);

    let i2c_config = hal::i2c::master::Config::default()
        .with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ))
        .with_timeout(BusTimeout::BusCycles(24));

    let i2c = I2c::new(peripherals.I2C0, i2c_config)
        .unwrap()
        .with_sda(sda)
        .with_scl(scl)
        .into_async();

    let i2c_bus = I2C_BUS.init(Mutex::new(i2c));

    let relays = RelayBoard::new(
        I2cDevice::new(i2c_bus),
        RelaySettings {
            address: CONFIG.tca9554_address,
            count: CONFIG.relay_count,
            active_low: CONFIG.relay_active_low,
        },
    )
    .await
    .unwrap();

    // possibly high transient required at init
    // https://github.com/esp-rs/esp-hal/issues/1626
    Timer::after(Duration::from_millis(1000)).await;

    let wifi_init = WIFI_INIT.init(
        esp_wifi::init(timg1.timer0, rng.clone(), peripherals.RADIO_CLK).unwrap(),
    );

    let wifi = Wifi::new(wifi_init, peripherals.WIFI, rng.clone(), spawner)
        .await
        .unwrap();

    wifi.connect().await.unwrap();

    if !CONFIG.mqtt_enabled {
        log::info!("MQTT disabled, relays stay off");
        return;
    }

    let controller = Controller::new(wifi.stack, relays, BUFFERS.take()).unwrap();

    spawner.spawn(controller_task(controller)).ok();
}

#[embassy_executor::task]
async fn controller_task(mut controller: Controller) {
    controller.run().await
}
