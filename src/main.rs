//! CropWatch field node firmware: main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  FieldHardware                       HttpAlertTransport       │
//! │  (Sensor+Battery+Status+Clock+Timer) (AlertTransport)         │
//! │  LogEventSink (EventSink)                                     │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ───────────────────     │
//! │                                                               │
//! │  ┌───────────────────────────────────────────────────────┐    │
//! │  │          AppService (pure pipeline logic)             │    │
//! │  │  features · quantizer · classifier · policy · alerts  │    │
//! │  └───────────────────────────────────────────────────────┘    │
//! │                                                               │
//! │  PowerScheduler (ACTIVE ⇄ SLEEPING duty cycle)                │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use cropwatch::adapters::device_id;
use cropwatch::adapters::hardware::FieldHardware;
use cropwatch::adapters::http::HttpAlertTransport;
use cropwatch::adapters::log_sink::LogEventSink;
use cropwatch::adapters::sleep::SleepTimer;
use cropwatch::adapters::time::SystemClock;
use cropwatch::app::service::AppService;
use cropwatch::config::SystemConfig;
use cropwatch::drivers::analog::{AdcChannel, AdcMicrophone};
use cropwatch::drivers::hw_init;
use cropwatch::drivers::status_led::StatusLed;
use cropwatch::ml::engine::DenseInt8Engine;
use cropwatch::pins;
use cropwatch::scheduler::PowerScheduler;
use cropwatch::sensors::SensorHub;
use cropwatch::sensors::audio::AudioEnergyMeter;
use cropwatch::sensors::battery::BatteryMonitor;
use cropwatch::sensors::sht31::{self, Sht31};
use cropwatch::sensors::soil::SoilMoistureSensor;

/// Provisioned at build time.
const WIFI_SSID: Option<&str> = option_env!("CROPWATCH_WIFI_SSID");
const WIFI_PASSWORD: Option<&str> = option_env!("CROPWATCH_WIFI_PASSWORD");
const CONFIG_JSON: Option<&str> = option_env!("CROPWATCH_CONFIG_JSON");

/// Park the core after a fatal startup error; the task watchdog or an
/// operator power cycle takes it from here.
fn halt() -> ! {
    loop {
        FreeRtos::delay_ms(60_000);
    }
}

fn load_config() -> Result<SystemConfig> {
    match CONFIG_JSON {
        Some(json) => {
            let config = SystemConfig::from_json(json.as_bytes()).map_err(|e| anyhow!("{e}"))?;
            info!("Config: provisioned overrides applied");
            Ok(config)
        }
        None => {
            info!("Config: defaults");
            Ok(SystemConfig::default())
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CropWatch v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Config rejected: {}, halting", e);
            halt();
        }
    };

    let mac = device_id::read_mac();
    let id = device_id::device_id(&mac);
    info!("Device: {}", id);

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}, halting", e);
        halt();
    }

    let peripherals = Peripherals::take()?;
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;
    let sensors = SensorHub::new(
        Sht31::new(i2c, sht31::DEFAULT_ADDRESS),
        SoilMoistureSensor::new(AdcChannel::soil()),
        AudioEnergyMeter::new(AdcMicrophone::new()),
        PinDriver::output(peripherals.pins.gpio10)?,
    );
    let battery = BatteryMonitor::new(AdcChannel::battery(), pins::BATTERY_DIVIDER_RATIO);
    let leds = StatusLed::new(
        PinDriver::output(peripherals.pins.gpio11)?,
        PinDriver::output(peripherals.pins.gpio12)?,
    );
    let mut hw = FieldHardware::new(sensors, battery, leds, SystemClock::new(), SleepTimer::new());

    // ── 3. Wi-Fi station + alert transport ────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    match (WIFI_SSID, WIFI_PASSWORD) {
        (Some(ssid), password) => {
            let password = password.unwrap_or("");
            wifi.set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: ssid.try_into().map_err(|()| anyhow!("SSID too long"))?,
                password: password.try_into().map_err(|()| anyhow!("password too long"))?,
                auth_method: if password.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            }))?;
        }
        (None, _) => warn!("Wi-Fi: no credentials provisioned, alerts will fail to connect"),
    }
    wifi.start()?;

    let mut transport = match HttpAlertTransport::new(wifi, &config) {
        Ok(t) => t,
        Err(e) => {
            error!("Alert endpoint invalid: {}, halting", e);
            halt();
        }
    };
    info!("Alerts: {}{}", transport.endpoint(), config.alert_path);

    // ── 4. Pipeline ───────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut scheduler = PowerScheduler::new(&config);
    let mut service = AppService::new(config, DenseInt8Engine::new(), &id);

    if let Err(e) = service.start(&mut sink) {
        error!("Startup failed: {}, halting", e);
        halt();
    }

    // ── 5. Duty cycle ─────────────────────────────────────────
    loop {
        scheduler.step(&mut service, &mut hw, &mut transport, &mut sink);
    }
}
