//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                       | Connects to                 |
//! |-------------|----------------------------------|-----------------------------|
//! | `hardware`  | SensorPort, BatteryPort,         | SensorHub, BatteryMonitor,  |
//! |             | StatusPort, ClockPort, TimerPort | StatusLed, clock, timer     |
//! | `http`      | AlertTransport                   | Wi-Fi STA + HTTPS client    |
//! | `log_sink`  | EventSink                        | Serial log output           |
//! | `sleep`     | TimerPort                        | ESP32 light sleep           |
//! | `time`      | ClockPort                        | ESP32 high-resolution timer |
//! | `device_id` | (free functions)                 | eFuse factory MAC           |

pub mod device_id;
pub mod hardware;
pub mod http;
pub mod log_sink;
pub mod sleep;
pub mod time;
