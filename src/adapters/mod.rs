//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements        | Connects to               |
//! |-------------|-------------------|---------------------------|
//! | `ble`       | AdvertisingPort   | Bluedroid GATT server     |
//! |             | ResponderPort     |                           |
//! | `log_sink`  | EventSink         | Serial log output         |
//! | `nvs`       | SettingsPort      | NVS / in-memory store     |
//! | `time`      | (clock)           | ESP32 system timer        |
//! | `device_id` | (identity)        | eFuse factory MAC         |

pub mod ble;
pub mod device_id;
pub mod log_sink;
pub mod nvs;
pub mod time;
