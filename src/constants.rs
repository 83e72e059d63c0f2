/// Current firmware version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the heap in DRAM, mostly used by the Wi-Fi driver
pub const HEAP_SIZE: usize = 72 * 1024;

/// I2C bus frequency in kHz (TCA9554 supports up to 400 kHz)
pub const I2C_FREQUENCY_KHZ: u32 = 100;

/// Size of the TCP socket receive buffer
pub const RX_BUFFER_SIZE: usize = 2048;
/// Size of the TCP socket transmit buffer
pub const TX_BUFFER_SIZE: usize = 2048;
/// TCP socket inactivity timeout, longer than the MQTT keep-alive
pub const SOCKET_TIMEOUT_SECS: u64 = 90;

/// Size of the MQTT client receive buffer for application data
pub const MQTT_RX_BUFFER_SIZE: usize = 1024;
/// Size of the MQTT client transmit buffer for application data
pub const MQTT_TX_BUFFER_SIZE: usize = 1024;
/// Maximum number of MQTT v5 properties per packet
pub const MQTT_MAX_PROPERTIES: usize = 5;

/// Delay before retrying the Wi-Fi association
pub const WIFI_RECONNECT_DELAY_MS: u64 = 5000;
/// Time allowed for a single association attempt
pub const WIFI_CONNECT_TIMEOUT_SECS: u64 = 30;
