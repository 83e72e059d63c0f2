use core::fmt;

use crate::topic::Topics;
use crate::{MAX_RELAYS, MQTT_KEEP_ALIVE_SECS};

/// Maximum DHCP hostname length accepted by the network stack
pub const HOSTNAME_MAX_LEN: usize = 32;

pub struct Config<'a> {
    // Wi-Fi SSID to connect to
    pub wifi_ssid: &'a str,

    // Wi-Fi pre-shared key (password), empty for an open network
    pub wifi_psk: &'a str,

    // Host name announced over DHCP
    pub hostname: &'a str,

    // 7-bit I2C address of the TCA9554 GPIO expander
    pub tca9554_address: u8,

    // Number of relays wired to the expander, starting at P0
    pub relay_count: u8,

    // Relays switch on when the expander pin is driven low
    pub relay_active_low: bool,

    // Enables the MQTT controller
    pub mqtt_enabled: bool,

    // MQTT broker hostname or IP address
    pub mqtt_hostname: &'a str,

    // MQTT port (usually 1883)
    pub mqtt_port: u16,

    // MQTT username for authentication, empty to connect anonymously
    pub mqtt_username: &'a str,

    // MQTT password for authentication
    pub mqtt_password: &'a str,

    // MQTT client identifier
    pub mqtt_client_id: &'a str,

    // Prefix of every topic the board publishes or subscribes to
    pub mqtt_base_topic: &'a str,

    // Interval between two full state publications, in milliseconds
    pub mqtt_state_interval_ms: u32,

    // Delay before reconnecting to the broker after a failure, in milliseconds
    pub mqtt_reconnect_interval_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    WifiSsidLength(usize),
    WifiPskLength(usize),
    HostnameLength(usize),
    HostnameInvalid,
    Tca9554Address(u8),
    RelayCount(u8),
    MqttHostnameMissing,
    MqttPortZero,
    MqttClientIdMissing,
    MqttBaseTopicInvalid,
    MqttStateInterval(u32),
    MqttReconnectInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiSsidLength(len) => write!(f, "wifi_ssid must be 1 to 32 bytes, got {len}"),
            Self::WifiPskLength(len) => {
                write!(f, "wifi_psk must be empty or 8 to 64 bytes, got {len}")
            }
            Self::HostnameLength(len) => write!(
                f,
                "hostname must be 1 to {HOSTNAME_MAX_LEN} bytes, got {len}"
            ),
            Self::HostnameInvalid => write!(
                f,
                "hostname may only contain letters, digits and inner dashes"
            ),
            Self::Tca9554Address(addr) => write!(
                f,
                "tca9554_address {addr:#04x} is outside 0x20..=0x27 and 0x38..=0x3f"
            ),
            Self::RelayCount(count) => {
                write!(f, "relay_count must be 1 to {MAX_RELAYS}, got {count}")
            }
            Self::MqttHostnameMissing => write!(f, "mqtt_hostname is empty"),
            Self::MqttPortZero => write!(f, "mqtt_port must not be 0"),
            Self::MqttClientIdMissing => write!(f, "mqtt_client_id is empty"),
            Self::MqttBaseTopicInvalid => write!(
                f,
                "mqtt_base_topic must be a non-empty topic without wildcards or outer slashes"
            ),
            Self::MqttStateInterval(ms) => write!(
                f,
                "mqtt_state_interval_ms must be between 1 and {} ms, got {ms}",
                MQTT_KEEP_ALIVE_SECS as u32 * 1000 - 1
            ),
            Self::MqttReconnectInterval => write!(f, "mqtt_reconnect_interval_ms must not be 0"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl Config<'_> {
    /// Checks every value the firmware relies on.
    ///
    /// MQTT settings are only checked when `mqtt_enabled` is set, so a board
    /// without a broker can leave them empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ssid_len = self.wifi_ssid.len();
        if ssid_len == 0 || ssid_len > 32 {
            return Err(ConfigError::WifiSsidLength(ssid_len));
        }

        let psk_len = self.wifi_psk.len();
        if psk_len != 0 && !(8..=64).contains(&psk_len) {
            return Err(ConfigError::WifiPskLength(psk_len));
        }

        validate_hostname(self.hostname)?;

        if !is_tca9554_address(self.tca9554_address) {
            return Err(ConfigError::Tca9554Address(self.tca9554_address));
        }

        if self.relay_count == 0 || self.relay_count > MAX_RELAYS {
            return Err(ConfigError::RelayCount(self.relay_count));
        }

        if self.mqtt_enabled {
            self.validate_mqtt()?;
        }

        Ok(())
    }

    fn validate_mqtt(&self) -> Result<(), ConfigError> {
        if self.mqtt_hostname.trim().is_empty() {
            return Err(ConfigError::MqttHostnameMissing);
        }
        if self.mqtt_port == 0 {
            return Err(ConfigError::MqttPortZero);
        }
        if self.mqtt_client_id.is_empty() {
            return Err(ConfigError::MqttClientIdMissing);
        }

        Topics::new(self.mqtt_base_topic).map_err(|_| ConfigError::MqttBaseTopicInvalid)?;

        // The periodic state publication doubles as keep-alive traffic
        let keep_alive_ms = MQTT_KEEP_ALIVE_SECS as u32 * 1000;
        if self.mqtt_state_interval_ms == 0 || self.mqtt_state_interval_ms >= keep_alive_ms {
            return Err(ConfigError::MqttStateInterval(self.mqtt_state_interval_ms));
        }

        if self.mqtt_reconnect_interval_ms == 0 {
            return Err(ConfigError::MqttReconnectInterval);
        }

        Ok(())
    }
}

impl fmt::Debug for Config<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("wifi_ssid", &self.wifi_ssid)
            .field("wifi_psk", &"<redacted>")
            .field("hostname", &self.hostname)
            .field("tca9554_address", &self.tca9554_address)
            .field("relay_count", &self.relay_count)
            .field("relay_active_low", &self.relay_active_low)
            .field("mqtt_enabled", &self.mqtt_enabled)
            .field("mqtt_hostname", &self.mqtt_hostname)
            .field("mqtt_port", &self.mqtt_port)
            .field("mqtt_username", &self.mqtt_username)
            .field("mqtt_password", &"<redacted>")
            .field("mqtt_client_id", &self.mqtt_client_id)
            .field("mqtt_base_topic", &self.mqtt_base_topic)
            .field("mqtt_state_interval_ms", &self.mqtt_state_interval_ms)
            .field("mqtt_reconnect_interval_ms", &self.mqtt_reconnect_interval_ms)
            .finish()
    }
}

/// TCA9554 answers on 0x20..=0x27, the TCA9554A variant on 0x38..=0x3F.
pub fn is_tca9554_address(address: u8) -> bool {
    matches!(address, 0x20..=0x27 | 0x38..=0x3F)
}

fn validate_hostname(hostname: &str) -> Result<(), ConfigError> {
    let len = hostname.len();
    if len == 0 || len > HOSTNAME_MAX_LEN {
        return Err(ConfigError::HostnameLength(len));
    }

    let valid_chars = hostname
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-');
    if !valid_chars || hostname.starts_with('-') || hostname.ends_with('-') {
        return Err(ConfigError::HostnameInvalid);
    }

    Ok(())
}
