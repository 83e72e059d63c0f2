//! `cfg.toml` as written by the board owner, before validation.

use serde::Deserialize;

use crate::config::Config;

#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub wifi_ssid: String,
    pub wifi_psk: String,
    pub hostname: String,
    pub tca9554_address: u8,
    #[serde(default = "default_relay_count")]
    pub relay_count: u8,
    #[serde(default)]
    pub relay_active_low: bool,
    // Older board configs predate the flag and always ran MQTT
    #[serde(default = "default_mqtt_enabled")]
    pub mqtt_enabled: bool,
    #[serde(default)]
    pub mqtt_hostname: String,
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,
    #[serde(default)]
    pub mqtt_username: String,
    #[serde(default)]
    pub mqtt_password: String,
    #[serde(default)]
    pub mqtt_client_id: String,
    #[serde(default)]
    pub mqtt_base_topic: String,
    #[serde(default = "default_mqtt_state_interval_ms")]
    pub mqtt_state_interval_ms: u32,
    #[serde(default = "default_mqtt_reconnect_interval_ms")]
    pub mqtt_reconnect_interval_ms: u32,
}

fn default_relay_count() -> u8 {
    8
}

fn default_mqtt_enabled() -> bool {
    true
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_state_interval_ms() -> u32 {
    59000
}

fn default_mqtt_reconnect_interval_ms() -> u32 {
    60000
}

impl RawConfig {
    pub fn parse(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    pub fn as_config(&self) -> Config<'_> {
        Config {
            wifi_ssid: &self.wifi_ssid,
            wifi_psk: &self.wifi_psk,
            hostname: &self.hostname,
            tca9554_address: self.tca9554_address,
            relay_count: self.relay_count,
            relay_active_low: self.relay_active_low,
            mqtt_enabled: self.mqtt_enabled,
            mqtt_hostname: &self.mqtt_hostname,
            mqtt_port: self.mqtt_port,
            mqtt_username: &self.mqtt_username,
            mqtt_password: &self.mqtt_password,
            mqtt_client_id: &self.mqtt_client_id,
            mqtt_base_topic: &self.mqtt_base_topic,
            mqtt_state_interval_ms: self.mqtt_state_interval_ms,
            mqtt_reconnect_interval_ms: self.mqtt_reconnect_interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // First header variant, no MQTT_ENABLED
    const WITHOUT_FLAG: &str = r#"
        wifi_ssid = "Denis_Private"
        wifi_psk = "89dorpcj"
        hostname = "relayboard"
        tca9554_address = 0x20
        mqtt_hostname = "192.168.0.94"
        mqtt_port = 1883
        mqtt_username = "mqtt_user"
        mqtt_password = "mqtt_password"
        mqtt_client_id = "mqtt_client_id"
        mqtt_base_topic = "relayboard"
        mqtt_state_interval_ms = 59000
        mqtt_reconnect_interval_ms = 60000
    "#;

    fn with_flag(enabled: bool) -> String {
        format!("mqtt_enabled = {enabled}\n{WITHOUT_FLAG}")
    }

    fn assert_shared_fields_eq(a: &Config<'_>, b: &Config<'_>) {
        assert_eq!(a.wifi_ssid, b.wifi_ssid);
        assert_eq!(a.wifi_psk, b.wifi_psk);
        assert_eq!(a.hostname, b.hostname);
        assert_eq!(a.tca9554_address, b.tca9554_address);
        assert_eq!(a.relay_count, b.relay_count);
        assert_eq!(a.relay_active_low, b.relay_active_low);
        assert_eq!(a.mqtt_hostname, b.mqtt_hostname);
        assert_eq!(a.mqtt_port, b.mqtt_port);
        assert_eq!(a.mqtt_username, b.mqtt_username);
        assert_eq!(a.mqtt_password, b.mqtt_password);
        assert_eq!(a.mqtt_client_id, b.mqtt_client_id);
        assert_eq!(a.mqtt_base_topic, b.mqtt_base_topic);
        assert_eq!(a.mqtt_state_interval_ms, b.mqtt_state_interval_ms);
        assert_eq!(a.mqtt_reconnect_interval_ms, b.mqtt_reconnect_interval_ms);
    }

    #[test]
    fn test_both_variants_agree() {
        let without = RawConfig::parse(WITHOUT_FLAG).unwrap();
        let with = RawConfig::parse(&with_flag(true)).unwrap();

        let (without, with) = (without.as_config(), with.as_config());
        assert!(without.mqtt_enabled);
        assert!(with.mqtt_enabled);
        assert_shared_fields_eq(&without, &with);

        assert_eq!(without.validate(), Ok(()));
        assert_eq!(with.validate(), Ok(()));
    }

    #[test]
    fn test_header_values_are_carried() {
        let raw = RawConfig::parse(WITHOUT_FLAG).unwrap();
        let config = raw.as_config();

        assert_eq!(config.tca9554_address, 0x20);
        assert_eq!(config.mqtt_hostname, "192.168.0.94");
        assert_eq!(config.mqtt_state_interval_ms, 59000);
        assert_eq!(config.mqtt_reconnect_interval_ms, 60000);
        assert_eq!(config.relay_count, 8);
        assert!(!config.relay_active_low);
    }

    #[test]
    fn test_disabled_board_needs_no_mqtt_keys() {
        let raw = RawConfig::parse(
            r#"
            mqtt_enabled = false
            wifi_ssid = "Denis_Private"
            wifi_psk = "89dorpcj"
            hostname = "relayboard"
            tca9554_address = 0x20
            "#,
        )
        .unwrap();
        let config = raw.as_config();

        assert!(!config.mqtt_enabled);
        assert_eq!(config.mqtt_state_interval_ms, 59000);
        assert_eq!(config.mqtt_reconnect_interval_ms, 60000);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_disabling_mqtt_keeps_shared_values() {
        let enabled = RawConfig::parse(&with_flag(true)).unwrap();
        let disabled = RawConfig::parse(&with_flag(false)).unwrap();

        assert!(!disabled.as_config().mqtt_enabled);
        assert_shared_fields_eq(&enabled.as_config(), &disabled.as_config());
    }

    #[test]
    fn test_missing_required_key() {
        assert!(RawConfig::parse("wifi_ssid = \"x\"").is_err());
    }
}
