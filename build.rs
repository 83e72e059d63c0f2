use std::{env, error::Error, fs, path::Path};

use relayboard_core::cfg_file::RawConfig;

fn main() -> Result<(), Box<dyn Error>> {
    // Tell Cargo to rerun if toml changes
    println!("cargo:rerun-if-changed=cfg.toml");

    // Read and parse
    let toml_str = fs::read_to_string("cfg.toml")?;
    let raw = RawConfig::parse(&toml_str)?;
    let config = raw.as_config();

    // Reject the build instead of flashing a board that cannot work
    config
        .validate()
        .map_err(|e| format!("invalid cfg.toml: {e}"))?;

    // Generate Rust code
    let code = format!(
        r#"
        pub const CONFIG: Config<'static> = Config {{
            wifi_ssid: {ssid:?},
            wifi_psk: {psk:?},
            hostname: {host:?},
            tca9554_address: {addr:#04x},
            relay_count: {count},
            relay_active_low: {low},
            mqtt_enabled: {me},
            mqtt_hostname: {mh:?},
            mqtt_port: {mp},
            mqtt_username: {mu:?},
            mqtt_password: {mpw:?},
            mqtt_client_id: {mc:?},
            mqtt_base_topic: {mt:?},
            mqtt_state_interval_ms: {msi},
            mqtt_reconnect_interval_ms: {mri},
        }};
    "#,
        ssid = config.wifi_ssid,
        psk = config.wifi_psk,
        host = config.hostname,
        addr = config.tca9554_address,
        count = config.relay_count,
        low = config.relay_active_low,
        me = config.mqtt_enabled,
        mh = config.mqtt_hostname,
        mp = config.mqtt_port,
        mu = config.mqtt_username,
        mpw = config.mqtt_password,
        mc = config.mqtt_client_id,
        mt = config.mqtt_base_topic,
        msi = config.mqtt_state_interval_ms,
        mri = config.mqtt_reconnect_interval_ms,
    );

    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    fs::write(dest_path, code)?;
    Ok(())
}
