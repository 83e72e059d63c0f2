#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![allow(async_fn_in_trait)]

#[cfg(any(test, feature = "cfg-file"))]
pub mod cfg_file;
pub mod command;
pub mod config;
pub mod publish;
pub mod relay;
pub mod state;
pub mod tca9554;
pub mod topic;

/// MQTT keep-alive negotiated with the broker, in seconds
pub const MQTT_KEEP_ALIVE_SECS: u16 = 60;

/// Highest number of relays a single TCA9554 can drive
pub const MAX_RELAYS: u8 = 8;
