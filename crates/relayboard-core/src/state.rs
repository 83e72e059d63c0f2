use heapless::String;
use serde::Serialize;

use crate::relay::RelayState;
use crate::MAX_RELAYS;

/// Room for the longest hostname and eight relays
pub const STATE_PAYLOAD_CAPACITY: usize = 160;

#[derive(Debug)]
pub enum Error {
    Serialize,
}

#[derive(Serialize)]
struct StatePayload<'a> {
    hostname: &'a str,
    relays: &'a [bool],
    mask: u8,
}

/// Renders the snapshot published on `<base>/state`, e.g.
/// `{"hostname":"relayboard","relays":[false,true],"mask":2}`.
pub fn render_state(
    hostname: &str,
    state: &RelayState,
) -> Result<String<STATE_PAYLOAD_CAPACITY>, Error> {
    let mut relays = [false; MAX_RELAYS as usize];
    for (slot, on) in relays.iter_mut().zip(state.iter()) {
        *slot = on;
    }

    let payload = StatePayload {
        hostname,
        relays: &relays[..state.count() as usize],
        mask: state.mask(),
    };

    serde_json_core::to_string(&payload).map_err(|_| Error::Serialize)
}
