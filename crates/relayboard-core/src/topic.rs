//! MQTT topic layout of the board.
//!
//! ```text
//! <base>/availability       online | offline (retained, last will)
//! <base>/state              JSON snapshot of every relay
//! <base>/set                command for all relays
//! <base>/relay/<n>/state    ON | OFF (retained), n starts at 1
//! <base>/relay/<n>/set      command for one relay
//! ```

use core::fmt::Write;

use heapless::String;

use crate::command::{Action, Command, CommandError, Target};
use crate::MAX_RELAYS;

/// Longest base topic accepted
pub const BASE_TOPIC_MAX_LEN: usize = 48;
/// Capacity of a derived topic, base plus the longest suffix
pub const TOPIC_CAPACITY: usize = 64;

pub type Topic = String<TOPIC_CAPACITY>;

pub const AVAILABILITY_ONLINE: &str = "online";
pub const AVAILABILITY_OFFLINE: &str = "offline";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicError {
    Empty,
    TooLong,
    Wildcard,
    Slash,
}

#[derive(Debug)]
pub struct Topics {
    base: Topic,
    availability: Topic,
    state: Topic,
    all_command: Topic,
    relay_command_filter: Topic,
}

impl Topics {
    pub fn new(base: &str) -> Result<Self, TopicError> {
        if base.is_empty() {
            return Err(TopicError::Empty);
        }
        if base.len() > BASE_TOPIC_MAX_LEN {
            return Err(TopicError::TooLong);
        }
        if base.contains(['+', '#', '\0']) {
            return Err(TopicError::Wildcard);
        }
        if base.starts_with('/') || base.ends_with('/') {
            return Err(TopicError::Slash);
        }

        Ok(Self {
            base: join(base, "")?,
            availability: join(base, "/availability")?,
            state: join(base, "/state")?,
            all_command: join(base, "/set")?,
            relay_command_filter: join(base, "/relay/+/set")?,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn availability(&self) -> &str {
        &self.availability
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn all_command(&self) -> &str {
        &self.all_command
    }

    pub fn relay_command_filter(&self) -> &str {
        &self.relay_command_filter
    }

    /// `<base>/relay/<index + 1>/state`
    pub fn relay_state(&self, index: u8) -> Result<Topic, TopicError> {
        let mut topic = Topic::new();
        write!(topic, "{}/relay/{}/state", self.base, index as u16 + 1)
            .map_err(|_| TopicError::TooLong)?;
        Ok(topic)
    }

    /// Maps an incoming publication to a command for a board with
    /// `relay_count` relays.
    pub fn parse_command(
        &self,
        topic: &str,
        payload: &[u8],
        relay_count: u8,
    ) -> Result<Command, CommandError> {
        let target = self.parse_target(topic, relay_count)?;
        let action = Action::parse(payload)?;
        Ok(Command { target, action })
    }

    fn parse_target(&self, topic: &str, relay_count: u8) -> Result<Target, CommandError> {
        if topic == self.all_command.as_str() {
            return Ok(Target::All);
        }

        let relay = topic
            .strip_prefix(self.base.as_str())
            .and_then(|rest| rest.strip_prefix("/relay/"))
            .and_then(|rest| rest.strip_suffix("/set"))
            .ok_or(CommandError::UnknownTopic)?;

        // Wire numbering starts at 1, written without leading zeros
        if relay.starts_with('0') || !relay.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CommandError::InvalidRelay);
        }
        let number: u8 = relay.parse().map_err(|_| CommandError::InvalidRelay)?;
        if number == 0 || number > relay_count.min(MAX_RELAYS) {
            return Err(CommandError::InvalidRelay);
        }
        Ok(Target::Relay(number - 1))
    }
}

fn join(base: &str, suffix: &str) -> Result<Topic, TopicError> {
    let mut topic = Topic::new();
    topic.push_str(base).map_err(|_| TopicError::TooLong)?;
    topic.push_str(suffix).map_err(|_| TopicError::TooLong)?;
    Ok(topic)
}
