/// Which relays a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// 0-based relay index
    Relay(u8),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub target: Target,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    UnknownTopic,
    InvalidRelay,
    InvalidPayload,
}

impl Action {
    /// Accepts `ON`/`1`/`TRUE`, `OFF`/`0`/`FALSE` and `TOGGLE`, ignoring case
    /// and surrounding whitespace.
    pub fn parse(payload: &[u8]) -> Result<Self, CommandError> {
        let payload = payload.trim_ascii();

        const ON: [&[u8]; 3] = [b"on", b"1", b"true"];
        const OFF: [&[u8]; 3] = [b"off", b"0", b"false"];

        if ON.iter().any(|word| payload.eq_ignore_ascii_case(word)) {
            Ok(Action::On)
        } else if OFF.iter().any(|word| payload.eq_ignore_ascii_case(word)) {
            Ok(Action::Off)
        } else if payload.eq_ignore_ascii_case(b"toggle") {
            Ok(Action::Toggle)
        } else {
            Err(CommandError::InvalidPayload)
        }
    }
}

/// Payload published on per-relay state topics.
pub fn state_word(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(Action::parse(b"ON"), Ok(Action::On));
        assert_eq!(Action::parse(b"on"), Ok(Action::On));
        assert_eq!(Action::parse(b"1"), Ok(Action::On));
        assert_eq!(Action::parse(b"True"), Ok(Action::On));
        assert_eq!(Action::parse(b"OFF"), Ok(Action::Off));
        assert_eq!(Action::parse(b"0"), Ok(Action::Off));
        assert_eq!(Action::parse(b"false"), Ok(Action::Off));
        assert_eq!(Action::parse(b"Toggle"), Ok(Action::Toggle));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Action::parse(b"  on\r\n"), Ok(Action::On));
        assert_eq!(Action::parse(b"\toff "), Ok(Action::Off));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Action::parse(b""), Err(CommandError::InvalidPayload));
        assert_eq!(Action::parse(b"onn"), Err(CommandError::InvalidPayload));
        assert_eq!(Action::parse(b"2"), Err(CommandError::InvalidPayload));
        assert_eq!(Action::parse(b"{\"state\":\"ON\"}"), Err(CommandError::InvalidPayload));
    }

    #[test]
    fn test_state_word() {
        assert_eq!(state_word(true), "ON");
        assert_eq!(state_word(false), "OFF");
    }
}
