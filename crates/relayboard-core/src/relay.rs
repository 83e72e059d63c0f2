use embedded_hal_async::i2c::I2c;
use log::{debug, info};

use crate::command::{Action, Command, Target};
use crate::tca9554::{self, Tca9554};
use crate::MAX_RELAYS;

#[derive(Debug, PartialEq, Eq)]
pub enum RelayError<E> {
    Expander(tca9554::Error<E>),
    InvalidCount(u8),
    InvalidIndex(u8),
}

impl<E> From<tca9554::Error<E>> for RelayError<E> {
    fn from(error: tca9554::Error<E>) -> Self {
        RelayError::Expander(error)
    }
}

/// Logical on/off state of every relay, bit `n` is relay `n` (0-based).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayState {
    bits: u8,
    count: u8,
}

impl RelayState {
    pub fn new(count: u8) -> Self {
        Self {
            bits: 0,
            count: count.min(MAX_RELAYS),
        }
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn mask(&self) -> u8 {
        self.bits
    }

    pub fn is_on(&self, index: u8) -> bool {
        index < self.count && self.bits & (1 << index) != 0
    }

    pub fn set(&mut self, index: u8, on: bool) {
        if index >= self.count {
            return;
        }
        if on {
            self.bits |= 1 << index;
        } else {
            self.bits &= !(1 << index);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.count).map(move |index| self.is_on(index))
    }

    fn pin_mask(count: u8) -> u8 {
        if count >= 8 {
            0xFF
        } else {
            (1u8 << count) - 1
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RelaySettings {
    pub address: u8,
    pub count: u8,
    pub active_low: bool,
}

/// Relays wired to pins P0..P(count-1) of a TCA9554.
pub struct RelayBoard<I2C> {
    expander: Tca9554<I2C>,
    active_low: bool,
    state: RelayState,
}

impl<I2C: I2c> RelayBoard<I2C> {
    /// Brings every relay to off before the pins become outputs, so nothing
    /// clicks on boot.
    pub async fn new(i2c: I2C, settings: RelaySettings) -> Result<Self, RelayError<I2C::Error>> {
        if settings.count == 0 || settings.count > MAX_RELAYS {
            return Err(RelayError::InvalidCount(settings.count));
        }

        let expander = Tca9554::new(i2c, settings.address)?;
        info!(
            "Initialising TCA9554 at {:#04x} with {} relays...",
            expander.address(),
            settings.count
        );

        let mut board = Self {
            expander,
            active_low: settings.active_low,
            state: RelayState::new(settings.count),
        };

        board.write_state(board.state).await?;
        board.expander.set_polarity(0x00).await?;
        board
            .expander
            .set_direction(!RelayState::pin_mask(settings.count))
            .await?;

        info!("Initialised TCA9554, all relays off");

        Ok(board)
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn count(&self) -> u8 {
        self.state.count
    }

    pub async fn set(&mut self, index: u8, on: bool) -> Result<RelayState, RelayError<I2C::Error>> {
        self.check_index(index)?;
        let mut next = self.state;
        next.set(index, on);
        self.commit(next).await
    }

    pub async fn toggle(&mut self, index: u8) -> Result<RelayState, RelayError<I2C::Error>> {
        self.check_index(index)?;
        let on = !self.state.is_on(index);
        self.set(index, on).await
    }

    pub async fn set_all(&mut self, on: bool) -> Result<RelayState, RelayError<I2C::Error>> {
        let mut next = self.state;
        for index in 0..next.count {
            next.set(index, on);
        }
        self.commit(next).await
    }

    pub async fn apply(&mut self, command: Command) -> Result<RelayState, RelayError<I2C::Error>> {
        match (command.target, command.action) {
            (Target::Relay(index), Action::On) => self.set(index, true).await,
            (Target::Relay(index), Action::Off) => self.set(index, false).await,
            (Target::Relay(index), Action::Toggle) => self.toggle(index).await,
            (Target::All, Action::On) => self.set_all(true).await,
            (Target::All, Action::Off) => self.set_all(false).await,
            (Target::All, Action::Toggle) => {
                let mut next = self.state;
                for index in 0..next.count {
                    next.set(index, !self.state.is_on(index));
                }
                self.commit(next).await
            }
        }
    }

    /// Rebuilds the cached state from the output latch.
    pub async fn sync(&mut self) -> Result<RelayState, RelayError<I2C::Error>> {
        let latch = self.expander.outputs().await?;
        let levels = if self.active_low { !latch } else { latch };
        let mut state = RelayState::new(self.state.count);
        for index in 0..state.count {
            state.set(index, levels & (1 << index) != 0);
        }
        self.state = state;
        Ok(state)
    }

    pub fn release(self) -> I2C {
        self.expander.release()
    }

    fn check_index(&self, index: u8) -> Result<(), RelayError<I2C::Error>> {
        if index >= self.state.count {
            return Err(RelayError::InvalidIndex(index));
        }
        Ok(())
    }

    async fn commit(&mut self, next: RelayState) -> Result<RelayState, RelayError<I2C::Error>> {
        if next == self.state {
            return Ok(next);
        }
        self.write_state(next).await?;
        debug!("Relays {:#010b} -> {:#010b}", self.state.bits, next.bits);
        self.state = next;
        Ok(next)
    }

    async fn write_state(&mut self, state: RelayState) -> Result<(), RelayError<I2C::Error>> {
        self.expander.set_outputs(self.output_latch(state)).await?;
        Ok(())
    }

    // Unused pins stay high like the power-on latch
    fn output_latch(&self, state: RelayState) -> u8 {
        let pins = RelayState::pin_mask(state.count);
        let levels = if self.active_low {
            !state.bits
        } else {
            state.bits
        };
        (levels & pins) | !pins
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::tca9554::mock::MockExpander;
    use crate::tca9554::Register;

    fn settings(count: u8, active_low: bool) -> RelaySettings {
        RelaySettings {
            address: 0x20,
            count,
            active_low,
        }
    }

    #[test]
    fn test_state_bits() {
        let mut state = RelayState::new(4);
        state.set(1, true);
        state.set(3, true);
        state.set(6, true); // out of range, ignored

        assert_eq!(state.mask(), 0b1010);
        assert!(state.is_on(1));
        assert!(!state.is_on(2));
        assert!(!state.is_on(6));
        assert_eq!(
            state.iter().collect::<Vec<_>>(),
            vec![false, true, false, true]
        );
    }

    #[test]
    fn test_boot_sequence_turns_relays_off_before_outputs() {
        let board = block_on(RelayBoard::new(MockExpander::new(0x20), settings(6, false))).unwrap();
        assert_eq!(board.state().mask(), 0);

        let bus = board.release();
        assert_eq!(
            bus.writes,
            vec![
                (Register::Output as u8, 0b1100_0000),
                (Register::Polarity as u8, 0x00),
                (Register::Configuration as u8, 0b1100_0000),
            ]
        );
    }

    #[test]
    fn test_active_low_board_drives_pins_high_when_off() {
        let board = block_on(RelayBoard::new(MockExpander::new(0x20), settings(8, true))).unwrap();

        let bus = board.release();
        assert_eq!(bus.writes[0], (Register::Output as u8, 0xFF));
        assert_eq!(bus.writes[2], (Register::Configuration as u8, 0x00));
    }

    #[test]
    fn test_set_and_toggle() {
        let mut board =
            block_on(RelayBoard::new(MockExpander::new(0x20), settings(8, false))).unwrap();

        block_on(async {
            board.set(0, true).await.unwrap();
            board.toggle(7).await.unwrap();
            let state = board.toggle(0).await.unwrap();
            assert_eq!(state.mask(), 0b1000_0000);
        });

        let bus = board.release();
        assert_eq!(bus.registers[Register::Output as usize], 0b1000_0000);
    }

    #[test]
    fn test_active_low_inverts_levels() {
        let mut board =
            block_on(RelayBoard::new(MockExpander::new(0x20), settings(4, true))).unwrap();

        block_on(board.set(2, true)).unwrap();
        assert!(board.state().is_on(2));

        let bus = board.release();
        // P2 low for on, P0/P1/P3 high for off, P4..P7 unused
        assert_eq!(bus.registers[Register::Output as usize], 0b1111_1011);
    }

    #[test]
    fn test_apply_commands() {
        let mut board =
            block_on(RelayBoard::new(MockExpander::new(0x20), settings(3, false))).unwrap();

        block_on(async {
            let all_on = Command {
                target: Target::All,
                action: Action::On,
            };
            assert_eq!(board.apply(all_on).await.unwrap().mask(), 0b111);

            let one_off = Command {
                target: Target::Relay(1),
                action: Action::Off,
            };
            assert_eq!(board.apply(one_off).await.unwrap().mask(), 0b101);

            let invert = Command {
                target: Target::All,
                action: Action::Toggle,
            };
            assert_eq!(board.apply(invert).await.unwrap().mask(), 0b010);
        });
    }

    #[test]
    fn test_invalid_index_and_count() {
        let result = block_on(RelayBoard::new(MockExpander::new(0x20), settings(9, false)));
        assert!(matches!(result, Err(RelayError::InvalidCount(9))));

        let mut board =
            block_on(RelayBoard::new(MockExpander::new(0x20), settings(2, false))).unwrap();
        assert!(matches!(
            block_on(board.set(2, true)),
            Err(RelayError::InvalidIndex(2))
        ));
    }

    #[test]
    fn test_failed_write_keeps_state() {
        let mut board =
            block_on(RelayBoard::new(MockExpander::new(0x20), settings(8, false))).unwrap();
        block_on(board.set(4, true)).unwrap();

        let mut bus = board.release();
        bus.fail_writes = true;
        let mut board = RelayBoard {
            expander: Tca9554::new(bus, 0x20).unwrap(),
            active_low: false,
            state: RelayState {
                bits: 0b1_0000,
                count: 8,
            },
        };

        assert!(block_on(board.set(5, true)).is_err());
        assert_eq!(board.state().mask(), 0b1_0000);
    }

    #[test]
    fn test_sync_reads_back_latch() {
        let mut bus = MockExpander::new(0x20);
        bus.registers[Register::Output as usize] = 0b0000_0110;
        let mut board = RelayBoard {
            expander: Tca9554::new(bus, 0x20).unwrap(),
            active_low: false,
            state: RelayState::new(4),
        };

        let state = block_on(board.sync()).unwrap();
        assert_eq!(state.mask(), 0b0110);
    }
}
