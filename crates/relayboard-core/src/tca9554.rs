//! Async driver for the TCA9554 / TCA9554A 8-bit I2C GPIO expander.

use embedded_hal_async::i2c::I2c;

use crate::config::is_tca9554_address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    Input = 0x00,
    Output = 0x01,
    Polarity = 0x02,
    /// A set bit configures the pin as input
    Configuration = 0x03,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    I2c(E),
    InvalidAddress(u8),
}

pub struct Tca9554<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Tca9554<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Result<Self, Error<I2C::Error>> {
        if !is_tca9554_address(address) {
            return Err(Error::InvalidAddress(address));
        }
        Ok(Self { i2c, address })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Logic levels currently present on the pins.
    pub async fn inputs(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_register(Register::Input).await
    }

    /// Last value written to the output latch.
    pub async fn outputs(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_register(Register::Output).await
    }

    pub async fn set_outputs(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.write_register(Register::Output, value).await
    }

    pub async fn set_direction(&mut self, input_mask: u8) -> Result<(), Error<I2C::Error>> {
        self.write_register(Register::Configuration, input_mask).await
    }

    pub async fn set_polarity(&mut self, inverted_mask: u8) -> Result<(), Error<I2C::Error>> {
        self.write_register(Register::Polarity, inverted_mask).await
    }

    pub async fn read_register(&mut self, register: Register) -> Result<u8, Error<I2C::Error>> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register as u8], &mut value)
            .await
            .map_err(Error::I2c)?;
        Ok(value[0])
    }

    pub async fn write_register(
        &mut self,
        register: Register,
        value: u8,
    ) -> Result<(), Error<I2C::Error>> {
        log::debug!(
            "TCA9554 {:#04x}: write {:?} = {:#010b}",
            self.address,
            register,
            value
        );
        self.i2c
            .write(self.address, &[register as u8, value])
            .await
            .map_err(Error::I2c)
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}


#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::mock::MockExpander;
    use super::*;

    #[test]
    fn test_rejects_foreign_address() {
        let result = Tca9554::new(MockExpander::new(0x48), 0x48);
        assert!(matches!(result, Err(Error::InvalidAddress(0x48))));
    }

    #[test]
    fn test_register_writes() {
        let mut expander = Tca9554::new(MockExpander::new(0x20), 0x20).unwrap();
        assert_eq!(expander.address(), 0x20);

        block_on(async {
            expander.set_outputs(0b1010_0101).await.unwrap();
            expander.set_direction(0xF0).await.unwrap();
            expander.set_polarity(0x00).await.unwrap();
        });

        let bus = expander.release();
        assert_eq!(bus.writes, vec![(0x01, 0b1010_0101), (0x03, 0xF0), (0x02, 0x00)]);
    }

    #[test]
    fn test_register_reads() {
        let mut bus = MockExpander::new(0x38);
        bus.registers[Register::Input as usize] = 0x5A;
        let mut expander = Tca9554::new(bus, 0x38).unwrap();

        block_on(async {
            assert_eq!(expander.inputs().await, Ok(0x5A));
            // Power-on default of the output latch
            assert_eq!(expander.outputs().await, Ok(0xFF));
            assert_eq!(expander.read_register(Register::Configuration).await, Ok(0xFF));
        });
    }

    #[test]
    fn test_bus_error_is_reported() {
        let mut bus = MockExpander::new(0x20);
        bus.fail_writes = true;
        let mut expander = Tca9554::new(bus, 0x20).unwrap();

        let result = block_on(expander.set_outputs(0x00));
        assert_eq!(result, Err(Error::I2c(embedded_hal_async::i2c::ErrorKind::Bus)));
    }
}
