// Licensed under the Apache-2.0 license

//! Slave-mode transfer hooks.
//!
//! Slave channels are fully configured by `init`, but byte transfer in slave
//! mode is left to the application's interrupt callbacks. These entry points
//! only enforce the mode claim.

use crate::common::Logger;
use crate::i2c::common::ChannelId;
use crate::i2c::driver::I2cDriver;
use crate::i2c::error::Error;
use crate::i2c::registers::RegisterBlock;
use crate::i2c::traits::WaitPolicy;

impl<R: RegisterBlock, W: WaitPolicy, L: Logger> I2cDriver<R, W, L> {
    /// # Errors
    ///
    /// [`Error::NotConfiguredAsSlave`] if the channel was not claimed as slave.
    pub fn slave_transmit_one_byte(&self, channel: ChannelId) -> Result<(), Error> {
        if !self.is_slave(channel) {
            return Err(Error::NotConfiguredAsSlave);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::NotConfiguredAsSlave`] if the channel was not claimed as slave.
    pub fn slave_receive_one_byte(&self, channel: ChannelId) -> Result<(), Error> {
        if !self.is_slave(channel) {
            return Err(Error::NotConfiguredAsSlave);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::common::{ChannelConfig, ChannelMode};
    use crate::i2c::mock::{MockPlatform, MockRegisters};
    use fugit::HertzU32;

    #[test]
    fn test_slave_ops_require_slave_claim() {
        let mut drv = I2cDriver::new(
            core::array::from_fn(|_| MockRegisters::new()),
            HertzU32::MHz(16),
        );
        let table = [
            ChannelConfig::builder(ChannelId::I2c0).build(),
            ChannelConfig::builder(ChannelId::I2c1)
                .mode(ChannelMode::Slave)
                .slave_address(0x42)
                .build(),
        ];
        drv.init(&table, &mut MockPlatform::default()).unwrap();
        for ch in ChannelId::ALL {
            drv.registers(ch).clear_log();
        }

        assert_eq!(
            drv.slave_transmit_one_byte(ChannelId::I2c0),
            Err(Error::NotConfiguredAsSlave)
        );
        assert_eq!(
            drv.slave_receive_one_byte(ChannelId::I2c3),
            Err(Error::NotConfiguredAsSlave)
        );
        assert_eq!(drv.slave_transmit_one_byte(ChannelId::I2c1), Ok(()));
        assert_eq!(drv.slave_receive_one_byte(ChannelId::I2c1), Ok(()));

        // Master operations are rejected on the slave channel and vice versa.
        assert_eq!(
            drv.poke_transmit(ChannelId::I2c1, 0x10, 1),
            Err(Error::NotConfiguredAsMaster)
        );
        for ch in ChannelId::ALL {
            assert!(drv.registers(ch).writes().is_empty());
        }
    }
}
