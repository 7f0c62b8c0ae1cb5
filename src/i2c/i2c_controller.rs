// Licensed under the Apache-2.0 license

//! embedded-hal adapter for one master channel.
//!
//! [`I2cController`] borrows an initialized [`I2cDriver`] and exposes one of
//! its master channels as [`embedded_hal::i2c::I2c`], so generic device
//! drivers can run on top of the queue-based engine. Bytes are staged
//! through the channel's queues while the channel's transaction lock is
//! held. A transfer needs the queue it stages through to be empty and is
//! refused with [`Error::ChannelBusy`] otherwise, so bytes the application
//! queued itself are never sent, returned or discarded by the adapter.
//!
//! Each operation is a complete transaction ending in STOP; `write_read`
//! and `transaction` therefore issue a STOP between operations rather than
//! a repeated start.

use embedded_hal::i2c::{Operation, SevenBitAddress};

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{ChannelId, RepeatedStart};
use crate::i2c::driver::I2cDriver;
use crate::i2c::error::Error;
use crate::i2c::queue::QUEUE_CAPACITY;
use crate::i2c::registers::RegisterBlock;
use crate::i2c::traits::{SpinForever, WaitPolicy};

pub struct I2cController<'d, R: RegisterBlock, W: WaitPolicy = SpinForever, L: Logger = NoOpLogger>
{
    driver: &'d I2cDriver<R, W, L>,
    channel: ChannelId,
}

impl<'d, R: RegisterBlock, W: WaitPolicy, L: Logger> I2cController<'d, R, W, L> {
    /// # Errors
    ///
    /// [`Error::NotConfiguredAsMaster`] if `channel` was not claimed as master.
    pub fn new(driver: &'d I2cDriver<R, W, L>, channel: ChannelId) -> Result<Self, Error> {
        if !driver.is_master(channel) {
            return Err(Error::NotConfiguredAsMaster);
        }
        Ok(Self { driver, channel })
    }

    #[must_use]
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    fn write_bytes(&self, address: SevenBitAddress, bytes: &[u8]) -> Result<(), Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        if bytes.len() > QUEUE_CAPACITY {
            return Err(Error::TransferTooLong);
        }
        let _guard = self.driver.lock(self.channel)?;
        let ch = self.driver.channels.get(self.channel);
        ch.tx.with(|q| {
            if !q.is_empty() {
                return Err(Error::ChannelBusy);
            }
            for byte in bytes {
                q.insert(*byte);
            }
            Ok(())
        })?;

        let result = match bytes.len() {
            1 => self
                .driver
                .single_transmit(self.channel, ch, address, RepeatedStart::Off),
            n => self
                .driver
                .transmit_burst(self.channel, ch, address, n, RepeatedStart::Off),
        };
        if result.is_err() {
            ch.tx.reset();
        }
        result
    }

    fn read_bytes(&self, address: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Error> {
        if buffer.is_empty() {
            return Ok(());
        }
        if buffer.len() > QUEUE_CAPACITY {
            return Err(Error::TransferTooLong);
        }
        let _guard = self.driver.lock(self.channel)?;
        let ch = self.driver.channels.get(self.channel);
        if !ch.rx.is_empty() {
            return Err(Error::ChannelBusy);
        }

        let result = match buffer.len() {
            1 => self
                .driver
                .single_receive(self.channel, ch, address, RepeatedStart::Off),
            n => self
                .driver
                .receive_burst(self.channel, ch, address, n, RepeatedStart::Off),
        };
        if let Err(e) = result {
            ch.rx.reset();
            return Err(e);
        }

        ch.rx.with(|q| {
            for slot in buffer.iter_mut() {
                *slot = q.remove().unwrap_or(0);
            }
        });
        Ok(())
    }
}

impl<R: RegisterBlock, W: WaitPolicy, L: Logger> embedded_hal::i2c::ErrorType
    for I2cController<'_, R, W, L>
{
    type Error = Error;
}

impl<R: RegisterBlock, W: WaitPolicy, L: Logger> embedded_hal::i2c::I2c
    for I2cController<'_, R, W, L>
{
    fn read(&mut self, addr: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.read_bytes(addr, buffer)
    }

    fn write(&mut self, addr: SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
        self.write_bytes(addr, bytes)
    }

    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.write_bytes(addr, bytes)?;
        self.read_bytes(addr, buffer)
    }

    fn transaction(
        &mut self,
        addr: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Read(buffer) => self.read_bytes(addr, buffer)?,
                Operation::Write(bytes) => self.write_bytes(addr, bytes)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::common::ChannelConfig;
    use crate::i2c::mock::{MockPlatform, MockRegisters};
    use crate::i2c::registers::status;
    use embedded_hal::i2c::{ErrorKind, I2c, NoAcknowledgeSource};
    use fugit::HertzU32;

    fn driver() -> I2cDriver<MockRegisters> {
        let mut drv = I2cDriver::new(
            core::array::from_fn(|_| MockRegisters::new()),
            HertzU32::MHz(16),
        );
        drv.init(
            &[ChannelConfig::builder(ChannelId::I2c0).build()],
            &mut MockPlatform::default(),
        )
        .unwrap();
        drv.registers(ChannelId::I2c0).clear_log();
        drv
    }

    #[test]
    fn test_requires_master_channel() {
        let drv = driver();
        assert!(I2cController::new(&drv, ChannelId::I2c0).is_ok());
        assert!(matches!(
            I2cController::new(&drv, ChannelId::I2c1),
            Err(Error::NotConfiguredAsMaster)
        ));
    }

    #[test]
    fn test_write_and_read() {
        let drv = driver();
        let regs = drv.registers(ChannelId::I2c0);
        let mut i2c = I2cController::new(&drv, ChannelId::I2c0).unwrap();

        i2c.write(0x50, &[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(regs.data_writes(), vec![0x01, 0x02, 0x03]);
        assert_eq!(regs.control_words(), vec![0x03, 0x01, 0x05]);

        regs.clear_log();
        regs.push_rx(&[0xAA, 0xBB]);
        let mut buffer = [0u8; 2];
        i2c.read(0x50, &mut buffer).unwrap();
        assert_eq!(buffer, [0xAA, 0xBB]);
        assert_eq!(regs.control_words(), vec![0x0B, 0x05]);
        assert_eq!(drv.receive_queue_len(ChannelId::I2c0), 0);
    }

    #[test]
    fn test_write_read_single_bytes() {
        let drv = driver();
        let regs = drv.registers(ChannelId::I2c0);
        let mut i2c = I2cController::new(&drv, ChannelId::I2c0).unwrap();

        regs.push_rx(&[0x42]);
        let mut buffer = [0u8; 1];
        i2c.write_read(0x68, &[0x75], &mut buffer).unwrap();

        assert_eq!(buffer, [0x42]);
        assert_eq!(regs.control_words(), vec![0x07, 0x07]);
        assert_eq!(regs.writes_to(crate::i2c::registers::MSA), vec![0xD0, 0xD1]);
    }

    #[test]
    fn test_transfer_too_long() {
        let drv = driver();
        let mut i2c = I2cController::new(&drv, ChannelId::I2c0).unwrap();
        let bytes = [0u8; QUEUE_CAPACITY + 1];

        assert_eq!(i2c.write(0x50, &bytes), Err(Error::TransferTooLong));
        let mut buffer = [0u8; QUEUE_CAPACITY + 1];
        assert_eq!(i2c.read(0x50, &mut buffer), Err(Error::TransferTooLong));
        assert!(drv.registers(ChannelId::I2c0).writes().is_empty());
    }

    #[test]
    fn test_nack_discards_staged_bytes() {
        let drv = driver();
        let regs = drv.registers(ChannelId::I2c0);
        regs.fault_on(0, status::ERROR | status::ADRACK);
        let mut i2c = I2cController::new(&drv, ChannelId::I2c0).unwrap();

        let err = i2c.write(0x50, &[1, 2, 3]).unwrap_err();
        assert_eq!(
            embedded_hal::i2c::Error::kind(&err),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(drv.transmit_queue_len(ChannelId::I2c0), 0);
    }

    #[test]
    fn test_write_refuses_pending_application_bytes() {
        let drv = driver();
        let regs = drv.registers(ChannelId::I2c0);
        drv.push_to_transmit(ChannelId::I2c0, 0xEE, false).unwrap();
        let mut i2c = I2cController::new(&drv, ChannelId::I2c0).unwrap();

        assert_eq!(i2c.write(0x50, &[1, 2]), Err(Error::ChannelBusy));
        assert!(regs.writes().is_empty());
        assert_eq!(drv.transmit_queue_len(ChannelId::I2c0), 1);
        assert_eq!(drv.channels.get(ChannelId::I2c0).tx.remove(), Some(0xEE));

        // Queue drained by its owner: the adapter can use it again.
        i2c.write(0x50, &[1, 2]).unwrap();
        assert_eq!(regs.data_writes(), vec![1, 2]);
        assert_eq!(drv.transmit_queue_len(ChannelId::I2c0), 0);
    }

    #[test]
    fn test_read_refuses_pending_received_bytes() {
        let drv = driver();
        let regs = drv.registers(ChannelId::I2c0);
        drv.channels.get(ChannelId::I2c0).rx.insert(0x77);
        regs.push_rx(&[0xAA, 0xBB]);
        let mut i2c = I2cController::new(&drv, ChannelId::I2c0).unwrap();

        let mut buffer = [0u8; 2];
        assert_eq!(i2c.read(0x50, &mut buffer), Err(Error::ChannelBusy));
        assert_eq!(buffer, [0, 0]);
        assert!(regs.writes().is_empty());
        assert_eq!(drv.receive_queue_len(ChannelId::I2c0), 1);

        let mut pending = [0u8; 1];
        assert_eq!(drv.pop_received(ChannelId::I2c0, &mut pending), Ok(1));
        assert_eq!(pending, [0x77]);
        i2c.read(0x50, &mut buffer).unwrap();
        assert_eq!(buffer, [0xAA, 0xBB]);
    }

    #[test]
    fn test_adapter_waits_for_channel_lock() {
        let drv = driver();
        let mut i2c = I2cController::new(&drv, ChannelId::I2c0).unwrap();
        let guard = drv.lock(ChannelId::I2c0).unwrap();

        assert_eq!(i2c.write(0x50, &[1]), Err(Error::ChannelBusy));
        let mut buffer = [0u8; 1];
        assert_eq!(i2c.read(0x50, &mut buffer), Err(Error::ChannelBusy));
        assert_eq!(drv.transmit_queue_len(ChannelId::I2c0), 0);
        assert!(drv.registers(ChannelId::I2c0).writes().is_empty());

        drop(guard);
        assert_eq!(i2c.write(0x50, &[1]), Ok(()));
    }

    #[test]
    fn test_failed_read_leaves_queue_empty() {
        let drv = driver();
        let regs = drv.registers(ChannelId::I2c0);
        regs.fault_on(2, status::ERROR | status::DATACK);
        regs.push_rx(&[1, 2, 3]);
        let mut i2c = I2cController::new(&drv, ChannelId::I2c0).unwrap();

        let mut buffer = [0u8; 3];
        assert!(i2c.read(0x50, &mut buffer).is_err());
        assert_eq!(drv.receive_queue_len(ChannelId::I2c0), 0);
    }

    #[test]
    fn test_transaction_runs_operations_in_order() {
        let drv = driver();
        let regs = drv.registers(ChannelId::I2c0);
        let mut i2c = I2cController::new(&drv, ChannelId::I2c0).unwrap();
        regs.push_rx(&[9, 8]);

        let mut buffer = [0u8; 2];
        let mut ops = [Operation::Write(&[0x10]), Operation::Read(&mut buffer)];
        i2c.transaction(0x33, &mut ops).unwrap();

        assert_eq!(buffer, [9, 8]);
        assert_eq!(regs.control_words(), vec![0x07, 0x0B, 0x05]);
    }
}
