// Licensed under the Apache-2.0 license

//! Interrupt entry point.
//!
//! The platform's vector table calls [`I2cDriver::handle_interrupt`] from
//! each channel's ISR. The handler acknowledges the masked causes and then
//! runs the application hook for the direction of the serviced transfer.

use crate::common::Logger;
use crate::i2c::common::{ChannelId, Direction};
use crate::i2c::driver::I2cDriver;
use crate::i2c::registers::{
    RegisterBlock, MICR, MMIS, MSA, MSA_RS, SCSR, SCSR_RREQ, SCSR_TREQ, SICR, SMIS,
};
use crate::i2c::traits::WaitPolicy;

impl<R: RegisterBlock, W: WaitPolicy, L: Logger> I2cDriver<R, W, L> {
    /// Services one interrupt of `channel`.
    ///
    /// Master channels pick the hook from the R/S bit of the last programmed
    /// target address. Slave channels pick it from the request flags: a
    /// receive request runs the receive hook, a transmit request the transmit
    /// hook. Spurious calls with nothing pending do nothing.
    pub fn handle_interrupt(&self, channel: ChannelId) {
        let regs = self.registers(channel);

        if self.is_master(channel) {
            let pending = regs.read(MMIS);
            if pending == 0 {
                return;
            }
            regs.write(MICR, pending);
            let direction = if regs.is_set(MSA, MSA_RS) {
                Direction::Receive
            } else {
                Direction::Transmit
            };
            self.logger.debug(format_args!(
                "i2c: {channel:?} master irq {pending:#04x}, {direction:?}"
            ));
            self.callbacks.invoke(channel, direction);
        } else if self.is_slave(channel) {
            let pending = regs.read(SMIS);
            if pending == 0 {
                return;
            }
            regs.write(SICR, pending);
            let requests = regs.read(SCSR);
            self.logger.debug(format_args!(
                "i2c: {channel:?} slave irq {pending:#04x}, requests {requests:#04x}"
            ));
            if requests & SCSR_RREQ != 0 {
                self.callbacks.invoke(channel, Direction::Receive);
            }
            if requests & SCSR_TREQ != 0 {
                self.callbacks.invoke(channel, Direction::Transmit);
            }
        }
    }
}
