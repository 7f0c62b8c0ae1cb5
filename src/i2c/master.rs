// Licensed under the Apache-2.0 license

//! Master transaction engine.
//!
//! Bytes to send are taken from the channel's transmit queue and received
//! bytes are appended to its receive queue. Every operation first checks
//! that the channel was claimed as master, then takes the channel's
//! transaction lock for its whole duration.
//!
//! Once a burst has issued START, a wait that gives up with
//! [`Error::Timeout`] drives STOP before returning so the bus is released.
//!
//! Burst framing for `n` bytes:
//!
//! ```text
//! transmit: MDR<-b0  START+RUN  MDR<-b1  (RUN  MDR<-bi) x (n-2)  RUN+STOP
//! receive:  START+RUN+ACK ->b0  (RUN+ACK ->bi) x (n-2)  RUN+STOP ->b(n-1)
//! ```

use crate::common::Logger;
use crate::i2c::common::{ChannelId, Direction, RepeatedStart};
use crate::i2c::driver::{Channel, I2cDriver, TransactionGuard};
use crate::i2c::error::Error;
use crate::i2c::registers::{status, ControlWord, RegisterBlock, MCS, MDR, MSA, MSA_RS};
use crate::i2c::traits::WaitPolicy;

impl<R: RegisterBlock, W: WaitPolicy, L: Logger> I2cDriver<R, W, L> {
    fn begin(&self, channel: ChannelId) -> Result<(&Channel<R>, TransactionGuard<'_>), Error> {
        if !self.is_master(channel) {
            return Err(Error::NotConfiguredAsMaster);
        }
        let guard = self.lock(channel)?;
        Ok((self.channels.get(channel), guard))
    }

    fn set_target(regs: &R, address: u8, direction: Direction) {
        let rs = match direction {
            Direction::Transmit => 0,
            Direction::Receive => MSA_RS,
        };
        regs.write(MSA, (u32::from(address & 0x7F) << 1) | rs);
    }

    fn wait_bus_free(&self, regs: &R, repeated_start: RepeatedStart) -> Result<(), Error> {
        if repeated_start == RepeatedStart::On {
            return Ok(());
        }
        self.wait.wait(|| {
            if regs.read(MCS) & status::BUSBSY != 0 {
                Err(nb::Error::WouldBlock)
            } else {
                Ok(())
            }
        })
    }

    /// Drives `word` and returns the status once the controller is idle.
    fn drive(&self, regs: &R, word: ControlWord) -> Result<u32, Error> {
        regs.write(MCS, word.bits());
        self.wait.wait(|| {
            let status_word = regs.read(MCS);
            if status_word & status::BUSY != 0 {
                Err(nb::Error::WouldBlock)
            } else {
                Ok(status_word)
            }
        })
    }

    /// Drives a burst word that leaves the bus held. On error the bus is
    /// released with STOP, unless arbitration was lost.
    fn drive_burst(&self, channel: ChannelId, regs: &R, word: ControlWord) -> Result<(), Error> {
        let status_word = self.drive(regs, word)?;
        if status_word & status::ERROR == 0 {
            return Ok(());
        }
        let error = Error::from_status(status_word);
        if error == Error::ArbitrationLost {
            self.logger
                .debug(format_args!("i2c: {channel:?} arbitration lost on {word:?}"));
        } else {
            regs.write(MCS, ControlWord::Stop.bits());
            self.logger.error(format_args!(
                "i2c: {channel:?} bus error on {word:?}, status {status_word:#04x}, stop issued"
            ));
        }
        Err(error)
    }

    /// Drives a word that ends the transaction.
    fn drive_final(&self, channel: ChannelId, regs: &R, word: ControlWord) -> Result<(), Error> {
        let status_word = self.drive(regs, word)?;
        if status_word & status::ERROR == 0 {
            return Ok(());
        }
        self.logger.error(format_args!(
            "i2c: {channel:?} error on {word:?}, status {status_word:#04x}"
        ));
        Err(Error::from_status(status_word))
    }

    fn load_next(&self, channel: &Channel<R>) -> Result<(), Error> {
        let byte = self
            .wait
            .wait(|| channel.tx.remove().ok_or(nb::Error::WouldBlock))?;
        channel.regs.write(MDR, u32::from(byte));
        Ok(())
    }

    fn store_received(&self, channel: &Channel<R>) -> Result<(), Error> {
        let byte = channel.regs.read(MDR) as u8;
        self.wait.wait(|| {
            if channel.rx.insert(byte) {
                Ok(())
            } else {
                Err(nb::Error::WouldBlock)
            }
        })
    }

    /// A bounded wait gave up after START: release the bus.
    fn release_on_timeout(
        &self,
        channel: ChannelId,
        regs: &R,
        result: Result<(), Error>,
    ) -> Result<(), Error> {
        if result == Err(Error::Timeout) {
            regs.write(MCS, ControlWord::Stop.bits());
            self.logger
                .error(format_args!("i2c: {channel:?} burst timed out, stop issued"));
        }
        result
    }

    /// Sends one byte from the transmit queue as a complete transaction.
    ///
    /// # Errors
    ///
    /// [`Error::NotConfiguredAsMaster`] or [`Error::ChannelBusy`] without
    /// touching hardware, otherwise the error reported by the controller.
    pub fn master_single_transmit(
        &self,
        channel: ChannelId,
        address: u8,
        repeated_start: RepeatedStart,
    ) -> Result<(), Error> {
        let (ch, _guard) = self.begin(channel)?;
        self.single_transmit(channel, ch, address, repeated_start)
    }

    /// Receives one byte as a complete transaction and appends it to the
    /// receive queue. On error the queue is not touched.
    ///
    /// # Errors
    ///
    /// Same as [`master_single_transmit`](Self::master_single_transmit).
    pub fn master_single_receive(
        &self,
        channel: ChannelId,
        address: u8,
        repeated_start: RepeatedStart,
    ) -> Result<(), Error> {
        let (ch, _guard) = self.begin(channel)?;
        self.single_receive(channel, ch, address, repeated_start)
    }

    /// Sends `count` bytes from the transmit queue as one burst.
    ///
    /// A failure mid-burst ends the transaction immediately: bytes already
    /// loaded are consumed, the rest stay queued.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidByteCount`] for fewer than two bytes, otherwise as for
    /// [`master_single_transmit`](Self::master_single_transmit).
    pub fn master_transmit_multiple(
        &self,
        channel: ChannelId,
        address: u8,
        count: usize,
        repeated_start: RepeatedStart,
    ) -> Result<(), Error> {
        let (ch, _guard) = self.begin(channel)?;
        self.transmit_burst(channel, ch, address, count, repeated_start)
    }

    /// Receives `count` bytes as one burst into the receive queue.
    ///
    /// The last byte is stored even when the closing word reports an error,
    /// so a failed burst may still have queued earlier bytes. A timed-out
    /// closing word stores nothing.
    ///
    /// # Errors
    ///
    /// Same as [`master_transmit_multiple`](Self::master_transmit_multiple).
    pub fn master_receive_multiple(
        &self,
        channel: ChannelId,
        address: u8,
        count: usize,
        repeated_start: RepeatedStart,
    ) -> Result<(), Error> {
        let (ch, _guard) = self.begin(channel)?;
        self.receive_burst(channel, ch, address, count, repeated_start)
    }

    // The bodies below expect the caller to hold the channel's transaction
    // lock.

    pub(crate) fn single_transmit(
        &self,
        channel: ChannelId,
        ch: &Channel<R>,
        address: u8,
        repeated_start: RepeatedStart,
    ) -> Result<(), Error> {
        let regs = &ch.regs;
        Self::set_target(regs, address, Direction::Transmit);
        self.load_next(ch)?;
        self.wait_bus_free(regs, repeated_start)?;
        self.drive_final(channel, regs, ControlWord::Single)
    }

    pub(crate) fn single_receive(
        &self,
        channel: ChannelId,
        ch: &Channel<R>,
        address: u8,
        repeated_start: RepeatedStart,
    ) -> Result<(), Error> {
        let regs = &ch.regs;
        Self::set_target(regs, address, Direction::Receive);
        self.wait_bus_free(regs, repeated_start)?;
        self.drive_final(channel, regs, ControlWord::Single)?;
        self.store_received(ch)
    }

    pub(crate) fn transmit_burst(
        &self,
        channel: ChannelId,
        ch: &Channel<R>,
        address: u8,
        count: usize,
        repeated_start: RepeatedStart,
    ) -> Result<(), Error> {
        if count < 2 {
            return Err(Error::InvalidByteCount(count));
        }
        let regs = &ch.regs;

        Self::set_target(regs, address, Direction::Transmit);
        self.load_next(ch)?;
        self.wait_bus_free(regs, repeated_start)?;

        let result = self.send_burst_words(channel, ch, count);
        self.release_on_timeout(channel, regs, result)
    }

    fn send_burst_words(
        &self,
        channel: ChannelId,
        ch: &Channel<R>,
        count: usize,
    ) -> Result<(), Error> {
        let regs = &ch.regs;
        self.drive_burst(channel, regs, ControlWord::BurstSendStart)?;
        self.load_next(ch)?;
        for _ in 2..count {
            self.drive_burst(channel, regs, ControlWord::BurstSendContinue)?;
            self.load_next(ch)?;
        }
        self.drive_final(channel, regs, ControlWord::BurstFinish)
    }

    pub(crate) fn receive_burst(
        &self,
        channel: ChannelId,
        ch: &Channel<R>,
        address: u8,
        count: usize,
        repeated_start: RepeatedStart,
    ) -> Result<(), Error> {
        if count < 2 {
            return Err(Error::InvalidByteCount(count));
        }
        let regs = &ch.regs;

        Self::set_target(regs, address, Direction::Receive);
        self.wait_bus_free(regs, repeated_start)?;

        let result = self.receive_burst_words(channel, ch, count);
        self.release_on_timeout(channel, regs, result)
    }

    fn receive_burst_words(
        &self,
        channel: ChannelId,
        ch: &Channel<R>,
        count: usize,
    ) -> Result<(), Error> {
        let regs = &ch.regs;
        self.drive_burst(channel, regs, ControlWord::BurstReceiveStart)?;
        self.store_received(ch)?;
        for _ in 2..count {
            self.drive_burst(channel, regs, ControlWord::BurstReceiveContinue)?;
            self.store_received(ch)?;
        }
        let outcome = self.drive_final(channel, regs, ControlWord::BurstFinish);
        if outcome == Err(Error::Timeout) {
            return outcome;
        }
        // Last byte is read even when the closing word reported an error.
        self.store_received(ch)?;
        outcome
    }

    /// Sends everything currently in the transmit queue.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyQueueOnDrain`] when there is nothing to send, otherwise
    /// the result of the dispatched transaction.
    pub fn transmit_all_queue_bytes(
        &self,
        channel: ChannelId,
        address: u8,
        repeated_start: RepeatedStart,
    ) -> Result<(), Error> {
        if !self.is_master(channel) {
            return Err(Error::NotConfiguredAsMaster);
        }
        match self.transmit_queue_len(channel) {
            0 => Err(Error::EmptyQueueOnDrain),
            1 => self.master_single_transmit(channel, address, repeated_start),
            n => self.master_transmit_multiple(channel, address, n, repeated_start),
        }
    }

    /// Receives as many bytes as the receive queue has room for.
    ///
    /// # Errors
    ///
    /// [`Error::FullQueueOnReceiveDrain`] when there is no room, otherwise the
    /// result of the dispatched transaction.
    pub fn receive_all_queue_bytes(
        &self,
        channel: ChannelId,
        address: u8,
        repeated_start: RepeatedStart,
    ) -> Result<(), Error> {
        if !self.is_master(channel) {
            return Err(Error::NotConfiguredAsMaster);
        }
        match self.channels.get(channel).rx.with(|q| q.free()) {
            0 => Err(Error::FullQueueOnReceiveDrain),
            1 => self.master_single_receive(channel, address, repeated_start),
            n => self.master_receive_multiple(channel, address, n, repeated_start),
        }
    }

    /// Application entry point for sending: `0` drains the transmit queue,
    /// `1` sends a single byte, anything else sends a burst of `count`.
    /// Always starts a fresh transaction.
    ///
    /// # Errors
    ///
    /// The result of the dispatched operation.
    pub fn poke_transmit(&self, channel: ChannelId, address: u8, count: usize) -> Result<(), Error> {
        match count {
            0 => self.transmit_all_queue_bytes(channel, address, RepeatedStart::Off),
            1 => self.master_single_transmit(channel, address, RepeatedStart::Off),
            n => self.master_transmit_multiple(channel, address, n, RepeatedStart::Off),
        }
    }

    /// Receiving counterpart of [`poke_transmit`](Self::poke_transmit).
    ///
    /// # Errors
    ///
    /// The result of the dispatched operation.
    pub fn poke_receive(&self, channel: ChannelId, address: u8, count: usize) -> Result<(), Error> {
        match count {
            0 => self.receive_all_queue_bytes(channel, address, RepeatedStart::Off),
            1 => self.master_single_receive(channel, address, RepeatedStart::Off),
            n => self.master_receive_multiple(channel, address, n, RepeatedStart::Off),
        }
    }
}
