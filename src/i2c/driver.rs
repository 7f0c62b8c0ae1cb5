// Licensed under the Apache-2.0 license

//! Driver context and initialization sequencer.
//!
//! [`I2cDriver`] owns the register blocks of all channels together with all
//! driver state: the master/slave usage masks, the per-channel byte queues
//! and the callback registry.
//! Initialization takes `&mut self`; everything after it takes `&self`, so a
//! driver can live in a `static` shared with interrupt handlers.

use core::cell::Cell;

use critical_section::Mutex;
use fugit::HertzU32;

use crate::common::{Logger, NoOpLogger};
use crate::i2c::callbacks::{Callback, CallbackRegistry};
use crate::i2c::common::{
    ChannelConfig, ChannelId, ChannelMode, Direction, I2cSpeed, MasterInterrupt, PerChannel,
    SlaveInterrupt,
};
use crate::i2c::error::Error;
use crate::i2c::queue::SharedQueue;
use crate::i2c::registers::{
    mcr, RegisterBlock, MCLKOCNT, MCR, MCR2, MCR2_GFPW_MASK, MCR2_GFPW_SHIFT, MIMR, MIMR_CLKIM,
    MIMR_IM, MTPR, MTPR_HS, SCSR, SCSR_DA, SIMR, SIMR_DATAIM, SIMR_STARTIM, SIMR_STOPIM, SOAR,
    SOAR2, SOAR2_OAR2EN,
};
use crate::i2c::timing::{is_valid_divisor, timer_period};
use crate::i2c::traits::{I2cPlatform, SpinForever, WaitPolicy};

/// Per-channel hardware and buffering state.
pub(crate) struct Channel<R> {
    pub(crate) regs: R,
    pub(crate) tx: SharedQueue,
    pub(crate) rx: SharedQueue,
    in_flight: Mutex<Cell<bool>>,
}

impl<R> Channel<R> {
    fn new(regs: R) -> Self {
        Self {
            regs,
            tx: SharedQueue::new(),
            rx: SharedQueue::new(),
            in_flight: Mutex::new(Cell::new(false)),
        }
    }
}

/// Held for the duration of one transaction on a channel.
pub(crate) struct TransactionGuard<'a> {
    flag: &'a Mutex<Cell<bool>>,
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        critical_section::with(|cs| self.flag.borrow(cs).set(false));
    }
}

pub struct I2cDriver<R: RegisterBlock, W: WaitPolicy = SpinForever, L: Logger = NoOpLogger> {
    pub(crate) channels: PerChannel<Channel<R>>,
    system_clock: HertzU32,
    master_used: u8,
    slave_used: u8,
    allocated: u8,
    pub(crate) callbacks: CallbackRegistry,
    pub(crate) wait: W,
    pub(crate) logger: L,
}

impl<R: RegisterBlock> I2cDriver<R> {
    /// Driver with the reference spin-forever waits and no logging.
    pub fn new(registers: [R; 4], system_clock: HertzU32) -> Self {
        Self::with_policy(registers, system_clock, SpinForever, NoOpLogger)
    }
}

impl<R: RegisterBlock, W: WaitPolicy, L: Logger> I2cDriver<R, W, L> {
    pub fn with_policy(registers: [R; 4], system_clock: HertzU32, wait: W, logger: L) -> Self {
        Self {
            channels: PerChannel::new(registers).map(Channel::new),
            system_clock,
            master_used: 0,
            slave_used: 0,
            allocated: 0,
            callbacks: CallbackRegistry::new(),
            wait,
            logger,
        }
    }

    /// Walks the configuration table once, in order.
    ///
    /// Channels whose clock is already running are left untouched. A channel
    /// already claimed in the other mode is skipped before its pins are
    /// routed. An invalid timing divisor aborts the whole pass immediately;
    /// channels programmed before the failing entry stay as they are and
    /// their usability afterwards is undefined.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimingDivisor`] when a master channel's speed
    /// class cannot be reached from the system clock.
    pub fn init<P: I2cPlatform>(
        &mut self,
        table: &[ChannelConfig],
        platform: &mut P,
    ) -> Result<(), Error> {
        for config in table {
            let ch = config.channel;
            if platform.is_clock_enabled(ch) {
                self.logger
                    .debug(format_args!("i2c: {ch:?} already clocked, skipping"));
                continue;
            }
            platform.enable_clock(ch);

            let channel = self.channels.get(ch);
            channel.tx.reset();
            channel.rx.reset();
            self.allocated |= ch.mask();

            match config.mode {
                ChannelMode::Master => {
                    if self.slave_used & ch.mask() != 0 {
                        self.logger
                            .debug(format_args!("i2c: {ch:?} already claimed as slave"));
                        continue;
                    }
                    self.master_used |= ch.mask();
                    platform.route_pins(ch);
                    self.program_master(config)?;
                }
                ChannelMode::Slave => {
                    if self.master_used & ch.mask() != 0 {
                        self.logger
                            .debug(format_args!("i2c: {ch:?} already claimed as master"));
                        continue;
                    }
                    self.slave_used |= ch.mask();
                    platform.route_pins(ch);
                    self.program_slave(config);
                }
            }

            if config.has_interrupts() {
                platform.enable_irq(ch);
            }
        }
        Ok(())
    }

    fn program_master(&self, config: &ChannelConfig) -> Result<(), Error> {
        let ch = config.channel;
        let regs = &self.channels.get(ch).regs;

        regs.set_bits(MCR, mcr::MFE);
        regs.clear_bits(MCR, mcr::SFE);

        match config.glitch_suppression {
            Some(width) => {
                regs.set_bits(MCR, mcr::GFE);
                regs.write(
                    MCR2,
                    (u32::from(width) & MCR2_GFPW_MASK) << MCR2_GFPW_SHIFT,
                );
            }
            None => regs.clear_bits(MCR, mcr::GFE),
        }

        if config.loop_back {
            regs.set_bits(MCR, mcr::LPBK);
        } else {
            regs.clear_bits(MCR, mcr::LPBK);
        }

        regs.write(MCLKOCNT, u32::from(config.clock_low_timeout));

        for source in &config.master_interrupts {
            let bit = match source {
                MasterInterrupt::BusTimeout => MIMR_CLKIM,
                MasterInterrupt::TransactionComplete
                | MasterInterrupt::ArbitrationLost
                | MasterInterrupt::TransactionError => MIMR_IM,
            };
            regs.set_bits(MIMR, bit);
        }

        let divisor = timer_period(self.system_clock, config.speed);
        if !is_valid_divisor(divisor) {
            self.logger.error(format_args!(
                "i2c: {ch:?} timing divisor {divisor} out of range, aborting init"
            ));
            return Err(Error::InvalidTimingDivisor {
                channel: ch,
                divisor,
            });
        }
        let high_speed = if config.speed == I2cSpeed::HighSpeed {
            MTPR_HS
        } else {
            0
        };
        // Range-checked above.
        let period = u32::try_from(divisor).unwrap_or(0);
        regs.write(MTPR, high_speed | period);

        self.logger.debug(format_args!(
            "i2c: {ch:?} master, {:?}, divisor {divisor}",
            config.speed
        ));
        Ok(())
    }

    fn program_slave(&self, config: &ChannelConfig) {
        let ch = config.channel;
        let regs = &self.channels.get(ch).regs;

        regs.set_bits(MCR, mcr::SFE);
        regs.clear_bits(MCR, mcr::MFE);

        regs.write(SOAR, u32::from(config.slave_address & 0x7F));
        if let Some(address) = config.slave_address2.filter(|a| *a != 0) {
            regs.write(SOAR2, u32::from(address & 0x7F) | SOAR2_OAR2EN);
        }

        for source in &config.slave_interrupts {
            let bit = match source {
                SlaveInterrupt::TransactionReceived | SlaveInterrupt::TransactionRequested => {
                    SIMR_DATAIM
                }
                SlaveInterrupt::StartCondition => SIMR_STARTIM,
                SlaveInterrupt::StopCondition => SIMR_STOPIM,
            };
            regs.set_bits(SIMR, bit);
        }

        regs.write(SCSR, SCSR_DA);
        self.logger.debug(format_args!(
            "i2c: {ch:?} slave at {:#04x}",
            config.slave_address & 0x7F
        ));
    }

    #[must_use]
    pub fn is_master(&self, channel: ChannelId) -> bool {
        self.master_used & channel.mask() != 0
    }

    #[must_use]
    pub fn is_slave(&self, channel: ChannelId) -> bool {
        self.slave_used & channel.mask() != 0
    }

    #[must_use]
    pub fn master_mask(&self) -> u8 {
        self.master_used
    }

    #[must_use]
    pub fn slave_mask(&self) -> u8 {
        self.slave_used
    }

    #[must_use]
    pub fn registers(&self, channel: ChannelId) -> &R {
        &self.channels.get(channel).regs
    }

    #[must_use]
    pub fn system_clock(&self) -> HertzU32 {
        self.system_clock
    }

    /// Installs an interrupt hook. Call before enabling the channel's IRQ.
    pub fn set_callback(&mut self, channel: ChannelId, direction: Direction, hook: Callback) {
        self.callbacks.set(channel, direction, hook);
    }

    pub(crate) fn queues_allocated(&self, channel: ChannelId) -> Result<(), Error> {
        if self.allocated & channel.mask() == 0 {
            return Err(Error::QueueNotAllocated);
        }
        Ok(())
    }

    pub(crate) fn lock(&self, channel: ChannelId) -> Result<TransactionGuard<'_>, Error> {
        let flag = &self.channels.get(channel).in_flight;
        critical_section::with(|cs| {
            let busy = flag.borrow(cs);
            if busy.get() {
                return Err(Error::ChannelBusy);
            }
            busy.set(true);
            Ok(TransactionGuard { flag })
        })
    }

    /// Queues `byte` for transmission.
    ///
    /// With `must_block` the call waits for room, so the byte is never lost.
    /// Without it a full queue drops the byte and reports
    /// [`Error::TransmitQueueFull`].
    ///
    /// # Errors
    ///
    /// [`Error::QueueNotAllocated`] before `init`, [`Error::TransmitQueueFull`]
    /// as described above, or whatever the wait policy reports.
    pub fn push_to_transmit(
        &self,
        channel: ChannelId,
        byte: u8,
        must_block: bool,
    ) -> Result<(), Error> {
        self.queues_allocated(channel)?;
        let tx = &self.channels.get(channel).tx;
        if must_block {
            self.wait.wait(|| {
                if tx.insert(byte) {
                    Ok(())
                } else {
                    Err(nb::Error::WouldBlock)
                }
            })
        } else if tx.insert(byte) {
            Ok(())
        } else {
            self.logger
                .debug(format_args!("i2c: {channel:?} transmit queue full, dropped {byte:#04x}"));
            Err(Error::TransmitQueueFull)
        }
    }

    /// Waits until at least one received byte is queued, then moves every
    /// queued byte into `buffer` in FIFO order until the queue is empty or
    /// `buffer` is full. Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// [`Error::QueueNotAllocated`] before `init`, or whatever the wait policy
    /// reports.
    pub fn pop_received(&self, channel: ChannelId, buffer: &mut [u8]) -> Result<usize, Error> {
        self.queues_allocated(channel)?;
        if buffer.is_empty() {
            return Ok(0);
        }
        let rx = &self.channels.get(channel).rx;
        self.wait.wait(|| {
            if rx.is_empty() {
                Err(nb::Error::WouldBlock)
            } else {
                Ok(())
            }
        })?;

        let mut count = 0;
        for slot in buffer.iter_mut() {
            match rx.remove() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    #[must_use]
    pub fn transmit_queue_len(&self, channel: ChannelId) -> usize {
        self.channels.get(channel).tx.size()
    }

    #[must_use]
    pub fn receive_queue_len(&self, channel: ChannelId) -> usize {
        self.channels.get(channel).rx.size()
    }
}
