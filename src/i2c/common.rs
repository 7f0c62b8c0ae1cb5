// Licensed under the Apache-2.0 license

//! Common types for the I2C driver: channel identifiers and the channel
//! configuration model consumed by the initialization sequencer.

use heapless::Vec;

/// Number of I2C channel instances on the device.
pub const CHANNEL_COUNT: usize = 4;

/// Maximum number of interrupt sources a channel configuration may list.
pub const ALLOWED_INTERRUPTS: usize = 4;

/// I2C channel instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChannelId {
    I2c0 = 0,
    I2c1 = 1,
    I2c2 = 2,
    I2c3 = 3,
}

impl ChannelId {
    pub const ALL: [ChannelId; CHANNEL_COUNT] = [
        ChannelId::I2c0,
        ChannelId::I2c1,
        ChannelId::I2c2,
        ChannelId::I2c3,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit of this channel in a module-usage mask.
    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

/// One value per channel, addressed by [`ChannelId`].
#[derive(Clone, Debug, Default)]
pub struct PerChannel<T>([T; CHANNEL_COUNT]);

impl<T> PerChannel<T> {
    #[must_use]
    pub const fn new(values: [T; CHANNEL_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn get(&self, channel: ChannelId) -> &T {
        let [c0, c1, c2, c3] = &self.0;
        match channel {
            ChannelId::I2c0 => c0,
            ChannelId::I2c1 => c1,
            ChannelId::I2c2 => c2,
            ChannelId::I2c3 => c3,
        }
    }

    #[cfg(test)]
    pub fn get_mut(&mut self, channel: ChannelId) -> &mut T {
        let [c0, c1, c2, c3] = &mut self.0;
        match channel {
            ChannelId::I2c0 => c0,
            ChannelId::I2c1 => c1,
            ChannelId::I2c2 => c2,
            ChannelId::I2c3 => c3,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PerChannel<U> {
        PerChannel(self.0.map(f))
    }
}

/// Bus speed class.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cSpeed {
    /// 100 kbps.
    Standard,
    /// 400 kbps.
    Fast,
    /// 1 Mbps.
    FastPlus,
    /// 3.33 Mbps, requires the high-speed timing bit.
    HighSpeed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelMode {
    Master,
    Slave,
}

/// Master interrupt sources.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MasterInterrupt {
    TransactionComplete,
    ArbitrationLost,
    TransactionError,
    BusTimeout,
}

/// Slave interrupt sources.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveInterrupt {
    TransactionReceived,
    TransactionRequested,
    StartCondition,
    StopCondition,
}

/// Whether a transaction continues a previous one without releasing the bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RepeatedStart {
    /// Fresh transaction: wait for the bus to be free before START.
    #[default]
    Off,
    /// Continuation: the bus is already held by this controller.
    On,
}

/// Transfer direction, used to select interrupt callbacks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Transmit,
    Receive,
}

/// Static description of one channel.
///
/// Created once from configuration data and consumed by
/// [`I2cDriver::init`](crate::i2c::I2cDriver::init).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    pub channel: ChannelId,
    pub mode: ChannelMode,
    pub speed: I2cSpeed,
    /// Glitch filter pulse width when suppression is enabled.
    pub glitch_suppression: Option<u8>,
    pub loop_back: bool,
    pub clock_low_timeout: u8,
    pub slave_address: u8,
    pub slave_address2: Option<u8>,
    pub master_interrupts: Vec<MasterInterrupt, ALLOWED_INTERRUPTS>,
    pub slave_interrupts: Vec<SlaveInterrupt, ALLOWED_INTERRUPTS>,
}

impl ChannelConfig {
    #[must_use]
    pub fn builder(channel: ChannelId) -> ChannelConfigBuilder {
        ChannelConfigBuilder::new(channel)
    }

    #[must_use]
    pub fn has_interrupts(&self) -> bool {
        match self.mode {
            ChannelMode::Master => !self.master_interrupts.is_empty(),
            ChannelMode::Slave => !self.slave_interrupts.is_empty(),
        }
    }
}

pub struct ChannelConfigBuilder {
    channel: ChannelId,
    mode: ChannelMode,
    speed: I2cSpeed,
    glitch_suppression: Option<u8>,
    loop_back: bool,
    clock_low_timeout: u8,
    slave_address: u8,
    slave_address2: Option<u8>,
    master_interrupts: Vec<MasterInterrupt, ALLOWED_INTERRUPTS>,
    slave_interrupts: Vec<SlaveInterrupt, ALLOWED_INTERRUPTS>,
}

impl ChannelConfigBuilder {
    #[must_use]
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            mode: ChannelMode::Master,
            speed: I2cSpeed::Standard,
            glitch_suppression: None,
            loop_back: false,
            clock_low_timeout: 0,
            slave_address: 0,
            slave_address2: None,
            master_interrupts: Vec::new(),
            slave_interrupts: Vec::new(),
        }
    }
    #[must_use]
    pub fn mode(mut self, mode: ChannelMode) -> Self {
        self.mode = mode;
        self
    }
    #[must_use]
    pub fn speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }
    #[must_use]
    pub fn glitch_suppression(mut self, pulse_width: Option<u8>) -> Self {
        self.glitch_suppression = pulse_width;
        self
    }
    #[must_use]
    pub fn loop_back(mut self, enabled: bool) -> Self {
        self.loop_back = enabled;
        self
    }
    #[must_use]
    pub fn clock_low_timeout(mut self, count: u8) -> Self {
        self.clock_low_timeout = count;
        self
    }
    #[must_use]
    pub fn slave_address(mut self, address: u8) -> Self {
        self.slave_address = address;
        self
    }
    #[must_use]
    pub fn slave_address2(mut self, address: Option<u8>) -> Self {
        self.slave_address2 = address;
        self
    }
    /// Sources beyond [`ALLOWED_INTERRUPTS`] are ignored.
    #[must_use]
    pub fn master_interrupt(mut self, source: MasterInterrupt) -> Self {
        let _ = self.master_interrupts.push(source);
        self
    }
    /// Sources beyond [`ALLOWED_INTERRUPTS`] are ignored.
    #[must_use]
    pub fn slave_interrupt(mut self, source: SlaveInterrupt) -> Self {
        let _ = self.slave_interrupts.push(source);
        self
    }
    #[must_use]
    pub fn build(self) -> ChannelConfig {
        ChannelConfig {
            channel: self.channel,
            mode: self.mode,
            speed: self.speed,
            glitch_suppression: self.glitch_suppression,
            loop_back: self.loop_back,
            clock_low_timeout: self.clock_low_timeout,
            slave_address: self.slave_address,
            slave_address2: self.slave_address2,
            master_interrupts: self.master_interrupts,
            slave_interrupts: self.slave_interrupts,
        }
    }
}
