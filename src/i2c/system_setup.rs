// Licensed under the Apache-2.0 license

//! I2C System Setup Helper
//!
//! Platform services the initialization sequencer needs on a TM4C123:
//! run-mode clock gating through the system control block, routing of the
//! SCL/SDA pads to the I2C alternate function, and unmasking of the channel
//! interrupt in the NVIC (ARM targets only).
//!
//! [`Tm4cPlatform`] is generic over [`RegisterBlock`] so that the clock and
//! pin sequences can be exercised against a simulated register file.

use crate::i2c::common::{ChannelId, PerChannel};
use crate::i2c::registers::RegisterBlock;
use crate::i2c::traits::{ClockGate, PinRouting};

/// System control: I2C run-mode clock gating.
pub const RCGCI2C: usize = 0x620;
/// System control: I2C peripheral ready.
pub const PRI2C: usize = 0xA20;
/// System control: GPIO run-mode clock gating.
pub const RCGCGPIO: usize = 0x608;
/// System control: GPIO peripheral ready.
pub const PRGPIO: usize = 0xA08;

/// GPIO alternate function select.
pub const GPIO_AFSEL: usize = 0x420;
/// GPIO open-drain select.
pub const GPIO_ODR: usize = 0x50C;
/// GPIO digital enable.
pub const GPIO_DEN: usize = 0x51C;
/// GPIO port control (4-bit mux field per pin).
pub const GPIO_PCTL: usize = 0x52C;

/// Port-control mux value selecting I2C on every I2C-capable pad.
const PCTL_I2C: u32 = 3;

/// GPIO port and pads carrying one channel's bus lines.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PinMap {
    /// Bit of the port in `RCGCGPIO`/`PRGPIO`.
    pub port: u8,
    pub scl: u8,
    pub sda: u8,
}

/// Default pad assignment: PB2/PB3, PA6/PA7, PE4/PE5, PD0/PD1.
pub const PIN_MAP: [PinMap; 4] = [
    PinMap { port: 1, scl: 2, sda: 3 },
    PinMap { port: 0, scl: 6, sda: 7 },
    PinMap { port: 4, scl: 4, sda: 5 },
    PinMap { port: 3, scl: 0, sda: 1 },
];

/// NVIC interrupt lines of the I2C channels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum I2cIrq {
    I2c0 = 8,
    I2c1 = 37,
    I2c2 = 68,
    I2c3 = 69,
}

impl From<ChannelId> for I2cIrq {
    fn from(channel: ChannelId) -> Self {
        match channel {
            ChannelId::I2c0 => I2cIrq::I2c0,
            ChannelId::I2c1 => I2cIrq::I2c1,
            ChannelId::I2c2 => I2cIrq::I2c2,
            ChannelId::I2c3 => I2cIrq::I2c3,
        }
    }
}

#[cfg(target_arch = "arm")]
// SAFETY: the discriminants are the device's I2C IRQ numbers.
unsafe impl cortex_m::interrupt::InterruptNumber for I2cIrq {
    fn number(self) -> u16 {
        self as u16
    }
}

/// TM4C123 platform services for the I2C driver.
pub struct Tm4cPlatform<S: RegisterBlock, G: RegisterBlock> {
    sysctl: S,
    gpio: PerChannel<G>,
    pins: PerChannel<PinMap>,
}

impl<S: RegisterBlock, G: RegisterBlock> Tm4cPlatform<S, G> {
    /// `gpio` holds, per channel, the register block of the GPIO port that
    /// carries that channel's pads.
    pub fn new(sysctl: S, gpio: [G; 4]) -> Self {
        Self::with_pins(sysctl, gpio, PIN_MAP)
    }

    pub fn with_pins(sysctl: S, gpio: [G; 4], pins: [PinMap; 4]) -> Self {
        Self {
            sysctl,
            gpio: PerChannel::new(gpio),
            pins: PerChannel::new(pins),
        }
    }

    fn wait_ready(&self, offset: usize, bit: u32) {
        while !self.sysctl.is_set(offset, bit) {
            core::hint::spin_loop();
        }
    }
}

impl<S: RegisterBlock, G: RegisterBlock> ClockGate for Tm4cPlatform<S, G> {
    fn is_clock_enabled(&self, channel: ChannelId) -> bool {
        self.sysctl.is_set(RCGCI2C, u32::from(channel.mask()))
    }

    fn enable_clock(&mut self, channel: ChannelId) {
        let bit = u32::from(channel.mask());
        self.sysctl.set_bits(RCGCI2C, bit);
        self.wait_ready(PRI2C, bit);
    }
}

impl<S: RegisterBlock, G: RegisterBlock> PinRouting for Tm4cPlatform<S, G> {
    fn route_pins(&mut self, channel: ChannelId) {
        let map = *self.pins.get(channel);
        let port_bit = 1u32 << map.port;
        if !self.sysctl.is_set(RCGCGPIO, port_bit) {
            self.sysctl.set_bits(RCGCGPIO, port_bit);
            self.wait_ready(PRGPIO, port_bit);
        }

        let gpio = self.gpio.get(channel);
        let scl = 1u32 << map.scl;
        let sda = 1u32 << map.sda;
        gpio.set_bits(GPIO_AFSEL, scl | sda);
        gpio.set_bits(GPIO_ODR, sda);
        gpio.set_bits(GPIO_DEN, scl | sda);
        gpio.modify(GPIO_PCTL, |v| {
            let scl_shift = u32::from(map.scl) * 4;
            let sda_shift = u32::from(map.sda) * 4;
            (v & !((0xF << scl_shift) | (0xF << sda_shift)))
                | (PCTL_I2C << scl_shift)
                | (PCTL_I2C << sda_shift)
        });
    }
}

#[cfg(target_arch = "arm")]
impl<S: RegisterBlock, G: RegisterBlock> crate::i2c::traits::IrqControl for Tm4cPlatform<S, G> {
    fn enable_irq(&mut self, channel: ChannelId) {
        // SAFETY: unmasking may break mask-based critical sections; the
        // driver's shared state is guarded by `critical_section` instead.
        unsafe { cortex_m::peripheral::NVIC::unmask(I2cIrq::from(channel)) };
    }
}
