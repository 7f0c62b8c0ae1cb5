// Licensed under the Apache-2.0 license

//! # I2C Hardware Instantiation for TM4C123
//!
//! Memory-mapped register blocks for the four I2C channels, the system
//! control block and the GPIO ports carrying the bus pads.
//!
//! All four channels share one register layout, so unlike a PAC with a type
//! per peripheral, the blocks fit in a plain array indexed by channel:
//!
//! ```rust,ignore
//! use fugit::RateExtU32;
//! use tiva_i2c::i2c::hardware_instantiation::{instantiate_hardware, instantiate_platform};
//! use tiva_i2c::i2c::I2cDriver;
//!
//! // SAFETY: called once at startup, before anything else touches I2C.
//! let (registers, mut platform) = unsafe { (instantiate_hardware(), instantiate_platform()) };
//! let mut driver = I2cDriver::new(registers, 80.MHz());
//! driver.init(&CHANNEL_TABLE, &mut platform)?;
//! ```

use crate::i2c::common::ChannelId;
use crate::i2c::registers::Mmio;
use crate::i2c::system_setup::Tm4cPlatform;

/// Base address of I2C channel 0; channel `n` sits `n * I2C_STRIDE` above.
pub const I2C_BASE: usize = 0x4002_0000;
pub const I2C_STRIDE: usize = 0x1000;
/// System control block.
pub const SYSCTL_BASE: usize = 0x400F_E000;

/// APB aperture of the GPIO port carrying each channel's pads (B, A, E, D).
pub const GPIO_PORT_BASE: [usize; 4] = [0x4000_5000, 0x4000_4000, 0x4002_4000, 0x4000_7000];

#[must_use]
pub const fn i2c_base(channel: ChannelId) -> usize {
    I2C_BASE + channel.index() * I2C_STRIDE
}

/// Register blocks of all channels, in channel order.
///
/// # Safety
///
/// Must only be called on a TM4C123-class device, and the returned blocks
/// must be the only handles to the I2C register space.
#[must_use]
pub unsafe fn instantiate_hardware() -> [Mmio; 4] {
    ChannelId::ALL.map(|channel| Mmio::new(i2c_base(channel)))
}

/// Platform services backed by the memory-mapped system control block and
/// the default GPIO ports.
///
/// # Safety
///
/// Same contract as [`instantiate_hardware`]. Other code may still use the
/// system control block and the GPIO ports, but not concurrently with
/// [`I2cDriver::init`](crate::i2c::I2cDriver::init).
#[must_use]
pub unsafe fn instantiate_platform() -> Tm4cPlatform<Mmio, Mmio> {
    Tm4cPlatform::new(Mmio::new(SYSCTL_BASE), GPIO_PORT_BASE.map(|base| Mmio::new(base)))
}
