// Licensed under the Apache-2.0 license

//! TM4C123 I2C driver module.
//!
//! A queue-based master driver for the four I2C channels of TM4C123-class
//! microcontrollers, for bare-metal and `no_std` environments. Channels are
//! described by a [`ChannelConfig`] table and brought up by
//! [`I2cDriver::init`]; the master engine then moves bytes between the
//! channel's transmit/receive queues and the bus.

pub mod callbacks;
pub mod common;
pub mod driver;
pub mod error;
pub mod hardware_instantiation;
pub mod i2c_controller;
pub mod interrupt;
pub mod master;
pub mod queue;
pub mod registers;
pub mod slave;
pub mod system_setup;
pub mod timing;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use callbacks::Callback;
pub use common::{
    ChannelConfig, ChannelConfigBuilder, ChannelId, ChannelMode, Direction, I2cSpeed,
    MasterInterrupt, RepeatedStart, SlaveInterrupt,
};
pub use driver::I2cDriver;
pub use error::Error;
pub use i2c_controller::I2cController;
pub use registers::{Mmio, RegisterBlock};
pub use traits::{BoundedSpin, I2cPlatform, SpinForever, WaitPolicy};
