// Licensed under the Apache-2.0 license

//! # Collaborator and Wait-Policy Traits
//!
//! The driver does not own the clock tree, the pin multiplexer, or the
//! interrupt controller. It consumes them through the narrow traits below,
//! composed into [`I2cPlatform`] by a blanket implementation:
//!
//! ```text
//! I2cPlatform
//!     ├── ClockGate      (enable / query peripheral clock)
//!     ├── PinRouting     (route SCL/SDA to the I2C alternate function)
//!     └── IrqControl     (unmask the channel's interrupt line)
//! ```
//!
//! Every blocking wait in the driver goes through a [`WaitPolicy`], which
//! drives an `nb`-style poll until it completes.

use crate::i2c::common::ChannelId;
use crate::i2c::error::Error;

/// Peripheral clock gating for I2C channels.
pub trait ClockGate {
    /// Whether the channel's run-mode clock is already enabled.
    fn is_clock_enabled(&self, channel: ChannelId) -> bool;

    /// Enables the clock and returns once the peripheral is ready to be
    /// accessed.
    fn enable_clock(&mut self, channel: ChannelId);
}

/// Pin multiplexing for a channel's clock and data lines.
pub trait PinRouting {
    fn route_pins(&mut self, channel: ChannelId);
}

/// Interrupt controller access for a channel's IRQ line.
pub trait IrqControl {
    fn enable_irq(&mut self, channel: ChannelId);
}

/// Everything the initialization sequencer needs from the rest of the system.
pub trait I2cPlatform: ClockGate + PinRouting + IrqControl {}

/// Blanket implementation: any type providing all three services is a platform.
impl<T> I2cPlatform for T where T: ClockGate + PinRouting + IrqControl {}

/// How the driver waits for a hardware or queue condition.
///
/// `poll` returns `Err(nb::Error::WouldBlock)` while the condition is not
/// met. Implementations decide how long to keep polling.
pub trait WaitPolicy {
    fn wait<T>(&self, poll: impl FnMut() -> nb::Result<T, Error>) -> Result<T, Error>;
}

/// Spins until the condition holds, with no timeout.
///
/// This is the reference behaviour: a stuck bus or a queue nobody fills
/// hangs the caller forever.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpinForever;

impl WaitPolicy for SpinForever {
    fn wait<T>(&self, mut poll: impl FnMut() -> nb::Result<T, Error>) -> Result<T, Error> {
        loop {
            match poll() {
                Ok(value) => return Ok(value),
                Err(nb::Error::Other(e)) => return Err(e),
                Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
            }
        }
    }
}

/// Spins at most `max_polls` times, then fails with [`Error::Timeout`].
#[derive(Clone, Copy, Debug)]
pub struct BoundedSpin {
    pub max_polls: u32,
}

impl WaitPolicy for BoundedSpin {
    fn wait<T>(&self, mut poll: impl FnMut() -> nb::Result<T, Error>) -> Result<T, Error> {
        for _ in 0..self.max_polls {
            match poll() {
                Ok(value) => return Ok(value),
                Err(nb::Error::Other(e)) => return Err(e),
                Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
            }
        }
        Err(Error::Timeout)
    }
}
