// Licensed under the Apache-2.0 license

//! Interrupt callback registry: one transmit and one receive hook per
//! channel, defaulting to a no-op.

use crate::i2c::common::{ChannelId, Direction, CHANNEL_COUNT};

/// Application hook run from the interrupt path.
pub type Callback = fn();

fn noop() {}

const NOOP: Callback = noop;

#[derive(Clone, Copy, Debug)]
pub struct CallbackRegistry {
    transmit: [Callback; CHANNEL_COUNT],
    receive: [Callback; CHANNEL_COUNT],
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            transmit: [NOOP; CHANNEL_COUNT],
            receive: [NOOP; CHANNEL_COUNT],
        }
    }

    pub fn set(&mut self, channel: ChannelId, direction: Direction, hook: Callback) {
        let table = match direction {
            Direction::Transmit => &mut self.transmit,
            Direction::Receive => &mut self.receive,
        };
        if let Some(slot) = table.get_mut(channel.index()) {
            *slot = hook;
        }
    }

    /// Restores the no-op default.
    pub fn clear(&mut self, channel: ChannelId, direction: Direction) {
        self.set(channel, direction, NOOP);
    }

    #[must_use]
    pub fn get(&self, channel: ChannelId, direction: Direction) -> Callback {
        let table = match direction {
            Direction::Transmit => &self.transmit,
            Direction::Receive => &self.receive,
        };
        table.get(channel.index()).copied().unwrap_or(NOOP)
    }

    pub fn invoke(&self, channel: ChannelId, direction: Direction) {
        (self.get(channel, direction))();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static TX1_CALLS: AtomicUsize = AtomicUsize::new(0);
    static RX3_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn tx1_hook() {
        TX1_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    fn rx3_hook() {
        RX3_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_defaults_are_noops() {
        let registry = CallbackRegistry::new();
        for ch in ChannelId::ALL {
            registry.invoke(ch, Direction::Transmit);
            registry.invoke(ch, Direction::Receive);
        }
    }

    #[test]
    fn test_hooks_are_per_channel_and_direction() {
        let mut registry = CallbackRegistry::new();
        registry.set(ChannelId::I2c1, Direction::Transmit, tx1_hook);
        registry.set(ChannelId::I2c3, Direction::Receive, rx3_hook);

        registry.invoke(ChannelId::I2c1, Direction::Transmit);
        registry.invoke(ChannelId::I2c1, Direction::Receive);
        registry.invoke(ChannelId::I2c3, Direction::Receive);
        registry.invoke(ChannelId::I2c3, Direction::Receive);

        assert_eq!(TX1_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(RX3_CALLS.load(Ordering::SeqCst), 2);

        registry.clear(ChannelId::I2c3, Direction::Receive);
        registry.invoke(ChannelId::I2c3, Direction::Receive);
        assert_eq!(RX3_CALLS.load(Ordering::SeqCst), 2);
    }
}
