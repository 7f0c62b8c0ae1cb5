// Licensed under the Apache-2.0 license

//! Driver error type and controller status classification.

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

use crate::i2c::common::ChannelId;
use crate::i2c::registers::status;

/// Driver error.
///
/// Every public transaction returns `Result<(), Error>`: `Ok` is a clean
/// transaction, any `Err` means the transaction failed. Errors are recovered
/// where they are detected; the variant only tells the caller why.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Channel was not claimed as master during initialization.
    NotConfiguredAsMaster,
    /// Channel was not claimed as slave during initialization.
    NotConfiguredAsSlave,
    /// Hardware reported an error other than arbitration loss. A STOP has
    /// already been driven where the protocol calls for it.
    Bus { status: u32 },
    /// Another master won the bus. No recovery is attempted.
    ArbitrationLost,
    /// Transmit drain called with nothing queued.
    EmptyQueueOnDrain,
    /// Receive drain called with no room left in the receive queue.
    FullQueueOnReceiveDrain,
    /// Non-blocking push found the transmit queue full; the byte was dropped.
    TransmitQueueFull,
    /// Channel queues were never allocated by `init`.
    QueueNotAllocated,
    /// Multi-byte operation called with fewer than two bytes.
    InvalidByteCount(usize),
    /// Another transaction is in flight on this channel.
    ChannelBusy,
    /// Fatal configuration error: computed timing divisor is outside `(0, 128]`.
    InvalidTimingDivisor { channel: ChannelId, divisor: i64 },
    /// A bounded wait policy gave up.
    Timeout,
    /// Transfer does not fit in a channel queue.
    TransferTooLong,
}

impl Error {
    /// Classifies a master status word with the ERROR bit set.
    #[must_use]
    pub fn from_status(status_word: u32) -> Self {
        if status_word & status::ARBLST != 0 {
            Error::ArbitrationLost
        } else {
            Error::Bus {
                status: status_word,
            }
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match *self {
            Error::ArbitrationLost => ErrorKind::ArbitrationLoss,
            Error::Bus { status: s } if s & status::ADRACK != 0 => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            Error::Bus { status: s } if s & status::DATACK != 0 => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
            }
            Error::Bus { .. } => ErrorKind::Bus,
            Error::TransferTooLong => ErrorKind::Overrun,
            _ => ErrorKind::Other,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::NotConfiguredAsMaster => f.write_str("channel not configured as master"),
            Error::NotConfiguredAsSlave => f.write_str("channel not configured as slave"),
            Error::Bus { status } => write!(f, "bus error (status {status:#04x})"),
            Error::ArbitrationLost => f.write_str("arbitration lost"),
            Error::EmptyQueueOnDrain => f.write_str("transmit queue empty"),
            Error::FullQueueOnReceiveDrain => f.write_str("receive queue full"),
            Error::TransmitQueueFull => f.write_str("transmit queue full, byte dropped"),
            Error::QueueNotAllocated => f.write_str("channel queues not allocated"),
            Error::InvalidByteCount(n) => write!(f, "invalid byte count {n}"),
            Error::ChannelBusy => f.write_str("transaction already in progress"),
            Error::InvalidTimingDivisor { channel, divisor } => {
                write!(f, "invalid timing divisor {divisor} on {channel:?}")
            }
            Error::Timeout => f.write_str("timed out"),
            Error::TransferTooLong => f.write_str("transfer exceeds queue capacity"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::Error as _;

    #[test]
    fn test_from_status_splits_arbitration() {
        assert_eq!(
            Error::from_status(status::ERROR | status::ARBLST),
            Error::ArbitrationLost
        );
        assert_eq!(
            Error::from_status(status::ERROR | status::DATACK),
            Error::Bus {
                status: status::ERROR | status::DATACK
            }
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::ArbitrationLost.kind(), ErrorKind::ArbitrationLoss);
        assert_eq!(
            Error::Bus {
                status: status::ERROR | status::ADRACK
            }
            .kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(
            Error::Bus {
                status: status::ERROR | status::DATACK
            }
            .kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
        );
        assert_eq!(
            Error::Bus {
                status: status::ERROR
            }
            .kind(),
            ErrorKind::Bus
        );
        assert_eq!(Error::ChannelBusy.kind(), ErrorKind::Other);
    }
}
