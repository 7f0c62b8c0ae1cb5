// Licensed under the Apache-2.0 license

//! Register model of one I2C channel.
//!
//! Offsets and bit positions follow the TM4C123 data sheet. The transaction
//! engine only talks to hardware through [`RegisterBlock`], so it can run
//! against memory-mapped registers ([`Mmio`]) or a simulated register file.

/// Master slave-address register (7-bit address, bit 0 is R/S).
pub const MSA: usize = 0x000;
/// Master control/status register. Writes are control words, reads are status.
pub const MCS: usize = 0x004;
/// Master data register.
pub const MDR: usize = 0x008;
/// Master timer period register.
pub const MTPR: usize = 0x00C;
/// Master interrupt mask register.
pub const MIMR: usize = 0x010;
/// Master masked interrupt status register.
pub const MMIS: usize = 0x018;
/// Master interrupt clear register.
pub const MICR: usize = 0x01C;
/// Master configuration register.
pub const MCR: usize = 0x020;
/// Master clock-low timeout count register.
pub const MCLKOCNT: usize = 0x024;
/// Master configuration 2 register (glitch filter pulse width).
pub const MCR2: usize = 0x038;
/// Slave own address register.
pub const SOAR: usize = 0x800;
/// Slave control/status register.
pub const SCSR: usize = 0x804;
/// Slave interrupt mask register.
pub const SIMR: usize = 0x80C;
/// Slave masked interrupt status register.
pub const SMIS: usize = 0x814;
/// Slave interrupt clear register.
pub const SICR: usize = 0x818;
/// Slave own address 2 register.
pub const SOAR2: usize = 0x81C;

/// MSA read/write direction bit.
pub const MSA_RS: u32 = 1 << 0;

/// MCS control bits (write).
pub mod control {
    pub const RUN: u32 = 1 << 0;
    pub const START: u32 = 1 << 1;
    pub const STOP: u32 = 1 << 2;
    pub const ACK: u32 = 1 << 3;
    pub const HS: u32 = 1 << 4;
}

/// MCS status bits (read).
pub mod status {
    pub const BUSY: u32 = 1 << 0;
    pub const ERROR: u32 = 1 << 1;
    pub const ADRACK: u32 = 1 << 2;
    pub const DATACK: u32 = 1 << 3;
    pub const ARBLST: u32 = 1 << 4;
    pub const IDLE: u32 = 1 << 5;
    pub const BUSBSY: u32 = 1 << 6;
    pub const CLKTO: u32 = 1 << 7;
}

/// MCR bits.
pub mod mcr {
    pub const LPBK: u32 = 1 << 0;
    pub const MFE: u32 = 1 << 4;
    pub const SFE: u32 = 1 << 5;
    pub const GFE: u32 = 1 << 6;
}

/// MCR2 glitch filter pulse width field.
pub const MCR2_GFPW_SHIFT: u32 = 4;
pub const MCR2_GFPW_MASK: u32 = 0x7;
/// MTPR timer period field.
pub const MTPR_TPR_MASK: u32 = 0x7F;
/// MTPR high-speed enable bit.
pub const MTPR_HS: u32 = 1 << 7;
/// MIMR bits.
pub const MIMR_IM: u32 = 1 << 0;
pub const MIMR_CLKIM: u32 = 1 << 1;
/// SIMR bits.
pub const SIMR_DATAIM: u32 = 1 << 0;
pub const SIMR_STARTIM: u32 = 1 << 1;
pub const SIMR_STOPIM: u32 = 1 << 2;
/// SOAR2 enable bit for the secondary own address.
pub const SOAR2_OAR2EN: u32 = 1 << 7;
/// SCSR bits. `DA` is the write-side device-active bit, `RREQ`/`TREQ` are
/// the read-side request flags.
pub const SCSR_DA: u32 = 1 << 0;
pub const SCSR_RREQ: u32 = 1 << 0;
pub const SCSR_TREQ: u32 = 1 << 1;

/// Control words driven onto MCS by the master engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlWord {
    /// START + RUN + STOP: a complete one-byte transaction.
    Single,
    /// START + RUN: first byte of a transmit burst.
    BurstSendStart,
    /// RUN: next byte of a transmit burst.
    BurstSendContinue,
    /// START + RUN + ACK: first byte of a receive burst.
    BurstReceiveStart,
    /// RUN + ACK: next byte of a receive burst.
    BurstReceiveContinue,
    /// RUN + STOP: last byte of a burst, ACK deasserted.
    BurstFinish,
    /// STOP alone: release the bus after an error.
    Stop,
}

impl ControlWord {
    #[must_use]
    pub const fn bits(self) -> u32 {
        use control::{ACK, RUN, START, STOP};
        match self {
            ControlWord::Single => START | RUN | STOP,
            ControlWord::BurstSendStart => START | RUN,
            ControlWord::BurstSendContinue => RUN,
            ControlWord::BurstReceiveStart => START | RUN | ACK,
            ControlWord::BurstReceiveContinue => RUN | ACK,
            ControlWord::BurstFinish => RUN | STOP,
            ControlWord::Stop => STOP,
        }
    }
}

/// Access to one channel's register block.
///
/// Implementations must preserve volatile semantics: every `read` hits the
/// device and every `write` is performed exactly once, in program order.
pub trait RegisterBlock {
    fn read(&self, offset: usize) -> u32;
    fn write(&self, offset: usize, value: u32);

    fn modify(&self, offset: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    fn set_bits(&self, offset: usize, bits: u32) {
        self.modify(offset, |v| v | bits);
    }

    fn clear_bits(&self, offset: usize, bits: u32) {
        self.modify(offset, |v| v & !bits);
    }

    fn is_set(&self, offset: usize, bits: u32) -> bool {
        self.read(offset) & bits != 0
    }
}

/// Memory-mapped register block at a fixed base address.
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// # Safety
    ///
    /// `base` must be the address of a register block that stays mapped for
    /// the lifetime of the returned value, and no other code may access that
    /// block concurrently in a conflicting way.
    #[must_use]
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBlock for Mmio {
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: the constructor contract guarantees `base + offset` is a
        // mapped, aligned device register.
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    fn write(&self, offset: usize, value: u32) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }
}
