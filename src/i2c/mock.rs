// Licensed under the Apache-2.0 license

//! Simulated hardware used by the unit tests.
//!
//! [`MockRegisters`] models the master control/status state machine closely
//! enough to drive the transaction engine: every control word keeps BUSY set
//! for a configurable number of status reads, BUSBSY can be held for a number
//! of reads to exercise the bus-free gate, status faults and stalls can be
//! scripted per control word, and received bytes are served from a script.
//! Every write is recorded.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::i2c::common::ChannelId;
use crate::i2c::registers::{status, RegisterBlock, MCS, MDR};
use crate::i2c::traits::{ClockGate, IrqControl, PinRouting};

#[derive(Default)]
struct MockState {
    regs: HashMap<usize, u32>,
    writes: Vec<(usize, u32)>,
    control_words: usize,
    busy_polls: u32,
    busy_remaining: u32,
    bus_busy_remaining: u32,
    faults: HashMap<usize, u32>,
    stalls: HashSet<usize>,
    current_fault: u32,
    rx_data: VecDeque<u8>,
    status_reads: usize,
}

#[derive(Default)]
pub struct MockRegisters {
    state: RefCell<MockState>,
}

impl MockRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status reads that report BUSY after each control word.
    pub fn set_busy_polls(&self, polls: u32) {
        self.state.borrow_mut().busy_polls = polls;
    }

    /// Status reads that report BUSBSY before the bus is free.
    pub fn set_bus_busy_polls(&self, polls: u32) {
        self.state.borrow_mut().bus_busy_remaining = polls;
    }

    pub fn bus_busy_remaining(&self) -> u32 {
        self.state.borrow().bus_busy_remaining
    }

    /// Status bits reported once the `index`-th control word (0-based)
    /// completes.
    pub fn fault_on(&self, index: usize, bits: u32) {
        self.state.borrow_mut().faults.insert(index, bits);
    }

    /// The `index`-th control word never completes.
    pub fn stall_on(&self, index: usize) {
        self.state.borrow_mut().stalls.insert(index);
    }

    pub fn push_rx(&self, bytes: &[u8]) {
        self.state.borrow_mut().rx_data.extend(bytes.iter().copied());
    }

    /// Presets a register without recording a write.
    pub fn preset(&self, offset: usize, value: u32) {
        self.state.borrow_mut().regs.insert(offset, value);
    }

    pub fn value(&self, offset: usize) -> u32 {
        self.state.borrow().regs.get(&offset).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.state.borrow().writes.clone()
    }

    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn control_words(&self) -> Vec<u32> {
        self.writes_to(MCS)
    }

    pub fn data_writes(&self) -> Vec<u8> {
        self.writes_to(MDR).iter().map(|v| *v as u8).collect()
    }

    pub fn status_reads(&self) -> usize {
        self.state.borrow().status_reads
    }

    pub fn clear_log(&self) {
        let mut state = self.state.borrow_mut();
        state.writes.clear();
        state.status_reads = 0;
    }
}

impl RegisterBlock for MockRegisters {
    fn read(&self, offset: usize) -> u32 {
        let mut state = self.state.borrow_mut();
        match offset {
            MCS => {
                state.status_reads += 1;
                if state.busy_remaining > 0 {
                    state.busy_remaining -= 1;
                    return status::BUSY;
                }
                let mut word = state.current_fault;
                if state.bus_busy_remaining > 0 {
                    state.bus_busy_remaining -= 1;
                    word |= status::BUSBSY;
                }
                word
            }
            MDR => u32::from(state.rx_data.pop_front().unwrap_or(0)),
            _ => state.regs.get(&offset).copied().unwrap_or(0),
        }
    }

    fn write(&self, offset: usize, value: u32) {
        let mut state = self.state.borrow_mut();
        state.writes.push((offset, value));
        if offset == MCS {
            let index = state.control_words;
            state.control_words += 1;
            state.current_fault = state.faults.get(&index).copied().unwrap_or(0);
            state.busy_remaining = if state.stalls.contains(&index) {
                u32::MAX
            } else {
                state.busy_polls
            };
        } else {
            state.regs.insert(offset, value);
        }
    }
}

/// Platform stand-in recording clock, pin and IRQ requests.
#[derive(Default)]
pub struct MockPlatform {
    /// Report every clock as gated, so repeated table entries are not
    /// filtered by the clock check.
    pub report_clock_off: bool,
    pub clocks: u8,
    pub clock_enables: Vec<ChannelId>,
    pub routed: Vec<ChannelId>,
    pub irqs: Vec<ChannelId>,
}

impl ClockGate for MockPlatform {
    fn is_clock_enabled(&self, channel: ChannelId) -> bool {
        !self.report_clock_off && self.clocks & channel.mask() != 0
    }

    fn enable_clock(&mut self, channel: ChannelId) {
        self.clocks |= channel.mask();
        self.clock_enables.push(channel);
    }
}

impl PinRouting for MockPlatform {
    fn route_pins(&mut self, channel: ChannelId) {
        self.routed.push(channel);
    }
}

impl IrqControl for MockPlatform {
    fn enable_irq(&mut self, channel: ChannelId) {
        self.irqs.push(channel);
    }
}
