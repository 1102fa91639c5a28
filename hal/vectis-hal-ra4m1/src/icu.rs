//! Interrupt controller unit
//!
//! The ICU links one of ~200 peripheral events to each of 32 NVIC lines
//! through the IELSRn registers. Slot `n` is NVIC interrupt `n`, so the
//! vector-table entry of slot `n` is entry `16 + n`.
//!
//! IELSRn.IR latches every linked event and keeps re-pending the NVIC line
//! until software clears it, so each handler installed through the manager
//! has to call [`ack_active`] before it services the peripheral.

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;
use vectis_hal::{EventId, InterruptController, Priority, SlotId, Trigger};

use crate::reg;
use crate::vectors::{self, EXCEPTIONS};

/// Number of event-link slots
pub const SLOTS: usize = 32;

/// Number of external IRQ pin channels
pub const IRQ_CHANNELS: u8 = 16;

/// Highest event number in the event-link table
pub const MAX_EVENT: u16 = 0x1DF;

const ICU_BASE: usize = 0x4000_6000;
const IRQCR: usize = ICU_BASE;
const IELSR: usize = ICU_BASE + 0x300;

const IELSR_IELS_MASK: u32 = 0x1FF;
const IELSR_IR: u32 = 1 << 16;

/// Implemented priority bits (upper nibble of each IPR byte)
const PRIORITY_BITS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Line(u16);

// SAFETY: slot numbers are below the 32 lines the NVIC implements
unsafe impl InterruptNumber for Line {
    fn number(self) -> u16 {
        self.0
    }
}

fn line(slot: SlotId) -> Line {
    Line(slot.0 as u16)
}

fn ielsr(slot: SlotId) -> usize {
    IELSR + 4 * slot.index()
}

/// Slot behind an exception number, if it is one of the event-link lines
fn slot_for_vector(vector: u16) -> Option<SlotId> {
    let slot = (vector as usize).checked_sub(EXCEPTIONS)?;
    (slot < SLOTS).then_some(SlotId(slot as u8))
}

/// IELSRn value with the event flag cleared and the link kept
fn acknowledged(ielsr: u32) -> u32 {
    ielsr & !IELSR_IR
}

/// Clear the event flag of the slot currently being serviced
///
/// Does nothing outside a slot handler. Only the running handler touches
/// its own IELSRn, so the read-modify-write needs no lock.
pub fn ack_active() {
    if let Some(slot) = slot_for_vector(vectors::active_vector()) {
        reg::modify32(ielsr(slot), acknowledged);
    }
}

/// RA4M1 ICU and the NVIC lines behind it
pub struct Icu {
    nvic: NVIC,
}

impl Icu {
    /// Take ownership of the NVIC
    pub fn new(nvic: NVIC) -> Self {
        Self { nvic }
    }
}

impl InterruptController for Icu {
    const SLOTS: usize = SLOTS;

    fn can_route(&self, event: EventId, slot: SlotId) -> bool {
        // RA4M1 has no event groups: any event may use any slot
        slot.index() < SLOTS && event.0 != 0 && event.0 <= MAX_EVENT
    }

    fn route(&mut self, slot: SlotId, event: Option<EventId>) {
        let iels = event.map_or(0, |e| e.0 as u32 & IELSR_IELS_MASK);
        reg::write32(ielsr(slot), iels);
    }

    fn routed(&self, slot: SlotId) -> Option<EventId> {
        match reg::read32(ielsr(slot)) & IELSR_IELS_MASK {
            0 => None,
            iels => Some(EventId(iels as u16)),
        }
    }

    fn enable(&mut self, slot: SlotId) {
        // SAFETY: the manager installs the handler before enabling
        unsafe { NVIC::unmask(line(slot)) };
    }

    fn disable(&mut self, slot: SlotId) {
        NVIC::mask(line(slot));
    }

    fn is_enabled(&self, slot: SlotId) -> bool {
        NVIC::is_enabled(line(slot))
    }

    fn clear_pending(&mut self, slot: SlotId) {
        // Event flag first, or the NVIC line re-pends immediately
        reg::modify32(ielsr(slot), acknowledged);
        NVIC::unpend(line(slot));
    }

    fn set_priority(&mut self, slot: SlotId, priority: Priority) {
        let level = priority.0.min((1 << PRIORITY_BITS) - 1) << (8 - PRIORITY_BITS);
        // SAFETY: priority changes cannot break a critical section here,
        // none of them are priority-based
        unsafe { self.nvic.set_priority(line(slot), level) };
    }

    fn external_event(&self, channel: u8) -> EventId {
        // ICU_IRQ0..15 are events 0x01..0x10
        EventId(channel as u16 + 1)
    }

    fn set_external_trigger(&mut self, channel: u8, trigger: Trigger) {
        if channel >= IRQ_CHANNELS {
            return;
        }
        let mode = match trigger {
            Trigger::Falling => 0b00,
            Trigger::Rising => 0b01,
            Trigger::BothEdges => 0b10,
            Trigger::Low => 0b11,
        };
        reg::modify8(IRQCR + channel as usize, |v| (v & !0b11) | mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_for_vector() {
        assert_eq!(slot_for_vector(15), None);
        assert_eq!(slot_for_vector(16), Some(SlotId(0)));
        assert_eq!(slot_for_vector(47), Some(SlotId(31)));
        assert_eq!(slot_for_vector(48), None);
        assert_eq!(slot_for_vector(0), None);
    }

    #[test]
    fn test_acknowledge_keeps_link() {
        // SCI2 RXI linked and latched
        assert_eq!(acknowledged(0x0001_00A3), 0x0000_00A3);
        assert_eq!(acknowledged(0x0000_00A3), 0x0000_00A3);
        assert_eq!(ielsr(SlotId(3)), 0x4000_630C);
    }
}
