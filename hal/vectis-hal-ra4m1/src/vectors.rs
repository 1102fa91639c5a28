//! RAM vector table and VTOR
//!
//! The boot table in flash is copied into [`ENTRIES`] words of SRAM; the
//! interrupt manager then points VTOR at the copy and patches slot entries
//! in place. 48 words is 192 bytes, so VTOR needs 256-byte alignment.

use core::cell::UnsafeCell;

use cortex_m::asm;
use cortex_m::peripheral::SCB;
use vectis_core::fault::{fatal, Fault};
use vectis_hal::{Isr, VectorMemory};

use crate::icu::SLOTS;

/// Core exceptions ahead of the first slot entry
pub const EXCEPTIONS: usize = 16;

/// Entries in the RAM table
pub const ENTRIES: usize = EXCEPTIONS + SLOTS;

const ICSR_VECTACTIVE_MASK: u32 = 0x1FF;

#[repr(C, align(256))]
struct Table(UnsafeCell<[usize; ENTRIES]>);

// SAFETY: only `RamVectors` writes the table, through `&mut self` and with
// interrupts masked; the core only reads it
unsafe impl Sync for Table {}

static RAM_TABLE: Table = Table(UnsafeCell::new([0; ENTRIES]));

/// Boot table, RAM table and the VTOR register
pub struct RamVectors {
    scb: SCB,
    boot_base: usize,
}

impl RamVectors {
    /// Take ownership of the SCB
    ///
    /// The table VTOR points at on entry is treated as the boot table.
    pub fn new(scb: SCB) -> Self {
        let boot_base = scb.vtor.read() as usize;
        Self { scb, boot_base }
    }

    fn ram(&self) -> *mut usize {
        RAM_TABLE.0.get() as *mut usize
    }
}

impl VectorMemory for RamVectors {
    const SLOT_OFFSET: usize = EXCEPTIONS;

    fn entries(&self) -> usize {
        ENTRIES
    }

    fn boot_entry(&self, index: usize) -> usize {
        let addr = (self.boot_base + index * 4) as *const usize;
        // SAFETY: the boot table spans at least ENTRIES words of flash
        unsafe { addr.read_volatile() }
    }

    fn ram_entry(&self, index: usize) -> usize {
        if index >= ENTRIES {
            return 0;
        }
        // SAFETY: index checked against the table length
        unsafe { self.ram().add(index).read_volatile() }
    }

    fn ram_base(&self) -> usize {
        self.ram() as usize
    }

    fn active_base(&self) -> usize {
        self.scb.vtor.read() as usize
    }

    fn store(&mut self, index: usize, entry: usize) {
        if index >= ENTRIES {
            return;
        }
        cortex_m::interrupt::free(|_| {
            // SAFETY: index checked; interrupts are masked while the word
            // changes and the barrier completes before they return
            unsafe { self.ram().add(index).write_volatile(entry) };
            asm::dsb();
        });
    }

    fn set_active_base(&mut self, base: usize) {
        // SAFETY: callers only pass the verified, aligned RAM copy
        unsafe { self.scb.vtor.write(base as u32) };
        asm::dsb();
        asm::isb();
    }

    fn default_handler(&self) -> Isr {
        unassigned_interrupt
    }
}

/// Slot entry for every unassigned slot
///
/// Reached only when a slot fires without a handler, which means routing
/// and table are out of step.
extern "C" fn unassigned_interrupt() {
    let slot = active_vector().saturating_sub(EXCEPTIONS as u16);
    fatal(Fault::UnassignedInterrupt(slot));
}

/// Exception number being serviced (ICSR.VECTACTIVE)
pub(crate) fn active_vector() -> u16 {
    // SAFETY: read-only access to ICSR
    let icsr = unsafe { (*SCB::PTR).icsr.read() };
    (icsr & ICSR_VECTACTIVE_MASK) as u16
}
