//! RAM vector table
//!
//! Keeps a typed mirror of the slot entries next to the hardware-visible
//! table. The mirror answers "who owns this slot" without reading function
//! addresses back out of memory; every write to the real table goes
//! through [`VectorMemory::store`].

use core::mem::size_of;

use vectis_hal::{Isr, SlotId, VectorMemory};

use crate::fault::{fatal, Fault};

/// Slot entry as seen by the manager
#[derive(Debug, Clone, Copy)]
pub enum Vector {
    /// Default handler installed
    Unset,
    /// Handler installed by a driver
    Handler(Isr),
}

impl Vector {
    pub fn is_set(&self) -> bool {
        matches!(self, Vector::Handler(_))
    }

    /// Address stored in the hardware table for this entry
    pub fn address(&self, default: Isr) -> usize {
        match self {
            Vector::Unset => default as usize,
            Vector::Handler(isr) => *isr as usize,
        }
    }
}

/// Smallest alignment the table-base register accepts for a table of
/// `entries` words: the table size rounded up to a power of two, and never
/// below 128 bytes.
pub fn table_alignment(entries: usize) -> usize {
    (entries * size_of::<usize>()).next_power_of_two().max(128)
}

/// Relocatable vector table with room for `N` slot entries
pub struct VectorTable<V, const N: usize> {
    memory: V,
    slots: usize,
    mirror: [Vector; N],
    relocated: bool,
}

impl<V: VectorMemory, const N: usize> VectorTable<V, N> {
    /// Wrap the table memory for a pool of `slots` slots (at most `N`)
    pub fn new(memory: V, slots: usize) -> Self {
        Self {
            memory,
            slots: slots.min(N),
            mirror: [Vector::Unset; N],
            relocated: false,
        }
    }

    /// Copy the boot table to RAM, verify it and make it the active table
    ///
    /// Afterwards every slot entry holds the default handler. Any
    /// inconsistency is fatal.
    pub fn relocate(&mut self) {
        let entries = self.memory.entries();
        let needed = V::SLOT_OFFSET + self.slots;
        if entries < needed {
            fatal(Fault::TableTooSmall { entries, needed });
        }

        let base = self.memory.ram_base();
        let align = table_alignment(entries);
        if base & (align - 1) != 0 {
            fatal(Fault::TableMisaligned { base, align });
        }

        for index in 0..entries {
            let word = self.memory.boot_entry(index);
            self.memory.store(index, word);
        }

        for index in 0..entries {
            if self.memory.ram_entry(index) != self.memory.boot_entry(index) {
                fatal(Fault::TableCopyMismatch { index });
            }
        }

        critical_section::with(|_| self.memory.set_active_base(base));

        if self.memory.active_base() != base {
            fatal(Fault::TableNotActive);
        }
        self.relocated = true;

        let default = self.memory.default_handler() as usize;
        for slot in 0..self.slots {
            self.memory.store(V::SLOT_OFFSET + slot, default);
            self.mirror[slot] = Vector::Unset;
        }

        info!(
            "vector table relocated to {=usize:#x} ({=usize} entries)",
            base, entries
        );
    }

    /// Check if the RAM table is the active one
    pub fn is_relocated(&self) -> bool {
        self.relocated
    }

    /// Install a handler for a slot
    ///
    /// The caller keeps the slot's line disabled; the store itself also
    /// runs with interrupts masked.
    pub fn install(&mut self, slot: SlotId, handler: Isr) {
        self.write(slot, Vector::Handler(handler));
    }

    /// Put the default handler back into a slot
    pub fn uninstall(&mut self, slot: SlotId) {
        self.write(slot, Vector::Unset);
    }

    fn write(&mut self, slot: SlotId, vector: Vector) {
        let address = vector.address(self.memory.default_handler());
        let index = V::SLOT_OFFSET + slot.index();
        critical_section::with(|_| self.memory.store(index, address));
        self.mirror[slot.index()] = vector;
    }

    /// Entry currently recorded for a slot
    pub fn get(&self, slot: SlotId) -> Vector {
        self.mirror
            .get(slot.index())
            .copied()
            .unwrap_or(Vector::Unset)
    }

    /// Address the hardware table holds for a slot
    pub fn hardware_entry(&self, slot: SlotId) -> usize {
        self.memory.ram_entry(V::SLOT_OFFSET + slot.index())
    }

    pub fn memory(&self) -> &V {
        &self.memory
    }
}
