//! Interrupt controller and vector table abstractions
//!
//! The controller exposes a fixed pool of slots. Each slot is one NVIC
//! line plus one routing register selecting which hardware event feeds it.
//! The vector table memory model covers the boot-time table, the writable
//! RAM copy and the table-base register.

/// Interrupt service routine entry point as stored in the vector table
pub type Isr = extern "C" fn();

/// Index of a controller slot (0-based, excluding core exceptions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(pub u8);

impl SlotId {
    /// Slot index as usize
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Hardware event source number (event-link number on RA parts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventId(pub u16);

/// Interrupt priority, 0 is the most urgent
///
/// Only the implemented high-order bits are significant; the chip crate
/// shifts the value into place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Priority(pub u8);

impl Default for Priority {
    fn default() -> Self {
        // Middle of the 4-bit range used by RA parts
        Self(12)
    }
}

/// Detection mode for an external pin interrupt channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    Falling,
    Rising,
    BothEdges,
    Low,
}

/// Interrupt controller slot model
///
/// Implementations own the NVIC enable/pending/priority bits for each slot
/// and the routing register (`IELSRn` on RA parts) that binds an event
/// source to it.
pub trait InterruptController {
    /// Number of slots in the pool
    const SLOTS: usize;

    /// Whether `event` may legally be routed to `slot`
    ///
    /// Some parts restrict events to slot groups. Parts without such
    /// constraints return `true` for every in-range slot.
    fn can_route(&self, event: EventId, slot: SlotId) -> bool;

    /// Point the slot's routing register at `event`, or unroute it with `None`
    fn route(&mut self, slot: SlotId, event: Option<EventId>);

    /// Event currently routed to the slot
    fn routed(&self, slot: SlotId) -> Option<EventId>;

    /// Enable the slot's line
    fn enable(&mut self, slot: SlotId);

    /// Disable the slot's line
    fn disable(&mut self, slot: SlotId);

    /// Check if the slot's line is enabled
    fn is_enabled(&self, slot: SlotId) -> bool;

    /// Clear the pending bit and any latched event status for the slot
    fn clear_pending(&mut self, slot: SlotId);

    /// Set the slot's priority
    fn set_priority(&mut self, slot: SlotId, priority: Priority);

    /// Event number raised by external interrupt channel `channel`
    fn external_event(&self, channel: u8) -> EventId;

    /// Configure the detection mode of an external interrupt channel
    fn set_external_trigger(&mut self, channel: u8, trigger: Trigger);
}

/// Vector table memory model
///
/// Entries are raw words (handler addresses, or the initial stack pointer
/// in entry 0). Index `SLOT_OFFSET + n` holds the handler for slot `n`.
pub trait VectorMemory {
    /// Number of core exception entries preceding slot 0
    const SLOT_OFFSET: usize;

    /// Total number of entries in both the boot and the RAM table
    fn entries(&self) -> usize;

    /// Read an entry of the immutable boot-time table
    fn boot_entry(&self, index: usize) -> usize;

    /// Read an entry of the RAM table
    fn ram_entry(&self, index: usize) -> usize;

    /// Address of the RAM table
    fn ram_base(&self) -> usize;

    /// Address currently held by the table-base register
    fn active_base(&self) -> usize;

    /// Write one RAM table entry and wait for it to become visible
    ///
    /// This is the only write path into the table. Implementations must
    /// complete the store before returning (data barrier on Cortex-M) so
    /// a dispatch that follows never sees a half-written entry.
    fn store(&mut self, index: usize, entry: usize);

    /// Point the table-base register at `base`
    ///
    /// Called with interrupts globally disabled. Implementations issue the
    /// barriers needed before interrupts are re-enabled.
    fn set_active_base(&mut self, base: usize);

    /// Handler installed in every unassigned slot
    fn default_handler(&self) -> Isr;
}
