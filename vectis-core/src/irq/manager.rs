//! Interrupt slot allocation
//!
//! Binds hardware event sources to free controller slots at run time and
//! installs their handlers straight into the relocated vector table, so a
//! dispatch costs nothing beyond the hardware vector fetch.
//!
//! Slot lifecycle: `FREE -> acquire -> ASSIGNED -> release -> FREE`.

use vectis_hal::{EventId, InterruptController, Isr, Priority, SlotId, VectorMemory};

use super::slots::{SlotSet, DEFAULT_SLOTS, MAX_SLOTS};
use super::vector::{Vector, VectorTable};
use crate::fault::{fatal, Fault};

/// An assigned slot and the event routed to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqLine {
    pub slot: SlotId,
    pub event: EventId,
}

/// Recoverable allocation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqError {
    /// Every slot the event may use is taken
    NoSlotsAvailable,
    /// The event (or pin) is already bound to this line
    AlreadyAssigned(IrqLine),
    /// The pin's external interrupt channel is held by another pin
    NoChannel(u8),
}

/// Counters for misuse that is reported but tolerated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Acquire of an event that already owns a slot
    pub double_register: u32,
    /// Release of a slot that was already free
    pub double_release: u32,
    /// Release or re-priority through a line that does not own the slot
    pub wrong_owner: u32,
}

/// Interrupt resource manager
///
/// Owns the controller, the RAM vector table and the slot bitmap. One
/// instance exists per system; drivers receive it by `&mut` when they
/// start or stop.
///
/// `N` sizes the per-slot tables and must cover the controller's pool.
pub struct InterruptManager<C, V, const N: usize = { DEFAULT_SLOTS }> {
    controller: C,
    table: VectorTable<V, N>,
    assigned: SlotSet,
    owners: [Option<EventId>; N],
    diagnostics: Diagnostics,
}

impl<C: InterruptController, V: VectorMemory> InterruptManager<C, V> {
    /// Create a manager for up to [`DEFAULT_SLOTS`] slots; call
    /// [`init`](Self::init) before acquiring slots
    pub fn new(controller: C, memory: V) -> Self {
        Self::with_capacity(controller, memory)
    }
}

impl<C: InterruptController, V: VectorMemory, const N: usize> InterruptManager<C, V, N> {
    /// Create a manager whose slot tables hold `N` entries
    ///
    /// A controller with more than `N` slots is fatal.
    pub fn with_capacity(controller: C, memory: V) -> Self {
        if C::SLOTS > N.min(MAX_SLOTS) {
            fatal(Fault::PoolTooLarge(C::SLOTS));
        }

        Self {
            controller,
            table: VectorTable::new(memory, C::SLOTS),
            assigned: SlotSet::new(C::SLOTS),
            owners: [None; N],
            diagnostics: Diagnostics::default(),
        }
    }

    /// Quiesce every slot and relocate the vector table to RAM
    ///
    /// Calling it again after a successful relocation does nothing.
    pub fn init(&mut self) {
        if self.table.is_relocated() {
            debug!("interrupt manager already initialised");
            return;
        }

        for index in 0..C::SLOTS {
            let slot = SlotId(index as u8);
            self.controller.disable(slot);
            self.controller.route(slot, None);
            self.controller.clear_pending(slot);
        }

        self.table.relocate();
    }

    /// Bind `event` to the lowest free slot it may use and enable it
    ///
    /// Returns [`IrqError::NoSlotsAvailable`] when the pool is exhausted,
    /// leaving every existing assignment untouched. An event the
    /// controller cannot route to any slot at all is a build mistake and
    /// fatal.
    pub fn acquire(
        &mut self,
        event: EventId,
        handler: Isr,
        priority: Priority,
    ) -> Result<IrqLine, IrqError> {
        if let Some(existing) = self.find(event) {
            self.diagnostics.double_register += 1;
            warn!("event {} already on slot {}", event.0, existing.slot.0);
            return Err(IrqError::AlreadyAssigned(existing));
        }

        if !self.table.is_relocated() {
            fatal(Fault::TableNotActive);
        }

        let controller = &self.controller;
        if !(0..C::SLOTS).any(|i| controller.can_route(event, SlotId(i as u8))) {
            fatal(Fault::Unroutable(event));
        }

        let slot = self
            .assigned
            .first_free(|slot| controller.can_route(event, slot))
            .ok_or_else(|| {
                warn!("no interrupt slot left for event {}", event.0);
                IrqError::NoSlotsAvailable
            })?;

        self.assigned.insert(slot);
        self.owners[slot.index()] = Some(event);

        // Line stays off while its entry and routing are rewritten
        self.controller.disable(slot);
        self.table.install(slot, handler);
        self.controller.route(slot, Some(event));
        self.controller.clear_pending(slot);
        self.controller.set_priority(slot, priority);
        self.controller.enable(slot);

        debug!("event {} -> slot {}", event.0, slot.0);
        Ok(IrqLine { slot, event })
    }

    /// Return a slot to the pool
    ///
    /// Releasing a free slot, or through a line whose event is not the one
    /// routed there, is counted in [`Diagnostics`] and otherwise ignored.
    /// Returns `true` when the slot was freed.
    pub fn release(&mut self, line: IrqLine) -> bool {
        let slot = line.slot;

        if !self.assigned.contains(slot) {
            self.diagnostics.double_release += 1;
            warn!("release of free slot {}", slot.0);
            return false;
        }

        if !self.owns(line) {
            self.diagnostics.wrong_owner += 1;
            warn!("slot {} not routed to event {}", slot.0, line.event.0);
            return false;
        }

        self.controller.disable(slot);
        self.controller.clear_pending(slot);
        self.controller.route(slot, None);
        self.table.uninstall(slot);
        self.owners[slot.index()] = None;
        self.assigned.remove(slot);

        debug!("slot {} released", slot.0);
        true
    }

    /// Change the priority of an assigned slot
    pub fn set_priority(&mut self, line: IrqLine, priority: Priority) -> bool {
        if !self.assigned.contains(line.slot) || !self.owns(line) {
            self.diagnostics.wrong_owner += 1;
            warn!("re-priority of slot {} by non-owner", line.slot.0);
            return false;
        }
        self.controller.set_priority(line.slot, priority);
        true
    }

    fn owns(&self, line: IrqLine) -> bool {
        self.owners[line.slot.index()] == Some(line.event)
            && self.controller.routed(line.slot) == Some(line.event)
    }

    /// Line currently serving `event`
    pub fn find(&self, event: EventId) -> Option<IrqLine> {
        self.owners[..C::SLOTS]
            .iter()
            .position(|owner| *owner == Some(event))
            .map(|index| IrqLine {
                slot: SlotId(index as u8),
                event,
            })
    }

    pub fn is_assigned(&self, slot: SlotId) -> bool {
        self.assigned.contains(slot)
    }

    /// Number of unassigned slots
    pub fn free_slots(&self) -> usize {
        C::SLOTS - self.assigned.count()
    }

    /// Handler recorded for a slot
    pub fn handler_at(&self, slot: SlotId) -> Vector {
        self.table.get(slot)
    }

    /// Address the hardware vector table holds for a slot
    pub fn table_entry(&self, slot: SlotId) -> usize {
        self.table.hardware_entry(slot)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn is_initialized(&self) -> bool {
        self.table.is_relocated()
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn vectors(&self) -> &V {
        self.table.memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{noop_handler, other_handler, FakeController, FakeVectors};

    type Manager = InterruptManager<FakeController<4>, FakeVectors<20>>;

    fn manager() -> Manager {
        let mut manager = InterruptManager::new(FakeController::new(), FakeVectors::new());
        manager.init();
        manager
    }

    #[test]
    fn test_tables_sized_by_capacity() {
        type Small = InterruptManager<FakeController<4>, FakeVectors<20>, 4>;
        assert!(core::mem::size_of::<Small>() < core::mem::size_of::<Manager>());

        let mut irq = Small::with_capacity(FakeController::new(), FakeVectors::new());
        irq.init();
        for event in 0..4u16 {
            irq.acquire(EventId(0x40 + event), noop_handler, Priority(1))
                .unwrap();
        }
        assert_eq!(
            irq.acquire(EventId(0x50), noop_handler, Priority(1)),
            Err(IrqError::NoSlotsAvailable)
        );
        assert_eq!(irq.find(EventId(0x43)).map(|line| line.slot), Some(SlotId(3)));
    }

    #[test]
    #[should_panic(expected = "exceed the slot map")]
    fn test_capacity_below_pool_is_fatal() {
        let _ = InterruptManager::<_, _, 2>::with_capacity(
            FakeController::<4>::new(),
            FakeVectors::<20>::new(),
        );
    }

    #[test]
    fn test_acquire_lowest_free_slot() {
        let mut irq = manager();
        let line = irq
            .acquire(EventId(0x98), noop_handler, Priority(3))
            .unwrap();

        assert_eq!(line.slot, SlotId(0));
        let controller = irq.controller();
        assert_eq!(controller.routed(SlotId(0)), Some(EventId(0x98)));
        assert!(controller.is_enabled(SlotId(0)));
        assert_eq!(controller.priority(SlotId(0)), Some(Priority(3)));
        assert_eq!(irq.table_entry(SlotId(0)), noop_handler as usize);
    }

    #[test]
    fn test_distinct_slots_until_exhaustion() {
        let mut irq = manager();
        let mut seen = heapless::Vec::<SlotId, 4>::new();

        for event in 0..4u16 {
            let line = irq
                .acquire(EventId(0x100 + event), noop_handler, Priority(1))
                .unwrap();
            assert!(!seen.contains(&line.slot));
            seen.push(line.slot).unwrap();
        }
        assert_eq!(irq.free_slots(), 0);

        let result = irq.acquire(EventId(0x200), other_handler, Priority(1));
        assert_eq!(result, Err(IrqError::NoSlotsAvailable));

        // Existing assignments untouched
        for (i, slot) in seen.iter().enumerate() {
            assert_eq!(irq.controller().routed(*slot), Some(EventId(0x100 + i as u16)));
            assert_eq!(irq.table_entry(*slot), noop_handler as usize);
            assert!(irq.controller().is_enabled(*slot));
        }
    }

    #[test]
    fn test_release_restores_default_before_reuse() {
        let mut irq = manager();
        let line = irq
            .acquire(EventId(0x98), noop_handler, Priority(2))
            .unwrap();
        irq.controller_mut().pend(line.slot);

        assert!(irq.release(line));

        let default = irq.vectors().default_handler() as usize;
        assert_eq!(irq.table_entry(line.slot), default);
        assert!(!irq.handler_at(line.slot).is_set());
        assert!(!irq.controller().is_enabled(line.slot));
        assert!(!irq.controller().is_pending(line.slot));
        assert_eq!(irq.controller().routed(line.slot), None);

        let again = irq
            .acquire(EventId(0x98), other_handler, Priority(2))
            .unwrap();
        assert_eq!(again.slot, line.slot);
        assert_eq!(irq.table_entry(again.slot), other_handler as usize);
    }

    #[test]
    fn test_double_release_is_diagnostic() {
        let mut irq = manager();
        let line = irq
            .acquire(EventId(0x98), noop_handler, Priority(2))
            .unwrap();

        assert!(irq.release(line));
        assert!(!irq.release(line));
        assert_eq!(irq.diagnostics().double_release, 1);
    }

    #[test]
    fn test_wrong_owner_release_preserves_assignment() {
        let mut irq = manager();
        let line = irq
            .acquire(EventId(0x98), noop_handler, Priority(2))
            .unwrap();

        let forged = IrqLine {
            slot: line.slot,
            event: EventId(0x99),
        };
        assert!(!irq.release(forged));
        assert_eq!(irq.diagnostics().wrong_owner, 1);

        assert!(irq.is_assigned(line.slot));
        assert_eq!(irq.controller().routed(line.slot), Some(EventId(0x98)));
        assert_eq!(irq.table_entry(line.slot), noop_handler as usize);
    }

    #[test]
    fn test_double_register_keeps_existing() {
        let mut irq = manager();
        let line = irq
            .acquire(EventId(0x98), noop_handler, Priority(2))
            .unwrap();

        let result = irq.acquire(EventId(0x98), other_handler, Priority(0));
        assert_eq!(result, Err(IrqError::AlreadyAssigned(line)));
        assert_eq!(irq.diagnostics().double_register, 1);
        assert_eq!(irq.table_entry(line.slot), noop_handler as usize);
        assert_eq!(irq.free_slots(), 3);
    }

    #[test]
    fn test_routing_constraint_picks_legal_slot() {
        let mut irq = manager();
        // Event may only use slots 2 and 3
        irq.controller_mut().restrict(EventId(0x50), 0b1100);

        let line = irq
            .acquire(EventId(0x50), noop_handler, Priority(2))
            .unwrap();
        assert_eq!(line.slot, SlotId(2));
    }

    #[test]
    fn test_legal_slots_taken_is_exhaustion() {
        let mut irq = manager();
        irq.controller_mut().restrict(EventId(0x50), 0b0001);
        irq.acquire(EventId(0x10), noop_handler, Priority(2)).unwrap();

        let result = irq.acquire(EventId(0x50), noop_handler, Priority(2));
        assert_eq!(result, Err(IrqError::NoSlotsAvailable));
    }

    #[test]
    #[should_panic(expected = "cannot be routed")]
    fn test_unroutable_event_is_fatal() {
        let mut irq = manager();
        irq.controller_mut().restrict(EventId(0x50), 0);
        let _ = irq.acquire(EventId(0x50), noop_handler, Priority(2));
    }

    #[test]
    #[should_panic(expected = "not relocated")]
    fn test_acquire_before_init_is_fatal() {
        let mut irq: Manager = InterruptManager::new(FakeController::new(), FakeVectors::new());
        let _ = irq.acquire(EventId(0x98), noop_handler, Priority(2));
    }

    #[test]
    fn test_set_priority() {
        let mut irq = manager();
        let line = irq
            .acquire(EventId(0x98), noop_handler, Priority(2))
            .unwrap();

        assert!(irq.set_priority(line, Priority(5)));
        assert_eq!(irq.controller().priority(line.slot), Some(Priority(5)));

        irq.release(line);
        assert!(!irq.set_priority(line, Priority(1)));
        assert_eq!(irq.diagnostics().wrong_owner, 1);
    }

    #[test]
    fn test_init_quiesces_slots() {
        let mut controller = FakeController::<4>::new();
        controller.route(SlotId(1), Some(EventId(7)));
        controller.enable(SlotId(1));

        let mut irq = InterruptManager::new(controller, FakeVectors::<20>::new());
        irq.init();

        assert!(irq.is_initialized());
        assert_eq!(irq.controller().routed(SlotId(1)), None);
        assert!(!irq.controller().is_enabled(SlotId(1)));
        assert_eq!(irq.free_slots(), 4);
    }
}
