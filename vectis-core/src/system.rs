//! Board context
//!
//! Bundles the interrupt manager, the external IRQ allocator, the pin
//! multiplexer and the clock gates into the one object drivers receive
//! when they start or stop. Created once at boot and passed by `&mut`.

use vectis_hal::{InterruptController, Isr, ModuleClocks, PinId, PinMux, Priority, Trigger, VectorMemory};

use crate::irq::{ExtIrqLine, ExternalIrqs, InterruptManager, IrqError, DEFAULT_SLOTS};

pub struct System<C, V, P, K, const N: usize = { DEFAULT_SLOTS }> {
    irq: InterruptManager<C, V, N>,
    external: ExternalIrqs,
    pins: P,
    clocks: K,
    pclk_hz: u32,
}

impl<C, V, P, K> System<C, V, P, K>
where
    C: InterruptController,
    V: VectorMemory,
    P: PinMux,
    K: ModuleClocks,
{
    /// `pclk_hz` is the peripheral clock feeding the serial baud generators
    pub fn new(controller: C, vectors: V, pins: P, clocks: K, pclk_hz: u32) -> Self {
        Self::with_capacity(controller, vectors, pins, clocks, pclk_hz)
    }
}

impl<C, V, P, K, const N: usize> System<C, V, P, K, N>
where
    C: InterruptController,
    V: VectorMemory,
    P: PinMux,
    K: ModuleClocks,
{
    /// Like [`System::new`], with the interrupt manager sized for `N` slots
    pub fn with_capacity(controller: C, vectors: V, pins: P, clocks: K, pclk_hz: u32) -> Self {
        Self {
            irq: InterruptManager::with_capacity(controller, vectors),
            external: ExternalIrqs::new(),
            pins,
            clocks,
            pclk_hz,
        }
    }

    /// Relocate the vector table; must run before any driver starts
    pub fn init(&mut self) {
        self.irq.init();
        info!("system ready, pclk {} Hz", self.pclk_hz);
    }

    /// Route a pin-edge interrupt to `handler`
    pub fn attach_pin_interrupt(
        &mut self,
        pin: PinId,
        trigger: Trigger,
        handler: Isr,
        priority: Priority,
    ) -> Result<ExtIrqLine, IrqError> {
        self.external
            .attach(&mut self.irq, &mut self.pins, pin, trigger, handler, priority)
    }

    pub fn detach_pin_interrupt(&mut self, ext: ExtIrqLine) -> bool {
        self.external.detach(&mut self.irq, &mut self.pins, ext)
    }

    pub fn pclk_hz(&self) -> u32 {
        self.pclk_hz
    }

    pub fn irq(&self) -> &InterruptManager<C, V, N> {
        &self.irq
    }

    pub fn irq_mut(&mut self) -> &mut InterruptManager<C, V, N> {
        &mut self.irq
    }

    pub fn external(&self) -> &ExternalIrqs {
        &self.external
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    pub fn clocks(&self) -> &K {
        &self.clocks
    }

    pub fn clocks_mut(&mut self) -> &mut K {
        &mut self.clocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{noop_handler, FakeClocks, FakeController, FakePins, FakeVectors};
    use vectis_hal::EventId;

    #[test]
    fn test_pin_interrupt_round_trip() {
        let button = PinId::new(1, 5);
        let mut sys = System::new(
            FakeController::<4>::new(),
            FakeVectors::<20>::new(),
            FakePins::new().with_irq(button, 1),
            FakeClocks::new(),
            48_000_000,
        );
        sys.init();

        let ext = sys
            .attach_pin_interrupt(button, Trigger::Falling, noop_handler, Priority(6))
            .unwrap();

        assert_eq!(ext.line.event, EventId(2));
        assert_eq!(sys.external().owner(1), Some(button));
        assert!(sys.pins().irq_input(button));
        assert_eq!(sys.irq().controller().trigger(1), Some(Trigger::Falling));
        assert_eq!(sys.irq().free_slots(), 3);

        assert!(sys.detach_pin_interrupt(ext));
        assert_eq!(sys.external().owner(1), None);
        assert!(!sys.pins().irq_input(button));
        assert_eq!(sys.irq().free_slots(), 4);
    }

    #[test]
    fn test_capacity_matches_pool() {
        let mut sys = System::<_, _, _, _, 4>::with_capacity(
            FakeController::<4>::new(),
            FakeVectors::<20>::new(),
            FakePins::new(),
            FakeClocks::new(),
            48_000_000,
        );
        sys.init();
        assert_eq!(sys.irq().free_slots(), 4);
    }

    #[test]
    fn test_init_relocates() {
        let mut sys = System::new(
            FakeController::<4>::new(),
            FakeVectors::<20>::new(),
            FakePins::new(),
            FakeClocks::new(),
            24_000_000,
        );
        assert!(!sys.irq().is_initialized());
        sys.init();
        assert!(sys.irq().is_initialized());
        assert_eq!(sys.pclk_hz(), 24_000_000);
    }
}
