//! Software fakes of the register models
//!
//! Each fake implements one `vectis-hal` trait over plain memory and
//! exposes extra inspection helpers for tests. [`FakeSci`] is `const`
//! constructible and `Sync`, so a serial port under test can live in a
//! `static` and be driven from a yield hook.

use core::cell::{Cell, RefCell};
use core::sync::atomic::Ordering;

use critical_section::Mutex;
use heapless::{FnvIndexMap, FnvIndexSet, Vec};
use portable_atomic::{AtomicU32, AtomicU8};
use vectis_hal::uart::{BaudSetting, Control, FrameFormat, Status};
use vectis_hal::{
    EventId, InterruptController, Isr, ModuleClocks, ModuleStop, PinFunction, PinId, PinMux,
    Priority, SerialRegisters, SlotId, Trigger, VectorMemory,
};

use crate::irq::EXTERNAL_CHANNELS;

static NOOP_CALLS: AtomicU32 = AtomicU32::new(0);
static OTHER_CALLS: AtomicU32 = AtomicU32::new(0);
static UNASSIGNED_CALLS: AtomicU32 = AtomicU32::new(0);

/// Handler for tests that only care about the installed address
pub extern "C" fn noop_handler() {
    NOOP_CALLS.fetch_add(1, Ordering::Relaxed);
}

/// A second handler with a distinct address
pub extern "C" fn other_handler() {
    OTHER_CALLS.fetch_add(1, Ordering::Relaxed);
}

/// Default handler of [`FakeVectors`]
pub extern "C" fn unassigned_handler() {
    UNASSIGNED_CALLS.fetch_add(1, Ordering::Relaxed);
}

/// Interrupt controller with `N` slots
pub struct FakeController<const N: usize = 32> {
    routes: [Option<EventId>; N],
    enabled: [bool; N],
    pending: [bool; N],
    priorities: [Option<Priority>; N],
    triggers: [Option<Trigger>; EXTERNAL_CHANNELS],
    restrictions: Vec<(EventId, u64), 8>,
}

impl<const N: usize> Default for FakeController<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FakeController<N> {
    pub const fn new() -> Self {
        Self {
            routes: [None; N],
            enabled: [false; N],
            pending: [false; N],
            priorities: [None; N],
            triggers: [None; EXTERNAL_CHANNELS],
            restrictions: Vec::new(),
        }
    }

    /// Limit `event` to the slots set in `mask` (bit n = slot n)
    pub fn restrict(&mut self, event: EventId, mask: u64) {
        self.restrictions.retain(|(e, _)| *e != event);
        let _ = self.restrictions.push((event, mask));
    }

    /// Latch a pending interrupt on a slot
    pub fn pend(&mut self, slot: SlotId) {
        self.pending[slot.index()] = true;
    }

    pub fn is_pending(&self, slot: SlotId) -> bool {
        self.pending[slot.index()]
    }

    pub fn priority(&self, slot: SlotId) -> Option<Priority> {
        self.priorities[slot.index()]
    }

    pub fn trigger(&self, channel: u8) -> Option<Trigger> {
        self.triggers[channel as usize]
    }
}

impl<const N: usize> InterruptController for FakeController<N> {
    const SLOTS: usize = N;

    fn can_route(&self, event: EventId, slot: SlotId) -> bool {
        if slot.index() >= N {
            return false;
        }
        match self.restrictions.iter().find(|(e, _)| *e == event) {
            Some((_, mask)) => mask & (1 << slot.index()) != 0,
            None => true,
        }
    }

    fn route(&mut self, slot: SlotId, event: Option<EventId>) {
        self.routes[slot.index()] = event;
    }

    fn routed(&self, slot: SlotId) -> Option<EventId> {
        self.routes[slot.index()]
    }

    fn enable(&mut self, slot: SlotId) {
        self.enabled[slot.index()] = true;
    }

    fn disable(&mut self, slot: SlotId) {
        self.enabled[slot.index()] = false;
    }

    fn is_enabled(&self, slot: SlotId) -> bool {
        self.enabled[slot.index()]
    }

    fn clear_pending(&mut self, slot: SlotId) {
        self.pending[slot.index()] = false;
    }

    fn set_priority(&mut self, slot: SlotId, priority: Priority) {
        self.priorities[slot.index()] = Some(priority);
    }

    fn external_event(&self, channel: u8) -> EventId {
        // Same numbering as the RA event-link table: IRQ0 is event 1
        EventId(channel as u16 + 1)
    }

    fn set_external_trigger(&mut self, channel: u8, trigger: Trigger) {
        self.triggers[channel as usize] = Some(trigger);
    }
}

/// Vector table memory with `E` entries (16 core exceptions plus slots)
pub struct FakeVectors<const E: usize = 48> {
    boot: [usize; E],
    ram: [usize; E],
    ram_base: usize,
    active_base: usize,
    corrupt: Option<usize>,
    ignore_base_writes: bool,
    stores: usize,
}

/// Base of the fake boot table
pub const FAKE_BOOT_BASE: usize = 0x0000_0000;

/// Default base of the fake RAM table
pub const FAKE_RAM_BASE: usize = 0x2000_0000;

impl<const E: usize> Default for FakeVectors<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const E: usize> FakeVectors<E> {
    pub fn new() -> Self {
        let mut boot = [0usize; E];
        for (index, entry) in boot.iter_mut().enumerate() {
            // Entry 0 is the initial stack pointer, the rest thumb addresses
            *entry = if index == 0 {
                0x2000_8000
            } else {
                0x0000_0400 + index * 4 + 1
            };
        }

        Self {
            boot,
            ram: [0; E],
            ram_base: FAKE_RAM_BASE,
            active_base: FAKE_BOOT_BASE,
            corrupt: None,
            ignore_base_writes: false,
            stores: 0,
        }
    }

    /// Place the RAM table at another address
    pub fn with_ram_base(mut self, base: usize) -> Self {
        self.ram_base = base;
        self
    }

    /// Flip the low bit of every store to `index`
    pub fn corrupt_entry(mut self, index: usize) -> Self {
        self.corrupt = Some(index);
        self
    }

    /// Make the table-base register ignore writes
    pub fn ignore_base_writes(mut self) -> Self {
        self.ignore_base_writes = true;
        self
    }

    /// Number of stores through the write-with-barrier path
    pub fn stores(&self) -> usize {
        self.stores
    }
}

impl<const E: usize> VectorMemory for FakeVectors<E> {
    const SLOT_OFFSET: usize = 16;

    fn entries(&self) -> usize {
        E
    }

    fn boot_entry(&self, index: usize) -> usize {
        self.boot[index]
    }

    fn ram_entry(&self, index: usize) -> usize {
        self.ram[index]
    }

    fn ram_base(&self) -> usize {
        self.ram_base
    }

    fn active_base(&self) -> usize {
        self.active_base
    }

    fn store(&mut self, index: usize, entry: usize) {
        self.stores += 1;
        self.ram[index] = if self.corrupt == Some(index) {
            entry ^ 1
        } else {
            entry
        };
    }

    fn set_active_base(&mut self, base: usize) {
        if !self.ignore_base_writes {
            self.active_base = base;
        }
    }

    fn default_handler(&self) -> Isr {
        unassigned_handler
    }
}

/// Serial peripheral registers
pub struct FakeSci {
    control: AtomicU8,
    status: AtomicU8,
    rdr: AtomicU8,
    resets: AtomicU32,
    format: Mutex<Cell<Option<FrameFormat>>>,
    baud: Mutex<Cell<Option<BaudSetting>>>,
    transmitted: Mutex<RefCell<Vec<u8, 64>>>,
}

impl Default for FakeSci {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSci {
    pub const fn new() -> Self {
        Self {
            control: AtomicU8::new(0),
            status: AtomicU8::new(0),
            rdr: AtomicU8::new(0),
            resets: AtomicU32::new(0),
            format: Mutex::new(Cell::new(None)),
            baud: Mutex::new(Cell::new(None)),
            transmitted: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Latch a received byte
    pub fn receive(&self, byte: u8) {
        self.rdr.store(byte, Ordering::Relaxed);
        self.raise(Status::RDRF);
    }

    /// Set status flags, e.g. receive errors
    pub fn raise(&self, flags: Status) {
        self.status.fetch_or(flags.bits(), Ordering::Relaxed);
    }

    /// Bytes written to the transmit data register so far
    pub fn transmitted(&self) -> Vec<u8, 64> {
        critical_section::with(|cs| self.transmitted.borrow_ref(cs).clone())
    }

    pub fn format(&self) -> Option<FrameFormat> {
        critical_section::with(|cs| self.format.borrow(cs).get())
    }

    pub fn baud(&self) -> Option<BaudSetting> {
        critical_section::with(|cs| self.baud.borrow(cs).get())
    }

    /// Number of [`SerialRegisters::reset`] calls
    pub fn resets(&self) -> u32 {
        self.resets.load(Ordering::Relaxed)
    }
}

impl SerialRegisters for FakeSci {
    fn reset(&self) {
        self.control.store(0, Ordering::Relaxed);
        self.status
            .store((Status::TDRE | Status::TEND).bits(), Ordering::Relaxed);
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    fn set_format(&self, format: FrameFormat) {
        critical_section::with(|cs| self.format.borrow(cs).set(Some(format)));
    }

    fn set_baud(&self, setting: BaudSetting) {
        critical_section::with(|cs| self.baud.borrow(cs).set(Some(setting)));
    }

    fn control(&self) -> Control {
        Control::from_bits_truncate(self.control.load(Ordering::Relaxed))
    }

    fn modify_control(&self, set: Control, clear: Control) {
        let _ = self
            .control
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((bits & !clear.bits()) | set.bits())
            });
    }

    fn status(&self) -> Status {
        Status::from_bits_truncate(self.status.load(Ordering::Relaxed))
    }

    fn clear_status(&self, flags: Status) {
        self.status.fetch_and(!flags.bits(), Ordering::Relaxed);
    }

    fn write_data(&self, byte: u8) {
        critical_section::with(|cs| {
            let _ = self.transmitted.borrow_ref_mut(cs).push(byte);
        });
    }

    fn read_data(&self) -> u8 {
        self.status.fetch_and(!Status::RDRF.bits(), Ordering::Relaxed);
        self.rdr.load(Ordering::Relaxed)
    }
}

/// Pin multiplexer
#[derive(Default)]
pub struct FakePins {
    functions: FnvIndexMap<PinId, PinFunction, 16>,
    irq_map: FnvIndexMap<PinId, u8, 16>,
    irq_inputs: FnvIndexSet<PinId, 16>,
}

impl FakePins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire `pin` to external interrupt channel `channel`
    pub fn with_irq(mut self, pin: PinId, channel: u8) -> Self {
        let _ = self.irq_map.insert(pin, channel);
        self
    }

    /// Peripheral function currently selected on a pin
    pub fn function(&self, pin: PinId) -> Option<PinFunction> {
        self.functions.get(&pin).copied()
    }

    pub fn irq_input(&self, pin: PinId) -> bool {
        self.irq_inputs.contains(&pin)
    }
}

impl PinMux for FakePins {
    fn set_function(&mut self, pin: PinId, function: PinFunction) {
        let _ = self.functions.insert(pin, function);
    }

    fn reset(&mut self, pin: PinId) {
        self.functions.remove(&pin);
        self.irq_inputs.remove(&pin);
    }

    fn irq_channel(&self, pin: PinId) -> Option<u8> {
        self.irq_map.get(&pin).copied()
    }

    fn set_irq_input(&mut self, pin: PinId, enabled: bool) {
        if enabled {
            let _ = self.irq_inputs.insert(pin);
        } else {
            self.irq_inputs.remove(&pin);
        }
    }
}

/// Module clock gates
#[derive(Default)]
pub struct FakeClocks {
    running: Vec<ModuleStop, 16>,
}

impl FakeClocks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleClocks for FakeClocks {
    fn start(&mut self, module: ModuleStop) {
        if !self.running.contains(&module) {
            let _ = self.running.push(module);
        }
    }

    fn stop(&mut self, module: ModuleStop) {
        self.running.retain(|m| *m != module);
    }

    fn is_running(&self, module: ModuleStop) -> bool {
        self.running.contains(&module)
    }
}
