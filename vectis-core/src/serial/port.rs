//! Interrupt-driven serial port
//!
//! Mainline code talks to the two ring buffers; four interrupt handlers
//! move bytes between the buffers and the peripheral.
//!
//! Port states: `Uninitialized -> begin -> Ready -> end -> Uninitialized`.
//! While ready the transmitter is either idle (TE clear) or sending:
//! queueing a byte enables TE and the TX-empty interrupt, the TX-empty
//! handler feeds the data register until the buffer runs dry and then
//! hands over to TX-complete, which switches the transmitter off again.

use core::cell::RefCell;
use core::sync::atomic::Ordering;

use critical_section::Mutex;
use portable_atomic::{AtomicBool, AtomicU8};
use vectis_hal::uart::{Control, FrameFormat, Status};
use vectis_hal::{InterruptController, ModuleClocks, PinMux, SerialRegisters, VectorMemory};

use super::baud::{self, BaudChoice, BaudError};
use super::config::{PortConfig, ReceiveError, SerialHandlers, SerialOptions};
use crate::irq::{IrqError, IrqLine};
use crate::ring::RingBuffer;
use crate::system::System;

/// Errors from [`SerialPort::begin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// Not enough interrupt slots for the four port events
    Irq(IrqError),
    /// Requested baud rate not achievable
    Baud(BaudError),
}

impl From<IrqError> for SerialError {
    fn from(e: IrqError) -> Self {
        SerialError::Irq(e)
    }
}

impl From<BaudError> for SerialError {
    fn from(e: BaudError) -> Self {
        SerialError::Baud(e)
    }
}

/// Default receive buffer size
pub const DEFAULT_RX_CAPACITY: usize = 64;

/// Default transmit buffer size
pub const DEFAULT_TX_CAPACITY: usize = 64;

/// Interrupt-driven serial port over one peripheral
///
/// Everything is reachable through `&self`, so a port is normally a
/// `static` shared by mainline code and its interrupt trampolines.
pub struct SerialPort<R, const RX: usize = DEFAULT_RX_CAPACITY, const TX: usize = DEFAULT_TX_CAPACITY>
{
    config: PortConfig,
    regs: R,
    handlers: SerialHandlers,
    options: SerialOptions,
    /// Cooperative yield point used while waiting on the TX buffer
    yield_now: fn(),
    rx: RingBuffer<u8, RX>,
    tx: RingBuffer<u8, TX>,
    last_error: AtomicU8,
    ready: AtomicBool,
    /// Lines held for the rx-data, rx-error, tx-empty and tx-complete events
    lines: Mutex<RefCell<[Option<IrqLine>; 4]>>,
}

impl<R: SerialRegisters, const RX: usize, const TX: usize> SerialPort<R, RX, TX> {
    pub const fn new(
        config: PortConfig,
        regs: R,
        handlers: SerialHandlers,
        options: SerialOptions,
        yield_now: fn(),
    ) -> Self {
        Self {
            config,
            regs,
            handlers,
            options,
            yield_now,
            rx: RingBuffer::with_overrun_tracking(options.count_rx_overruns),
            tx: RingBuffer::new(),
            last_error: AtomicU8::new(ReceiveError::None as u8),
            ready: AtomicBool::new(false),
            lines: Mutex::new(RefCell::new([None; 4])),
        }
    }

    /// Configure the peripheral and start receiving
    ///
    /// Reconfigures the port if it is already running. On failure every
    /// step taken so far is undone and the port stays uninitialized.
    pub fn begin<C, V, P, K, const N: usize>(
        &self,
        sys: &mut System<C, V, P, K, N>,
        baud: u32,
        format: FrameFormat,
    ) -> Result<BaudChoice, SerialError>
    where
        C: InterruptController,
        V: VectorMemory,
        P: PinMux,
        K: ModuleClocks,
    {
        if self.is_ready() {
            self.end(sys);
        }

        let choice = baud::calculate(
            sys.pclk_hz(),
            baud,
            self.options.fractional_baud,
            self.options.max_baud_error_permille,
        )?;

        self.rx.clear();
        self.tx.clear();
        self.last_error
            .store(ReceiveError::None as u8, Ordering::Relaxed);

        let config = &self.config;
        sys.pins_mut().set_function(config.tx_pin, config.tx_function);
        sys.pins_mut().set_function(config.rx_pin, config.rx_function);
        sys.clocks_mut().start(config.clock);

        self.regs.reset();
        self.regs.set_format(format);
        self.regs.set_baud(choice.setting);

        if let Err(e) = self.acquire_lines(sys) {
            warn!("sci{} begin failed: {}", config.channel, e);
            self.shutdown(sys);
            return Err(e.into());
        }

        self.regs.clear_status(Status::ERRORS);
        self.regs
            .modify_control(Control::RE | Control::RIE, Control::empty());
        self.ready.store(true, Ordering::Release);

        info!(
            "sci{} ready at {} baud (requested {})",
            config.channel, choice.actual, baud
        );
        Ok(choice)
    }

    fn acquire_lines<C, V, P, K, const N: usize>(
        &self,
        sys: &mut System<C, V, P, K, N>,
    ) -> Result<(), IrqError>
    where
        C: InterruptController,
        V: VectorMemory,
        P: PinMux,
        K: ModuleClocks,
    {
        let events = &self.config.events;
        let handlers = &self.handlers;
        let wanted = [
            (events.rx_data, handlers.rx_data),
            (events.rx_error, handlers.rx_error),
            (events.tx_empty, handlers.tx_empty),
            (events.tx_complete, handlers.tx_complete),
        ];

        for (index, (event, handler)) in wanted.into_iter().enumerate() {
            let line = sys.irq_mut().acquire(event, handler, self.config.priority)?;
            critical_section::with(|cs| {
                self.lines.borrow_ref_mut(cs)[index] = Some(line);
            });
        }
        Ok(())
    }

    /// Stop the port
    ///
    /// Waits for queued output to reach the peripheral, then disables the
    /// transmitter and receiver and gives the interrupt slots back. Does
    /// nothing on a port that is not running.
    pub fn end<C, V, P, K, const N: usize>(&self, sys: &mut System<C, V, P, K, N>)
    where
        C: InterruptController,
        V: VectorMemory,
        P: PinMux,
        K: ModuleClocks,
    {
        if !self.is_ready() {
            return;
        }
        self.flush();
        self.ready.store(false, Ordering::Release);
        self.shutdown(sys);
        debug!("sci{} stopped", self.config.channel);
    }

    fn shutdown<C, V, P, K, const N: usize>(&self, sys: &mut System<C, V, P, K, N>)
    where
        C: InterruptController,
        V: VectorMemory,
        P: PinMux,
        K: ModuleClocks,
    {
        self.regs.modify_control(
            Control::empty(),
            Control::TE | Control::RE | Control::TIE | Control::RIE | Control::TEIE,
        );

        let lines = critical_section::with(|cs| core::mem::take(&mut *self.lines.borrow_ref_mut(cs)));
        for line in lines.into_iter().flatten() {
            sys.irq_mut().release(line);
        }

        sys.clocks_mut().stop(self.config.clock);
        sys.pins_mut().reset(self.config.tx_pin);
        sys.pins_mut().reset(self.config.rx_pin);

        self.rx.clear();
        self.tx.clear();
    }

    /// Check if `begin` completed and `end` has not been called since
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Check if the transmitter is running
    pub fn is_sending(&self) -> bool {
        self.regs.control().contains(Control::TE)
    }

    /// Queue one byte for transmission
    ///
    /// Waits, yielding, while the transmit buffer is full. A port that is
    /// not ready swallows the byte. Always returns 1.
    pub fn write(&self, byte: u8) -> usize {
        if !self.is_ready() {
            return 1;
        }

        while !self.tx.push(byte) {
            (self.yield_now)();
        }
        self.start_transmit();
        1
    }

    /// Queue a slice, blocking as needed; returns `bytes.len()`
    pub fn write_bytes(&self, bytes: &[u8]) -> usize {
        for &byte in bytes {
            self.write(byte);
        }
        bytes.len()
    }

    /// Queue as many bytes as fit without waiting
    pub(crate) fn write_nonblocking(&self, bytes: &[u8]) -> usize {
        if !self.is_ready() {
            return bytes.len();
        }

        let written = bytes.iter().take_while(|&&b| self.tx.push(b)).count();
        if written > 0 {
            self.start_transmit();
        }
        written
    }

    fn start_transmit(&self) {
        let sending = Control::TE | Control::TIE;
        if !self.regs.control().contains(sending) {
            self.regs.modify_control(sending, Control::TEIE);
        }
    }

    /// Wait, yielding, until the transmit buffer is empty
    pub fn flush(&self) {
        if !self.is_ready() {
            return;
        }
        while !self.tx.is_empty() {
            (self.yield_now)();
        }
    }

    /// Take the oldest received byte
    pub fn read(&self) -> Option<u8> {
        self.rx.pop()
    }

    /// Look at the oldest received byte without taking it
    pub fn peek(&self) -> Option<u8> {
        if self.rx.is_empty() {
            None
        } else {
            Some(self.rx.peek())
        }
    }

    /// Bytes waiting in the receive buffer
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    /// Free space in the transmit buffer
    pub fn available_for_write(&self) -> usize {
        self.tx.available_for_write()
    }

    /// Most recent receive error, cleared by this call
    pub fn receive_error(&self) -> ReceiveError {
        ReceiveError::from_bits(
            self.last_error
                .swap(ReceiveError::None as u8, Ordering::AcqRel),
        )
    }

    /// Bytes dropped because the receive buffer was full
    pub fn rx_overruns(&self) -> u32 {
        self.rx.overruns()
    }

    /// Run the cooperative yield hook once
    pub(crate) fn pause(&self) {
        (self.yield_now)();
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    fn record_error(&self, error: ReceiveError) {
        self.last_error.store(error as u8, Ordering::Release);
    }

    /// Receive-data interrupt
    pub fn on_rx_data(&self) {
        let byte = self.regs.read_data();
        if self.rx.force_push(byte) {
            self.record_error(ReceiveError::Overrun);
        }
    }

    /// Receive-error interrupt
    pub fn on_rx_error(&self) {
        let flags = self.regs.status() & Status::ERRORS;

        let error = if flags.contains(Status::ORER) {
            ReceiveError::Overrun
        } else if flags.contains(Status::PER) {
            ReceiveError::Parity
        } else if flags.contains(Status::FER) {
            ReceiveError::Framing
        } else {
            ReceiveError::None
        };

        self.regs.clear_status(flags);
        if error.is_error() {
            self.record_error(error);
        }
    }

    /// Transmit-data-empty interrupt
    pub fn on_tx_empty(&self) {
        match self.tx.pop() {
            Some(byte) => self.regs.write_data(byte),
            None => self.regs.modify_control(Control::TEIE, Control::TIE),
        }
    }

    /// Transmit-end interrupt
    pub fn on_tx_complete(&self) {
        self.regs
            .modify_control(Control::empty(), Control::TEIE | Control::TE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{
        noop_handler, other_handler, FakeClocks, FakeController, FakePins, FakeSci, FakeVectors,
    };
    use portable_atomic::AtomicU32;
    use vectis_hal::uart::{Oversampling, SERIAL_8E1, SERIAL_8N1};
    use vectis_hal::{EventId, ModuleStop, PinFunction, PinId, Priority, SlotId};

    use crate::serial::PortEvents;

    type TestSystem = System<FakeController<8>, FakeVectors<24>, FakePins, FakeClocks>;

    const CONFIG: PortConfig = PortConfig {
        channel: 2,
        clock: ModuleStop::new(1, 29),
        tx_pin: PinId::new(3, 2),
        tx_function: PinFunction(4),
        rx_pin: PinId::new(3, 1),
        rx_function: PinFunction(4),
        events: PortEvents {
            rx_data: EventId(0xA3),
            rx_error: EventId(0xA6),
            tx_empty: EventId(0xA4),
            tx_complete: EventId(0xA5),
        },
        priority: Priority(12),
    };

    const HANDLERS: SerialHandlers = SerialHandlers {
        rx_data: noop_handler,
        rx_error: noop_handler,
        tx_empty: other_handler,
        tx_complete: other_handler,
    };

    fn no_yield() {}

    fn system() -> TestSystem {
        let mut sys = System::new(
            FakeController::new(),
            FakeVectors::new(),
            FakePins::new(),
            FakeClocks::new(),
            48_000_000,
        );
        sys.init();
        sys
    }

    #[test]
    fn test_begin_configures_peripheral() {
        static PORT: SerialPort<FakeSci, 16, 8> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();

        PORT.begin(&mut sys, 115_200, SERIAL_8E1).unwrap();

        assert!(PORT.is_ready());
        let regs = PORT.registers();
        assert_eq!(regs.format(), Some(SERIAL_8E1));
        assert_eq!(regs.baud().map(|b| b.oversampling), Some(Oversampling::X16));
        assert_eq!(regs.control(), Control::RE | Control::RIE);
        assert!(!PORT.is_sending());

        assert!(sys.clocks().is_running(CONFIG.clock));
        assert_eq!(sys.pins().function(CONFIG.tx_pin), Some(PinFunction(4)));
        assert_eq!(sys.irq().free_slots(), 4);
        assert_eq!(
            sys.irq().controller().routed(SlotId(0)),
            Some(CONFIG.events.rx_data)
        );
        assert_eq!(sys.irq().table_entry(SlotId(2)), other_handler as usize);
    }

    #[test]
    fn test_write_when_not_ready_is_noop() {
        static PORT: SerialPort<FakeSci, 8, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);

        assert_eq!(PORT.write(b'x'), 1);
        assert_eq!(PORT.available_for_write(), 4);
        assert!(PORT.registers().transmitted().is_empty());
        PORT.flush();
    }

    #[test]
    fn test_transmit_state_machine() {
        static PORT: SerialPort<FakeSci, 8, 8> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();
        PORT.begin(&mut sys, 9600, SERIAL_8N1).unwrap();

        assert_eq!(PORT.write_bytes(b"hello"), 5);
        let regs = PORT.registers();
        assert!(regs.control().contains(Control::TE | Control::TIE));

        for _ in 0..5 {
            PORT.on_tx_empty();
        }
        assert_eq!(regs.transmitted().as_slice(), b"hello");
        assert!(regs.control().contains(Control::TIE));

        // Sixth firing finds the buffer empty
        PORT.on_tx_empty();
        assert!(!regs.control().contains(Control::TIE));
        assert!(regs.control().contains(Control::TEIE));
        assert!(PORT.is_sending());

        PORT.on_tx_complete();
        assert!(!regs.control().contains(Control::TEIE));
        assert!(!regs.control().contains(Control::TE));
        assert!(!PORT.is_sending());
        // Receiver untouched
        assert!(regs.control().contains(Control::RE | Control::RIE));
    }

    #[test]
    fn test_write_restarts_idle_transmitter() {
        static PORT: SerialPort<FakeSci, 8, 8> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();
        PORT.begin(&mut sys, 9600, SERIAL_8N1).unwrap();

        PORT.write(1);
        PORT.on_tx_empty();
        PORT.on_tx_empty();
        PORT.on_tx_complete();
        assert!(!PORT.is_sending());

        PORT.write(2);
        let control = PORT.registers().control();
        assert!(control.contains(Control::TE | Control::TIE));
        assert!(!control.contains(Control::TEIE));
    }

    static DRAIN_TICKS: AtomicU32 = AtomicU32::new(0);
    static DRAIN_PORT: SerialPort<FakeSci, 8, 4> =
        SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, drain_tick);

    /// Simulated timer: the TX-empty interrupt fires every third tick
    fn drain_tick() {
        let tick = DRAIN_TICKS.fetch_add(1, Ordering::Relaxed) + 1;
        if tick % 3 == 0 {
            DRAIN_PORT.on_tx_empty();
        }
    }

    #[test]
    fn test_write_blocks_until_drained() {
        let mut sys = system();
        DRAIN_PORT.begin(&mut sys, 9600, SERIAL_8N1).unwrap();

        // Filling the buffer never yields
        for b in 0..4 {
            DRAIN_PORT.write(b);
        }
        assert_eq!(DRAIN_TICKS.load(Ordering::Relaxed), 0);
        assert_eq!(DRAIN_PORT.available_for_write(), 0);

        // Fifth byte waits for one simulated drain
        assert_eq!(DRAIN_PORT.write(4), 1);
        assert_eq!(DRAIN_TICKS.load(Ordering::Relaxed), 3);
        assert_eq!(DRAIN_PORT.registers().transmitted().as_slice(), &[0]);

        // Flush drains the remaining four, one every three ticks
        DRAIN_PORT.flush();
        assert_eq!(DRAIN_TICKS.load(Ordering::Relaxed), 15);
        assert_eq!(
            DRAIN_PORT.registers().transmitted().as_slice(),
            &[0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn test_receive_path() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();
        PORT.begin(&mut sys, 9600, SERIAL_8N1).unwrap();

        assert_eq!(PORT.peek(), None);
        for byte in [10, 20, 30] {
            PORT.registers().receive(byte);
            PORT.on_rx_data();
        }

        assert_eq!(PORT.available(), 3);
        assert_eq!(PORT.peek(), Some(10));
        assert_eq!(PORT.read(), Some(10));
        assert_eq!(PORT.read(), Some(20));
        assert_eq!(PORT.read(), Some(30));
        assert_eq!(PORT.read(), None);
        assert_eq!(PORT.receive_error(), ReceiveError::None);
    }

    #[test]
    fn test_rx_overflow_keeps_newest() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();
        PORT.begin(&mut sys, 9600, SERIAL_8N1).unwrap();

        for byte in 0..6 {
            PORT.registers().receive(byte);
            PORT.on_rx_data();
        }

        assert_eq!(PORT.available(), 4);
        assert_eq!(PORT.read(), Some(2));
        assert_eq!(PORT.rx_overruns(), 2);
        assert_eq!(PORT.receive_error(), ReceiveError::Overrun);
    }

    #[test]
    fn test_receive_error_read_once() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();
        PORT.begin(&mut sys, 9600, SERIAL_8N1).unwrap();

        assert_eq!(PORT.receive_error(), ReceiveError::None);

        PORT.registers().raise(Status::FER | Status::PER);
        PORT.on_rx_error();
        assert!(!PORT.registers().status().intersects(Status::ERRORS));

        assert_eq!(PORT.receive_error(), ReceiveError::Parity);
        assert_eq!(PORT.receive_error(), ReceiveError::None);

        PORT.registers().raise(Status::FER | Status::ORER);
        PORT.on_rx_error();
        assert_eq!(PORT.receive_error(), ReceiveError::Overrun);
    }

    #[test]
    fn test_end_releases_everything() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();
        PORT.begin(&mut sys, 9600, SERIAL_8N1).unwrap();
        PORT.registers().receive(7);
        PORT.on_rx_data();

        PORT.end(&mut sys);

        assert!(!PORT.is_ready());
        assert_eq!(PORT.available(), 0);
        assert_eq!(PORT.registers().control(), Control::empty());
        assert_eq!(sys.irq().free_slots(), 8);
        assert!(!sys.clocks().is_running(CONFIG.clock));
        assert_eq!(sys.pins().function(CONFIG.rx_pin), None);
        let default = sys.irq().vectors().default_handler() as usize;
        assert_eq!(sys.irq().table_entry(SlotId(0)), default);
    }

    #[test]
    fn test_begin_aborts_cleanly_without_slots() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();
        // Leave only two free slots
        for event in 0..6u16 {
            sys.irq_mut()
                .acquire(EventId(0x10 + event), noop_handler, Priority(1))
                .unwrap();
        }

        let result = PORT.begin(&mut sys, 9600, SERIAL_8N1);

        assert_eq!(result, Err(SerialError::Irq(IrqError::NoSlotsAvailable)));
        assert!(!PORT.is_ready());
        assert_eq!(sys.irq().free_slots(), 2);
        assert!(!sys.clocks().is_running(CONFIG.clock));
        assert_eq!(PORT.write(1), 1);
        assert_eq!(PORT.available_for_write(), 4);
    }

    #[test]
    fn test_partial_acquire_releases_every_line() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();
        // Room for rx-data, rx-error and tx-empty, not tx-complete
        for event in 0..5u16 {
            sys.irq_mut()
                .acquire(EventId(0x10 + event), noop_handler, Priority(1))
                .unwrap();
        }

        assert!(PORT.begin(&mut sys, 9600, SERIAL_8N1).is_err());

        assert_eq!(sys.irq().free_slots(), 3);
        let events = CONFIG.events;
        for event in [events.rx_data, events.rx_error, events.tx_empty, events.tx_complete] {
            assert_eq!(sys.irq().find(event), None);
        }

        // With the slots back the port starts and stops cleanly
        let mut roomy = system();
        PORT.begin(&mut roomy, 9600, SERIAL_8N1).unwrap();
        assert_eq!(roomy.irq().free_slots(), 4);
        PORT.end(&mut roomy);
        assert_eq!(roomy.irq().free_slots(), 8);
    }

    #[test]
    fn test_end_without_begin_leaves_shared_resources() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();
        // Another driver owns the same pin and clock
        sys.pins_mut().set_function(CONFIG.tx_pin, PinFunction(9));
        sys.clocks_mut().start(CONFIG.clock);

        PORT.end(&mut sys);

        assert_eq!(sys.pins().function(CONFIG.tx_pin), Some(PinFunction(9)));
        assert!(sys.clocks().is_running(CONFIG.clock));
        assert_eq!(sys.irq().free_slots(), 8);
    }

    #[test]
    fn test_begin_rejects_bad_baud() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();

        let result = PORT.begin(&mut sys, 10, SERIAL_8N1);
        assert_eq!(result, Err(SerialError::Baud(BaudError::Unreachable)));
        assert_eq!(sys.irq().free_slots(), 8);
        assert_eq!(PORT.registers().resets(), 0);
    }

    #[test]
    fn test_begin_twice_reconfigures() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = system();

        PORT.begin(&mut sys, 9600, SERIAL_8N1).unwrap();
        PORT.begin(&mut sys, 19_200, SERIAL_8E1).unwrap();

        assert!(PORT.is_ready());
        assert_eq!(sys.irq().free_slots(), 4);
        assert_eq!(sys.irq().diagnostics().double_register, 0);
        assert_eq!(PORT.registers().format(), Some(SERIAL_8E1));
    }
}
