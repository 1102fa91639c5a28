//! Byte-stream trait implementations for [`SerialPort`]
//!
//! Implemented on `&SerialPort` so a `static` port can be handed to code
//! that expects `&mut impl Write`.

use core::convert::Infallible;

use vectis_hal::{SerialRegisters, UartRx, UartTx};

use super::port::SerialPort;

impl<R: SerialRegisters, const RX: usize, const TX: usize> UartTx for &SerialPort<R, RX, TX> {
    type Error = Infallible;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.write_bytes(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        SerialPort::flush(*self);
        Ok(())
    }
}

impl<R: SerialRegisters, const RX: usize, const TX: usize> UartRx for &SerialPort<R, RX, TX> {
    type Error = Infallible;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(read_available(*self, buf))
    }
}

/// Wait for at least one byte, then drain as many as fit
fn read_available<R: SerialRegisters, const RX: usize, const TX: usize>(
    port: &SerialPort<R, RX, TX>,
    buf: &mut [u8],
) -> usize {
    if buf.is_empty() {
        return 0;
    }

    let first = loop {
        match port.read() {
            Some(byte) => break byte,
            None => port.pause(),
        }
    };
    buf[0] = first;

    let mut count = 1;
    for slot in buf[1..].iter_mut() {
        match port.read() {
            Some(byte) => {
                *slot = byte;
                count += 1;
            }
            None => break,
        }
    }
    count
}

impl<R, const RX: usize, const TX: usize> embedded_io::ErrorType for &SerialPort<R, RX, TX> {
    type Error = Infallible;
}

impl<R: SerialRegisters, const RX: usize, const TX: usize> embedded_io::Read
    for &SerialPort<R, RX, TX>
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(read_available(*self, buf))
    }
}

impl<R: SerialRegisters, const RX: usize, const TX: usize> embedded_io::ReadReady
    for &SerialPort<R, RX, TX>
{
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.available() > 0)
    }
}

impl<R: SerialRegisters, const RX: usize, const TX: usize> embedded_io::Write
    for &SerialPort<R, RX, TX>
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let written = self.write_nonblocking(buf);
            if written > 0 {
                return Ok(written);
            }
            self.pause();
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        SerialPort::flush(*self);
        Ok(())
    }
}

impl<R: SerialRegisters, const RX: usize, const TX: usize> embedded_io::WriteReady
    for &SerialPort<R, RX, TX>
{
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.available_for_write() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::{PortConfig, PortEvents, SerialHandlers, SerialOptions};
    use crate::sim::{noop_handler, FakeClocks, FakeController, FakePins, FakeSci, FakeVectors};
    use crate::system::System;
    use embedded_io::{ReadReady, WriteReady};
    use vectis_hal::uart::SERIAL_8N1;
    use vectis_hal::{EventId, ModuleStop, PinFunction, PinId, Priority};

    const CONFIG: PortConfig = PortConfig {
        channel: 0,
        clock: ModuleStop::new(1, 31),
        tx_pin: PinId::new(4, 11),
        tx_function: PinFunction(4),
        rx_pin: PinId::new(4, 10),
        rx_function: PinFunction(4),
        events: PortEvents {
            rx_data: EventId(0x98),
            rx_error: EventId(0x9B),
            tx_empty: EventId(0x99),
            tx_complete: EventId(0x9A),
        },
        priority: Priority(12),
    };

    const HANDLERS: SerialHandlers = SerialHandlers {
        rx_data: noop_handler,
        rx_error: noop_handler,
        tx_empty: noop_handler,
        tx_complete: noop_handler,
    };

    fn no_yield() {}

    fn start(port: &SerialPort<FakeSci, 4, 4>) {
        let mut sys = System::new(
            FakeController::<8>::new(),
            FakeVectors::<24>::new(),
            FakePins::new(),
            FakeClocks::new(),
            48_000_000,
        );
        sys.init();
        port.begin(&mut sys, 9600, SERIAL_8N1).unwrap();
    }

    #[test]
    fn test_write_queues_what_fits() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        start(&PORT);
        let mut port = &PORT;

        assert_eq!(embedded_io::Write::write(&mut port, b"abcdef"), Ok(4));
        assert_eq!(port.write_ready(), Ok(false));
        assert_eq!(embedded_io::Write::write(&mut port, b""), Ok(0));

        PORT.on_tx_empty();
        assert_eq!(port.write_ready(), Ok(true));
        assert_eq!(PORT.registers().transmitted().as_slice(), b"a");
    }

    #[test]
    fn test_uart_tx_blocking() {
        static PORT: SerialPort<FakeSci, 4, 8> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        let mut sys = System::new(
            FakeController::<8>::new(),
            FakeVectors::<24>::new(),
            FakePins::new(),
            FakeClocks::new(),
            48_000_000,
        );
        sys.init();
        PORT.begin(&mut sys, 9600, SERIAL_8N1).unwrap();

        let mut port = &PORT;
        port.write_blocking(b"ok").unwrap();
        assert_eq!(PORT.available_for_write(), 6);
    }

    #[test]
    fn test_read_drains_available() {
        static PORT: SerialPort<FakeSci, 4, 4> =
            SerialPort::new(CONFIG, FakeSci::new(), HANDLERS, SerialOptions::DEFAULT, no_yield);
        start(&PORT);
        let mut port = &PORT;

        assert_eq!(port.read_ready(), Ok(false));
        for byte in *b"xyz" {
            PORT.registers().receive(byte);
            PORT.on_rx_data();
        }
        assert_eq!(port.read_ready(), Ok(true));

        let mut buf = [0u8; 2];
        assert_eq!(embedded_io::Read::read(&mut port, &mut buf), Ok(2));
        assert_eq!(&buf, b"xy");
        assert_eq!(port.read_byte(), Ok(b'z'));
        assert_eq!(embedded_io::Read::read(&mut port, &mut []), Ok(0));
    }
}
