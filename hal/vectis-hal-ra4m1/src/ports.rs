//! Serial port wiring
//!
//! Pin, clock and event assignments of the SCI channels broken out on the
//! UNO R4 boards. Event numbers are from the ICU event-link table.

use vectis_core::serial::{PortConfig, PortEvents};
use vectis_hal::{EventId, PinFunction, PinId, Priority};

use crate::mstp::sci_module;

/// PSEL for SCI0/2/4/6/8
const PSEL_SCI_EVEN: PinFunction = PinFunction(0b00100);
/// PSEL for SCI1/3/5/7/9
const PSEL_SCI_ODD: PinFunction = PinFunction(0b00101);

/// Priority the serial slots start with
pub const SERIAL_PRIORITY: Priority = Priority(12);

/// Event block of one SCI channel: RXI, TXI, TEI, ERI in that order
const fn sci_events(rxi: u16) -> PortEvents {
    PortEvents {
        rx_data: EventId(rxi),
        tx_empty: EventId(rxi + 1),
        tx_complete: EventId(rxi + 2),
        rx_error: EventId(rxi + 3),
    }
}

/// SCI0 on P411 (TXD0) / P410 (RXD0)
pub const SCI0: PortConfig = PortConfig {
    channel: 0,
    clock: sci_module(0),
    tx_pin: PinId::new(4, 11),
    tx_function: PSEL_SCI_EVEN,
    rx_pin: PinId::new(4, 10),
    rx_function: PSEL_SCI_EVEN,
    events: sci_events(0x098),
    priority: SERIAL_PRIORITY,
};

/// SCI1 on P401 (TXD1) / P402 (RXD1)
pub const SCI1: PortConfig = PortConfig {
    channel: 1,
    clock: sci_module(1),
    tx_pin: PinId::new(4, 1),
    tx_function: PSEL_SCI_ODD,
    rx_pin: PinId::new(4, 2),
    rx_function: PSEL_SCI_ODD,
    events: sci_events(0x09E),
    priority: SERIAL_PRIORITY,
};

/// SCI2 on P302 (TXD2) / P301 (RXD2), the D1/D0 header pins
pub const SCI2: PortConfig = PortConfig {
    channel: 2,
    clock: sci_module(2),
    tx_pin: PinId::new(3, 2),
    tx_function: PSEL_SCI_EVEN,
    rx_pin: PinId::new(3, 1),
    rx_function: PSEL_SCI_EVEN,
    events: sci_events(0x0A3),
    priority: SERIAL_PRIORITY,
};

/// SCI9 on P109 (TXD9) / P110 (RXD9)
pub const SCI9: PortConfig = PortConfig {
    channel: 9,
    clock: sci_module(9),
    tx_pin: PinId::new(1, 9),
    tx_function: PSEL_SCI_ODD,
    rx_pin: PinId::new(1, 10),
    rx_function: PSEL_SCI_ODD,
    events: sci_events(0x0B4),
    priority: SERIAL_PRIORITY,
};
