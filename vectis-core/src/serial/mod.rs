//! Interrupt-driven asynchronous serial ports
//!
//! A [`SerialPort`] owns a receive and a transmit [`RingBuffer`](crate::ring::RingBuffer)
//! and four interrupt slots taken from the
//! [`InterruptManager`](crate::irq::InterruptManager) while it runs.

pub mod baud;
mod config;
mod io;
mod port;

pub use baud::{BaudChoice, BaudError};
pub use config::{PortConfig, PortEvents, ReceiveError, SerialHandlers, SerialOptions};
pub use port::{SerialError, SerialPort, DEFAULT_RX_CAPACITY, DEFAULT_TX_CAPACITY};
