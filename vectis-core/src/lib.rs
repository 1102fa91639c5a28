//! Board-agnostic core of the Vectis runtime
//!
//! This crate contains everything that does not touch registers directly:
//!
//! - Interrupt resource manager (vector table relocation, slot pool,
//!   external pin interrupts)
//! - Lock-free single-producer single-consumer ring buffer
//! - Interrupt-driven serial port driver and baud divider search
//! - Fatal fault reporting
//!
//! Hardware is reached only through the `vectis-hal` traits. With the
//! `sim` feature the crate also exports software fakes of those traits.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to later modules
#[macro_use]
mod fmt;

pub mod fault;
pub mod irq;
pub mod ring;
pub mod serial;
pub mod system;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use fault::Fault;
pub use ring::RingBuffer;
pub use serial::{SerialError, SerialPort};
pub use system::System;
