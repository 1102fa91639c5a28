//! Vectis Hardware Abstraction Layer
//!
//! This crate defines the narrow register models that the board-agnostic
//! core drives. A chip crate implements them against real registers, and
//! `vectis-core` ships software fakes of each for host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (vectis-firmware, etc.)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  vectis-core (buffers, irq, serial)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  vectis-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  vectis-hal-  │
//!             │    ra4m1      │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`irq::InterruptController`] - Slot enable/priority/routing
//! - [`irq::VectorMemory`] - Boot table, RAM table and table-base register
//! - [`uart::SerialRegisters`] - One asynchronous serial peripheral
//! - [`uart::UartTx`], [`uart::UartRx`] - Blocking byte-stream API
//! - [`gpio::PinMux`] - Pin function routing
//! - [`clock::ModuleClocks`] - Peripheral clock gating

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod gpio;
pub mod irq;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::{ModuleClocks, ModuleStop};
pub use gpio::{PinFunction, PinId, PinMux};
pub use irq::{EventId, InterruptController, Isr, Priority, SlotId, Trigger, VectorMemory};
pub use uart::{SerialRegisters, UartRx, UartTx};
