//! Renesas RA4M1 implementation of the Vectis register models
//!
//! Implements the `vectis-hal` traits against the RA4M1 (Cortex-M4F,
//! 48 MHz) register map:
//!
//! - [`Icu`] - 32 event-link slots in front of the NVIC, 16 external IRQ
//!   channels
//! - [`RamVectors`] - boot table, the 48-entry RAM table and VTOR
//! - [`Sci`] - asynchronous mode of SCI0/1/2/9
//! - [`Pfs`] - pin function select
//! - [`Mstp`] - module-stop clock gates
//!
//! This is the only crate in the workspace with `unsafe` code. Every
//! register access goes through the volatile helpers in `reg`.
//!
//! # Features
//!
//! - `reset-on-fault` - [`install_fault_policy`] resets the chip on a fatal fault
//! - `defmt` - Enable debug formatting support

#![no_std]

#[macro_use]
mod fmt;

pub mod icu;
pub mod mstp;
pub mod pfs;
pub mod ports;
mod reg;
pub mod sci;
pub mod vectors;

pub use icu::Icu;
pub use mstp::Mstp;
pub use pfs::Pfs;
pub use sci::Sci;
pub use vectors::RamVectors;

use vectis_core::fault::{self, Fault};

/// Peripheral clock B, which feeds the SCI baud generators, with the
/// 48 MHz HOCO and the default /2 divider
pub const PCLKB_HZ: u32 = 24_000_000;

/// Install the fatal-fault policy selected by crate features
///
/// Without `reset-on-fault` the default policy stays: the fault is logged
/// and the core panics, which the panic handler turns into a halt.
pub fn install_fault_policy() {
    if cfg!(feature = "reset-on-fault") {
        fault::set_policy(reset_on_fault);
    }
}

fn reset_on_fault(fault: Fault) {
    error!("resetting after fault: {}", fault);
    cortex_m::peripheral::SCB::sys_reset();
}
