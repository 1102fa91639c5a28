//! Volatile register access
//!
//! Addresses come from the RA4M1 register map and are always valid, mapped
//! and naturally aligned for the access width.

use core::ptr::{read_volatile, write_volatile};

pub fn read8(addr: usize) -> u8 {
    // SAFETY: fixed peripheral address, byte access
    unsafe { read_volatile(addr as *const u8) }
}

pub fn write8(addr: usize, value: u8) {
    // SAFETY: fixed peripheral address, byte access
    unsafe { write_volatile(addr as *mut u8, value) }
}

pub fn modify8(addr: usize, f: impl FnOnce(u8) -> u8) {
    write8(addr, f(read8(addr)));
}

pub fn read32(addr: usize) -> u32 {
    // SAFETY: fixed peripheral address, word aligned
    unsafe { read_volatile(addr as *const u32) }
}

pub fn write32(addr: usize, value: u32) {
    // SAFETY: fixed peripheral address, word aligned
    unsafe { write_volatile(addr as *mut u32, value) }
}

pub fn modify32(addr: usize, f: impl FnOnce(u32) -> u32) {
    write32(addr, f(read32(addr)));
}
