//! Module-stop clock gates
//!
//! A peripheral runs while its MSTPCRx bit is clear. Only MSTPCRB..D are
//! handled; MSTPCRA gates system blocks the drivers never touch.

use vectis_hal::{ModuleClocks, ModuleStop};

use crate::reg;

const MSTPCRB: usize = 0x4004_7000;

/// Register index of MSTPCRB in [`ModuleStop::register`]
pub const REG_B: u8 = 1;

/// SCI channel `n` is gated by MSTPCRB bit `31 - n`
pub const fn sci_module(channel: u8) -> ModuleStop {
    ModuleStop::new(REG_B, 31 - channel)
}

fn register(module: ModuleStop) -> Option<usize> {
    match module.register {
        1..=3 => Some(MSTPCRB + 4 * (module.register as usize - 1)),
        _ => None,
    }
}

/// RA4M1 module-stop control
#[derive(Debug, Default)]
pub struct Mstp {
    _private: (),
}

impl Mstp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleClocks for Mstp {
    fn start(&mut self, module: ModuleStop) {
        match register(module) {
            Some(addr) => critical_section::with(|_| {
                reg::modify32(addr, |v| v & !(1 << module.bit));
            }),
            None => warn!("no module-stop register {}", module.register),
        }
    }

    fn stop(&mut self, module: ModuleStop) {
        if let Some(addr) = register(module) {
            critical_section::with(|_| {
                reg::modify32(addr, |v| v | (1 << module.bit));
            });
        }
    }

    fn is_running(&self, module: ModuleStop) -> bool {
        register(module).is_some_and(|addr| reg::read32(addr) & (1 << module.bit) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sci_module_bits() {
        assert_eq!(sci_module(0), ModuleStop::new(1, 31));
        assert_eq!(sci_module(9), ModuleStop::new(1, 22));
        assert_eq!(register(ModuleStop::new(3, 0)), Some(0x4004_7008));
        assert_eq!(register(ModuleStop::new(0, 0)), None);
    }
}
