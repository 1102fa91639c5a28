//! Pin function select
//!
//! PmnPFS lives at `0x4004_0800 + 0x40 * m + 4 * n`. Writes are locked
//! behind PWPR, which every write below opens and closes again.

use vectis_hal::{PinFunction, PinId, PinMux};

use crate::reg;

const PFS_BASE: usize = 0x4004_0800;
const PWPR: usize = 0x4004_0D03;

const PWPR_PFSWE: u8 = 1 << 6;
const PWPR_B0WI: u8 = 1 << 7;

const PFS_PDR: u32 = 1 << 2;
const PFS_ISEL: u32 = 1 << 14;
const PFS_PMR: u32 = 1 << 16;
const PFS_PSEL_SHIFT: u32 = 24;
const PFS_PSEL_MASK: u32 = 0x1F << PFS_PSEL_SHIFT;

/// Pins with an IRQ function and their channel
///
/// Limited to the pins broken out on the UNO R4 headers.
const IRQ_PINS: &[(PinId, u8)] = &[
    (PinId::new(1, 5), 0),
    (PinId::new(1, 4), 1),
    (PinId::new(1, 0), 2),
    (PinId::new(1, 10), 3),
    (PinId::new(1, 11), 4),
    (PinId::new(3, 2), 5),
    (PinId::new(3, 1), 6),
    (PinId::new(0, 1), 7),
    (PinId::new(0, 2), 8),
    (PinId::new(3, 4), 9),
];

fn pfs(pin: PinId) -> usize {
    PFS_BASE + 0x40 * pin.port as usize + 4 * pin.pin as usize
}

/// RA4M1 pin multiplexer
#[derive(Debug, Default)]
pub struct Pfs {
    _private: (),
}

impl Pfs {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&mut self, pin: PinId, f: impl FnOnce(u32) -> u32) {
        critical_section::with(|_| {
            reg::write8(PWPR, 0);
            reg::write8(PWPR, PWPR_PFSWE);
            reg::modify32(pfs(pin), f);
            reg::write8(PWPR, 0);
            reg::write8(PWPR, PWPR_B0WI);
        });
    }
}

impl PinMux for Pfs {
    fn set_function(&mut self, pin: PinId, function: PinFunction) {
        // PMR must be clear while PSEL changes
        self.write(pin, |v| v & !PFS_PMR);
        let psel = (function.0 as u32) << PFS_PSEL_SHIFT & PFS_PSEL_MASK;
        self.write(pin, |v| (v & !PFS_PSEL_MASK) | psel);
        self.write(pin, |v| v | PFS_PMR);
    }

    fn reset(&mut self, pin: PinId) {
        self.write(pin, |v| v & !(PFS_PMR | PFS_ISEL | PFS_PDR));
        self.write(pin, |v| v & !PFS_PSEL_MASK);
    }

    fn irq_channel(&self, pin: PinId) -> Option<u8> {
        IRQ_PINS
            .iter()
            .find(|(p, _)| *p == pin)
            .map(|(_, channel)| *channel)
    }

    fn set_irq_input(&mut self, pin: PinId, enabled: bool) {
        self.write(pin, |v| {
            if enabled {
                (v | PFS_ISEL) & !PFS_PDR
            } else {
                v & !PFS_ISEL
            }
        });
    }
}
