//! Serial communications interface, asynchronous mode
//!
//! Each SCI channel is a 32-byte register block at `0x4007_0000 + 0x20 * n`.
//! SCR and SSR bit positions match [`Control`] and [`Status`] one to one.

use vectis_hal::uart::{
    BaudSetting, Control, DataBits, FrameFormat, Oversampling, Parity, Status, StopBits,
};
use vectis_hal::SerialRegisters;

use crate::reg;

const SCI_BASE: usize = 0x4007_0000;
const SCI_STRIDE: usize = 0x20;

const SMR: usize = 0x00;
const BRR: usize = 0x01;
const SCR: usize = 0x02;
const TDR: usize = 0x03;
const SSR: usize = 0x04;
const RDR: usize = 0x05;
const SCMR: usize = 0x06;
const SEMR: usize = 0x07;
const MDDR: usize = 0x12;

const SMR_CKS_MASK: u8 = 0b11;
const SMR_STOP: u8 = 1 << 3;
const SMR_PM: u8 = 1 << 4;
const SMR_PE: u8 = 1 << 5;
const SMR_CHR: u8 = 1 << 6;

/// SCMR reset value: CHR1 set, SMIF/SINV/SDIR clear
const SCMR_RESET: u8 = 0xF2;
const SCMR_CHR1: u8 = 1 << 4;

const SEMR_BRME: u8 = 1 << 2;
const SEMR_ABCS: u8 = 1 << 4;

/// One SCI channel
///
/// Holds only the block address, so it is `const` constructible and can
/// live inside a `static` serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sci {
    base: usize,
}

impl Sci {
    /// Channel `n` (0..=9)
    pub const fn new(channel: u8) -> Self {
        Self {
            base: SCI_BASE + SCI_STRIDE * channel as usize,
        }
    }

    fn addr(&self, offset: usize) -> usize {
        self.base + offset
    }
}

impl SerialRegisters for Sci {
    fn reset(&self) {
        reg::write8(self.addr(SCR), 0);
        reg::write8(self.addr(SMR), 0);
        reg::write8(self.addr(SCMR), SCMR_RESET);
        reg::write8(self.addr(SEMR), 0);
        reg::write8(self.addr(MDDR), 0xFF);
        self.clear_status(Status::ERRORS);
    }

    fn set_format(&self, format: FrameFormat) {
        let mut smr = reg::read8(self.addr(SMR)) & SMR_CKS_MASK;
        match format.parity {
            Parity::None => {}
            Parity::Even => smr |= SMR_PE,
            Parity::Odd => smr |= SMR_PE | SMR_PM,
        }
        if format.stop_bits == StopBits::Two {
            smr |= SMR_STOP;
        }
        if format.data_bits == DataBits::Seven {
            smr |= SMR_CHR;
        }
        reg::write8(self.addr(SMR), smr);
        // CHR1 stays set: with it, CHR selects between 8 and 7 bits
        reg::modify8(self.addr(SCMR), |v| v | SCMR_CHR1);
    }

    fn set_baud(&self, setting: BaudSetting) {
        reg::modify8(self.addr(SMR), |v| (v & !SMR_CKS_MASK) | (setting.cks & SMR_CKS_MASK));
        reg::write8(self.addr(BRR), setting.brr);

        let mut semr = 0;
        if setting.oversampling == Oversampling::X8 {
            semr |= SEMR_ABCS;
        }
        match setting.mddr {
            Some(m) => {
                reg::write8(self.addr(MDDR), m);
                semr |= SEMR_BRME;
            }
            None => reg::write8(self.addr(MDDR), 0xFF),
        }
        reg::write8(self.addr(SEMR), semr);
    }

    fn control(&self) -> Control {
        Control::from_bits_truncate(reg::read8(self.addr(SCR)))
    }

    fn modify_control(&self, set: Control, clear: Control) {
        // Mainline and interrupt handlers both rewrite SCR
        critical_section::with(|_| {
            reg::modify8(self.addr(SCR), |v| (v & !clear.bits()) | set.bits());
        });
    }

    fn status(&self) -> Status {
        Status::from_bits_truncate(reg::read8(self.addr(SSR)))
    }

    fn clear_status(&self, flags: Status) {
        // Flags clear by writing 0 after reading them as 1; writing 1 keeps them
        critical_section::with(|_| {
            let ssr = reg::read8(self.addr(SSR));
            reg::write8(self.addr(SSR), ssr & !flags.bits());
        });
    }

    fn write_data(&self, byte: u8) {
        reg::write8(self.addr(TDR), byte);
    }

    fn read_data(&self) -> u8 {
        reg::read8(self.addr(RDR))
    }
}
