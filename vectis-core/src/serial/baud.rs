//! Baud-rate divider search
//!
//! The asynchronous baud generator produces
//!
//! ```text
//! baud = PCLK * (M / 256) / (D * 4^cks * (BRR + 1))
//! ```
//!
//! where `D` is 32 for 16x oversampling and 16 for 8x, `cks` is the clock
//! pre-divider (0..=3), `BRR` is an 8-bit register and `M` (128..=256) is
//! the optional fractional modulation. With at most 4 x 2 combinations the
//! search is exhaustive.

use vectis_hal::uart::{BaudSetting, Oversampling};

/// Largest clock pre-divider select
pub const MAX_CKS: u8 = 3;

const OVERSAMPLING_MODES: [Oversampling; 2] = [Oversampling::X16, Oversampling::X8];

/// Divider search failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudError {
    /// No combination fits the divider registers
    Unreachable,
    /// Best combination misses the target by more than the allowed error
    ErrorTooLarge { permille: u32 },
}

/// Chosen register values and the rate they produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudChoice {
    pub setting: BaudSetting,
    /// Achieved rate in bits per second
    pub actual: u32,
    /// Absolute error against the requested rate
    pub error: u32,
}

impl BaudChoice {
    /// Error relative to `target`, in permille
    pub fn error_permille(&self, target: u32) -> u32 {
        ((self.error as u64 * 1000) / target.max(1) as u64) as u32
    }
}

fn base_divisor(oversampling: Oversampling, cks: u8) -> u64 {
    let base = match oversampling {
        Oversampling::X16 => 32,
        Oversampling::X8 => 16,
    };
    base << (2 * cks as u64)
}

/// Rate produced by a register setting
pub fn achieved_baud(pclk_hz: u32, setting: &BaudSetting) -> u32 {
    let m = setting.mddr.map_or(256, |m| m as u64);
    let divisor = base_divisor(setting.oversampling, setting.cks) * (setting.brr as u64 + 1) * 256;
    ((pclk_hz as u64 * m) / divisor) as u32
}

fn candidate(pclk_hz: u32, baud: u32, setting: BaudSetting) -> BaudChoice {
    let actual = achieved_baud(pclk_hz, &setting);
    BaudChoice {
        setting,
        actual,
        error: actual.abs_diff(baud),
    }
}

/// Find the divider setting closest to `baud`
///
/// Ties keep the earlier candidate: 16x oversampling before 8x, smaller
/// pre-dividers first, unmodulated before modulated.
pub fn search(pclk_hz: u32, baud: u32, fractional: bool) -> Result<BaudChoice, BaudError> {
    if baud == 0 || pclk_hz == 0 {
        return Err(BaudError::Unreachable);
    }

    let pclk = pclk_hz as u64;
    let mut best: Option<BaudChoice> = None;
    let mut consider = |choice: BaudChoice| {
        if best.map_or(true, |b| choice.error < b.error) {
            best = Some(choice);
        }
    };

    for oversampling in OVERSAMPLING_MODES {
        for cks in 0..=MAX_CKS {
            let denom = base_divisor(oversampling, cks) * baud as u64;

            // Plain divider: BRR + 1 rounded to nearest
            let n = (2 * pclk + denom) / (2 * denom);
            if (1..=256).contains(&n) {
                consider(candidate(
                    pclk_hz,
                    baud,
                    BaudSetting {
                        cks,
                        brr: (n - 1) as u8,
                        mddr: None,
                        oversampling,
                    },
                ));
            }

            if !fractional {
                continue;
            }

            // Modulated divider: BRR + 1 rounded down, M/256 scales the
            // clock back down onto the target
            let n = pclk / denom;
            if !(1..=256).contains(&n) {
                continue;
            }
            let m = (512 * denom * n + pclk) / (2 * pclk);
            if (128..256).contains(&m) {
                consider(candidate(
                    pclk_hz,
                    baud,
                    BaudSetting {
                        cks,
                        brr: (n - 1) as u8,
                        mddr: Some(m as u8),
                        oversampling,
                    },
                ));
            }
        }
    }

    best.ok_or(BaudError::Unreachable)
}

/// [`search`], rejecting results beyond `max_error_permille`
pub fn calculate(
    pclk_hz: u32,
    baud: u32,
    fractional: bool,
    max_error_permille: u32,
) -> Result<BaudChoice, BaudError> {
    let choice = search(pclk_hz, baud, fractional)?;
    let permille = choice.error_permille(baud);
    if permille > max_error_permille {
        return Err(BaudError::ErrorTooLarge { permille });
    }
    Ok(choice)
}
