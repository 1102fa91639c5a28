//! Pin function routing
//!
//! Pin-mux registers are an external collaborator of the serial driver and
//! the external interrupt allocator: they only need to hand a pin to a
//! peripheral, take it back, and know which IRQ channel a pin feeds.

/// Port/pin identity, e.g. `P301` is `PinId::new(3, 1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId {
    pub port: u8,
    pub pin: u8,
}

impl PinId {
    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port, pin }
    }
}

/// Peripheral function selector for a pin (`PSEL` value on RA parts)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinFunction(pub u8);

/// Pin multiplexer
pub trait PinMux {
    /// Hand the pin to a peripheral function
    fn set_function(&mut self, pin: PinId, function: PinFunction);

    /// Return the pin to a plain, high-impedance GPIO input
    fn reset(&mut self, pin: PinId);

    /// External interrupt channel wired to this pin, if any
    fn irq_channel(&self, pin: PinId) -> Option<u8>;

    /// Enable or disable the pin's IRQ input path
    fn set_irq_input(&mut self, pin: PinId, enabled: bool);
}

/// Parse a pin string from config
///
/// Supports formats:
/// - "P301" -> port 3, pin 1
/// - "p105" -> port 1, pin 5
pub fn parse_pin_string(s: &str) -> Option<PinId> {
    let s = s.trim();
    let digits = s.strip_prefix('P').or_else(|| s.strip_prefix('p'))?;

    if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let port = digits[..1].parse().ok()?;
    let pin = digits[1..].parse().ok()?;

    if pin > 15 {
        return None;
    }

    Some(PinId::new(port, pin))
}
