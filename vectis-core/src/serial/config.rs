//! Serial port configuration types

use vectis_hal::{EventId, Isr, ModuleStop, PinFunction, PinId, Priority};

/// Event numbers of the four interrupt sources of one serial channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortEvents {
    /// Receive data full
    pub rx_data: EventId,
    /// Receive error
    pub rx_error: EventId,
    /// Transmit data empty
    pub tx_empty: EventId,
    /// Transmit end
    pub tx_complete: EventId,
}

/// Static description of one serial peripheral and its wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortConfig {
    /// Peripheral channel number
    pub channel: u8,
    /// Module-stop bit gating the peripheral clock
    pub clock: ModuleStop,
    pub tx_pin: PinId,
    pub tx_function: PinFunction,
    pub rx_pin: PinId,
    pub rx_function: PinFunction,
    pub events: PortEvents,
    /// Priority given to all four interrupt slots
    pub priority: Priority,
}

/// Driver tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialOptions {
    /// Count bytes dropped by receive-buffer overruns
    pub count_rx_overruns: bool,
    /// Allow fractional baud modulation in the divider search
    pub fractional_baud: bool,
    /// Largest accepted baud error, in permille
    pub max_baud_error_permille: u32,
}

impl SerialOptions {
    pub const DEFAULT: Self = Self {
        count_rx_overruns: true,
        fractional_baud: true,
        max_baud_error_permille: 50,
    };
}

impl Default for SerialOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The four interrupt entry points of one port
///
/// These are small `extern "C"` trampolines that forward to the port's
/// `on_*` methods; see the firmware's `serial_port!` macro.
#[derive(Debug, Clone, Copy)]
pub struct SerialHandlers {
    pub rx_data: Isr,
    pub rx_error: Isr,
    pub tx_empty: Isr,
    pub tx_complete: Isr,
}

/// Most recent receive error, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReceiveError {
    None = 0,
    Framing = 1,
    Parity = 2,
    Overrun = 3,
}

impl ReceiveError {
    pub const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => ReceiveError::Framing,
            2 => ReceiveError::Parity,
            3 => ReceiveError::Overrun,
            _ => ReceiveError::None,
        }
    }

    pub fn is_error(&self) -> bool {
        *self != ReceiveError::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(ReceiveError::Overrun > ReceiveError::Parity);
        assert!(ReceiveError::Parity > ReceiveError::Framing);
        assert!(ReceiveError::Framing > ReceiveError::None);
    }

    #[test]
    fn test_bits_round_trip() {
        for error in [
            ReceiveError::None,
            ReceiveError::Framing,
            ReceiveError::Parity,
            ReceiveError::Overrun,
        ] {
            assert_eq!(ReceiveError::from_bits(error as u8), error);
        }
        assert_eq!(ReceiveError::from_bits(0xFF), ReceiveError::None);
    }
}
