//! UART serial communication abstractions
//!
//! Two layers live here: the register model a serial peripheral exposes to
//! the interrupt-driven driver, and the blocking byte-stream traits the
//! driver offers to application code.

use bitflags::bitflags;

/// UART transmitter
///
/// Blocking trait for sending data over a UART interface.
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been queued or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
///
/// Blocking trait for receiving data from a UART interface.
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Read data from the UART
    ///
    /// Blocks until at least one byte is available, then returns as many
    /// buffered bytes as fit.
    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Read a single byte from the UART
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read_blocking(&mut buf)?;
        Ok(buf[0])
    }
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

/// Frame format: data bits, parity and stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameFormat {
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl FrameFormat {
    /// Create a frame format
    pub const fn new(data_bits: DataBits, parity: Parity, stop_bits: StopBits) -> Self {
        Self {
            data_bits,
            parity,
            stop_bits,
        }
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        SERIAL_8N1
    }
}

pub const SERIAL_8N1: FrameFormat = FrameFormat::new(DataBits::Eight, Parity::None, StopBits::One);
pub const SERIAL_8N2: FrameFormat = FrameFormat::new(DataBits::Eight, Parity::None, StopBits::Two);
pub const SERIAL_8E1: FrameFormat = FrameFormat::new(DataBits::Eight, Parity::Even, StopBits::One);
pub const SERIAL_8E2: FrameFormat = FrameFormat::new(DataBits::Eight, Parity::Even, StopBits::Two);
pub const SERIAL_8O1: FrameFormat = FrameFormat::new(DataBits::Eight, Parity::Odd, StopBits::One);
pub const SERIAL_8O2: FrameFormat = FrameFormat::new(DataBits::Eight, Parity::Odd, StopBits::Two);
pub const SERIAL_7E1: FrameFormat = FrameFormat::new(DataBits::Seven, Parity::Even, StopBits::One);
pub const SERIAL_7O1: FrameFormat = FrameFormat::new(DataBits::Seven, Parity::Odd, StopBits::One);

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

/// Receiver oversampling mode
///
/// `X16` samples each bit over 16 base clocks, `X8` over 8 (asynchronous
/// base clock select). `X8` doubles the reachable baud range at the cost
/// of noise margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    X16,
    X8,
}

/// Baud-rate generator register values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudSetting {
    /// Clock pre-divider select, divides by 4^cks
    pub cks: u8,
    /// Bit-rate register value
    pub brr: u8,
    /// Fractional modulation value M in M/256, `None` when modulation is off
    pub mddr: Option<u8>,
    /// Oversampling mode
    pub oversampling: Oversampling,
}

bitflags! {
    /// Serial control register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control: u8 {
        /// Transmit-complete interrupt enable
        const TEIE = 1 << 2;
        /// Receiver enable
        const RE = 1 << 4;
        /// Transmitter enable
        const TE = 1 << 5;
        /// Receive interrupt enable (data and error)
        const RIE = 1 << 6;
        /// Transmit-data-empty interrupt enable
        const TIE = 1 << 7;
    }
}

bitflags! {
    /// Serial status register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// Transmission complete
        const TEND = 1 << 2;
        /// Parity error
        const PER = 1 << 3;
        /// Framing error
        const FER = 1 << 4;
        /// Overrun error
        const ORER = 1 << 5;
        /// Receive data full
        const RDRF = 1 << 6;
        /// Transmit data empty
        const TDRE = 1 << 7;

        /// All receive error flags
        const ERRORS = Self::PER.bits() | Self::FER.bits() | Self::ORER.bits();
    }
}

/// Register model of one asynchronous serial peripheral
///
/// All methods take `&self`: the same peripheral is touched from mainline
/// code and from its interrupt handlers, and every access is a single
/// volatile register operation.
pub trait SerialRegisters {
    /// Put the peripheral in its disabled reset state (control cleared,
    /// error flags cleared)
    fn reset(&self);

    /// Apply data bits, parity and stop bits
    ///
    /// Only valid while the transmitter and receiver are disabled.
    fn set_format(&self, format: FrameFormat);

    /// Apply baud-rate generator values
    ///
    /// Only valid while the transmitter and receiver are disabled.
    fn set_baud(&self, setting: BaudSetting);

    /// Read the control register
    fn control(&self) -> Control;

    /// Set and clear control bits in one read-modify-write
    fn modify_control(&self, set: Control, clear: Control);

    /// Read the status register
    fn status(&self) -> Status;

    /// Clear latched status flags
    fn clear_status(&self, flags: Status);

    /// Write the transmit data register
    fn write_data(&self, byte: u8);

    /// Read the receive data register
    fn read_data(&self) -> u8;
}
