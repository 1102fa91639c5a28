//! Peripheral clock gating

/// Module-stop bit identity: register index and bit position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModuleStop {
    /// Which module-stop control register (A, B, C, D as 0..=3)
    pub register: u8,
    /// Bit within that register
    pub bit: u8,
}

impl ModuleStop {
    pub const fn new(register: u8, bit: u8) -> Self {
        Self { register, bit }
    }
}

/// Peripheral clock gate control
pub trait ModuleClocks {
    /// Supply the module clock (clear its stop bit)
    fn start(&mut self, module: ModuleStop);

    /// Gate the module clock (set its stop bit)
    fn stop(&mut self, module: ModuleStop);

    /// Check if the module clock is running
    fn is_running(&self, module: ModuleStop) -> bool;
}
