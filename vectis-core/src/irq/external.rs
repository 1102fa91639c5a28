//! External pin interrupt allocation
//!
//! Pin-edge interrupts pass through a small bank of IRQ channels before
//! they reach the slot pool. Each pin is hard-wired to one channel, so the
//! allocator only has to track which pin currently holds each channel;
//! the slot itself comes from the [`InterruptManager`].

use vectis_hal::{InterruptController, Isr, PinId, PinMux, Priority, Trigger, VectorMemory};

use super::manager::{InterruptManager, IrqError, IrqLine};
use crate::fault::{fatal, Fault};

/// Number of external IRQ channels
pub const EXTERNAL_CHANNELS: usize = 16;

/// A pin interrupt bound to its channel and slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtIrqLine {
    pub pin: PinId,
    pub channel: u8,
    pub line: IrqLine,
}

/// External IRQ channel allocator
#[derive(Debug, Default)]
pub struct ExternalIrqs {
    channels: [Option<ExtIrqLine>; EXTERNAL_CHANNELS],
    rejected_detach: u32,
}

impl ExternalIrqs {
    pub const fn new() -> Self {
        Self {
            channels: [None; EXTERNAL_CHANNELS],
            rejected_detach: 0,
        }
    }

    /// Route a pin's interrupt to `handler`
    ///
    /// A pin without an IRQ channel is a build mistake and fatal. A channel
    /// held by another pin yields [`IrqError::NoChannel`].
    pub fn attach<C, V, P, const N: usize>(
        &mut self,
        irq: &mut InterruptManager<C, V, N>,
        pins: &mut P,
        pin: PinId,
        trigger: Trigger,
        handler: Isr,
        priority: Priority,
    ) -> Result<ExtIrqLine, IrqError>
    where
        C: InterruptController,
        V: VectorMemory,
        P: PinMux,
    {
        let channel = match pins.irq_channel(pin) {
            Some(channel) if (channel as usize) < EXTERNAL_CHANNELS => channel,
            _ => fatal(Fault::NoIrqChannel(pin)),
        };

        if let Some(existing) = self.channels[channel as usize] {
            if existing.pin == pin {
                warn!("pin P{}{} already attached", pin.port, pin.pin);
                return Err(IrqError::AlreadyAssigned(existing.line));
            }
            return Err(IrqError::NoChannel(channel));
        }

        pins.set_irq_input(pin, true);
        irq.controller_mut().set_external_trigger(channel, trigger);
        let event = irq.controller().external_event(channel);

        let line = match irq.acquire(event, handler, priority) {
            Ok(line) => line,
            Err(e) => {
                pins.set_irq_input(pin, false);
                return Err(e);
            }
        };

        let ext = ExtIrqLine { pin, channel, line };
        self.channels[channel as usize] = Some(ext);
        debug!("pin P{}{} -> irq{}", pin.port, pin.pin, channel);
        Ok(ext)
    }

    /// Release a pin interrupt
    ///
    /// Detaching a line that does not hold its channel is counted and
    /// ignored. Returns `true` when the channel was freed.
    pub fn detach<C, V, P, const N: usize>(
        &mut self,
        irq: &mut InterruptManager<C, V, N>,
        pins: &mut P,
        ext: ExtIrqLine,
    ) -> bool
    where
        C: InterruptController,
        V: VectorMemory,
        P: PinMux,
    {
        let held = self.channels.get(ext.channel as usize).copied().flatten();
        if held != Some(ext) {
            self.rejected_detach += 1;
            warn!("irq{} not held by P{}{}", ext.channel, ext.pin.port, ext.pin.pin);
            return false;
        }

        irq.release(ext.line);
        pins.set_irq_input(ext.pin, false);
        self.channels[ext.channel as usize] = None;
        true
    }

    /// Pin currently holding a channel
    pub fn owner(&self, channel: u8) -> Option<PinId> {
        self.channels
            .get(channel as usize)
            .copied()
            .flatten()
            .map(|ext| ext.pin)
    }

    /// Detach calls rejected because the caller did not hold the channel
    pub fn rejected_detaches(&self) -> u32 {
        self.rejected_detach
    }
}
