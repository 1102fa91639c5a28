//! Fatal fault reporting
//!
//! Every condition that leaves the system with no safe continuation (a
//! corrupt vector table, an event that cannot be routed anywhere) ends up
//! in [`fatal`]. A board picks what happens there, once, with
//! [`set_policy`]: reset, halt, or dump state first.

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;
use vectis_hal::{EventId, PinId};

/// Unrecoverable conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// RAM vector table base violates the table-base register alignment
    TableMisaligned { base: usize, align: usize },
    /// RAM vector table is smaller than exceptions plus slots
    TableTooSmall { entries: usize, needed: usize },
    /// RAM copy differs from the boot table after relocation
    TableCopyMismatch { index: usize },
    /// Table-base register does not point at the RAM table
    TableNotActive,
    /// Event cannot be routed to any slot of the controller
    Unroutable(EventId),
    /// Pin has no external interrupt channel
    NoIrqChannel(PinId),
    /// Controller has more slots than the manager can track
    PoolTooLarge(usize),
    /// An interrupt fired on a slot with no handler installed
    UnassignedInterrupt(u16),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::TableMisaligned { base, align } => {
                write!(f, "vector table at {:#x} not aligned to {:#x}", base, align)
            }
            Fault::TableTooSmall { entries, needed } => {
                write!(f, "vector table has {} entries, needs {}", entries, needed)
            }
            Fault::TableCopyMismatch { index } => {
                write!(f, "vector table copy mismatch at entry {}", index)
            }
            Fault::TableNotActive => write!(f, "vector table not relocated"),
            Fault::Unroutable(event) => write!(f, "event {:#x} cannot be routed", event.0),
            Fault::NoIrqChannel(pin) => {
                write!(f, "pin P{}{:02} has no irq channel", pin.port, pin.pin)
            }
            Fault::PoolTooLarge(slots) => write!(f, "{} slots exceed the slot map", slots),
            Fault::UnassignedInterrupt(slot) => write!(f, "interrupt on unassigned slot {}", slot),
        }
    }
}

/// Board-specific fault action, run before the final panic
///
/// A policy that resets the part never returns. One that returns hands
/// control to the panic handler, which halts.
pub type FaultPolicy = fn(Fault);

static POLICY: Mutex<Cell<Option<FaultPolicy>>> = Mutex::new(Cell::new(None));

/// Install the board's fault policy
pub fn set_policy(policy: FaultPolicy) {
    critical_section::with(|cs| POLICY.borrow(cs).set(Some(policy)));
}

/// Report an unrecoverable fault and stop
pub fn fatal(fault: Fault) -> ! {
    error!("fatal: {}", fault);

    let policy = critical_section::with(|cs| POLICY.borrow(cs).get());
    if let Some(policy) = policy {
        policy(fault);
    }

    panic!("fatal: {}", fault);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut buf = heapless::String::<64>::new();
        fmt::write(&mut buf, format_args!("{}", Fault::Unroutable(EventId(0x98)))).unwrap();
        assert_eq!(buf.as_str(), "event 0x98 cannot be routed");
    }

    #[test]
    #[should_panic(expected = "vector table not relocated")]
    fn test_fatal_panics() {
        fatal(Fault::TableNotActive);
    }
}
