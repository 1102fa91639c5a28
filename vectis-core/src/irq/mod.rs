//! Interrupt resource manager
//!
//! The controller has a fixed pool of slots. Drivers ask for a slot per
//! event source at start-up and give it back when they stop; the manager
//! rewrites the RAM vector table and the routing registers accordingly.

mod external;
mod manager;
mod slots;
mod vector;

pub use external::{ExtIrqLine, ExternalIrqs, EXTERNAL_CHANNELS};
pub use manager::{Diagnostics, InterruptManager, IrqError, IrqLine};
pub use slots::{SlotSet, DEFAULT_SLOTS, MAX_SLOTS};
pub use vector::{table_alignment, Vector, VectorTable};
