//! Vectis - demo firmware
//!
//! Brings up the interrupt manager on an RA4M1, starts the console serial
//! port from `board.toml` and echoes everything it receives. An optional
//! button on an external IRQ pin is counted and reported.

#![no_std]
#![no_main]

use core::sync::atomic::Ordering;

use cortex_m_rt::entry;
use defmt::*;
use portable_atomic::AtomicU32;
use {defmt_rtt as _, panic_probe as _};

use vectis_core::serial::ReceiveError;
use vectis_core::System;
use vectis_hal::Priority;
use vectis_hal_ra4m1::{Icu, Mstp, Pfs, RamVectors};

#[macro_use]
mod serial;

mod board {
    use vectis_core::serial::PortConfig;
    use vectis_hal::uart::{self, FrameFormat};
    use vectis_hal::{PinId, Trigger};
    use vectis_hal_ra4m1::ports;

    include!(concat!(env!("OUT_DIR"), "/board_config.rs"));
}

const BUTTON_PRIORITY: Priority = Priority(8);

serial_port!(CONSOLE: board::CONSOLE_PORT, rx = board::CONSOLE_RX, tx = board::CONSOLE_TX, idle = idle);

static BUTTON_PRESSES: AtomicU32 = AtomicU32::new(0);

/// Cooperative yield: sleep until the next interrupt
fn idle() {
    cortex_m::asm::wfi();
}

extern "C" fn on_button() {
    vectis_hal_ra4m1::icu::ack_active();
    BUTTON_PRESSES.fetch_add(1, Ordering::Relaxed);
}

#[entry]
fn main() -> ! {
    info!("Vectis firmware starting...");
    vectis_hal_ra4m1::install_fault_policy();

    let Some(cp) = cortex_m::Peripherals::take() else {
        defmt::panic!("core peripherals already taken");
    };

    let mut sys = System::new(
        Icu::new(cp.NVIC),
        RamVectors::new(cp.SCB),
        Pfs::new(),
        Mstp::new(),
        board::PCLK_HZ,
    );
    sys.init();

    match CONSOLE.begin(&mut sys, board::CONSOLE_BAUD, board::CONSOLE_FORMAT) {
        Ok(choice) => info!("console at {} baud", choice.actual),
        Err(e) => defmt::panic!("console failed to start: {}", e),
    }

    if let Some((pin, trigger)) = board::BUTTON {
        match sys.attach_pin_interrupt(pin, trigger, on_button, BUTTON_PRIORITY) {
            Ok(ext) => info!("button on irq{}", ext.channel),
            Err(e) => warn!("button not attached: {}", e),
        }
    }

    let mut console = &CONSOLE;
    let _ = embedded_io::Write::write_all(&mut console, b"vectis ready\r\n");

    let mut reported = 0;
    loop {
        let mut busy = false;

        while let Some(byte) = CONSOLE.read() {
            CONSOLE.write(byte);
            busy = true;
        }

        match CONSOLE.receive_error() {
            ReceiveError::None => {}
            error => warn!("console receive error: {}", error),
        }

        let presses = BUTTON_PRESSES.load(Ordering::Relaxed);
        if presses != reported {
            reported = presses;
            info!("button pressed {} times", presses);
            CONSOLE.write_bytes(b"button\r\n");
            busy = true;
        }

        if !busy {
            idle();
        }
    }
}
