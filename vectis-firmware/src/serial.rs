//! Static serial port declarations

/// Declare a `static` [`SerialPort`](vectis_core::SerialPort) with its
/// four interrupt trampolines
///
/// ```ignore
/// serial_port!(CONSOLE: board::CONSOLE_PORT, rx = 128, tx = 128, idle = idle);
/// ```
///
/// The trampolines are `extern "C"` so they can sit in the vector table
/// directly. Each acknowledges its ICU event, then forwards to one `on_*`
/// method of the port.
macro_rules! serial_port {
    ($name:ident : $config:expr, rx = $rx:expr, tx = $tx:expr, idle = $idle:path) => {
        static $name: vectis_core::SerialPort<vectis_hal_ra4m1::Sci, { $rx }, { $tx }> =
            vectis_core::SerialPort::new(
                $config,
                vectis_hal_ra4m1::Sci::new($config.channel),
                vectis_core::serial::SerialHandlers {
                    rx_data: {
                        extern "C" fn rx_data() {
                            vectis_hal_ra4m1::icu::ack_active();
                            $name.on_rx_data();
                        }
                        rx_data
                    },
                    rx_error: {
                        extern "C" fn rx_error() {
                            vectis_hal_ra4m1::icu::ack_active();
                            $name.on_rx_error();
                        }
                        rx_error
                    },
                    tx_empty: {
                        extern "C" fn tx_empty() {
                            vectis_hal_ra4m1::icu::ack_active();
                            $name.on_tx_empty();
                        }
                        tx_empty
                    },
                    tx_complete: {
                        extern "C" fn tx_complete() {
                            vectis_hal_ra4m1::icu::ack_active();
                            $name.on_tx_complete();
                        }
                        tx_complete
                    },
                },
                vectis_core::serial::SerialOptions::DEFAULT,
                $idle,
            );
    };
}
