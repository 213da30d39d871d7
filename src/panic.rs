//! Firmware panic handler.
//!
//! There is no process to kill and nothing to unwind to; per firmware
//! convention a fatal condition is reported and the thread spins.

use core::panic::PanicInfo;

use log::error;

#[panic_handler]
fn panic(info: &PanicInfo<'_>) -> ! {
    error!("*** PANIC: {info} ***");
    loop {
        core::hint::spin_loop();
    }
}
