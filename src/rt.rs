//! Bare-metal runtime glue. Only exists on `target_os = "none"` builds;
//! hosted builds (tests) bring their own runtime.

use core::panic::PanicInfo;

use log::error;

use crate::params::RomBus;

/// Physical-memory view of the ROM scratch region. Bounds policy lives in
/// the capture path; this bus only refuses the null page.
pub struct PhysBus;

impl RomBus for PhysBus {
    fn read_u8(&self, addr: usize) -> Option<u8> {
        if addr == 0 {
            return None;
        }
        // SAFETY: capture only derives addresses from the validated
        // scratch window; the read is volatile because the ROM owns it.
        Some(unsafe { core::ptr::read_volatile(addr as *const u8) })
    }

    fn read_u32(&self, addr: usize) -> Option<u32> {
        if addr == 0 {
            return None;
        }
        // SAFETY: as above; unaligned-tolerant read of ROM-owned memory.
        Some(unsafe { core::ptr::read_unaligned(addr as *const u32) })
    }
}

#[panic_handler]
fn panic(info: &PanicInfo<'_>) -> ! {
    error!(target: "spl", "panic: {}", info);
    loop {
        core::hint::spin_loop();
    }
}
