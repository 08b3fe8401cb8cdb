//! handoff.rs — the irreversible jump to the loaded image.
//!
//! Entry contract shared with the next stage: a monitor (or unrecognized)
//! payload is entered with one argument, the address of the captured
//! boot-parameter block, so it can learn the boot medium the same way we
//! did. An operating-system payload takes no argument; the board hook has
//! already staged whatever the OS expects at its agreed address. Both
//! shapes quiesce caches identically first. Nothing returns from here.

use core::mem;

use log::{debug, warn};

use crate::board::BoardHooks;
use crate::image::OsKind;
use crate::params::BootParams;
use crate::verify::VerifiedImage;

/// Argument-taking entry shape.
type EntryWithArgs = unsafe extern "C" fn(*const BootParams) -> !;
/// Argument-free entry shape.
type EntryNoArgs = unsafe extern "C" fn() -> !;

/// Cache/quiesce maintenance performed immediately before any transfer of
/// control. Board property: typically clean/invalidate caches and disable
/// whatever the next stage must re-own.
pub trait CachePort {
    fn quiesce(&mut self);
}

/// Copy the captured parameters into a stable slot and return its address.
///
/// The next stage reads the block through this pointer after our stack is
/// gone, so it cannot live in a stack frame. Single core, written once,
/// immediately before the jump.
pub fn stage(params: BootParams) -> *const BootParams {
    static mut ARGS: BootParams = BootParams::ZERO;
    unsafe {
        ARGS = params;
        core::ptr::addr_of!(ARGS)
    }
}

/// Transfer control to the admitted image. Terminal: the loader ceases to
/// exist from the next stage's point of view.
pub fn jump(
    image: VerifiedImage,
    args: *const BootParams,
    cache: &mut dyn CachePort,
    hooks: &mut dyn BoardHooks,
) -> ! {
    let desc = image.into_descriptor();
    debug!(target: "handoff", "entry point {:#010x}", desc.entry_point);

    match desc.os {
        OsKind::Os => {
            hooks.prepare_for_os();
            cache.quiesce();
            // SAFETY: the descriptor came through the authenticity gate and
            // its entry point lies inside the region the medium loaded.
            let entry: EntryNoArgs = unsafe { mem::transmute(desc.entry_point) };
            unsafe { entry() }
        }
        OsKind::Monitor | OsKind::Unknown => {
            if desc.os == OsKind::Unknown {
                warn!(target: "handoff", "unrecognized payload kind, jumping nevertheless");
            }
            cache.quiesce();
            // SAFETY: as above; the block behind `args` is in a stable slot
            // that outlives this stack.
            let entry: EntryWithArgs = unsafe { mem::transmute(desc.entry_point) };
            unsafe { entry(args) }
        }
    }
}
