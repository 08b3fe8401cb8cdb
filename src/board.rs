//! Board bring-up hooks.
//!
//! Every method has an empty default so a minimal board compiles without
//! writing stubs; boards override what their silicon needs.

use crate::params::BootParams;

/// Bring-up callouts the sequence makes at fixed points. Internals (clocks,
/// pinmux, watchdog registers, device-tree fixups) are board property.
pub trait BoardHooks {
    /// Early watchdog arm/disarm, before any medium is touched.
    fn watchdog_init(&mut self) {}

    /// Medium and pin setup for the captured boot device. Runs after
    /// capture, before dispatch.
    fn board_init(&mut self, _params: &BootParams) {}

    /// Last board work before an operating-system payload gets control
    /// (staging its argument material at the agreed address, fixups).
    fn prepare_for_os(&mut self) {}
}
