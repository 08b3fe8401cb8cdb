//! Boot console output: banner and fault block.

use core::fmt;

use log::{error, info};

/// Version banner, printed once the console sink is attached.
pub fn banner() {
    info!(
        target: "spl",
        "HALCYON SPL {} :: RAM-resident loader staged",
        env!("CARGO_PKG_VERSION")
    );
}

/// Structured fatal diagnostic. The caller parks the core afterwards.
pub fn fault(reason: &dyn fmt::Display) {
    error!(target: "spl", "──────────────── BOOT FAULT ────────────────");
    error!(target: "spl", "{}", reason);
    error!(target: "spl", "halted; external reset required");
}
