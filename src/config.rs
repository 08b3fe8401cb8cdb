//! config.rs — frozen board configuration for one boot attempt.
//!
//! A board port constructs a [`BoardConfig`] once, before the sequence
//! starts, and the loader only ever reads it. Everything here is a board
//! fact (addresses, capability posture), not something the loader infers.

use bitflags::bitflags;

bitflags! {
    /// Construction-time capability switches.
    ///
    /// These cover the per-board policy points that are not compile-time
    /// features: how an unrecognized storage sub-mode resolves, and whether
    /// the signed production serial-flash mode is honored.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LoaderFeatures: u32 {
        /// Unrecognized storage sub-modes resolve to embedded-controller
        /// boot instead of `Undefined`.
        const EMMC_BOOT_MODE = 1 << 0;
        /// Honor the signed production mode reported for serial-flash boot.
        const PROD_SPI_BOOT  = 1 << 1;
    }
}

/// Which layout the ROM parameter block has when we read it.
///
/// On a cold ROM handoff the boot mode sits behind two levels of
/// indirection (device descriptor, then device data). When an earlier
/// loader stage already ran and re-entered us, it has flattened the mode
/// to a fixed offset. The board port knows which applies; the loader
/// never guesses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitContext {
    /// First RAM-resident stage after the mask ROM.
    FirstStage,
    /// Re-entered after a prior loader stage normalized the block.
    Reentry,
}

/// Per-board constants, built once and threaded by reference through the
/// whole sequence.
#[derive(Clone, Copy, Debug)]
pub struct BoardConfig {
    /// Address of the scratch word where the ROM leaves the pointer to its
    /// boot-parameter block.
    pub scratch_ptr_addr: usize,
    /// First valid address of the non-secure scratch RAM the ROM block
    /// must lie in.
    pub sram_start: usize,
    /// Last valid address of that region (inclusive).
    pub sram_end: usize,
    /// Load base assumed for an untagged monitor payload.
    pub monitor_base: usize,
    /// Entry point assumed for an untagged monitor payload.
    pub monitor_entry: usize,
    /// Size ceiling assumed for an untagged monitor payload.
    pub monitor_ceiling: usize,
    pub features: LoaderFeatures,
    pub init_context: InitContext,
}
