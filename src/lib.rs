//! Halcyon SPL — RAM-resident second-stage program loader.
//!
//! The mask ROM of a Halcyon-family SoC loads this image into on-chip RAM
//! and jumps to it with a pointer to its boot-parameter block. From there
//! this crate runs a strictly ordered, one-shot sequence:
//!
//! 1. capture and normalize the ROM boot parameters ([`params`])
//! 2. select a loading strategy for the reported boot medium ([`dispatch`])
//! 3. turn the loaded bytes into an image descriptor ([`image`])
//! 4. attach auxiliary processors sharing the boot medium ([`cores`])
//! 5. admit the image through the authenticity gate ([`verify`])
//! 6. transfer control, never to return ([`handoff`])
//!
//! Medium drivers, board bring-up, console hardware and the signature
//! primitive are ports supplied by the board image; this crate owns only
//! the boot policy between ROM handoff and the jump.

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod config;
#[cfg(feature = "aux-attach")]
pub mod cores;
pub mod dispatch;
pub mod handoff;
pub mod image;
pub mod logger;
pub mod params;
pub mod sequence;
pub mod ui;
pub mod verify;

#[cfg(target_os = "none")]
pub mod rt;

pub use board::BoardHooks;
pub use config::{BoardConfig, InitContext, LoaderFeatures};
#[cfg(feature = "aux-attach")]
pub use cores::{AuxCore, AuxCorePort, CORE_LOAD_ERR};
pub use dispatch::{DispatchError, ImageSource, Loaded, MediaSet, RamSource};
pub use handoff::CachePort;
pub use image::{ImageDescriptor, OsKind, ParseFlags};
pub use params::{BootDevice, BootMode, BootParams, RomBus};
pub use sequence::{halt, prepare, run, FatalError, Ports};
pub use verify::{PayloadVerifier, VerifiedImage};
