//! params.rs — ROM boot-parameter capture and normalization.
//!
//! The mask ROM leaves a parameter block in non-secure scratch RAM and a
//! pointer to it at a fixed scratch word. The block's encoding is ROM
//! property, not ours, so fields are read at the documented byte offsets
//! through a checked [`RomBus`] rather than by casting the block to a
//! struct.
//!
//! Block layout (offsets from the block base, little-endian):
//!
//! ```text
//!   +0x04  u32  device-descriptor pointer
//!   +0x08  u8   boot device
//!   +0x0a  u8   channel flags      (opaque, carried through)
//!   +0x0c  u8   boot mode          (only valid in a re-entry context)
//! ```
//!
//! In a first-stage context the boot mode instead sits two hops away:
//! `*(device_descriptor + 0x18)` points at device data, and the mode is the
//! u32 at `device_data + 0x0c`.
//!
//! Capture is fail-safe: a pointer outside the configured scratch bounds,
//! or any refused read, leaves the returned block at its zeroed state. No
//! partial capture is ever observable.

use log::debug;

use crate::config::{BoardConfig, InitContext, LoaderFeatures};

/* ---------- ROM block offsets ---------- */

const DEV_DESC_PTR_OFFSET: usize = 0x04;
const DEVICE_OFFSET: usize = 0x08;
const CH_FLAGS_OFFSET: usize = 0x0a;
/// Mode offset, from the block base (re-entry) or the device data (cold).
const MODE_OFFSET: usize = 0x0c;
const DEV_DATA_PTR_OFFSET: usize = 0x18;

/* ---------- ROM device codes ---------- */

pub const DEV_NAND: u8 = 0x03;
pub const DEV_MMC1: u8 = 0x05;
pub const DEV_MMC2: u8 = 0x06;
pub const DEV_MMC2_ALT: u8 = 0x07;
pub const DEV_ETHERNET: u8 = 0x08;
pub const DEV_QSPI: u8 = 0x0a;
/// Secondary serial-flash addressing variant; an alias of [`DEV_QSPI`].
pub const DEV_QSPI_ALT: u8 = 0x0b;
pub const DEV_RAM: u8 = 0x0c;
pub const DEV_USB: u8 = 0x0d;

/// ROM mode codes for storage-class devices.
const MODE_RAW_SECTOR: u32 = 0x01;
const MODE_FILESYSTEM: u32 = 0x02;
const MODE_PROD: u32 = 0x10;

/// Checked access to ROM-owned memory. Implementations return `None` for
/// any address they will not service; capture treats that as "no data",
/// never as garbage. Reads are little-endian.
pub trait RomBus {
    fn read_u8(&self, addr: usize) -> Option<u8>;
    fn read_u32(&self, addr: usize) -> Option<u32>;
}

/// Boot medium class, decoded from the ROM device byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootDevice {
    Ram,
    Mmc1,
    Mmc2,
    /// Alternate-port variant of [`BootDevice::Mmc2`]; dispatches to the
    /// same reader.
    Mmc2Alt,
    Nand,
    Qspi,
    Ethernet,
    Usb,
    Unknown(u8),
}

impl BootDevice {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            DEV_RAM => Self::Ram,
            DEV_MMC1 => Self::Mmc1,
            DEV_MMC2 => Self::Mmc2,
            DEV_MMC2_ALT => Self::Mmc2Alt,
            DEV_NAND => Self::Nand,
            DEV_QSPI | DEV_QSPI_ALT => Self::Qspi,
            DEV_ETHERNET => Self::Ethernet,
            DEV_USB => Self::Usb,
            other => Self::Unknown(other),
        }
    }

    /// True for media whose store also holds the auxiliary-core images.
    pub fn shares_aux_store(self) -> bool {
        matches!(self, Self::Mmc1 | Self::Mmc2 | Self::Mmc2Alt | Self::Qspi)
    }
}

/// Sub-mode within the chosen medium.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootMode {
    RawSector,
    Filesystem,
    EmmcBoot,
    SignedProd,
    Undefined,
}

impl BootMode {
    pub fn from_raw(raw: u32, features: LoaderFeatures) -> Self {
        if features.contains(LoaderFeatures::PROD_SPI_BOOT) && raw == MODE_PROD {
            return Self::SignedProd;
        }
        match raw {
            MODE_RAW_SECTOR => Self::RawSector,
            MODE_FILESYSTEM => Self::Filesystem,
            _ if features.contains(LoaderFeatures::EMMC_BOOT_MODE) => Self::EmmcBoot,
            _ => Self::Undefined,
        }
    }
}

/// The captured boot-parameter block.
///
/// `repr(C)` because its address is the argument handed to the next stage;
/// the layout is ABI, shared with whatever we jump to. Captured once,
/// read-only afterwards.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootParams {
    /// Normalized ROM device code.
    pub device: u8,
    /// Channel flags byte, carried through uninterpreted.
    pub ch_flags: u8,
    pub reserved: [u8; 2],
    /// Raw mode word; resolve with [`BootParams::boot_mode`].
    pub mode: u32,
}

impl BootParams {
    pub const ZERO: BootParams = BootParams {
        device: 0,
        ch_flags: 0,
        reserved: [0; 2],
        mode: 0,
    };

    pub fn device(&self) -> BootDevice {
        BootDevice::from_raw(self.device)
    }

    pub fn boot_mode(&self, features: LoaderFeatures) -> BootMode {
        BootMode::from_raw(self.mode, features)
    }
}

/// Capture the ROM boot parameters. Returns [`BootParams::ZERO`] when the
/// ROM pointer falls outside the non-secure scratch bounds or the device
/// byte cannot be read; mode extraction alone failing leaves the mode word
/// zero but keeps the rest.
pub fn capture(bus: &dyn RomBus, cfg: &BoardConfig) -> BootParams {
    let Some(block) = bus.read_u32(cfg.scratch_ptr_addr) else {
        return BootParams::ZERO;
    };
    let block = block as usize;

    if block < cfg.sram_start || block > cfg.sram_end {
        debug!(target: "params", "ROM pointer {:#010x} outside scratch bounds, ignored", block);
        return BootParams::ZERO;
    }

    let (Some(device), Some(ch_flags)) = (
        bus.read_u8(block + DEVICE_OFFSET),
        bus.read_u8(block + CH_FLAGS_OFFSET),
    ) else {
        return BootParams::ZERO;
    };

    let device = normalize_device(device);

    // The mode word is only meaningful for storage-class boot; everything
    // else leaves it zero.
    let mut mode = 0u32;
    if (DEV_MMC1..=DEV_MMC2_ALT).contains(&device) {
        mode = match cfg.init_context {
            InitContext::Reentry => bus
                .read_u8(block + MODE_OFFSET)
                .map(u32::from)
                .unwrap_or(0),
            InitContext::FirstStage => read_indirect_mode(bus, block).unwrap_or(0),
        };
    }

    debug!(target: "params", "device {:#04x} mode {:#04x} ch {:#04x}", device, mode, ch_flags);
    BootParams {
        device,
        ch_flags,
        reserved: [0; 2],
        mode,
    }
}

/// First-stage mode extraction: two pointer hops through the ROM's device
/// descriptor and device data.
fn read_indirect_mode(bus: &dyn RomBus, block: usize) -> Option<u32> {
    let dev_desc = bus.read_u32(block + DEV_DESC_PTR_OFFSET)? as usize;
    let dev_data = bus.read_u32(dev_desc + DEV_DATA_PTR_OFFSET)? as usize;
    bus.read_u32(dev_data + MODE_OFFSET)
}

/// Rewrite hardware alias codes to their canonical class so dispatch never
/// sees them. The secondary serial-flash addressing variant reports its
/// own code but names the same medium.
fn normalize_device(raw: u8) -> u8 {
    match raw {
        DEV_QSPI_ALT => DEV_QSPI,
        other => other,
    }
}
