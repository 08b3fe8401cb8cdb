//! dispatch.rs — boot-device to loading-strategy selection.
//!
//! One fixed table from the normalized device class to the medium reader
//! that produces the payload bytes. No parsing happens here; a strategy
//! hands back a blob and the placement hints its medium implies, and the
//! caller forwards both to the image parser.
//!
//! Two aliases are intentional:
//! - the alternate-port eMMC code uses the eMMC reader, and
//! - serial-flash boot also uses the eMMC reader: the payload is mirrored
//!   on eMMC, which reads faster than the serial flash the ROM reports.
//!
//! An unrecognized device is fatal. Nothing above this point can guess a
//! medium, so the sequence halts instead of progressing.

use core::fmt;

use crate::image::{ParseFlags, IMAGE_HEADER_SIZE};
use crate::params::{BootDevice, BootMode};

/// A blob plus the placement hints the medium attaches to it.
pub struct Loaded<'a> {
    pub blob: &'a [u8],
    pub flags: ParseFlags,
}

/// Medium-specific payload reader. Implementations own the physical
/// transfer (sector reads, filesystem walk, network fetch, bulk protocol)
/// and surface the image bytes once resident.
pub trait ImageSource {
    fn load(&mut self, mode: BootMode) -> Result<Loaded<'_>, &'static str>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// Device byte the ROM reported maps to nothing we know.
    UnsupportedDevice(u8),
    /// Device recognized but this build wired no reader for it.
    SourceMissing(BootDevice),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDevice(raw) => write!(f, "unsupported boot device {raw:#04x}"),
            Self::SourceMissing(dev) => write!(f, "no reader wired for {dev:?}"),
        }
    }
}

/// The readers wired into this build, one optional slot per medium class.
/// A `None` slot means the board configuration left that medium out.
pub struct MediaSet<'a> {
    pub ram: Option<&'a mut dyn ImageSource>,
    pub mmc1: Option<&'a mut dyn ImageSource>,
    pub mmc2: Option<&'a mut dyn ImageSource>,
    pub nand: Option<&'a mut dyn ImageSource>,
    pub ethernet: Option<&'a mut dyn ImageSource>,
    pub usb: Option<&'a mut dyn ImageSource>,
}

impl<'a> MediaSet<'a> {
    /// Pick the strategy for `device`. The mapping is total over the
    /// recognized classes; only an unknown device or an unwired slot errors.
    pub fn select(&mut self, device: BootDevice) -> Result<&mut dyn ImageSource, DispatchError> {
        let slot = match device {
            BootDevice::Ram => &mut self.ram,
            BootDevice::Mmc1 => &mut self.mmc1,
            BootDevice::Mmc2 | BootDevice::Mmc2Alt => &mut self.mmc2,
            BootDevice::Nand => &mut self.nand,
            // payload mirrored on eMMC; eMMC reads faster than serial flash
            BootDevice::Qspi => &mut self.mmc2,
            BootDevice::Ethernet => &mut self.ethernet,
            BootDevice::Usb => &mut self.usb,
            BootDevice::Unknown(raw) => return Err(DispatchError::UnsupportedDevice(raw)),
        };
        match slot {
            Some(source) => Ok(&mut **source),
            None => Err(DispatchError::SourceMissing(device)),
        }
    }
}

/// Built-in strategy for in-memory boot: the image is already resident,
/// its header placed immediately below the monitor text base by whatever
/// staged it.
pub struct RamSource {
    /// Monitor text base the header sits below.
    pub base: usize,
    /// Bytes to expose starting at the header.
    pub span: usize,
}

impl ImageSource for RamSource {
    fn load(&mut self, _mode: BootMode) -> Result<Loaded<'_>, &'static str> {
        let start = self
            .base
            .checked_sub(IMAGE_HEADER_SIZE)
            .ok_or("ram image base below header size")?;
        // SAFETY: the staging agent guarantees `span` readable bytes at
        // `base - IMAGE_HEADER_SIZE`; this strategy only makes that
        // contract visible as a slice.
        let blob = unsafe { core::slice::from_raw_parts(start as *const u8, self.span) };
        Ok(Loaded {
            blob,
            flags: ParseFlags::empty(),
        })
    }
}
