//! image.rs — payload format detection and descriptor extraction.
//!
//! Whatever a medium hands back is an untyped blob; this module is the one
//! place that turns it into a placement decision. Headers are read as
//! layout-verified prefix views, never by pointer casts, and every branch
//! ends in a usable descriptor: an untagged blob is not a parse failure,
//! it is the documented bare-monitor assumption (raw flash dumps carry no
//! self-description).
//!
//! Recognized formats, tried in order:
//!   1. tagged monitor/kernel image: 64-byte big-endian header
//!   2. mobile boot container ("HBOOTIMG"): kernel at an offset inside the
//!      container, loaded so the whole prefix lands below the entry point
//!   3. anything else: fixed monitor defaults from [`BoardConfig`]

use bitflags::bitflags;
use core::mem;
use log::debug;
use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{FromBytes, LayoutVerified, Unaligned};

use crate::config::BoardConfig;

/// Tagged-image magic, "HIMG".
pub const IMAGE_MAGIC: u32 = 0x4849_4d47;
/// Mobile container magic.
pub const BOOTIMG_MAGIC: [u8; 8] = *b"HBOOTIMG";

pub const NAME_LEN: usize = 32;

/// Tagged image header. All multi-byte fields big-endian, by image-tool
/// convention.
#[derive(FromBytes, Unaligned)]
#[repr(C)]
pub struct ImageHeader {
    pub magic: U32<BigEndian>,
    pub hcrc: U32<BigEndian>,
    pub stamp: U32<BigEndian>,
    /// Payload size, header excluded.
    pub size: U32<BigEndian>,
    pub load: U32<BigEndian>,
    pub entry: U32<BigEndian>,
    pub dcrc: U32<BigEndian>,
    pub os: u8,
    pub arch: u8,
    pub kind: u8,
    pub comp: u8,
    pub name: [u8; NAME_LEN],
}

pub const IMAGE_HEADER_SIZE: usize = mem::size_of::<ImageHeader>();

/// OS byte values in [`ImageHeader::os`].
pub const OS_MONITOR: u8 = 0x01;
pub const OS_KERNEL: u8 = 0x02;

/// Mobile boot container header.
#[derive(FromBytes, Unaligned)]
#[repr(C)]
pub struct BootImgHeader {
    pub magic: [u8; 8],
    /// Offset from the container base to the first kernel byte.
    pub kernel_start: U32<BigEndian>,
    /// Address the kernel expects to run from.
    pub kernel_load: U32<BigEndian>,
    pub kernel_size: U32<BigEndian>,
}

bitflags! {
    /// Placement hints a medium attaches to its blob.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ParseFlags: u32 {
        /// Load the payload without the header in front of it. Used when
        /// the declared load address is too low to host the header.
        const COPY_PAYLOAD_ONLY = 1 << 0;
    }
}

/// What the payload is, as far as the handoff contract cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OsKind {
    /// Next-stage boot monitor; continues the ROM argument contract.
    Monitor,
    /// Operating-system payload.
    Os,
    Unknown,
}

/// Normalized placement and identity of a loadable payload. Built here,
/// consumed once by the gate and the jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub load_addr: usize,
    pub entry_point: usize,
    pub size: usize,
    pub os: OsKind,
    name: [u8; NAME_LEN],
}

impl ImageDescriptor {
    pub fn name(&self) -> &str {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_LEN);
        core::str::from_utf8(&self.name[..end]).unwrap_or("<non-utf8>")
    }
}

/// Identify `blob` and produce its descriptor. Total: unrecognized input
/// yields the fixed monitor fallback from `cfg`.
pub fn parse(blob: &[u8], flags: ParseFlags, cfg: &BoardConfig) -> ImageDescriptor {
    if let Some((hdr, _)) = LayoutVerified::<_, ImageHeader>::new_unaligned_from_prefix(blob) {
        if hdr.magic.get() == IMAGE_MAGIC {
            return parse_tagged(&hdr, flags);
        }
    }

    if hdr_is_bootimg(blob) {
        if let Some(desc) = parse_bootimg(blob) {
            return desc;
        }
    }

    debug!(target: "image", "no image signature, assuming bare monitor");
    ImageDescriptor {
        load_addr: cfg.monitor_base,
        entry_point: cfg.monitor_entry,
        size: cfg.monitor_ceiling,
        os: OsKind::Monitor,
        name: label(b"monitor"),
    }
}

fn parse_tagged(hdr: &ImageHeader, flags: ParseFlags) -> ImageDescriptor {
    let (load_addr, entry_point, size) = if flags.contains(ParseFlags::COPY_PAYLOAD_ONLY) {
        (
            hdr.load.get() as usize,
            hdr.entry.get() as usize,
            hdr.size.get() as usize,
        )
    } else {
        // The image is placed with its header immediately below the
        // declared load field, so execution starts exactly there.
        let entry = hdr.load.get() as usize;
        (
            entry.wrapping_sub(IMAGE_HEADER_SIZE),
            entry,
            hdr.size.get() as usize + IMAGE_HEADER_SIZE,
        )
    };

    let os = match hdr.os {
        OS_MONITOR => OsKind::Monitor,
        OS_KERNEL => OsKind::Os,
        _ => OsKind::Unknown,
    };

    let desc = ImageDescriptor {
        load_addr,
        entry_point,
        size,
        os,
        name: hdr.name,
    };
    debug!(
        target: "image",
        "payload '{}' load {:#010x} entry {:#010x} size {}",
        desc.name(), desc.load_addr, desc.entry_point, desc.size
    );
    desc
}

fn hdr_is_bootimg(blob: &[u8]) -> bool {
    blob.len() >= BOOTIMG_MAGIC.len() && blob[..BOOTIMG_MAGIC.len()] == BOOTIMG_MAGIC
}

/// `None` on a truncated container; the caller falls back to the monitor
/// defaults like any other unusable blob.
fn parse_bootimg(blob: &[u8]) -> Option<ImageDescriptor> {
    let (hdr, _) = LayoutVerified::<_, BootImgHeader>::new_unaligned_from_prefix(blob)?;

    // The whole container prefix rides along below the kernel, so the
    // in-memory span grows by the kernel's offset inside the container.
    let prefix = hdr.kernel_start.get() as usize;
    let entry_point = hdr.kernel_load.get() as usize;
    let desc = ImageDescriptor {
        load_addr: entry_point.wrapping_sub(prefix),
        entry_point,
        size: hdr.kernel_size.get() as usize + prefix,
        os: OsKind::Os,
        name: label(b"bootimg"),
    };
    debug!(
        target: "image",
        "mobile container: load {:#010x} entry {:#010x} size {}",
        desc.load_addr, desc.entry_point, desc.size
    );
    Some(desc)
}

fn label(s: &[u8]) -> [u8; NAME_LEN] {
    let mut name = [0u8; NAME_LEN];
    let n = s.len().min(NAME_LEN);
    name[..n].copy_from_slice(&s[..n]);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InitContext, LoaderFeatures};

    fn cfg() -> BoardConfig {
        BoardConfig {
            scratch_ptr_addr: 0,
            sram_start: 0,
            sram_end: 0xffff,
            monitor_base: 0x8080_0000,
            monitor_entry: 0x8080_0000,
            monitor_ceiling: 200 * 1024,
            features: LoaderFeatures::empty(),
            init_context: InitContext::FirstStage,
        }
    }

    fn tagged(os: u8, load: u32, entry: u32, size: u32, name: &[u8]) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
        b.extend_from_slice(&0u32.to_be_bytes()); // hcrc
        b.extend_from_slice(&0u32.to_be_bytes()); // stamp
        b.extend_from_slice(&size.to_be_bytes());
        b.extend_from_slice(&load.to_be_bytes());
        b.extend_from_slice(&entry.to_be_bytes());
        b.extend_from_slice(&0u32.to_be_bytes()); // dcrc
        b.extend_from_slice(&[os, 0, 0, 0]);
        b.extend_from_slice(&label(name));
        b.extend_from_slice(&[0xee; 96]); // payload bytes
        b
    }

    fn bootimg(kernel_start: u32, kernel_load: u32, kernel_size: u32) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&BOOTIMG_MAGIC);
        b.extend_from_slice(&kernel_start.to_be_bytes());
        b.extend_from_slice(&kernel_load.to_be_bytes());
        b.extend_from_slice(&kernel_size.to_be_bytes());
        b.extend_from_slice(&[0xaa; 64]);
        b
    }

    #[test]
    fn tagged_header_loads_with_header_in_front() {
        let blob = tagged(OS_MONITOR, 0x8010_0000, 0x8010_0000, 0x4000, b"monitor-2026.1");
        let d = parse(&blob, ParseFlags::empty(), &cfg());
        assert_eq!(d.entry_point, 0x8010_0000);
        assert_eq!(d.load_addr, 0x8010_0000 - IMAGE_HEADER_SIZE);
        assert_eq!(d.size, 0x4000 + IMAGE_HEADER_SIZE);
        assert_eq!(d.os, OsKind::Monitor);
        assert_eq!(d.name(), "monitor-2026.1");
        assert!(d.load_addr <= d.entry_point && d.entry_point < d.load_addr + d.size);
    }

    #[test]
    fn copy_payload_only_takes_header_fields_verbatim() {
        let blob = tagged(OS_MONITOR, 0x0000_0000, 0x0000_0100, 0x4000, b"lowmem");
        let d = parse(&blob, ParseFlags::COPY_PAYLOAD_ONLY, &cfg());
        assert_eq!(d.load_addr, 0x0000_0000);
        assert_eq!(d.entry_point, 0x0000_0100);
        assert_eq!(d.size, 0x4000);
    }

    #[test]
    fn tagged_kernel_maps_to_os_kind() {
        let blob = tagged(OS_KERNEL, 0x8200_0000, 0x8200_0000, 0x1000, b"krn");
        assert_eq!(parse(&blob, ParseFlags::empty(), &cfg()).os, OsKind::Os);
        let blob = tagged(0x7f, 0x8200_0000, 0x8200_0000, 0x1000, b"odd");
        assert_eq!(parse(&blob, ParseFlags::empty(), &cfg()).os, OsKind::Unknown);
    }

    #[test]
    fn bootimg_extends_span_by_container_prefix() {
        let prefix = 0x800u32;
        let blob = bootimg(prefix, 0x8200_8000, 0x0003_0000);
        let d = parse(&blob, ParseFlags::empty(), &cfg());
        assert_eq!(d.os, OsKind::Os);
        assert_eq!(d.entry_point, 0x8200_8000);
        assert_eq!(d.load_addr, 0x8200_8000 - prefix as usize);
        assert_eq!(d.size, 0x0003_0000 + prefix as usize);
        assert!(d.load_addr <= d.entry_point && d.entry_point < d.load_addr + d.size);
    }

    #[test]
    fn untagged_blob_gets_fixed_monitor_defaults() {
        let c = cfg();
        for blob in [&[0u8; 256][..], &[0x5a; 1024][..], &b"random bytes here"[..]] {
            let d = parse(blob, ParseFlags::empty(), &c);
            assert_eq!(d.load_addr, c.monitor_base);
            assert_eq!(d.entry_point, c.monitor_entry);
            assert_eq!(d.size, c.monitor_ceiling);
            assert_eq!(d.os, OsKind::Monitor);
            assert_eq!(d.name(), "monitor");
        }
    }

    #[test]
    fn short_blob_also_falls_back() {
        let d = parse(&[1, 2, 3], ParseFlags::empty(), &cfg());
        assert_eq!(d.os, OsKind::Monitor);
        assert_eq!(d.name(), "monitor");
    }

    #[test]
    fn truncated_container_falls_back() {
        let d = parse(&BOOTIMG_MAGIC, ParseFlags::empty(), &cfg());
        assert_eq!(d.os, OsKind::Monitor);
        assert_eq!(d.name(), "monitor");
    }
}
