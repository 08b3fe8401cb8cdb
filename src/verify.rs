//! verify.rs — the authenticity gate in front of the jump.
//!
//! [`admit`] is the only constructor of [`VerifiedImage`], and the jump
//! only accepts a [`VerifiedImage`]; an image that failed verification
//! cannot reach the handoff by construction. The gate applies to monitor
//! payloads, the ones that continue the chain of trust. With the
//! `secure-boot` feature absent the gate compiles to a pass-through; that
//! posture is decided per build, never at runtime.
//!
//! The cryptographic primitive sits behind [`PayloadVerifier`]; the gate
//! cares about the verdict, not the algorithm.

#[cfg(feature = "secure-boot")]
use log::debug;

use crate::image::{ImageDescriptor, OsKind, IMAGE_HEADER_SIZE};

/// Verdict provider over a resident payload region. Implementations may
/// call into a ROM verification service, a crypto block, or software.
pub trait PayloadVerifier {
    fn verify(&self, addr: usize, len: usize) -> Result<(), &'static str>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyError(pub &'static str);

/// Descriptor that passed the gate. Private field: only [`admit`] builds
/// one.
pub struct VerifiedImage {
    desc: ImageDescriptor,
}

impl VerifiedImage {
    pub fn descriptor(&self) -> &ImageDescriptor {
        &self.desc
    }

    pub(crate) fn into_descriptor(self) -> ImageDescriptor {
        self.desc
    }
}

/// Gate `desc`. Monitor payloads must verify over their payload region
/// (header excluded); other kinds pass through untouched.
#[cfg(feature = "secure-boot")]
pub fn admit(
    desc: ImageDescriptor,
    verifier: &dyn PayloadVerifier,
) -> Result<VerifiedImage, VerifyError> {
    if desc.os == OsKind::Monitor {
        let (addr, len) = payload_region(&desc);
        verifier.verify(addr, len).map_err(VerifyError)?;
        debug!(target: "verify", "monitor authentication passed");
    }
    Ok(VerifiedImage { desc })
}

/// Gate disabled at build time: every descriptor passes.
#[cfg(not(feature = "secure-boot"))]
pub fn admit(
    desc: ImageDescriptor,
    _verifier: &dyn PayloadVerifier,
) -> Result<VerifiedImage, VerifyError> {
    Ok(VerifiedImage { desc })
}

/// Payload span of a monitor image: execution starts at the entry point
/// and the tagged header ahead of it is not part of the signed bytes.
#[cfg(feature = "secure-boot")]
fn payload_region(desc: &ImageDescriptor) -> (usize, usize) {
    (desc.entry_point, desc.size.saturating_sub(IMAGE_HEADER_SIZE))
}

/// Reference software verifier: compares a payload digest against a
/// board-provisioned expected digest.
#[cfg(feature = "verify-sha2")]
pub struct Sha256Verifier {
    pub expected: [u8; 32],
}

#[cfg(feature = "verify-sha2")]
impl PayloadVerifier for Sha256Verifier {
    fn verify(&self, addr: usize, len: usize) -> Result<(), &'static str> {
        use sha2::{Digest, Sha256};

        if len == 0 {
            return Err("empty payload region");
        }
        // SAFETY: the region was loaded by the selected medium reader and
        // is resident for the rest of the boot attempt.
        let payload = unsafe { core::slice::from_raw_parts(addr as *const u8, len) };
        let digest = Sha256::digest(payload);
        if digest[..] == self.expected {
            Ok(())
        } else {
            Err("payload digest mismatch")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{parse, ParseFlags, OS_MONITOR};
    use crate::config::{BoardConfig, InitContext, LoaderFeatures};

    struct Always(Result<(), &'static str>);

    impl PayloadVerifier for Always {
        fn verify(&self, _addr: usize, _len: usize) -> Result<(), &'static str> {
            self.0
        }
    }

    /// Recording verifier for region checks.
    struct Recording {
        seen: core::cell::Cell<Option<(usize, usize)>>,
    }

    impl PayloadVerifier for Recording {
        fn verify(&self, addr: usize, len: usize) -> Result<(), &'static str> {
            self.seen.set(Some((addr, len)));
            Ok(())
        }
    }

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

    fn monitor_desc() -> ImageDescriptor {
        parse(&[0u8; 16], ParseFlags::empty(), &cfg())
    }

    fn tagged_monitor_desc() -> ImageDescriptor {
        let mut blob = Vec::new();
        blob.extend_from_slice(&crate::image::IMAGE_MAGIC.to_be_bytes());
        blob.extend_from_slice(&[0u8; 8]);
        blob.extend_from_slice(&0x4000u32.to_be_bytes());
        blob.extend_from_slice(&0x8010_0000u32.to_be_bytes());
        blob.extend_from_slice(&0x8010_0000u32.to_be_bytes());
        blob.extend_from_slice(&[0u8; 4]);
        blob.extend_from_slice(&[OS_MONITOR, 0, 0, 0]);
        blob.extend_from_slice(&[0u8; 32]);
        parse(&blob, ParseFlags::empty(), &cfg())
    }

    #[cfg(feature = "secure-boot")]
    #[test]
    fn failed_verdict_blocks_admission() {
        let err = admit(monitor_desc(), &Always(Err("bad signature"))).err();
        assert_eq!(err, Some(VerifyError("bad signature")));
    }

    #[test]
    fn passing_verdict_admits() {
        let image = admit(monitor_desc(), &Always(Ok(()))).expect("admitted");
        assert_eq!(image.descriptor().os, OsKind::Monitor);
    }

    #[test]
    fn non_monitor_kinds_bypass_the_verifier() {
        let mut desc = monitor_desc();
        desc.os = OsKind::Os;
        assert!(admit(desc, &Always(Err("never consulted"))).is_ok());
        desc.os = OsKind::Unknown;
        assert!(admit(desc, &Always(Err("never consulted"))).is_ok());
    }

    #[cfg(feature = "secure-boot")]
    #[test]
    fn monitor_region_excludes_the_header() {
        let desc = tagged_monitor_desc();
        let rec = Recording {
            seen: core::cell::Cell::new(None),
        };
        admit(desc, &rec).expect("admitted");
        assert_eq!(
            rec.seen.get(),
            Some((desc.entry_point, desc.size - IMAGE_HEADER_SIZE))
        );
    }

    #[cfg(feature = "verify-sha2")]
    #[test]
    fn sha256_verifier_checks_the_exact_region() {
        use sha2::{Digest, Sha256};

        let payload = [0xabu8; 512];
        let expected: [u8; 32] = Sha256::digest(payload).into();
        let v = Sha256Verifier { expected };
        assert!(v.verify(payload.as_ptr() as usize, payload.len()).is_ok());
        assert!(v.verify(payload.as_ptr() as usize, payload.len() - 1).is_err());
        assert_eq!(v.verify(payload.as_ptr() as usize, 0), Err("empty payload region"));
    }
}
