//! sequence.rs — the one-shot boot flow.
//!
//! Ordering is structural, not synchronized: capture, then board init,
//! then dispatch, then parse, then auxiliary attach, then the gate, then
//! the jump. Nothing here returns a recoverable error upward because
//! there is nothing above this; every failure resolves locally into a
//! halt, a degraded continue, or a documented fallback.

use core::fmt;

use log::info;

#[cfg(feature = "aux-attach")]
use crate::cores::{self, AuxCorePort};
use crate::board::BoardHooks;
use crate::config::BoardConfig;
use crate::dispatch::{DispatchError, MediaSet};
use crate::handoff::{self, CachePort};
use crate::image;
use crate::params::{self, BootParams, RomBus};
use crate::ui;
use crate::verify::{self, PayloadVerifier, VerifiedImage, VerifyError};

/// Terminal failures. None of these is recoverable; [`run`] resolves them
/// in [`halt`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FatalError {
    Dispatch(DispatchError),
    Load(&'static str),
    Verify(&'static str),
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatch(e) => write!(f, "{e}"),
            Self::Load(e) => write!(f, "payload load failed: {e}"),
            Self::Verify(e) => write!(f, "authenticity check failed: {e}"),
        }
    }
}

impl From<DispatchError> for FatalError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

/// Everything the board image wires in for one boot attempt.
pub struct Ports<'a> {
    pub media: MediaSet<'a>,
    pub hooks: &'a mut dyn BoardHooks,
    pub cache: &'a mut dyn CachePort,
    pub verifier: &'a dyn PayloadVerifier,
    #[cfg(feature = "aux-attach")]
    pub aux: Option<&'a mut dyn AuxCorePort>,
    /// Id array handed to the next stage, failure markers included.
    #[cfg(feature = "aux-attach")]
    pub aux_cores: &'a mut [u32],
}

/// Run everything up to, but not including, the jump. Separated from
/// [`run`] so the whole decision chain is observable without transferring
/// control anywhere.
pub fn prepare(
    cfg: &BoardConfig,
    params: &BootParams,
    ports: &mut Ports<'_>,
) -> Result<VerifiedImage, FatalError> {
    ports.hooks.watchdog_init();
    ports.hooks.board_init(params);

    let device = params.device();
    let mode = params.boot_mode(cfg.features);
    info!(target: "spl", "boot device {:?}, mode {:?}", device, mode);

    let desc = {
        let source = ports.media.select(device)?;
        let loaded = source.load(mode).map_err(FatalError::Load)?;
        image::parse(loaded.blob, loaded.flags, cfg)
    };
    info!(
        target: "spl",
        "payload '{}' at {:#010x} ({} bytes)",
        desc.name(), desc.load_addr, desc.size
    );

    // Auxiliary cores ride on the same store as the primary payload, so
    // they can only attach when that store is the boot medium.
    #[cfg(feature = "aux-attach")]
    if device.shares_aux_store() {
        if let Some(aux) = &mut ports.aux {
            cores::load_aux_cores(ports.aux_cores, &mut **aux);
        }
    }

    let image = verify::admit(desc, ports.verifier)
        .map_err(|VerifyError(e)| FatalError::Verify(e))?;
    Ok(image)
}

/// The full sequence: capture, prepare, jump. Terminal either way.
pub fn run(cfg: &BoardConfig, bus: &dyn RomBus, ports: &mut Ports<'_>) -> ! {
    let params = params::capture(bus, cfg);
    ui::banner();

    match prepare(cfg, &params, ports) {
        Ok(image) => {
            let args = handoff::stage(params);
            handoff::jump(image, args, &mut *ports.cache, &mut *ports.hooks)
        }
        Err(e) => halt(&e),
    }
}

/// Dead end for fatal failures: diagnostic, then park the core until an
/// external reset.
pub fn halt(reason: &dyn fmt::Display) -> ! {
    ui::fault(reason);
    loop {
        core::hint::spin_loop();
    }
}
