//! cores.rs — auxiliary processor attach.
//!
//! Loading an auxiliary core is best-effort by policy: the primary payload
//! can boot, report the missing core, and retry it later. A failure is
//! recorded in place by OR-ing the error marker into that core's slot in
//! the id array the next stage consumes.

use log::{debug, warn};

/// OR-ed into an id slot when load or start failed, so one scalar carries
/// both the id and the verdict.
pub const CORE_LOAD_ERR: u32 = 0xFF00;

/// Auxiliary processors a Halcyon SoC may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuxCore {
    Dsp0 = 0,
    Dsp1 = 1,
    Vpu = 2,
    Mcu = 3,
}

impl AuxCore {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Dsp0),
            1 => Some(Self::Dsp1),
            2 => Some(Self::Vpu),
            3 => Some(Self::Mcu),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dsp0 => "dsp0",
            Self::Dsp1 => "dsp1",
            Self::Vpu => "vpu",
            Self::Mcu => "mcu",
        }
    }
}

/// Attach order used by the default sequence.
pub const AUX_BOOT_ORDER: [u32; 4] = [
    AuxCore::Vpu as u32,
    AuxCore::Dsp0 as u32,
    AuxCore::Dsp1 as u32,
    AuxCore::Mcu as u32,
];

/// Image load and release/start for one auxiliary core, against the same
/// medium the primary payload came from.
pub trait AuxCorePort {
    fn load(&mut self, core: AuxCore) -> Result<(), &'static str>;
    fn start(&mut self, core: AuxCore) -> Result<(), &'static str>;
}

/// Attach every core in `cores`, marking failures in place. A failed or
/// unknown entry never stops the remaining ones.
pub fn load_aux_cores(cores: &mut [u32], port: &mut dyn AuxCorePort) {
    for slot in cores.iter_mut() {
        let Some(core) = AuxCore::from_raw(*slot) else {
            warn!(target: "cores", "unknown auxiliary core id {:#x}, skipped", *slot);
            *slot |= CORE_LOAD_ERR;
            continue;
        };
        match port.load(core).and_then(|()| port.start(core)) {
            Ok(()) => debug!(target: "cores", "{} attached", core.name()),
            Err(e) => {
                *slot |= CORE_LOAD_ERR;
                warn!(
                    target: "cores",
                    "error loading {}: {}; continuing with boot", core.name(), e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Port scripted to fail chosen cores, recording every attempt.
    struct Scripted {
        fail_load: Option<AuxCore>,
        fail_start: Option<AuxCore>,
        attempts: Vec<AuxCore>,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                fail_load: None,
                fail_start: None,
                attempts: Vec::new(),
            }
        }
    }

    impl AuxCorePort for Scripted {
        fn load(&mut self, core: AuxCore) -> Result<(), &'static str> {
            self.attempts.push(core);
            if self.fail_load == Some(core) {
                return Err("image read failed");
            }
            Ok(())
        }

        fn start(&mut self, core: AuxCore) -> Result<(), &'static str> {
            if self.fail_start == Some(core) {
                return Err("release failed");
            }
            Ok(())
        }
    }

    #[test]
    fn one_failure_never_stops_the_rest() {
        let mut port = Scripted::new();
        port.fail_load = Some(AuxCore::Dsp1);
        let mut ids = [
            AuxCore::Dsp0 as u32,
            AuxCore::Dsp1 as u32,
            AuxCore::Vpu as u32,
        ];
        load_aux_cores(&mut ids, &mut port);
        assert_eq!(ids[0], AuxCore::Dsp0 as u32);
        assert_eq!(ids[1], AuxCore::Dsp1 as u32 | CORE_LOAD_ERR);
        assert_eq!(ids[2], AuxCore::Vpu as u32);
        assert_eq!(
            port.attempts,
            [AuxCore::Dsp0, AuxCore::Dsp1, AuxCore::Vpu],
            "the core after the failure is still attempted"
        );
    }

    #[test]
    fn start_failure_marks_like_load_failure() {
        let mut port = Scripted::new();
        port.fail_start = Some(AuxCore::Mcu);
        let mut ids = [AuxCore::Mcu as u32];
        load_aux_cores(&mut ids, &mut port);
        assert_eq!(ids[0], AuxCore::Mcu as u32 | CORE_LOAD_ERR);
    }

    #[test]
    fn unknown_id_is_marked_and_skipped() {
        let mut port = Scripted::new();
        let mut ids = [9, AuxCore::Vpu as u32];
        load_aux_cores(&mut ids, &mut port);
        assert_eq!(ids[0], 9 | CORE_LOAD_ERR);
        assert_eq!(ids[1], AuxCore::Vpu as u32);
        assert_eq!(port.attempts, [AuxCore::Vpu], "unknown id never reaches the port");
    }

    #[test]
    fn marker_keeps_the_id_recoverable() {
        let marked = AuxCore::Dsp1 as u32 | CORE_LOAD_ERR;
        assert_eq!(AuxCore::from_raw(marked & !CORE_LOAD_ERR), Some(AuxCore::Dsp1));
    }
}
