//! # Lifecycle phases.
//!
//! The boot sequence is fixed and strictly ordered:
//! ```text
//! Init → Register → Config → Prepare → Run → Exit → Terminated
//! ```
//! - `Init`: register flags and defaults, no logic.
//! - `Register`: register services that do not need configuration.
//! - `Config`: read configuration.
//! - `Prepare`: define the main services from configuration.
//! - `Run`: supervised long-lived workers.
//! - `Exit`: teardown callbacks, always executed.
//! - `Terminated`: terminal state.

use std::fmt;

/// A stage of the boot sequence.
///
/// Ordering follows the execution order, so `Phase::Init < Phase::Run`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Init = 0,
    Register = 1,
    Config = 2,
    Prepare = 3,
    Run = 4,
    Exit = 5,
    Terminated = 6,
}

impl Phase {
    /// Setup phases, in execution order. Their callbacks run before `Run`.
    pub const SETUP: [Phase; 4] = [Phase::Init, Phase::Register, Phase::Config, Phase::Prepare];

    /// Returns the phase name as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Register => "register",
            Phase::Config => "config",
            Phase::Prepare => "prepare",
            Phase::Run => "run",
            Phase::Exit => "exit",
            Phase::Terminated => "terminated",
        }
    }

    /// Returns the phase following this one, `None` after `Terminated`.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Init => Some(Phase::Register),
            Phase::Register => Some(Phase::Config),
            Phase::Config => Some(Phase::Prepare),
            Phase::Prepare => Some(Phase::Run),
            Phase::Run => Some(Phase::Exit),
            Phase::Exit => Some(Phase::Terminated),
            Phase::Terminated => None,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Phase {
        match raw {
            0 => Phase::Init,
            1 => Phase::Register,
            2 => Phase::Config,
            3 => Phase::Prepare,
            4 => Phase::Run,
            5 => Phase::Exit,
            _ => Phase::Terminated,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
