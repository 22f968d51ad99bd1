//! Classroom session state and turn structure

pub mod controller;
pub mod draw;
pub mod effects;
pub mod interactive_controller;
pub mod logger;
pub mod phase;
pub mod random_controller;
pub mod roster;
pub mod scripted_controller;
pub mod session;
pub mod snapshot;
pub mod turn_loop;

pub use controller::{ItemWindow, JudgeController, SessionView};
pub use draw::{draw_student, DrawPool, DrawResult};
pub use effects::{
    apply_resolution, resolve_effect, walk_chain, AppliedEffect, ChainNode, ChainPath, EffectContext,
    EffectOutcome, EffectResolution, StarDelta,
};
pub use interactive_controller::InteractiveJudge;
pub use logger::{LogCategory, LogEntry, OutputFormat, OutputMode, SessionLogger, VerbosityLevel};
pub use phase::{Judgment, TurnPhase, TurnState};
pub use random_controller::RandomJudge;
pub use roster::{CoverageStats, FlagChange, ImmunityChange, Roster, RosterChange};
pub use scripted_controller::ScriptedJudge;
pub use session::{ClassSession, JudgmentReport, PersistenceAlert};
pub use snapshot::SessionSnapshot;
pub use turn_loop::{SessionEndReason, SessionResult, TurnLoop};
