//! Turn phases, judgments and the per-draw turn state

use crate::core::{PoolType, StudentId};
use crate::game::draw::DrawResult;
use crate::game::effects::ChainPath;
use crate::{GachaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a draw cycle currently is
///
/// `Idle -> Drawing -> Revealed -> Judged -> (Resolving -> Judged)* -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TurnPhase {
    #[default]
    Idle,
    /// Selection in flight; further draw requests are dropped
    Drawing,
    /// A student has been chosen and awaits judgment
    Revealed,
    /// Judgment recorded; items may still be played before the turn ends
    Judged,
    /// An item effect is being resolved
    Resolving,
}

impl TurnPhase {
    /// Whether a draw request is accepted in this phase
    pub fn accepts_draw(&self) -> bool {
        matches!(self, TurnPhase::Idle)
    }

    /// Whether an inventory card may be played in this phase
    pub fn accepts_item(&self) -> bool {
        matches!(self, TurnPhase::Idle | TurnPhase::Revealed | TurnPhase::Judged)
    }

    pub fn next(&self) -> Option<TurnPhase> {
        match self {
            TurnPhase::Idle => Some(TurnPhase::Drawing),
            TurnPhase::Drawing => Some(TurnPhase::Revealed),
            TurnPhase::Revealed => Some(TurnPhase::Judged),
            TurnPhase::Judged => Some(TurnPhase::Idle),
            TurnPhase::Resolving => None,
        }
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::Idle => "idle",
            TurnPhase::Drawing => "drawing",
            TurnPhase::Revealed => "revealed",
            TurnPhase::Judged => "judged",
            TurnPhase::Resolving => "resolving",
        };
        write!(f, "{name}")
    }
}

/// External verdict on a drawn student's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Correct,
    Incorrect,
    Skip,
}

impl Judgment {
    pub fn star_delta(&self) -> i32 {
        match self {
            Judgment::Correct => 1,
            Judgment::Incorrect => -1,
            Judgment::Skip => 0,
        }
    }

    /// Pool an item is drawn from after this judgment, if any
    pub fn item_pool(&self) -> Option<PoolType> {
        match self {
            Judgment::Correct => Some(PoolType::Normal),
            Judgment::Incorrect => Some(PoolType::Negative),
            Judgment::Skip => None,
        }
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Judgment::Correct => write!(f, "correct"),
            Judgment::Incorrect => write!(f, "incorrect"),
            Judgment::Skip => write!(f, "skip"),
        }
    }
}

impl FromStr for Judgment {
    type Err = GachaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "correct" | "c" | "y" | "yes" => Ok(Judgment::Correct),
            "incorrect" | "wrong" | "i" | "n" | "no" => Ok(Judgment::Incorrect),
            "skip" | "s" => Ok(Judgment::Skip),
            other => Err(GachaError::ParseError(format!(
                "unknown judgment '{other}' (expected correct, incorrect or skip)"
            ))),
        }
    }
}

/// Process-wide turn state; reset at the start of every draw
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    pub phase: TurnPhase,
    /// Completed turns so far
    pub turn_number: u32,
    /// The student currently on the spot
    pub current: Option<StudentId>,
    pub judgment: Option<Judgment>,
    /// How the current student was selected
    pub last_draw: Option<DrawResult>,
    /// Target set by Mark Target while the draw is revealed
    pub pending_target: Option<StudentId>,
    /// Most recent Chain Lightning walk, for display
    pub last_chain: Option<ChainPath>,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-draw context, keeping the turn counter
    pub fn reset(&mut self) {
        self.phase = TurnPhase::Idle;
        self.current = None;
        self.judgment = None;
        self.last_draw = None;
        self.pending_target = None;
        self.last_chain = None;
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TurnPhase::Idle
    }

    /// A draw exists that has been revealed but not judged
    pub fn awaiting_judgment(&self) -> bool {
        self.phase == TurnPhase::Revealed && self.current.is_some()
    }
}
