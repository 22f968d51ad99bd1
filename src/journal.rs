//! Append-only journal of session actions
//!
//! Every roster mutation and turn event the session performs is recorded
//! here, with marks at turn boundaries so a turn's actions can be sliced
//! out for display or replay comparison.

use crate::core::{EffectKind, PoolType, StudentId, StudentItemId};
use crate::game::{DrawPool, Judgment, RosterChange};
use serde::{Deserialize, Serialize};

/// Atomic session actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionAction {
    /// A student was selected
    Drew {
        student: StudentId,
        pool: DrawPool,
        pool_size: usize,
    },

    /// The active draw was moved to another student
    Retargeted {
        from: Option<StudentId>,
        to: StudentId,
    },

    /// Exactly one per completed draw
    Judged {
        student: StudentId,
        judgment: Judgment,
        pick_count: u32,
    },

    /// Stars, curse or immunity changed
    Mutated(RosterChange),

    /// A card landed in an inventory
    ItemGranted {
        student: StudentId,
        item: StudentItemId,
        effect: EffectKind,
        pool: PoolType,
    },

    /// A card was played and removed
    ItemUsed {
        student: StudentId,
        item: Option<StudentItemId>,
        effect: EffectKind,
    },

    /// A revealed draw was dropped without judgment
    Abandoned { student: StudentId },

    StudentRemoved { student: StudentId },

    /// Immunity decayed at the end of a turn
    TurnAdvanced {
        turn_number: u32,
        decremented: Vec<StudentId>,
    },
}

impl SessionAction {
    /// Student this action is primarily about
    pub fn student(&self) -> Option<StudentId> {
        match self {
            SessionAction::Drew { student, .. }
            | SessionAction::Judged { student, .. }
            | SessionAction::ItemGranted { student, .. }
            | SessionAction::ItemUsed { student, .. }
            | SessionAction::Abandoned { student }
            | SessionAction::StudentRemoved { student } => Some(*student),
            SessionAction::Retargeted { to, .. } => Some(*to),
            SessionAction::Mutated(change) => Some(change.student),
            SessionAction::TurnAdvanced { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    /// Actions in order (most recent at end)
    actions: Vec<SessionAction>,

    /// Disabled journals drop everything (profiling and benchmarks)
    enabled: bool,

    /// Action index at which each turn began
    turn_marks: Vec<usize>,
}

impl Journal {
    pub fn new() -> Self {
        Journal {
            actions: Vec::new(),
            enabled: true,
            turn_marks: vec![0],
        }
    }

    pub fn disabled() -> Self {
        Journal {
            actions: Vec::new(),
            enabled: false,
            turn_marks: vec![0],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn log(&mut self, action: SessionAction) {
        if self.enabled {
            self.actions.push(action);
        }
    }

    /// Record that a new turn starts after the current last action
    pub fn mark_turn(&mut self) {
        if self.enabled {
            self.turn_marks.push(self.actions.len());
        }
    }

    pub fn peek(&self) -> Option<&SessionAction> {
        self.actions.last()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[SessionAction] {
        &self.actions
    }

    /// Actions of the turn currently in progress
    pub fn current_turn(&self) -> &[SessionAction] {
        let start = self.turn_marks.last().copied().unwrap_or(0);
        &self.actions[start.min(self.actions.len())..]
    }

    /// Actions of turn `index` (0-based); `None` if no such turn was marked
    pub fn turn(&self, index: usize) -> Option<&[SessionAction]> {
        let start = *self.turn_marks.get(index)?;
        let end = self
            .turn_marks
            .get(index + 1)
            .copied()
            .unwrap_or(self.actions.len());
        self.actions.get(start..end)
    }

    pub fn judged_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SessionAction::Judged { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.turn_marks.clear();
        self.turn_marks.push(0);
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}
