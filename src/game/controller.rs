//! Judge controller trait and session view
//!
//! The turn loop asks a controller for the verdict on each drawn student
//! and, around each judgment, whether that student wants to play a card.
//! Controllers only see a read-only [`SessionView`].

use crate::core::{Student, StudentId, StudentItem, StudentItemId};
use crate::game::{ClassSession, Roster, TurnState};
use crate::backend::PersistenceBackend;
use crate::game::phase::Judgment;
use crate::game::logger::SessionLogger;

/// When a controller is offered the chance to play a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemWindow {
    /// The student has been revealed but not judged (Mark Target moves the draw)
    BeforeJudgment,
    /// The judgment is in; the turn has not ended yet
    AfterJudgment,
}

/// Read-only view of a session for controllers
pub struct SessionView<'a> {
    roster: &'a Roster,
    turn: &'a TurnState,
    inventory: &'a [StudentItem],
    logger: &'a SessionLogger,
}

impl<'a> SessionView<'a> {
    pub fn new<B: PersistenceBackend>(session: &'a ClassSession<B>) -> Self {
        let inventory = session
            .turn()
            .current
            .map(|id| session.inventory(id))
            .unwrap_or(&[]);
        SessionView {
            roster: session.roster(),
            turn: session.turn(),
            inventory,
            logger: session.logger(),
        }
    }

    pub fn roster(&self) -> &Roster {
        self.roster
    }

    pub fn turn(&self) -> &TurnState {
        self.turn
    }

    pub fn current_id(&self) -> Option<StudentId> {
        self.turn.current
    }

    pub fn current(&self) -> Option<&Student> {
        self.turn.current.and_then(|id| self.roster.get(id).ok())
    }

    /// Cards held by the student on the spot
    pub fn inventory(&self) -> &[StudentItem] {
        self.inventory
    }

    pub fn logger(&self) -> &SessionLogger {
        self.logger
    }

    pub fn student_name(&self, id: StudentId) -> String {
        self.roster.name_of(id)
    }
}

/// Source of judgments and item choices
pub trait JudgeController {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Verdict on the student currently on the spot
    fn judge(&mut self, view: &SessionView) -> Judgment;

    /// Card the drawn student plays now, if any
    ///
    /// Only items from `view.inventory()` are honored.
    fn choose_item(&mut self, view: &SessionView, window: ItemWindow) -> Option<StudentItemId>;

    /// Called once the turn loop stops
    fn on_session_end(&mut self, _view: &SessionView) {}
}
