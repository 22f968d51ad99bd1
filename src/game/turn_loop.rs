//! Controller-driven turn loop
//!
//! Runs full `draw -> (item) -> judge -> (item) -> finish` cycles against
//! a [`JudgeController`] until a turn limit is reached or nobody can be
//! drawn.

use crate::backend::PersistenceBackend;
use crate::game::controller::{ItemWindow, JudgeController, SessionView};
use crate::game::logger::{LogCategory, VerbosityLevel};
use crate::game::phase::TurnPhase;
use crate::game::ClassSession;
use crate::{GachaError, Result};
use serde::{Deserialize, Serialize};

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEndReason {
    /// The requested number of turns was played
    TurnLimit,
    /// Every student was immune or the roster emptied
    EmptyPool,
    /// Every student has been called on at least once
    FullCoverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub turns_played: u32,
    pub end_reason: SessionEndReason,
}

pub struct TurnLoop<'a, B: PersistenceBackend> {
    session: &'a mut ClassSession<B>,
    max_turns: u32,
    stop_at_full_coverage: bool,
    turns_elapsed: u32,
}

impl<'a, B: PersistenceBackend> TurnLoop<'a, B> {
    pub fn new(session: &'a mut ClassSession<B>) -> Self {
        TurnLoop {
            session,
            max_turns: 100,
            stop_at_full_coverage: false,
            turns_elapsed: 0,
        }
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Stop as soon as every student has been picked once
    pub fn stop_at_full_coverage(mut self, enabled: bool) -> Self {
        self.stop_at_full_coverage = enabled;
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.session.logger_mut().set_verbosity(verbosity);
        self
    }

    pub fn turns_elapsed(&self) -> u32 {
        self.turns_elapsed
    }

    pub fn session(&self) -> &ClassSession<B> {
        self.session
    }

    /// True once every student has been called on at least once
    pub fn is_fully_covered(&self) -> bool {
        let stats = self.session.roster().coverage();
        stats.total > 0 && stats.unpicked == 0
    }

    /// Run until a stop condition and notify the controller
    pub fn run(&mut self, controller: &mut dyn JudgeController) -> Result<SessionResult> {
        let result = self.run_turns(controller, self.max_turns)?;
        let view = SessionView::new(self.session);
        controller.on_session_end(&view);
        Ok(result)
    }

    /// Play up to `turns` turns
    pub fn run_turns(&mut self, controller: &mut dyn JudgeController, turns: u32) -> Result<SessionResult> {
        for _ in 0..turns {
            if self.stop_at_full_coverage && self.is_fully_covered() {
                return Ok(self.result(SessionEndReason::FullCoverage));
            }
            match self.run_turn_once(controller) {
                Ok(()) => self.turns_elapsed += 1,
                Err(GachaError::EmptyPool) => {
                    self.session.logger().event(
                        VerbosityLevel::Minimal,
                        LogCategory::Turn,
                        "Nobody left to draw; stopping",
                    );
                    return Ok(self.result(SessionEndReason::EmptyPool));
                }
                Err(e) => return Err(e),
            }
        }

        if self.stop_at_full_coverage && self.is_fully_covered() {
            return Ok(self.result(SessionEndReason::FullCoverage));
        }
        Ok(self.result(SessionEndReason::TurnLimit))
    }

    /// One full draw cycle
    pub fn run_turn_once(&mut self, controller: &mut dyn JudgeController) -> Result<()> {
        // A resumed snapshot may stop mid-turn: finish a judged turn, and
        // judge an already revealed draw instead of drawing again
        if self.session.phase() == TurnPhase::Judged {
            self.session.finish_turn();
        }
        if self.session.phase() != TurnPhase::Revealed && self.session.begin_draw()?.is_none() {
            return Err(GachaError::InvalidAction(format!(
                "draw rejected while {}",
                self.session.phase()
            )));
        }

        self.offer_item(controller, ItemWindow::BeforeJudgment)?;

        let judgment = {
            let view = SessionView::new(self.session);
            controller.judge(&view)
        };
        self.session.judge(judgment)?;

        self.offer_item(controller, ItemWindow::AfterJudgment)?;
        self.session.finish_turn();
        Ok(())
    }

    fn offer_item(&mut self, controller: &mut dyn JudgeController, window: ItemWindow) -> Result<()> {
        let choice = {
            let view = SessionView::new(self.session);
            controller.choose_item(&view, window)
        };
        let Some(item) = choice else {
            return Ok(());
        };

        let owned = self
            .session
            .turn()
            .current
            .is_some_and(|id| self.session.inventory(id).iter().any(|i| i.id == item));
        if !owned {
            self.session.logger().event(
                VerbosityLevel::Verbose,
                LogCategory::Controller,
                &format!("{} chose item {item} not held by the drawn student", controller.name()),
            );
            return Ok(());
        }

        self.session.use_item(item)?;
        Ok(())
    }

    fn result(&self, end_reason: SessionEndReason) -> SessionResult {
        SessionResult {
            turns_played: self.turns_elapsed,
            end_reason,
        }
    }
}
