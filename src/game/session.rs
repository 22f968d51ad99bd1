//! Turn controller: one classroom session
//!
//! Sequences `draw -> judge -> items -> finish` cycles over the roster,
//! enforcing that exactly one judgment is recorded per draw and that only
//! one draw or effect is in flight at a time. Requests arriving in the
//! wrong phase are dropped (`Ok(None)` / `false`) and logged at verbose
//! level.
//!
//! The in-memory roster is the source of truth. Every mutation is reported
//! to the [`PersistenceBackend`]; failures there become
//! [`PersistenceAlert`]s and never roll back local state.

use crate::backend::{MemoryBackend, PersistenceBackend};
use crate::core::{Entity, PoolType, Student, StudentId, StudentItem, StudentItemId};
use crate::game::draw::{draw_student, DrawResult};
use crate::game::effects::{apply_resolution, resolve_effect, EffectContext, EffectOutcome, EffectResolution};
use crate::game::logger::{LogCategory, SessionLogger, VerbosityLevel};
use crate::game::phase::{Judgment, TurnPhase, TurnState};
use crate::game::{FlagChange, Roster, RosterChange};
use crate::journal::{Journal, SessionAction};
use crate::{GachaError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Normal-level event logging, compiled out without `verbose-logging`
macro_rules! log_if_verbose {
    ($self:expr, $category:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $self
                .logger
                .event(VerbosityLevel::Normal, $category, &format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$self;
        }
    };
}

/// A collaborator call that failed; shown to the user as a generic alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceAlert {
    pub turn: u32,
    pub operation: String,
    pub message: String,
}

/// What a judgment did
#[derive(Debug, Clone, PartialEq)]
pub struct JudgmentReport {
    pub student: StudentId,
    pub judgment: Judgment,
    /// The base star change
    pub change: RosterChange,
    pub pick_count: u32,
    /// Normal-pool card added to the inventory (correct answers)
    pub granted: Option<StudentItem>,
    /// Negative-pool card resolved on the spot (incorrect answers)
    pub triggered: Option<EffectResolution>,
}

pub struct ClassSession<B: PersistenceBackend = MemoryBackend> {
    pub(crate) roster: Roster,
    pub(crate) turn: TurnState,
    /// Local copy of each student's inventory
    pub(crate) inventories: FxHashMap<StudentId, Vec<StudentItem>>,
    backend: B,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) journal: Journal,
    pub(crate) logger: SessionLogger,
    alerts: Vec<PersistenceAlert>,
}

impl<B: PersistenceBackend> ClassSession<B> {
    /// Start a session from the backend's roster and inventories
    ///
    /// The initial roster fetch must succeed; inventory fetch failures are
    /// reported as alerts and leave that inventory empty.
    pub fn new(mut backend: B, seed: u64) -> Result<Self> {
        let roster = Roster::from_students(backend.fetch_roster()?);
        let mut session = Self::with_roster(backend, roster, seed);
        let ids: Vec<StudentId> = session.roster.ids().to_vec();
        for id in ids {
            session.refresh_inventory(id);
        }
        Ok(session)
    }

    /// Start a session over a roster the caller already holds
    pub fn with_roster(backend: B, roster: Roster, seed: u64) -> Self {
        ClassSession {
            roster,
            turn: TurnState::new(),
            inventories: FxHashMap::default(),
            backend,
            rng: ChaCha12Rng::seed_from_u64(seed),
            journal: Journal::new(),
            logger: SessionLogger::new(),
            alerts: Vec::new(),
        }
    }

    /// Reassemble a session from saved parts (see `snapshot`)
    pub(crate) fn from_parts(
        backend: B,
        roster: Roster,
        turn: TurnState,
        inventories: FxHashMap<StudentId, Vec<StudentItem>>,
        rng: ChaCha12Rng,
        journal: Journal,
    ) -> Self {
        ClassSession {
            roster,
            turn,
            inventories,
            backend,
            rng,
            journal,
            logger: SessionLogger::new(),
            alerts: Vec::new(),
        }
    }

    pub fn with_logger(mut self, logger: SessionLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn phase(&self) -> TurnPhase {
        self.turn.phase
    }

    /// The student currently on the spot
    pub fn current(&self) -> Option<&Student> {
        self.turn.current.and_then(|id| self.roster.get(id).ok())
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut SessionLogger {
        &mut self.logger
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn rng(&self) -> &ChaCha12Rng {
        &self.rng
    }

    /// Cached inventory of a student, empty if unknown
    pub fn inventory(&self, student: StudentId) -> &[StudentItem] {
        self.inventories
            .get(&student)
            .map(|items| items.as_slice())
            .unwrap_or(&[])
    }

    /// Alerts raised since the last call, oldest first
    pub fn drain_alerts(&mut self) -> Vec<PersistenceAlert> {
        std::mem::take(&mut self.alerts)
    }

    pub fn pending_alerts(&self) -> &[PersistenceAlert] {
        &self.alerts
    }

    /// Reload one student's inventory from the backend
    ///
    /// On failure the cached copy is kept and an alert is raised.
    pub fn refresh_inventory(&mut self, student: StudentId) -> &[StudentItem] {
        match self.backend.fetch_inventory(student) {
            Ok(items) => {
                self.inventories.insert(student, items);
            }
            Err(e) => self.report_failure("fetch_inventory", e),
        }
        self.inventory(student)
    }

    /// Add a student created outside the engine (import, manual add)
    pub fn insert_student(&mut self, student: Student) {
        self.logger.event(
            VerbosityLevel::Verbose,
            LogCategory::Turn,
            &format!("{} joined the roster", student.name()),
        );
        self.roster.insert(student);
    }

    /// Select the next student
    ///
    /// Returns `Ok(None)` if a draw is already in progress or the previous
    /// turn has not been finished. An empty pool leaves the session idle and
    /// returns [`GachaError::EmptyPool`].
    pub fn begin_draw(&mut self) -> Result<Option<DrawResult>> {
        if !self.turn.phase.accepts_draw() {
            self.drop_request("draw");
            return Ok(None);
        }

        self.turn.reset();
        self.turn.phase = TurnPhase::Drawing;

        let result = match draw_student(&self.roster, &mut self.rng) {
            Ok(result) => result,
            Err(e) => {
                self.turn.reset();
                self.logger.event(
                    VerbosityLevel::Normal,
                    LogCategory::Draw,
                    "No eligible students to draw",
                );
                return Err(e);
            }
        };

        self.turn.phase = TurnPhase::Revealed;
        self.turn.current = Some(result.student);
        self.turn.last_draw = Some(result);
        self.journal.log(SessionAction::Drew {
            student: result.student,
            pool: result.pool,
            pool_size: result.pool_size,
        });
        log_if_verbose!(
            self,
            LogCategory::Draw,
            "Turn {}: drew {} ({:?} pool of {})",
            self.turn.turn_number + 1,
            self.roster.name_of(result.student),
            result.pool,
            result.pool_size
        );

        Ok(Some(result))
    }

    /// Record the verdict on the revealed student
    ///
    /// Applies the base star change and pick count, then draws an item:
    /// a normal-pool card goes into the inventory, a negative-pool card is
    /// resolved immediately against the student and consumed.
    pub fn judge(&mut self, judgment: Judgment) -> Result<Option<JudgmentReport>> {
        let student = match (self.turn.phase, self.turn.current) {
            (TurnPhase::Revealed, Some(student)) => student,
            _ => {
                self.drop_request("judgment");
                return Ok(None);
            }
        };

        let change = self
            .roster
            .apply_delta(student, judgment.star_delta(), FlagChange::default())?;
        let pick_count = self.roster.record_pick(student)?;

        self.turn.judgment = Some(judgment);
        self.turn.phase = TurnPhase::Judged;
        self.journal.log(SessionAction::Judged {
            student,
            judgment,
            pick_count,
        });
        if !change.is_noop() {
            self.journal.log(SessionAction::Mutated(change));
        }
        self.persist(student);
        log_if_verbose!(
            self,
            LogCategory::Judgment,
            "{} judged {}: {} -> {} stars",
            self.roster.name_of(student),
            judgment,
            change.stars_before,
            change.stars_after
        );

        let mut report = JudgmentReport {
            student,
            judgment,
            change,
            pick_count,
            granted: None,
            triggered: None,
        };

        match judgment.item_pool() {
            Some(PoolType::Normal) => {
                report.granted = self.grant_item(student, PoolType::Normal);
            }
            Some(PoolType::Negative) => {
                if let Some(item) = self.grant_item(student, PoolType::Negative) {
                    report.triggered = Some(self.play(&item)?);
                }
            }
            None => {}
        }

        Ok(Some(report))
    }

    /// Play a card from an inventory, on behalf of its owner
    ///
    /// Allowed while idle, revealed or judged; dropped otherwise.
    pub fn use_item(&mut self, item: StudentItemId) -> Result<Option<EffectResolution>> {
        if !self.turn.phase.accepts_item() {
            self.drop_request("item use");
            return Ok(None);
        }
        let record = self
            .inventories
            .values()
            .flatten()
            .find(|record| record.id == item)
            .cloned()
            .ok_or(GachaError::EntityNotFound(item.as_u32()))?;
        if !self.roster.contains(record.student_id) {
            return Err(GachaError::EntityNotFound(record.student_id.as_u32()));
        }
        self.play(&record).map(Some)
    }

    /// End a judged turn: immunity wears off by one for everyone
    ///
    /// Returns `false` (dropped) unless the current draw has been judged.
    pub fn finish_turn(&mut self) -> bool {
        if self.turn.phase != TurnPhase::Judged {
            self.drop_request("turn advance");
            return false;
        }

        let decremented = self.roster.advance_turn();
        if let Err(e) = self.backend.advance_turn() {
            self.report_failure("advance_turn", e);
        }

        self.turn.turn_number += 1;
        log_if_verbose!(
            self,
            LogCategory::Turn,
            "Turn {} complete ({} protections wore down)",
            self.turn.turn_number,
            decremented.len()
        );
        self.journal.log(SessionAction::TurnAdvanced {
            turn_number: self.turn.turn_number,
            decremented,
        });
        self.journal.mark_turn();
        self.turn.reset();
        true
    }

    /// Put a revealed, unjudged draw back without touching anyone's record
    pub fn abandon_draw(&mut self) -> bool {
        let student = match (self.turn.phase, self.turn.current) {
            (TurnPhase::Revealed, Some(student)) => student,
            _ => {
                self.drop_request("abandon");
                return false;
            }
        };
        self.journal.log(SessionAction::Abandoned { student });
        self.logger.event(
            VerbosityLevel::Verbose,
            LogCategory::Draw,
            &format!("Draw of {} abandoned", self.roster.name_of(student)),
        );
        self.turn.reset();
        true
    }

    /// Manual star adjustment, subject to the same clamp as everything else
    pub fn adjust_stars(&mut self, student: StudentId, delta: i32) -> Result<RosterChange> {
        let change = self.roster.apply_delta(student, delta, FlagChange::default())?;
        if !change.is_noop() {
            self.journal.log(SessionAction::Mutated(change));
        }
        self.persist(student);
        log_if_verbose!(
            self,
            LogCategory::Judgment,
            "{} adjusted by {:+}: {} -> {} stars",
            self.roster.name_of(student),
            delta,
            change.stars_before,
            change.stars_after
        );
        Ok(change)
    }

    /// Delete a student; clears the active draw if it was them
    pub fn remove_student(&mut self, student: StudentId) -> Result<Student> {
        let removed = self
            .roster
            .remove(student)
            .ok_or(GachaError::EntityNotFound(student.as_u32()))?;
        self.inventories.remove(&student);
        if let Err(e) = self.backend.delete_student(student) {
            self.report_failure("delete_student", e);
        }
        if self.turn.current == Some(student) {
            self.turn.reset();
        }
        self.journal.log(SessionAction::StudentRemoved { student });
        self.logger.event(
            VerbosityLevel::Normal,
            LogCategory::Turn,
            &format!("{} removed from the roster", removed.name()),
        );
        Ok(removed)
    }

    /// Ask the backend for a card; failures are logged, never fatal
    fn grant_item(&mut self, student: StudentId, pool: PoolType) -> Option<StudentItem> {
        match self.backend.draw_item_from_pool(student, pool) {
            Ok(item) => {
                self.inventories.entry(student).or_default().push(item.clone());
                self.journal.log(SessionAction::ItemGranted {
                    student,
                    item: item.id,
                    effect: item.effect(),
                    pool,
                });
                log_if_verbose!(
                    self,
                    LogCategory::Item,
                    "{} received {} ({})",
                    self.roster.name_of(student),
                    item.item_card.name,
                    item.effect()
                );
                Some(item)
            }
            Err(GachaError::NoItemsAvailable) => {
                self.logger.event(
                    VerbosityLevel::Verbose,
                    LogCategory::Item,
                    &format!("No {pool} cards available"),
                );
                None
            }
            Err(e) => {
                self.report_failure("draw_item_from_pool", e);
                None
            }
        }
    }

    /// Resolve, apply and consume one inventory card
    fn play(&mut self, item: &StudentItem) -> Result<EffectResolution> {
        let resume_phase = self.turn.phase;
        self.turn.phase = TurnPhase::Resolving;

        let context = EffectContext::new(item.student_id).with_active_draw(self.turn.current);
        let resolution = match resolve_effect(item.effect(), context, &self.roster, &mut self.rng) {
            Ok(resolution) => resolution,
            Err(e) => {
                self.turn.phase = resume_phase;
                return Err(e);
            }
        };

        let applied = apply_resolution(&mut self.roster, &resolution);
        for change in &applied.changes {
            if !change.is_noop() {
                self.journal.log(SessionAction::Mutated(*change));
            }
        }
        for change in &applied.changes {
            self.persist(change.student);
        }

        if let Some(to) = resolution.retarget {
            self.turn.pending_target = Some(to);
            if resume_phase == TurnPhase::Revealed {
                let from = self.turn.current;
                self.turn.current = Some(to);
                self.journal.log(SessionAction::Retargeted { from, to });
            }
        }
        if let EffectOutcome::ChainLightning(path) = &resolution.outcome {
            self.turn.last_chain = Some(path.clone());
        }

        if resolution.consumed {
            self.consume(item);
        }
        self.journal.log(SessionAction::ItemUsed {
            student: item.student_id,
            item: Some(item.id),
            effect: item.effect(),
        });
        log_if_verbose!(self, LogCategory::Effect, "{}", resolution.summary(&self.roster));

        self.turn.phase = resume_phase;
        Ok(resolution)
    }

    fn consume(&mut self, item: &StudentItem) {
        if let Some(items) = self.inventories.get_mut(&item.student_id) {
            items.retain(|owned| owned.id != item.id);
        }
        if let Err(e) = self.backend.consume_item(item.id) {
            self.report_failure("consume_item", e);
        }
    }

    fn persist(&mut self, student: StudentId) {
        let result = match self.roster.get(student) {
            Ok(record) => self.backend.persist_student(record),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            self.report_failure("persist_student", e);
        }
    }

    fn report_failure(&mut self, operation: &str, error: GachaError) {
        self.logger.event(
            VerbosityLevel::Minimal,
            LogCategory::Persistence,
            &format!("{operation} failed: {error}"),
        );
        self.alerts.push(PersistenceAlert {
            turn: self.turn.turn_number,
            operation: operation.to_string(),
            message: error.to_string(),
        });
    }

    fn drop_request(&self, what: &str) {
        self.logger.event(
            VerbosityLevel::Verbose,
            LogCategory::Turn,
            &format!("{what} request dropped while {}", self.turn.phase),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EffectKind, ItemCard, ItemCardId};
    use crate::game::DrawPool;

    fn session() -> ClassSession {
        let backend = MemoryBackend::with_students(
            3,
            vec![
                Student::new(StudentId::new(1), "Alice").with_dorm("301"),
                Student::new(StudentId::new(2), "Bob").with_dorm("301"),
                Student::new(StudentId::new(3), "Carol").with_dorm("302"),
            ],
        );
        ClassSession::new(backend, 42)
            .unwrap()
            .with_logger(SessionLogger::capturing())
    }

    fn only_card(session: &mut ClassSession, effect: EffectKind) {
        session
            .backend_mut()
            .set_catalog(vec![ItemCard::new(ItemCardId::new(1), effect, effect.english_name())]);
    }

    #[test]
    fn test_full_cycle() {
        let mut session = session();
        let draw = session.begin_draw().unwrap().unwrap();
        assert_eq!(draw.pool, DrawPool::Priority);
        assert_eq!(session.phase(), TurnPhase::Revealed);

        let report = session.judge(Judgment::Correct).unwrap().unwrap();
        assert_eq!(report.change.stars_after, 1);
        assert_eq!(report.pick_count, 1);
        assert!(report.granted.is_some());
        assert_eq!(session.inventory(draw.student).len(), 1);

        assert!(session.finish_turn());
        assert_eq!(session.phase(), TurnPhase::Idle);
        assert_eq!(session.turn().turn_number, 1);
        assert_eq!(session.journal().judged_count(), 1);
    }

    #[test]
    fn test_second_draw_dropped_until_turn_finishes() {
        let mut session = session();
        session.begin_draw().unwrap().unwrap();
        assert!(session.begin_draw().unwrap().is_none());

        session.judge(Judgment::Skip).unwrap().unwrap();
        assert!(session.judge(Judgment::Correct).unwrap().is_none());
        assert!(session.begin_draw().unwrap().is_none());

        session.finish_turn();
        assert!(session.begin_draw().unwrap().is_some());
        assert_eq!(session.journal().judged_count(), 1);
    }

    #[test]
    fn test_judge_without_draw_is_dropped() {
        let mut session = session();
        assert!(session.judge(Judgment::Correct).unwrap().is_none());
        assert!(!session.finish_turn());
        assert!(session.journal().is_empty());
    }

    #[test]
    fn test_incorrect_resolves_negative_card() {
        let mut session = session();
        only_card(&mut session, EffectKind::OneManGuard);
        let draw = session.begin_draw().unwrap().unwrap();
        session.adjust_stars(draw.student, 3).unwrap();

        let report = session.judge(Judgment::Incorrect).unwrap().unwrap();
        assert_eq!(report.change.stars_after, 2);
        let triggered = report.triggered.unwrap();
        assert_eq!(triggered.effect, EffectKind::OneManGuard);
        assert_eq!(session.roster().get(draw.student).unwrap().stars(), 1);
        assert!(session.inventory(draw.student).is_empty());
        assert_eq!(session.backend().items().count(), 0);
    }

    #[test]
    fn test_abandon_keeps_records() {
        let mut session = session();
        let draw = session.begin_draw().unwrap().unwrap();
        assert!(session.abandon_draw());
        assert_eq!(session.roster().get(draw.student).unwrap().pick_count(), 0);
        assert!(session.turn().current.is_none());
        assert!(!session.abandon_draw());
    }

    #[test]
    fn test_remove_drawn_student_clears_draw() {
        let mut session = session();
        let draw = session.begin_draw().unwrap().unwrap();
        session.remove_student(draw.student).unwrap();
        assert!(session.turn().is_idle());
        assert_eq!(session.roster().len(), 2);
        assert_eq!(session.backend().students().count(), 2);
        assert!(session.remove_student(draw.student).is_err());
    }

    #[test]
    fn test_use_unknown_item() {
        let mut session = session();
        assert!(matches!(
            session.use_item(StudentItemId::new(77)),
            Err(GachaError::EntityNotFound(77))
        ));
    }

    #[test]
    fn test_stealth_cloak_used_while_idle_covers_three_draws() {
        let mut session = session();
        only_card(&mut session, EffectKind::StealthCloak);
        let alice = StudentId::new(1);
        let item = session
            .backend_mut()
            .draw_item_from_pool(alice, PoolType::Normal)
            .unwrap();
        session.refresh_inventory(alice);

        session.use_item(item.id).unwrap().unwrap();
        assert_eq!(session.roster().get(alice).unwrap().immunity(), 3);

        for remaining in [2, 1, 0] {
            let draw = session.begin_draw().unwrap().unwrap();
            assert_ne!(draw.student, alice);
            session.judge(Judgment::Skip).unwrap();
            session.finish_turn();
            assert_eq!(session.roster().get(alice).unwrap().immunity(), remaining);
        }
    }

    #[test]
    fn test_drops_are_logged_at_verbose() {
        let mut session = session();
        session.judge(Judgment::Skip).unwrap();
        let logs = session.logger().logs();
        let dropped: Vec<_> = logs.in_category(LogCategory::Turn).collect();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].level, VerbosityLevel::Verbose);
    }
}
