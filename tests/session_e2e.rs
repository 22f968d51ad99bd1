//! End-to-end session tests: turn flow, item flow and persistence failures

use classroom_gacha::backend::{MemoryBackend, PersistenceBackend};
use classroom_gacha::core::{
    EffectKind, ItemCard, ItemCardId, PoolType, Student, StudentId, StudentItem, StudentItemId,
};
use classroom_gacha::game::{
    ClassSession, Judgment, ScriptedJudge, SessionEndReason, SessionLogger, TurnLoop, TurnPhase,
};
use classroom_gacha::journal::SessionAction;
use classroom_gacha::loader::ClassData;
use classroom_gacha::{GachaError, Result};

/// Memory backend whose writes can be switched off
struct FlakyBackend {
    inner: MemoryBackend,
    fail_writes: bool,
}

impl PersistenceBackend for FlakyBackend {
    fn fetch_roster(&mut self) -> Result<Vec<Student>> {
        self.inner.fetch_roster()
    }

    fn persist_student(&mut self, student: &Student) -> Result<()> {
        if self.fail_writes {
            return Err(GachaError::Persistence("backend offline".to_string()));
        }
        self.inner.persist_student(student)
    }

    fn delete_student(&mut self, id: StudentId) -> Result<()> {
        self.inner.delete_student(id)
    }

    fn fetch_inventory(&mut self, student: StudentId) -> Result<Vec<StudentItem>> {
        self.inner.fetch_inventory(student)
    }

    fn draw_item_from_pool(&mut self, student: StudentId, pool: PoolType) -> Result<StudentItem> {
        if self.fail_writes {
            return Err(GachaError::Persistence("backend offline".to_string()));
        }
        self.inner.draw_item_from_pool(student, pool)
    }

    fn consume_item(&mut self, item: StudentItemId) -> Result<()> {
        self.inner.consume_item(item)
    }

    fn advance_turn(&mut self) -> Result<()> {
        if self.fail_writes {
            return Err(GachaError::Persistence("backend offline".to_string()));
        }
        self.inner.advance_turn()
    }
}

fn class(n: u32, stars: i32) -> Vec<Student> {
    (1..=n)
        .map(|i| Student::new(StudentId::new(i), format!("S{i}")).with_stars(stars))
        .collect()
}

fn card(effect: EffectKind) -> ItemCard {
    ItemCard::new(ItemCardId::new(1), effect, effect.english_name()).with_pool(effect.default_pool())
}

#[test]
fn test_persistence_failures_become_alerts() {
    let backend = FlakyBackend {
        inner: MemoryBackend::with_students(1, class(3, 0)),
        fail_writes: true,
    };
    let mut session = ClassSession::new(backend, 1)
        .unwrap()
        .with_logger(SessionLogger::capturing());

    let drawn = session.begin_draw().unwrap().unwrap().student;
    let report = session.judge(Judgment::Correct).unwrap().unwrap();
    assert!(report.granted.is_none());
    assert!(session.finish_turn());

    // Local state moved on; the backend did not
    assert_eq!(session.roster().get(drawn).unwrap().stars(), 1);
    assert_eq!(session.roster().get(drawn).unwrap().pick_count(), 1);
    assert_eq!(session.backend().inner.student(drawn).unwrap().stars(), 0);

    let alerts = session.drain_alerts();
    let operations: Vec<&str> = alerts.iter().map(|a| a.operation.as_str()).collect();
    assert_eq!(operations, ["persist_student", "draw_item_from_pool", "advance_turn"]);
    assert!(session.drain_alerts().is_empty());
    assert!(session.logger().logs().iter().any(|e| e.message.contains("backend offline")));
}

#[test]
fn test_backend_recovers_on_next_write() {
    let backend = FlakyBackend {
        inner: MemoryBackend::with_students(1, class(2, 0)),
        fail_writes: true,
    };
    let mut session = ClassSession::new(backend, 2).unwrap().with_logger(SessionLogger::capturing());
    let drawn = session.begin_draw().unwrap().unwrap().student;
    session.judge(Judgment::Correct).unwrap();
    session.finish_turn();

    session.backend_mut().fail_writes = false;
    session.adjust_stars(drawn, 2).unwrap();
    assert_eq!(session.backend().inner.student(drawn).unwrap().stars(), 3);
}

#[test]
fn test_one_judgment_per_draw() {
    let mut session = ClassSession::new(MemoryBackend::with_students(4, class(6, 0)), 4)
        .unwrap()
        .with_logger(SessionLogger::capturing());
    let mut judge = ScriptedJudge::new(vec![Judgment::Correct, Judgment::Incorrect, Judgment::Skip])
        .with_fallback(Judgment::Correct);

    let result = TurnLoop::new(&mut session).with_max_turns(12).run(&mut judge).unwrap();
    assert_eq!(result.end_reason, SessionEndReason::TurnLimit);
    assert_eq!(session.journal().judged_count(), 12);
    for turn in 0..12 {
        let actions = session.journal().turn(turn).unwrap();
        let judged = actions
            .iter()
            .filter(|a| matches!(a, SessionAction::Judged { .. }))
            .count();
        assert_eq!(judged, 1, "turn {turn}");
    }

    // Six students, twelve turns: everyone called on at least once
    let stats = session.roster().coverage();
    assert_eq!(stats.unpicked, 0);
    assert_eq!(stats.progress, 100);
    let picks: u32 = session.roster().students().map(|s| s.pick_count()).sum();
    assert_eq!(picks, 12);
}

#[test]
fn test_incorrect_answer_triggers_negative_card() {
    let mut backend = MemoryBackend::with_students(5, class(3, 2));
    backend.set_catalog(vec![card(EffectKind::Doomsday)]);
    let mut session = ClassSession::new(backend, 5).unwrap().with_logger(SessionLogger::capturing());

    let drawn = session.begin_draw().unwrap().unwrap().student;
    let report = session.judge(Judgment::Incorrect).unwrap().unwrap();
    let triggered = report.triggered.unwrap();
    assert_eq!(triggered.effect, EffectKind::Doomsday);

    for student in session.roster().students() {
        let expected = if student.id == drawn { 0 } else { 1 };
        assert_eq!(student.stars(), expected, "{}", student.name);
    }
    assert!(session.inventory(drawn).is_empty());
    assert_eq!(session.backend().items().count(), 0);
}

#[test]
fn test_mark_target_moves_the_judgment() {
    let students = class(2, 0);
    let items = students
        .iter()
        .enumerate()
        .map(|(i, s)| StudentItem {
            id: StudentItemId::new(i as u32 + 1),
            student_id: s.id,
            item_card: card(EffectKind::MarkTarget),
        })
        .collect();
    let data = ClassData {
        students,
        catalog: vec![card(EffectKind::Shield)],
        items,
    };
    let mut session = ClassSession::new(MemoryBackend::from_data(data, 6), 6)
        .unwrap()
        .with_logger(SessionLogger::capturing());

    let drawn = session.begin_draw().unwrap().unwrap().student;
    let other = session.roster().ids().iter().copied().find(|id| *id != drawn).unwrap();
    let mark = session.inventory(drawn)[0].id;

    let resolution = session.use_item(mark).unwrap().unwrap();
    assert_eq!(resolution.retarget, Some(other));
    assert_eq!(session.turn().current, Some(other));
    assert_eq!(session.phase(), TurnPhase::Revealed);

    let report = session.judge(Judgment::Correct).unwrap().unwrap();
    assert_eq!(report.student, other);
    assert_eq!(session.roster().get(other).unwrap().pick_count(), 1);
    assert_eq!(session.roster().get(drawn).unwrap().pick_count(), 0);
    assert_eq!(session.inventory(other).len(), 2);
}

#[test]
fn test_everyone_immune_is_an_empty_pool() {
    let students = class(2, 0).into_iter().map(|s| s.with_immunity(2));
    let mut session = ClassSession::new(MemoryBackend::with_students(7, students), 7)
        .unwrap()
        .with_logger(SessionLogger::capturing());

    assert!(matches!(session.begin_draw(), Err(GachaError::EmptyPool)));
    assert_eq!(session.phase(), TurnPhase::Idle);
    assert!(session.judge(Judgment::Correct).unwrap().is_none());
    assert!(session.journal().is_empty());
}

#[test]
fn test_stealth_cloak_keeps_student_out_of_draws() {
    let students = class(3, 0).into_iter().map(|s| s.with_pick_count(1));
    let mut backend = MemoryBackend::with_students(8, students);
    backend.set_catalog(vec![card(EffectKind::StealthCloak)]);
    let mut session = ClassSession::new(backend, 8).unwrap().with_logger(SessionLogger::capturing());

    let drawn = session.begin_draw().unwrap().unwrap().student;
    let report = session.judge(Judgment::Correct).unwrap().unwrap();
    let cloak = report.granted.unwrap().id;
    session.finish_turn();

    session.use_item(cloak).unwrap().unwrap();
    assert_eq!(session.roster().get(drawn).unwrap().immunity(), 3);

    for _ in 0..3 {
        let next = session.begin_draw().unwrap().unwrap().student;
        assert_ne!(next, drawn);
        session.judge(Judgment::Skip).unwrap();
        session.finish_turn();
    }
    assert_eq!(session.roster().get(drawn).unwrap().immunity(), 0);
}
