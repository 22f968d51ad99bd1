//! Scripted judge for deterministic tests
//!
//! Plays back a fixed list of judgments, one per turn, and optionally a
//! per-turn card to play before judging (matched by effect, so the script
//! does not depend on item ids).

use crate::core::{EffectKind, StudentItemId};
use crate::game::controller::{ItemWindow, JudgeController, SessionView};
use crate::game::phase::Judgment;
use std::collections::VecDeque;

pub struct ScriptedJudge {
    judgments: VecDeque<Judgment>,
    item_plan: VecDeque<Option<EffectKind>>,
    /// Verdict once the script runs out
    fallback: Judgment,
}

impl ScriptedJudge {
    pub fn new(judgments: Vec<Judgment>) -> Self {
        ScriptedJudge {
            judgments: judgments.into(),
            item_plan: VecDeque::new(),
            fallback: Judgment::Skip,
        }
    }

    /// For turn `i`, play the drawn student's first card with effect `plan[i]`
    pub fn with_item_plan(mut self, plan: Vec<Option<EffectKind>>) -> Self {
        self.item_plan = plan.into();
        self
    }

    pub fn with_fallback(mut self, fallback: Judgment) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.judgments.len()
    }
}

impl JudgeController for ScriptedJudge {
    fn name(&self) -> &str {
        "scripted"
    }

    fn judge(&mut self, view: &SessionView) -> Judgment {
        let judgment = self.judgments.pop_front().unwrap_or(self.fallback);
        view.logger()
            .controller_choice(self.name(), &format!("judged {judgment}"));
        judgment
    }

    fn choose_item(&mut self, view: &SessionView, window: ItemWindow) -> Option<StudentItemId> {
        if window != ItemWindow::BeforeJudgment {
            return None;
        }
        let wanted = self.item_plan.pop_front().flatten()?;
        view.inventory()
            .iter()
            .find(|item| item.effect() == wanted)
            .map(|item| item.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::core::{Student, StudentId};
    use crate::game::{ClassSession, SessionLogger};

    #[test]
    fn test_scripted_judgments_then_fallback() {
        let backend = MemoryBackend::with_students(1, vec![Student::new(StudentId::new(1), "Solo")]);
        let session = ClassSession::new(backend, 1)
            .unwrap()
            .with_logger(SessionLogger::capturing());
        let view = SessionView::new(&session);

        let mut judge = ScriptedJudge::new(vec![Judgment::Correct, Judgment::Incorrect])
            .with_fallback(Judgment::Correct);
        assert_eq!(judge.judge(&view), Judgment::Correct);
        assert_eq!(judge.judge(&view), Judgment::Incorrect);
        assert_eq!(judge.remaining(), 0);
        assert_eq!(judge.judge(&view), Judgment::Correct);
    }

    #[test]
    fn test_item_plan_needs_matching_card() {
        let backend = MemoryBackend::with_students(1, vec![Student::new(StudentId::new(1), "Solo")]);
        let session = ClassSession::new(backend, 1).unwrap();
        let view = SessionView::new(&session);

        let mut judge = ScriptedJudge::new(vec![]).with_item_plan(vec![Some(EffectKind::Shield)]);
        assert!(judge.choose_item(&view, ItemWindow::AfterJudgment).is_none());
        assert!(judge.choose_item(&view, ItemWindow::BeforeJudgment).is_none());
    }
}
