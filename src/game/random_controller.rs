//! Random judge for simulations and `play --auto`
//!
//! Holds its own seeded ChaCha RNG, separate from the session's, so a
//! judge can be serialized into a snapshot and resumed mid-session.

use crate::config::RandomJudgeConfig;
use crate::core::StudentItemId;
use crate::game::controller::{ItemWindow, JudgeController, SessionView};
use crate::game::phase::Judgment;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomJudge {
    config: RandomJudgeConfig,
    rng: ChaCha12Rng,
}

impl RandomJudge {
    pub fn new(config: RandomJudgeConfig, seed: u64) -> Self {
        RandomJudge {
            config,
            rng: ChaCha12Rng::seed_from_u64(seed),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(RandomJudgeConfig::default(), seed)
    }

    pub fn config(&self) -> &RandomJudgeConfig {
        &self.config
    }
}

impl JudgeController for RandomJudge {
    fn name(&self) -> &str {
        "random"
    }

    fn judge(&mut self, view: &SessionView) -> Judgment {
        let judgment = if self.rng.gen_bool(self.config.skip_rate) {
            Judgment::Skip
        } else if self.rng.gen_bool(self.config.correct_rate) {
            Judgment::Correct
        } else {
            Judgment::Incorrect
        };
        view.logger()
            .controller_choice(self.name(), &format!("judged {judgment}"));
        judgment
    }

    fn choose_item(&mut self, view: &SessionView, _window: ItemWindow) -> Option<StudentItemId> {
        let items = view.inventory();
        if items.is_empty() || !self.rng.gen_bool(self.config.item_use_rate) {
            return None;
        }
        let item = items.choose(&mut self.rng)?;
        view.logger()
            .controller_choice(self.name(), &format!("plays {}", item.item_card.name));
        Some(item.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::core::{Student, StudentId};
    use crate::game::{ClassSession, SessionLogger};

    fn session() -> ClassSession {
        let backend = MemoryBackend::with_students(1, vec![Student::new(StudentId::new(1), "Solo")]);
        ClassSession::new(backend, 1)
            .unwrap()
            .with_logger(SessionLogger::capturing())
    }

    #[test]
    fn test_seeded_determinism() {
        let session = session();
        let view = SessionView::new(&session);
        let mut a = RandomJudge::with_seed(42);
        let mut b = RandomJudge::with_seed(42);
        let first: Vec<Judgment> = (0..20).map(|_| a.judge(&view)).collect();
        let second: Vec<Judgment> = (0..20).map(|_| b.judge(&view)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_always_skip() {
        let session = session();
        let view = SessionView::new(&session);
        let config = RandomJudgeConfig {
            skip_rate: 1.0,
            ..RandomJudgeConfig::default()
        };
        let mut judge = RandomJudge::new(config, 3);
        assert!((0..50).all(|_| judge.judge(&view) == Judgment::Skip));
    }

    #[test]
    fn test_no_items_no_choice() {
        let session = session();
        let view = SessionView::new(&session);
        let config = RandomJudgeConfig {
            item_use_rate: 1.0,
            ..RandomJudgeConfig::default()
        };
        let mut judge = RandomJudge::new(config, 3);
        assert!(judge.choose_item(&view, ItemWindow::BeforeJudgment).is_none());
    }

    #[test]
    fn test_serde_preserves_stream() {
        let mut judge = RandomJudge::with_seed(9);
        let session = session();
        let view = SessionView::new(&session);
        judge.judge(&view);

        let json = serde_json::to_string(&judge).unwrap();
        let mut restored: RandomJudge = serde_json::from_str(&json).unwrap();
        for _ in 0..10 {
            assert_eq!(judge.judge(&view), restored.judge(&view));
        }
    }
}
