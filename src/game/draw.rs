//! Draw engine: two-tier weighted selection of the next student
//!
//! 1. Students with immunity are never candidates.
//! 2. If any candidate has never been picked, choose uniformly among those,
//!    so everyone is called on once before anyone repeats.
//! 3. Otherwise each candidate holds `floor(60 / (max(0, stars) + 1))`
//!    tickets and one ticket is drawn uniformly. A 0-star student holds 60
//!    tickets, a 5-star student 10: the leader is protected.

use crate::core::{Student, StudentId};
use crate::game::Roster;
use crate::{GachaError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tickets held by a zero-star student
pub const TICKET_NUMERATOR: i64 = 60;

/// Which tier produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawPool {
    /// Uniform choice among never-picked candidates
    Priority,
    /// Ticket draw weighted against stars
    Weighted,
}

/// A completed selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResult {
    pub student: StudentId,
    pub pool: DrawPool,
    /// Number of candidates in the tier that was used
    pub pool_size: usize,
}

/// Tickets a student with `stars` holds in the weighted tier
///
/// Negative totals count as zero.
pub fn ticket_weight(stars: i32) -> u32 {
    let stars = i64::from(stars.max(0));
    (TICKET_NUMERATOR / (stars + 1)) as u32
}

/// Students that may be drawn right now (not immune), in roster order
pub fn candidates(roster: &Roster) -> impl Iterator<Item = &Student> + '_ {
    roster.students().filter(|s| !s.is_immune())
}

/// The weighted tier as `(student, tickets)` pairs, zero-ticket entries dropped
pub fn weighted_pool(roster: &Roster) -> Vec<(StudentId, u32)> {
    candidates(roster)
        .map(|s| (s.id, ticket_weight(s.stars())))
        .filter(|(_, tickets)| *tickets > 0)
        .collect()
}

/// Select the next student to call on
///
/// Fails with [`GachaError::EmptyPool`] when the roster is empty, everyone
/// is immune, or the weighted tier holds no tickets.
pub fn draw_student<R: Rng + ?Sized>(roster: &Roster, rng: &mut R) -> Result<DrawResult> {
    let priority: Vec<StudentId> = candidates(roster)
        .filter(|s| s.never_picked())
        .map(|s| s.id)
        .collect();

    if !priority.is_empty() {
        let index = rng.gen_range(0..priority.len());
        return Ok(DrawResult {
            student: priority[index],
            pool: DrawPool::Priority,
            pool_size: priority.len(),
        });
    }

    let pool = weighted_pool(roster);
    let total: u64 = pool.iter().map(|(_, tickets)| u64::from(*tickets)).sum();
    if total == 0 {
        return Err(GachaError::EmptyPool);
    }

    // Walking cumulative ticket counts is the same distribution as indexing
    // a flat ticket array, without materializing it.
    let mut ticket = rng.gen_range(0..total);
    for (student, tickets) in &pool {
        let tickets = u64::from(*tickets);
        if ticket < tickets {
            return Ok(DrawResult {
                student: *student,
                pool: DrawPool::Weighted,
                pool_size: pool.len(),
            });
        }
        ticket -= tickets;
    }

    Err(GachaError::EmptyPool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{FlagChange, ImmunityChange};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn test_ticket_weights() {
        assert_eq!(ticket_weight(0), 60);
        assert_eq!(ticket_weight(1), 30);
        assert_eq!(ticket_weight(5), 10);
        assert_eq!(ticket_weight(59), 1);
        assert_eq!(ticket_weight(60), 0);
        assert_eq!(ticket_weight(-4), 60);
        assert_eq!(ticket_weight(i32::MAX), 0);
    }

    #[test]
    fn test_empty_roster_fails() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        assert!(matches!(
            draw_student(&Roster::new(), &mut rng),
            Err(GachaError::EmptyPool)
        ));
    }

    #[test]
    fn test_all_immune_fails() {
        let mut roster = Roster::from_students(vec![
            Student::new(StudentId::new(1), "A").with_immunity(2),
            Student::new(StudentId::new(2), "B").with_immunity(1),
        ]);
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        assert!(draw_student(&roster, &mut rng).is_err());

        roster.advance_turn();
        let result = draw_student(&roster, &mut rng).unwrap();
        assert_eq!(result.student, StudentId::new(2));
        assert_eq!(result.pool, DrawPool::Priority);
    }

    #[test]
    fn test_priority_pool_forces_unpicked_student() {
        let roster = Roster::from_students(vec![
            Student::new(StudentId::new(1), "A"),
            Student::new(StudentId::new(2), "B").with_stars(5).with_pick_count(3),
        ]);
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        for _ in 0..50 {
            let result = draw_student(&roster, &mut rng).unwrap();
            assert_eq!(result.student, StudentId::new(1));
            assert_eq!(result.pool_size, 1);
        }
    }

    #[test]
    fn test_weighted_pool_skips_immune() {
        let mut roster = Roster::from_students(vec![
            Student::new(StudentId::new(1), "A").with_pick_count(1),
            Student::new(StudentId::new(2), "B").with_pick_count(1).with_stars(9),
        ]);
        roster
            .apply_delta(StudentId::new(1), 0, FlagChange::immunity(ImmunityChange::Set(1)))
            .unwrap();

        assert_eq!(weighted_pool(&roster), vec![(StudentId::new(2), 6)]);

        let mut rng = ChaCha12Rng::seed_from_u64(3);
        for _ in 0..20 {
            let result = draw_student(&roster, &mut rng).unwrap();
            assert_eq!(result.student, StudentId::new(2));
            assert_eq!(result.pool, DrawPool::Weighted);
        }
    }

    #[test]
    fn test_zero_ticket_pool_is_empty() {
        let roster = Roster::from_students(vec![
            Student::new(StudentId::new(1), "A").with_pick_count(1).with_stars(100),
        ]);
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        assert!(matches!(
            draw_student(&roster, &mut rng),
            Err(GachaError::EmptyPool)
        ));
    }
}
