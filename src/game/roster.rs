//! Roster store: the authoritative in-memory copy of every student
//!
//! All star, pick-count, immunity and curse mutations go through
//! [`Roster::apply_delta`] / [`Roster::record_pick`] /
//! [`Roster::advance_turn`], so the clamp-unless-cursed rule is enforced in
//! exactly one place.

use crate::core::{Entity, EntityStore, Student, StudentId, STAR_FLOOR};
use crate::Result;
use serde::{Deserialize, Serialize};

/// How an effect changes a student's immunity counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImmunityChange {
    /// Overwrite the counter
    Set(u32),
    /// Raise the counter to at least this value, never lowering it
    AtLeast(u32),
}

impl ImmunityChange {
    fn apply(self, current: u32) -> u32 {
        match self {
            ImmunityChange::Set(n) => n,
            ImmunityChange::AtLeast(n) => current.max(n),
        }
    }
}

/// Flag part of a mutation; `None` fields are left alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagChange {
    pub is_cursed: Option<bool>,
    pub immunity: Option<ImmunityChange>,
}

impl FlagChange {
    pub fn curse(cursed: bool) -> Self {
        FlagChange {
            is_cursed: Some(cursed),
            immunity: None,
        }
    }

    pub fn immunity(change: ImmunityChange) -> Self {
        FlagChange {
            is_cursed: None,
            immunity: Some(change),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_cursed.is_none() && self.immunity.is_none()
    }
}

/// Before/after record of one student mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterChange {
    pub student: StudentId,
    pub stars_before: i32,
    pub stars_after: i32,
    pub cursed_before: bool,
    pub cursed_after: bool,
    pub immunity_before: u32,
    pub immunity_after: u32,
}

impl RosterChange {
    pub fn star_delta(&self) -> i32 {
        self.stars_after - self.stars_before
    }

    pub fn is_noop(&self) -> bool {
        self.stars_before == self.stars_after
            && self.cursed_before == self.cursed_after
            && self.immunity_before == self.immunity_after
    }
}

/// Coverage of the roster so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageStats {
    pub total: usize,
    pub picked: usize,
    pub unpicked: usize,
    /// Share of students picked at least once, rounded to a whole percent
    pub progress: u32,
}

/// Ordered collection of students with the mutation API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Student>", into = "Vec<Student>")]
pub struct Roster {
    students: EntityStore<Student>,
}

impl Roster {
    pub fn new() -> Self {
        Roster {
            students: EntityStore::new(),
        }
    }

    /// Build a roster from externally created records, normalizing each
    pub fn from_students(students: impl IntoIterator<Item = Student>) -> Self {
        Roster {
            students: students.into_iter().map(Student::normalized).collect(),
        }
    }

    /// Add (or replace) a student created by an external collaborator
    pub fn insert(&mut self, student: Student) {
        self.students.insert(student.normalized());
    }

    /// Drop a student deleted by an external collaborator
    pub fn remove(&mut self, id: StudentId) -> Option<Student> {
        self.students.remove(id)
    }

    pub fn get(&self, id: StudentId) -> Result<&Student> {
        self.students.get(id)
    }

    pub fn contains(&self, id: StudentId) -> bool {
        self.students.contains(id)
    }

    /// Students in roster order
    pub fn students(&self) -> impl Iterator<Item = &Student> + '_ {
        self.students.iter()
    }

    pub fn ids(&self) -> &[StudentId] {
        self.students.ids()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Apply one star delta plus flag changes to a student
    ///
    /// Flags are applied first, so a curse lifted in the same call clamps the
    /// result. The clamp runs even for a zero delta: an uncursed student
    /// always ends with `stars >= 0`.
    pub fn apply_delta(&mut self, id: StudentId, star_delta: i32, flags: FlagChange) -> Result<RosterChange> {
        let student = self.students.get_mut(id)?;
        let stars_before = student.stars;
        let cursed_before = student.is_cursed;
        let immunity_before = student.immunity;

        if let Some(cursed) = flags.is_cursed {
            student.is_cursed = cursed;
        }
        if let Some(change) = flags.immunity {
            student.immunity = change.apply(student.immunity);
        }

        let stars = student.stars.saturating_add(star_delta);
        student.stars = stars.max(if student.is_cursed { STAR_FLOOR } else { 0 });

        Ok(RosterChange {
            student: id,
            stars_before,
            stars_after: student.stars,
            cursed_before,
            cursed_after: student.is_cursed,
            immunity_before,
            immunity_after: student.immunity,
        })
    }

    /// Count one completed judged draw; returns the new pick count
    pub fn record_pick(&mut self, id: StudentId) -> Result<u32> {
        let student = self.students.get_mut(id)?;
        student.pick_count = student.pick_count.saturating_add(1);
        Ok(student.pick_count)
    }

    /// Wear protection off by one round for everyone (floor 0)
    ///
    /// Returns the ids whose counter actually moved.
    pub fn advance_turn(&mut self) -> Vec<StudentId> {
        let ids: Vec<StudentId> = self.students.ids().to_vec();
        let mut decremented = Vec::new();
        for id in ids {
            if let Ok(student) = self.students.get_mut(id) {
                if student.immunity > 0 {
                    student.immunity -= 1;
                    decremented.push(id);
                }
            }
        }
        decremented
    }

    /// The student plus everyone sharing their dorm number, in roster order
    pub fn dormmates(&self, id: StudentId) -> Result<Vec<StudentId>> {
        let user = self.students.get(id)?;
        Ok(self
            .students
            .iter()
            .filter(|s| s.id == id || s.shares_dorm_with(user))
            .map(|s| s.id)
            .collect())
    }

    /// Everyone except the given ids, in roster order
    pub fn others(&self, excluded: &[StudentId]) -> Vec<StudentId> {
        self.students
            .iter()
            .map(|s| s.id)
            .filter(|id| !excluded.contains(id))
            .collect()
    }

    pub fn coverage(&self) -> CoverageStats {
        let total = self.students.len();
        let picked = self.students.iter().filter(|s| !s.never_picked()).count();
        let progress = if total == 0 {
            0
        } else {
            ((picked as f64 / total as f64) * 100.0).round() as u32
        };
        CoverageStats {
            total,
            picked,
            unpicked: total - picked,
            progress,
        }
    }

    /// Most-picked students first, ties broken by stars
    pub fn leaderboard_by_picks(&self, limit: usize) -> Vec<&Student> {
        let mut sorted: Vec<&Student> = self.students.iter().collect();
        sorted.sort_by(|a, b| {
            b.pick_count
                .cmp(&a.pick_count)
                .then_with(|| b.stars.cmp(&a.stars))
        });
        sorted.truncate(limit);
        sorted
    }

    /// Students with at least one star, most stars first, ties by pick count
    pub fn leaderboard_by_stars(&self, limit: usize) -> Vec<&Student> {
        let mut sorted: Vec<&Student> = self.students.iter().filter(|s| s.stars > 0).collect();
        sorted.sort_by(|a, b| {
            b.stars
                .cmp(&a.stars)
                .then_with(|| b.pick_count.cmp(&a.pick_count))
        });
        sorted.truncate(limit);
        sorted
    }

    pub fn name_of(&self, id: StudentId) -> String {
        self.students
            .get(id)
            .map(|s| s.name().to_string())
            .unwrap_or_else(|_| format!("#{id}"))
    }
}

impl From<Vec<Student>> for Roster {
    fn from(students: Vec<Student>) -> Self {
        Roster::from_students(students)
    }
}

impl From<Roster> for Vec<Student> {
    fn from(roster: Roster) -> Self {
        roster.students.iter().cloned().collect()
    }
}
