//! Student representation

use crate::core::{DormNumber, Entity, EntityId, StudentName};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type StudentId = EntityId<Student>;

/// Lowest star total a cursed student can reach, so that negating it never overflows
pub const STAR_FLOOR: i32 = -i32::MAX;

/// A student on the roster
///
/// `id`, `name` and `dorm_number` are owned by whoever creates the record.
/// The four mutable attributes are only changed through the roster store,
/// which is where the star clamp and curse exception live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,

    pub name: StudentName,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dorm_number: Option<DormNumber>,

    /// Star total; never below zero unless cursed
    #[serde(default)]
    pub(crate) stars: i32,

    /// Completed judged draws of this student
    #[serde(default)]
    pub(crate) pick_count: u32,

    /// Remaining turns during which the student cannot be drawn
    #[serde(default)]
    pub(crate) immunity: u32,

    #[serde(default)]
    pub(crate) is_cursed: bool,
}

impl Student {
    pub fn new(id: StudentId, name: impl Into<StudentName>) -> Self {
        Student {
            id,
            name: name.into(),
            dorm_number: None,
            stars: 0,
            pick_count: 0,
            immunity: 0,
            is_cursed: false,
        }
    }

    pub fn with_dorm(mut self, dorm: impl Into<DormNumber>) -> Self {
        self.dorm_number = Some(dorm.into());
        self
    }

    /// Set the star total, clamped at zero unless the student is already cursed
    pub fn with_stars(mut self, stars: i32) -> Self {
        self.stars = stars.max(if self.is_cursed { STAR_FLOOR } else { 0 });
        self
    }

    pub fn with_pick_count(mut self, pick_count: u32) -> Self {
        self.pick_count = pick_count;
        self
    }

    pub fn with_immunity(mut self, immunity: u32) -> Self {
        self.immunity = immunity;
        self
    }

    /// Mark the student as cursed (call before `with_stars` for negative totals)
    pub fn cursed(mut self) -> Self {
        self.is_cursed = true;
        self
    }

    /// Repair a record that came from outside the engine
    ///
    /// Blank dorm numbers become `None`. Star totals are clamped to zero, or
    /// to `STAR_FLOOR` for a cursed student.
    pub fn normalized(mut self) -> Self {
        if self
            .dorm_number
            .as_ref()
            .is_some_and(|dorm| dorm.as_str().is_empty() || dorm.as_str() == "nan")
        {
            self.dorm_number = None;
        }
        self.stars = self.stars.max(if self.is_cursed { STAR_FLOOR } else { 0 });
        self
    }

    pub fn stars(&self) -> i32 {
        self.stars
    }

    pub fn pick_count(&self) -> u32 {
        self.pick_count
    }

    pub fn immunity(&self) -> u32 {
        self.immunity
    }

    pub fn is_cursed(&self) -> bool {
        self.is_cursed
    }

    pub fn is_immune(&self) -> bool {
        self.immunity > 0
    }

    pub fn never_picked(&self) -> bool {
        self.pick_count == 0
    }

    /// Dormmates share a (non-empty) dorm number
    pub fn shares_dorm_with(&self, other: &Student) -> bool {
        match (&self.dorm_number, &other.dorm_number) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn rarity(&self) -> RarityTier {
        RarityTier::from_stars(self.stars)
    }
}

impl Entity for Student {
    fn id(&self) -> StudentId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}★", self.name, self.stars)?;
        if self.is_cursed {
            write!(f, ", cursed")?;
        }
        if self.immunity > 0 {
            write!(f, ", immune {}", self.immunity)?;
        }
        write!(f, ")")
    }
}

/// Display tier derived from a star total
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RarityTier {
    N,
    R,
    SR,
    SSR,
    UR,
    EX,
}

impl RarityTier {
    /// Stars below zero show as N, anything from five up shows as EX
    pub fn from_stars(stars: i32) -> Self {
        match stars {
            i32::MIN..=0 => RarityTier::N,
            1 => RarityTier::R,
            2 => RarityTier::SR,
            3 => RarityTier::SSR,
            4 => RarityTier::UR,
            _ => RarityTier::EX,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RarityTier::N => "N",
            RarityTier::R => "R",
            RarityTier::SR => "SR",
            RarityTier::SSR => "SSR",
            RarityTier::UR => "UR",
            RarityTier::EX => "EX",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            RarityTier::N => "普通",
            RarityTier::R => "稀有",
            RarityTier::SR => "超稀有",
            RarityTier::SSR => "史诗",
            RarityTier::UR => "传说",
            RarityTier::EX => "神话",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_creation() {
        let id = StudentId::new(1);
        let student = Student::new(id, "Alice").with_dorm("301");

        assert_eq!(student.id, id);
        assert_eq!(student.name.as_str(), "Alice");
        assert_eq!(student.stars(), 0);
        assert!(student.never_picked());
        assert!(!student.is_immune());
        assert!(!student.is_cursed());
    }

    #[test]
    fn test_builder_respects_curse() {
        let plain = Student::new(StudentId::new(1), "Bob").with_stars(-3);
        assert_eq!(plain.stars(), 0);

        let cursed = Student::new(StudentId::new(2), "Carol").cursed().with_stars(-3);
        assert_eq!(cursed.stars(), -3);
    }

    #[test]
    fn test_normalized_repairs_external_data() {
        let mut student = Student::new(StudentId::new(1), "Dan").with_dorm(" ");
        student.stars = -4;
        let student = student.normalized();
        assert_eq!(student.stars(), 0);
        assert!(student.dorm_number.is_none());
    }

    #[test]
    fn test_dormmates_need_a_dorm() {
        let a = Student::new(StudentId::new(1), "A").with_dorm("302");
        let b = Student::new(StudentId::new(2), "B").with_dorm("302 ");
        let c = Student::new(StudentId::new(3), "C");
        let d = Student::new(StudentId::new(4), "D");

        assert!(a.shares_dorm_with(&b));
        assert!(!a.shares_dorm_with(&c));
        assert!(!c.shares_dorm_with(&d));
    }

    #[test]
    fn test_rarity_tiers() {
        assert_eq!(RarityTier::from_stars(-2), RarityTier::N);
        assert_eq!(RarityTier::from_stars(0), RarityTier::N);
        assert_eq!(RarityTier::from_stars(3), RarityTier::SSR);
        assert_eq!(RarityTier::from_stars(5), RarityTier::EX);
        assert_eq!(RarityTier::from_stars(40), RarityTier::EX);
        assert_eq!(RarityTier::EX.label(), "EX");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let student: Student = serde_json::from_str(r#"{"id": 7, "name": "Eve"}"#).unwrap();
        assert_eq!(student.id.as_u32(), 7);
        assert_eq!(student.pick_count(), 0);
        assert_eq!(student.immunity(), 0);
    }
}
