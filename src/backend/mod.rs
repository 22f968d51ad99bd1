//! Persistence boundary
//!
//! The session treats its own roster as the source of truth and reports
//! every change through [`PersistenceBackend`]. Failures are caught by the
//! session, logged and surfaced as alerts; they never stop play.

pub mod memory;

pub use memory::MemoryBackend;

use crate::core::{PoolType, Student, StudentId, StudentItem, StudentItemId};
use crate::Result;

/// Collaborator that stores students and inventories
pub trait PersistenceBackend {
    /// Every student, in roster order
    fn fetch_roster(&mut self) -> Result<Vec<Student>>;

    /// Upsert stars, pick count, immunity and curse flag
    fn persist_student(&mut self, student: &Student) -> Result<()>;

    fn delete_student(&mut self, id: StudentId) -> Result<()>;

    fn fetch_inventory(&mut self, student: StudentId) -> Result<Vec<StudentItem>>;

    /// Draw a card from `pool` and add it to the student's inventory
    ///
    /// Returns the new ownership record, which carries the card.
    fn draw_item_from_pool(&mut self, student: StudentId, pool: PoolType) -> Result<StudentItem>;

    fn consume_item(&mut self, item: StudentItemId) -> Result<()>;

    /// Server-side immunity decrement; one call per completed turn
    fn advance_turn(&mut self) -> Result<()>;
}

impl<B: PersistenceBackend + ?Sized> PersistenceBackend for Box<B> {
    fn fetch_roster(&mut self) -> Result<Vec<Student>> {
        (**self).fetch_roster()
    }

    fn persist_student(&mut self, student: &Student) -> Result<()> {
        (**self).persist_student(student)
    }

    fn delete_student(&mut self, id: StudentId) -> Result<()> {
        (**self).delete_student(id)
    }

    fn fetch_inventory(&mut self, student: StudentId) -> Result<Vec<StudentItem>> {
        (**self).fetch_inventory(student)
    }

    fn draw_item_from_pool(&mut self, student: StudentId, pool: PoolType) -> Result<StudentItem> {
        (**self).draw_item_from_pool(student, pool)
    }

    fn consume_item(&mut self, item: StudentItemId) -> Result<()> {
        (**self).consume_item(item)
    }

    fn advance_turn(&mut self) -> Result<()> {
        (**self).advance_turn()
    }
}
