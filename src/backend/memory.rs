//! In-memory backend, saved to and loaded from a JSON class data file

use crate::backend::PersistenceBackend;
use crate::core::{
    EntityStore, ItemCard, PoolType, Student, StudentId, StudentItem, StudentItemId,
};
use crate::loader::{default_catalog, ClassData};
use crate::{GachaError, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::path::Path;

/// Pick one catalog card for `pool`
///
/// Falls back to cards whose effect belongs in `pool` by default (catalogs
/// written before pools were stored), then to the whole catalog. Weights
/// are each card's `probability`; if no usable weight exists the draw is
/// uniform.
pub fn draw_card<'a, R: Rng + ?Sized>(
    catalog: &'a [ItemCard],
    pool: PoolType,
    rng: &mut R,
) -> Result<&'a ItemCard> {
    let mut candidates: Vec<&ItemCard> = catalog.iter().filter(|c| c.pool == pool).collect();
    if candidates.is_empty() {
        candidates = catalog
            .iter()
            .filter(|c| c.effect.default_pool() == pool)
            .collect();
    }
    if candidates.is_empty() {
        candidates = catalog.iter().collect();
    }
    if candidates.is_empty() {
        return Err(GachaError::NoItemsAvailable);
    }

    let index = match WeightedIndex::new(candidates.iter().map(|c| c.draw_weight())) {
        Ok(weights) => weights.sample(rng),
        Err(_) => rng.gen_range(0..candidates.len()),
    };
    Ok(candidates[index])
}

/// Students, catalog and inventories held in memory
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    students: EntityStore<Student>,
    catalog: Vec<ItemCard>,
    items: EntityStore<StudentItem>,
    /// Item draws only; the session keeps its own RNG
    rng: ChaCha12Rng,
    turns_advanced: u32,
}

impl MemoryBackend {
    /// Empty class with the stock catalog
    pub fn new(seed: u64) -> Self {
        MemoryBackend {
            students: EntityStore::new(),
            catalog: default_catalog(),
            items: EntityStore::new(),
            rng: ChaCha12Rng::seed_from_u64(seed),
            turns_advanced: 0,
        }
    }

    pub fn from_data(data: ClassData, seed: u64) -> Self {
        let data = data.normalized();
        MemoryBackend {
            students: data.students.into_iter().collect(),
            catalog: data.catalog,
            items: data.items.into_iter().collect(),
            rng: ChaCha12Rng::seed_from_u64(seed),
            turns_advanced: 0,
        }
    }

    pub fn with_students(seed: u64, students: impl IntoIterator<Item = Student>) -> Self {
        let mut backend = Self::new(seed);
        for student in students {
            backend.students.insert(student.normalized());
        }
        backend
    }

    pub fn to_data(&self) -> ClassData {
        ClassData {
            students: self.students.iter().cloned().collect(),
            catalog: self.catalog.clone(),
            items: self.items.iter().cloned().collect(),
        }
    }

    pub fn load_from_file(path: &Path, seed: u64) -> Result<Self> {
        Ok(Self::from_data(ClassData::load(path)?, seed))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.to_data().save(path)
    }

    /// Create a student record (the import/manual-add path)
    pub fn add_student(&mut self, name: &str, dorm: Option<&str>) -> Result<StudentId> {
        let id = self.students.next_id()?;
        let mut student = Student::new(id, name);
        if let Some(dorm) = dorm {
            student = student.with_dorm(dorm);
        }
        self.students.insert(student.normalized());
        Ok(id)
    }

    pub fn set_catalog(&mut self, catalog: Vec<ItemCard>) {
        self.catalog = catalog;
    }

    pub fn catalog(&self) -> &[ItemCard] {
        &self.catalog
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> + '_ {
        self.students.iter()
    }

    pub fn student(&self, id: StudentId) -> Result<&Student> {
        self.students.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &StudentItem> + '_ {
        self.items.iter()
    }

    pub fn turns_advanced(&self) -> u32 {
        self.turns_advanced
    }
}

impl PersistenceBackend for MemoryBackend {
    fn fetch_roster(&mut self) -> Result<Vec<Student>> {
        Ok(self.students.iter().cloned().collect())
    }

    fn persist_student(&mut self, student: &Student) -> Result<()> {
        self.students.insert(student.clone());
        Ok(())
    }

    fn delete_student(&mut self, id: StudentId) -> Result<()> {
        self.students
            .remove(id)
            .ok_or(GachaError::EntityNotFound(id.as_u32()))?;
        let owned: Vec<StudentItemId> = self
            .items
            .iter()
            .filter(|item| item.student_id == id)
            .map(|item| item.id)
            .collect();
        for item in owned {
            self.items.remove(item);
        }
        Ok(())
    }

    fn fetch_inventory(&mut self, student: StudentId) -> Result<Vec<StudentItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| item.student_id == student)
            .cloned()
            .collect())
    }

    fn draw_item_from_pool(&mut self, student: StudentId, pool: PoolType) -> Result<StudentItem> {
        if !self.students.contains(student) {
            return Err(GachaError::EntityNotFound(student.as_u32()));
        }
        let card = draw_card(&self.catalog, pool, &mut self.rng)?.clone();
        let item = StudentItem {
            id: self.items.next_id()?,
            student_id: student,
            item_card: card,
        };
        self.items.insert(item.clone());
        Ok(item)
    }

    fn consume_item(&mut self, item: StudentItemId) -> Result<()> {
        self.items
            .remove(item)
            .map(|_| ())
            .ok_or(GachaError::EntityNotFound(item.as_u32()))
    }

    fn advance_turn(&mut self) -> Result<()> {
        let ids: Vec<StudentId> = self.students.ids().to_vec();
        for id in ids {
            let student = self.students.get_mut(id)?;
            student.immunity = student.immunity.saturating_sub(1);
        }
        self.turns_advanced += 1;
        Ok(())
    }
}
