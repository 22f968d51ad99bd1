//! Entity system with typed integer IDs

use crate::GachaError;
use crate::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Integer ID tagged with the kind of entity it names
///
/// A `StudentId` and a `StudentItemId` are both plain integers on the wire,
/// but cannot be mixed up in code. Serializes as a bare `u32`.
pub struct EntityId<T> {
    id: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> EntityId<T> {
    pub const fn new(id: u32) -> Self {
        EntityId {
            id,
            _marker: PhantomData,
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.id
    }
}

// Manual impls: derives would require `T: Clone` etc. on the marker type.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for EntityId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Serialize for EntityId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.id)
    }
}

impl<'de, T> Deserialize<'de> for EntityId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        u32::deserialize(deserializer).map(EntityId::new)
    }
}

/// Anything stored in an [`EntityStore`]
pub trait Entity: Sized {
    fn id(&self) -> EntityId<Self>;
    fn name(&self) -> &str;
}

/// Central storage for one kind of entity
///
/// Lookup goes through an FxHashMap; iteration follows insertion order so
/// that seeded random choices over the store are reproducible.
#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    entities: FxHashMap<EntityId<T>, T>,
    order: Vec<EntityId<T>>,
    /// One past the highest id seen; above `u32::MAX` once the space is used up
    next_id: u64,
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
            order: Vec::new(),
            next_id: 0,
        }
    }

    /// Generate a new unique id, never handed out before by this store
    pub fn next_id(&mut self) -> Result<EntityId<T>> {
        let raw = u32::try_from(self.next_id)
            .map_err(|_| GachaError::InvalidAction("entity id space exhausted".to_string()))?;
        self.next_id += 1;
        Ok(EntityId::new(raw))
    }

    /// Insert (or replace) an entity under its own id
    pub fn insert(&mut self, entity: T) {
        let id = entity.id();
        self.next_id = self.next_id.max(u64::from(id.as_u32()) + 1);
        if self.entities.insert(id, entity).is_none() {
            self.order.push(id);
        }
    }

    /// Get an entity by ID
    pub fn get(&self, id: EntityId<T>) -> Result<&T> {
        self.entities
            .get(&id)
            .ok_or(GachaError::EntityNotFound(id.as_u32()))
    }

    /// Get a mutable reference to an entity
    pub fn get_mut(&mut self, id: EntityId<T>) -> Result<&mut T> {
        self.entities
            .get_mut(&id)
            .ok_or(GachaError::EntityNotFound(id.as_u32()))
    }

    pub fn contains(&self, id: EntityId<T>) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn remove(&mut self, id: EntityId<T>) -> Option<T> {
        let removed = self.entities.remove(&id);
        if removed.is_some() {
            self.order.retain(|other| *other != id);
        }
        removed
    }

    /// Iterate over all entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().filter_map(move |id| self.entities.get(id))
    }

    /// Ids in insertion order
    pub fn ids(&self) -> &[EntityId<T>] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> FromIterator<T> for EntityStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut store = EntityStore::new();
        for entity in iter {
            store.insert(entity);
        }
        store
    }
}
