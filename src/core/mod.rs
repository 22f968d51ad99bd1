//! Core classroom types and entities

pub mod entity;
pub mod item;
pub mod student;
pub mod types;

pub use entity::{Entity, EntityId, EntityStore};
pub use item::{EffectKind, ItemCard, ItemCardId, PoolType, StudentItem, StudentItemId};
pub use student::{RarityTier, Student, StudentId, STAR_FLOOR};
pub use types::{CardName, DormNumber, StudentName};
