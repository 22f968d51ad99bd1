//! Error types for the classroom gacha engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GachaError {
    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("No eligible students in the draw pool")]
    EmptyPool,

    #[error("No items available in card pool")]
    NoItemsAvailable,

    #[error("Invalid session action: {0}")]
    InvalidAction(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, GachaError>;
