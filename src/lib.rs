//! Classroom Gacha - weighted random student picker for classroom Q&A
//!
//! Students are drawn with a never-picked-first rule and star-weighted
//! tickets, judged by the teacher, and rewarded or punished with single-use
//! item cards whose effects reshape the roster.

pub mod backend;
pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod journal;
pub mod loader;
pub mod simulation;

pub use error::{GachaError, Result};
