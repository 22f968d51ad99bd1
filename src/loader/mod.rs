//! Catalog and class data loaders

pub mod catalog;
pub mod class_data;
pub mod data_async;

pub use catalog::{default_catalog, migrate_legacy_cards};
pub use class_data::{demo_students, ClassData, DEMO_NAMES};
pub use data_async::{load_class_data, load_config, load_workspace, save_class_data};
