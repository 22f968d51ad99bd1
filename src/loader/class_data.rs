//! Class data file: the JSON image of a classroom's persisted state

use crate::core::{ItemCard, Student, StudentId, StudentItem};
use crate::loader::catalog::{default_catalog, migrate_legacy_cards};
use crate::{GachaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Names used by `gacha init --demo`
pub const DEMO_NAMES: [&str; 28] = [
    "周晓东", "余启东", "谢俊洪", "吴钰祥", "王家裕", "石悦", "邱佳荣", "欧阳效彬", "刘子骏", "刘镇杰",
    "刘韵怡", "刘世钦", "林烨棠", "林睿轩", "廖俊", "梁升发", "李栋", "雷锦鸿", "赖昊然", "黄子加",
    "黄智恒", "黄允成", "黄扬越", "何骏辉", "段建勋", "程迺伦", "陈永乾", "曹玉宜",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassData {
    #[serde(default)]
    pub students: Vec<Student>,

    #[serde(default)]
    pub catalog: Vec<ItemCard>,

    /// Inventory records across all students
    #[serde(default)]
    pub items: Vec<StudentItem>,
}

impl ClassData {
    /// Fresh class with the stock catalog
    pub fn new(students: Vec<Student>) -> Self {
        ClassData {
            students,
            catalog: default_catalog(),
            items: Vec::new(),
        }
    }

    /// Parse a data file's contents and repair legacy content
    pub fn from_json(json: &str) -> Result<Self> {
        let data: ClassData = serde_json::from_str(json)
            .map_err(|e| GachaError::SerializationError(format!("invalid class data: {e}")))?;
        Ok(data.normalized())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GachaError::SerializationError(format!("failed to encode class data: {e}")))
    }

    /// Migrate untagged cards, fill an empty catalog, clean student records
    pub fn normalized(mut self) -> Self {
        if self.catalog.is_empty() {
            self.catalog = default_catalog();
        } else {
            migrate_legacy_cards(&mut self.catalog);
        }
        for item in &mut self.items {
            migrate_legacy_cards(std::slice::from_mut(&mut item.item_card));
        }
        self.students = self.students.into_iter().map(Student::normalized).collect();
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Demo roster, optionally grouped into dorms of `dorm_size` starting at 301
pub fn demo_students(dorm_size: usize) -> Vec<Student> {
    DEMO_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let student = Student::new(StudentId::new(index as u32 + 1), *name);
            if dorm_size == 0 {
                student
            } else {
                student.with_dorm((301 + index / dorm_size).to_string())
            }
        })
        .collect()
}
