//! Strongly-typed wrappers for classroom concepts
//!
//! Names, dorm numbers and card names are all strings on the wire; these
//! newtypes keep them from being mixed up in code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Student display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentName(String);

impl StudentName {
    pub fn new(s: impl Into<String>) -> Self {
        StudentName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StudentName {
    fn from(s: String) -> Self {
        StudentName(s)
    }
}

impl From<&str> for StudentName {
    fn from(s: &str) -> Self {
        StudentName(s.to_string())
    }
}

/// Dorm (room) number used to group dormmates
///
/// Compared after trimming surrounding whitespace, since roster imports
/// tend to carry stray spaces.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DormNumber(String);

impl DormNumber {
    pub fn new(s: impl Into<String>) -> Self {
        DormNumber(s.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.trim()
    }
}

impl PartialEq for DormNumber {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl std::hash::Hash for DormNumber {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for DormNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for DormNumber {
    fn from(s: String) -> Self {
        DormNumber(s)
    }
}

impl From<&str> for DormNumber {
    fn from(s: &str) -> Self {
        DormNumber(s.to_string())
    }
}

/// Item card display name (never used for effect dispatch)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardName(String);

impl CardName {
    pub fn new(s: impl Into<String>) -> Self {
        CardName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CardName {
    fn from(s: String) -> Self {
        CardName(s)
    }
}

impl From<&str> for CardName {
    fn from(s: &str) -> Self {
        CardName(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_name() {
        let name = StudentName::new("Alice");
        assert_eq!(name.as_str(), "Alice");
        assert_eq!(name.to_string(), "Alice");
    }

    #[test]
    fn test_dorm_number_ignores_padding() {
        assert_eq!(DormNumber::new("302 "), DormNumber::new(" 302"));
        assert_ne!(DormNumber::new("302"), DormNumber::new("303"));
    }

    #[test]
    fn test_transparent_serde() {
        let json = serde_json::to_string(&CardName::new("Shield")).unwrap();
        assert_eq!(json, "\"Shield\"");
    }
}
