// src/models/core.rs

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a subject row, kept exactly as it appeared in the input.
///
/// Ordering is numeric when the id was read from an all-integer column (so
/// `9` sorts before `10` and `007` equals `7`), and plain string ordering
/// otherwise. Use [`parse_id_column`] so every id of a table gets the same
/// mode.
#[derive(Debug, Clone)]
pub struct SubjectId {
    raw: String,
    numeric: Option<i64>,
}

impl SubjectId {
    pub fn numeric(raw: impl Into<String>, value: i64) -> Self {
        Self {
            raw: raw.into(),
            numeric: Some(value),
        }
    }

    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            numeric: None,
        }
    }

    /// The id as written in the input table.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Parses a whole id column: numeric ordering only when every id is an
/// integer, string ordering for all of them otherwise.
pub fn parse_id_column<S: AsRef<str>>(raw_ids: &[S]) -> Vec<SubjectId> {
    let parsed: Vec<Option<i64>> = raw_ids
        .iter()
        .map(|raw| raw.as_ref().trim().parse::<i64>().ok())
        .collect();

    if parsed.iter().all(Option::is_some) {
        raw_ids
            .iter()
            .zip(parsed)
            .map(|(raw, value)| SubjectId {
                raw: raw.as_ref().to_string(),
                numeric: value,
            })
            .collect()
    } else {
        raw_ids.iter().map(|raw| SubjectId::text(raw.as_ref())).collect()
    }
}

impl PartialEq for SubjectId {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SubjectId {}

impl Hash for SubjectId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.numeric {
            Some(value) => value.hash(state),
            None => self.raw.hash(state),
        }
    }
}

impl PartialOrd for SubjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SubjectId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric, other.numeric) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.raw.cmp(&other.raw),
        }
    }
}

impl From<i64> for SubjectId {
    fn from(value: i64) -> Self {
        SubjectId::numeric(value.to_string(), value)
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        SubjectId::text(value)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for SubjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// A subject as loaded from the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRecord {
    pub subject_id: SubjectId,
    pub subject_name: String,
}

impl SubjectRecord {
    pub fn to_node(&self) -> SubjectNode {
        SubjectNode {
            subject_id: self.subject_id.clone(),
            subject_name: self.subject_name.clone(),
        }
    }
}

/// Node data for the subject graph. Equality covers both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SubjectNode {
    pub subject_id: SubjectId,
    pub subject_name: String,
}

impl SubjectNode {
    pub fn new(subject_id: impl Into<SubjectId>, subject_name: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            subject_name: subject_name.into(),
        }
    }
}

/// A group of subjects judged to be duplicates of one another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectComponent {
    pub members: Vec<SubjectNode>,
}

impl SubjectComponent {
    pub fn new(members: Vec<SubjectNode>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Minimum identifier among the members, used as the group representative.
    pub fn canonical_id(&self) -> Option<&SubjectId> {
        self.members.iter().map(|node| &node.subject_id).min()
    }

    pub fn subject_ids(&self) -> impl Iterator<Item = &SubjectId> {
        self.members.iter().map(|node| &node.subject_id)
    }
}

impl fmt::Display for SubjectComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .members
            .iter()
            .map(|node| format!("({}, {:?})", node.subject_id, node.subject_name))
            .collect();
        write!(f, "{{{}}}", rendered.join(", "))
    }
}
