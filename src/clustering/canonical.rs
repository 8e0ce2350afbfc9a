// src/clustering/canonical.rs

use std::collections::HashMap;

use crate::models::core::{SubjectComponent, SubjectId};

/// Maps every subject id to the minimum id of its component.
///
/// Iteration is component-major, member-minor, which is the row order of
/// the annotated output.
#[derive(Debug, Clone, Default)]
pub struct CanonicalMapping {
    entries: Vec<(SubjectId, SubjectId)>,
    position_by_id: HashMap<SubjectId, usize>,
}

impl CanonicalMapping {
    pub fn from_components(components: &[SubjectComponent]) -> Self {
        let mut mapping = Self::default();
        for component in components {
            let Some(canonical_id) = component.canonical_id() else {
                continue;
            };
            for subject_id in component.subject_ids() {
                mapping.insert(subject_id.clone(), canonical_id.clone());
            }
        }
        mapping
    }

    /// A repeated id keeps its first position and takes the newest value.
    fn insert(&mut self, subject_id: SubjectId, canonical_id: SubjectId) {
        match self.position_by_id.get(&subject_id) {
            Some(&pos) => self.entries[pos].1 = canonical_id,
            None => {
                self.position_by_id
                    .insert(subject_id.clone(), self.entries.len());
                self.entries.push((subject_id, canonical_id));
            }
        }
    }

    pub fn canonical_id(&self, subject_id: &SubjectId) -> Option<&SubjectId> {
        self.position_by_id
            .get(subject_id)
            .map(|&pos| &self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SubjectId, &SubjectId)> {
        self.entries.iter().map(|(id, canonical)| (id, canonical))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
