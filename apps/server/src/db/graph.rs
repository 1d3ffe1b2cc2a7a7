//! Mapping Graph state: one canonical edge store with forward and reverse indexes
//!
//! Both indexes hold mapping ids kept in edge order, so reads never sort.

use crate::models::{ConceptMapping, MappingDraft, MappingKey};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type Endpoint = (String, String);

/// Edge order: confidence desc, equivalence rank desc, createdAt asc, id asc
pub fn edge_order(a: &ConceptMapping, b: &ConceptMapping) -> Ordering {
    b.confidence_score
        .total_cmp(&a.confidence_score)
        .then_with(|| b.equivalence.rank().cmp(&a.equivalence.rank()))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Clone, Default)]
pub struct GraphState {
    mappings: BTreeMap<i64, Arc<ConceptMapping>>,
    by_key: HashMap<MappingKey, i64>,
    forward: HashMap<Endpoint, Vec<i64>>,
    reverse: HashMap<Endpoint, Vec<i64>>,
    next_id: i64,
}

fn insert_sorted(
    index: &mut HashMap<Endpoint, Vec<i64>>,
    endpoint: Endpoint,
    mapping: &ConceptMapping,
    mappings: &BTreeMap<i64, Arc<ConceptMapping>>,
) {
    let ids = index.entry(endpoint).or_default();
    let pos = ids.partition_point(|id| {
        mappings
            .get(id)
            .map_or(true, |other| edge_order(other, mapping) == Ordering::Less)
    });
    ids.insert(pos, mapping.id);
}

fn remove_from(index: &mut HashMap<Endpoint, Vec<i64>>, endpoint: &Endpoint, id: i64) {
    if let Some(ids) = index.get_mut(endpoint) {
        ids.retain(|existing| *existing != id);
        if ids.is_empty() {
            index.remove(endpoint);
        }
    }
}

impl GraphState {
    pub fn get(&self, id: i64) -> Option<&Arc<ConceptMapping>> {
        self.mappings.get(&id)
    }

    pub fn find(&self, key: &MappingKey) -> Option<&Arc<ConceptMapping>> {
        self.by_key.get(key).and_then(|id| self.mappings.get(id))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// All mappings in id order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ConceptMapping>> + '_ {
        self.mappings.values()
    }

    fn collect(&self, ids: Option<&Vec<i64>>) -> Vec<Arc<ConceptMapping>> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.mappings.get(id).cloned())
                .collect()
        })
        .unwrap_or_default()
    }

    /// Edges leaving `(system, code)` in edge order
    pub fn edges_from(&self, system: &str, code: &str) -> Vec<Arc<ConceptMapping>> {
        self.collect(self.forward.get(&(system.to_string(), code.to_string())))
    }

    /// Edges pointing at `(system, code)` in edge order
    pub fn edges_to(&self, system: &str, code: &str) -> Vec<Arc<ConceptMapping>> {
        self.collect(self.reverse.get(&(system.to_string(), code.to_string())))
    }

    /// True when any edge, usable or not, links the source to `target_system`
    pub fn has_edge_to_system(&self, source_system: &str, source_code: &str, target_system: &str) -> bool {
        self.forward
            .get(&(source_system.to_string(), source_code.to_string()))
            .map_or(false, |ids| {
                ids.iter()
                    .filter_map(|id| self.mappings.get(id))
                    .any(|m| m.target_system == target_system)
            })
    }

    /// Create the edge for `draft.key` or update the existing one in place.
    /// Returns the stored edge and whether it was newly created.
    pub fn upsert(
        &mut self,
        draft: MappingDraft,
        default_version: &str,
        now: DateTime<Utc>,
    ) -> Result<(Arc<ConceptMapping>, bool)> {
        if !draft.confidence_score.is_finite() || !(0.0..=1.0).contains(&draft.confidence_score) {
            return Err(Error::Validation(format!(
                "confidenceScore must be within [0, 1], got {}",
                draft.confidence_score
            )));
        }
        if draft.key.source_system == draft.key.target_system
            && draft.key.source_code == draft.key.target_code
        {
            return Err(Error::Validation(format!(
                "mapping {} links a code to itself",
                draft.key
            )));
        }

        let existing = self.find(&draft.key).cloned();
        let created = existing.is_none();
        let (id, created_at, current_version) = match existing.as_deref() {
            Some(current) => {
                self.unindex(current);
                (current.id, current.created_at, Some(current.mapping_version.clone()))
            }
            None => {
                self.next_id += 1;
                (self.next_id, now, None)
            }
        };

        let mapping_version = draft
            .mapping_version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or(current_version)
            .unwrap_or_else(|| default_version.to_string());

        let mapping = Arc::new(ConceptMapping {
            id,
            source_system: draft.key.source_system.clone(),
            source_code: draft.key.source_code.clone(),
            target_system: draft.key.target_system.clone(),
            target_code: draft.key.target_code.clone(),
            equivalence: draft.equivalence,
            comment: draft.comment,
            confidence_score: draft.confidence_score,
            mapping_version,
            origin: draft.origin,
            created_at,
            updated_at: now,
        });

        self.mappings.insert(id, mapping.clone());
        self.by_key.insert(draft.key, id);
        self.index(&mapping);
        Ok((mapping, created))
    }

    pub fn remove(&mut self, id: i64) -> Result<Arc<ConceptMapping>> {
        let mapping = self
            .mappings
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("ConceptMapping {id}")))?;
        self.unindex(&mapping);
        self.mappings.remove(&id);
        self.by_key.remove(&mapping.key());
        Ok(mapping)
    }

    fn index(&mut self, mapping: &ConceptMapping) {
        insert_sorted(
            &mut self.forward,
            (mapping.source_system.clone(), mapping.source_code.clone()),
            mapping,
            &self.mappings,
        );
        insert_sorted(
            &mut self.reverse,
            (mapping.target_system.clone(), mapping.target_code.clone()),
            mapping,
            &self.mappings,
        );
    }

    fn unindex(&mut self, mapping: &ConceptMapping) {
        remove_from(
            &mut self.forward,
            &(mapping.source_system.clone(), mapping.source_code.clone()),
            mapping.id,
        );
        remove_from(
            &mut self.reverse,
            &(mapping.target_system.clone(), mapping.target_code.clone()),
            mapping.id,
        );
    }
}
