//! Snapshot store
//!
//! Readers load an immutable [`Snapshot`] through `ArcSwap` and never wait on
//! writers. A writer clones the parts it changes, builds the next snapshot and
//! publishes it with compare-and-swap, retrying against the newer snapshot when
//! another writer won the race. Mapping writes additionally hold a per-key
//! lock. Each write copies the maps it touches, so a single write costs O(n) in
//! the size of that partition; bulk operations publish once per batch.

use super::graph::GraphState;
use super::index::{SearchIndex, VocabIndex};
use super::locks::KeyLocks;
use super::registry::{NamasteRecord, RegistryState};
use super::shortcuts::{Shortcut, ShortcutTable};
use super::systems::SystemUris;
use crate::models::{
    ConceptMapping, Icd11Code, Icd11CodeType, MappingDraft, MappingKey, NamasteCode,
    NewIcd11Code, NewNamasteCode, TerminologyStats, TraditionalSystem, Vocabulary,
};
use crate::{Error, Result};
use arc_swap::ArcSwap;
use chrono::Utc;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// A concept resolved from a `(system, code)` pair
#[derive(Debug, Clone, Copy)]
pub enum ConceptRef<'a> {
    Namaste(&'a NamasteRecord),
    Icd11(&'a Icd11Code),
}

impl ConceptRef<'_> {
    pub fn code(&self) -> &str {
        match self {
            ConceptRef::Namaste(r) => &r.code.code,
            ConceptRef::Icd11(c) => &c.code,
        }
    }

    pub fn display(&self) -> &str {
        match self {
            ConceptRef::Namaste(r) => &r.code.display,
            ConceptRef::Icd11(c) => &c.title,
        }
    }

    pub fn definition(&self) -> Option<&str> {
        match self {
            ConceptRef::Namaste(r) => r.code.definition.as_deref(),
            ConceptRef::Icd11(c) => c.definition.as_deref(),
        }
    }
}

/// Immutable view of registry, graph and derived tables
#[derive(Debug, Clone)]
pub struct Snapshot {
    generation: u64,
    systems: Arc<SystemUris>,
    registry: Arc<RegistryState>,
    graph: Arc<GraphState>,
    shortcuts: Arc<ShortcutTable>,
    index: Arc<SearchIndex>,
}

impl Snapshot {
    fn empty(systems: SystemUris) -> Self {
        Self {
            generation: 0,
            systems: Arc::new(systems),
            registry: Arc::new(RegistryState::default()),
            graph: Arc::new(GraphState::default()),
            shortcuts: Arc::new(ShortcutTable::default()),
            index: Arc::new(SearchIndex::default()),
        }
    }

    /// Increases with every publish; used to key read caches
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn systems(&self) -> &SystemUris {
        &self.systems
    }

    pub fn registry(&self) -> &RegistryState {
        &self.registry
    }

    pub fn graph(&self) -> &GraphState {
        &self.graph
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn shortcut(&self, namaste_code: &str) -> Option<&Shortcut> {
        self.shortcuts.get(namaste_code)
    }

    /// NAMASTE code with its shortcut fields filled in
    pub fn namaste(&self, code: &str) -> Option<NamasteCode> {
        self.registry.namaste(code).map(|r| self.with_shortcuts(r))
    }

    pub fn namaste_in(&self, system: TraditionalSystem, code: &str) -> Option<NamasteCode> {
        self.namaste(code).filter(|c| c.system == system)
    }

    pub fn icd11(&self, code_type: Icd11CodeType, code: &str) -> Option<Icd11Code> {
        self.registry.icd11(code_type, code).map(|c| (**c).clone())
    }

    pub fn with_shortcuts(&self, record: &NamasteRecord) -> NamasteCode {
        let mut code = record.code.clone();
        if let Some(shortcut) = self.shortcuts.get(&code.code) {
            code.icd11_tm2_code = shortcut.tm2.as_ref().map(|t| t.code.clone());
            code.icd11_biomedicine_code = shortcut.biomedicine.as_ref().map(|t| t.code.clone());
        }
        code
    }

    pub fn list_namaste(&self, system: Option<TraditionalSystem>) -> Vec<NamasteCode> {
        self.registry
            .list_namaste(system)
            .map(|r| self.with_shortcuts(r))
            .collect()
    }

    pub fn list_icd11(&self, code_type: Option<Icd11CodeType>) -> Vec<Icd11Code> {
        self.registry
            .list_icd11(code_type)
            .map(|c| (**c).clone())
            .collect()
    }

    pub fn categories(&self, system: Option<TraditionalSystem>) -> BTreeSet<String> {
        self.registry.categories(system)
    }

    pub fn chapters(&self, code_type: Option<Icd11CodeType>) -> BTreeSet<String> {
        self.registry.chapters(code_type)
    }

    pub fn vocabulary(&self, system_uri: &str) -> Option<Vocabulary> {
        self.systems.vocabulary(system_uri)
    }

    /// Resolve a code in the vocabulary named by `system_uri`
    pub fn resolve(&self, system_uri: &str, code: &str) -> Option<ConceptRef<'_>> {
        match self.vocabulary(system_uri)? {
            Vocabulary::Namaste => self.registry.namaste(code).map(|r| ConceptRef::Namaste(r)),
            Vocabulary::Icd11(code_type) => self
                .registry
                .icd11(code_type, code)
                .map(|c| ConceptRef::Icd11(c)),
        }
    }

    pub fn display_of(&self, system_uri: &str, code: &str) -> Option<String> {
        self.resolve(system_uri, code).map(|c| c.display().to_string())
    }

    pub fn mapping(&self, id: i64) -> Option<ConceptMapping> {
        self.graph.get(id).map(|m| (**m).clone())
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Arc<ConceptMapping>> + '_ {
        self.graph.iter()
    }

    pub fn mapping_count(&self) -> usize {
        self.graph.len()
    }

    pub fn edges_from(&self, system: &str, code: &str) -> Vec<Arc<ConceptMapping>> {
        self.graph.edges_from(system, code)
    }

    pub fn edges_to(&self, system: &str, code: &str) -> Vec<Arc<ConceptMapping>> {
        self.graph.edges_to(system, code)
    }

    pub fn stats(&self) -> TerminologyStats {
        let registry = &self.registry;
        TerminologyStats {
            namaste_code_count: registry.namaste_count() as u64,
            icd11_code_count: registry.icd11_count() as u64,
            mapping_count: self.graph.len() as u64,
            ayurveda_count: registry.count_system(TraditionalSystem::Ayurveda) as u64,
            siddha_count: registry.count_system(TraditionalSystem::Siddha) as u64,
            unani_count: registry.count_system(TraditionalSystem::Unani) as u64,
            tm2_count: registry.count_code_type(Icd11CodeType::Tm2) as u64,
            biomedicine_count: registry.count_code_type(Icd11CodeType::Biomedicine) as u64,
        }
    }

    fn rebuild_namaste_index(&mut self) {
        let namaste = VocabIndex::build(self.registry.list_namaste(None).map(|r| {
            (
                r.code.code.as_str(),
                r.code.display.as_str(),
                r.code.definition.as_deref(),
            )
        }));
        let mut index = (*self.index).clone();
        index.namaste = Arc::new(namaste);
        self.index = Arc::new(index);
    }

    fn rebuild_icd11_index(&mut self, code_type: Icd11CodeType) {
        let built = Arc::new(VocabIndex::build(
            self.registry
                .list_icd11(Some(code_type))
                .map(|c| (c.code.as_str(), c.title.as_str(), c.definition.as_deref())),
        ));
        let mut index = (*self.index).clone();
        match code_type {
            Icd11CodeType::Tm2 => index.tm2 = built,
            Icd11CodeType::Biomedicine => index.biomedicine = built,
        }
        self.index = Arc::new(index);
    }

    /// Both endpoints must name a known vocabulary and resolve in the registry
    fn check_endpoints(&self, key: &MappingKey) -> Result<()> {
        for (role, system) in [("source", &key.source_system), ("target", &key.target_system)] {
            if self.vocabulary(system).is_none() {
                return Err(Error::Validation(format!("unknown {role} system '{system}'")));
            }
        }
        if self.resolve(&key.source_system, &key.source_code).is_none() {
            return Err(Error::Conflict(format!(
                "source code {} is not registered in {}",
                key.source_code, key.source_system
            )));
        }
        if self.resolve(&key.target_system, &key.target_code).is_none() {
            return Err(Error::Conflict(format!(
                "target code {} is not registered in {}",
                key.target_code, key.target_system
            )));
        }
        Ok(())
    }

    fn recompute_shortcuts_after_edge(&mut self, mapping: &ConceptMapping) {
        if mapping.source_system != self.systems.namaste {
            return;
        }
        let mut shortcuts = (*self.shortcuts).clone();
        shortcuts.recompute(&mapping.source_code, &self.systems, &self.registry, &self.graph);
        self.shortcuts = Arc::new(shortcuts);
    }
}

/// Result of a single mapping write
#[derive(Debug, Clone)]
pub struct MappingWrite {
    pub mapping: ConceptMapping,
    pub created: bool,
}

/// Result of a generated-mapping batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedBatch {
    pub created: usize,
    /// A mapping already linked the source to the target system
    pub already_mapped: usize,
    /// The hinted target is not in the registry
    pub skipped: usize,
}

pub struct TerminologyStore {
    current: ArcSwap<Snapshot>,
    key_locks: KeyLocks,
    namaste_version: String,
    mapping_version: String,
}

impl TerminologyStore {
    pub fn new(systems: SystemUris, namaste_version: &str, mapping_version: &str) -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty(systems)),
            key_locks: KeyLocks::new(),
            namaste_version: namaste_version.to_string(),
            mapping_version: mapping_version.to_string(),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Build the next snapshot from the current one and publish it with compare-and-swap.
    /// An error from `build` leaves the published snapshot untouched.
    fn publish<T>(
        &self,
        writer: &'static str,
        mut build: impl FnMut(&Snapshot) -> Result<(Snapshot, T)>,
    ) -> Result<T> {
        loop {
            let current = self.current.load_full();
            let (mut next, out) = build(&current)?;
            next.generation = current.generation + 1;
            let next = Arc::new(next);

            let previous = self.current.compare_and_swap(&current, next.clone());
            if Arc::ptr_eq(&previous, &current) {
                crate::metrics::record_store_sizes(
                    next.registry.namaste_count(),
                    next.registry.icd11_count(),
                    next.graph.len(),
                );
                return Ok(out);
            }

            crate::metrics::SNAPSHOT_PUBLISH_RETRIES_TOTAL
                .with_label_values(&[writer])
                .inc();
            tracing::debug!(writer, "Snapshot changed during write, retrying");
        }
    }

    pub fn upsert_namaste(&self, input: NewNamasteCode) -> Result<NamasteCode> {
        self.bulk_upsert_namaste(vec![input])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Internal("upsert produced no record".to_string()))
    }

    /// Apply a whole batch in one unit of work. Any invalid record rejects the batch.
    pub fn bulk_upsert_namaste(&self, inputs: Vec<NewNamasteCode>) -> Result<Vec<NamasteCode>> {
        let now = Utc::now();
        let stored = self.publish("registry", |current| {
            let mut next = current.clone();
            let mut registry = (*current.registry).clone();
            let mut stored = Vec::with_capacity(inputs.len());
            for input in &inputs {
                stored.push(registry.upsert_namaste(input.clone(), &self.namaste_version, now)?);
            }
            next.registry = Arc::new(registry);

            let mut shortcuts = (*current.shortcuts).clone();
            for code in &stored {
                shortcuts.recompute(&code.code, &next.systems, &next.registry, &next.graph);
            }
            next.shortcuts = Arc::new(shortcuts);
            next.rebuild_namaste_index();
            Ok((next, stored))
        })?;

        let snapshot = self.snapshot();
        Ok(stored
            .into_iter()
            .map(|code| {
                snapshot
                    .registry
                    .namaste(&code.code)
                    .map(|r| snapshot.with_shortcuts(r))
                    .unwrap_or(code)
            })
            .collect())
    }

    pub fn upsert_icd11(&self, input: NewIcd11Code) -> Result<Icd11Code> {
        self.bulk_upsert_icd11(vec![input])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Internal("upsert produced no record".to_string()))
    }

    /// Apply a batch of ICD-11 codes. Parents are checked once the whole batch is in place,
    /// so a batch may list children before their parents.
    pub fn bulk_upsert_icd11(&self, inputs: Vec<NewIcd11Code>) -> Result<Vec<Icd11Code>> {
        let now = Utc::now();
        self.publish("registry", |current| {
            let mut next = current.clone();
            let mut registry = (*current.registry).clone();
            let mut stored = Vec::with_capacity(inputs.len());
            for input in &inputs {
                stored.push(registry.insert_icd11(input.clone(), now)?);
            }
            for code in &stored {
                registry.check_parent(code.code_type, &code.code)?;
            }
            next.registry = Arc::new(registry);

            let mut shortcuts = (*current.shortcuts).clone();
            for code in &stored {
                shortcuts.recompute_referencing(
                    code.code_type,
                    &code.code,
                    &next.systems,
                    &next.registry,
                    &next.graph,
                );
            }
            next.shortcuts = Arc::new(shortcuts);

            let touched: HashSet<Icd11CodeType> = stored.iter().map(|c| c.code_type).collect();
            for code_type in touched {
                next.rebuild_icd11_index(code_type);
            }
            Ok((next, stored))
        })
    }

    /// Create or update the mapping for `draft.key`
    pub async fn add_or_update_mapping(&self, draft: MappingDraft) -> Result<MappingWrite> {
        let _guard = self.key_locks.acquire(&draft.key).await;
        let now = Utc::now();
        self.publish("mapping", |current| {
            current.check_endpoints(&draft.key)?;
            let mut next = current.clone();
            let mut graph = (*current.graph).clone();
            let (mapping, created) = graph.upsert(draft.clone(), &self.mapping_version, now)?;
            next.graph = Arc::new(graph);
            next.recompute_shortcuts_after_edge(&mapping);
            Ok((
                next,
                MappingWrite {
                    mapping: (*mapping).clone(),
                    created,
                },
            ))
        })
    }

    /// Delete a mapping by id and recompute the affected shortcut
    pub async fn remove_mapping(&self, id: i64) -> Result<ConceptMapping> {
        let key = self
            .snapshot()
            .graph
            .get(id)
            .map(|m| m.key())
            .ok_or_else(|| Error::NotFound(format!("ConceptMapping {id}")))?;
        let _guard = self.key_locks.acquire(&key).await;
        self.publish("mapping", |current| {
            let mut next = current.clone();
            let mut graph = (*current.graph).clone();
            let removed = graph.remove(id)?;
            next.graph = Arc::new(graph);
            next.recompute_shortcuts_after_edge(&removed);
            Ok((next, (*removed).clone()))
        })
    }

    /// Add generated mappings in one publish. A draft is applied only when no mapping yet
    /// links its source to its target system.
    pub async fn add_generated_mappings(&self, drafts: Vec<MappingDraft>) -> Result<GeneratedBatch> {
        let keys: Vec<MappingKey> = drafts.iter().map(|d| d.key.clone()).collect();
        let _guards = self.key_locks.acquire_many(&keys).await;
        let now = Utc::now();
        self.publish("generation", |current| {
            let mut next = current.clone();
            let mut graph = (*current.graph).clone();
            let mut outcome = GeneratedBatch::default();
            let mut sources: BTreeSet<String> = BTreeSet::new();

            for draft in &drafts {
                let key = &draft.key;
                if graph.has_edge_to_system(&key.source_system, &key.source_code, &key.target_system) {
                    outcome.already_mapped += 1;
                    continue;
                }
                match current.check_endpoints(key) {
                    Ok(()) => {}
                    Err(Error::Conflict(_)) => {
                        outcome.skipped += 1;
                        continue;
                    }
                    Err(other) => return Err(other),
                }
                let (mapping, _) = graph.upsert(draft.clone(), &self.mapping_version, now)?;
                if mapping.source_system == current.systems.namaste {
                    sources.insert(mapping.source_code.clone());
                }
                outcome.created += 1;
            }

            next.graph = Arc::new(graph);
            let mut shortcuts = (*current.shortcuts).clone();
            for source in &sources {
                shortcuts.recompute(source, &next.systems, &next.registry, &next.graph);
            }
            next.shortcuts = Arc::new(shortcuts);
            Ok((next, outcome))
        })
    }
}
