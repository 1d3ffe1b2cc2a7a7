//! Translation Resolver
//!
//! Direct translation reads forward edges towards the target system and edges
//! stored in the opposite direction (inverted). When nothing direct exists and a
//! bridge system is configured, exactly one hop through the bridge is tried.
//! Results are deterministic for a given snapshot and cached per generation.

use crate::db::{edge_order, Snapshot, TerminologyStore};
use crate::metrics::TRANSLATIONS_TOTAL;
use crate::models::{
    BridgeHop, ConceptMapping, Icd11CodeType, TranslationMatch, Vocabulary,
};
use crate::services::{AuditService, GenerationCache};
use crate::{Error, Result};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TranslateQuery {
    source_system: String,
    source_code: String,
    target_system: String,
}

/// A usable edge seen from the source side, with the match it produces
struct Candidate {
    mapping: Arc<ConceptMapping>,
    result: TranslationMatch,
}

fn vocabulary_label(vocabulary: Vocabulary) -> &'static str {
    match vocabulary {
        Vocabulary::Namaste => "namaste",
        Vocabulary::Icd11(Icd11CodeType::Tm2) => "tm2",
        Vocabulary::Icd11(Icd11CodeType::Biomedicine) => "biomedicine",
    }
}

/// Usable edges from `(system, code)` to `target_system`, best first, one per target code
fn direct_candidates(
    snapshot: &Snapshot,
    system: &str,
    code: &str,
    target_system: &str,
) -> Vec<Candidate> {
    let forward = snapshot
        .edges_from(system, code)
        .into_iter()
        .filter(|m| m.target_system == target_system && m.equivalence.is_usable())
        .map(|m| {
            let display = snapshot.display_of(target_system, &m.target_code);
            Candidate {
                result: TranslationMatch::direct(&m, display),
                mapping: m,
            }
        });

    let inverted = snapshot
        .edges_to(system, code)
        .into_iter()
        .filter(|m| m.source_system == target_system && m.equivalence.is_usable())
        .map(|m| {
            let display = snapshot.display_of(target_system, &m.source_code);
            Candidate {
                result: TranslationMatch::inverted(&m, display),
                mapping: m,
            }
        });

    let mut candidates: Vec<Candidate> = forward.chain(inverted).collect();
    candidates.sort_by(|a, b| edge_order(&a.mapping, &b.mapping));

    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.result.target_code.clone()));
    candidates
}

struct Bridged {
    first: Arc<ConceptMapping>,
    second: Arc<ConceptMapping>,
    result: TranslationMatch,
}

fn bridged_order(a: &Bridged, b: &Bridged) -> Ordering {
    b.result
        .confidence_score
        .total_cmp(&a.result.confidence_score)
        .then_with(|| b.result.equivalence.rank().cmp(&a.result.equivalence.rank()))
        .then_with(|| a.first.created_at.cmp(&b.first.created_at))
        .then_with(|| a.first.id.cmp(&b.first.id))
        .then_with(|| a.second.id.cmp(&b.second.id))
}

/// One hop through `bridge`: source -> bridge code -> target. Never chains further.
fn bridged_candidates(
    snapshot: &Snapshot,
    source_system: &str,
    source_code: &str,
    bridge: &str,
    target_system: &str,
) -> Vec<TranslationMatch> {
    let mut paths = Vec::new();
    for hop in direct_candidates(snapshot, source_system, source_code, bridge) {
        let bridge_code = hop.result.target_code.clone();
        for second in direct_candidates(snapshot, bridge, &bridge_code, target_system) {
            let result = TranslationMatch {
                id: None,
                source_system: source_system.to_string(),
                source_code: source_code.to_string(),
                target_system: target_system.to_string(),
                target_code: second.result.target_code.clone(),
                target_display: second.result.target_display.clone(),
                equivalence: hop.result.equivalence.weaker(second.result.equivalence),
                confidence_score: hop.result.confidence_score * second.result.confidence_score,
                comment: None,
                mapping_version: None,
                origin: None,
                via: Some(BridgeHop {
                    system: bridge.to_string(),
                    code: bridge_code.clone(),
                    first_mapping_id: hop.mapping.id,
                    second_mapping_id: second.mapping.id,
                }),
                reversed: false,
            };
            paths.push(Bridged {
                first: hop.mapping.clone(),
                second: second.mapping,
                result,
            });
        }
    }

    paths.sort_by(bridged_order);
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(p.result.target_code.clone()))
        .map(|p| p.result)
        .collect()
}

#[derive(Clone)]
pub struct TranslationService {
    store: Arc<TerminologyStore>,
    bridge: Option<String>,
    cache: Arc<GenerationCache<TranslateQuery, Vec<TranslationMatch>>>,
    audit: AuditService,
}

impl TranslationService {
    pub fn new(
        store: Arc<TerminologyStore>,
        bridge: Option<String>,
        cache_capacity: usize,
        audit: AuditService,
    ) -> Self {
        Self {
            store,
            bridge,
            cache: Arc::new(GenerationCache::new(cache_capacity)),
            audit,
        }
    }

    /// Translate `(source_system, source_code)` into `target_system`, best match first
    pub fn translate(
        &self,
        source_system: &str,
        source_code: &str,
        target_system: &str,
    ) -> Result<Vec<TranslationMatch>> {
        let snapshot = self.store.snapshot();
        self.translate_in(&snapshot, source_system, source_code, target_system)
    }

    /// [`translate`](Self::translate) against a snapshot the caller already holds
    #[tracing::instrument(skip(self, snapshot), fields(generation = snapshot.generation()))]
    pub fn translate_in(
        &self,
        snapshot: &Snapshot,
        source_system: &str,
        source_code: &str,
        target_system: &str,
    ) -> Result<Vec<TranslationMatch>> {
        let source = snapshot
            .vocabulary(source_system)
            .ok_or_else(|| Error::Validation(format!("unknown source system '{source_system}'")))?;
        let target = snapshot
            .vocabulary(target_system)
            .ok_or_else(|| Error::Validation(format!("unknown target system '{target_system}'")))?;
        if source == target {
            return Err(Error::Validation(
                "source and target system must differ".to_string(),
            ));
        }

        let direction = format!("{}-to-{}", vocabulary_label(source), vocabulary_label(target));
        // Normalize URIs so cache keys agree with the snapshot's spelling
        let source_system = snapshot.systems().uri(source).to_string();
        let target_system = snapshot.systems().uri(target).to_string();
        let source_code = source_code.trim();

        if snapshot.resolve(&source_system, source_code).is_none() {
            TRANSLATIONS_TOTAL
                .with_label_values(&[direction.as_str(), "not_found"])
                .inc();
            return Err(Error::NotFound(format!(
                "{} code {source_code}",
                vocabulary_label(source).to_ascii_uppercase()
            )));
        }

        let query = TranslateQuery {
            source_system: source_system.clone(),
            source_code: source_code.to_string(),
            target_system: target_system.clone(),
        };
        let matches = self
            .cache
            .get_or_try_insert(snapshot.generation(), query, || {
                Ok::<_, Error>(self.resolve(snapshot, &source_system, source_code, &target_system))
            })?;

        let outcome = match matches.first() {
            None => "empty",
            Some(m) if m.via.is_some() => "bridged",
            Some(_) => "direct",
        };
        TRANSLATIONS_TOTAL
            .with_label_values(&[direction.as_str(), outcome])
            .inc();
        self.audit.translation(&direction, source_code, matches.len());

        Ok((*matches).clone())
    }

    /// Translate into every other vocabulary, in NAMASTE, TM2, biomedicine order
    pub fn translate_all(&self, source_system: &str, source_code: &str) -> Result<Vec<TranslationMatch>> {
        let systems = self.store.snapshot().systems().clone();
        let source = systems
            .vocabulary(source_system)
            .ok_or_else(|| Error::Validation(format!("unknown source system '{source_system}'")))?;

        let mut all = Vec::new();
        for target in [
            Vocabulary::Namaste,
            Vocabulary::Icd11(Icd11CodeType::Tm2),
            Vocabulary::Icd11(Icd11CodeType::Biomedicine),
        ] {
            if target != source {
                all.extend(self.translate(source_system, source_code, systems.uri(target))?);
            }
        }
        Ok(all)
    }

    /// The usable edge linking two codes in either stored direction, never bridged
    pub fn direct_match(
        snapshot: &Snapshot,
        source_system: &str,
        source_code: &str,
        target_system: &str,
        target_code: &str,
    ) -> Option<TranslationMatch> {
        direct_candidates(snapshot, source_system, source_code, target_system)
            .into_iter()
            .map(|c| c.result)
            .find(|m| m.target_code == target_code)
    }

    pub fn namaste_to_tm2(&self, code: &str) -> Result<Vec<TranslationMatch>> {
        let systems = self.store.snapshot().systems().clone();
        self.translate(&systems.namaste, code, &systems.tm2)
    }

    pub fn tm2_to_namaste(&self, code: &str) -> Result<Vec<TranslationMatch>> {
        let systems = self.store.snapshot().systems().clone();
        self.translate(&systems.tm2, code, &systems.namaste)
    }

    pub fn namaste_to_biomedicine(&self, code: &str) -> Result<Vec<TranslationMatch>> {
        let systems = self.store.snapshot().systems().clone();
        self.translate(&systems.namaste, code, &systems.biomedicine)
    }

    fn resolve(
        &self,
        snapshot: &Snapshot,
        source_system: &str,
        source_code: &str,
        target_system: &str,
    ) -> Vec<TranslationMatch> {
        let direct: Vec<TranslationMatch> =
            direct_candidates(snapshot, source_system, source_code, target_system)
                .into_iter()
                .map(|c| c.result)
                .collect();
        if !direct.is_empty() {
            return direct;
        }

        match self.bridge.as_deref() {
            Some(bridge) if bridge != source_system && bridge != target_system => {
                bridged_candidates(snapshot, source_system, source_code, bridge, target_system)
            }
            _ => Vec::new(),
        }
    }
}
