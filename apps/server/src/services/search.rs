//! Search & Autocomplete over the per-vocabulary indexes

use crate::config::TerminologyConfig;
use crate::db::{MatchTier, Snapshot, TerminologyStore};
use crate::metrics::SEARCHES_TOTAL;
use crate::models::{
    Icd11Code, Icd11CodeType, NamasteCode, PageRequest, PaginatedResponse, TraditionalSystem,
};
use crate::services::AuditService;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub autocomplete_min_chars: usize,
    pub autocomplete_default_limit: usize,
    pub autocomplete_max_limit: usize,
}

impl SearchLimits {
    pub fn from_config(config: &TerminologyConfig) -> Self {
        Self {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
            autocomplete_min_chars: config.autocomplete_min_chars,
            autocomplete_default_limit: config.autocomplete_default_limit,
            autocomplete_max_limit: config.autocomplete_max_limit,
        }
    }

    pub fn page(&self, page: Option<usize>, size: Option<usize>) -> PageRequest {
        PageRequest::clamped(page, size, self.default_page_size, self.max_page_size)
    }

    pub fn autocomplete_limit(&self, limit: Option<usize>) -> usize {
        limit
            .unwrap_or(self.autocomplete_default_limit)
            .clamp(1, self.autocomplete_max_limit.max(1))
    }

    fn too_short(&self, term: &str) -> bool {
        term.trim().chars().count() < self.autocomplete_min_chars
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::from_config(&TerminologyConfig::default())
    }
}

fn code_types(code_type: Option<Icd11CodeType>) -> Vec<Icd11CodeType> {
    match code_type {
        Some(t) => vec![t],
        None => Icd11CodeType::ALL.to_vec(),
    }
}

fn icd11_index(snapshot: &Snapshot, code_type: Icd11CodeType) -> &crate::db::VocabIndex {
    match code_type {
        Icd11CodeType::Tm2 => &snapshot.index().tm2,
        Icd11CodeType::Biomedicine => &snapshot.index().biomedicine,
    }
}

#[derive(Clone)]
pub struct SearchService {
    store: Arc<TerminologyStore>,
    limits: SearchLimits,
    audit: AuditService,
}

impl SearchService {
    pub fn new(store: Arc<TerminologyStore>, limits: SearchLimits, audit: AuditService) -> Self {
        Self {
            store,
            limits,
            audit,
        }
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    /// Substring search over NAMASTE codes, optionally narrowed to one system
    pub fn search_namaste(
        &self,
        term: &str,
        system: Option<TraditionalSystem>,
        page: Option<usize>,
        size: Option<usize>,
    ) -> PaginatedResponse<NamasteCode> {
        let snapshot = self.store.snapshot();
        let hits: Vec<NamasteCode> = snapshot
            .index()
            .namaste
            .search(term)
            .into_iter()
            .filter_map(|code| snapshot.namaste(code))
            .filter(|c| system.map_or(true, |s| c.system == s))
            .collect();

        SEARCHES_TOTAL.with_label_values(&["namaste", "search"]).inc();
        self.audit.search("NAMASTE", term, hits.len());
        PaginatedResponse::from_items(hits, self.limits.page(page, size))
    }

    /// Ranked prefix matches; terms shorter than the minimum return nothing
    pub fn autocomplete_namaste(&self, term: &str, limit: Option<usize>) -> Vec<NamasteCode> {
        SEARCHES_TOTAL
            .with_label_values(&["namaste", "autocomplete"])
            .inc();
        if self.limits.too_short(term) {
            return Vec::new();
        }
        let limit = self.limits.autocomplete_limit(limit);
        let snapshot = self.store.snapshot();
        snapshot
            .index()
            .namaste
            .autocomplete(term, limit)
            .into_iter()
            .filter_map(|hit| snapshot.namaste(hit.code))
            .collect()
    }

    /// Substring search over ICD-11. Without a code type both partitions are searched,
    /// TM2 first, each in code order.
    pub fn search_icd11(
        &self,
        term: &str,
        code_type: Option<Icd11CodeType>,
        page: Option<usize>,
        size: Option<usize>,
    ) -> PaginatedResponse<Icd11Code> {
        let snapshot = self.store.snapshot();
        let mut hits = Vec::new();
        for t in code_types(code_type) {
            hits.extend(
                icd11_index(&snapshot, t)
                    .search(term)
                    .into_iter()
                    .filter_map(|code| snapshot.icd11(t, code)),
            );
        }

        SEARCHES_TOTAL.with_label_values(&["icd11", "search"]).inc();
        self.audit.search("ICD11", term, hits.len());
        PaginatedResponse::from_items(hits, self.limits.page(page, size))
    }

    /// Ranked prefix matches over ICD-11; partitions are merged by tier, then title
    pub fn autocomplete_icd11(
        &self,
        term: &str,
        code_type: Option<Icd11CodeType>,
        limit: Option<usize>,
    ) -> Vec<Icd11Code> {
        SEARCHES_TOTAL
            .with_label_values(&["icd11", "autocomplete"])
            .inc();
        if self.limits.too_short(term) {
            return Vec::new();
        }
        let limit = self.limits.autocomplete_limit(limit);
        let snapshot = self.store.snapshot();

        let mut ranked: Vec<(MatchTier, String, Icd11CodeType, String)> = Vec::new();
        for t in code_types(code_type) {
            for hit in icd11_index(&snapshot, t).autocomplete(term, limit) {
                ranked.push((hit.tier, hit.text_lc.to_string(), t, hit.code.to_string()));
            }
        }
        ranked.sort();
        ranked
            .into_iter()
            .take(limit)
            .filter_map(|(_, _, t, code)| snapshot.icd11(t, &code))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SystemUris;
    use crate::models::{NewIcd11Code, NewNamasteCode};

    fn service() -> SearchService {
        let store = Arc::new(TerminologyStore::new(SystemUris::default(), "1.0", "1.0"));
        let mut jvara = NewNamasteCode::new(TraditionalSystem::Ayurveda, "AAE-16", "Vataja jvara");
        jvara.definition = Some("Fever caused by vata".to_string());
        store
            .bulk_upsert_namaste(vec![
                jvara,
                NewNamasteCode::new(TraditionalSystem::Ayurveda, "AAE", "Jvara"),
                NewNamasteCode::new(TraditionalSystem::Siddha, "SI-1", "Suram"),
            ])
            .unwrap();
        store
            .bulk_upsert_icd11(vec![
                NewIcd11Code::new(Icd11CodeType::Tm2, "SK00", "Fever disorder (TM2)"),
                NewIcd11Code::new(Icd11CodeType::Biomedicine, "MG26", "Fever of other origin"),
            ])
            .unwrap();
        SearchService::new(store, SearchLimits::default(), AuditService::disabled())
    }

    #[test]
    fn search_is_case_insensitive_and_paged() {
        let search = service();
        let page = search.search_namaste("JVARA", None, None, Some(1));
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].code, "AAE");

        let by_definition = search.search_namaste("vata", None, None, None);
        assert_eq!(by_definition.total_elements, 1);

        let siddha = search.search_namaste("", Some(TraditionalSystem::Siddha), None, None);
        assert_eq!(siddha.total_elements, 1);

        let past_end = search.search_namaste("jvara", None, Some(5), None);
        assert!(past_end.content.is_empty());
    }

    #[test]
    fn short_terms_autocomplete_to_nothing() {
        let search = service();
        assert!(search.autocomplete_namaste("a", None).is_empty());
        assert!(search.autocomplete_icd11("f", None, None).is_empty());
        assert_eq!(search.autocomplete_namaste("aae", None)[0].code, "AAE");
    }

    #[test]
    fn icd11_merges_partitions_unless_narrowed() {
        let search = service();
        assert_eq!(search.search_icd11("fever", None, None, None).total_elements, 2);
        assert_eq!(
            search
                .search_icd11("fever", Some(Icd11CodeType::Tm2), None, None)
                .total_elements,
            1
        );
        let merged = search.autocomplete_icd11("fever", None, None);
        let codes: Vec<_> = merged.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["SK00", "MG26"]);
    }
}
