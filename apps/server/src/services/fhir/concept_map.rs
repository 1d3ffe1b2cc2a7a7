use super::FhirSettings;
use crate::db::{edge_order, Snapshot};
use crate::models::{ConceptMapping, Equivalence};
use ayush_fhir_models::{
    ConceptMap, ConceptMapElement, ConceptMapGroup, ConceptMapTarget, PublicationStatus,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const CONCEPT_MAP_ID: &str = "namaste-to-icd11";

type Groups<'a> = BTreeMap<(&'a str, &'a str), BTreeMap<&'a str, Vec<&'a Arc<ConceptMapping>>>>;

/// One group per `(sourceSystem, targetSystem)` pair, one element per source code,
/// one target per mapping. UNMATCHED mappings are left out.
pub fn namaste_to_icd11(snapshot: &Snapshot, settings: &FhirSettings) -> ConceptMap {
    let systems = snapshot.systems();
    let mut cm = ConceptMap::new(settings.url("ConceptMap/namaste-to-icd11"), PublicationStatus::Active);
    cm.id = Some(CONCEPT_MAP_ID.to_string());
    cm.version = Some(settings.mapping_version.clone());
    cm.name = Some("NAMASTEToICD11".to_string());
    cm.title = Some("NAMASTE to ICD-11 Concept Mapping".to_string());
    cm.date = Some(settings.now());
    cm.publisher = Some(settings.publisher.clone());
    cm.description =
        Some("Mappings between NAMASTE codes and ICD-11 TM2 and biomedicine codes".to_string());
    cm.source_uri = Some(systems.namaste.clone());
    cm.target_uri = Some(systems.biomedicine.clone());

    let mut groups: Groups<'_> = BTreeMap::new();
    for mapping in snapshot.mappings() {
        if mapping.equivalence == Equivalence::Unmatched {
            continue;
        }
        groups
            .entry((mapping.source_system.as_str(), mapping.target_system.as_str()))
            .or_default()
            .entry(mapping.source_code.as_str())
            .or_default()
            .push(mapping);
    }

    for ((source, target), elements) in groups {
        let element = elements
            .into_iter()
            .map(|(code, mut mappings)| {
                mappings.sort_by(|a, b| edge_order(a, b));
                ConceptMapElement {
                    code: Some(code.to_string()),
                    display: snapshot.display_of(source, code),
                    target: mappings
                        .into_iter()
                        .map(|m| ConceptMapTarget {
                            code: Some(m.target_code.clone()),
                            display: snapshot.display_of(target, &m.target_code),
                            equivalence: m.equivalence.fhir_code().to_string(),
                            comment: m.comment.clone(),
                        })
                        .collect(),
                }
            })
            .collect();
        cm.group.push(ConceptMapGroup {
            source: Some(source.to_string()),
            target: Some(target.to_string()),
            element,
        });
    }
    cm
}
