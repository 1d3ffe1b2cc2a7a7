//! Derived shortcut table: best usable ICD-11 target per NAMASTE code

use super::graph::GraphState;
use super::registry::RegistryState;
use super::systems::SystemUris;
use crate::models::Icd11CodeType;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutTarget {
    pub code: String,
    pub display: Option<String>,
    pub mapping_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shortcut {
    pub tm2: Option<ShortcutTarget>,
    pub biomedicine: Option<ShortcutTarget>,
}

impl Shortcut {
    pub fn is_empty(&self) -> bool {
        self.tm2.is_none() && self.biomedicine.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShortcutTable {
    entries: HashMap<String, Shortcut>,
}

impl ShortcutTable {
    pub fn get(&self, namaste_code: &str) -> Option<&Shortcut> {
        self.entries.get(namaste_code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute the entry of one NAMASTE code from its current edges
    pub fn recompute(
        &mut self,
        namaste_code: &str,
        systems: &SystemUris,
        registry: &RegistryState,
        graph: &GraphState,
    ) {
        let edges = graph.edges_from(&systems.namaste, namaste_code);
        let best = |code_type: Icd11CodeType| {
            let target_system = systems.icd11_uri(code_type);
            edges
                .iter()
                .find(|m| m.target_system == target_system && m.equivalence.is_usable())
                .map(|m| ShortcutTarget {
                    code: m.target_code.clone(),
                    display: registry
                        .icd11(code_type, &m.target_code)
                        .map(|c| c.title.clone()),
                    mapping_id: m.id,
                })
        };

        let shortcut = Shortcut {
            tm2: best(Icd11CodeType::Tm2),
            biomedicine: best(Icd11CodeType::Biomedicine),
        };

        if shortcut.is_empty() {
            self.entries.remove(namaste_code);
        } else {
            self.entries.insert(namaste_code.to_string(), shortcut);
        }
    }

    /// Recompute every NAMASTE code with an edge to the given ICD-11 code
    pub fn recompute_referencing(
        &mut self,
        code_type: Icd11CodeType,
        icd_code: &str,
        systems: &SystemUris,
        registry: &RegistryState,
        graph: &GraphState,
    ) {
        let sources: Vec<String> = graph
            .edges_to(systems.icd11_uri(code_type), icd_code)
            .iter()
            .filter(|m| m.source_system == systems.namaste)
            .map(|m| m.source_code.clone())
            .collect();
        for source in sources {
            self.recompute(&source, systems, registry, graph);
        }
    }
}
