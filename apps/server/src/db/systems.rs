use crate::config::TerminologyConfig;
use crate::models::{Icd11CodeType, Vocabulary};

/// Canonical URIs of the three vocabularies the server knows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemUris {
    pub namaste: String,
    pub tm2: String,
    pub biomedicine: String,
}

impl SystemUris {
    pub fn from_config(config: &TerminologyConfig) -> Self {
        Self {
            namaste: config.namaste_system.clone(),
            tm2: config.tm2_system.clone(),
            biomedicine: config.biomedicine_system.clone(),
        }
    }

    pub fn vocabulary(&self, uri: &str) -> Option<Vocabulary> {
        let uri = uri.trim();
        if uri == self.namaste {
            Some(Vocabulary::Namaste)
        } else if uri == self.tm2 {
            Some(Vocabulary::Icd11(Icd11CodeType::Tm2))
        } else if uri == self.biomedicine {
            Some(Vocabulary::Icd11(Icd11CodeType::Biomedicine))
        } else {
            None
        }
    }

    pub fn uri(&self, vocabulary: Vocabulary) -> &str {
        match vocabulary {
            Vocabulary::Namaste => &self.namaste,
            Vocabulary::Icd11(Icd11CodeType::Tm2) => &self.tm2,
            Vocabulary::Icd11(Icd11CodeType::Biomedicine) => &self.biomedicine,
        }
    }

    pub fn icd11_uri(&self, code_type: Icd11CodeType) -> &str {
        self.uri(Vocabulary::Icd11(code_type))
    }
}

impl Default for SystemUris {
    fn default() -> Self {
        Self::from_config(&TerminologyConfig::default())
    }
}
