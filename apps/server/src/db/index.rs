//! In-memory search index, rebuilt per vocabulary on registry writes

use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Row {
    code: String,
    code_lc: String,
    text_lc: String,
    definition_lc: Option<String>,
}

/// Autocomplete match tier. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    ExactCode = 0,
    DisplayPrefix = 1,
    CodePrefix = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit<'a> {
    pub tier: MatchTier,
    pub code: &'a str,
    pub text_lc: &'a str,
}

/// Sorted views over one vocabulary
#[derive(Debug, Clone, Default)]
pub struct VocabIndex {
    /// Sorted by lower-cased code, then code
    rows: Vec<Row>,
    /// Row positions sorted by lower-cased display/title, then code
    by_text: Vec<usize>,
}

impl VocabIndex {
    /// Build from `(code, display, definition)` triples
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, Option<&'a str>)>,
    {
        let mut rows: Vec<Row> = entries
            .into_iter()
            .map(|(code, text, definition)| Row {
                code: code.to_string(),
                code_lc: code.to_lowercase(),
                text_lc: text.to_lowercase(),
                definition_lc: definition.map(str::to_lowercase),
            })
            .collect();
        rows.sort_by(|a, b| a.code_lc.cmp(&b.code_lc).then_with(|| a.code.cmp(&b.code)));

        let mut by_text: Vec<usize> = (0..rows.len()).collect();
        by_text.sort_by(|&a, &b| {
            rows[a]
                .text_lc
                .cmp(&rows[b].text_lc)
                .then_with(|| rows[a].code.cmp(&rows[b].code))
        });

        Self { rows, by_text }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Codes whose code, display or definition contains `term`, in code order.
    /// A blank term matches everything.
    pub fn search(&self, term: &str) -> Vec<&str> {
        let needle = term.trim().to_lowercase();
        self.rows
            .iter()
            .filter(|row| {
                needle.is_empty()
                    || row.code_lc.contains(&needle)
                    || row.text_lc.contains(&needle)
                    || row
                        .definition_lc
                        .as_deref()
                        .map_or(false, |d| d.contains(&needle))
            })
            .map(|row| row.code.as_str())
            .collect()
    }

    /// Prefix matches ranked exact code, then display prefix, then code prefix.
    /// Within a tier hits are alphabetical by display.
    pub fn autocomplete(&self, term: &str, limit: usize) -> Vec<Hit<'_>> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut seen: HashSet<usize> = HashSet::new();
        let mut hits: Vec<(MatchTier, usize)> = Vec::new();

        let code_start = self.rows.partition_point(|r| r.code_lc.as_str() < needle.as_str());
        for (offset, row) in self.rows[code_start..].iter().enumerate() {
            if row.code_lc != needle {
                break;
            }
            if seen.insert(code_start + offset) {
                hits.push((MatchTier::ExactCode, code_start + offset));
            }
        }

        let text_start = self
            .by_text
            .partition_point(|&i| self.rows[i].text_lc.as_str() < needle.as_str());
        for &i in &self.by_text[text_start..] {
            if !self.rows[i].text_lc.starts_with(&needle) {
                break;
            }
            if seen.insert(i) {
                hits.push((MatchTier::DisplayPrefix, i));
            }
        }

        let mut code_prefix: Vec<usize> = Vec::new();
        for (offset, row) in self.rows[code_start..].iter().enumerate() {
            if !row.code_lc.starts_with(&needle) {
                break;
            }
            if seen.insert(code_start + offset) {
                code_prefix.push(code_start + offset);
            }
        }
        code_prefix.sort_by(|&a, &b| {
            self.rows[a]
                .text_lc
                .cmp(&self.rows[b].text_lc)
                .then_with(|| self.rows[a].code.cmp(&self.rows[b].code))
        });
        hits.extend(code_prefix.into_iter().map(|i| (MatchTier::CodePrefix, i)));

        hits.into_iter()
            .take(limit)
            .map(|(tier, i)| Hit {
                tier,
                code: &self.rows[i].code,
                text_lc: &self.rows[i].text_lc,
            })
            .collect()
    }
}

/// One index per vocabulary partition
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    pub namaste: Arc<VocabIndex>,
    pub tm2: Arc<VocabIndex>,
    pub biomedicine: Arc<VocabIndex>,
}
