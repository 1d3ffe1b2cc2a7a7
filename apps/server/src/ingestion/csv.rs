//! CSV sources
//!
//! NAMASTE columns: `code, display, definition, system, category, subcategory,
//! who_terminology_code, icd11_tm2_code, icd11_biomedicine_code`.
//! ICD-11 columns: `code, title, definition, code_type, chapter, parent`.
//! The header row is skipped and short rows are ignored.

use super::{ensure_not_cancelled, Icd11Source, NamasteSource, ProgressSink};
use crate::models::{Icd11CodeType, NewIcd11Code, NewNamasteCode, TraditionalSystem};
use crate::{Error, Result};
use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::{Path, PathBuf};

const NAMASTE_MIN_COLUMNS: usize = 4;
const ICD11_MIN_COLUMNS: usize = 4;

fn cell(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn records<R: Read>(input: R) -> csv::StringRecordsIntoIter<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input)
        .into_records()
}

fn malformed(line: usize, err: csv::Error) -> Error {
    Error::Validation(format!("malformed CSV at line {line}: {err}"))
}

/// Parse NAMASTE rows. Unknown or blank systems default to AYURVEDA.
pub fn parse_namaste<R: Read>(
    input: R,
    progress: &dyn ProgressSink,
) -> Result<Vec<NewNamasteCode>> {
    let mut codes = Vec::new();
    for (i, row) in records(input).enumerate() {
        ensure_not_cancelled(progress)?;
        let line = i + 2;
        let record = row.map_err(|e| malformed(line, e))?;
        if record.len() < NAMASTE_MIN_COLUMNS {
            tracing::debug!(line, columns = record.len(), "Skipping short NAMASTE row");
            continue;
        }
        let (Some(code), Some(display)) = (cell(&record, 0), cell(&record, 1)) else {
            tracing::warn!(line, "Skipping NAMASTE row without code or display");
            continue;
        };
        let system = cell(&record, 3)
            .and_then(|s| TraditionalSystem::parse(&s))
            .unwrap_or(TraditionalSystem::Ayurveda);

        let mut input = NewNamasteCode::new(system, code, display);
        input.definition = cell(&record, 2);
        input.category = cell(&record, 4);
        input.subcategory = cell(&record, 5);
        input.who_terminology_code = cell(&record, 6);
        input.hints.icd11_tm2_code = cell(&record, 7);
        input.hints.icd11_biomedicine_code = cell(&record, 8);
        codes.push(input);
        progress.report(codes.len() as u64, None);
    }
    Ok(codes)
}

/// Parse ICD-11 rows. Unknown code types default to BIOMEDICINE.
pub fn parse_icd11<R: Read>(input: R, progress: &dyn ProgressSink) -> Result<Vec<NewIcd11Code>> {
    let mut codes = Vec::new();
    for (i, row) in records(input).enumerate() {
        ensure_not_cancelled(progress)?;
        let line = i + 2;
        let record = row.map_err(|e| malformed(line, e))?;
        if record.len() < ICD11_MIN_COLUMNS {
            tracing::debug!(line, columns = record.len(), "Skipping short ICD-11 row");
            continue;
        }
        let (Some(code), Some(title)) = (cell(&record, 0), cell(&record, 1)) else {
            tracing::warn!(line, "Skipping ICD-11 row without code or title");
            continue;
        };
        let code_type = cell(&record, 3)
            .and_then(|t| Icd11CodeType::parse(&t))
            .unwrap_or(Icd11CodeType::Biomedicine);

        let mut input = NewIcd11Code::new(code_type, code, title);
        input.definition = cell(&record, 2);
        input.chapter = cell(&record, 4);
        input.parent = cell(&record, 5);
        codes.push(input);
        progress.report(codes.len() as u64, None);
    }
    Ok(codes)
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| Error::Dependency(format!("cannot read {}: {e}", path.display())))
}

#[derive(Debug, Clone)]
pub struct CsvNamasteSource {
    path: PathBuf,
}

impl CsvNamasteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl NamasteSource for CsvNamasteSource {
    fn describe(&self) -> String {
        format!("namaste-csv:{}", self.path.display())
    }

    async fn fetch(&self, progress: &dyn ProgressSink) -> Result<Vec<NewNamasteCode>> {
        let bytes = read_file(&self.path).await?;
        let codes = parse_namaste(bytes.as_slice(), progress)?;
        tracing::info!(path = %self.path.display(), count = codes.len(), "Parsed NAMASTE CSV");
        Ok(codes)
    }
}

#[derive(Debug, Clone)]
pub struct CsvIcd11Source {
    path: PathBuf,
}

impl CsvIcd11Source {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Icd11Source for CsvIcd11Source {
    fn describe(&self) -> String {
        format!("icd11-csv:{}", self.path.display())
    }

    async fn fetch(&self, progress: &dyn ProgressSink) -> Result<Vec<NewIcd11Code>> {
        let bytes = read_file(&self.path).await?;
        let codes = parse_icd11(bytes.as_slice(), progress)?;
        tracing::info!(path = %self.path.display(), count = codes.len(), "Parsed ICD-11 CSV");
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::Untracked;
    use std::io::Write;

    const NAMASTE: &str = "\
code,display,definition,system,category,subcategory,who_terminology_code,icd11_tm2_code,icd11_biomedicine_code
AAE-16,Vataja jvara,Fever due to vata,AYURVEDA,Jvara,,ITA-5.1,SK00,MG26
SI-1,Suram,,siddha
UN-1,Humma,,somewhere
short,row
";

    #[test]
    fn namaste_rows_follow_the_column_contract() {
        let codes = parse_namaste(NAMASTE.as_bytes(), &Untracked).unwrap();
        assert_eq!(codes.len(), 3);

        let first = &codes[0];
        assert_eq!(first.code, "AAE-16");
        assert_eq!(first.definition.as_deref(), Some("Fever due to vata"));
        assert_eq!(first.subcategory, None);
        assert_eq!(first.who_terminology_code.as_deref(), Some("ITA-5.1"));
        assert_eq!(first.hints.icd11_tm2_code.as_deref(), Some("SK00"));
        assert_eq!(first.hints.icd11_biomedicine_code.as_deref(), Some("MG26"));

        assert_eq!(codes[1].system, Some(TraditionalSystem::Siddha));
        assert_eq!(codes[1].definition, None);
        assert_eq!(codes[2].system, Some(TraditionalSystem::Ayurveda));
    }

    #[test]
    fn icd11_rows_carry_type_chapter_and_parent() {
        let csv = "\
code,title,definition,code_type,chapter,parent
SK00,Fever disorder (TM2),,TM2,26,
SK01,Heat disorder (TM2),Too much heat,tm2,26,SK00
MG26,Fever of other origin,,BIOMEDICINE,21,
";
        let codes = parse_icd11(csv.as_bytes(), &Untracked).unwrap();
        assert_eq!(codes.len(), 3);
        assert_eq!(codes[1].code_type, Icd11CodeType::Tm2);
        assert_eq!(codes[1].parent.as_deref(), Some("SK00"));
        assert_eq!(codes[2].chapter.as_deref(), Some("21"));
    }

    struct Cancelled;

    impl ProgressSink for Cancelled {
        fn report(&self, _processed: u64, _total: Option<u64>) {}

        fn is_cancelled(&self) -> bool {
            true
        }
    }

    #[test]
    fn cancellation_stops_between_records() {
        let err = parse_namaste(NAMASTE.as_bytes(), &Cancelled).unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
    }

    #[tokio::test]
    async fn file_source_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(NAMASTE.as_bytes()).unwrap();
        let source = CsvNamasteSource::new(file.path());
        assert_eq!(source.fetch(&Untracked).await.unwrap().len(), 3);

        let missing = CsvNamasteSource::new("/nonexistent/namaste.csv");
        assert!(matches!(
            missing.fetch(&Untracked).await,
            Err(Error::Dependency(_))
        ));
    }
}
