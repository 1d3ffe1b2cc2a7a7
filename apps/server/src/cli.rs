//! Operator console
//!
//! One-shot commands against a freshly loaded in-memory registry: search,
//! translation, statistics, dual-coded Condition creation and mapping
//! generation. Output goes to any `Write` so the commands can be driven from
//! tests.

use crate::models::{CreateConditionRequest, Icd11CodeType, TraditionalSystem, TranslationMatch};
use crate::services::ConditionCategory;
use crate::state::AppState;
use crate::Config;
use anyhow::{anyhow, Result};
use ayush_fhir_models::Resource;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(name = "terminology-cli")]
#[clap(about = "Query and maintain the NAMASTE <-> ICD-11 terminology from the command line")]
pub struct CliArgs {
    /// Config file (yaml, toml or json); defaults to ./config.* when present
    #[clap(short, long)]
    pub config: Option<String>,

    /// NAMASTE CSV to load, overriding ingestion.namaste_csv
    #[clap(long)]
    pub namaste_csv: Option<PathBuf>,

    /// ICD-11 CSV to load, overriding ingestion.icd11_csv
    #[clap(long)]
    pub icd11_csv: Option<PathBuf>,

    /// Start from an empty registry
    #[clap(long)]
    pub no_load: bool,

    #[clap(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// Apply the source overrides on top of the loaded config
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.namaste_csv {
            config.ingestion.namaste_csv = Some(path.clone());
        }
        if let Some(path) = &self.icd11_csv {
            config.ingestion.icd11_csv = Some(path.clone());
        }
        config.ingestion.load_on_startup = !self.no_load;
    }
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Search NAMASTE codes by code, display or definition
    SearchNamaste {
        term: String,
        /// AYURVEDA, SIDDHA or UNANI
        #[clap(long)]
        system: Option<String>,
        #[clap(long, default_value = "0")]
        page: usize,
        #[clap(long, default_value = "10")]
        size: usize,
    },
    /// Search ICD-11 codes by code, title or definition
    SearchIcd11 {
        term: String,
        /// TM2 or BIOMEDICINE
        #[clap(long)]
        code_type: Option<String>,
        #[clap(long, default_value = "0")]
        page: usize,
        #[clap(long, default_value = "10")]
        size: usize,
    },
    /// Translate a NAMASTE code to ICD-11 TM2
    TranslateTm2 { code: String },
    /// Translate a NAMASTE code to ICD-11 biomedicine
    TranslateBiomedicine { code: String },
    /// Registry and mapping counts
    Stats,
    /// Create a dual-coded Condition and print it as FHIR JSON
    CreateCondition {
        namaste_code: String,
        patient_id: String,
        /// YYYY-MM-DD
        #[clap(long)]
        onset_date: Option<String>,
        #[clap(long)]
        notes: Option<String>,
    },
    /// Create mappings from the crosswalk hints of loaded NAMASTE codes
    GenerateMappings,
}

fn traditional_system(raw: Option<&str>) -> Result<Option<TraditionalSystem>> {
    raw.map(|s| TraditionalSystem::parse(s).ok_or_else(|| anyhow!("unknown traditional system '{s}'")))
        .transpose()
}

fn code_type(raw: Option<&str>) -> Result<Option<Icd11CodeType>> {
    raw.map(|s| Icd11CodeType::parse(s).ok_or_else(|| anyhow!("unknown ICD-11 code type '{s}'")))
        .transpose()
}

fn write_matches(out: &mut dyn Write, code: &str, matches: &[TranslationMatch]) -> Result<()> {
    if matches.is_empty() {
        writeln!(out, "No mappings found for code: {code}")?;
        return Ok(());
    }
    for m in matches {
        write!(
            out,
            "Target Code: {} | Equivalence: {} | Confidence: {:.2}",
            m.target_code,
            m.equivalence.fhir_code(),
            m.confidence_score
        )?;
        match &m.via {
            Some(hop) => writeln!(out, " | Via: {}", hop.code)?,
            None => writeln!(out)?,
        }
        if let Some(comment) = &m.comment {
            writeln!(out, "Comment: {comment}")?;
        }
    }
    Ok(())
}

/// Run one command against `state`
pub async fn run(state: &AppState, command: Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::SearchNamaste {
            term,
            system,
            page,
            size,
        } => {
            let system = traditional_system(system.as_deref())?;
            let results = state
                .search
                .search_namaste(&term, system, Some(page), Some(size));
            writeln!(out, "NAMASTE Search Results:")?;
            if results.content.is_empty() {
                writeln!(out, "No results found.")?;
            }
            for code in &results.content {
                writeln!(
                    out,
                    "Code: {} | Display: {} | System: {}",
                    code.code, code.display, code.system
                )?;
                if let Some(definition) = &code.definition {
                    writeln!(out, "Definition: {definition}")?;
                }
            }
            writeln!(
                out,
                "Showing {} of {} total results",
                results.number_of_elements, results.total_elements
            )?;
        }
        Command::SearchIcd11 {
            term,
            code_type: raw_type,
            page,
            size,
        } => {
            let code_type = code_type(raw_type.as_deref())?;
            let results = state
                .search
                .search_icd11(&term, code_type, Some(page), Some(size));
            writeln!(out, "ICD-11 Search Results:")?;
            if results.content.is_empty() {
                writeln!(out, "No results found.")?;
            }
            for code in &results.content {
                writeln!(
                    out,
                    "Code: {} | Title: {} | Type: {}",
                    code.code, code.title, code.code_type
                )?;
                if let Some(definition) = &code.definition {
                    writeln!(out, "Definition: {definition}")?;
                }
            }
            writeln!(
                out,
                "Showing {} of {} total results",
                results.number_of_elements, results.total_elements
            )?;
        }
        Command::TranslateTm2 { code } => {
            let matches = state.translation.namaste_to_tm2(&code)?;
            writeln!(out, "Translation Results (NAMASTE -> TM2):")?;
            write_matches(out, &code, &matches)?;
        }
        Command::TranslateBiomedicine { code } => {
            let matches = state.translation.namaste_to_biomedicine(&code)?;
            writeln!(out, "Translation Results (NAMASTE -> Biomedicine):")?;
            write_matches(out, &code, &matches)?;
        }
        Command::Stats => {
            let stats = state.registry.stats();
            writeln!(out, "NAMASTE Codes: {}", stats.namaste_code_count)?;
            writeln!(out, "  - Ayurveda: {}", stats.ayurveda_count)?;
            writeln!(out, "  - Siddha: {}", stats.siddha_count)?;
            writeln!(out, "  - Unani: {}", stats.unani_count)?;
            writeln!(out, "ICD-11 Codes: {}", stats.icd11_code_count)?;
            writeln!(out, "  - TM2: {}", stats.tm2_count)?;
            writeln!(out, "  - Biomedicine: {}", stats.biomedicine_count)?;
            writeln!(out, "Total Mappings: {}", stats.mapping_count)?;
        }
        Command::CreateCondition {
            namaste_code,
            patient_id,
            onset_date,
            notes,
        } => {
            let mut request = CreateConditionRequest::new(namaste_code, patient_id);
            request.onset_date = onset_date;
            request.notes = notes;
            let condition = state
                .dual_coding
                .create_condition(request, ConditionCategory::EncounterDiagnosis)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&condition.to_value()?)?)?;
        }
        Command::GenerateMappings => {
            let batch = state.generator.generate().await?;
            writeln!(
                out,
                "Mapping generation finished: {} created, {} already mapped, {} skipped",
                batch.created, batch.already_mapped, batch.skipped
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewIcd11Code, NewNamasteCode};

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("terminology-cli").chain(args.iter().copied()))
            .unwrap()
    }

    fn seeded() -> AppState {
        let state = AppState::with_sources(Config::default(), None, None);
        let mut hinted = NewNamasteCode::new(TraditionalSystem::Ayurveda, "AAE-16", "Vataja jvara");
        hinted.definition = Some("Fever due to vata".to_string());
        hinted.hints.icd11_tm2_code = Some("SK00".to_string());
        state
            .store
            .bulk_upsert_namaste(vec![
                hinted,
                NewNamasteCode::new(TraditionalSystem::Siddha, "SI-1", "Suram"),
            ])
            .unwrap();
        state
            .store
            .bulk_upsert_icd11(vec![
                NewIcd11Code::new(Icd11CodeType::Tm2, "SK00", "Fever disorder (TM2)"),
                NewIcd11Code::new(Icd11CodeType::Biomedicine, "MG26", "Fever of other origin"),
            ])
            .unwrap();
        state
    }

    async fn output(state: &AppState, args: &[&str]) -> String {
        let mut out = Vec::new();
        run(state, parse(args).command, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_subcommands_and_overrides() {
        let args = parse(&[
            "--namaste-csv",
            "data/namaste.csv",
            "--no-load",
            "search-icd11",
            "fever",
            "--code-type",
            "TM2",
            "--size",
            "5",
        ]);
        assert_eq!(
            args.command,
            Command::SearchIcd11 {
                term: "fever".to_string(),
                code_type: Some("TM2".to_string()),
                page: 0,
                size: 5,
            }
        );

        let mut config = Config::default();
        config.ingestion.load_on_startup = true;
        args.apply(&mut config);
        assert_eq!(config.ingestion.namaste_csv, Some(PathBuf::from("data/namaste.csv")));
        assert!(!config.ingestion.load_on_startup);

        assert_eq!(
            parse(&["create-condition", "AAE-16", "p1", "--onset-date", "2024-03-01"]).command,
            Command::CreateCondition {
                namaste_code: "AAE-16".to_string(),
                patient_id: "p1".to_string(),
                onset_date: Some("2024-03-01".to_string()),
                notes: None,
            }
        );
        assert!(CliArgs::try_parse_from(["terminology-cli", "translate-tm2"]).is_err());
        assert!(CliArgs::try_parse_from(["terminology-cli", "frobnicate"]).is_err());
    }

    #[tokio::test]
    async fn generate_then_translate() {
        let state = seeded();
        let before = output(&state, &["translate-tm2", "AAE-16"]).await;
        assert!(before.contains("No mappings found for code: AAE-16"));

        let generated = output(&state, &["generate-mappings"]).await;
        assert!(generated.contains("1 created"));

        let after = output(&state, &["translate-tm2", "AAE-16"]).await;
        assert!(after.contains("Target Code: SK00 | Equivalence: equivalent | Confidence: 0.80"));

        let stats = output(&state, &["stats"]).await;
        assert!(stats.contains("NAMASTE Codes: 2"));
        assert!(stats.contains("  - Siddha: 1"));
        assert!(stats.contains("Total Mappings: 1"));
    }

    #[tokio::test]
    async fn searches_print_rows_and_totals() {
        let state = seeded();
        let namaste = output(&state, &["search-namaste", "jvara"]).await;
        assert!(namaste.contains("Code: AAE-16 | Display: Vataja jvara"));
        assert!(namaste.contains("Definition: Fever due to vata"));
        assert!(namaste.contains("Showing 1 of 1 total results"));

        let icd = output(&state, &["search-icd11", "fever", "--code-type", "biomedicine"]).await;
        assert!(icd.contains("Code: MG26"));
        assert!(!icd.contains("SK00"));

        let none = output(&state, &["search-namaste", "zzz"]).await;
        assert!(none.contains("No results found."));
    }

    #[tokio::test]
    async fn condition_is_printed_as_fhir_json() {
        let state = seeded();
        let json = output(&state, &["create-condition", "SI-1", "p7"]).await;
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["resourceType"], "Condition");
        assert_eq!(value["subject"]["reference"], "Patient/p7");
        assert_eq!(value["code"]["coding"][0]["code"], "SI-1");
    }

    #[tokio::test]
    async fn bad_arguments_surface_as_errors() {
        let state = seeded();
        let mut out = Vec::new();
        let unknown_system = run(
            &state,
            parse(&["search-namaste", "jvara", "--system", "homeopathy"]).command,
            &mut out,
        )
        .await;
        assert!(unknown_system.is_err());

        let missing = run(&state, parse(&["create-condition", "NOPE-1", "p1"]).command, &mut out).await;
        assert!(missing.is_err());
    }
}
