use ayush_terminology::models::{
    CreateMappingRequest, Equivalence, Icd11CodeType, NewIcd11Code, NewNamasteCode,
    TraditionalSystem,
};
use ayush_terminology::AppState;
use serde_json::{json, Value};

/// Canonical system URIs of the default configuration
pub mod systems {
    pub const NAMASTE: &str = "https://ayush.gov.in/fhir/CodeSystem/namaste";
    pub const TM2: &str = "http://id.who.int/icd/release/11/mms/tm2";
    pub const BIOMEDICINE: &str = "http://id.who.int/icd/release/11/mms";
}

/// Registry contents shared by most tests:
///
/// * AAE-16 (Ayurveda) -EQUIVALENT 0.9-> SK00 (TM2) -EQUIVALENT 0.95-> MG26
/// * SI-1 (Siddha) -UNMATCHED-> SK01
/// * UN-7 (Unani) has no mappings
pub async fn seed(state: &AppState) -> anyhow::Result<()> {
    let mut vataja = NewNamasteCode::new(TraditionalSystem::Ayurveda, "AAE-16", "Vataja jvara");
    vataja.definition = Some("Fever due to vata".to_string());
    vataja.category = Some("Jvara".to_string());
    vataja.who_terminology_code = Some("ITA-5.1".to_string());

    let mut suram = NewNamasteCode::new(TraditionalSystem::Siddha, "SI-1", "Suram");
    suram.category = Some("Suram".to_string());

    let humma = NewNamasteCode::new(TraditionalSystem::Unani, "UN-7", "Humma");

    state
        .registry
        .load_namaste("fixtures", vec![vataja, suram, humma])?;

    let mut fever = NewIcd11Code::new(Icd11CodeType::Tm2, "SK00", "Fever disorder (TM2)");
    fever.chapter = Some("26".to_string());
    let mut heat = NewIcd11Code::new(Icd11CodeType::Tm2, "SK01", "Heat pattern (TM2)");
    heat.chapter = Some("26".to_string());
    heat.parent = Some("SK00".to_string());
    let mut unknown_origin = NewIcd11Code::new(
        Icd11CodeType::Biomedicine,
        "MG26",
        "Fever of other or unknown origin",
    );
    unknown_origin.chapter = Some("21".to_string());

    state
        .registry
        .load_icd11("fixtures", vec![fever, heat, unknown_origin])?;

    state
        .mappings
        .create(mapping(
            (systems::NAMASTE, "AAE-16"),
            (systems::TM2, "SK00"),
            Equivalence::Equivalent,
            0.9,
        ))
        .await?;
    state
        .mappings
        .create(mapping(
            (systems::TM2, "SK00"),
            (systems::BIOMEDICINE, "MG26"),
            Equivalence::Equivalent,
            0.95,
        ))
        .await?;
    state
        .mappings
        .create(mapping(
            (systems::NAMASTE, "SI-1"),
            (systems::TM2, "SK01"),
            Equivalence::Unmatched,
            1.0,
        ))
        .await?;
    Ok(())
}

pub fn mapping(
    source: (&str, &str),
    target: (&str, &str),
    equivalence: Equivalence,
    confidence: f64,
) -> CreateMappingRequest {
    CreateMappingRequest {
        source_system: source.0.to_string(),
        source_code: source.1.to_string(),
        target_system: target.0.to_string(),
        target_code: target.1.to_string(),
        equivalence,
        comment: None,
        confidence_score: Some(confidence),
        mapping_version: None,
    }
}

/// JSON body of `POST /terminology/mapping`
pub fn mapping_body(source_code: &str, target_code: &str, equivalence: &str) -> Value {
    json!({
        "sourceSystem": systems::NAMASTE,
        "sourceCode": source_code,
        "targetSystem": systems::TM2,
        "targetCode": target_code,
        "equivalence": equivalence,
        "confidenceScore": 0.7
    })
}

/// JSON body of `POST /fhir/Condition`
pub fn condition_body(namaste_code: &str, patient_id: &str) -> Value {
    json!({
        "namasteCode": namaste_code,
        "patientId": patient_id,
        "onsetDate": "2024-03-01",
        "notes": "Evening fever for three days"
    })
}

/// A Condition carrying a single NAMASTE coding
pub fn namaste_condition(code: &str, patient_id: &str) -> Value {
    json!({
        "resourceType": "Condition",
        "subject": { "reference": format!("Patient/{patient_id}") },
        "code": {
            "coding": [{ "system": systems::NAMASTE, "code": code }],
            "text": "Fever"
        }
    })
}

/// CSV in the NAMASTE ingestion layout
pub const NAMASTE_CSV: &str = "\
code,display,definition,system,category,subcategory,who_terminology_code,icd11_tm2_code,icd11_biomedicine_code
AAE-16,Vataja jvara,Fever due to vata,AYURVEDA,Jvara,,ITA-5.1,SK00,MG26
AAE-17,Pittaja jvara,Fever due to pitta,AYURVEDA,Jvara,,,SK01,
SI-1,Suram,,SIDDHA
";
