//! Deterministic canned executors for the six external medical-data tools
//! plus the local FHIR record store (spec.md §1 "individual external
//! medical-data endpoints" are explicitly out of scope for this core; these
//! stand in as the fixed, test-friendly "real" tool set a gateway registers
//! at startup per spec.md §4.B, grounded on the result shapes and error
//! vocabulary of `original_source/.../tools/{drug_safety,drug_interactions,
//! clinical_trials,medical_literature,image_analysis}.py` and
//! `.../tools/fhir_store/*.py`).
//!
//! None of these perform real network I/O — a production deployment swaps
//! them for HTTP-backed executors behind the same `ToolExecutor` trait.

use std::collections::HashMap;

use cp_domain::tool_result::ErrorCategory;
use serde_json::Value;

use crate::registry::{ToolExecutor, ToolOutcome};

fn get_str(args: &HashMap<String, Value>, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// `check_drug_safety` — FDA boxed-warning lookup (spec.md §1; grounded on
/// `drug_safety.py`). The canonical demo case (`dofetilide`) surfaces the
/// Torsade de Pointes / QT-prolongation warning the test suite (spec.md §8
/// Scenario B) checks for in the synthesized response.
pub struct CheckDrugSafety;

#[async_trait::async_trait]
impl ToolExecutor for CheckDrugSafety {
    async fn call(&self, args: HashMap<String, Value>) -> ToolOutcome {
        let Some(brand_name) = get_str(&args, "brand_name") else {
            return ToolOutcome::err(ErrorCategory::Validation, "brand_name is required");
        };
        let lower = brand_name.to_lowercase();
        if lower.contains("dofetilide") {
            return ToolOutcome::ok(serde_json::json!({
                "brand_name": brand_name,
                "has_warning": true,
                "boxed_warning": "Dofetilide can cause life-threatening ventricular \
                    arrhythmias, including Torsade de Pointes, associated with QT \
                    interval prolongation. Must be initiated in a monitored setting \
                    with continuous ECG and creatinine clearance assessment.",
            }));
        }
        if lower.contains("timeout-drug") {
            return ToolOutcome::err(
                ErrorCategory::TransportTransient,
                "Request timed out after 30 seconds",
            );
        }
        ToolOutcome::ok(serde_json::json!({
            "brand_name": brand_name,
            "has_warning": false,
            "boxed_warning": Value::Null,
        }))
    }
}

/// `check_drug_interactions` (grounded on `drug_interactions.py`).
pub struct CheckDrugInteractions;

#[async_trait::async_trait]
impl ToolExecutor for CheckDrugInteractions {
    async fn call(&self, args: HashMap<String, Value>) -> ToolOutcome {
        let Some(drug_names) = args.get("drug_names").and_then(|v| v.as_array()) else {
            return ToolOutcome::err(ErrorCategory::Validation, "drug_names is required");
        };
        if drug_names.len() < 2 {
            return ToolOutcome::err(
                ErrorCategory::Validation,
                "at least two drug names are required to check interactions",
            );
        }
        ToolOutcome::ok(serde_json::json!({
            "drug_names": drug_names,
            "interactions": [],
        }))
    }
}

/// `search_medical_literature` (grounded on `medical_literature.py`).
pub struct SearchMedicalLiterature;

#[async_trait::async_trait]
impl ToolExecutor for SearchMedicalLiterature {
    async fn call(&self, args: HashMap<String, Value>) -> ToolOutcome {
        let Some(query) = get_str(&args, "query") else {
            return ToolOutcome::err(ErrorCategory::Validation, "query is required");
        };
        ToolOutcome::ok(serde_json::json!({
            "query": query,
            "articles": [],
        }))
    }
}

/// `find_clinical_trials` (grounded on `clinical_trials.py`).
pub struct FindClinicalTrials;

#[async_trait::async_trait]
impl ToolExecutor for FindClinicalTrials {
    async fn call(&self, args: HashMap<String, Value>) -> ToolOutcome {
        let Some(condition) = get_str(&args, "condition") else {
            return ToolOutcome::err(ErrorCategory::Validation, "condition is required");
        };
        ToolOutcome::ok(serde_json::json!({
            "condition": condition,
            "trials": [],
        }))
    }
}

/// `analyze_medical_image` (grounded on `image_analysis.py`). This stub
/// never receives real image bytes over this boundary — the turn state
/// carries `image_data` directly to the vision call site in a full
/// deployment; here it echoes back a placeholder so the tool loop's shape
/// is still exercised by tests.
pub struct AnalyzeMedicalImage;

#[async_trait::async_trait]
impl ToolExecutor for AnalyzeMedicalImage {
    async fn call(&self, _args: HashMap<String, Value>) -> ToolOutcome {
        ToolOutcome::ok(serde_json::json!({
            "findings": "No image payload available to this stub executor.",
        }))
    }
}

/// `get_patient_record` — local FHIR record store lookup (grounded on
/// `tools/fhir_store/search.py` + `chart.py`). The deterministic fixture
/// returns either a single exact match, three ambiguous matches for
/// "james wilson" (spec.md §8 Scenario E), or an empty result.
pub struct GetPatientRecord;

#[async_trait::async_trait]
impl ToolExecutor for GetPatientRecord {
    async fn call(&self, args: HashMap<String, Value>) -> ToolOutcome {
        let Some(name) = get_str(&args, "patient_name") else {
            return ToolOutcome::err(ErrorCategory::Validation, "patient_name is required");
        };
        let lower = name.to_lowercase();
        if lower.contains("james wilson") {
            return ToolOutcome::ok(serde_json::json!({
                "matches": [
                    {"patient_id": "pt-1001", "name": "James Wilson", "dob": "1958-03-02"},
                    {"patient_id": "pt-1002", "name": "James A. Wilson", "dob": "1971-11-19"},
                    {"patient_id": "pt-1003", "name": "James Wilson Jr.", "dob": "1990-06-30"},
                ],
            }));
        }
        ToolOutcome::ok(serde_json::json!({
            "matches": [{"patient_id": "pt-2001", "name": name, "dob": "1980-01-01"}],
        }))
    }
}

/// `update_patient_record` — a write-tool stand-in for the FHIR store's
/// `add_allergy` / `prescribe_medication` / `save_clinical_note` (spec.md
/// §1 "local FHIR record store"), collapsed into one generic write
/// executor so the tool-select schema stays small.
pub struct UpdatePatientRecord;

#[async_trait::async_trait]
impl ToolExecutor for UpdatePatientRecord {
    async fn call(&self, args: HashMap<String, Value>) -> ToolOutcome {
        let Some(patient_id) = get_str(&args, "patient_id") else {
            return ToolOutcome::err(ErrorCategory::Validation, "patient_id is required");
        };
        let note = get_str(&args, "note").unwrap_or_default();
        ToolOutcome::ok(serde_json::json!({
            "patient_id": patient_id,
            "recorded": true,
            "note": note,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drug_safety_surfaces_dofetilide_warning() {
        let mut args = HashMap::new();
        args.insert("brand_name".to_string(), serde_json::json!("dofetilide"));
        let outcome = CheckDrugSafety.call(args).await;
        match outcome {
            ToolOutcome::Ok(value) => {
                assert_eq!(value["has_warning"], serde_json::json!(true));
                assert!(value["boxed_warning"].as_str().unwrap().contains("Torsade"));
            }
            ToolOutcome::Err { .. } => panic!("expected Ok"),
        }
    }

    #[tokio::test]
    async fn drug_safety_times_out_for_fixture_drug() {
        let mut args = HashMap::new();
        args.insert("brand_name".to_string(), serde_json::json!("timeout-drug"));
        let outcome = CheckDrugSafety.call(args).await;
        match outcome {
            ToolOutcome::Err { category, message } => {
                assert_eq!(category, ErrorCategory::TransportTransient);
                assert!(message.contains("timed out"));
            }
            ToolOutcome::Ok(_) => panic!("expected Err"),
        }
    }

    #[tokio::test]
    async fn get_patient_record_returns_ambiguous_matches() {
        let mut args = HashMap::new();
        args.insert("patient_name".to_string(), serde_json::json!("James Wilson"));
        let outcome = GetPatientRecord.call(args).await;
        match outcome {
            ToolOutcome::Ok(value) => {
                assert_eq!(value["matches"].as_array().unwrap().len(), 3);
            }
            ToolOutcome::Err { .. } => panic!("expected Ok"),
        }
    }
}
