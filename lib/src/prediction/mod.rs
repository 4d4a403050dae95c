//! Delivery-mode prediction adapter.
//!
//! The predictor is an injected async capability so the record service and
//! its tests never depend on an actual external process. The bundled
//! implementation shells out to the ML script with a bounded timeout.

pub mod script_predictor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use models::{AppResult, PatientRecord};

pub use script_predictor::ScriptPredictor;

/// Result document produced by the predictor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    #[serde(default = "default_result")]
    pub prediction_result: String,
    #[serde(default)]
    pub confidence_score: f64,
}

fn default_result() -> String {
    "Error: No result".to_string()
}

#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, features: Value) -> AppResult<Prediction>;
}

/// The model was trained before the forceps/vacuum distinction was dropped;
/// clinically both surface as an assisted delivery. The rename is a business
/// rule and must survive model retraining.
pub fn canonicalize_label(label: &str) -> String {
    if label.eq_ignore_ascii_case("forceps") {
        "Assisted".to_string()
    } else {
        label.to_string()
    }
}

/// Flattens a record into the feature map the ML script expects. Key names
/// and value shapes (Yes/No strings, numeric vitals) are the script's input
/// contract.
pub fn feature_map(record: &PatientRecord) -> Value {
    json!({
        "age": record.age,
        "height": record.height,
        "weight": record.weight,
        "bmi": record.bmi,

        "previous_cesarean": record.previous_cesarean,
        "previous_vaginal_birth": record.previous_vaginal_birth,
        "previous_assisted": record.previous_assisted,
        "bishop_score": record.bishop_score,

        "gestational_age": record.gestational_age,
        "gestational_diabetes": record.gestational_diabetes,
        "hypertension": record.hypertension,

        "fetal_presentation": record.fetal_presentation,

        "estimated_fetal_weight": record.estimated_fetal_weight,
        "amniotic_fluid_index": record.amniotic_fluid_index,

        "induction_of_labor": record.induction_of_labor,
        "oxytocin_augmentation": record.oxytocin_augmentation,

        "bp_systolic": record.bp_systolic,
        "bp_diastolic": record.bp_diastolic,
        "glucoseLevel": record.glucose_level,

        "prior_shoulder_dystocia": record.prior_shoulder_dystocia,
        "placenta_location": record.placenta_location,
        "fetal_heart_rate_category": record.fetal_heart_rate_category,
        "cervical_dilation": record.cervical_dilation,
        "fetal_station": record.fetal_station,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::NewPatientData;
    use uuid::Uuid;

    #[test]
    fn should_canonicalize_forceps_to_assisted() {
        assert_eq!(canonicalize_label("forceps"), "Assisted");
        assert_eq!(canonicalize_label("Forceps"), "Assisted");
        assert_eq!(canonicalize_label("C-Section"), "C-Section");
        assert_eq!(canonicalize_label("Normal"), "Normal");
    }

    #[test]
    fn should_flatten_record_into_script_contract() {
        let input: NewPatientData = serde_json::from_value(serde_json::json!({
            "patientId": "P-3001",
            "patientName": "Pat Doe",
            "age": 33,
            "height": 158.0,
            "weight": 64.0,
            "bmi": 25.6,
            "gravidity": 3,
            "parity": 2,
            "gestational_age": 37,
            "estimated_fetal_weight": 2900.0,
            "amniotic_fluid_index": 9.0,
            "bishop_score": 4,
            "bp_systolic": 130,
            "bp_diastolic": 85,
            "glucoseLevel": 101.0,
            "previous_cesarean": "Yes",
            "previous_vaginal_birth": "No",
            "previous_assisted": "No",
            "gestational_diabetes": "Yes",
            "hypertension": "No"
        }))
        .unwrap();
        let record = input.into_record(Uuid::new_v4()).unwrap();
        let features = feature_map(&record);
        assert_eq!(features["previous_cesarean"], "Yes");
        assert_eq!(features["fetal_presentation"], "Cephalic");
        assert_eq!(features["placenta_location"], "Normal");
        assert_eq!(features["fetal_heart_rate_category"], "I");
        assert_eq!(features["glucoseLevel"], 101.0);
        assert_eq!(features["cervical_dilation"], 0.0);
        assert_eq!(features["fetal_station"], 0);
    }

    #[test]
    fn should_default_missing_fields_in_predictor_output() {
        let parsed: Prediction = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.prediction_result, "Error: No result");
        assert_eq!(parsed.confidence_score, 0.0);
    }
}
