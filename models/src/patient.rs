//! Obstetric patient record model, wire schema and field validation.
//!
//! Field names on the wire match the historical schema (a mix of camelCase
//! and snake_case), so existing clients keep working unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Review pipeline state of a patient record.
///
/// Records written before the review pipeline existed carry no
/// `reviewStatus` key (or an explicit null); both deserialize to `Pending`
/// so legacy data flows through the same transitions as new data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Disapproved,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReviewStatus::Pending => "PENDING",
            ReviewStatus::Approved => "APPROVED",
            ReviewStatus::Disapproved => "DISAPPROVED",
        };
        write!(f, "{}", s)
    }
}

fn de_review_status<'de, D>(deserializer: D) -> Result<ReviewStatus, D::Error>
where
    D: Deserializer<'de>,
{
    // Absent and null both mean "never reviewed".
    let opt = Option::<ReviewStatus>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// Yes/No categorical flag, serialized with the capitalized wire spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FetalPresentation {
    #[default]
    Cephalic,
    Breech,
    Transverse,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlacentaLocation {
    #[default]
    Normal,
    Previa,
}

/// NICHD fetal heart rate tracing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FetalHeartRateCategory {
    #[default]
    I,
    II,
    III,
}

/// One patient encounter record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    pub id: Uuid,
    #[serde(rename = "patientId")]
    pub patient_id: String,
    #[serde(rename = "enteredBy")]
    pub entered_by: Uuid,
    #[serde(rename = "patientName")]
    pub patient_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,

    pub age: u32,
    pub height: f64,
    pub weight: f64,
    pub bmi: f64,
    pub gravidity: u32,
    pub parity: u32,
    pub gestational_age: u32,
    pub estimated_fetal_weight: f64,
    pub amniotic_fluid_index: f64,
    pub bishop_score: u32,
    pub bp_systolic: u32,
    pub bp_diastolic: u32,
    #[serde(rename = "bloodPressure", default)]
    pub blood_pressure: Option<f64>,
    #[serde(rename = "glucoseLevel")]
    pub glucose_level: f64,
    #[serde(default)]
    pub cervical_dilation: f64,
    #[serde(default)]
    pub fetal_station: i32,

    pub previous_cesarean: YesNo,
    pub previous_vaginal_birth: YesNo,
    pub previous_assisted: YesNo,
    pub gestational_diabetes: YesNo,
    pub hypertension: YesNo,
    #[serde(default)]
    pub induction_of_labor: YesNo,
    #[serde(default)]
    pub oxytocin_augmentation: YesNo,
    #[serde(default)]
    pub prior_shoulder_dystocia: YesNo,
    #[serde(default)]
    pub fetal_presentation: FetalPresentation,
    #[serde(default)]
    pub placenta_location: PlacentaLocation,
    #[serde(default)]
    pub fetal_heart_rate_category: FetalHeartRateCategory,

    #[serde(rename = "reviewStatus", default, deserialize_with = "de_review_status")]
    pub review_status: ReviewStatus,
    #[serde(rename = "reviewNote", default)]
    pub review_note: Option<String>,
    #[serde(rename = "predictionResult", default = "default_prediction_result")]
    pub prediction_result: String,
    #[serde(rename = "confidenceScore", default)]
    pub confidence_score: f64,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

pub fn default_prediction_result() -> String {
    "Pending".to_string()
}

impl PatientRecord {
    /// The review enum is the single source of truth; the historical
    /// `isApproved` boolean is derived at read time, never stored.
    pub fn is_approved(&self) -> bool {
        self.review_status == ReviewStatus::Approved
    }

    /// Serializes the record for API responses, injecting the derived
    /// `isApproved` field expected by existing clients.
    pub fn api_json(&self) -> AppResult<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(ref mut map) = value {
            map.insert("isApproved".to_string(), Value::Bool(self.is_approved()));
        }
        Ok(value)
    }

    /// Checks every numeric field against its clinical range. Messages match
    /// the historical schema so browser-side validation stays in lockstep.
    pub fn validate(&self) -> AppResult<()> {
        if self.patient_id.trim().is_empty() {
            return Err(AppError::Validation("Patient ID is required.".into()));
        }
        if self.patient_name.trim().is_empty() {
            return Err(AppError::Validation("Patient Name is required.".into()));
        }
        range_u32(self.age, 15, 50, "Maternal Age should be between 15 and 50 years.")?;
        range_f64(self.height, 100.0, 250.0, "Height should be between 100 and 250 cm.")?;
        range_f64(self.weight, 30.0, 200.0, "Weight should be between 30 and 200 kg.")?;
        range_f64(self.bmi, 15.0, 40.0, "BMI should be between 15 and 40.")?;
        range_u32(self.gravidity, 0, 20, "Gravidity should be between 0 and 20.")?;
        range_u32(self.parity, 0, 15, "Parity should be between 0 and 15.")?;
        range_u32(
            self.gestational_age,
            1,
            42,
            "Gestational Age should be between 1 and 42 weeks.",
        )?;
        range_f64(
            self.estimated_fetal_weight,
            500.0,
            6000.0,
            "Fetal Weight should be between 500 g and 6000 g.",
        )?;
        range_f64(
            self.amniotic_fluid_index,
            5.0,
            25.0,
            "AFI should be between 5 and 25 cm.",
        )?;
        range_u32(self.bishop_score, 0, 13, "Bishop Score should be between 0 and 13.")?;
        range_u32(
            self.bp_systolic,
            80,
            200,
            "Systolic BP should be between 80 and 200 mmHg.",
        )?;
        range_u32(
            self.bp_diastolic,
            40,
            120,
            "Diastolic BP should be between 40 and 120 mmHg.",
        )?;
        range_f64(
            self.cervical_dilation,
            0.0,
            10.0,
            "Dilation must be between 0 and 10 cm.",
        )?;
        if self.fetal_station < -5 || self.fetal_station > 5 {
            return Err(AppError::Validation(
                "Station must be between -5 and +5.".into(),
            ));
        }
        Ok(())
    }
}

fn range_u32(value: u32, min: u32, max: u32, msg: &str) -> AppResult<()> {
    if value < min || value > max {
        return Err(AppError::Validation(msg.to_string()));
    }
    Ok(())
}

fn range_f64(value: f64, min: f64, max: f64, msg: &str) -> AppResult<()> {
    if value < min || value > max {
        return Err(AppError::Validation(msg.to_string()));
    }
    Ok(())
}

/// Payload accepted when registering a new patient record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatientData {
    #[serde(rename = "patientId")]
    pub patient_id: String,
    #[serde(rename = "patientName")]
    pub patient_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,

    pub age: u32,
    pub height: f64,
    pub weight: f64,
    pub bmi: f64,
    pub gravidity: u32,
    pub parity: u32,
    pub gestational_age: u32,
    pub estimated_fetal_weight: f64,
    pub amniotic_fluid_index: f64,
    pub bishop_score: u32,
    pub bp_systolic: u32,
    pub bp_diastolic: u32,
    #[serde(rename = "bloodPressure", default)]
    pub blood_pressure: Option<f64>,
    #[serde(rename = "glucoseLevel")]
    pub glucose_level: f64,
    #[serde(default)]
    pub cervical_dilation: f64,
    #[serde(default)]
    pub fetal_station: i32,

    pub previous_cesarean: YesNo,
    pub previous_vaginal_birth: YesNo,
    pub previous_assisted: YesNo,
    pub gestational_diabetes: YesNo,
    pub hypertension: YesNo,
    #[serde(default)]
    pub induction_of_labor: YesNo,
    #[serde(default)]
    pub oxytocin_augmentation: YesNo,
    #[serde(default)]
    pub prior_shoulder_dystocia: YesNo,
    #[serde(default)]
    pub fetal_presentation: FetalPresentation,
    #[serde(default)]
    pub placenta_location: PlacentaLocation,
    #[serde(default)]
    pub fetal_heart_rate_category: FetalHeartRateCategory,
}

impl NewPatientData {
    /// Builds a validated record in its initial workflow state.
    pub fn into_record(self, entered_by: Uuid) -> AppResult<PatientRecord> {
        let now = Utc::now();
        let record = PatientRecord {
            id: Uuid::new_v4(),
            patient_id: self.patient_id,
            entered_by,
            patient_name: self.patient_name,
            email: self.email,
            phone_number: self.phone_number,
            age: self.age,
            height: self.height,
            weight: self.weight,
            bmi: self.bmi,
            gravidity: self.gravidity,
            parity: self.parity,
            gestational_age: self.gestational_age,
            estimated_fetal_weight: self.estimated_fetal_weight,
            amniotic_fluid_index: self.amniotic_fluid_index,
            bishop_score: self.bishop_score,
            bp_systolic: self.bp_systolic,
            bp_diastolic: self.bp_diastolic,
            blood_pressure: self.blood_pressure,
            glucose_level: self.glucose_level,
            cervical_dilation: self.cervical_dilation,
            fetal_station: self.fetal_station,
            previous_cesarean: self.previous_cesarean,
            previous_vaginal_birth: self.previous_vaginal_birth,
            previous_assisted: self.previous_assisted,
            gestational_diabetes: self.gestational_diabetes,
            hypertension: self.hypertension,
            induction_of_labor: self.induction_of_labor,
            oxytocin_augmentation: self.oxytocin_augmentation,
            prior_shoulder_dystocia: self.prior_shoulder_dystocia,
            fetal_presentation: self.fetal_presentation,
            placenta_location: self.placenta_location,
            fetal_heart_rate_category: self.fetal_heart_rate_category,
            review_status: ReviewStatus::Pending,
            review_note: None,
            prediction_result: default_prediction_result(),
            confidence_score: 0.0,
            created_at: now,
            updated_at: now,
        };
        record.validate()?;
        Ok(record)
    }
}

/// Partial update payload; absent fields keep their current value.
/// `patientId` and `enteredBy` are immutable and deliberately missing here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientDataUpdate {
    #[serde(rename = "patientName", default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub gravidity: Option<u32>,
    #[serde(default)]
    pub parity: Option<u32>,
    #[serde(default)]
    pub gestational_age: Option<u32>,
    #[serde(default)]
    pub estimated_fetal_weight: Option<f64>,
    #[serde(default)]
    pub amniotic_fluid_index: Option<f64>,
    #[serde(default)]
    pub bishop_score: Option<u32>,
    #[serde(default)]
    pub bp_systolic: Option<u32>,
    #[serde(default)]
    pub bp_diastolic: Option<u32>,
    #[serde(rename = "bloodPressure", default)]
    pub blood_pressure: Option<f64>,
    #[serde(rename = "glucoseLevel", default)]
    pub glucose_level: Option<f64>,
    #[serde(default)]
    pub cervical_dilation: Option<f64>,
    #[serde(default)]
    pub fetal_station: Option<i32>,
    #[serde(default)]
    pub previous_cesarean: Option<YesNo>,
    #[serde(default)]
    pub previous_vaginal_birth: Option<YesNo>,
    #[serde(default)]
    pub previous_assisted: Option<YesNo>,
    #[serde(default)]
    pub gestational_diabetes: Option<YesNo>,
    #[serde(default)]
    pub hypertension: Option<YesNo>,
    #[serde(default)]
    pub induction_of_labor: Option<YesNo>,
    #[serde(default)]
    pub oxytocin_augmentation: Option<YesNo>,
    #[serde(default)]
    pub prior_shoulder_dystocia: Option<YesNo>,
    #[serde(default)]
    pub fetal_presentation: Option<FetalPresentation>,
    #[serde(default)]
    pub placenta_location: Option<PlacentaLocation>,
    #[serde(default)]
    pub fetal_heart_rate_category: Option<FetalHeartRateCategory>,
}

impl PatientDataUpdate {
    /// Merges the patch onto `record` and re-validates the result.
    pub fn apply_to(&self, record: &mut PatientRecord) -> AppResult<()> {
        macro_rules! merge {
            ($field:ident) => {
                if let Some(value) = self.$field.clone() {
                    record.$field = value;
                }
            };
        }
        merge!(patient_name);
        if self.email.is_some() {
            record.email = self.email.clone();
        }
        if self.phone_number.is_some() {
            record.phone_number = self.phone_number.clone();
        }
        if self.blood_pressure.is_some() {
            record.blood_pressure = self.blood_pressure;
        }
        merge!(age);
        merge!(height);
        merge!(weight);
        merge!(bmi);
        merge!(gravidity);
        merge!(parity);
        merge!(gestational_age);
        merge!(estimated_fetal_weight);
        merge!(amniotic_fluid_index);
        merge!(bishop_score);
        merge!(bp_systolic);
        merge!(bp_diastolic);
        merge!(glucose_level);
        merge!(cervical_dilation);
        merge!(fetal_station);
        merge!(previous_cesarean);
        merge!(previous_vaginal_birth);
        merge!(previous_assisted);
        merge!(gestational_diabetes);
        merge!(hypertension);
        merge!(induction_of_labor);
        merge!(oxytocin_augmentation);
        merge!(prior_shoulder_dystocia);
        merge!(fetal_presentation);
        merge!(placenta_location);
        merge!(fetal_heart_rate_category);
        record.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_input() -> NewPatientData {
        serde_json::from_value(serde_json::json!({
            "patientId": "P-1001",
            "patientName": "Jane Roe",
            "age": 29,
            "height": 165.0,
            "weight": 70.0,
            "bmi": 25.7,
            "gravidity": 2,
            "parity": 1,
            "gestational_age": 39,
            "estimated_fetal_weight": 3300.0,
            "amniotic_fluid_index": 12.0,
            "bishop_score": 7,
            "bp_systolic": 118,
            "bp_diastolic": 76,
            "glucoseLevel": 92.0,
            "previous_cesarean": "No",
            "previous_vaginal_birth": "Yes",
            "previous_assisted": "No",
            "gestational_diabetes": "No",
            "hypertension": "No"
        }))
        .expect("sample input should deserialize")
    }

    #[test]
    fn should_create_record_in_pending_state() {
        let record = sample_input().into_record(Uuid::new_v4()).unwrap();
        assert_eq!(record.review_status, ReviewStatus::Pending);
        assert!(!record.is_approved());
        assert_eq!(record.prediction_result, "Pending");
        assert_eq!(record.confidence_score, 0.0);
    }

    #[test]
    fn should_reject_out_of_range_height() {
        let mut input = sample_input();
        input.height = 99.0;
        let err = input.into_record(Uuid::new_v4()).unwrap_err();
        assert_eq!(
            err,
            AppError::Validation("Height should be between 100 and 250 cm.".into())
        );
    }

    #[test]
    fn should_reject_missing_patient_id() {
        let mut input = sample_input();
        input.patient_id = "  ".to_string();
        let err = input.into_record(Uuid::new_v4()).unwrap_err();
        assert_eq!(err, AppError::Validation("Patient ID is required.".into()));
    }

    #[test]
    fn should_treat_absent_review_status_as_pending() {
        let record = sample_input().into_record(Uuid::new_v4()).unwrap();
        let mut value = serde_json::to_value(&record).unwrap();
        value.as_object_mut().unwrap().remove("reviewStatus");
        let legacy: PatientRecord = serde_json::from_value(value).unwrap();
        assert_eq!(legacy.review_status, ReviewStatus::Pending);
    }

    #[test]
    fn should_treat_null_review_status_as_pending() {
        let record = sample_input().into_record(Uuid::new_v4()).unwrap();
        let mut value = serde_json::to_value(&record).unwrap();
        value["reviewStatus"] = serde_json::Value::Null;
        let legacy: PatientRecord = serde_json::from_value(value).unwrap();
        assert_eq!(legacy.review_status, ReviewStatus::Pending);
    }

    #[test]
    fn should_inject_derived_approval_flag_into_api_json() {
        let mut record = sample_input().into_record(Uuid::new_v4()).unwrap();
        record.review_status = ReviewStatus::Approved;
        let json = record.api_json().unwrap();
        assert_eq!(json["isApproved"], serde_json::Value::Bool(true));
        assert_eq!(json["reviewStatus"], "APPROVED");
    }

    #[test]
    fn should_merge_patch_and_revalidate() {
        let mut record = sample_input().into_record(Uuid::new_v4()).unwrap();
        let patch = PatientDataUpdate {
            weight: Some(75.0),
            ..Default::default()
        };
        patch.apply_to(&mut record).unwrap();
        assert_eq!(record.weight, 75.0);

        let bad = PatientDataUpdate {
            bmi: Some(55.0),
            ..Default::default()
        };
        let err = bad.apply_to(&mut record).unwrap_err();
        assert_eq!(err, AppError::Validation("BMI should be between 15 and 40.".into()));
    }
}
