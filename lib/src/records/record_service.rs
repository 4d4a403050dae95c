//! Record service: wires the review state machine and query policy to the
//! store and the prediction adapter. Handlers hand it a resolved identity
//! and it performs the record-level checks; credential validation already
//! happened upstream.

use log::info;
use std::sync::Arc;
use uuid::Uuid;

use models::{
    AppError, AppResult, Identity, NewPatientData, PatientDataUpdate, PatientRecord, ReviewStatus,
};

use crate::policy;
use crate::prediction::{canonicalize_label, feature_map, Predictor};
use crate::review::{self, ReviewOutcome};
use crate::storage::RecordStore;

#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    predictor: Arc<dyn Predictor>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>, predictor: Arc<dyn Predictor>) -> Self {
        Self { store, predictor }
    }

    /// Registers a new patient record, owned by the caller, in its initial
    /// PENDING state.
    pub async fn create_record(
        &self,
        input: NewPatientData,
        identity: &Identity,
    ) -> AppResult<PatientRecord> {
        if self
            .store
            .find_patient_by_patient_id(&input.patient_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Patient ID already exists.".into()));
        }
        let record = input.into_record(identity.user_id)?;
        self.store.create_patient(record.clone()).await?;
        info!(
            "[RECORDS] Patient record created: {} (patientId: {})",
            record.id, record.patient_id
        );
        Ok(record)
    }

    /// Direct-id lookup. Deliberately not role-filtered; only listings are.
    pub async fn get_record(&self, id: &Uuid) -> AppResult<PatientRecord> {
        self.store
            .get_patient(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Patient not found".into()))
    }

    /// Role-scoped listing.
    pub async fn list_records(&self, identity: &Identity) -> AppResult<Vec<PatientRecord>> {
        let filter = policy::list_filter(identity);
        let records = self.store.list_patients().await?;
        Ok(records
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect())
    }

    /// Applies a review decision. The store-level conditional update keyed
    /// on PENDING closes the window between two reviewers reading the same
    /// record: the loser gets the conflict instead of silently overwriting.
    pub async fn review_record(
        &self,
        id: &Uuid,
        status: &str,
        note: Option<String>,
    ) -> AppResult<PatientRecord> {
        let record = self
            .store
            .get_patient(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Patient data not found".into()))?;
        let outcome = ReviewOutcome::parse(status)?;
        let decided = review::decide(&record, outcome, note)?;
        self.store
            .save_patient_guarded(ReviewStatus::Pending, decided.clone())
            .await?;
        info!(
            "[RECORDS] Record {} reviewed: {}",
            decided.id, decided.review_status
        );
        Ok(decided)
    }

    /// Edits clinical fields on behalf of the caller's role. Failures leave
    /// the stored record untouched; the merge happens on a copy.
    pub async fn update_record(
        &self,
        id: &Uuid,
        patch: &PatientDataUpdate,
        identity: &Identity,
    ) -> AppResult<PatientRecord> {
        let record = self
            .store
            .get_patient(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Patient data not found".into()))?;
        let updated = review::edit_clinical_fields(&record, patch, identity.role)?;
        self.store.save_patient(updated.clone()).await?;
        Ok(updated)
    }

    pub async fn delete_record(&self, id: &Uuid) -> AppResult<()> {
        if !self.store.delete_patient(id).await? {
            return Err(AppError::NotFound("Patient data not found".into()));
        }
        info!("[RECORDS] Patient record removed: {}", id);
        Ok(())
    }

    /// Invokes the predictor for a record and persists the canonicalized
    /// result. A failed prediction writes nothing: the record keeps its
    /// prior prediction fields.
    pub async fn run_prediction(&self, id: &Uuid) -> AppResult<PatientRecord> {
        let mut record = self
            .store
            .get_patient(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Patient data not found".into()))?;

        let prediction = self.predictor.predict(feature_map(&record)).await?;

        record.prediction_result = canonicalize_label(&prediction.prediction_result);
        record.confidence_score = prediction.confidence_score;
        record.updated_at = chrono::Utc::now();
        self.store.save_patient(record.clone()).await?;
        info!(
            "[RECORDS] Prediction stored for {}: {} ({:.2})",
            record.id, record.prediction_result, record.confidence_score
        );
        Ok(record)
    }
}
