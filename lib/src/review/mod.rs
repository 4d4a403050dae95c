//! Review/approval state machine for patient records.
//!
//! States: PENDING (initial, also the parse result for legacy records that
//! never carried the field) -> APPROVED | DISAPPROVED. A decided record can
//! only return to PENDING through a data-entry edit, which resubmits it.
//!
//! These functions are pure over an owned copy of the record; persistence
//! (including the conditional update that guards against racing reviewers)
//! lives in the record service.

use models::patient::default_prediction_result;
use models::{AppError, AppResult, PatientDataUpdate, PatientRecord, ReviewStatus, Role};

/// Review outcomes a reviewer may submit. Parsing is strict: anything other
/// than the two literal outcome names is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Approved,
    Disapproved,
}

impl ReviewOutcome {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "APPROVED" => Ok(ReviewOutcome::Approved),
            "DISAPPROVED" => Ok(ReviewOutcome::Disapproved),
            _ => Err(AppError::Validation("Invalid status provided.".into())),
        }
    }

    fn status(&self) -> ReviewStatus {
        match self {
            ReviewOutcome::Approved => ReviewStatus::Approved,
            ReviewOutcome::Disapproved => ReviewStatus::Disapproved,
        }
    }
}

/// Forces the record back into the review queue and invalidates any earlier
/// review or prediction. Fires on every data-entry edit.
pub fn submit_for_review(record: &mut PatientRecord) {
    record.review_status = ReviewStatus::Pending;
    record.review_note = Some(String::new());
    reset_prediction(record);
}

/// A change to clinical fields makes any stored prediction stale; it must
/// never be presented as current.
pub fn reset_prediction(record: &mut PatientRecord) {
    record.prediction_result = default_prediction_result();
    record.confidence_score = 0.0;
}

/// Applies a review decision to a PENDING record.
///
/// Deciding an already decided record is a conflict reporting the current
/// state; there is no direct re-review transition. The record is returned
/// untouched on any failure.
pub fn decide(
    record: &PatientRecord,
    outcome: ReviewOutcome,
    note: Option<String>,
) -> AppResult<PatientRecord> {
    if record.review_status != ReviewStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Data is already {}.",
            record.review_status
        )));
    }
    let mut decided = record.clone();
    decided.review_status = outcome.status();
    decided.review_note = note.filter(|n| !n.is_empty());
    decided.updated_at = chrono::Utc::now();
    Ok(decided)
}

/// Applies a clinical-field edit on behalf of `role`.
///
/// Doctors and admins may only touch APPROVED records. Nurses edit freely
/// without disturbing review state. Data-entry edits resubmit the record for
/// review. Every successful edit resets the prediction fields.
pub fn edit_clinical_fields(
    record: &PatientRecord,
    patch: &PatientDataUpdate,
    role: Role,
) -> AppResult<PatientRecord> {
    if matches!(role, Role::Doctor | Role::Admin)
        && record.review_status != ReviewStatus::Approved
    {
        return Err(AppError::Authorization(
            "Cannot update unapproved patient data.".into(),
        ));
    }

    let mut updated = record.clone();
    patch.apply_to(&mut updated)?;

    if role == Role::DataEntry {
        submit_for_review(&mut updated);
    } else {
        reset_prediction(&mut updated);
    }
    updated.updated_at = chrono::Utc::now();
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::NewPatientData;
    use uuid::Uuid;

    fn pending_record() -> PatientRecord {
        let input: NewPatientData = serde_json::from_value(serde_json::json!({
            "patientId": "P-2001",
            "patientName": "Mary Major",
            "age": 31,
            "height": 170.0,
            "weight": 68.0,
            "bmi": 23.5,
            "gravidity": 1,
            "parity": 0,
            "gestational_age": 38,
            "estimated_fetal_weight": 3100.0,
            "amniotic_fluid_index": 11.0,
            "bishop_score": 6,
            "bp_systolic": 120,
            "bp_diastolic": 80,
            "glucoseLevel": 88.0,
            "previous_cesarean": "No",
            "previous_vaginal_birth": "No",
            "previous_assisted": "No",
            "gestational_diabetes": "No",
            "hypertension": "No"
        }))
        .unwrap();
        input.into_record(Uuid::new_v4()).unwrap()
    }

    #[test]
    fn should_approve_pending_record_with_note() {
        let record = pending_record();
        let outcome = ReviewOutcome::parse("APPROVED").unwrap();
        let decided = decide(&record, outcome, Some("looks fine".into())).unwrap();
        assert_eq!(decided.review_status, ReviewStatus::Approved);
        assert!(decided.is_approved());
        assert_eq!(decided.review_note.as_deref(), Some("looks fine"));
    }

    #[test]
    fn should_reject_second_decision_with_conflict() {
        let record = pending_record();
        let approved = decide(&record, ReviewOutcome::Approved, None).unwrap();
        let err = decide(&approved, ReviewOutcome::Disapproved, None).unwrap_err();
        assert_eq!(err, AppError::Conflict("Data is already APPROVED.".into()));
    }

    #[test]
    fn should_reject_unknown_outcome() {
        assert_eq!(
            ReviewOutcome::parse("MAYBE").unwrap_err(),
            AppError::Validation("Invalid status provided.".into())
        );
        assert!(ReviewOutcome::parse("approved").is_err());
    }

    #[test]
    fn should_store_null_note_when_note_is_empty() {
        let record = pending_record();
        let decided = decide(&record, ReviewOutcome::Disapproved, Some(String::new())).unwrap();
        assert_eq!(decided.review_note, None);
        assert!(!decided.is_approved());
    }

    #[test]
    fn should_resubmit_on_data_entry_edit_regardless_of_prior_state() {
        let record = pending_record();
        let mut approved = decide(&record, ReviewOutcome::Approved, Some("ok".into())).unwrap();
        approved.prediction_result = "C-Section".into();
        approved.confidence_score = 0.9;

        let patch = PatientDataUpdate {
            weight: Some(72.0),
            ..Default::default()
        };
        let edited = edit_clinical_fields(&approved, &patch, Role::DataEntry).unwrap();
        assert_eq!(edited.review_status, ReviewStatus::Pending);
        assert_eq!(edited.review_note.as_deref(), Some(""));
        assert!(!edited.is_approved());
        assert_eq!(edited.prediction_result, "Pending");
        assert_eq!(edited.confidence_score, 0.0);
    }

    #[test]
    fn should_block_doctor_edit_of_unapproved_record() {
        let record = pending_record();
        let patch = PatientDataUpdate {
            weight: Some(72.0),
            ..Default::default()
        };
        for role in [Role::Doctor, Role::Admin] {
            let err = edit_clinical_fields(&record, &patch, role).unwrap_err();
            assert_eq!(
                err,
                AppError::Authorization("Cannot update unapproved patient data.".into())
            );
        }
    }

    #[test]
    fn should_let_doctor_edit_approved_record_without_reopening_review() {
        let record = pending_record();
        let approved = decide(&record, ReviewOutcome::Approved, None).unwrap();
        let patch = PatientDataUpdate {
            bishop_score: Some(8),
            ..Default::default()
        };
        let edited = edit_clinical_fields(&approved, &patch, Role::Doctor).unwrap();
        assert_eq!(edited.review_status, ReviewStatus::Approved);
        assert_eq!(edited.bishop_score, 8);
        // prediction is stale after a clinical change
        assert_eq!(edited.prediction_result, "Pending");
    }

    #[test]
    fn should_let_nurse_edit_without_touching_review_state() {
        let record = pending_record();
        let disapproved =
            decide(&record, ReviewOutcome::Disapproved, Some("incomplete".into())).unwrap();
        let patch = PatientDataUpdate {
            parity: Some(1),
            ..Default::default()
        };
        let edited = edit_clinical_fields(&disapproved, &patch, Role::Nurse).unwrap();
        assert_eq!(edited.review_status, ReviewStatus::Disapproved);
        assert_eq!(edited.review_note.as_deref(), Some("incomplete"));
    }

    #[test]
    fn should_keep_invariant_between_enum_and_derived_flag() {
        let record = pending_record();
        assert!(!record.is_approved());
        let approved = decide(&record, ReviewOutcome::Approved, None).unwrap();
        assert!(approved.is_approved());
        let patch = PatientDataUpdate::default();
        let reopened = edit_clinical_fields(&approved, &patch, Role::DataEntry).unwrap();
        assert!(!reopened.is_approved());
    }
}
