//! Sled-backed record store.
//!
//! Layout: four trees. `patients` and `users` map UUID bytes to JSON-encoded
//! documents; `patient_ids` and `user_emails` are uniqueness indexes mapping
//! the external key to the owning UUID. Index insertion uses sled's
//! compare_and_swap so a duplicate key loses atomically, and the guarded
//! review update CASes the full document bytes.

use async_trait::async_trait;
use log::{debug, info};
use sled::{Db, Tree};
use std::path::Path;
use uuid::Uuid;

use models::{AppError, AppResult, PatientRecord, ReviewStatus, UserAccount};

use super::RecordStore;

pub struct SledStore {
    #[allow(dead_code)]
    db: Db,
    patients: Tree,
    patient_ids: Tree,
    users: Tree,
    user_emails: Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let db = sled::open(path.as_ref())
            .map_err(|e| AppError::Storage(format!("Failed to open sled db: {}", e)))?;
        let patients = open_tree(&db, "patients")?;
        let patient_ids = open_tree(&db, "patient_ids")?;
        let users = open_tree(&db, "users")?;
        let user_emails = open_tree(&db, "user_emails")?;
        info!(
            "[STORE] Sled store opened at {:?} ({} patients, {} users)",
            path.as_ref(),
            patients.len(),
            users.len()
        );
        Ok(Self {
            db,
            patients,
            patient_ids,
            users,
            user_emails,
        })
    }

    fn encode<T: serde::Serialize>(value: &T) -> AppResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> AppResult<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

fn open_tree(db: &Db, name: &str) -> AppResult<Tree> {
    db.open_tree(name)
        .map_err(|e| AppError::Storage(format!("Failed to open tree '{}': {}", name, e)))
}

fn sled_err(err: sled::Error) -> AppError {
    AppError::Storage(format!("Sled error: {}", err))
}

#[async_trait]
impl RecordStore for SledStore {
    async fn create_patient(&self, record: PatientRecord) -> AppResult<()> {
        // Claim the external id first; losing the CAS means a duplicate.
        let claimed = self
            .patient_ids
            .compare_and_swap(
                record.patient_id.as_bytes(),
                None as Option<&[u8]>,
                Some(record.id.as_bytes().to_vec()),
            )
            .map_err(sled_err)?;
        if claimed.is_err() {
            return Err(AppError::Conflict("Patient ID already exists.".into()));
        }

        let bytes = Self::encode(&record)?;
        self.patients
            .insert(record.id.as_bytes(), bytes)
            .map_err(sled_err)?;
        debug!("[STORE] Created patient record {}", record.id);
        Ok(())
    }

    async fn get_patient(&self, id: &Uuid) -> AppResult<Option<PatientRecord>> {
        match self.patients.get(id.as_bytes()).map_err(sled_err)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn find_patient_by_patient_id(
        &self,
        patient_id: &str,
    ) -> AppResult<Option<PatientRecord>> {
        match self
            .patient_ids
            .get(patient_id.as_bytes())
            .map_err(sled_err)?
        {
            Some(id_bytes) => {
                let id = Uuid::from_slice(&id_bytes)
                    .map_err(|e| AppError::Storage(format!("Corrupt patient index: {}", e)))?;
                self.get_patient(&id).await
            }
            None => Ok(None),
        }
    }

    async fn list_patients(&self) -> AppResult<Vec<PatientRecord>> {
        let mut records = Vec::new();
        for entry in self.patients.iter() {
            let (_, bytes) = entry.map_err(sled_err)?;
            records.push(Self::decode(&bytes)?);
        }
        Ok(records)
    }

    async fn save_patient(&self, record: PatientRecord) -> AppResult<()> {
        if self
            .patients
            .get(record.id.as_bytes())
            .map_err(sled_err)?
            .is_none()
        {
            return Err(AppError::NotFound("Patient data not found".into()));
        }
        let bytes = Self::encode(&record)?;
        self.patients
            .insert(record.id.as_bytes(), bytes)
            .map_err(sled_err)?;
        Ok(())
    }

    async fn save_patient_guarded(
        &self,
        expected: ReviewStatus,
        record: PatientRecord,
    ) -> AppResult<()> {
        let key = record.id.as_bytes().to_vec();
        let current_bytes = self
            .patients
            .get(&key)
            .map_err(sled_err)?
            .ok_or_else(|| AppError::NotFound("Patient data not found".into()))?;
        let current: PatientRecord = Self::decode(&current_bytes)?;
        if current.review_status != expected {
            return Err(AppError::Conflict(format!(
                "Data is already {}.",
                current.review_status
            )));
        }

        let new_bytes = Self::encode(&record)?;
        let swapped = self
            .patients
            .compare_and_swap(&key, Some(current_bytes), Some(new_bytes))
            .map_err(sled_err)?;
        if swapped.is_err() {
            // The document changed underneath us; report whatever state won.
            let status = self
                .get_patient(&record.id)
                .await?
                .map(|r| r.review_status)
                .unwrap_or(ReviewStatus::Pending);
            return Err(AppError::Conflict(format!("Data is already {}.", status)));
        }
        Ok(())
    }

    async fn delete_patient(&self, id: &Uuid) -> AppResult<bool> {
        let removed = self.patients.remove(id.as_bytes()).map_err(sled_err)?;
        match removed {
            Some(bytes) => {
                let record: PatientRecord = Self::decode(&bytes)?;
                self.patient_ids
                    .remove(record.patient_id.as_bytes())
                    .map_err(sled_err)?;
                debug!("[STORE] Removed patient record {}", id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_user(&self, user: UserAccount) -> AppResult<()> {
        let claimed = self
            .user_emails
            .compare_and_swap(
                user.email.as_bytes(),
                None as Option<&[u8]>,
                Some(user.id.as_bytes().to_vec()),
            )
            .map_err(sled_err)?;
        if claimed.is_err() {
            return Err(AppError::Conflict("User already exists".into()));
        }

        let bytes = Self::encode(&user)?;
        self.users
            .insert(user.id.as_bytes(), bytes)
            .map_err(sled_err)?;
        debug!("[STORE] Created user account {} ({})", user.id, user.role);
        Ok(())
    }

    async fn get_user(&self, id: &Uuid) -> AppResult<Option<UserAccount>> {
        match self.users.get(id.as_bytes()).map_err(sled_err)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        match self.user_emails.get(email.as_bytes()).map_err(sled_err)? {
            Some(id_bytes) => {
                let id = Uuid::from_slice(&id_bytes)
                    .map_err(|e| AppError::Storage(format!("Corrupt email index: {}", e)))?;
                self.get_user(&id).await
            }
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> AppResult<Vec<UserAccount>> {
        let mut users = Vec::new();
        for entry in self.users.iter() {
            let (_, bytes) = entry.map_err(sled_err)?;
            users.push(Self::decode(&bytes)?);
        }
        Ok(users)
    }

    async fn delete_user(&self, id: &Uuid) -> AppResult<bool> {
        let removed = self.users.remove(id.as_bytes()).map_err(sled_err)?;
        match removed {
            Some(bytes) => {
                let user: UserAccount = Self::decode(&bytes)?;
                self.user_emails
                    .remove(user.email.as_bytes())
                    .map_err(sled_err)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{NewPatientData, Role};

    fn sample_record(patient_id: &str) -> PatientRecord {
        let input: NewPatientData = serde_json::from_value(serde_json::json!({
            "patientId": patient_id,
            "patientName": "Test Patient",
            "age": 27,
            "height": 160.0,
            "weight": 62.0,
            "bmi": 24.2,
            "gravidity": 1,
            "parity": 0,
            "gestational_age": 40,
            "estimated_fetal_weight": 3400.0,
            "amniotic_fluid_index": 13.0,
            "bishop_score": 5,
            "bp_systolic": 115,
            "bp_diastolic": 72,
            "glucoseLevel": 90.0,
            "previous_cesarean": "No",
            "previous_vaginal_birth": "No",
            "previous_assisted": "No",
            "gestational_diabetes": "No",
            "hypertension": "No"
        }))
        .unwrap();
        input.into_record(Uuid::new_v4()).unwrap()
    }

    fn temp_store() -> (tempfile::TempDir, SledStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn should_round_trip_patient_record() {
        let (_dir, store) = temp_store();
        let record = sample_record("P-1");
        store.create_patient(record.clone()).await.unwrap();
        let loaded = store.get_patient(&record.id).await.unwrap().unwrap();
        assert_eq!(loaded, record);
        let by_pid = store
            .find_patient_by_patient_id("P-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_pid.id, record.id);
    }

    #[tokio::test]
    async fn should_reject_duplicate_patient_id() {
        let (_dir, store) = temp_store();
        store.create_patient(sample_record("P-1")).await.unwrap();
        let err = store.create_patient(sample_record("P-1")).await.unwrap_err();
        assert_eq!(err, AppError::Conflict("Patient ID already exists.".into()));
    }

    #[tokio::test]
    async fn should_fail_guarded_save_when_status_moved() {
        let (_dir, store) = temp_store();
        let record = sample_record("P-1");
        store.create_patient(record.clone()).await.unwrap();

        let mut approved = record.clone();
        approved.review_status = ReviewStatus::Approved;
        store
            .save_patient_guarded(ReviewStatus::Pending, approved)
            .await
            .unwrap();

        // A second reviewer who also saw PENDING now loses the race.
        let mut disapproved = record.clone();
        disapproved.review_status = ReviewStatus::Disapproved;
        let err = store
            .save_patient_guarded(ReviewStatus::Pending, disapproved)
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Conflict("Data is already APPROVED.".into()));
    }

    #[tokio::test]
    async fn should_free_patient_id_after_delete() {
        let (_dir, store) = temp_store();
        let record = sample_record("P-1");
        store.create_patient(record.clone()).await.unwrap();
        assert!(store.delete_patient(&record.id).await.unwrap());
        assert!(!store.delete_patient(&record.id).await.unwrap());
        // id is reusable once the record is gone
        store.create_patient(sample_record("P-1")).await.unwrap();
    }

    #[tokio::test]
    async fn should_enforce_unique_user_email() {
        let (_dir, store) = temp_store();
        let user = UserAccount::new(
            "Ada".into(),
            "ada@example.org".into(),
            "hash".into(),
            Role::Nurse,
        );
        store.create_user(user.clone()).await.unwrap();
        let dup = UserAccount::new(
            "Ada Again".into(),
            "ada@example.org".into(),
            "hash2".into(),
            Role::Doctor,
        );
        let err = store.create_user(dup).await.unwrap_err();
        assert_eq!(err, AppError::Conflict("User already exists".into()));
        let found = store
            .find_user_by_email("ada@example.org")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
    }
}
