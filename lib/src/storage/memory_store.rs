//! In-memory record store used by tests and by ephemeral deployments.
//! Mirrors the sled engine's constraint behavior exactly.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use models::{AppError, AppResult, PatientRecord, ReviewStatus, UserAccount};

use super::RecordStore;

#[derive(Default)]
pub struct MemoryStore {
    patients: RwLock<HashMap<Uuid, PatientRecord>>,
    patient_ids: RwLock<HashMap<String, Uuid>>,
    users: RwLock<HashMap<Uuid, UserAccount>>,
    user_emails: RwLock<HashMap<String, Uuid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_patient(&self, record: PatientRecord) -> AppResult<()> {
        let mut index = self.patient_ids.write().await;
        if index.contains_key(&record.patient_id) {
            return Err(AppError::Conflict("Patient ID already exists.".into()));
        }
        index.insert(record.patient_id.clone(), record.id);
        self.patients.write().await.insert(record.id, record);
        Ok(())
    }

    async fn get_patient(&self, id: &Uuid) -> AppResult<Option<PatientRecord>> {
        Ok(self.patients.read().await.get(id).cloned())
    }

    async fn find_patient_by_patient_id(
        &self,
        patient_id: &str,
    ) -> AppResult<Option<PatientRecord>> {
        let id = match self.patient_ids.read().await.get(patient_id) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.get_patient(&id).await
    }

    async fn list_patients(&self) -> AppResult<Vec<PatientRecord>> {
        Ok(self.patients.read().await.values().cloned().collect())
    }

    async fn save_patient(&self, record: PatientRecord) -> AppResult<()> {
        let mut patients = self.patients.write().await;
        if !patients.contains_key(&record.id) {
            return Err(AppError::NotFound("Patient data not found".into()));
        }
        patients.insert(record.id, record);
        Ok(())
    }

    async fn save_patient_guarded(
        &self,
        expected: ReviewStatus,
        record: PatientRecord,
    ) -> AppResult<()> {
        // Write lock held across check and write, so the compare is atomic.
        let mut patients = self.patients.write().await;
        let current = patients
            .get(&record.id)
            .ok_or_else(|| AppError::NotFound("Patient data not found".into()))?;
        if current.review_status != expected {
            return Err(AppError::Conflict(format!(
                "Data is already {}.",
                current.review_status
            )));
        }
        patients.insert(record.id, record);
        Ok(())
    }

    async fn delete_patient(&self, id: &Uuid) -> AppResult<bool> {
        match self.patients.write().await.remove(id) {
            Some(record) => {
                self.patient_ids.write().await.remove(&record.patient_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_user(&self, user: UserAccount) -> AppResult<()> {
        let mut emails = self.user_emails.write().await;
        if emails.contains_key(&user.email) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        emails.insert(user.email.clone(), user.id);
        self.users.write().await.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: &Uuid) -> AppResult<Option<UserAccount>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let id = match self.user_emails.read().await.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.get_user(&id).await
    }

    async fn list_users(&self) -> AppResult<Vec<UserAccount>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn delete_user(&self, id: &Uuid) -> AppResult<bool> {
        match self.users.write().await.remove(id) {
            Some(user) => {
                self.user_emails.write().await.remove(&user.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
