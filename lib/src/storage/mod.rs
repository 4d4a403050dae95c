//! Persistence boundary for patient records and user accounts.
//!
//! Two engines implement the same trait: a sled-backed store for the server
//! and an in-memory store for tests. Uniqueness constraints (patient id,
//! user email) and the review-status conditional update are enforced here,
//! at the storage boundary, so every caller gets the same guarantees.

pub mod memory_store;
pub mod sled_store;

use async_trait::async_trait;
use uuid::Uuid;

use models::{AppResult, PatientRecord, ReviewStatus, UserAccount};

pub use memory_store::MemoryStore;
pub use sled_store::SledStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persists a new record, failing with a conflict if the external
    /// patient id is already taken.
    async fn create_patient(&self, record: PatientRecord) -> AppResult<()>;

    async fn get_patient(&self, id: &Uuid) -> AppResult<Option<PatientRecord>>;

    async fn find_patient_by_patient_id(
        &self,
        patient_id: &str,
    ) -> AppResult<Option<PatientRecord>>;

    async fn list_patients(&self) -> AppResult<Vec<PatientRecord>>;

    /// Unconditional overwrite of an existing record.
    async fn save_patient(&self, record: PatientRecord) -> AppResult<()>;

    /// Conditional overwrite keyed on the record's current review status.
    ///
    /// Two reviewers racing on the same PENDING record can both pass the
    /// in-memory legality check; this compare-and-swap makes the second
    /// write fail with a conflict naming the state the first one left
    /// behind, instead of silently winning.
    async fn save_patient_guarded(
        &self,
        expected: ReviewStatus,
        record: PatientRecord,
    ) -> AppResult<()>;

    /// Removes a record, reporting whether it existed.
    async fn delete_patient(&self, id: &Uuid) -> AppResult<bool>;

    /// Persists a new account, failing with a conflict if the email is
    /// already registered.
    async fn create_user(&self, user: UserAccount) -> AppResult<()>;

    async fn get_user(&self, id: &Uuid) -> AppResult<Option<UserAccount>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserAccount>>;

    async fn list_users(&self) -> AppResult<Vec<UserAccount>>;

    async fn delete_user(&self, id: &Uuid) -> AppResult<bool>;
}
