// models/src/lib.rs

// Declare all top-level modules within the 'models' crate
pub mod errors;
pub mod patient;
pub mod user;

// Re-export common core types for convenience when other crates use 'models::*'
pub use errors::{AppError, AppResult};
pub use patient::{
    FetalHeartRateCategory, FetalPresentation, NewPatientData, PatientDataUpdate, PatientRecord,
    PlacentaLocation, ReviewStatus, YesNo,
};
pub use user::{Capability, Identity, Role, UserAccount};
