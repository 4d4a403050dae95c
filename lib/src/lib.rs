// lib/src/lib.rs

// Core services for the Obstetra workflow server.
pub mod auth;
pub mod config;
pub mod policy;
pub mod prediction;
pub mod records;
pub mod review;
pub mod storage;

pub use auth::AccountService;
pub use config::AppConfig;
pub use records::RecordService;
pub use storage::{MemoryStore, RecordStore, SledStore};
