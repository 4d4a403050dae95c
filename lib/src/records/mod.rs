//! Patient record operations behind the HTTP surface.

pub mod record_service;

pub use record_service::RecordService;
