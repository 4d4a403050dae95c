// server/src/api/mod.rs

pub mod filters;
pub mod handlers_auth;
pub mod handlers_patient;
pub mod handlers_prediction;
pub mod rejections;
pub mod routes;

pub use routes::routes;
