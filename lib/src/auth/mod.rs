//! Identity and authorization: bcrypt password storage, JWT cookie sessions
//! and the account service behind signup/login/user management.

pub mod account_service;
pub mod session;

pub use account_service::{AccountService, LoginRequest, SignupRequest};
pub use session::{hash_password, verify_password, AuthConfig, SessionClaims};
