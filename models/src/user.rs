//! User accounts and the role/capability model.
//!
//! Authorization is a capability-set membership test: each role maps onto a
//! fixed set of operation tags, and handlers ask whether the caller's role
//! holds the tag for the operation. This replaces per-route role-name lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    DataEntry,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Doctor, Role::Nurse, Role::DataEntry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::DataEntry => "data_entry",
        }
    }

    /// The operations this role is permitted to perform.
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Admin => &[
                CreateRecord,
                ViewRecord,
                ListRecords,
                EditRecord,
                ReviewRecord,
                DeleteRecord,
                RunPrediction,
                ManageUsers,
            ],
            Role::Doctor => &[
                CreateRecord,
                ViewRecord,
                ListRecords,
                EditRecord,
                ReviewRecord,
                RunPrediction,
            ],
            Role::Nurse => &[CreateRecord, ViewRecord, ListRecords, EditRecord, ReviewRecord],
            Role::DataEntry => &[CreateRecord, ViewRecord, ListRecords, EditRecord],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            "data_entry" => Ok(Role::DataEntry),
            other => Err(AppError::Validation(format!(
                "Invalid role '{}'. Must be one of: admin, doctor, nurse, data_entry",
                other
            ))),
        }
    }
}

/// Operation tags checked by the authorization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    CreateRecord,
    ViewRecord,
    ListRecords,
    EditRecord,
    ReviewRecord,
    DeleteRecord,
    RunPrediction,
    ManageUsers,
}

/// Roles holding a capability, in declaration order. Used to build the
/// "requires: ..." part of authorization failures.
pub fn roles_with(capability: Capability) -> Vec<Role> {
    Role::ALL
        .iter()
        .copied()
        .filter(|role| role.can(capability))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Bcrypt hash; never leaves the service boundary.
    #[serde(rename = "password")]
    pub password_hash: String,
    pub role: Role,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public projection with the password hash stripped.
    pub fn public_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "role": self.role,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
        })
    }
}

/// Resolved identity handed to business logic by the auth middleware.
/// Core code trusts this pair and never re-validates credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.role.can(capability) {
            return Ok(());
        }
        let required = roles_with(capability)
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(AppError::Authorization(format!(
            "Not authorized, requires: {}",
            required
        )))
    }
}
