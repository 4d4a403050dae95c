//! Account service: signup, login, identity resolution and admin-only user
//! management.

use log::info;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use models::{AppError, AppResult, Identity, Role, UserAccount};

use crate::auth::session::{hash_password, verify_password, AuthConfig};
use crate::storage::RecordStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Role name; defaults to nurse when omitted, matching the public
    /// signup form. There is no self-promotion path after signup.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn RecordStore>,
    auth: AuthConfig,
}

impl AccountService {
    pub fn new(store: Arc<dyn RecordStore>, auth: AuthConfig) -> Self {
        Self { store, auth }
    }

    /// Session lifetime, used by the HTTP layer for the cookie Max-Age.
    pub fn token_expiry_days(&self) -> i64 {
        self.auth.token_expiry_days
    }

    /// Whether session cookies carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.auth.secure_cookies
    }

    /// Registers a new account and issues its first session token.
    pub async fn signup(&self, req: SignupRequest) -> AppResult<(UserAccount, String)> {
        let role = match req.role.as_deref() {
            Some(raw) => Role::from_str(raw)?,
            None => Role::Nurse,
        };
        if req.name.trim().is_empty() || req.email.trim().is_empty() {
            return Err(AppError::Validation("Name and email are required.".into()));
        }
        if req.password.is_empty() {
            return Err(AppError::Validation("Password is required.".into()));
        }
        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".into()));
        }

        let user = UserAccount::new(req.name, req.email, hash_password(&req.password)?, role);
        self.store.create_user(user.clone()).await?;
        let token = self.auth.issue_token(user.id)?;
        info!("[AUTH] New user registered: {} ({})", user.email, user.role);
        Ok((user, token))
    }

    /// Verifies credentials and issues a session token.
    pub async fn login(&self, req: LoginRequest) -> AppResult<(UserAccount, String)> {
        let user = self.store.find_user_by_email(&req.email).await?;
        match user {
            Some(user) if verify_password(&req.password, &user.password_hash)? => {
                let token = self.auth.issue_token(user.id)?;
                info!("[AUTH] User logged in: {}", user.email);
                Ok((user, token))
            }
            _ => Err(AppError::Authentication("Invalid email or password".into())),
        }
    }

    /// Resolves a session cookie into the account it was issued for.
    /// Runs before any business logic; downstream code trusts the result.
    pub async fn resolve(&self, token: Option<&str>) -> AppResult<(UserAccount, Identity)> {
        let token = token
            .ok_or_else(|| AppError::Authentication("Not authorized, no token".into()))?;
        let user_id = self.auth.verify_token(token)?;
        let user = self
            .store
            .get_user(&user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".into()))?;
        let identity = Identity {
            user_id: user.id,
            role: user.role,
        };
        Ok((user, identity))
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserAccount>> {
        self.store.list_users().await
    }

    /// Deletes an account. An admin may remove their own account but never
    /// another admin's; both cases answer explicitly, never a silent no-op.
    pub async fn delete_user(&self, target_id: &Uuid, requester: &Identity) -> AppResult<()> {
        let target = self
            .store
            .get_user(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if target.role == Role::Admin && requester.user_id != target.id {
            return Err(AppError::Authorization("Cannot delete another Admin.".into()));
        }

        if !self.store.delete_user(target_id).await? {
            return Err(AppError::NotFound("User not found".into()));
        }
        info!("[AUTH] User removed: {}", target.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryStore::new()), AuthConfig::default())
    }

    fn signup_req(email: &str, role: Option<&str>) -> SignupRequest {
        SignupRequest {
            name: "Test User".into(),
            email: email.into(),
            password: "hunter2".into(),
            role: role.map(String::from),
        }
    }

    #[tokio::test]
    async fn should_default_signup_role_to_nurse() {
        let svc = service();
        let (user, _token) = svc.signup(signup_req("n@example.org", None)).await.unwrap();
        assert_eq!(user.role, Role::Nurse);
    }

    #[tokio::test]
    async fn should_reject_unknown_signup_role() {
        let svc = service();
        let err = svc
            .signup(signup_req("x@example.org", Some("root")))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("admin, doctor, nurse, data_entry")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn should_reject_duplicate_email() {
        let svc = service();
        svc.signup(signup_req("a@example.org", None)).await.unwrap();
        let err = svc.signup(signup_req("a@example.org", None)).await.unwrap_err();
        assert_eq!(err, AppError::Conflict("User already exists".into()));
    }

    #[tokio::test]
    async fn should_login_with_correct_password_only() {
        let svc = service();
        svc.signup(signup_req("a@example.org", None)).await.unwrap();

        let ok = svc
            .login(LoginRequest {
                email: "a@example.org".into(),
                password: "hunter2".into(),
            })
            .await;
        assert!(ok.is_ok());

        let err = svc
            .login(LoginRequest {
                email: "a@example.org".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Authentication("Invalid email or password".into()));
    }

    #[tokio::test]
    async fn should_resolve_identity_from_issued_token() {
        let svc = service();
        let (user, token) = svc
            .signup(signup_req("a@example.org", Some("doctor")))
            .await
            .unwrap();
        let (resolved, identity) = svc.resolve(Some(&token)).await.unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(identity.role, Role::Doctor);

        let err = svc.resolve(None).await.unwrap_err();
        assert_eq!(err, AppError::Authentication("Not authorized, no token".into()));
    }

    #[tokio::test]
    async fn should_protect_other_admin_accounts_from_deletion() {
        let svc = service();
        let (admin_a, _) = svc
            .signup(signup_req("a@example.org", Some("admin")))
            .await
            .unwrap();
        let (admin_b, _) = svc
            .signup(signup_req("b@example.org", Some("admin")))
            .await
            .unwrap();

        let a = Identity {
            user_id: admin_a.id,
            role: Role::Admin,
        };
        let err = svc.delete_user(&admin_b.id, &a).await.unwrap_err();
        assert_eq!(err, AppError::Authorization("Cannot delete another Admin.".into()));

        // self-deletion is allowed and actually removes the account
        svc.delete_user(&admin_a.id, &a).await.unwrap();
        let gone = svc.delete_user(&admin_a.id, &a).await.unwrap_err();
        assert_eq!(gone, AppError::NotFound("User not found".into()));
    }
}
