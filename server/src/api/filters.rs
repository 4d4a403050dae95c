//! Shared warp filters: service injection and cookie-based identity
//! resolution.

use std::convert::Infallible;

use warp::{Filter, Rejection};

use lib::auth::AccountService;
use lib::RecordService;
use models::{Identity, UserAccount};

use super::rejections::reject;

pub const SESSION_COOKIE: &str = "jwt";

/// Resolved caller handed to protected handlers.
#[derive(Clone)]
pub struct AuthContext {
    pub user: UserAccount,
    pub identity: Identity,
}

pub fn with_accounts(
    accounts: AccountService,
) -> impl Filter<Extract = (AccountService,), Error = Infallible> + Clone {
    warp::any().map(move || accounts.clone())
}

pub fn with_records(
    records: RecordService,
) -> impl Filter<Extract = (RecordService,), Error = Infallible> + Clone {
    warp::any().map(move || records.clone())
}

/// Requires a valid session cookie and resolves it to the account. Missing
/// or invalid credentials fail the request before any handler logic runs.
pub fn authenticated(
    accounts: AccountService,
) -> impl Filter<Extract = (AuthContext,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(with_accounts(accounts))
        .and_then(|token: Option<String>, accounts: AccountService| async move {
            match accounts.resolve(token.as_deref()).await {
                Ok((user, identity)) => Ok(AuthContext { user, identity }),
                Err(err) => Err(reject(err)),
            }
        })
}

/// Builds the Set-Cookie value for a fresh session. `secure` restricts the
/// cookie to HTTPS and follows the deployment configuration.
pub fn session_cookie(token: &str, max_age_days: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Max-Age={}; Path=/",
        SESSION_COOKIE,
        token,
        max_age_days * 24 * 60 * 60
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Builds the Set-Cookie value that clears the session.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{}=; HttpOnly; SameSite=Strict; Max-Age=0; Path=/",
        SESSION_COOKIE
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
