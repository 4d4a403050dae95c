//! Authentication handlers: signup, login, logout and current-user lookup.

use serde_json::json;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use lib::auth::{AccountService, LoginRequest, SignupRequest};
use models::UserAccount;

use super::filters::{clear_session_cookie, session_cookie, AuthContext};
use super::rejections::reject;

fn session_user_json(user: &UserAccount) -> serde_json::Value {
    json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
    })
}

pub async fn signup(
    req: SignupRequest,
    accounts: AccountService,
) -> Result<impl Reply, Rejection> {
    let (user, token) = accounts.signup(req).await.map_err(reject)?;
    let cookie = session_cookie(&token, accounts.token_expiry_days(), accounts.secure_cookies());
    let body = warp::reply::json(&session_user_json(&user));
    Ok(warp::reply::with_header(
        warp::reply::with_status(body, StatusCode::CREATED),
        "set-cookie",
        cookie,
    ))
}

pub async fn login(
    req: LoginRequest,
    accounts: AccountService,
) -> Result<impl Reply, Rejection> {
    let (user, token) = accounts.login(req).await.map_err(reject)?;
    let cookie = session_cookie(&token, accounts.token_expiry_days(), accounts.secure_cookies());
    let body = warp::reply::json(&session_user_json(&user));
    Ok(warp::reply::with_header(
        warp::reply::with_status(body, StatusCode::OK),
        "set-cookie",
        cookie,
    ))
}

pub async fn logout(
    _ctx: AuthContext,
    accounts: AccountService,
) -> Result<impl Reply, Rejection> {
    let body = warp::reply::json(&json!({ "message": "Logged out successfully" }));
    Ok(warp::reply::with_header(
        warp::reply::with_status(body, StatusCode::OK),
        "set-cookie",
        clear_session_cookie(accounts.secure_cookies()),
    ))
}

pub async fn me(ctx: AuthContext) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&ctx.user.public_json()))
}
