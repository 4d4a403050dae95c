//! Maps application errors onto HTTP responses.
//!
//! Every handler failure travels as a custom rejection wrapping the
//! `AppError`; the recovery handler turns it into a status code plus a
//! `{ "message": ... }` body, the shape the historical clients expect.

use std::convert::Infallible;

use log::{error, warn};
use serde_json::json;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use models::AppError;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl warp::reject::Reject for ApiError {}

/// Wraps an `AppError` into a warp rejection.
pub fn reject(err: AppError) -> Rejection {
    warp::reject::custom(ApiError(err))
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
        AppError::Authorization(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(ApiError(app_err)) = err.find::<ApiError>() {
        let status = status_for(app_err);
        if status.is_server_error() {
            error!("[API] {}: {}", app_err.kind(), app_err);
        } else {
            warn!("[API] {}: {}", app_err.kind(), app_err);
        }
        (status, app_err.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Route not found".to_string())
    } else if let Some(body_err) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, body_err.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("[API] Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    let body = warp::reply::json(&json!({ "message": message }));
    Ok(warp::reply::with_status(body, status))
}
