//! Patient record handlers: create, lookup, role-filtered listing, review,
//! edit, delete, plus admin-only user management.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::{Rejection, Reply};

use lib::auth::AccountService;
use lib::RecordService;
use models::{Capability, NewPatientData, PatientDataUpdate};

use super::filters::AuthContext;
use super::rejections::reject;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub status: String,
    #[serde(rename = "reviewNote", default)]
    pub review_note: Option<String>,
}

pub async fn create(
    ctx: AuthContext,
    input: NewPatientData,
    records: RecordService,
) -> Result<impl Reply, Rejection> {
    ctx.identity
        .require(Capability::CreateRecord)
        .map_err(reject)?;
    let record = records
        .create_record(input, &ctx.identity)
        .await
        .map_err(reject)?;
    let body = record.api_json().map_err(reject)?;
    Ok(warp::reply::json(&body))
}

pub async fn get_by_id(
    id: Uuid,
    ctx: AuthContext,
    records: RecordService,
) -> Result<impl Reply, Rejection> {
    ctx.identity
        .require(Capability::ViewRecord)
        .map_err(reject)?;
    let record = records.get_record(&id).await.map_err(reject)?;
    let body = record.api_json().map_err(reject)?;
    Ok(warp::reply::json(&body))
}

pub async fn list(ctx: AuthContext, records: RecordService) -> Result<impl Reply, Rejection> {
    ctx.identity
        .require(Capability::ListRecords)
        .map_err(reject)?;
    let visible = records.list_records(&ctx.identity).await.map_err(reject)?;
    let body = visible
        .iter()
        .map(|record| record.api_json())
        .collect::<Result<Vec<_>, _>>()
        .map_err(reject)?;
    Ok(warp::reply::json(&body))
}

pub async fn review(
    id: Uuid,
    ctx: AuthContext,
    req: ReviewRequest,
    records: RecordService,
) -> Result<impl Reply, Rejection> {
    ctx.identity
        .require(Capability::ReviewRecord)
        .map_err(reject)?;
    let record = records
        .review_record(&id, &req.status, req.review_note)
        .await
        .map_err(reject)?;
    let body = json!({
        "message": format!("Patient data set to {}.", record.review_status),
        "patient": record.api_json().map_err(reject)?,
    });
    Ok(warp::reply::json(&body))
}

pub async fn update(
    id: Uuid,
    ctx: AuthContext,
    patch: PatientDataUpdate,
    records: RecordService,
) -> Result<impl Reply, Rejection> {
    ctx.identity
        .require(Capability::EditRecord)
        .map_err(reject)?;
    let record = records
        .update_record(&id, &patch, &ctx.identity)
        .await
        .map_err(reject)?;
    let body = record.api_json().map_err(reject)?;
    Ok(warp::reply::json(&body))
}

pub async fn delete(
    id: Uuid,
    ctx: AuthContext,
    records: RecordService,
) -> Result<impl Reply, Rejection> {
    ctx.identity
        .require(Capability::DeleteRecord)
        .map_err(reject)?;
    records.delete_record(&id).await.map_err(reject)?;
    Ok(warp::reply::json(&json!({ "message": "Patient data removed" })))
}

pub async fn list_users(
    ctx: AuthContext,
    accounts: AccountService,
) -> Result<impl Reply, Rejection> {
    ctx.identity
        .require(Capability::ManageUsers)
        .map_err(reject)?;
    let users = accounts.list_users().await.map_err(reject)?;
    let body: Vec<_> = users.iter().map(|user| user.public_json()).collect();
    Ok(warp::reply::json(&body))
}

pub async fn delete_user(
    id: Uuid,
    ctx: AuthContext,
    accounts: AccountService,
) -> Result<impl Reply, Rejection> {
    ctx.identity
        .require(Capability::ManageUsers)
        .map_err(reject)?;
    accounts
        .delete_user(&id, &ctx.identity)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&json!({ "message": "User removed" })))
}
