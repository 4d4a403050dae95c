//! Delivery-mode prediction handler.

use serde_json::json;
use uuid::Uuid;
use warp::{Rejection, Reply};

use lib::RecordService;
use models::Capability;

use super::filters::AuthContext;
use super::rejections::reject;

pub async fn run(
    id: Uuid,
    ctx: AuthContext,
    records: RecordService,
) -> Result<impl Reply, Rejection> {
    ctx.identity
        .require(Capability::RunPrediction)
        .map_err(reject)?;
    let record = records.run_prediction(&id).await.map_err(reject)?;
    let body = json!({
        "predictionResult": record.prediction_result,
        "confidenceScore": record.confidence_score,
        "patient": record.api_json().map_err(reject)?,
    });
    Ok(warp::reply::json(&body))
}
