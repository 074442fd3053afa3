//! Predictions handler: best-effort recommendations.
//!
//! The user resolves through the gateway (typed 404/422 on bad ids), the
//! internal key goes to the recommender, and the returned product ids are
//! spliced with catalog attributes through one bulk lookup. Recommender
//! failure of any shape degrades to a 200 with an empty list; gateway
//! failure keeps its normal error semantics.
//!
use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use tracing::warn;

use crate::edge::error::EdgeResult;
use crate::edge::models::ids::parse_user_id;
use crate::edge::models::{ApiEnvelope, PredictionExternal, PredictionsData};

use super::EdgeState;

pub(super) async fn predictions_for_user(
    State(state): State<EdgeState>,
    Path(user_id): Path<String>,
) -> EdgeResult<Json<ApiEnvelope<PredictionsData>>> {
    let user_id = parse_user_id(&user_id)?;
    let resolved = state.gateway.users().resolve(user_id).await?;

    let response = match state.recommender.predict(resolved.internal_id).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "recommender unavailable; degrading to empty predictions");
            return Ok(Json(ApiEnvelope::new(
                "recommendations temporarily unavailable",
                PredictionsData::empty(),
            )));
        }
    };

    // One bulk lookup for the whole id set; ranking order is preserved by
    // splicing products back onto the scored list.
    let ids: Vec<i32> = response.predictions.iter().map(|p| p.product_id).collect();
    let products = state.gateway.products().lookup(&ids).await?;
    let mut by_id: HashMap<i32, _> = products.into_iter().map(|p| (p.product_id, p)).collect();

    let predictions: Vec<PredictionExternal> = response
        .predictions
        .iter()
        .filter_map(|p| {
            by_id.remove(&p.product_id).map(|product| PredictionExternal {
                product: product.into(),
                score: p.score,
            })
        })
        .collect();

    let total = predictions.len() as i64;
    Ok(Json(ApiEnvelope::new(
        "predictions generated",
        PredictionsData { predictions, total },
    )))
}
