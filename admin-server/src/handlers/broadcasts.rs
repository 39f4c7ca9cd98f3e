//! Broadcasts handlers

use axum::{extract::State, Json};

use crate::{AppState, AppResult};
use crate::models::{AudienceFilter, BroadcastAudience};

/// Resolve the users a broadcast with these filters would reach
pub async fn audience(
    State(state): State<AppState>,
    Json(filter): Json<AudienceFilter>,
) -> AppResult<Json<BroadcastAudience>> {
    let audience = filter.resolve(&state.pool).await?;
    tracing::info!("Broadcast audience resolved: {} users", audience.user_count);
    Ok(Json(audience))
}
