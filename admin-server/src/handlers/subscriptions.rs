//! Subscriptions handlers
//!
//! Served through the shared `SubscriptionRepository`, so the monitor and
//! the CRUD endpoints always see the same records.

use axum::{extract::{State, Path}, Json};

use subman_core::monitor::SubscriptionRecord;

use crate::{AppState, AppResult, AppError};
use crate::models::{CreateSubscription, UpdateSubscription};

/// List subscriptions
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<SubscriptionRecord>>> {
    let records = state.subscriptions.list().await?;
    Ok(Json(records))
}

/// Get single subscription
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SubscriptionRecord>> {
    let record = state.subscriptions
        .find(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

    Ok(Json(record))
}

/// Create subscription
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateSubscription>,
) -> AppResult<Json<SubscriptionRecord>> {
    let record = req.into_record();
    ensure_period(&record)?;

    let record = state.subscriptions.create(record).await?;
    tracing::info!("Subscription created: {} status={}", record.id, record.status);
    Ok(Json(record))
}

/// Update subscription fields
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSubscription>,
) -> AppResult<Json<SubscriptionRecord>> {
    let existing = state.subscriptions
        .find(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

    let record = req.apply(existing);
    ensure_period(&record)?;

    let record = state.subscriptions.update(record).await?;
    tracing::info!("Subscription updated: {} status={}", record.id, record.status);
    Ok(Json(record))
}

/// Delete subscription
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    state.subscriptions.delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

fn ensure_period(record: &SubscriptionRecord) -> AppResult<()> {
    if let (Some(start), Some(end)) = (record.start_at(), record.end_at()) {
        if end < start {
            return Err(AppError::ValidationError("endDate is before startDate".to_string()));
        }
    }
    Ok(())
}
