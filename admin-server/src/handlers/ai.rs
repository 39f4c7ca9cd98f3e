//! AI assistant handlers

use axum::{extract::State, Json};

use subman_core::ai::{
    analyze_sales, generate_broadcast_message, BroadcastMessage, BroadcastMessageRequest,
    SalesAnalysisRequest, SalesReport,
};

use crate::{AppState, AppResult};

/// Draft a broadcast message for bot users
pub async fn broadcast_message(
    State(state): State<AppState>,
    Json(req): Json<BroadcastMessageRequest>,
) -> AppResult<Json<BroadcastMessage>> {
    let message = generate_broadcast_message(state.ai.as_ref(), &req).await?;
    Ok(Json(message))
}

/// Answer a sales question
pub async fn sales_analysis(
    State(state): State<AppState>,
    Json(req): Json<SalesAnalysisRequest>,
) -> AppResult<Json<SalesReport>> {
    let report = analyze_sales(state.ai.as_ref(), &req).await?;
    Ok(Json(report))
}
