//! Orders handlers

use axum::{extract::{State, Path, Query}, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, AppResult, AppError};
use crate::models::{Order, OrderFilter, OrderStatus, OrderWithDetails, CreateOrder, UpdateOrder};
use super::PageQuery;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// List orders with buyer and product names
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<OrderWithDetails>>> {
    let page = PageQuery { limit: query.limit, offset: query.offset };
    let filter = OrderFilter { status: query.status, user_id: query.user_id };

    let orders = Order::list(&state.pool, filter, page.limit(), page.offset()).await?;
    Ok(Json(orders))
}

/// Get single order
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = Order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    Ok(Json(order))
}

/// Create order
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOrder>,
) -> AppResult<Json<Order>> {
    req.validate()?;

    let order = Order::create(&state.pool, req).await?;
    tracing::info!("Order created: {} status={} amount={}", order.id, order.status, order.amount);
    Ok(Json(order))
}

/// Update order status or payment details
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrder>,
) -> AppResult<Json<Order>> {
    req.validate()?;

    let order = Order::update(&state.pool, id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    tracing::info!("Order updated: {} status={}", order.id, order.status);
    Ok(Json(order))
}

/// Delete order
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    if !Order::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Order not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
