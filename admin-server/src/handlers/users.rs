//! Users handlers

use axum::{extract::{State, Path, Query}, Json};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, AppResult, AppError};
use crate::models::{User, UserWithDetails, CreateUser, UpdateUser};
use super::PageQuery;

/// List users with order and subscription counters
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Vec<UserWithDetails>>> {
    let users = User::list(&state.pool, page.limit(), page.offset()).await?;
    Ok(Json(users))
}

/// Get single user
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let user = User::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Register a bot user
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateUser>,
) -> AppResult<Json<User>> {
    req.validate()?;

    let user = User::create(&state.pool, req).await?;
    tracing::info!("User created: telegram_id={} ({})", user.telegram_id, user.id);
    Ok(Json(user))
}

/// Update user
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    req.validate()?;

    let user = User::update(&state.pool, id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Delete user along with their orders and subscriptions
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    if !User::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
