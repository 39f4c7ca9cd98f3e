//! Categories handlers

use axum::{extract::{State, Path}, Json};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, AppResult, AppError};
use crate::models::{creates_cycle, Category, CreateCategory, UpdateCategory};

/// List all categories
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories = Category::list(&state.pool).await?;
    Ok(Json(categories))
}

/// Get single category
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Category>> {
    let category = Category::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// Create new category
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateCategory>,
) -> AppResult<Json<Category>> {
    req.validate()?;

    let category = Category::create(&state.pool, req).await?;
    tracing::info!("Category created: {} ({})", category.name, category.id);
    Ok(Json(category))
}

/// Update category
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCategory>,
) -> AppResult<Json<Category>> {
    req.validate()?;

    if let Some(parent_id) = req.parent_id {
        let links = Category::parent_links(&state.pool).await?;
        if creates_cycle(id, parent_id, &links) {
            return Err(AppError::ValidationError(
                "Category cannot be moved under itself or one of its descendants".to_string(),
            ));
        }
    }

    let category = Category::update(&state.pool, id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// Delete category
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    if !Category::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
