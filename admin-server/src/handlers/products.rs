//! Products handlers

use axum::{extract::{State, Path, Query}, Json};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, AppResult, AppError};
use crate::models::{Product, ProductFilter, CreateProduct, UpdateProduct};

/// List products, optionally by category or active flag
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<Vec<Product>>> {
    let products = Product::list(&state.pool, filter).await?;
    Ok(Json(products))
}

/// Get single product
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let product = Product::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// Create new product
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateProduct>,
) -> AppResult<Json<Product>> {
    req.validate()?;

    let product = Product::create(&state.pool, req).await?;
    tracing::info!("Product created: {} ({})", product.name, product.id);
    Ok(Json(product))
}

/// Update product
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProduct>,
) -> AppResult<Json<Product>> {
    req.validate()?;

    let product = Product::update(&state.pool, id, req)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// Delete product
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    if !Product::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
