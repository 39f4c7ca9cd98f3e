//! Product model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: Option<Uuid>,
    pub image: Option<String>,
    pub active: bool,
    pub post_payment_action: String,
    pub created_at: DateTime<Utc>,
}

/// What happens after a product is paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostPaymentAction {
    AutoFulfillment,
    ChatWithManager,
}

impl PostPaymentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoFulfillment => "auto_fulfillment",
            Self::ChatWithManager => "chat_with_manager",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub category_id: Option<Uuid>,
    #[validate(url)]
    pub image: Option<String>,
    pub active: Option<bool>,
    pub post_payment_action: Option<PostPaymentAction>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 64))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub category_id: Option<Uuid>,
    #[validate(url)]
    pub image: Option<String>,
    pub active: Option<bool>,
    pub post_payment_action: Option<PostPaymentAction>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub active: Option<bool>,
}

impl Product {
    pub async fn create(pool: &PgPool, data: CreateProduct) -> Result<Self, sqlx::Error> {
        let action = data.post_payment_action.unwrap_or(PostPaymentAction::AutoFulfillment);

        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (code, name, description, price, category_id, image, active, post_payment_action)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#
        )
        .bind(&data.code)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price)
        .bind(data.category_id)
        .bind(&data.image)
        .bind(data.active.unwrap_or(true))
        .bind(action.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, filter: ProductFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1::uuid IS NULL OR category_id = $1)
              AND ($2::boolean IS NULL OR active = $2)
            ORDER BY created_at DESC
            "#
        )
        .bind(filter.category_id)
        .bind(filter.active)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateProduct) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                category_id = COALESCE($6, category_id),
                image = COALESCE($7, image),
                active = COALESCE($8, active),
                post_payment_action = COALESCE($9, post_payment_action)
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(id)
        .bind(&data.code)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price)
        .bind(data.category_id)
        .bind(&data.image)
        .bind(data.active)
        .bind(data.post_payment_action.map(|a| a.as_str()))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_price_is_rejected() {
        let product = CreateProduct {
            code: "vpn-1m".to_string(),
            name: "VPN 1 month".to_string(),
            description: None,
            price: -1.0,
            category_id: None,
            image: None,
            active: None,
            post_payment_action: None,
        };
        assert!(product.validate().is_err());
    }

    #[test]
    fn test_post_payment_action_wire_names() {
        let action: PostPaymentAction = serde_json::from_str("\"chat_with_manager\"").unwrap();
        assert_eq!(action, PostPaymentAction::ChatWithManager);
        assert_eq!(PostPaymentAction::AutoFulfillment.as_str(), "auto_fulfillment");
    }
}
