//! Order model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub status: String,
    pub amount: f64,
    pub payment_gateway: Option<String>,
    pub external_order_id: Option<String>,
    pub delivery_payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Order joined with buyer and product names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderWithDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub user_username: Option<String>,
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrder {
    pub user_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    pub status: Option<OrderStatus>,
    #[validate(length(max = 64))]
    pub payment_gateway: Option<String>,
    #[validate(length(max = 255))]
    pub external_order_id: Option<String>,
    pub delivery_payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrder {
    pub status: Option<OrderStatus>,
    #[validate(range(min = 0.0))]
    pub amount: Option<f64>,
    #[validate(length(max = 64))]
    pub payment_gateway: Option<String>,
    #[validate(length(max = 255))]
    pub external_order_id: Option<String>,
    pub delivery_payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub user_id: Option<Uuid>,
}

impl Order {
    pub async fn create(pool: &PgPool, data: CreateOrder) -> Result<Self, sqlx::Error> {
        let status = data.status.unwrap_or(OrderStatus::Pending);

        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (user_id, product_id, status, amount, payment_gateway,
                                external_order_id, delivery_payload, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $3 = 'paid' THEN NOW() END)
            RETURNING *
            "#
        )
        .bind(data.user_id)
        .bind(data.product_id)
        .bind(status.as_str())
        .bind(data.amount)
        .bind(&data.payment_gateway)
        .bind(&data.external_order_id)
        .bind(&data.delivery_payload)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: OrderFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OrderWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, OrderWithDetails>(
            r#"
            SELECT o.*, u.username AS user_username, p.name AS product_name
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            LEFT JOIN products p ON p.id = o.product_id
            WHERE ($1::varchar IS NULL OR o.status = $1)
              AND ($2::uuid IS NULL OR o.user_id = $2)
            ORDER BY o.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// First transition to `paid` stamps `paid_at`
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateOrder) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = COALESCE($2, status),
                amount = COALESCE($3, amount),
                payment_gateway = COALESCE($4, payment_gateway),
                external_order_id = COALESCE($5, external_order_id),
                delivery_payload = COALESCE($6, delivery_payload),
                paid_at = CASE
                    WHEN $2::varchar = 'paid' AND paid_at IS NULL THEN NOW()
                    ELSE paid_at
                END
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(id)
        .bind(data.status.map(|s| s.as_str()))
        .bind(data.amount)
        .bind(&data.payment_gateway)
        .bind(&data.external_order_id)
        .bind(&data.delivery_payload)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Order count and revenue from paid or later states
    pub async fn totals(pool: &PgPool) -> Result<(i64, f64), sqlx::Error> {
        sqlx::query_as::<_, (i64, f64)>(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(amount) FILTER (WHERE status IN ('paid', 'processing', 'completed')), 0)
            FROM orders
            "#
        )
        .fetch_one(pool)
        .await
    }
}
