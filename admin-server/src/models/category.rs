//! Category model

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(url)]
    pub image: Option<String>,
    pub parent_id: Option<Uuid>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 64))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(url)]
    pub image: Option<String>,
    pub parent_id: Option<Uuid>,
    pub active: Option<bool>,
}

impl Category {
    pub async fn create(pool: &PgPool, data: CreateCategory) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (code, name, description, image, parent_id, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#
        )
        .bind(&data.code)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.image)
        .bind(data.parent_id)
        .bind(data.active.unwrap_or(true))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Parents sort before their children
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT * FROM categories ORDER BY parent_id NULLS FIRST, name"
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateCategory) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                image = COALESCE($5, image),
                parent_id = COALESCE($6, parent_id),
                active = COALESCE($7, active)
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(id)
        .bind(&data.code)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.image)
        .bind(data.parent_id)
        .bind(data.active)
        .fetch_optional(pool)
        .await
    }

    /// `(id, parent_id)` for every category
    pub async fn parent_links(pool: &PgPool) -> Result<HashMap<Uuid, Option<Uuid>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (Uuid, Option<Uuid>)>("SELECT id, parent_id FROM categories")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Whether making `parent` the parent of `id` closes a loop in the tree
pub fn creates_cycle(id: Uuid, parent: Uuid, links: &HashMap<Uuid, Option<Uuid>>) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(parent);

    while let Some(node) = current {
        if node == id {
            return true;
        }
        // Stop on a loop that already exists above `parent`
        if !seen.insert(node) {
            return false;
        }
        current = links.get(&node).copied().flatten();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let (a, _, _) = ids();
        assert!(creates_cycle(a, a, &HashMap::from([(a, None)])));
    }

    #[test]
    fn test_two_and_three_step_cycles() {
        let (a, b, c) = ids();

        // b is a child of a; making b the parent of a loops a -> b -> a
        let links = HashMap::from([(a, None), (b, Some(a))]);
        assert!(creates_cycle(a, b, &links));

        // c -> b -> a; making c the parent of a loops
        let links = HashMap::from([(a, None), (b, Some(a)), (c, Some(b))]);
        assert!(creates_cycle(a, c, &links));
        assert!(!creates_cycle(c, a, &links));
    }

    #[test]
    fn test_moving_under_unrelated_branch_is_allowed() {
        let (a, b, c) = ids();
        let links = HashMap::from([(a, None), (b, Some(a)), (c, None)]);
        assert!(!creates_cycle(b, c, &links));
    }

    #[test]
    fn test_existing_loop_above_parent_terminates() {
        let (a, b, c) = ids();
        let links = HashMap::from([(a, Some(b)), (b, Some(a)), (c, None)]);
        assert!(!creates_cycle(c, a, &links));
    }
}
