//! HTTP handlers

pub mod health;
pub mod categories;
pub mod products;
pub mod users;
pub mod orders;
pub mod subscriptions;
pub mod monitor;
pub mod ai;
pub mod broadcasts;
pub mod dashboard;

use serde::Deserialize;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
