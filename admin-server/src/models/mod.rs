//! Data models

pub mod category;
pub mod product;
pub mod user;
pub mod order;
pub mod subscription;
pub mod broadcast;

pub use category::*;
pub use product::*;
pub use user::*;
pub use order::*;
pub use subscription::*;
pub use broadcast::*;
