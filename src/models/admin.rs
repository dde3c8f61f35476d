use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::OrderStats;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Admin {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            created_at: admin.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub products: i64,
    pub banners: i64,
    pub active_orders: i64,
    pub orders_by_status: OrderStats,
}
