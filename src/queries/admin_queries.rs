use sqlx::PgPool;

use crate::{error::Result, models::Admin};

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Admin>> {
    let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(admin)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Admin>> {
    let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(admin)
}

/// Inserts an admin unless the username is already taken.
pub async fn create_admin(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> Result<Option<Admin>> {
    let admin = sqlx::query_as::<_, Admin>(
        "INSERT INTO admins (username, password_hash)
         VALUES ($1, $2)
         ON CONFLICT (username) DO NOTHING
         RETURNING *",
    )
    .bind(username)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    Ok(admin)
}
