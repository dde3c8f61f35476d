use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    config::{AuthConfig, DatabaseConfig},
    error::{AppError, Result},
    queries::admin_queries,
};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    tracing::info!(
        "Database connection established with {} max connections",
        config.max_connections
    );

    Ok(pool)
}

pub async fn check_health(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

/// Creates the configured admin account if it does not exist yet.
pub async fn seed_admin(pool: &PgPool, config: &AuthConfig) -> Result<()> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        tracing::debug!("No admin credentials configured, skipping seed");
        return Ok(());
    };

    if admin_queries::find_by_username(pool, username).await?.is_some() {
        return Ok(());
    }

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    if admin_queries::create_admin(pool, username, &password_hash)
        .await?
        .is_some()
    {
        tracing::info!("Seeded admin account {}", username);
    }

    Ok(())
}
