use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Banner, BannerData},
};

pub async fn get_active(pool: &PgPool) -> Result<Vec<Banner>> {
    let banners = sqlx::query_as::<_, Banner>(
        "SELECT * FROM banners WHERE active = TRUE ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(banners)
}

pub async fn get_all(pool: &PgPool) -> Result<Vec<Banner>> {
    let banners = sqlx::query_as::<_, Banner>("SELECT * FROM banners ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    Ok(banners)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Banner>> {
    let banner = sqlx::query_as::<_, Banner>("SELECT * FROM banners WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(banner)
}

pub async fn count_banners(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM banners")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn create_banner(pool: &PgPool, data: &BannerData) -> Result<Banner> {
    let banner = sqlx::query_as::<_, Banner>(
        "INSERT INTO banners (title_fr, title_ar, subtitle_fr, subtitle_ar, image, active)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(&data.title_fr)
    .bind(&data.title_ar)
    .bind(&data.subtitle_fr)
    .bind(&data.subtitle_ar)
    .bind(&data.image)
    .bind(data.active)
    .fetch_one(pool)
    .await?;

    Ok(banner)
}

pub async fn update_banner(pool: &PgPool, id: i32, data: &BannerData) -> Result<Option<Banner>> {
    let banner = sqlx::query_as::<_, Banner>(
        "UPDATE banners
         SET title_fr = $1, title_ar = $2, subtitle_fr = $3, subtitle_ar = $4, image = $5, active = $6
         WHERE id = $7
         RETURNING *",
    )
    .bind(&data.title_fr)
    .bind(&data.title_ar)
    .bind(&data.subtitle_fr)
    .bind(&data.subtitle_ar)
    .bind(&data.image)
    .bind(data.active)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(banner)
}

pub async fn delete_banner(pool: &PgPool, id: i32) -> Result<Option<Banner>> {
    let banner = sqlx::query_as::<_, Banner>("DELETE FROM banners WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(banner)
}
