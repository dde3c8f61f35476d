use axum::{
    Json,
    extract::{Multipart, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{Banner, BannerForm},
    queries::banner_queries,
    utils::{extractors::AppPath, multipart::FormParts},
};

pub async fn active_banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>> {
    let banners = banner_queries::get_active(&state.db).await?;
    Ok(Json(banners))
}

pub async fn all_banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>> {
    let banners = banner_queries::get_all(&state.db).await?;
    Ok(Json(banners))
}

pub async fn get_banner(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<Banner>> {
    let banner = find_banner(&state, id).await?;
    Ok(Json(banner))
}

pub async fn create_banner(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Banner>)> {
    let mut parts = FormParts::read(multipart).await?;
    let form = banner_form(&parts);

    let image = parts
        .take_file("image")
        .ok_or_else(|| AppError::BadRequest("Banner image is required".to_string()))?;
    let path = state.uploads.save(&image).await?;

    let banner = match banner_queries::create_banner(&state.db, &form.into_data(path.clone())).await
    {
        Ok(banner) => banner,
        Err(e) => {
            state.uploads.remove(&path).await;
            return Err(e);
        }
    };

    tracing::info!("Banner {} created", banner.id);

    Ok((StatusCode::CREATED, Json(banner)))
}

pub async fn update_banner(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    multipart: Multipart,
) -> Result<Json<Banner>> {
    let existing = find_banner(&state, id).await?;

    let mut parts = FormParts::read(multipart).await?;
    let form = banner_form(&parts);
    let form = BannerForm {
        title_fr: form.title_fr.or(existing.title_fr),
        title_ar: form.title_ar.or(existing.title_ar),
        subtitle_fr: form.subtitle_fr.or(existing.subtitle_fr),
        subtitle_ar: form.subtitle_ar.or(existing.subtitle_ar),
        active: form.active.or(Some(existing.active)),
    };

    let new_image = match parts.take_file("image") {
        Some(file) => Some(state.uploads.save(&file).await?),
        None => None,
    };
    let image = new_image.clone().unwrap_or_else(|| existing.image.clone());

    let updated = match banner_queries::update_banner(&state.db, id, &form.into_data(image)).await
    {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(path) = &new_image {
                state.uploads.remove(path).await;
            }
            return Err(e);
        }
    };

    let Some(banner) = updated else {
        if let Some(path) = &new_image {
            state.uploads.remove(path).await;
        }
        return Err(AppError::NotFound(format!("Banner with id {} not found", id)));
    };

    if new_image.is_some() {
        state.uploads.remove(&existing.image).await;
    }

    tracing::info!("Banner {} updated", id);

    Ok(Json(banner))
}

pub async fn delete_banner(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode> {
    let banner = banner_queries::delete_banner(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Banner with id {} not found", id)))?;

    state.uploads.remove(&banner.image).await;

    tracing::info!("Banner {} deleted", id);

    Ok(StatusCode::NO_CONTENT)
}

async fn find_banner(state: &AppState, id: i32) -> Result<Banner> {
    banner_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Banner with id {} not found", id)))
}

fn banner_form(parts: &FormParts) -> BannerForm {
    BannerForm {
        title_fr: parts.text("title_fr"),
        title_ar: parts.text("title_ar"),
        subtitle_fr: parts.text("subtitle_fr"),
        subtitle_ar: parts.text("subtitle_ar"),
        active: parts.text("active").map(|v| BannerForm::parse_active(&v)),
    }
}
