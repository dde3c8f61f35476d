use std::collections::{HashMap, HashSet};

use axum::{
    Json,
    extract::{Multipart, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        CatalogFilter, ColorData, ColorInput, Product, ProductColor, ProductForm,
        ProductListQuery, ProductResponse, ProductSearchQuery, SortBy,
    },
    queries::product_queries,
    services::upload_service::UploadStore,
    utils::{
        extractors::{AppPath, AppQuery},
        multipart::{FormParts, UploadedFile},
    },
};

const COLOR_IMAGE_PREFIX: &str = "colorImage_";
const COLOR_IMAGE_INDEX_PREFIX: &str = "colorImageIndex_";

// PUBLIC ROUTES

pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    catalog(&state, &CatalogFilter::All, query.sort.unwrap_or_default()).await
}

pub async fn products_by_category(
    State(state): State<AppState>,
    AppPath(category): AppPath<String>,
    AppQuery(query): AppQuery<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let filter = CatalogFilter::Category(category);
    catalog(&state, &filter, query.sort.unwrap_or_default()).await
}

pub async fn discounted_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let sort = query.sort.unwrap_or(SortBy::Discount);
    catalog(&state, &CatalogFilter::Discounted, sort).await
}

pub async fn search_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductSearchQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let Some(term) = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
    else {
        return Ok(Json(Vec::new()));
    };

    let filter = CatalogFilter::Search(term.to_string());
    catalog(&state, &filter, query.sort.unwrap_or_default()).await
}

pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<ProductResponse>> {
    let product = find_product(&state, id).await?;
    let colors = product_queries::find_colors_by_product_id(&state.db, id).await?;

    Ok(Json(ProductResponse::new(product, colors)))
}

pub async fn get_product_colors(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<Vec<ProductColor>>> {
    find_product(&state, id).await?;
    let colors = product_queries::find_colors_by_product_id(&state.db, id).await?;

    Ok(Json(colors))
}

async fn catalog(
    state: &AppState,
    filter: &CatalogFilter,
    sort: SortBy,
) -> Result<Json<Vec<ProductResponse>>> {
    let products = product_queries::list_products(&state.db, filter, sort).await?;

    let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    let mut colors = product_queries::find_colors_by_product_ids(&state.db, &ids).await?;

    let response = products
        .into_iter()
        .map(|product| {
            let product_colors = colors.remove(&product.id).unwrap_or_default();
            ProductResponse::new(product, product_colors)
        })
        .collect();

    Ok(Json(response))
}

async fn find_product(state: &AppState, id: i32) -> Result<Product> {
    product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))
}

// ADMIN ROUTES

pub async fn create_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let mut parts = FormParts::read(multipart).await?;
    let mut form = product_form(&parts)?;
    let color_inputs = form.colors.take().unwrap_or_default();

    let image = parts
        .take_file("image")
        .ok_or_else(|| AppError::BadRequest("Product image is required".to_string()))?;
    let mut data = form.into_data(None)?;
    let color_files = take_color_files(&mut parts)?;

    let mut new_files = Vec::new();
    let result = async {
        let path = state.uploads.save(&image).await?;
        new_files.push(path.clone());
        data.image = Some(path);

        let colors =
            resolve_colors(&state.uploads, color_inputs, color_files, &mut new_files).await?;

        let mut tx = state.db.begin().await?;
        let product = product_queries::create_product(&mut tx, &data).await?;
        let mut saved_colors = Vec::with_capacity(colors.len());
        for color in &colors {
            saved_colors.push(product_queries::insert_color(&mut tx, product.id, color).await?);
        }
        tx.commit().await?;

        Ok::<_, AppError>(ProductResponse::new(product, saved_colors))
    }
    .await;

    match result {
        Ok(response) => {
            tracing::info!("Product {} created", response.product.id);
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(e) => {
            state.uploads.remove_all(&new_files).await;
            Err(e)
        }
    }
}

pub async fn update_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>> {
    let existing = find_product(&state, id).await?;

    let mut parts = FormParts::read(multipart).await?;
    let mut form = product_form(&parts)?;
    let color_inputs = form.colors.take();

    let image = parts.take_file("image");
    let mut data = form.into_data(Some(&existing))?;
    let color_files = take_color_files(&mut parts)?;

    let mut new_files = Vec::new();
    let mut obsolete_files = Vec::new();
    let result = async {
        if let Some(image) = image {
            let path = state.uploads.save(&image).await?;
            new_files.push(path.clone());
            obsolete_files.extend(existing.image.clone());
            data.image = Some(path);
        }

        let colors = match color_inputs {
            Some(inputs) => Some(
                resolve_colors(&state.uploads, inputs, color_files, &mut new_files).await?,
            ),
            None => None,
        };

        let current = product_queries::find_colors_by_product_id(&state.db, id).await?;

        let mut tx = state.db.begin().await?;
        let product = product_queries::update_product(&mut tx, id, &data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

        if let Some(colors) = colors {
            let plan = ColorSync::plan(&current, colors);

            for (color_id, color) in &plan.update {
                product_queries::update_color(&mut tx, id, *color_id, color).await?;
            }
            for color in &plan.insert {
                product_queries::insert_color(&mut tx, id, color).await?;
            }
            if !plan.delete.is_empty() {
                product_queries::delete_colors(&mut tx, id, &plan.delete).await?;
            }
            obsolete_files.extend(plan.obsolete_images);
        }

        tx.commit().await?;
        Ok::<_, AppError>(product)
    }
    .await;

    let product = match result {
        Ok(product) => product,
        Err(e) => {
            state.uploads.remove_all(&new_files).await;
            return Err(e);
        }
    };

    state.uploads.remove_all(&obsolete_files).await;

    let colors = product_queries::find_colors_by_product_id(&state.db, id).await?;

    tracing::info!("Product {} updated", id);

    Ok(Json(ProductResponse::new(product, colors)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode> {
    let colors = product_queries::find_colors_by_product_id(&state.db, id).await?;

    let product = product_queries::delete_product(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    let images: Vec<String> = product
        .image
        .into_iter()
        .chain(colors.into_iter().filter_map(|c| c.image))
        .collect();
    state.uploads.remove_all(&images).await;

    tracing::info!("Product {} deleted", id);

    Ok(StatusCode::NO_CONTENT)
}

fn product_form(parts: &FormParts) -> Result<ProductForm> {
    let colors = parts
        .text("colors")
        .map(|raw| {
            serde_json::from_str::<Vec<ColorInput>>(&raw)
                .map_err(|e| AppError::BadRequest(format!("Invalid colors: {}", e)))
        })
        .transpose()?;

    Ok(ProductForm {
        name_fr: parts.text("name_fr"),
        name_ar: parts.text("name_ar"),
        desc_fr: parts.text("desc_fr"),
        desc_ar: parts.text("desc_ar"),
        price: parts.parse("price")?,
        discount: parts.parse("discount")?,
        category: parts.text("category"),
        stock: parts.parse("stock")?,
        colors,
    })
}

/// Collects `colorImage_{i}` files keyed by the color index they belong to.
///
/// `colorImageIndex_{i}` overrides the target index when present.
fn take_color_files(parts: &mut FormParts) -> Result<HashMap<usize, UploadedFile>> {
    let keys: Vec<String> = parts
        .files
        .keys()
        .filter(|k| k.starts_with(COLOR_IMAGE_PREFIX))
        .cloned()
        .collect();

    let mut files = HashMap::new();
    for key in keys {
        let suffix = &key[COLOR_IMAGE_PREFIX.len()..];
        let position: usize = suffix
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid color image field {}", key)))?;
        let target = parts
            .parse::<usize>(&format!("{}{}", COLOR_IMAGE_INDEX_PREFIX, suffix))?
            .unwrap_or(position);

        if let Some(file) = parts.take_file(&key) {
            files.insert(target, file);
        }
    }

    Ok(files)
}

async fn resolve_colors(
    uploads: &UploadStore,
    inputs: Vec<ColorInput>,
    mut files: HashMap<usize, UploadedFile>,
    new_files: &mut Vec<String>,
) -> Result<Vec<ColorData>> {
    let mut colors = inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| input.into_data(index))
        .collect::<Result<Vec<_>>>()?;

    for (index, color) in colors.iter_mut().enumerate() {
        if let Some(file) = files.remove(&index) {
            let path = uploads.save(&file).await?;
            new_files.push(path.clone());
            color.image = Some(path);
        }
    }

    Ok(colors)
}

/// How a submitted color list maps onto the stored colors of a product.
///
/// A matched color without a new upload keeps the image already stored for it.
#[derive(Debug, Default)]
struct ColorSync {
    update: Vec<(i32, ColorData)>,
    insert: Vec<ColorData>,
    delete: Vec<i32>,
    obsolete_images: Vec<String>,
}

impl ColorSync {
    fn plan(current: &[ProductColor], submitted: Vec<ColorData>) -> Self {
        let by_id: HashMap<i32, &ProductColor> = current.iter().map(|c| (c.id, c)).collect();
        let mut plan = ColorSync::default();
        let mut kept = HashSet::new();

        for mut color in submitted {
            match color.id.and_then(|id| by_id.get(&id)) {
                Some(existing) => {
                    kept.insert(existing.id);
                    if color.image.is_some() {
                        plan.obsolete_images.extend(existing.image.clone());
                    } else {
                        color.image = existing.image.clone();
                    }
                    plan.update.push((existing.id, color));
                }
                None => plan.insert.push(color),
            }
        }

        for color in current.iter().filter(|c| !kept.contains(&c.id)) {
            plan.delete.push(color.id);
            plan.obsolete_images.extend(color.image.clone());
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Bytes;

    use super::*;

    fn stored(id: i32, image: Option<&str>) -> ProductColor {
        ProductColor {
            id,
            product_id: 1,
            name_fr: format!("Couleur {}", id),
            name_ar: format!("لون {}", id),
            hex_code: "#000000".to_string(),
            stock: 1,
            image: image.map(str::to_string),
        }
    }

    fn submitted(id: Option<i32>, image: Option<&str>) -> ColorData {
        ColorData {
            id,
            name_fr: "Bleu".to_string(),
            name_ar: "أزرق".to_string(),
            hex_code: "#0000ff".to_string(),
            stock: 2,
            image: image.map(str::to_string),
        }
    }

    #[test]
    fn sync_updates_inserts_and_deletes() {
        let current = vec![
            stored(1, Some("/uploads/a.png")),
            stored(2, Some("/uploads/b.png")),
        ];
        let plan = ColorSync::plan(&current, vec![submitted(Some(1), None), submitted(None, None)]);

        assert_eq!(plan.update.len(), 1);
        assert_eq!(plan.update[0].0, 1);
        assert_eq!(plan.update[0].1.image.as_deref(), Some("/uploads/a.png"));
        assert_eq!(plan.insert.len(), 1);
        assert_eq!(plan.delete, vec![2]);
        assert_eq!(plan.obsolete_images, vec!["/uploads/b.png".to_string()]);
    }

    #[test]
    fn replaced_color_image_is_obsolete() {
        let current = vec![stored(1, Some("/uploads/old.png"))];
        let plan = ColorSync::plan(&current, vec![submitted(Some(1), Some("/uploads/new.png"))]);

        assert!(plan.delete.is_empty());
        assert_eq!(plan.obsolete_images, vec!["/uploads/old.png".to_string()]);
    }

    #[test]
    fn client_image_path_does_not_replace_stored_image() {
        let input: ColorInput = serde_json::from_str(
            r#"{"id": 1, "name_fr": "Bleu", "name_ar": "أزرق", "image": "/uploads/other-product.png"}"#,
        )
        .unwrap();
        let color = input.into_data(0).unwrap();
        assert!(color.image.is_none());

        let current = vec![stored(1, Some("/uploads/mine.png"))];
        let plan = ColorSync::plan(&current, vec![color]);

        assert_eq!(plan.update[0].1.image.as_deref(), Some("/uploads/mine.png"));
        assert!(plan.obsolete_images.is_empty());
    }

    #[test]
    fn new_color_without_upload_has_no_image() {
        let input: ColorInput = serde_json::from_str(
            r#"{"id": "temp-1", "name_fr": "Vert", "name_ar": "أخضر", "image": "/uploads/other-product.png"}"#,
        )
        .unwrap();
        let plan = ColorSync::plan(&[], vec![input.into_data(0).unwrap()]);

        assert!(plan.insert[0].image.is_none());
    }

    #[test]
    fn unknown_id_is_inserted() {
        let plan = ColorSync::plan(&[], vec![submitted(Some(42), None)]);

        assert!(plan.update.is_empty());
        assert_eq!(plan.insert.len(), 1);
    }

    #[test]
    fn color_files_follow_their_index_field() {
        let mut parts = FormParts::default();
        parts.files.insert(
            "colorImage_0".to_string(),
            UploadedFile {
                file_name: Some("red.png".to_string()),
                content_type: Some("image/png".to_string()),
                bytes: Bytes::from_static(b"png"),
            },
        );
        parts
            .fields
            .insert("colorImageIndex_0".to_string(), "2".to_string());

        let files = take_color_files(&mut parts).unwrap();

        assert!(files.contains_key(&2));
        assert!(parts.files.is_empty());
    }
}
