use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::{
    error::Result,
    models::{CatalogFilter, ColorData, Product, ProductColor, ProductData, SortBy},
};

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn find_by_ids(pool: &PgPool, ids: &[i32]) -> Result<HashMap<i32, Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

pub async fn list_products(
    pool: &PgPool,
    filter: &CatalogFilter,
    sort: SortBy,
) -> Result<Vec<Product>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products WHERE 1=1");

    match filter {
        CatalogFilter::All => {}
        CatalogFilter::Category(category) => {
            query.push(" AND category = ");
            query.push_bind(category);
        }
        CatalogFilter::Discounted => {
            query.push(" AND discount > 0");
        }
        CatalogFilter::Search(term) => {
            let pattern = contains_pattern(term);
            let columns = [
                "name_fr",
                "name_ar",
                "COALESCE(desc_fr, '')",
                "COALESCE(desc_ar, '')",
                "category",
            ];

            query.push(" AND (");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    query.push(" OR ");
                }
                query.push(*column);
                query.push(" ILIKE ");
                query.push_bind(pattern.clone());
                query.push(r" ESCAPE '\'");
            }
            query.push(")");
        }
    }

    query.push(" ORDER BY ");
    query.push(sort.order_clause());

    let products = query.build_query_as::<Product>().fetch_all(pool).await?;

    Ok(products)
}

/// `%term%` with the LIKE wildcards and the escape character in `term` escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn count_products(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn find_colors_by_product_id(pool: &PgPool, product_id: i32) -> Result<Vec<ProductColor>> {
    let colors = sqlx::query_as::<_, ProductColor>(
        "SELECT * FROM product_colors WHERE product_id = $1 ORDER BY id ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(colors)
}

pub async fn find_colors_by_product_ids(
    pool: &PgPool,
    product_ids: &[i32],
) -> Result<HashMap<i32, Vec<ProductColor>>> {
    let colors = sqlx::query_as::<_, ProductColor>(
        "SELECT * FROM product_colors WHERE product_id = ANY($1) ORDER BY product_id, id ASC",
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await?;

    let mut colors_map: HashMap<i32, Vec<ProductColor>> = HashMap::new();
    for color in colors {
        colors_map.entry(color.product_id).or_default().push(color);
    }

    Ok(colors_map)
}

pub async fn find_colors_by_ids(pool: &PgPool, ids: &[i32]) -> Result<HashMap<i32, ProductColor>> {
    let colors =
        sqlx::query_as::<_, ProductColor>("SELECT * FROM product_colors WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

    Ok(colors.into_iter().map(|c| (c.id, c)).collect())
}

pub async fn create_product(
    tx: &mut Transaction<'_, Postgres>,
    data: &ProductData,
) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            name_fr, name_ar, desc_fr, desc_ar, price, discount, category, stock, image
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(&data.name_fr)
    .bind(&data.name_ar)
    .bind(&data.desc_fr)
    .bind(&data.desc_ar)
    .bind(data.price)
    .bind(data.discount)
    .bind(&data.category)
    .bind(data.stock)
    .bind(&data.image)
    .fetch_one(&mut **tx)
    .await?;

    Ok(product)
}

pub async fn update_product(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
    data: &ProductData,
) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET
            name_fr = $1,
            name_ar = $2,
            desc_fr = $3,
            desc_ar = $4,
            price = $5,
            discount = $6,
            category = $7,
            stock = $8,
            image = $9
        WHERE id = $10
        RETURNING *
        "#,
    )
    .bind(&data.name_fr)
    .bind(&data.name_ar)
    .bind(&data.desc_fr)
    .bind(&data.desc_ar)
    .bind(data.price)
    .bind(data.discount)
    .bind(&data.category)
    .bind(data.stock)
    .bind(&data.image)
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(product)
}

/// Deletes the product (colors cascade) and returns the removed row.
pub async fn delete_product(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("DELETE FROM products WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn insert_color(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i32,
    color: &ColorData,
) -> Result<ProductColor> {
    let color = sqlx::query_as::<_, ProductColor>(
        "INSERT INTO product_colors (product_id, name_fr, name_ar, hex_code, stock, image)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(product_id)
    .bind(&color.name_fr)
    .bind(&color.name_ar)
    .bind(&color.hex_code)
    .bind(color.stock)
    .bind(&color.image)
    .fetch_one(&mut **tx)
    .await?;

    Ok(color)
}

pub async fn update_color(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i32,
    color_id: i32,
    color: &ColorData,
) -> Result<Option<ProductColor>> {
    let color = sqlx::query_as::<_, ProductColor>(
        "UPDATE product_colors
         SET name_fr = $1, name_ar = $2, hex_code = $3, stock = $4, image = $5
         WHERE id = $6 AND product_id = $7
         RETURNING *",
    )
    .bind(&color.name_fr)
    .bind(&color.name_ar)
    .bind(&color.hex_code)
    .bind(color.stock)
    .bind(&color.image)
    .bind(color_id)
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(color)
}

pub async fn delete_colors(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i32,
    color_ids: &[i32],
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM product_colors WHERE product_id = $1 AND id = ANY($2)")
        .bind(product_id)
        .bind(color_ids)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("rouge"), "%rouge%");
        assert_eq!(contains_pattern("_"), r"%\_%");
        assert_eq!(contains_pattern("50%"), r"%50\%%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
