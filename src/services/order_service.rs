use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{
        CreateOrderRequest, Notification, OrderItemData, OrderItemRequest, OrderResponse, Product,
        ProductColor,
    },
    queries::{order_queries, product_queries},
    services::notification_service::Notifier,
};

/// Validates and stores a checkout, then notifies connected admins.
pub async fn place_order(
    pool: &PgPool,
    notifier: &Notifier,
    request: &CreateOrderRequest,
) -> Result<OrderResponse> {
    let customer = request.validate()?;

    let product_ids: Vec<i32> = request.items.iter().map(|i| i.product_id).collect();
    let color_ids: Vec<i32> = request.items.iter().filter_map(|i| i.color_id).collect();

    let products = product_queries::find_by_ids(pool, &product_ids).await?;
    let colors = if color_ids.is_empty() {
        HashMap::new()
    } else {
        product_queries::find_colors_by_ids(pool, &color_ids).await?
    };

    let lines = price_lines(&request.items, &products, &colors)?;

    let order =
        order_queries::create_order_with_items(pool, &customer, request.order_source, &lines)
            .await?;
    let items = order_queries::get_items_for_order(pool, order.id).await?;

    tracing::info!(
        "Order {} created from {} with {} line(s), total {}",
        order.id,
        order.order_source.as_str(),
        items.len(),
        order.total
    );

    let item_count = items.iter().map(|i| i64::from(i.quantity)).sum();
    notifier.publish(Notification::new_order(&order, item_count));

    Ok(OrderResponse { order, items })
}

/// Resolves each requested line against the catalog, snapshotting names and
/// the discounted unit price.
pub fn price_lines(
    items: &[OrderItemRequest],
    products: &HashMap<i32, Product>,
    colors: &HashMap<i32, ProductColor>,
) -> Result<Vec<OrderItemData>> {
    items
        .iter()
        .map(|item| {
            let product = products.get(&item.product_id).ok_or_else(|| {
                AppError::BadRequest(format!("Product with id {} not found", item.product_id))
            })?;

            let color = item
                .color_id
                .map(|color_id| {
                    colors
                        .get(&color_id)
                        .filter(|c| c.product_id == product.id)
                        .ok_or_else(|| {
                            AppError::BadRequest(format!(
                                "Color {} does not belong to product {}",
                                color_id, product.id
                            ))
                        })
                })
                .transpose()?;

            Ok(OrderItemData {
                product_id: product.id,
                color_id: color.map(|c| c.id),
                product_name_fr: product.name_fr.clone(),
                product_name_ar: product.name_ar.clone(),
                color_name_fr: color.map(|c| c.name_fr.clone()),
                color_name_ar: color.map(|c| c.name_ar.clone()),
                quantity: item.quantity,
                price: product.final_price(),
                image: color
                    .and_then(|c| c.image.clone())
                    .or_else(|| product.image.clone()),
                color_hex: color.map(|c| c.hex_code.clone()),
            })
        })
        .collect()
}
