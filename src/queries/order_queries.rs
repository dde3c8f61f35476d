use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, Result},
    models::{
        CustomerInfo, Order, OrderFilter, OrderItem, OrderItemData, OrderResponse, OrderSource,
        OrderStatus,
    },
};

/// Order columns plus the total derived from the stored line prices.
const ORDER_SELECT: &str = "SELECT o.id, o.customer_name, o.phone, o.address, o.notes, o.status,
        o.order_source, o.order_date, o.completed_date,
        COALESCE((SELECT SUM(oi.price * oi.quantity) FROM order_items oi WHERE oi.order_id = o.id), 0) AS total
     FROM orders o";

/// Inserts the order header and all of its lines in one transaction.
pub async fn create_order_with_items(
    pool: &PgPool,
    customer: &CustomerInfo,
    source: OrderSource,
    items: &[OrderItemData],
) -> Result<Order> {
    let mut tx = pool.begin().await?;

    let order_id: i32 = sqlx::query_scalar(
        "INSERT INTO orders (customer_name, phone, address, notes, order_source)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(&customer.address)
    .bind(&customer.notes)
    .bind(source)
    .fetch_one(&mut *tx)
    .await?;

    let product_ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
    let color_ids: Vec<Option<i32>> = items.iter().map(|i| i.color_id).collect();
    let names_fr: Vec<&str> = items.iter().map(|i| i.product_name_fr.as_str()).collect();
    let names_ar: Vec<&str> = items.iter().map(|i| i.product_name_ar.as_str()).collect();
    let color_names_fr: Vec<Option<&str>> =
        items.iter().map(|i| i.color_name_fr.as_deref()).collect();
    let color_names_ar: Vec<Option<&str>> =
        items.iter().map(|i| i.color_name_ar.as_deref()).collect();
    let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
    let prices: Vec<Decimal> = items.iter().map(|i| i.price).collect();
    let images: Vec<Option<&str>> = items.iter().map(|i| i.image.as_deref()).collect();
    let color_hexes: Vec<Option<&str>> = items.iter().map(|i| i.color_hex.as_deref()).collect();

    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, color_id, product_name_fr, product_name_ar,
                                  color_name_fr, color_name_ar, quantity, price, image, color_hex)
         SELECT $1, unnest($2::int[]), unnest($3::int[]), unnest($4::varchar[]), unnest($5::varchar[]),
                unnest($6::varchar[]), unnest($7::varchar[]), unnest($8::int[]), unnest($9::numeric[]),
                unnest($10::varchar[]), unnest($11::varchar[])",
    )
    .bind(order_id)
    .bind(&product_ids)
    .bind(&color_ids)
    .bind(&names_fr)
    .bind(&names_ar)
    .bind(&color_names_fr)
    .bind(&color_names_ar)
    .bind(&quantities)
    .bind(&prices)
    .bind(&images)
    .bind(&color_hexes)
    .execute(&mut *tx)
    .await?;

    let order = sqlx::query_as::<_, Order>(&format!("{} WHERE o.id = $1", ORDER_SELECT))
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(order)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("{} WHERE o.id = $1", ORDER_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(order)
}

pub async fn get_orders(pool: &PgPool, filter: &OrderFilter) -> Result<Vec<Order>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(ORDER_SELECT);
    query.push(" WHERE 1=1");

    if let Some(status) = filter.status {
        query.push(" AND o.status = ");
        query.push_bind(status);
    }

    if let Some(start_date) = filter.start_date {
        query.push(" AND o.order_date >= ");
        query.push_bind(start_date);
    }

    if let Some(end_date) = filter.end_date {
        let next_day = end_date
            .succ_opt()
            .ok_or_else(|| AppError::BadRequest("endDate is out of range".to_string()))?;
        query.push(" AND o.order_date < ");
        query.push_bind(next_day);
    }

    query.push(" ORDER BY o.order_date DESC, o.id DESC");

    let orders = query.build_query_as::<Order>().fetch_all(pool).await?;

    Ok(orders)
}

/// Loads orders matching `filter` together with their lines.
pub async fn get_orders_with_items(
    pool: &PgPool,
    filter: &OrderFilter,
) -> Result<Vec<OrderResponse>> {
    let orders = get_orders(pool, filter).await?;

    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let all_items = get_items_for_orders(pool, &order_ids).await?;

    let mut items_map: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in all_items {
        items_map.entry(item.order_id).or_default().push(item);
    }

    let response = orders
        .into_iter()
        .map(|order| {
            let items = items_map.remove(&order.id).unwrap_or_default();
            OrderResponse { order, items }
        })
        .collect();

    Ok(response)
}

pub async fn get_items_for_order(pool: &PgPool, order_id: i32) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn get_items_for_orders(pool: &PgPool, order_ids: &[i32]) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, id ASC",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Applies a status transition if the current status allows it.
///
/// The row is locked for the duration of the check so concurrent updates
/// cannot both pass validation. Returns `None` when the order does not exist.
pub async fn update_status(pool: &PgPool, id: i32, next: OrderStatus) -> Result<Option<Order>> {
    let mut tx = pool.begin().await?;

    let current: Option<OrderStatus> =
        sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

    let Some(current) = current else {
        tx.rollback().await?;
        return Ok(None);
    };

    if !current.can_transition_to(next) {
        tx.rollback().await?;
        return Err(AppError::Conflict(format!(
            "Cannot change order status from {} to {}",
            current, next
        )));
    }

    let completed_date = (next == OrderStatus::Delivered).then(Utc::now);

    sqlx::query("UPDATE orders SET status = $1, completed_date = $2 WHERE id = $3")
        .bind(next)
        .bind(completed_date)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let order = sqlx::query_as::<_, Order>(&format!("{} WHERE o.id = $1", ORDER_SELECT))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("Order {} moved from {} to {}", id, current, next);

    Ok(Some(order))
}

pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(OrderStatus, i64)>> {
    let counts = sqlx::query_as::<_, (OrderStatus, i64)>(
        "SELECT status, COUNT(*)::bigint FROM orders GROUP BY status",
    )
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

pub async fn count_active(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE status IN ('pending', 'confirmed')",
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
