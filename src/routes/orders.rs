use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        CountResponse, CreateOrderRequest, ExportQuery, Order, OrderFilter, OrderItem,
        OrderListQuery, OrderResponse, OrderStats, UpdateStatusRequest,
    },
    queries::order_queries,
    services::{export_service, order_service},
    utils::extractors::{AppJson, AppPath, AppQuery},
};

pub async fn create_order(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let order = order_service::place_order(&state.db, &state.notifier, &payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<OrderListQuery>,
) -> Result<Json<Vec<Order>>> {
    let filter = OrderFilter {
        status: query.status,
        ..OrderFilter::default()
    };
    let orders = order_queries::get_orders(&state.db, &filter).await?;

    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<OrderResponse>> {
    let order = find_order(&state, id).await?;
    let items = order_queries::get_items_for_order(&state.db, id).await?;

    Ok(Json(OrderResponse { order, items }))
}

pub async fn get_order_items(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<Vec<OrderItem>>> {
    find_order(&state, id).await?;
    let items = order_queries::get_items_for_order(&state.db, id).await?;

    Ok(Json(items))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let order = order_queries::update_status(&state.db, id, payload.status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order with id {} not found", id)))?;

    Ok(Json(order))
}

pub async fn active_order_count(State(state): State<AppState>) -> Result<Json<CountResponse>> {
    let count = order_queries::count_active(&state.db).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn order_stats(State(state): State<AppState>) -> Result<Json<OrderStats>> {
    let counts = order_queries::count_by_status(&state.db).await?;
    Ok(Json(OrderStats::from_counts(&counts)))
}

pub async fn export_orders(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ExportQuery>,
) -> Result<Response> {
    if matches!((query.start_date, query.end_date), (Some(start), Some(end)) if start > end) {
        return Err(AppError::BadRequest(
            "startDate must not be after endDate".to_string(),
        ));
    }

    let filter = OrderFilter {
        status: query.status,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let orders = order_queries::get_orders_with_items(&state.db, &filter).await?;

    let format = query.format;
    let body = tokio::task::spawn_blocking(move || export_service::render(format, &orders))
        .await
        .map_err(|e| AppError::InternalError(format!("Export task failed: {}", e)))??;

    let file_name = export_service::file_name(format, Utc::now().date_naive());
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name))
        .map_err(|e| AppError::InternalError(format!("Invalid file name header: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(format.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn find_order(state: &AppState, id: i32) -> Result<Order> {
    order_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order with id {} not found", id)))
}
