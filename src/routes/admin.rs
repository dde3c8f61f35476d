use axum::{Json, extract::State};

use crate::{
    AppState,
    error::Result,
    models::{DashboardStats, OrderStats},
    queries::{banner_queries, order_queries, product_queries},
};

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    let products = product_queries::count_products(&state.db).await?;
    let banners = banner_queries::count_banners(&state.db).await?;
    let counts = order_queries::count_by_status(&state.db).await?;
    let orders_by_status = OrderStats::from_counts(&counts);

    Ok(Json(DashboardStats {
        products,
        banners,
        active_orders: orders_by_status.active,
        orders_by_status,
    }))
}
