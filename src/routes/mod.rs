mod admin;
mod auth;
mod banners;
mod health;
mod notifications;
mod orders;
mod products;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::{AppState, middleware::admin_middleware};

pub fn create_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/products", get(products::list_products))
        .route(
            "/api/products/category/{category}",
            get(products::products_by_category),
        )
        .route("/api/products/discounted", get(products::discounted_products))
        .route("/api/products/search", get(products::search_products))
        .route("/api/products/{id}", get(products::get_product))
        .route("/api/products/{id}/colors", get(products::get_product_colors))
        .route("/api/banners", get(banners::active_banners))
        .route("/api/orders", post(orders::create_order))
        .route("/api/notifications/ws", get(notifications::notifications_ws));

    let admin = Router::new()
        .route("/api/auth", get(auth::current_admin))
        .route("/api/products", post(products::create_product))
        .route(
            "/api/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/api/banners", post(banners::create_banner))
        .route("/api/banners/all", get(banners::all_banners))
        .route(
            "/api/banners/{id}",
            get(banners::get_banner)
                .put(banners::update_banner)
                .delete(banners::delete_banner),
        )
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/active/count", get(orders::active_order_count))
        .route("/api/orders/stats", get(orders::order_stats))
        .route("/api/orders/export", get(orders::export_orders))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/items", get(orders::get_order_items))
        .route("/api/orders/{id}/status", put(orders::update_order_status))
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route_layer(middleware::from_fn_with_state(state, admin_middleware));

    public.merge(admin)
}
