pub mod admin_queries;
pub mod banner_queries;
pub mod order_queries;
pub mod product_queries;
