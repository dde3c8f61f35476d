pub mod export_service;
pub mod notification_service;
pub mod order_service;
pub mod upload_service;
