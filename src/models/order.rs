use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// DB models

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Delivered)
                | (OrderStatus::Confirmed, OrderStatus::Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Pending and confirmed orders still need admin attention.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderSource {
    #[default]
    Web,
    Whatsapp,
}

impl OrderSource {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSource::Web => "web",
            OrderSource::Whatsapp => "whatsapp",
        }
    }
}

/// An order header together with the sum of its stored line prices.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i32,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub order_source: OrderSource,
    pub order_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: Option<i32>,
    pub color_id: Option<i32>,
    pub product_name_fr: String,
    pub product_name_ar: String,
    pub color_name_fr: Option<String>,
    pub color_name_ar: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub image: Option<String>,
    pub color_hex: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

pub fn order_total(items: &[OrderItem]) -> Decimal {
    items.iter().map(OrderItem::line_total).sum()
}

/// Line data priced from the catalog, ready to insert.
#[derive(Debug, Clone)]
pub struct OrderItemData {
    pub product_id: i32,
    pub color_id: Option<i32>,
    pub product_name_fr: String,
    pub product_name_ar: String,
    pub color_name_fr: Option<String>,
    pub color_name_ar: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    /// Color image, falling back to the product image.
    pub image: Option<String>,
    pub color_hex: Option<String>,
}

// Request types

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[serde(alias = "product_id")]
    pub product_id: i32,
    pub quantity: i32,
    #[serde(default, alias = "color_id", skip_serializing_if = "Option::is_none")]
    pub color_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub order_source: OrderSource,
    pub items: Vec<OrderItemRequest>,
}

/// Customer fields after trimming; blank values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    /// Checks the request shape and returns the cleaned customer fields.
    ///
    /// Web checkouts need a name, phone and address; WhatsApp orders collect
    /// those in the chat and may omit them.
    pub fn validate(&self) -> crate::error::Result<CustomerInfo> {
        use crate::error::AppError;

        if self.items.is_empty() {
            return Err(AppError::BadRequest("Order must contain at least one item".to_string()));
        }

        for item in &self.items {
            if item.quantity <= 0 {
                return Err(AppError::BadRequest(format!(
                    "Invalid quantity for product {}",
                    item.product_id
                )));
            }
        }

        let clean = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let customer = CustomerInfo {
            name: clean(&self.name),
            phone: clean(&self.phone),
            address: clean(&self.address),
            notes: clean(&self.notes),
        };

        if self.order_source == OrderSource::Web
            && (customer.name.is_none() || customer.phone.is_none() || customer.address.is_none())
        {
            return Err(AppError::BadRequest(
                "Name, phone and address are required".to_string(),
            ));
        }

        Ok(customer)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    #[serde(alias = "xlsx")]
    Excel,
    Pdf,
    #[serde(alias = "docx")]
    Word,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Word => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub format: ExportFormat,
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    /// Inclusive: orders placed at any time on this day match.
    pub end_date: Option<NaiveDate>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct OrderStats {
    pub pending: i64,
    pub confirmed: i64,
    pub delivered: i64,
    pub cancelled: i64,
    pub active: i64,
    pub total: i64,
}

impl OrderStats {
    pub fn from_counts(counts: &[(OrderStatus, i64)]) -> Self {
        let mut stats = OrderStats::default();

        for (status, count) in counts {
            match status {
                OrderStatus::Pending => stats.pending += count,
                OrderStatus::Confirmed => stats.confirmed += count,
                OrderStatus::Delivered => stats.delivered += count,
                OrderStatus::Cancelled => stats.cancelled += count,
            }
        }

        stats.active = stats.pending + stats.confirmed;
        stats.total = stats.active + stats.delivered + stats.cancelled;
        stats
    }
}
