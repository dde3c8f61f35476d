use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Order, OrderSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Order,
}

/// Event pushed to connected admin clients.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub order_id: i32,
    pub customer_name: Option<String>,
    pub total: Decimal,
    pub item_count: i64,
    pub source: OrderSource,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new_order(order: &Order, item_count: i64) -> Self {
        let customer = order
            .customer_name
            .clone()
            .unwrap_or_else(|| "WhatsApp".to_string());

        Self {
            kind: NotificationKind::Order,
            title: format!("Nouvelle commande #{}", order.id),
            message: format!(
                "{} - {} article(s) - {} MAD",
                customer, item_count, order.total
            ),
            order_id: order.id,
            customer_name: order.customer_name.clone(),
            total: order.total,
            item_count,
            source: order.order_source,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;
    use crate::models::OrderStatus;

    #[test]
    fn serializes_with_type_tag() {
        let order = Order {
            id: 42,
            customer_name: None,
            phone: None,
            address: None,
            notes: None,
            status: OrderStatus::Pending,
            order_source: OrderSource::Whatsapp,
            order_date: Utc::now(),
            completed_date: None,
            total: dec!(150.00),
        };

        let notification = Notification::new_order(&order, 3);
        let json = serde_json::to_value(&notification).unwrap();

        assert_eq!(json["type"], "order");
        assert_eq!(json["order_id"], 42);
        assert_eq!(json["source"], "whatsapp");
        assert_eq!(json["item_count"], 3);
        assert!(notification.message.contains("WhatsApp"));
    }
}
