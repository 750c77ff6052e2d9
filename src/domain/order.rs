use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle. Checkout drives `Pending -> Processing`; everything after
/// that is set from the back office, which may overwrite the status with any
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status '{}'", other)),
        }
    }
}

/// Contact and shipping details as submitted at checkout. All fields are
/// required; validation happens before any backend write.
#[derive(Debug, Clone, Default)]
pub struct ShippingForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
}

impl ShippingForm {
    /// First required field that is empty after trimming, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        let fields = [
            ("email", self.email.as_str()),
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("address", self.address.as_str()),
            ("city", self.city.as_str()),
            ("zip", self.zip.as_str()),
            ("country", self.country.as_str()),
        ];
        fields
            .iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
    }

    /// First and last name combined into the shipping name snapshot.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Insert shape for the order header. Monetary fields are fixed at
/// submission time; later cart changes never touch a submitted order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub total: BigDecimal,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_zip: String,
    pub shipping_country: String,
}

/// A persisted order header.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub total: BigDecimal,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_zip: String,
    pub shipping_country: String,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for one order item. Name, image, and price are snapshots of
/// the cart line, deliberately decoupled from the live catalog.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// A persisted order item.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// An order header together with its items, as shown in order history and
/// the back office.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn status_parse_and_display_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(OrderStatus::from_str("refunded").is_err());
        assert!(OrderStatus::from_str("Pending").is_err());
    }

    fn complete_form() -> ShippingForm {
        ShippingForm {
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            address: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            zip: "N1 9GU".to_string(),
            country: "United Kingdom".to_string(),
        }
    }

    #[test]
    fn complete_form_has_no_missing_field() {
        assert_eq!(complete_form().missing_field(), None);
    }

    #[test]
    fn blank_field_is_reported_by_name() {
        let mut form = complete_form();
        form.city = "   ".to_string();
        assert_eq!(form.missing_field(), Some("city"));
    }

    #[test]
    fn full_name_joins_trimmed_parts() {
        let mut form = complete_form();
        form.first_name = " Ada ".to_string();
        assert_eq!(form.full_name(), "Ada Lovelace");
    }
}
