//! Structured order payloads extracted by the second LLM call (spec §4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    #[serde(rename = "unitPrice")]
    pub unit_price: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Delivery,
    Pickup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub method: DeliveryMethod,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    CreditCard,
    Cod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub timing: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Financial {
    pub subtotal: f64,
    #[serde(rename = "taxAmount")]
    pub tax_amount: f64,
    #[serde(rename = "totalAmount")]
    pub total_amount: f64,
    pub currency: String,
}

impl Financial {
    /// `taxAmount = round(subtotal * tax_rate)`, `totalAmount = subtotal + taxAmount`.
    /// `tax_rate` defaults to 0.10 per spec §4.4 but is configurable per tenant.
    pub fn compute(items: &[OrderItem], tax_rate: f64, currency: &str) -> Self {
        let subtotal: f64 = items
            .iter()
            .map(|i| i.quantity as f64 * i.unit_price.unwrap_or(0.0))
            .sum();
        let tax_amount = (subtotal * tax_rate).round();
        Self {
            subtotal,
            tax_amount,
            total_amount: subtotal + tax_amount,
            currency: currency.to_string(),
        }
    }
}

/// The originating channel, stamped by the engine (never by the LLM) onto
/// every order payload so the backend can tell which surface produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderChannel {
    #[serde(rename = "type")]
    pub kind: String,
}

impl OrderChannel {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderPayload {
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub delivery: Delivery,
    pub payment: Payment,
    pub notes: Option<String>,
    pub financial: Financial,
    pub channel: OrderChannel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderChanges {
    pub products: Option<serde_json::Value>,
    pub customer: Option<serde_json::Value>,
    pub delivery: Option<serde_json::Value>,
    pub payment: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderPayload {
    pub order_code: String,
    pub changes: OrderChanges,
    pub update_reason: Option<String>,
    pub notes: Option<String>,
    pub channel: OrderChannel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityCheckItem {
    pub name: String,
    pub quantity_needed: u32,
    pub specifications: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    Email,
    Sms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckQuantityPayload {
    pub products: Vec<QuantityCheckItem>,
    pub customer_contact: CustomerContact,
    pub contact_method: ContactMethod,
    pub urgency: Urgency,
    pub notes: Option<String>,
    pub channel: OrderChannel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn financial_rounds_tax_and_sums_total() {
        let items = vec![
            OrderItem {
                name: "Widget".into(),
                quantity: 3,
                unit_price: Some(10.5),
                description: None,
            },
            OrderItem {
                name: "Gadget".into(),
                quantity: 1,
                unit_price: Some(5.0),
                description: None,
            },
        ];
        let financial = Financial::compute(&items, 0.10, "VND");
        assert_eq!(financial.subtotal, 36.5);
        assert_eq!(financial.tax_amount, 4.0); // round(3.65)
        assert_eq!(financial.total_amount, 40.5);
        assert_eq!(financial.currency, "VND");
    }

    #[test]
    fn financial_treats_missing_unit_price_as_zero() {
        let items = vec![OrderItem {
            name: "Mystery".into(),
            quantity: 2,
            unit_price: None,
            description: None,
        }];
        let financial = Financial::compute(&items, 0.10, "VND");
        assert_eq!(financial.subtotal, 0.0);
        assert_eq!(financial.total_amount, 0.0);
    }
}
