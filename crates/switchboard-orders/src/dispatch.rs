//! Dispatches a completed order-intent extraction to the tenant backend
//! (spec §4.4 Dispatch table), reusing the webhook envelope and dispatcher.

use reqwest::Method;
use serde_json::json;
use switchboard_webhooks::{WebhookDispatcher, WebhookEnvelope, WebhookError, WebhookEvent};

use crate::model::{CheckQuantityPayload, PlaceOrderPayload, UpdateOrderPayload};

/// `POST {backend}/api/webhooks/orders/ai`.
pub async fn dispatch_place_order(
    dispatcher: &WebhookDispatcher,
    backend_base_url: &str,
    company_id: &str,
    payload: &PlaceOrderPayload,
) -> Result<(), WebhookError> {
    let url = format!("{}/api/webhooks/orders/ai", backend_base_url.trim_end_matches('/'));
    let envelope = WebhookEnvelope::new(WebhookEvent::OrderCreated, company_id, json!(payload));
    dispatcher.dispatch(Method::POST, &url, &envelope).await
}

/// `PUT {backend}/api/webhooks/orders/{order_code}/ai`. Skips dispatch
/// entirely when `order_code` is empty, per spec.
pub async fn dispatch_update_order(
    dispatcher: &WebhookDispatcher,
    backend_base_url: &str,
    company_id: &str,
    payload: &UpdateOrderPayload,
) -> Result<(), WebhookError> {
    if payload.order_code.is_empty() {
        tracing::warn!("update-order extraction missing order_code, skipping dispatch");
        return Ok(());
    }

    let url = format!(
        "{}/api/webhooks/orders/{}/ai",
        backend_base_url.trim_end_matches('/'),
        payload.order_code
    );
    let envelope = WebhookEnvelope::new(WebhookEvent::OrderUpdated, company_id, json!(payload));
    dispatcher.dispatch(Method::PUT, &url, &envelope).await
}

/// `POST {backend}/api/webhooks/orders/check-quantity/ai`.
pub async fn dispatch_check_quantity(
    dispatcher: &WebhookDispatcher,
    backend_base_url: &str,
    company_id: &str,
    payload: &CheckQuantityPayload,
) -> Result<(), WebhookError> {
    let url = format!(
        "{}/api/webhooks/orders/check-quantity/ai",
        backend_base_url.trim_end_matches('/')
    );
    let envelope = WebhookEnvelope::new(WebhookEvent::OrderCheckQuantity, company_id, json!(payload));
    dispatcher.dispatch(Method::POST, &url, &envelope).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContactMethod, CustomerContact, QuantityCheckItem, Urgency};

    #[tokio::test]
    async fn update_order_without_code_is_skipped_not_errored() {
        let dispatcher = WebhookDispatcher::new("secret", "0.1.0", Default::default());
        let payload = UpdateOrderPayload {
            order_code: String::new(),
            changes: crate::model::OrderChanges {
                products: None,
                customer: None,
                delivery: None,
                payment: None,
            },
            update_reason: None,
            notes: None,
            channel: crate::model::OrderChannel::new("messenger"),
        };

        let result = dispatch_update_order(&dispatcher, "https://backend.example.com", "C1", &payload).await;
        assert!(result.is_ok());
    }

    #[test]
    fn check_quantity_payload_serializes() {
        let payload = CheckQuantityPayload {
            products: vec![QuantityCheckItem {
                name: "Widget".into(),
                quantity_needed: 100,
                specifications: None,
            }],
            customer_contact: CustomerContact {
                name: "A".into(),
                phone: None,
                email: None,
            },
            contact_method: ContactMethod::Email,
            urgency: Urgency::Normal,
            notes: None,
            channel: crate::model::OrderChannel::new("chatdemo"),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["contact_method"], "email");
        assert_eq!(value["channel"]["type"], "chatdemo");
    }
}
