//! Structured order-intent extraction and dispatch (spec §4.4).
//!
//! The second, non-streaming LLM call is prompted with a schema that omits
//! the fields the engine itself is responsible for (`financial`, the
//! dispatch-time `channel` stamp) — this module parses that narrower shape
//! and assembles the payload the backend actually receives.

use serde::Deserialize;
use thiserror::Error;

use switchboard_core::Intent;
use switchboard_cors::DomainFetcher;
use switchboard_ingest::Extractor;
use switchboard_orders::{
    CheckQuantityPayload, Customer, CustomerContact, Delivery, Financial, OrderChanges,
    OrderChannel, OrderItem, Payment, PlaceOrderPayload, QuantityCheckItem, UpdateOrderPayload,
};
use switchboard_scratch::Turn;
use switchboard_vectorstore::{Embedder, VectorStore};

use crate::llm::{
    prompt::{build_extraction_prompt, CHECK_QUANTITY_SCHEMA_HINT, PLACE_ORDER_SCHEMA_HINT, UPDATE_ORDER_SCHEMA_HINT},
    LlmClient,
};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum OrderExtractionError {
    #[error("extraction call failed: {0}")]
    Llm(#[from] crate::llm::LlmError),
    #[error("extraction result did not match the expected schema: {0}")]
    InvalidShape(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct ExtractedPlaceOrder {
    customer: Customer,
    items: Vec<OrderItem>,
    delivery: Delivery,
    payment: Payment,
    notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExtractedUpdateOrder {
    order_code: String,
    changes: OrderChanges,
    update_reason: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExtractedCheckQuantity {
    products: Vec<QuantityCheckItem>,
    customer_contact: CustomerContact,
    contact_method: switchboard_orders::ContactMethod,
    urgency: switchboard_orders::Urgency,
    notes: Option<String>,
}

/// Runs the extraction call and dispatch for a completed order-intent
/// turn. Never propagates a failure to the caller: extraction/dispatch
/// errors are logged and swallowed, per spec §4.4 ("does NOT alter the
/// user-facing stream that already completed").
pub async fn extract_and_dispatch<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    intent: Intent,
    company_id: &str,
    channel: &str,
    history: &[Turn],
) where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let result = match intent {
        Intent::PlaceOrder => dispatch_place_order(state, company_id, channel, history).await,
        Intent::UpdateOrder => dispatch_update_order(state, company_id, channel, history).await,
        Intent::CheckQuantity => dispatch_check_quantity(state, company_id, channel, history).await,
        _ => Ok(()),
    };

    if let Err(err) = result {
        let intent_name = intent.as_str();
        tracing::error!(intent_name, company_id, channel, error = %err, "order side-effect failed");
    }
}

async fn dispatch_place_order<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    company_id: &str,
    channel: &str,
    history: &[Turn],
) -> Result<(), OrderExtractionError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let (system, user) = build_extraction_prompt(PLACE_ORDER_SCHEMA_HINT, history);
    let raw = state.llm.complete(system, user).await?;
    let extracted: ExtractedPlaceOrder = serde_json::from_str(&raw)?;

    let financial = Financial::compute(&extracted.items, state.config.order_tax_rate, &state.config.order_currency);
    let payload = PlaceOrderPayload {
        customer: extracted.customer,
        items: extracted.items,
        delivery: extracted.delivery,
        payment: extracted.payment,
        notes: extracted.notes,
        financial,
        channel: OrderChannel::new(channel),
    };

    if let Err(e) = state.dispatch_place_order(company_id, &payload).await {
        tracing::error!(company_id, error = %e, "place-order dispatch failed");
    }
    Ok(())
}

async fn dispatch_update_order<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    company_id: &str,
    channel: &str,
    history: &[Turn],
) -> Result<(), OrderExtractionError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let (system, user) = build_extraction_prompt(UPDATE_ORDER_SCHEMA_HINT, history);
    let raw = state.llm.complete(system, user).await?;
    let extracted: ExtractedUpdateOrder = serde_json::from_str(&raw)?;

    let payload = UpdateOrderPayload {
        order_code: extracted.order_code,
        changes: extracted.changes,
        update_reason: extracted.update_reason,
        notes: extracted.notes,
        channel: OrderChannel::new(channel),
    };

    if let Err(e) = state.dispatch_update_order(company_id, &payload).await {
        tracing::error!(company_id, error = %e, "update-order dispatch failed");
    }
    Ok(())
}

async fn dispatch_check_quantity<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    company_id: &str,
    channel: &str,
    history: &[Turn],
) -> Result<(), OrderExtractionError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let (system, user) = build_extraction_prompt(CHECK_QUANTITY_SCHEMA_HINT, history);
    let raw = state.llm.complete(system, user).await?;
    let extracted: ExtractedCheckQuantity = serde_json::from_str(&raw)?;

    let payload = CheckQuantityPayload {
        products: extracted.products,
        customer_contact: extracted.customer_contact,
        contact_method: extracted.contact_method,
        urgency: extracted.urgency,
        notes: extracted.notes,
        channel: OrderChannel::new(channel),
    };

    if let Err(e) = state.dispatch_check_quantity(company_id, &payload).await {
        tracing::error!(company_id, error = %e, "check-quantity dispatch failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_order_schema_round_trips_through_the_intermediate_type() {
        let raw = r#"{"customer":{"name":"A","phone":"0900","email":null,"address":null},"items":[{"name":"Widget","quantity":2,"unitPrice":10.0,"description":null}],"delivery":{"method":"delivery","address":null,"notes":null},"payment":{"method":"cash","timing":null},"notes":null}"#;
        let extracted: ExtractedPlaceOrder = serde_json::from_str(raw).unwrap();
        assert_eq!(extracted.items.len(), 1);
        assert_eq!(extracted.customer.name, "A");
    }

    #[test]
    fn update_order_schema_round_trips() {
        let raw = r#"{"order_code":"O1","changes":{"products":null,"customer":null,"delivery":null,"payment":null},"update_reason":null,"notes":null}"#;
        let extracted: ExtractedUpdateOrder = serde_json::from_str(raw).unwrap();
        assert_eq!(extracted.order_code, "O1");
    }
}
