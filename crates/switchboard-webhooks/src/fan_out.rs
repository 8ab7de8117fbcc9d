//! Concurrent fan-out of the webhooks produced by a single request: fire a
//! background task per webhook, log failures, never fail the caller's
//! request on a webhook error — webhooks already dispatched are never
//! recalled even if the client connection is later cancelled.

use std::sync::Arc;

use reqwest::Method;

use crate::dispatcher::WebhookDispatcher;
use crate::envelope::WebhookEnvelope;

/// One queued delivery: target URL, method, and envelope.
pub struct PendingWebhook {
    pub method: Method,
    pub url: String,
    pub envelope: WebhookEnvelope,
}

/// Spawns every pending webhook as an independent background task. Returns
/// immediately; callers that need to wait for completion should await the
/// returned handles (tests do; production call sites do not, per the
/// fire-and-forget contract).
pub fn fan_out(
    dispatcher: Arc<WebhookDispatcher>,
    pending: Vec<PendingWebhook>,
) -> Vec<tokio::task::JoinHandle<()>> {
    pending
        .into_iter()
        .map(|job| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                if let Err(e) = dispatcher.dispatch(job.method, &job.url, &job.envelope).await {
                    tracing::error!(
                        event = %job.envelope.event,
                        url = %job.url,
                        error = %e,
                        "webhook delivery ultimately failed"
                    );
                }
            })
        })
        .collect()
}
