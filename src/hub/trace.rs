//! Trace ids for hub actions.
//!
//! Every `execute_action` mints one id of the form `hub-<uuid-v4>`. It is
//! returned in the envelope metadata, attached to the tracing span of the
//! call, and forwarded to upstream APIs as the `X-Trace-Id` header.
//!
//! The id lives in a `tokio::task_local!` slot so the HTTP client can read
//! it with [`current`] without the id being threaded through every
//! provider signature.

use uuid::Uuid;

/// Header carrying the trace id on outbound requests
pub const TRACE_HEADER: &str = "X-Trace-Id";

tokio::task_local! {
    /// Trace id of the action running on this task.
    pub static TRACE_ID: String;
}

/// Mint a new trace id: `"hub-<uuid-v4>"`.
#[must_use]
pub fn generate() -> String {
    format!("hub-{}", Uuid::new_v4())
}

/// Trace id of the current task, if inside a [`with_trace_id`] scope.
#[must_use]
pub fn current() -> Option<String> {
    TRACE_ID.try_with(Clone::clone).ok()
}

/// Run `future` with `trace_id` installed for [`current`].
pub async fn with_trace_id<F, T>(trace_id: String, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    TRACE_ID.scope(trace_id, future).await
}
