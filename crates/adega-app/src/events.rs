use serde::Serialize;
use tokio::sync::mpsc;

/// Notifications pushed to the embedding shell so it can re-render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    /// The session changed; re-read the view to pick the right screen.
    SessionChanged,
    /// A new collection snapshot was materialized.
    CollectionChanged,
    /// An add-wine intent succeeded and the modal should close.
    AddFormClosed,
    /// A write intent was rejected by the store.
    #[serde(rename_all = "camelCase")]
    WriteFailed {
        intent: &'static str,
        message: String,
    },
}

/// Best-effort event delivery: a shell that stopped listening must not
/// stall the controller.
pub(crate) fn emit(tx: &mpsc::Sender<Event>, event: Event) {
    if let Err(e) = tx.try_send(event) {
        tracing::error!(error = %e, "Failed to emit event");
    }
}
