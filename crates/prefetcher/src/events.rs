use prefetcher_common::{ControlMessage, Deferred, FetchResponse};
use tokio::sync::oneshot;

/// Events drained by the worker loop, strictly in arrival order.
pub(crate) enum WorkerEvent {
  /// Inbound control message.
  Control(ControlMessage),
  /// A live GET request was intercepted. The reply carries how to answer
  /// it: `None` when the URL is outside every known base (pass through),
  /// otherwise a cell that resolves to the response.
  Intercept { url: String, reply: oneshot::Sender<Option<Deferred<FetchResponse>>> },
  /// A spawned fetch settled; drop its task and refill the window.
  TaskSettled { url: String },
  /// Reply once the task queue is empty.
  Idle { reply: oneshot::Sender<()> },
  /// Stop draining events.
  Close,
}
