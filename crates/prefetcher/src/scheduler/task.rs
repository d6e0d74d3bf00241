use std::sync::Arc;

use prefetcher_common::{Deferred, FetchResponse};

use super::task_context::TaskContext;
use crate::events::WorkerEvent;

/// Scheduler record tracking one URL's fetch lifecycle:
/// `queued(priority) -> in-flight -> settled(removed)`. The priority is
/// mutable only while queued.
pub(crate) struct Task {
  pub url: String,
  pub priority: i64,
  pub fetching: bool,
  pub deferred: Deferred<FetchResponse>,
}

impl Task {
  pub fn new(url: String, priority: i64) -> Self {
    Self { url, priority, fetching: false, deferred: Deferred::new() }
  }

  /// Start the network fetch for this task. On HTTP 200 the response is
  /// cached before the deferred resolves; every outcome, including a
  /// transport failure, resolves the deferred so no awaiter can hang.
  pub fn spawn(&self, ctx: &Arc<TaskContext>) {
    let url = self.url.clone();
    let deferred = self.deferred.clone();
    let ctx = Arc::clone(ctx);

    tokio::spawn(async move {
      let response = match ctx.fetcher.fetch(&url).await {
        Ok(response) => response,
        Err(error) => {
          tracing::debug!("fetch of {url} failed: {error:#}");
          FetchResponse::error(&url)
        }
      };

      if response.status == 200 {
        ctx.cache.put(response.clone());
      }
      deferred.resolve(response);

      // The loop may already be gone during shutdown.
      let _ = ctx.tx.send(WorkerEvent::TaskSettled { url }).await;
    });
  }
}
