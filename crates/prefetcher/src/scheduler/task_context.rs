use std::sync::Arc;

use prefetcher_cache::ResponseCache;
use prefetcher_fetch::Fetcher;
use tokio::sync::mpsc::Sender;

use crate::events::WorkerEvent;

/// Shared handles a spawned fetch task needs to do its work.
pub(crate) struct TaskContext {
  pub fetcher: Arc<dyn Fetcher>,
  pub cache: Arc<dyn ResponseCache>,
  pub tx: Sender<WorkerEvent>,
}
