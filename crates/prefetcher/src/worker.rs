use std::sync::Arc;

use prefetcher_cache::ResponseCache;
use prefetcher_common::{ControlMessage, FetchResponse, SchedulerOptions};
use prefetcher_error::{PrefetchError, PrefetchResult};
use prefetcher_fetch::Fetcher;
use tokio::sync::mpsc::{self, Receiver};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::events::WorkerEvent;
use crate::scheduler::task_context::TaskContext;
use crate::scheduler::Scheduler;

/// The engine's front door: owns the event loop that drains control
/// messages, intercepted requests and task settlements strictly in arrival
/// order. The cache handle is acquired at construction, before any event is
/// processed.
pub struct PrefetchWorker {
  tx: mpsc::Sender<WorkerEvent>,
  handle: JoinHandle<()>,
}

impl PrefetchWorker {
  pub fn new(
    options: SchedulerOptions,
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn ResponseCache>,
  ) -> Self {
    // 1024 should be enough for most cases
    // over 1024 pending events are insane
    let (tx, rx) = mpsc::channel(1024);

    let ctx = Arc::new(TaskContext { fetcher, cache, tx: tx.clone() });
    let scheduler = Scheduler::new(options, ctx);
    let handle = tokio::spawn(run_loop(scheduler, rx));

    Self { tx, handle }
  }

  /// Apply one control message. Messages are processed strictly FIFO.
  pub async fn post(&self, message: ControlMessage) -> PrefetchResult<()> {
    self
      .tx
      .send(WorkerEvent::Control(message))
      .await
      .map_err(|_| PrefetchError::msg("prefetch worker is closed"))
  }

  /// Apply one wire-format message (`[type, ...args]` JSON).
  pub async fn post_json(&self, text: &str) -> PrefetchResult<()> {
    let message = ControlMessage::from_json(text).map_err(PrefetchError::from)?;
    self.post(message).await
  }

  /// Intercept a live GET request. `None` means no known base covers the
  /// URL and the request should go to the network unmediated.
  pub async fn intercept(&self, url: &str) -> Option<FetchResponse> {
    let (reply, outcome) = oneshot::channel();
    self.tx.send(WorkerEvent::Intercept { url: url.to_owned(), reply }).await.ok()?;
    let deferred = outcome.await.ok()??;
    Some(deferred.wait().await)
  }

  /// Resolve once the task queue is empty.
  pub async fn idle(&self) {
    let (reply, done) = oneshot::channel();
    if self.tx.send(WorkerEvent::Idle { reply }).await.is_ok() {
      let _ = done.await;
    }
  }

  /// Stop draining events. Queued messages sent before the close are still
  /// applied; later posts fail.
  pub async fn close(self) {
    let _ = self.tx.send(WorkerEvent::Close).await;
    let _ = self.handle.await;
  }
}

async fn run_loop(mut scheduler: Scheduler, mut rx: Receiver<WorkerEvent>) {
  let mut waiting_idle: Vec<oneshot::Sender<()>> = Vec::new();

  while let Some(event) = rx.recv().await {
    match event {
      WorkerEvent::Control(message) => scheduler.handle_message(message).await,
      WorkerEvent::Intercept { url, reply } => {
        let _ = reply.send(scheduler.intercept(&url));
      }
      WorkerEvent::TaskSettled { url } => scheduler.on_settled(&url),
      WorkerEvent::Idle { reply } => waiting_idle.push(reply),
      WorkerEvent::Close => break,
    }

    if scheduler.is_idle() {
      for reply in waiting_idle.drain(..) {
        let _ = reply.send(());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use prefetcher_cache::{MemoryCache, ResponseCache};
  use prefetcher_common::{Deferred, FetchResponse, SchedulerOptions};
  use prefetcher_fetch::Fetcher;
  use rustc_hash::FxHashMap;
  use tokio::sync::watch;

  use super::PrefetchWorker;

  struct GatedFetcher {
    started: Mutex<Vec<String>>,
    started_count: watch::Sender<usize>,
    gates: Mutex<FxHashMap<String, Deferred<FetchResponse>>>,
    failing: Mutex<Vec<String>>,
  }

  impl GatedFetcher {
    fn new() -> Arc<Self> {
      let (started_count, _) = watch::channel(0);
      Arc::new(Self {
        started: Mutex::new(Vec::new()),
        started_count,
        gates: Mutex::new(FxHashMap::default()),
        failing: Mutex::new(Vec::new()),
      })
    }

    fn gate(&self, url: &str) -> Deferred<FetchResponse> {
      self.gates.lock().unwrap().entry(url.to_owned()).or_insert_with(Deferred::new).clone()
    }

    fn release(&self, url: &str, status: u16, body: &[u8]) {
      self.gate(url).resolve(FetchResponse::new(url, status, body.to_vec()));
    }

    fn fail(&self, url: &str) {
      self.failing.lock().unwrap().push(url.to_owned());
    }

    fn started(&self) -> Vec<String> {
      self.started.lock().unwrap().clone()
    }

    async fn wait_started(&self, count: usize) {
      let mut rx = self.started_count.subscribe();
      rx.wait_for(|started| *started >= count).await.unwrap();
    }
  }

  #[async_trait::async_trait]
  impl Fetcher for GatedFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchResponse> {
      self.started.lock().unwrap().push(url.to_owned());
      self.started_count.send_modify(|started| *started += 1);
      if self.failing.lock().unwrap().iter().any(|failing| failing == url) {
        return Err(anyhow::anyhow!("connection reset"));
      }
      Ok(self.gate(url).wait().await)
    }
  }

  struct Fixture {
    worker: PrefetchWorker,
    fetcher: Arc<GatedFetcher>,
    cache: Arc<MemoryCache>,
  }

  fn fixture(concurrency: usize) -> Fixture {
    let fetcher = GatedFetcher::new();
    let cache = Arc::new(MemoryCache::new());
    let worker = PrefetchWorker::new(
      SchedulerOptions { concurrency },
      Arc::<GatedFetcher>::clone(&fetcher),
      Arc::<MemoryCache>::clone(&cache),
    );
    Fixture { worker, fetcher, cache }
  }

  async fn post_json(worker: &PrefetchWorker, text: &str) {
    worker.post_json(text).await.unwrap();
  }

  #[tokio::test]
  async fn prefetch_messages_apply_in_arrival_order() {
    let Fixture { worker, fetcher, .. } = fixture(10);

    post_json(&worker, r#"["graph", "/build/", "x.js", "y.js"]"#).await;
    post_json(&worker, r#"["prefetch", "/build/", "x.js"]"#).await;
    post_json(&worker, r#"["prefetch", "/build/", "y.js"]"#).await;

    fetcher.wait_started(2).await;
    assert_eq!(fetcher.started(), ["/build/x.js", "/build/y.js"]);

    worker.close().await;
  }

  #[tokio::test]
  async fn intercept_joins_the_queued_task() {
    let Fixture { worker, fetcher, cache } = fixture(10);

    post_json(&worker, r#"["graph", "/build/", "x.js"]"#).await;
    post_json(&worker, r#"["prefetch", "/build/", "x.js"]"#).await;
    fetcher.wait_started(1).await;

    fetcher.release("/build/x.js", 200, b"bundle");
    let response = worker.intercept("/build/x.js").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"bundle");
    // The prefetch task answered the live request; no second fetch ran.
    assert_eq!(fetcher.started(), ["/build/x.js"]);
    assert!(cache.contains("/build/x.js"));

    worker.close().await;
  }

  #[tokio::test]
  async fn intercept_serves_cache_and_ignores_foreign_urls() {
    let Fixture { worker, fetcher, cache } = fixture(10);

    post_json(&worker, r#"["graph", "/build/", "x.js"]"#).await;
    cache.put(FetchResponse::new("/build/x.js", 200, b"cached".to_vec()));

    let hit = worker.intercept("/build/x.js").await.unwrap();
    assert_eq!(hit.body, b"cached");
    assert!(fetcher.started().is_empty());

    assert!(worker.intercept("/other/x.js").await.is_none());

    worker.close().await;
  }

  #[tokio::test]
  async fn graph_replacement_evicts_delisted_bundles() {
    let Fixture { worker, fetcher, cache } = fixture(10);

    post_json(&worker, r#"["graph", "/build/", "old.js", "keep.js"]"#).await;
    post_json(&worker, r#"["prefetch", "/build/", "old.js", "keep.js"]"#).await;
    fetcher.release("/build/old.js", 200, b"old");
    fetcher.release("/build/keep.js", 200, b"keep");
    worker.idle().await;
    assert!(cache.contains("/build/old.js"));

    post_json(&worker, r#"["graph", "/build/", "keep.js"]"#).await;
    worker.idle().await;

    assert!(!cache.contains("/build/old.js"));
    assert!(cache.contains("/build/keep.js"));

    worker.close().await;
  }

  #[tokio::test]
  async fn graph_url_installs_fetched_manifest() {
    let Fixture { worker, fetcher, cache } = fixture(10);

    // A stale entry from an older deployment; the fetched graph drops it.
    cache.put(FetchResponse::new("/build/stale.js", 200, Vec::new()));
    fetcher.release("/build/graph.json", 200, br#"["a.js", 2, "b.js"]"#);

    post_json(&worker, r#"["graph-url", "/build/", "graph.json"]"#).await;
    post_json(&worker, r#"["prefetch", "/build/", "a.js"]"#).await;
    fetcher.wait_started(3).await;

    // Manifest first, then the entry and its dependency.
    assert_eq!(fetcher.started()[0], "/build/graph.json");
    assert_eq!(&fetcher.started()[1..], ["/build/a.js", "/build/b.js"]);

    // The manifest's own path rides along in the graph, so it survived the
    // install-time eviction; the stale entry did not.
    assert!(cache.contains("/build/graph.json"));
    assert!(!cache.contains("/build/stale.js"));

    worker.close().await;
  }

  #[tokio::test]
  async fn prefetch_all_fetches_every_graph_entry() {
    let Fixture { worker, fetcher, .. } = fixture(10);

    post_json(&worker, r#"["graph", "/build/", "a.js", "b.js", "c.js"]"#).await;
    post_json(&worker, r#"["prefetch-all", "/build/"]"#).await;
    fetcher.wait_started(3).await;

    assert_eq!(fetcher.started(), ["/build/a.js", "/build/b.js", "/build/c.js"]);

    for url in ["/build/a.js", "/build/b.js", "/build/c.js"] {
      fetcher.release(url, 200, b"");
    }

    // Unknown bases are skipped without failing the worker.
    post_json(&worker, r#"["prefetch-all", "/unknown/"]"#).await;
    worker.idle().await;

    worker.close().await;
  }

  #[tokio::test]
  async fn non_200_responses_are_not_cached() {
    let Fixture { worker, fetcher, cache } = fixture(10);

    post_json(&worker, r#"["graph", "/build/", "missing.js"]"#).await;
    fetcher.release("/build/missing.js", 404, b"");

    let response = worker.intercept("/build/missing.js").await.unwrap();
    assert_eq!(response.status, 404);
    assert!(!cache.contains("/build/missing.js"));

    worker.close().await;
  }

  #[tokio::test]
  async fn transport_failure_settles_the_task() {
    let Fixture { worker, fetcher, cache } = fixture(1);

    fetcher.fail("/build/broken.js");
    post_json(&worker, r#"["graph", "/build/", "broken.js", "next.js"]"#).await;
    post_json(&worker, r#"["prefetch", "/build/", "broken.js"]"#).await;

    let response = worker.intercept("/build/broken.js").await.unwrap();
    assert_eq!(response.status, 0);
    assert!(!cache.contains("/build/broken.js"));

    // The slot freed up for later work.
    post_json(&worker, r#"["prefetch", "/build/", "next.js"]"#).await;
    fetcher.wait_started(2).await;

    worker.close().await;
  }

  #[tokio::test]
  async fn malformed_messages_are_rejected() {
    let Fixture { worker, .. } = fixture(10);

    assert!(worker.post_json(r#"["warp", "/build/"]"#).await.is_err());
    assert!(worker.post_json("not json").await.is_err());

    // The worker still works afterwards.
    post_json(&worker, r#"["ping"]"#).await;
    worker.idle().await;

    worker.close().await;
  }

  #[tokio::test]
  async fn close_rejects_later_posts() {
    let Fixture { worker, fetcher, .. } = fixture(10);

    let tx = worker.tx.clone();
    worker.close().await;

    assert!(tx.send(crate::events::WorkerEvent::Close).await.is_err());
    assert!(fetcher.started().is_empty());
  }
}
