mod task;
pub(crate) mod task_context;

use std::sync::Arc;

use arcstr::ArcStr;
use prefetcher_common::{
  BasePath, BundleGraph, ControlMessage, Deferred, FetchResponse, SchedulerOptions,
  BASELINE_PRIORITY, DIRECT_PRIORITY,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use task::Task;
use task_context::TaskContext;

/// The scheduler proper: base registry, fetch queue and dispatch window.
///
/// All state is owned exclusively by the worker event loop; spawned fetch
/// tasks only hold their URL, deferred handle and the shared [`TaskContext`],
/// and report settlement back as loop events. Mutual exclusion is structural.
pub(crate) struct Scheduler {
  options: SchedulerOptions,
  ctx: Arc<TaskContext>,
  bases: FxHashMap<BasePath, BundleGraph>,
  queue: Vec<Task>,
  verbose: bool,
}

impl Scheduler {
  pub fn new(options: SchedulerOptions, ctx: Arc<TaskContext>) -> Self {
    Self { options, ctx, bases: FxHashMap::default(), queue: Vec::new(), verbose: false }
  }

  pub fn is_idle(&self) -> bool {
    self.queue.is_empty()
  }

  /// Verbose-gated diagnostics; `ping` and hard errors bypass this.
  fn log(&self, message: impl AsRef<str>) {
    if self.verbose {
      tracing::debug!("{}", message.as_ref());
    }
  }

  pub async fn handle_message(&mut self, message: ControlMessage) {
    match message {
      ControlMessage::Graph { base, entries } => {
        self.install_graph(base, BundleGraph::from_wire(&entries));
      }
      ControlMessage::GraphUrl { base, manifest_path } => {
        self.load_graph_manifest(base, &manifest_path).await;
      }
      ControlMessage::Prefetch { base, names } => {
        self.enqueue(&base, names.iter().map(ArcStr::as_str), BASELINE_PRIORITY);
      }
      ControlMessage::PrefetchAll { base } => self.prefetch_all(&base),
      ControlMessage::Ping => tracing::info!("ping"),
      ControlMessage::Verbose => {
        self.verbose = true;
        self.log("verbose diagnostics enabled");
      }
    }
  }

  /// Replace the graph of `base`, evicting cached entries under it that the
  /// new graph no longer names. Entries that a longer registered base also
  /// matches belong to that base's graph and are left alone.
  fn install_graph(&mut self, base: BasePath, graph: BundleGraph) {
    for url in self.ctx.cache.keys() {
      let Some(name) = base.split_filename(&url) else { continue };
      if self.bases.keys().any(|other| other.len() > base.len() && other.matches(&url)) {
        continue;
      }
      if !graph.contains(name) {
        self.log(format!("evicting {url}"));
        self.ctx.cache.delete(&url);
      }
    }
    self.bases.insert(base, graph);
  }

  /// Handle `graph-url`: install an empty graph (no eviction), direct-fetch
  /// the manifest, then ingest its body with the manifest's own path
  /// appended so it survives graph-driven cleanup.
  async fn load_graph_manifest(&mut self, base: BasePath, manifest_path: &str) {
    self.bases.insert(base.clone(), BundleGraph::new());

    let response = self.direct(&base, manifest_path).wait().await;
    if !response.ok() {
      tracing::error!("graph manifest {} answered {}", response.url, response.status);
      return;
    }

    match serde_json::from_slice::<Vec<Value>>(&response.body) {
      Ok(entries) => {
        let mut graph = BundleGraph::from_wire(&entries);
        graph.insert(manifest_path);
        self.install_graph(base, graph);
      }
      Err(error) => {
        tracing::error!("graph manifest under {base} is not a bundle graph: {error}");
      }
    }
  }

  fn prefetch_all(&mut self, base: &BasePath) {
    let Some(graph) = self.bases.get(base) else {
      self.log(format!("prefetch-all for unknown base {base}"));
      return;
    };
    let names = graph.filenames().cloned().collect::<Vec<_>>();
    self.enqueue(base, names.iter().map(ArcStr::as_str), BASELINE_PRIORITY);
  }

  /// Resolve dependency closures, union them, and add one task per URL that
  /// is neither queued nor cached. An already-queued URL only has its
  /// priority raised, and only when the new one is strictly higher.
  fn enqueue<'a>(
    &mut self,
    base: &BasePath,
    names: impl IntoIterator<Item = &'a str>,
    priority: i64,
  ) {
    let wanted = {
      let Some(graph) = self.bases.get(base) else {
        self.log(format!("prefetch for unknown base {base}"));
        return;
      };
      let mut seen = FxHashSet::default();
      let mut wanted: Vec<ArcStr> = Vec::new();
      for name in names {
        for dep in graph.dependencies_of(name) {
          if seen.insert(dep.clone()) {
            wanted.push(dep);
          }
        }
      }
      wanted
    };

    for name in wanted {
      let url = base.join(&name);
      if let Some(task) = self.queue.iter_mut().find(|task| task.url == url) {
        if priority > task.priority && !task.fetching {
          task.priority = priority;
        }
      } else if !self.ctx.cache.contains(&url) {
        self.queue.push(Task::new(url, priority));
      }
    }

    self.dispatch();
  }

  /// One dispatch pass: sort by priority descending (the sort is stable, so
  /// equal priorities keep insertion order) and start queued tasks while the
  /// running in-flight count stays below the window. Direct-priority tasks
  /// start regardless of the window. Never blocks on the fetches it starts.
  fn dispatch(&mut self) {
    self.queue.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut inflight = 0;
    for task in &mut self.queue {
      if task.fetching {
        inflight += 1;
      } else if inflight < self.options.concurrency || task.priority >= DIRECT_PRIORITY {
        task.fetching = true;
        inflight += 1;
        task.spawn(&self.ctx);
      }
    }
  }

  /// A fetch settled: its deferred is already resolved, so just drop the
  /// task and re-run the dispatch pass for the freed slot.
  pub fn on_settled(&mut self, url: &str) {
    self.queue.retain(|task| task.url != url);
    self.dispatch();
  }

  /// Route a live request for one file. Serves the cache when possible;
  /// otherwise enqueues at direct priority, which promotes an
  /// already-queued task past the window instead of creating a second one,
  /// so there is never more than one in-flight fetch per URL.
  fn direct(&mut self, base: &BasePath, filename: &str) -> Deferred<FetchResponse> {
    let url = base.join(filename);

    if let Some(hit) = self.ctx.cache.lookup(&url) {
      let deferred = Deferred::new();
      deferred.resolve(hit);
      return deferred;
    }

    self.enqueue(base, std::iter::once(filename), DIRECT_PRIORITY);

    match self.queue.iter().find(|task| task.url == url) {
      Some(task) => task.deferred.clone(),
      // No task means the enqueue declined (unknown base); answer from the
      // cache or settle with a failure so the caller cannot hang.
      None => {
        let deferred = Deferred::new();
        match self.ctx.cache.lookup(&url) {
          Some(hit) => deferred.resolve(hit),
          None => deferred.resolve(FetchResponse::error(&url)),
        }
        deferred
      }
    }
  }

  /// Fetch interception: `None` when no known base covers `url`. The
  /// longest matching base wins when several do.
  pub fn intercept(&mut self, url: &str) -> Option<Deferred<FetchResponse>> {
    let base = self
      .bases
      .keys()
      .filter(|base| base.matches(url))
      .max_by_key(|base| base.len())
      .cloned()?;
    let filename = base.split_filename(url)?.to_owned();
    Some(self.direct(&base, &filename))
  }
}
