/// Priority assigned to speculative prefetches.
pub const BASELINE_PRIORITY: i64 = 0;

/// Reserved priority for live, navigation-triggered requests. Tasks at this
/// level are dispatched regardless of the concurrency window.
pub const DIRECT_PRIORITY: i64 = i64::MAX;

/// Tunables for one scheduler instance.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
  /// Upper bound on concurrently in-flight prefetch tasks. Direct requests
  /// bypass this limit.
  pub concurrency: usize,
}

impl Default for SchedulerOptions {
  fn default() -> Self {
    Self { concurrency: 10 }
  }
}
