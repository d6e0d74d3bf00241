mod memory;

pub use crate::memory::MemoryCache;

use prefetcher_common::FetchResponse;

/// Persistent response store keyed by request URL.
///
/// The scheduler only ever consults it through this seam; durability and
/// eviction beyond graph-driven cleanup are the implementation's business.
pub trait ResponseCache: Send + Sync {
  /// Look up the cached response for `url`.
  fn lookup(&self, url: &str) -> Option<FetchResponse>;

  /// Store a response under its request URL, replacing any previous entry.
  fn put(&self, response: FetchResponse);

  /// Drop the entry for `url`. Unknown URLs are a no-op.
  fn delete(&self, url: &str);

  /// All cached request URLs, in no particular order.
  fn keys(&self) -> Vec<String>;

  fn contains(&self, url: &str) -> bool {
    self.lookup(url).is_some()
  }
}
