use std::sync::RwLock;

use prefetcher_common::FetchResponse;
use rustc_hash::FxHashMap;

use crate::ResponseCache;

/// In-memory `ResponseCache`, the default backing store.
#[derive(Debug, Default)]
pub struct MemoryCache {
  entries: RwLock<FxHashMap<String, FetchResponse>>,
}

impl MemoryCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.read().expect("cache lock poisoned").len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl ResponseCache for MemoryCache {
  fn lookup(&self, url: &str) -> Option<FetchResponse> {
    self.entries.read().expect("cache lock poisoned").get(url).cloned()
  }

  fn put(&self, response: FetchResponse) {
    let mut entries = self.entries.write().expect("cache lock poisoned");
    entries.insert(response.url.clone(), response);
  }

  fn delete(&self, url: &str) {
    self.entries.write().expect("cache lock poisoned").remove(url);
  }

  fn keys(&self) -> Vec<String> {
    self.entries.read().expect("cache lock poisoned").keys().cloned().collect()
  }
}
