mod events;
mod scheduler;
mod worker;

pub use crate::worker::PrefetchWorker;

pub use prefetcher_cache::{MemoryCache, ResponseCache};
pub use prefetcher_common::{
  BasePath, BundleGraph, ControlMessage, FetchResponse, SchedulerOptions, BASELINE_PRIORITY,
  DIRECT_PRIORITY,
};
pub use prefetcher_error::{PrefetchError, PrefetchResult};
pub use prefetcher_fetch::{Fetcher, FsFetcher};
