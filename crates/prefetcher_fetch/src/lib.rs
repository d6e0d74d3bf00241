mod fs;
#[cfg(feature = "http")]
mod http;

pub use crate::fs::FsFetcher;
#[cfg(feature = "http")]
pub use crate::http::HttpFetcher;

use prefetcher_common::FetchResponse;

/// Outbound fetch primitive: one URL in, one eventual response out.
///
/// `Err` is reserved for transport failures; an HTTP error status (404 and
/// friends) is a normal `Ok` response.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
  async fn fetch(&self, url: &str) -> anyhow::Result<FetchResponse>;
}
