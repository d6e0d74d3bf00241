use std::io;
use std::path::PathBuf;

use prefetcher_common::FetchResponse;

use crate::Fetcher;

/// Serves bundle URLs from a local directory, mapping the URL path onto the
/// root. Missing files answer 404; other IO failures are transport errors.
#[derive(Debug, Clone)]
pub struct FsFetcher {
  root: PathBuf,
}

impl FsFetcher {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }
}

#[async_trait::async_trait]
impl Fetcher for FsFetcher {
  async fn fetch(&self, url: &str) -> anyhow::Result<FetchResponse> {
    let path = self.root.join(url.trim_start_matches('/'));
    match tokio::fs::read(&path).await {
      Ok(body) => Ok(FetchResponse::new(url, 200, body)),
      Err(error) if error.kind() == io::ErrorKind::NotFound => {
        Ok(FetchResponse::new(url, 404, Vec::new()))
      }
      Err(error) => Err(anyhow::anyhow!("reading {} failed: {error}", path.display())),
    }
  }
}
