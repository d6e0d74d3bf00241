use prefetcher_common::FetchResponse;

use crate::Fetcher;

/// Fetches bundles over HTTP. URLs are resolved against an origin so the
/// scheduler can keep working with site-relative paths.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
  origin: String,
}

impl HttpFetcher {
  pub fn new(origin: impl Into<String>) -> Self {
    Self { client: reqwest::Client::new(), origin: origin.into() }
  }

  fn absolute(&self, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
      url.to_owned()
    } else {
      format!("{}{url}", self.origin.trim_end_matches('/'))
    }
  }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
  async fn fetch(&self, url: &str) -> anyhow::Result<FetchResponse> {
    let response = self.client.get(self.absolute(url)).send().await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?;
    Ok(FetchResponse::new(url, status, body.to_vec()))
  }
}
