/// One fetched HTTP response, and the unit stored in the response cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
  pub url: String,
  pub status: u16,
  pub body: Vec<u8>,
}

impl FetchResponse {
  pub fn new(url: impl Into<String>, status: u16, body: Vec<u8>) -> Self {
    Self { url: url.into(), status, body }
  }

  /// Synthetic marker for transport failures. Resolved to awaiting callers
  /// instead of an `Err` so a failed fetch never leaves a task unsettled;
  /// never stored in the cache.
  pub fn error(url: impl Into<String>) -> Self {
    Self { url: url.into(), status: 0, body: Vec::new() }
  }

  pub fn ok(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

#[test]
fn test_status_classes() {
  assert!(FetchResponse::new("/build/a.js", 200, Vec::new()).ok());
  assert!(FetchResponse::new("/build/a.js", 204, Vec::new()).ok());
  assert!(!FetchResponse::new("/build/a.js", 404, Vec::new()).ok());
  assert!(!FetchResponse::error("/build/a.js").ok());
}
