use arcstr::ArcStr;

/// `BasePath` is the URL path prefix grouping a set of bundle files governed
/// by one dependency graph.
/// - It is the key of the scheduler's base registry.
/// - Cloning is cheap; the underlying string is shared.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct BasePath(ArcStr);

impl BasePath {
  pub fn new(value: impl Into<ArcStr>) -> Self {
    Self(value.into())
  }

  /// Full URL of a bundle file living under this base.
  pub fn join(&self, filename: &str) -> String {
    format!("{}{filename}", self.0)
  }

  /// Whether `url` addresses a file under this base.
  pub fn matches(&self, url: &str) -> bool {
    url.starts_with(self.0.as_str())
  }

  /// Strip the base prefix from `url`, yielding the bundle filename.
  pub fn split_filename<'a>(&self, url: &'a str) -> Option<&'a str> {
    url.strip_prefix(self.0.as_str())
  }
}

impl std::ops::Deref for BasePath {
  type Target = str;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl AsRef<str> for BasePath {
  fn as_ref(&self) -> &str {
    self
  }
}

impl From<ArcStr> for BasePath {
  fn from(value: ArcStr) -> Self {
    Self::new(value)
  }
}

impl From<&str> for BasePath {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

impl std::fmt::Display for BasePath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[test]
fn test_base_path_split() {
  let base = BasePath::new("/build/");
  assert_eq!(base.join("q-abc.js"), "/build/q-abc.js");
  assert!(base.matches("/build/q-abc.js"));
  assert!(!base.matches("/assets/q-abc.js"));
  assert_eq!(base.split_filename("/build/q-abc.js"), Some("q-abc.js"));
  assert_eq!(base.split_filename("/assets/q-abc.js"), None);
}
