use std::fmt;
use std::ops::{Deref, DerefMut};

/// Aggregated failure carrier. Most operations can surface several
/// independent problems at once (e.g. a batch of malformed messages), so the
/// error holds a list rather than a single cause.
#[derive(Debug)]
pub struct PrefetchError(pub Vec<anyhow::Error>);

impl PrefetchError {
  pub fn msg(message: impl Into<String>) -> Self {
    Self(vec![anyhow::anyhow!(message.into())])
  }
}

impl Deref for PrefetchError {
  type Target = Vec<anyhow::Error>;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl DerefMut for PrefetchError {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.0
  }
}

impl From<anyhow::Error> for PrefetchError {
  fn from(error: anyhow::Error) -> Self {
    Self(vec![error])
  }
}

impl From<Vec<anyhow::Error>> for PrefetchError {
  fn from(errors: Vec<anyhow::Error>) -> Self {
    Self(errors)
  }
}

impl fmt::Display for PrefetchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (index, error) in self.0.iter().enumerate() {
      if index > 0 {
        writeln!(f)?;
      }
      write!(f, "{error}")?;
    }
    Ok(())
  }
}

impl std::error::Error for PrefetchError {}

pub type PrefetchResult<T> = anyhow::Result<T, PrefetchError>;
