use tokio::sync::watch;

/// Single-assignment result cell.
///
/// Exactly one writer fulfills the cell; any number of clones may await the
/// value (fan-out read). Resolving an already-resolved cell is a no-op.
#[derive(Debug, Clone)]
pub struct Deferred<T> {
  tx: watch::Sender<Option<T>>,
}

impl<T: Clone> Deferred<T> {
  pub fn new() -> Self {
    let (tx, _) = watch::channel(None);
    Self { tx }
  }

  pub fn resolve(&self, value: T) {
    self.tx.send_if_modified(|slot| {
      if slot.is_some() {
        return false;
      }
      *slot = Some(value);
      true
    });
  }

  pub fn is_resolved(&self) -> bool {
    self.tx.borrow().is_some()
  }

  pub async fn wait(&self) -> T {
    let mut rx = self.tx.subscribe();
    let slot = rx.wait_for(Option::is_some).await.expect("sender is owned by this cell");
    (*slot).clone().expect("checked by wait_for")
  }
}

impl<T: Clone> Default for Deferred<T> {
  fn default() -> Self {
    Self::new()
  }
}
