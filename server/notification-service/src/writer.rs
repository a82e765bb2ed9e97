//! Background persistence: the engine observer only publishes the latest list; a writer
//! task hands it to the key-value store on the blocking pool.
//!
//! Snapshots travel over a watch channel, so a slow store coalesces bursts of changes
//! and only the newest list is written once it catches up.

use notification_engine::{KeyValueStore, Notification, PersistenceAdapter, StoreObserver};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

#[derive(Debug, Clone)]
enum Snapshot {
  Save(Vec<Notification>),
  Clear,
}

/// Engine observer that queues snapshots for the writer task without touching the store.
pub struct PersistenceWriter {
  tx: watch::Sender<Option<Snapshot>>,
}

impl PersistenceWriter {
  /// Start the writer task. It finishes after the observer is dropped and the last
  /// queued snapshot has been written.
  pub fn spawn<S>(adapter: PersistenceAdapter<S>) -> (Self, JoinHandle<()>)
  where
    S: KeyValueStore + 'static,
  {
    let (tx, rx) = watch::channel(None);
    let task = tokio::spawn(write_loop(adapter, rx));
    (Self { tx }, task)
  }
}

impl StoreObserver for PersistenceWriter {
  fn on_change(&mut self, notifications: &[Notification]) {
    self.tx.send_replace(Some(Snapshot::Save(notifications.to_vec())));
  }

  fn on_clear(&mut self) {
    self.tx.send_replace(Some(Snapshot::Clear));
  }
}

async fn write_loop<S>(mut adapter: PersistenceAdapter<S>, mut rx: watch::Receiver<Option<Snapshot>>)
where
  S: KeyValueStore + 'static,
{
  while rx.changed().await.is_ok() {
    let Some(snapshot) = rx.borrow_and_update().clone() else {
      continue;
    };

    let joined = tokio::task::spawn_blocking(move || {
      let result = match &snapshot {
        Snapshot::Save(items) => adapter.save(items),
        Snapshot::Clear => adapter.clear(),
      };
      (adapter, result)
    })
    .await;

    match joined {
      Ok((returned, result)) => {
        adapter = returned;
        if let Err(e) = result {
          error!(error = %e, "failed to persist notifications");
        }
      }
      Err(e) => {
        error!(error = %e, "persistence writer panicked; giving up");
        return;
      }
    }
  }
  debug!("persistence writer stopped");
}
