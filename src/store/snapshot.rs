//! Versioned snapshot repository with broadcast fan-out.
//!
//! [`Repository`] keeps the full record set as an immutable
//! [`Snapshot`] behind a `tokio::sync::RwLock`. Every write builds a new
//! snapshot (copy-on-write over `Arc`ed records), swaps it in, and
//! broadcasts it while the write lock is still held, so the broadcast order is
//! the apply order. Readers clone the current `Arc` and never see a torn
//! record.
//!
//! Subscribers receive a [`Subscription`] which yields the snapshot current
//! at subscribe time followed by every later version in order.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{RwLock, broadcast};

/// Something a [`Repository`] can hold.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// A record id that is not present in the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{store} record not found: {id}")]
pub struct Missing {
    pub store: &'static str,
    pub id: String,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The full state of a record set at one version.
#[derive(Debug)]
pub struct Snapshot<R> {
    version: u64,
    items: Vec<Arc<R>>,
    index: HashMap<String, usize>,
}

impl<R: Record> Snapshot<R> {
    fn empty() -> Self {
        Self {
            version: 0,
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Monotonic version; bumped once per applied write.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.index.get(id).map(|&i| self.items[i].as_ref())
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &R> + '_ {
        self.items.iter().map(|r| r.as_ref())
    }

    // Copy-on-write successor: shares untouched records with `self`.
    fn successor(&self) -> Draft<R> {
        Draft {
            version: self.version + 1,
            items: self.items.clone(),
            index: self.index.clone(),
        }
    }
}

// Mutable successor under construction inside a write lock.
struct Draft<R> {
    version: u64,
    items: Vec<Arc<R>>,
    index: HashMap<String, usize>,
}

impl<R: Record> Draft<R> {
    fn put(&mut self, record: R) {
        match self.index.get(record.id()) {
            Some(&i) => self.items[i] = Arc::new(record),
            None => {
                self.index.insert(record.id().to_string(), self.items.len());
                self.items.push(Arc::new(record));
            }
        }
    }

    fn seal(self) -> Arc<Snapshot<R>> {
        Arc::new(Snapshot {
            version: self.version,
            items: self.items,
            index: self.index,
        })
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Default buffer capacity for the snapshot broadcast channel.
pub const DEFAULT_CAPACITY: usize = 256;

/// Single-writer / multi-reader record store that publishes every version.
pub struct Repository<R: Record> {
    name: &'static str,
    current: Arc<RwLock<Arc<Snapshot<R>>>>,
    sender: broadcast::Sender<Arc<Snapshot<R>>>,
}

impl<R: Record> Repository<R> {
    /// Create an empty store. `name` labels log lines and [`Missing`] errors.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            name,
            current: Arc::new(RwLock::new(Arc::new(Snapshot::empty()))),
            sender,
        }
    }

    /// The current snapshot. Holds the read lock only long enough to clone
    /// the `Arc`.
    pub async fn snapshot(&self) -> Arc<Snapshot<R>> {
        self.current.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Result<R, Missing> {
        self.snapshot()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| self.missing(id))
    }

    /// Insert or replace a record by id. Returns the new version.
    pub async fn upsert(&self, record: R) -> u64 {
        self.upsert_all(std::iter::once(record)).await
    }

    /// Insert or replace several records as one version.
    pub async fn upsert_all(&self, records: impl IntoIterator<Item = R>) -> u64 {
        let mut guard = self.current.write().await;
        let mut draft = guard.successor();
        for record in records {
            draft.put(record);
        }
        self.publish(&mut guard, draft)
    }

    /// Atomically read-modify-write one record.
    ///
    /// `f` runs on a private copy under the write lock. If it fails nothing is
    /// written and nothing is published.
    pub async fn modify<T, E>(
        &self,
        id: &str,
        f: impl FnOnce(&mut R) -> Result<T, E>,
    ) -> Result<(R, T), E>
    where
        E: From<Missing>,
    {
        let mut guard = self.current.write().await;
        let mut record = guard.get(id).cloned().ok_or_else(|| self.missing(id))?;
        let out = f(&mut record)?;

        let mut draft = guard.successor();
        draft.put(record.clone());
        self.publish(&mut guard, draft);
        Ok((record, out))
    }

    /// Apply `f` to one record under the write lock.
    ///
    /// `f` returns whether it changed the record; an unchanged record is
    /// neither written nor published. Returns the record as stored afterwards.
    pub async fn update(&self, id: &str, f: impl FnOnce(&mut R) -> bool) -> Result<R, Missing> {
        let mut guard = self.current.write().await;
        let mut record = guard.get(id).cloned().ok_or_else(|| self.missing(id))?;
        if f(&mut record) {
            let mut draft = guard.successor();
            draft.put(record.clone());
            self.publish(&mut guard, draft);
        }
        Ok(record)
    }

    /// Apply `f` to every record matching `pred` as one version.
    ///
    /// `f` returns whether it changed the record. Returns the number of
    /// changed records; nothing is published when it is zero.
    pub async fn modify_where(
        &self,
        pred: impl Fn(&R) -> bool,
        mut f: impl FnMut(&mut R) -> bool,
    ) -> usize {
        let mut guard = self.current.write().await;
        let mut draft = guard.successor();
        let mut changed = 0;
        for slot in draft.items.iter_mut() {
            if !pred(slot.as_ref()) {
                continue;
            }
            let mut record = R::clone(slot.as_ref());
            if f(&mut record) {
                *slot = Arc::new(record);
                changed += 1;
            }
        }
        if changed > 0 {
            self.publish(&mut guard, draft);
        }
        changed
    }

    /// Subscribe to every future version.
    ///
    /// The first item yielded is the snapshot current at the time of the
    /// call.
    pub async fn subscribe(&self) -> Subscription<R> {
        // Subscribing under the read lock means no write can land between
        // reading `initial` and attaching the receiver.
        let guard = self.current.read().await;
        let receiver = self.sender.subscribe();
        let initial = guard.clone();
        Subscription {
            store: self.name,
            last_seen: initial.version,
            pending: Some(initial),
            receiver,
            current: Arc::clone(&self.current),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn publish(&self, slot: &mut Arc<Snapshot<R>>, draft: Draft<R>) -> u64 {
        let snapshot = draft.seal();
        let version = snapshot.version;
        *slot = Arc::clone(&snapshot);
        tracing::debug!(
            store = self.name,
            version,
            records = snapshot.len(),
            "Published snapshot"
        );
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(snapshot);
        version
    }

    fn missing(&self, id: &str) -> Missing {
        Missing {
            store: self.name,
            id: id.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// One subscriber's cursor over a [`Repository`]'s versions.
///
/// Versions are yielded strictly increasing. A subscriber that falls more
/// than the channel capacity behind is resynchronised to the latest
/// snapshot instead of receiving the dropped intermediates.
pub struct Subscription<R: Record> {
    store: &'static str,
    last_seen: u64,
    pending: Option<Arc<Snapshot<R>>>,
    receiver: broadcast::Receiver<Arc<Snapshot<R>>>,
    current: Arc<RwLock<Arc<Snapshot<R>>>>,
}

impl<R: Record> Subscription<R> {
    /// Wait for the next snapshot. Returns `None` once the repository is
    /// dropped and every buffered snapshot has been consumed.
    pub async fn next(&mut self) -> Option<Arc<Snapshot<R>>> {
        if let Some(initial) = self.pending.take() {
            return Some(initial);
        }
        loop {
            match self.receiver.recv().await {
                Ok(snapshot) => {
                    if snapshot.version <= self.last_seen {
                        continue;
                    }
                    self.last_seen = snapshot.version;
                    return Some(snapshot);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(store = self.store, skipped, "Subscriber lagged, resyncing");
                    let latest = self.current.read().await.clone();
                    if latest.version > self.last_seen {
                        self.last_seen = latest.version;
                        return Some(latest);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
