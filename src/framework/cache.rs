//! # Resource Cache Actor
//!
//! The [`ResourceCache`] owns the session-wide map from [`CacheKey`] to [`Resource`].
//! It is the only code that ever touches a `Resource`; everyone else holds a
//! [`ResourceCacheClient`] and talks to it by message.
//!
//! **Concurrency Model**: requests are processed one at a time, so "is a fetch pending
//! for this key?" and "start a fetch" can never interleave. This is what guarantees at
//! most one in-flight fetch per key without any lock on the map. The fetches themselves
//! run as spawned tasks and report back with an internal `Settle` message, so distinct
//! keys load concurrently.
//!
//! Entries are created lazily and never evicted.

use crate::framework::error::{FrameworkError, LoadError};
use crate::framework::key::CacheKey;
use crate::framework::resource::{
    ErasedValue, FetchFn, FetchOutcome, Readiness, Resource, ResourceStatus,
};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. MESSAGES
// =============================================================================

/// One-shot reply channel.
pub type Response<T> = oneshot::Sender<T>;

/// Messages understood by the [`ResourceCache`] actor.
pub enum CacheRequest {
    /// Registers a fetch function for `key` unless one already exists.
    Ensure {
        key: CacheKey,
        fetch_fn: FetchFn,
        respond_to: Response<bool>,
    },
    /// Starts a fetch for `key` unless one is outstanding.
    Fetch {
        key: CacheKey,
        suspend: bool,
        respond_to: Response<bool>,
    },
    Read {
        key: CacheKey,
        respond_to: Response<Readiness<ErasedValue>>,
    },
    Status {
        key: CacheKey,
        respond_to: Response<Option<ResourceStatus>>,
    },
    Len {
        respond_to: Response<usize>,
    },
    /// Sent by a finished fetch task.
    Settle { key: CacheKey, outcome: FetchOutcome },
}

impl std::fmt::Debug for CacheRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheRequest::Ensure { key, .. } => write!(f, "Ensure({key})"),
            CacheRequest::Fetch { key, suspend, .. } => write!(f, "Fetch({key}, suspend={suspend})"),
            CacheRequest::Read { key, .. } => write!(f, "Read({key})"),
            CacheRequest::Status { key, .. } => write!(f, "Status({key})"),
            CacheRequest::Len { .. } => write!(f, "Len"),
            CacheRequest::Settle { key, outcome } => {
                write!(f, "Settle({key}, ok={})", outcome.is_ok())
            }
        }
    }
}

// =============================================================================
// 2. THE ACTOR
// =============================================================================

pub struct ResourceCache {
    receiver: mpsc::Receiver<CacheRequest>,
    // Fetch tasks get a strong sender so the actor outlives every in-flight fetch.
    settle_to: mpsc::WeakSender<CacheRequest>,
    resources: HashMap<CacheKey, Resource>,
}

impl ResourceCache {
    /// Creates the actor and its client. The actor does nothing until [`ResourceCache::run`].
    pub fn new(buffer_size: usize) -> (Self, ResourceCacheClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            settle_to: sender.downgrade(),
            resources: HashMap::new(),
        };
        (actor, ResourceCacheClient::new(sender))
    }

    /// Processes requests until every client is dropped and every fetch has settled.
    pub async fn run(mut self) {
        info!("Resource cache started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CacheRequest::Ensure {
                    key,
                    fetch_fn,
                    respond_to,
                } => {
                    let inserted = !self.resources.contains_key(&key);
                    if inserted {
                        debug!(cache_key = %key, size = self.resources.len() + 1, "Resource created");
                        self.resources.insert(key, Resource::new(fetch_fn));
                    }
                    let _ = respond_to.send(inserted);
                }
                CacheRequest::Fetch {
                    key,
                    suspend,
                    respond_to,
                } => {
                    let started = self.start_fetch(key, suspend);
                    let _ = respond_to.send(started);
                }
                CacheRequest::Read { key, respond_to } => {
                    let read = self
                        .resources
                        .get(&key)
                        .map(Resource::read)
                        .unwrap_or(Readiness::Ready(None));
                    let _ = respond_to.send(read);
                }
                CacheRequest::Status { key, respond_to } => {
                    let _ = respond_to.send(self.resources.get(&key).map(Resource::status));
                }
                CacheRequest::Len { respond_to } => {
                    let _ = respond_to.send(self.resources.len());
                }
                CacheRequest::Settle { key, outcome } => match self.resources.get_mut(&key) {
                    Some(resource) => {
                        match &outcome {
                            Ok(_) => debug!(cache_key = %key, "Fetch settled"),
                            Err(e) => warn!(cache_key = %key, error = %e, "Fetch failed"),
                        }
                        resource.settle(outcome);
                    }
                    None => warn!(cache_key = %key, "Settle for unknown resource"),
                },
            }
        }

        info!(size = self.resources.len(), "Resource cache shutdown");
    }

    fn start_fetch(&mut self, key: CacheKey, suspend: bool) -> bool {
        let Some(resource) = self.resources.get_mut(&key) else {
            warn!(cache_key = %key, "Fetch for unknown resource");
            return false;
        };
        let Some(pending) = resource.fetch(suspend) else {
            debug!(cache_key = %key, "Fetch already pending");
            return false;
        };
        debug!(cache_key = %key, suspend, "Fetch started");

        let settle_to = self.settle_to.upgrade();
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(pending)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(LoadError::Backend("loader panicked".into())));
            match settle_to {
                Some(sender) => {
                    let _ = sender.send(CacheRequest::Settle { key, outcome }).await;
                }
                None => debug!(cache_key = %key, "Cache gone before fetch settled"),
            }
        });
        true
    }
}

// =============================================================================
// 3. THE CLIENT
// =============================================================================

/// Handle on the session's [`ResourceCache`]. Cheap to clone.
#[derive(Clone)]
pub struct ResourceCacheClient {
    sender: mpsc::Sender<CacheRequest>,
}

impl ResourceCacheClient {
    pub fn new(sender: mpsc::Sender<CacheRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> CacheRequest,
    ) -> Result<T, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)
    }

    /// Registers `fetch_fn` under `key`. Returns `false` if the key already had one.
    pub async fn ensure(&self, key: CacheKey, fetch_fn: FetchFn) -> Result<bool, FrameworkError> {
        self.request(|respond_to| CacheRequest::Ensure {
            key,
            fetch_fn,
            respond_to,
        })
        .await
    }

    /// Starts a fetch. Returns `false` when deduplicated or when `key` is unknown.
    pub async fn fetch(&self, key: &CacheKey, suspend: bool) -> Result<bool, FrameworkError> {
        let key = key.clone();
        self.request(|respond_to| CacheRequest::Fetch {
            key,
            suspend,
            respond_to,
        })
        .await
    }

    pub async fn read_erased(&self, key: &CacheKey) -> Result<Readiness<ErasedValue>, FrameworkError> {
        let key = key.clone();
        self.request(|respond_to| CacheRequest::Read { key, respond_to })
            .await
    }

    /// Non-blocking typed read.
    pub async fn read<T: Clone + 'static>(&self, key: &CacheKey) -> Result<Readiness<T>, FrameworkError> {
        self.read_erased(key).await?.downcast(key)
    }

    /// Reads, waiting out suspending fetches. A failed fetch comes back as
    /// [`FrameworkError::Load`].
    pub async fn resolve<T: Clone + 'static>(&self, key: &CacheKey) -> Result<Option<T>, FrameworkError> {
        loop {
            match self.read::<T>(key).await? {
                Readiness::NotReady(suspension) => suspension.wait().await?,
                Readiness::Ready(value) => return Ok(value),
                Readiness::Failed(e) => return Err(FrameworkError::Load(e)),
            }
        }
    }

    pub async fn status(&self, key: &CacheKey) -> Result<Option<ResourceStatus>, FrameworkError> {
        let key = key.clone();
        self.request(|respond_to| CacheRequest::Status { key, respond_to })
            .await
    }

    pub async fn len(&self) -> Result<usize, FrameworkError> {
        self.request(|respond_to| CacheRequest::Len { respond_to }).await
    }

    pub async fn is_empty(&self) -> Result<bool, FrameworkError> {
        Ok(self.len().await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn gated_fetch(
        calls: Arc<AtomicUsize>,
        gate: Arc<Notify>,
        outcome: Result<u32, LoadError>,
    ) -> FetchFn {
        Box::new(move || -> BoxFuture<'static, FetchOutcome> {
            calls.fetch_add(1, Ordering::SeqCst);
            let gate = gate.clone();
            let outcome = outcome.clone();
            async move {
                gate.notified().await;
                outcome.map(|v| Some(Arc::new(v) as ErasedValue))
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn unknown_key_reads_as_empty() {
        let (actor, client) = ResourceCache::new(8);
        tokio::spawn(actor.run());

        let key = CacheKey::new("missing");
        assert!(matches!(client.read::<u32>(&key).await.unwrap(), Readiness::Ready(None)));
        assert!(!client.fetch(&key, true).await.unwrap());
        assert_eq!(client.status(&key).await.unwrap(), None);
        assert!(client.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn first_registration_wins() {
        let (actor, client) = ResourceCache::new(8);
        tokio::spawn(actor.run());

        let key = CacheKey::new("orgs");
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        assert!(client
            .ensure(key.clone(), gated_fetch(calls.clone(), gate.clone(), Ok(1)))
            .await
            .unwrap());
        assert!(!client
            .ensure(key.clone(), gated_fetch(calls.clone(), gate.clone(), Ok(2)))
            .await
            .unwrap());

        client.fetch(&key, true).await.unwrap();
        gate.notify_one();
        assert_eq!(client.resolve::<u32>(&key).await.unwrap(), Some(1));
        assert_eq!(client.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_fetches_for_one_key_run_the_loader_once() {
        let (actor, client) = ResourceCache::new(8);
        tokio::spawn(actor.run());

        let key = CacheKey::new("campaign").with_param(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        client
            .ensure(key.clone(), gated_fetch(calls.clone(), gate.clone(), Ok(42)))
            .await
            .unwrap();

        assert!(client.fetch(&key, true).await.unwrap());
        assert!(!client.fetch(&key, false).await.unwrap());
        assert!(!client.fetch(&key, true).await.unwrap());
        assert_eq!(client.status(&key).await.unwrap(), Some(ResourceStatus::PendingSuspend));

        let (a, b) = {
            let (c1, c2) = (client.clone(), client.clone());
            let (k1, k2) = (key.clone(), key.clone());
            let first = tokio::spawn(async move { c1.resolve::<u32>(&k1).await });
            let second = tokio::spawn(async move { c2.resolve::<u32>(&k2).await });
            tokio::task::yield_now().await;
            gate.notify_one();
            (first.await.unwrap(), second.await.unwrap())
        };

        assert_eq!(a.unwrap(), Some(42));
        assert_eq!(b.unwrap(), Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.status(&key).await.unwrap(), Some(ResourceStatus::Success));
    }

    #[tokio::test]
    async fn failed_fetch_resolves_to_load_error() {
        let (actor, client) = ResourceCache::new(8);
        tokio::spawn(actor.run());

        let key = CacheKey::new("event").with_param(3);
        let gate = Arc::new(Notify::new());
        client
            .ensure(
                key.clone(),
                gated_fetch(Arc::new(AtomicUsize::new(0)), gate.clone(), Err("boom".into())),
            )
            .await
            .unwrap();
        client.fetch(&key, true).await.unwrap();
        gate.notify_one();

        let err = client.resolve::<u32>(&key).await.unwrap_err();
        assert_eq!(err, FrameworkError::Load(LoadError::Backend("boom".into())));
        assert_eq!(client.status(&key).await.unwrap(), Some(ResourceStatus::Error));
    }

    #[tokio::test]
    async fn panicking_loader_settles_as_error() {
        let (actor, client) = ResourceCache::new(8);
        tokio::spawn(actor.run());

        let key = CacheKey::new("explodes");
        async fn explode() -> FetchOutcome {
            panic!("loader bug")
        }
        let fetch_fn: FetchFn = Box::new(|| -> BoxFuture<'static, FetchOutcome> { explode().boxed() });
        client.ensure(key.clone(), fetch_fn).await.unwrap();
        client.fetch(&key, true).await.unwrap();

        let err = client.resolve::<u32>(&key).await.unwrap_err();
        assert!(matches!(err, FrameworkError::Load(LoadError::Backend(_))));
    }

    #[tokio::test]
    async fn actor_stops_when_clients_are_dropped() {
        let (actor, client) = ResourceCache::new(8);
        let handle = tokio::spawn(actor.run());
        client.len().await.unwrap();
        drop(client);
        handle.await.unwrap();
    }
}
