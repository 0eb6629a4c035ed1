use crate::caching::{RemoteObjectLoader, StalenessPolicy};
use crate::framework::{FrameworkError, Reducer, ResourceCache, ResourceCacheClient, Store, StoreClient};
use crate::lifecycle::{Config, ConfigError};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// One session's worth of loading machinery: a resource cache, a store and the loader
/// tying them together under the session's staleness policy.
///
/// The cache lives exactly as long as the session. Every load in the session goes
/// through the handles this hands out, so nothing is shared across sessions.
///
/// # Example
///
/// ```ignore
/// let session = Session::<AppReducer>::start(&Config::from_env()?, AppState::default())?;
/// let loader = session.loader();
/// // ... use the loader ...
/// drop(loader);
/// session.shutdown().await?;
/// ```
pub struct Session<R: Reducer> {
    cache: ResourceCacheClient,
    store: StoreClient<R>,
    loader: RemoteObjectLoader<R>,
    handles: Vec<JoinHandle<()>>,
}

impl<R: Reducer> Session<R> {
    /// Spawns the cache and store actors.
    pub fn start(config: &Config, initial: R::State) -> Result<Self, ConfigError> {
        let policy = StalenessPolicy {
            max_age: config.max_age()?,
        };

        let (cache_actor, cache) = ResourceCache::new(config.cache_buffer);
        let (store_actor, store) = Store::<R>::new(initial);
        let loader = RemoteObjectLoader::new(cache.clone(), store.dispatcher()).with_policy(policy);

        let cache_handle = tokio::spawn(cache_actor.run());
        let store_handle = tokio::spawn(store_actor.run());

        info!(cache_buffer = config.cache_buffer, max_age = ?config.cache_max_age, "Session started");
        Ok(Self {
            cache,
            store,
            loader,
            handles: vec![cache_handle, store_handle],
        })
    }

    /// The session's loader. Clones share the views of every call site in the session.
    pub fn loader(&self) -> RemoteObjectLoader<R> {
        self.loader.clone()
    }

    pub fn store(&self) -> &StoreClient<R> {
        &self.store
    }

    pub fn cache(&self) -> &ResourceCacheClient {
        &self.cache
    }

    /// Closes the session's own handles and waits for both actors to finish.
    ///
    /// Loaders and store clients handed out earlier keep the actors alive, so drop them
    /// first. In-flight fetches are allowed to settle.
    pub async fn shutdown(self) -> Result<(), FrameworkError> {
        info!("Shutting down session...");

        drop(self.loader);
        drop(self.cache);
        drop(self.store);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(FrameworkError::TaskFailed(e.to_string()));
            }
        }

        info!("Session shutdown complete.");
        Ok(())
    }
}
