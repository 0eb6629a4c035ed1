//! # Remote Object Loader
//!
//! Ties a remote object to the resource cache and the store:
//!
//! 1. decide whether a load is necessary ([`StalenessPolicy::is_necessary`])
//! 2. register the wrapped loader under the hooks' cache key (first registration wins)
//! 3. if necessary, start a fetch, suspending readers only on the very first attempt
//! 4. read whatever the cache holds for the key
//!
//! The wrapped loader dispatches the on-load action before the real loader is even
//! polled, then exactly one of on-success or on-error.

use crate::caching::future_view::ViewRegistry;
use crate::caching::hooks::LoadHooks;
use crate::caching::should_load::{has_loaded_once, StalenessPolicy};
use crate::framework::{
    CacheKey, Dispatcher, ErasedValue, FetchFn, FrameworkError, Readiness, Reducer,
    ResourceCacheClient,
};
use crate::model::{RemoteItem, RemoteList, RemoteObject};
use chrono::Utc;
use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Loads remote objects for one session. Cheap to clone.
pub struct RemoteObjectLoader<R: Reducer> {
    cache: ResourceCacheClient,
    dispatcher: Dispatcher<R>,
    policy: StalenessPolicy,
    views: ViewRegistry,
}

impl<R: Reducer> Clone for RemoteObjectLoader<R> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            dispatcher: self.dispatcher.clone(),
            policy: self.policy,
            views: self.views.clone(),
        }
    }
}

impl<R: Reducer> RemoteObjectLoader<R> {
    pub fn new(cache: ResourceCacheClient, dispatcher: Dispatcher<R>) -> Self {
        Self {
            cache,
            dispatcher,
            policy: StalenessPolicy::default(),
            views: ViewRegistry::default(),
        }
    }

    pub fn with_policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &StalenessPolicy {
        &self.policy
    }

    pub fn cache(&self) -> &ResourceCacheClient {
        &self.cache
    }

    pub fn dispatcher(&self) -> &Dispatcher<R> {
        &self.dispatcher
    }

    /// Views shared by every [`LoadIfNecessary`](crate::caching::LoadIfNecessary) built
    /// on this loader or its clones.
    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn is_necessary<O: RemoteObject>(
        &self,
        obj: Option<&O>,
        hooks: &LoadHooks<O::Payload, R::Action>,
    ) -> bool {
        self.policy.is_necessary(obj, hooks, Utc::now())
    }

    /// Loads `obj` if necessary and reads the cache entry for the hooks' key.
    ///
    /// Never waits for the fetch. A first load comes back as [`Readiness::NotReady`].
    pub async fn load<O: RemoteObject>(
        &self,
        obj: Option<&O>,
        hooks: &LoadHooks<O::Payload, R::Action>,
    ) -> Result<Readiness<O::Payload>, FrameworkError> {
        let necessary = self.is_necessary(obj, hooks);
        self.load_with(obj, hooks, necessary).await
    }

    #[instrument(skip_all, fields(cache_key = %hooks.key(), necessary))]
    pub(crate) async fn load_with<O: RemoteObject>(
        &self,
        obj: Option<&O>,
        hooks: &LoadHooks<O::Payload, R::Action>,
        necessary: bool,
    ) -> Result<Readiness<O::Payload>, FrameworkError> {
        let key = hooks.key();
        self.cache
            .ensure(key.clone(), self.fetch_fn(hooks.clone()))
            .await?;

        if necessary {
            let suspend = !has_loaded_once(obj);
            let started = self.cache.fetch(&key, suspend).await?;
            debug!(suspend, started, "Load necessary");
        }

        self.cache.read(&key).await
    }

    /// Loads an item and waits out a first load.
    ///
    /// Returns the item's data from the store, falling back to what the fetch produced.
    /// A failure the hooks do not handle comes back as [`FrameworkError::Load`].
    pub async fn load_item<T>(
        &self,
        item: Option<&RemoteItem<T>>,
        hooks: &LoadHooks<T, R::Action>,
    ) -> Result<Option<T>, FrameworkError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let readiness = self.load(item, hooks).await?;
        let fetched = self.ready(&hooks.key(), readiness).await?;
        Ok(item.and_then(RemoteObject::project).or(fetched))
    }

    /// List counterpart of [`RemoteObjectLoader::load_item`]. Deleted items and items
    /// without data are left out.
    ///
    /// The store's projection wins once the list has loaded or holds any data. A list of
    /// bare placeholders falls back to the fetched payload.
    pub async fn load_list<T>(
        &self,
        list: Option<&RemoteList<T>>,
        hooks: &LoadHooks<Vec<T>, R::Action>,
    ) -> Result<Vec<T>, FrameworkError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let readiness = self.load(list, hooks).await?;
        let fetched = self.ready(&hooks.key(), readiness).await?;
        let projected = list.map(RemoteList::projection).unwrap_or_default();
        let from_store = list.is_some_and(|list| list.loaded.is_some()) || !projected.is_empty();
        Ok(if from_store {
            projected
        } else {
            fetched.unwrap_or_default()
        })
    }

    async fn ready<P: Clone + 'static>(
        &self,
        key: &CacheKey,
        readiness: Readiness<P>,
    ) -> Result<Option<P>, FrameworkError> {
        match readiness {
            Readiness::NotReady(suspension) => {
                suspension.wait().await?;
                self.cache.resolve(key).await
            }
            Readiness::Ready(value) => Ok(value),
            Readiness::Failed(e) => Err(FrameworkError::Load(e)),
        }
    }

    fn fetch_fn<P>(&self, hooks: LoadHooks<P, R::Action>) -> FetchFn
    where
        P: Clone + Send + Sync + 'static,
    {
        let dispatcher = self.dispatcher.clone();
        Box::new(move || {
            let key = hooks.key();
            dispatch(&dispatcher, (hooks.on_load)(), &key);

            let loader = hooks.loader.clone();
            let on_success = hooks.on_success.clone();
            let on_error = hooks.on_error.clone();
            let dispatcher = dispatcher.clone();
            async move {
                match loader().await {
                    Ok(payload) => {
                        dispatch(&dispatcher, on_success(payload.clone()), &key);
                        Ok(Some(Arc::new(payload) as ErasedValue))
                    }
                    Err(error) => match on_error {
                        Some(on_error) => {
                            if let Some(action) = on_error(&error) {
                                dispatch(&dispatcher, action, &key);
                            }
                            Ok(None)
                        }
                        None => Err(error),
                    },
                }
            }
            .boxed()
        })
    }
}

fn dispatch<R: Reducer>(dispatcher: &Dispatcher<R>, action: R::Action, key: &CacheKey) {
    if let Err(e) = dispatcher.dispatch(action) {
        warn!(cache_key = %key, error = %e, "Dropped lifecycle action");
    }
}
