//! Call-site configuration for one load: the loader and the actions describing its
//! lifecycle.

use crate::framework::{CacheKey, LoadError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

/// Zero-argument asynchronous fetch of a payload.
pub type Loader<P> = Arc<dyn Fn() -> BoxFuture<'static, Result<P, LoadError>> + Send + Sync>;

pub(crate) type OnLoad<A> = Arc<dyn Fn() -> A + Send + Sync>;
pub(crate) type OnSuccess<P, A> = Arc<dyn Fn(P) -> A + Send + Sync>;
/// `None` means "nothing to dispatch", while still counting as a handled error.
pub(crate) type OnError<A> = Arc<dyn Fn(&LoadError) -> Option<A> + Send + Sync>;
pub(crate) type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Loader plus the store actions for its lifecycle.
///
/// ```ignore
/// let hooks = LoadHooks::new(
///     move || { let api = api.clone(); async move { get_json(&*api, "/api/orgs/1").await } },
///     || AppAction::OrganizationLoad,
///     AppAction::OrganizationLoaded,
/// )
/// .cache_key(CacheKey::new("organization").with_param(1));
/// ```
///
/// Without [`LoadHooks::on_error`], a failed load is not handled here and surfaces to
/// whoever reads the fetch.
pub struct LoadHooks<P, A> {
    pub(crate) loader: Loader<P>,
    pub(crate) on_load: OnLoad<A>,
    pub(crate) on_success: OnSuccess<P, A>,
    pub(crate) on_error: Option<OnError<A>>,
    pub(crate) is_necessary: Option<Predicate>,
    cache_key: Option<CacheKey>,
    loader_key: CacheKey,
}

impl<P, A> Clone for LoadHooks<P, A> {
    fn clone(&self) -> Self {
        Self {
            loader: self.loader.clone(),
            on_load: self.on_load.clone(),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            is_necessary: self.is_necessary.clone(),
            cache_key: self.cache_key.clone(),
            loader_key: self.loader_key.clone(),
        }
    }
}

impl<P, A> std::fmt::Debug for LoadHooks<P, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadHooks")
            .field("cache_key", &self.key())
            .field("on_error", &self.on_error.is_some())
            .field("is_necessary", &self.is_necessary.is_some())
            .finish()
    }
}

impl<P: Send + 'static, A: 'static> LoadHooks<P, A> {
    pub fn new<L, Fut, OL, OS>(loader: L, on_load: OL, on_success: OS) -> Self
    where
        L: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, LoadError>> + Send + 'static,
        OL: Fn() -> A + Send + Sync + 'static,
        OS: Fn(P) -> A + Send + Sync + 'static,
    {
        let loader_key = CacheKey::of_loader(&loader);
        Self {
            loader: Arc::new(move || loader().boxed()),
            on_load: Arc::new(on_load),
            on_success: Arc::new(on_success),
            on_error: None,
            is_necessary: None,
            cache_key: None,
            loader_key,
        }
    }

    /// Handles failed loads by dispatching the returned action. The fetch then resolves
    /// to no value instead of failing.
    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(&LoadError) -> A + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(move |e: &LoadError| Some(on_error(e))));
        self
    }

    /// Explicit key. Required whenever one loader definition serves several entities.
    pub fn cache_key(mut self, key: CacheKey) -> Self {
        self.cache_key = Some(key);
        self
    }

    /// Replaces the staleness policy for this call site.
    pub fn is_necessary<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.is_necessary = Some(Arc::new(predicate));
        self
    }
}

impl<P, A> LoadHooks<P, A> {
    /// The explicit key, or one derived from the loader's definition site.
    pub fn key(&self) -> CacheKey {
        self.cache_key
            .clone()
            .unwrap_or_else(|| self.loader_key.clone())
    }

    pub fn handles_errors(&self) -> bool {
        self.on_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hooks_for(id: u64) -> LoadHooks<u64, &'static str> {
        LoadHooks::new(move || async move { Ok(id) }, || "load", |_| "loaded")
    }

    #[test]
    fn default_key_collides_for_one_definition_site() {
        assert_eq!(hooks_for(1).key(), hooks_for(2).key());
    }

    #[test]
    fn explicit_key_wins() {
        let hooks = hooks_for(1).cache_key(CacheKey::new("thing").with_param(1));
        assert_eq!(hooks.key().to_string(), "thing(1)");
        assert_ne!(hooks.key(), hooks_for(2).cache_key(CacheKey::new("thing").with_param(2)).key());
    }

    #[tokio::test]
    async fn builder_wires_every_callback() {
        let hooks = hooks_for(7)
            .on_error(|_| "failed")
            .is_necessary(|| false);

        assert_eq!((hooks.loader)().await, Ok(7));
        assert_eq!((hooks.on_load)(), "load");
        assert_eq!((hooks.on_success)(7), "loaded");
        assert!(hooks.handles_errors());
        let on_error = hooks.on_error.clone().unwrap();
        assert_eq!(on_error(&LoadError::from("x")), Some("failed"));
        assert!(!(hooks.is_necessary.clone().unwrap())());
    }
}
