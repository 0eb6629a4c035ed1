//! The entry point data-fetching call sites use.
//!
//! A [`LoadIfNecessary`] is bound to one call site: one set of hooks and one kind of
//! remote object, picked by its type parameter. Each [`LoadIfNecessary::run`] is a
//! "render pass" over the latest descriptor from the store.
//!
//! Call sites loading the same cache key share one view (see
//! [`ViewRegistry`](crate::caching::ViewRegistry)), so a fetch started or deduplicated by
//! any of them settles all of them.

use crate::caching::future_view::{FutureView, SharedView};
use crate::caching::hooks::LoadHooks;
use crate::caching::remote_object::RemoteObjectLoader;
use crate::framework::{FrameworkError, LoadError, Reducer};
use crate::model::RemoteObject;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument};

pub struct LoadIfNecessary<O: RemoteObject, R: Reducer> {
    loader: RemoteObjectLoader<R>,
    hooks: LoadHooks<O::Payload, R::Action>,
    state: SharedView<O::Payload>,
    _object: PhantomData<fn(&O)>,
}

impl<O: RemoteObject, R: Reducer> LoadIfNecessary<O, R> {
    /// Binds `hooks` to the view for their cache key. Errors are always handled here: they
    /// land in [`FutureView::error`], and the hooks' own on-error action is dispatched if
    /// it has one.
    pub fn new(loader: RemoteObjectLoader<R>, hooks: LoadHooks<O::Payload, R::Action>) -> Self {
        let state = loader.views().view(&hooks.key());
        let hooks = observed(hooks, state.clone());
        Self {
            loader,
            hooks,
            state,
            _object: PhantomData,
        }
    }

    /// One pass over the current descriptor.
    ///
    /// Starts a load if one is necessary, in which case the view turns to loading
    /// immediately. Otherwise the view is recomputed from `obj`, unless `obj` is itself
    /// loading: the fetch behind that already drives the view. An absent `obj` changes
    /// nothing.
    #[instrument(skip_all, fields(cache_key = %self.hooks.key()))]
    pub async fn run(&self, obj: Option<&O>) -> Result<FutureView<O::Payload>, FrameworkError> {
        let Some(obj) = obj else {
            return Ok(self.current());
        };

        let necessary = self.loader.is_necessary(Some(obj), &self.hooks);
        if necessary {
            debug!("Marking view as loading");
            self.state.send_replace(FutureView::loading());
        }

        self.loader
            .load_with(Some(obj), &self.hooks, necessary)
            .await?;

        if !necessary && !obj.is_loading() {
            self.state.send_replace(FutureView::of(obj));
        }
        Ok(self.current())
    }

    pub fn current(&self) -> FutureView<O::Payload> {
        self.state.borrow().clone()
    }

    /// Receiver notified whenever the view changes, including from a fetch finishing.
    pub fn subscribe(&self) -> watch::Receiver<FutureView<O::Payload>> {
        self.state.subscribe()
    }

    /// Waits until the view is no longer loading.
    pub async fn settled(&self) -> FutureView<O::Payload> {
        let mut changes = self.state.subscribe();
        let settled = match changes.wait_for(|view| !view.is_loading).await {
            Ok(view) => view.clone(),
            Err(_) => self.current(),
        };
        settled
    }
}

/// Wraps each lifecycle hook so it also updates the local view.
fn observed<P, A>(mut hooks: LoadHooks<P, A>, state: SharedView<P>) -> LoadHooks<P, A>
where
    P: Clone + Send + Sync + 'static,
    A: 'static,
{
    let on_load = hooks.on_load.clone();
    let view = state.clone();
    hooks.on_load = Arc::new(move || {
        view.send_replace(FutureView::loading());
        on_load()
    });

    let on_success = hooks.on_success.clone();
    let view = state.clone();
    hooks.on_success = Arc::new(move |data: P| {
        view.send_replace(FutureView::resolved(data.clone()));
        on_success(data)
    });

    let on_error = hooks.on_error.clone();
    hooks.on_error = Some(Arc::new(move |error: &LoadError| {
        state.send_replace(FutureView::failed(error.clone()));
        on_error.as_ref().and_then(|handle| handle(error))
    }));

    hooks
}
