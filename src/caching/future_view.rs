use crate::framework::{CacheKey, ErasedValue, LoadError};
use crate::model::RemoteObject;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::warn;

/// What presentation code gets to see of some remote data.
///
/// Derived on demand from a [`RemoteObject`] or from the local state of a load; never
/// stored in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureView<T> {
    pub data: Option<T>,
    pub error: Option<LoadError>,
    pub is_loading: bool,
}

impl<T> Default for FutureView<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> FutureView<T> {
    pub fn empty() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
        }
    }

    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::empty()
        }
    }

    pub fn resolved(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::empty()
        }
    }

    pub fn failed(error: LoadError) -> Self {
        Self {
            error: Some(error),
            ..Self::empty()
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FutureView<U> {
        FutureView {
            data: self.data.map(f),
            error: self.error,
            is_loading: self.is_loading,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> FutureView<T> {
    /// Current view of a remote object.
    pub fn of<O>(obj: &O) -> Self
    where
        O: RemoteObject<Payload = T>,
    {
        Self {
            data: obj.project(),
            error: obj.error().cloned(),
            is_loading: obj.is_loading(),
        }
    }
}

/// Publishing side of a view shared by every call site loading the same key.
pub type SharedView<T> = Arc<watch::Sender<FutureView<T>>>;

/// One [`SharedView`] per cache key.
///
/// Only the first fetch function registered under a key is ever run, so whichever call
/// site registered it has to be able to reach every later call site's view. Keeping one
/// view per key makes that hold.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    views: Arc<Mutex<HashMap<CacheKey, ErasedValue>>>,
}

impl ViewRegistry {
    /// The view for `key`, created empty on first use.
    pub fn view<T>(&self, key: &CacheKey) -> SharedView<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut views = self.views.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = views.get(key) {
            return match existing.clone().downcast::<watch::Sender<FutureView<T>>>() {
                Ok(view) => view,
                Err(_) => {
                    warn!(cache_key = %key, expected = std::any::type_name::<T>(), "View type mismatch, using a detached view");
                    Arc::new(watch::channel(FutureView::empty()).0)
                }
            };
        }

        let view: SharedView<T> = Arc::new(watch::channel(FutureView::empty()).0);
        views.insert(key.clone(), view.clone());
        view
    }

    pub fn len(&self) -> usize {
        self.views.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
