//! When a load is warranted.

use crate::caching::hooks::LoadHooks;
use crate::model::RemoteObject;
use chrono::{DateTime, Duration, Utc};

/// Default necessity policy, optionally with a maximum age for loaded data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StalenessPolicy {
    pub max_age: Option<Duration>,
}

impl StalenessPolicy {
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
        }
    }

    pub fn should_load<O: RemoteObject>(&self, obj: Option<&O>, now: DateTime<Utc>) -> bool {
        let Some(obj) = obj else {
            return true;
        };
        if obj.is_deleted() || obj.is_loading() {
            return false;
        }
        if obj.is_stale() {
            return true;
        }
        match (obj.loaded(), self.max_age) {
            (None, _) => true,
            (Some(loaded), Some(max_age)) => now - loaded > max_age,
            (Some(_), None) => false,
        }
    }

    /// The call site's predicate if it has one, else [`StalenessPolicy::should_load`].
    /// A deleted object is never necessary either way.
    pub fn is_necessary<O, A>(
        &self,
        obj: Option<&O>,
        hooks: &LoadHooks<O::Payload, A>,
        now: DateTime<Utc>,
    ) -> bool
    where
        O: RemoteObject,
    {
        if obj.is_some_and(|o| o.is_deleted()) {
            return false;
        }
        match &hooks.is_necessary {
            Some(predicate) => predicate(),
            None => self.should_load(obj, now),
        }
    }
}

/// [`StalenessPolicy::should_load`] with no maximum age, evaluated now.
pub fn should_load<O: RemoteObject>(obj: Option<&O>) -> bool {
    StalenessPolicy::default().should_load(obj, Utc::now())
}

/// Whether any attempt to load `obj` has been made. The first attempt suspends readers,
/// later ones refresh in the background.
pub fn has_loaded_once<O: RemoteObject>(obj: Option<&O>) -> bool {
    obj.is_some_and(|o| {
        o.is_loading()
            || o.error().is_some()
            || o.loaded().is_some()
            || o.has_data()
            || o.is_stale()
            || o.is_mutating()
    })
}
