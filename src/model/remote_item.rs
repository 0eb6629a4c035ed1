use crate::framework::LoadError;
use crate::model::{ItemId, RemoteObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One backend entity and the state of its loading.
///
/// `is_loading` and `error` are never both set: starting a load clears the error and
/// settling a load clears `is_loading`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteItem<T> {
    pub id: ItemId,
    pub data: Option<T>,
    pub loaded: Option<DateTime<Utc>>,
    pub error: Option<LoadError>,
    pub is_loading: bool,
    pub is_stale: bool,
    pub deleted: bool,
    /// Attribute names with a write in flight, in the order the writes started.
    pub mutating: Vec<String>,
}

impl<T> Default for RemoteItem<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> RemoteItem<T> {
    /// An item that has never been loaded.
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            data: None,
            loaded: None,
            error: None,
            is_loading: false,
            is_stale: false,
            deleted: false,
            mutating: Vec::new(),
        }
    }

    /// An item whose data arrived as part of something else (e.g. a list). It counts as
    /// having data but not as loaded on its own.
    pub fn with_data(id: ItemId, data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::new(id)
        }
    }

    pub fn begin_load(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    pub fn finish_load(&mut self, data: T, at: DateTime<Utc>) {
        self.data = Some(data);
        self.loaded = Some(at);
        self.is_loading = false;
        self.is_stale = false;
        self.error = None;
    }

    pub fn fail(&mut self, error: LoadError) {
        self.is_loading = false;
        self.error = Some(error);
    }

    pub fn mark_stale(&mut self) {
        self.is_stale = true;
    }

    pub fn mark_deleted(&mut self) {
        self.deleted = true;
        self.is_loading = false;
    }

    pub fn begin_mutation<S: AsRef<str>>(&mut self, attributes: &[S]) {
        for attribute in attributes {
            let attribute = attribute.as_ref();
            if !self.mutating.iter().any(|m| m == attribute) {
                self.mutating.push(attribute.to_string());
            }
        }
    }

    /// Applies the entity as returned by the write and clears every pending attribute.
    pub fn finish_mutation(&mut self, data: T, at: DateTime<Utc>) {
        self.data = Some(data);
        self.loaded = Some(at);
        self.mutating.clear();
    }
}

impl<T: Clone + Send + Sync + 'static> RemoteObject for RemoteItem<T> {
    type Payload = T;

    fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    fn loaded(&self) -> Option<DateTime<Utc>> {
        self.loaded
    }

    fn is_stale(&self) -> bool {
        self.is_stale
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn has_data(&self) -> bool {
        self.data.is_some()
    }

    fn is_mutating(&self) -> bool {
        !self.mutating.is_empty()
    }

    fn project(&self) -> Option<T> {
        if self.deleted {
            None
        } else {
            self.data.clone()
        }
    }
}
