use crate::framework::LoadError;
use crate::model::{Identified, ItemId, RemoteItem, RemoteObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A collection of backend entities and the state of loading the collection as a whole.
///
/// Items are unique by id. Every way of adding one merges into the existing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteList<T> {
    pub items: Vec<RemoteItem<T>>,
    pub loaded: Option<DateTime<Utc>>,
    pub error: Option<LoadError>,
    pub is_loading: bool,
    pub is_stale: bool,
}

impl<T> Default for RemoteList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RemoteList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            loaded: None,
            error: None,
            is_loading: false,
            is_stale: false,
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&RemoteItem<T>> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut RemoteItem<T>> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// The entry for `id`, creating an empty one at the end if there is none.
    pub fn find_or_add(&mut self, id: ItemId) -> &mut RemoteItem<T> {
        match self.items.iter().position(|item| item.id == id) {
            Some(index) => &mut self.items[index],
            None => {
                self.items.push(RemoteItem::new(id));
                let last = self.items.len() - 1;
                &mut self.items[last]
            }
        }
    }

    pub fn begin_load(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    pub fn fail(&mut self, error: LoadError) {
        self.is_loading = false;
        self.error = Some(error);
    }

    pub fn mark_stale(&mut self) {
        self.is_stale = true;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Identified> RemoteList<T> {
    /// A list seeded with already-known entities. Neither the list nor its items count as
    /// loaded.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut list = Self::new();
        for data in items {
            let id = data.id();
            list.find_or_add(id).data = Some(data);
        }
        list
    }

    /// Stores a freshly loaded entity, merging into an existing entry with the same id.
    pub fn upsert(&mut self, data: T, at: DateTime<Utc>) -> &mut RemoteItem<T> {
        let item = self.find_or_add(data.id());
        item.finish_load(data, at);
        item
    }

    /// Replaces the contents with a freshly loaded collection.
    ///
    /// Entries already known under the same id keep their tombstones and pending
    /// mutations; everything else the backend no longer returns is dropped.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = T>, at: DateTime<Utc>) {
        let mut previous = std::mem::take(&mut self.items);
        for data in items {
            let id = data.id();
            let mut item = match previous.iter().position(|p| p.id == id) {
                Some(index) => previous.swap_remove(index),
                None => self
                    .items
                    .iter()
                    .position(|p| p.id == id)
                    .map(|index| self.items.remove(index))
                    .unwrap_or_else(|| RemoteItem::new(id)),
            };
            item.finish_load(data, at);
            self.items.push(item);
        }
        self.loaded = Some(at);
        self.is_loading = false;
        self.is_stale = false;
        self.error = None;
    }
}

impl<T: Clone + Send + Sync + 'static> RemoteList<T> {
    /// Data of every item that has some and is not deleted, in list order.
    pub fn projection(&self) -> Vec<T> {
        self.items
            .iter()
            .filter(|item| !item.deleted)
            .filter_map(|item| item.data.clone())
            .collect()
    }
}

impl<T: Clone + Send + Sync + 'static> RemoteObject for RemoteList<T> {
    type Payload = Vec<T>;

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

    fn has_data(&self) -> bool {
        !self.items.is_empty()
    }

    fn project(&self) -> Option<Vec<T>> {
        Some(self.projection())
    }
}
