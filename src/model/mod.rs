//! Client-side records describing the load state of backend-owned data.
//!
//! - [`RemoteItem`] - one entity
//! - [`RemoteList`] - a collection of entities, each tracked as a `RemoteItem`
//!
//! Both implement [`RemoteObject`], which is what the staleness policy and the loaders
//! read. A call site picks one of the two statically; nothing ever inspects a descriptor
//! at runtime to guess which kind it is.

pub mod remote_item;
pub mod remote_list;

pub use remote_item::*;
pub use remote_list::*;

use crate::framework::LoadError;
use chrono::{DateTime, Utc};

/// Domain id of a backend entity.
pub type ItemId = u64;

/// Entities that carry their own domain id.
pub trait Identified {
    fn id(&self) -> ItemId;
}

/// Load-state of some remote data, as seen by the staleness policy.
pub trait RemoteObject: Send + Sync {
    /// What a successful load produces: `T` for an item, `Vec<T>` for a list.
    type Payload: Clone + Send + Sync + 'static;

    fn is_loading(&self) -> bool;

    fn error(&self) -> Option<&LoadError>;

    /// When the last successful load finished.
    fn loaded(&self) -> Option<DateTime<Utc>>;

    fn is_stale(&self) -> bool;

    /// Tombstoned. Never refetched, never projected.
    fn is_deleted(&self) -> bool {
        false
    }

    fn has_data(&self) -> bool;

    /// Whether any attribute is currently being written.
    fn is_mutating(&self) -> bool {
        false
    }

    /// The data a consumer may render, if any.
    fn project(&self) -> Option<Self::Payload>;
}
