//! Generic engine for remote-data loading.
//!
//! # Main Components
//!
//! - [`Resource`] - one deduplicated fetch and its status
//! - [`ResourceCache`] - actor owning every resource of a session, keyed by [`CacheKey`]
//! - [`Store`] - actor holding application state, changed only through a [`Reducer`]
//! - [`FrameworkError`] / [`LoadError`] - plumbing failures vs. loader failures
//!
//! # Testing
//!
//! See [`mock`] for an in-memory backend.

pub mod cache;
pub mod error;
pub mod key;
pub mod mock;
pub mod resource;
pub mod store;

pub use cache::{CacheRequest, ResourceCache, ResourceCacheClient};
pub use error::{FrameworkError, LoadError};
pub use key::CacheKey;
pub use resource::{
    ErasedValue, FetchFn, FetchOutcome, PendingFetch, Readiness, Resource, ResourceStatus,
    Suspension,
};
pub use store::{Dispatcher, Reducer, Store, StoreClient, StoreRequest};
