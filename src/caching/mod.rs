//! Load coordination between remote objects, the resource cache and the store.
//!
//! [`LoadIfNecessary`] is what call sites use. It sits on a [`RemoteObjectLoader`], which
//! decides with the [`StalenessPolicy`] whether to fetch and drives the [`LoadHooks`].

pub mod future_view;
pub mod hooks;
pub mod load_if_necessary;
pub mod remote_object;
pub mod should_load;

pub use future_view::{FutureView, SharedView, ViewRegistry};
pub use hooks::{LoadHooks, Loader};
pub use load_if_necessary::LoadIfNecessary;
pub use remote_object::RemoteObjectLoader;
pub use should_load::{has_loaded_once, should_load, StalenessPolicy};
