//! The loader boundary: how loaders reach the backend REST API.
//!
//! Loaders only ever see the [`ApiClient`] trait, so tests swap in
//! [`MockApiClient`](crate::framework::mock::MockApiClient) and the demo uses [`HttpApiClient`].

pub mod api_client;
pub mod http;

pub use api_client::*;
pub use http::*;
