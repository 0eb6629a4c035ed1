//! # Remote Cache
//!
//! > **Load remote data once, render it many times.**
//!
//! This crate coordinates loading backend data into a client-side store. Call sites
//! describe the data they want as a [`RemoteItem`](model::RemoteItem) or
//! [`RemoteList`](model::RemoteList) taken from the store, plus a loader and the actions
//! to dispatch around it. The crate decides whether a fetch is needed, makes sure at most
//! one fetch per cache key is ever in flight, and reports progress as a uniform
//! [`FutureView`](caching::FutureView) of `{data, error, is_loading}`.
//!
//! ## Core Concepts
//!
//! ### Resources and the cache
//! A [`Resource`](framework::Resource) is one deduplicated fetch. The
//! [`ResourceCache`](framework::ResourceCache) actor owns every resource of a session,
//! keyed by [`CacheKey`](framework::CacheKey). Reads never block: they return a
//! [`Readiness`](framework::Readiness) of not-ready (with a suspension to await), ready,
//! or failed.
//!
//! ### The store
//! The [`Store`](framework::Store) actor holds application state and applies actions
//! through a pure [`Reducer`](framework::Reducer), in dispatch order. It is the single
//! source of truth for loaded data. The cache only coordinates fetches.
//!
//! ### Staleness
//! [`StalenessPolicy`](caching::StalenessPolicy) decides when to load: never-loaded and
//! stale data loads, deleted and in-flight data does not, and loaded data may expire after
//! a maximum age.
//!
//! ## Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! Resources, the cache and store actors, errors, and test mocks.
//!
//! ### 2. The Data Model ([`model`])
//! `RemoteItem`, `RemoteList` and the `RemoteObject` trait the policy reads.
//!
//! ### 3. Load Coordination ([`caching`])
//! [`LoadHooks`](caching::LoadHooks), the
//! [`RemoteObjectLoader`](caching::RemoteObjectLoader) and the
//! [`LoadIfNecessary`](caching::LoadIfNecessary) entry point.
//!
//! ### 4. The Loader Boundary ([`clients`])
//! The [`ApiClient`](clients::ApiClient) trait and its reqwest implementation.
//!
//! ### 5. Features ([`features`])
//! Organizations, campaigns and events, built the way an application would use the crate.
//!
//! ### 6. The Orchestrator ([`lifecycle`])
//! [`Session`](lifecycle::Session) starts and stops the actors;
//! [`Config`](lifecycle::Config) and tracing setup live here too.
//!
//! ## Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod caching;
pub mod clients;
pub mod features;
pub mod framework;
pub mod lifecycle;
pub mod model;
