//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle**: cache and store startup and shutdown, at `info`
//! - **Cache Traffic**: resource creation, fetch start/dedup/settle with a `cache_key`
//!   field, at `debug`
//! - **Store Traffic**: every dispatched action, at `debug`
//! - **Failures**: failed fetches and dropped lifecycle actions, at `warn`
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=remote_cache::framework=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug` a first load of a campaign list reads roughly:
//!
//! ```text
//! DEBUG load_with{cache_key=campaigns(1) necessary=true}: Resource created cache_key=campaigns(1) size=1
//! DEBUG load_with{cache_key=campaigns(1) necessary=true}: Fetch started cache_key=campaigns(1) suspend=true
//! DEBUG Dispatch reducer="AppReducer" action=Campaign(CampaignsLoad)
//! DEBUG Dispatch reducer="AppReducer" action=Campaign(CampaignsLoaded([..]))
//! DEBUG Fetch settled cache_key=campaigns(1)
//! ```
//!
//! Spans from `#[instrument]` on the loaders and the HTTP client show inline, so each
//! line carries the cache key it belongs to.

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
