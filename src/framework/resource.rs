//! # Resource
//!
//! A [`Resource`] is one deduplicated asynchronous fetch. It does not run anything by
//! itself: [`Resource::fetch`] hands out the future to run (or `None` when a fetch is
//! already outstanding), and whoever runs it reports back through [`Resource::settle`].
//! The [`ResourceCache`](crate::framework::ResourceCache) actor is that runner.
//!
//! ## Status
//!
//! ```text
//! Initial ──fetch(false)──→ Pending ─────────┐
//!    │                                       ├──settle──→ Success | Error ──fetch──→ ...
//!    └────fetch(true)───→ PendingSuspend ────┘
//! ```
//!
//! [`Resource::read`] never blocks. A suspending fetch reads as
//! [`Readiness::NotReady`] carrying a [`Suspension`] the caller may await.

use crate::framework::error::{FrameworkError, LoadError};
use futures::future::BoxFuture;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::watch;

/// A fetched payload with its type erased, so one cache can hold every payload type.
pub type ErasedValue = Arc<dyn Any + Send + Sync>;

/// What a fetch settles with. `Ok(None)` is a fetch whose failure was handled upstream.
pub type FetchOutcome = Result<Option<ErasedValue>, LoadError>;

/// A fetch that has been started but not yet driven to completion.
pub type PendingFetch = BoxFuture<'static, FetchOutcome>;

/// Starts a fetch. Called once per [`Resource::fetch`] that is not deduplicated.
pub type FetchFn = Box<dyn Fn() -> PendingFetch + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    Initial,
    Pending,
    PendingSuspend,
    Success,
    Error,
}

impl ResourceStatus {
    pub fn is_pending(self) -> bool {
        matches!(self, ResourceStatus::Pending | ResourceStatus::PendingSuspend)
    }
}

/// Result of a non-blocking read.
#[derive(Debug)]
pub enum Readiness<T> {
    /// A suspending fetch is in flight. Await the suspension, then read again.
    NotReady(Suspension),
    /// The latest settled value. `None` when nothing has resolved yet.
    Ready(Option<T>),
    /// The latest fetch failed.
    Failed(LoadError),
}

impl Readiness<ErasedValue> {
    /// Recovers the concrete payload type.
    pub fn downcast<T>(self, key: &impl std::fmt::Display) -> Result<Readiness<T>, FrameworkError>
    where
        T: Clone + 'static,
    {
        match self {
            Readiness::NotReady(s) => Ok(Readiness::NotReady(s)),
            Readiness::Failed(e) => Ok(Readiness::Failed(e)),
            Readiness::Ready(None) => Ok(Readiness::Ready(None)),
            Readiness::Ready(Some(value)) => value
                .downcast_ref::<T>()
                .cloned()
                .map(|v| Readiness::Ready(Some(v)))
                .ok_or_else(|| FrameworkError::TypeMismatch {
                    key: key.to_string(),
                    expected: std::any::type_name::<T>(),
                }),
        }
    }
}

/// Handle on a suspending fetch.
#[derive(Debug)]
pub struct Suspension {
    settled: watch::Receiver<u64>,
}

impl Suspension {
    /// Waits until the fetch this suspension was taken from settles.
    pub async fn wait(mut self) -> Result<(), FrameworkError> {
        self.settled
            .changed()
            .await
            .map_err(|_| FrameworkError::ActorClosed)
    }
}

pub struct Resource {
    fetch_fn: FetchFn,
    status: ResourceStatus,
    result: Option<ErasedValue>,
    error: Option<LoadError>,
    // Bumped on every settle; suspensions wait for the next bump.
    settled: watch::Sender<u64>,
}

impl Resource {
    pub fn new(fetch_fn: FetchFn) -> Self {
        let (settled, _) = watch::channel(0);
        Self {
            fetch_fn,
            status: ResourceStatus::Initial,
            result: None,
            error: None,
            settled,
        }
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    /// Starts a fetch unless one is already outstanding.
    ///
    /// Returns the future that must be driven to completion and fed to [`Resource::settle`],
    /// or `None` when this call was deduplicated.
    pub fn fetch(&mut self, suspend: bool) -> Option<PendingFetch> {
        if self.status.is_pending() {
            return None;
        }
        let pending = (self.fetch_fn)();
        self.status = if suspend {
            ResourceStatus::PendingSuspend
        } else {
            ResourceStatus::Pending
        };
        Some(pending)
    }

    /// Records the outcome of the outstanding fetch and wakes every suspension.
    pub fn settle(&mut self, outcome: FetchOutcome) {
        match outcome {
            Ok(value) => {
                self.status = ResourceStatus::Success;
                self.result = value;
                self.error = None;
            }
            Err(e) => {
                self.status = ResourceStatus::Error;
                self.error = Some(e);
            }
        }
        self.settled.send_modify(|generation| *generation += 1);
    }

    pub fn read(&self) -> Readiness<ErasedValue> {
        match self.status {
            ResourceStatus::PendingSuspend => Readiness::NotReady(Suspension {
                settled: self.settled.subscribe(),
            }),
            ResourceStatus::Error => match &self.error {
                Some(e) => Readiness::Failed(e.clone()),
                None => Readiness::Ready(self.result.clone()),
            },
            _ => Readiness::Ready(self.result.clone()),
        }
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("status", &self.status)
            .field("has_result", &self.result.is_some())
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_resource(outcome: FetchOutcome) -> (Resource, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resource = Resource::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let outcome = outcome.clone();
            async move { outcome }.boxed()
        }));
        (resource, calls)
    }

    fn value(n: u32) -> ErasedValue {
        Arc::new(n)
    }

    #[test]
    fn first_suspending_fetch_moves_to_pending_suspend() {
        let (mut resource, calls) = counting_resource(Ok(Some(value(1))));
        assert_eq!(resource.status(), ResourceStatus::Initial);

        assert!(resource.fetch(true).is_some());
        assert_eq!(resource.status(), ResourceStatus::PendingSuspend);
        assert!(matches!(resource.read(), Readiness::NotReady(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fetch_while_pending_is_a_no_op() {
        let (mut resource, calls) = counting_resource(Ok(Some(value(1))));

        assert!(resource.fetch(false).is_some());
        assert!(resource.fetch(true).is_none());
        assert!(resource.fetch(false).is_none());
        assert_eq!(resource.status(), ResourceStatus::Pending);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_suspending_fetch_reads_previous_result() {
        let (mut resource, _) = counting_resource(Ok(Some(value(2))));
        resource.fetch(true);
        resource.settle(Ok(Some(value(1))));

        resource.fetch(false);
        let read = resource.read().downcast::<u32>(&"k").unwrap();
        assert!(matches!(read, Readiness::Ready(Some(1))));
    }

    #[test]
    fn settled_value_is_read_repeatedly_without_refetching() {
        let (mut resource, calls) = counting_resource(Ok(Some(value(5))));
        resource.fetch(true);
        resource.settle(Ok(Some(value(5))));

        for _ in 0..2 {
            let read = resource.read().downcast::<u32>(&"k").unwrap();
            assert!(matches!(read, Readiness::Ready(Some(5))));
        }
        assert_eq!(resource.status(), ResourceStatus::Success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn error_is_surfaced_on_read_and_cleared_by_success() {
        let (mut resource, _) = counting_resource(Ok(None));
        resource.fetch(true);
        resource.settle(Err(LoadError::from("boom")));
        assert_eq!(resource.status(), ResourceStatus::Error);
        assert!(matches!(resource.read(), Readiness::Failed(LoadError::Backend(ref m)) if m == "boom"));

        assert!(resource.fetch(false).is_some());
        resource.settle(Ok(None));
        assert!(matches!(resource.read(), Readiness::Ready(None)));
    }

    #[test]
    fn downcast_to_wrong_type_is_reported() {
        let (mut resource, _) = counting_resource(Ok(None));
        resource.fetch(false);
        resource.settle(Ok(Some(value(1))));

        let err = resource.read().downcast::<String>(&"counts").unwrap_err();
        assert!(matches!(err, FrameworkError::TypeMismatch { ref key, .. } if key == "counts"));
    }

    #[tokio::test]
    async fn suspension_wakes_on_settle() {
        let (mut resource, _) = counting_resource(Ok(Some(value(9))));
        let pending = resource.fetch(true).unwrap();

        let suspension = match resource.read() {
            Readiness::NotReady(s) => s,
            other => panic!("expected suspension, got {:?}", other),
        };

        let outcome = pending.await;
        resource.settle(outcome);
        suspension.wait().await.unwrap();

        let read = resource.read().downcast::<u32>(&"k").unwrap();
        assert!(matches!(read, Readiness::Ready(Some(9))));
    }
}
