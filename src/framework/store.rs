//! # Store Actor
//!
//! A Redux-style store: one piece of state, changed only by a pure [`Reducer`] applied to
//! dispatched actions, in the order they were dispatched.
//!
//! ```text
//! Dispatcher ──Action──→ Store (reduce) ──State──→ watch subscribers
//! ```
//!
//! [`Dispatcher::dispatch`] is synchronous and never waits: it pushes onto an unbounded
//! FIFO channel. A loader can therefore dispatch its on-load action and be certain it is
//! ordered before anything the same loader dispatches later.

use crate::framework::error::FrameworkError;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

/// Pure state transition: `(State, Action) -> State`.
pub trait Reducer: Send + 'static {
    type State: Clone + Default + PartialEq + Send + Sync + 'static;
    type Action: Debug + Send + 'static;

    fn reduce(state: Self::State, action: Self::Action) -> Self::State;
}

pub enum StoreRequest<R: Reducer> {
    Dispatch(R::Action),
    GetState(oneshot::Sender<R::State>),
}

pub struct Store<R: Reducer> {
    receiver: mpsc::UnboundedReceiver<StoreRequest<R>>,
    state: R::State,
    published: watch::Sender<R::State>,
}

impl<R: Reducer> Store<R> {
    pub fn new(initial: R::State) -> (Self, StoreClient<R>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (published, observed) = watch::channel(initial.clone());
        let store = Self {
            receiver,
            state: initial,
            published,
        };
        let client = StoreClient {
            dispatcher: Dispatcher { sender },
            observed,
        };
        (store, client)
    }

    /// Applies actions until every dispatcher is dropped.
    pub async fn run(mut self) {
        let reducer = std::any::type_name::<R>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(reducer, "Store started");
        let mut applied: u64 = 0;

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Dispatch(action) => {
                    debug!(reducer, ?action, "Dispatch");
                    let previous = std::mem::take(&mut self.state);
                    self.state = R::reduce(previous, action);
                    applied += 1;
                    let next = &self.state;
                    self.published.send_if_modified(|current| {
                        if current == next {
                            false
                        } else {
                            *current = next.clone();
                            true
                        }
                    });
                }
                StoreRequest::GetState(respond_to) => {
                    let _ = respond_to.send(self.state.clone());
                }
            }
        }

        info!(reducer, applied, "Store shutdown");
    }
}

/// Sends actions to a [`Store`].
pub struct Dispatcher<R: Reducer> {
    sender: mpsc::UnboundedSender<StoreRequest<R>>,
}

impl<R: Reducer> Clone for Dispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<R: Reducer> Dispatcher<R> {
    pub fn dispatch(&self, action: R::Action) -> Result<(), FrameworkError> {
        self.sender
            .send(StoreRequest::Dispatch(action))
            .map_err(|_| FrameworkError::ActorClosed)
    }
}

/// Read side of a [`Store`], plus its dispatcher.
pub struct StoreClient<R: Reducer> {
    dispatcher: Dispatcher<R>,
    observed: watch::Receiver<R::State>,
}

impl<R: Reducer> Clone for StoreClient<R> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            observed: self.observed.clone(),
        }
    }
}

impl<R: Reducer> StoreClient<R> {
    pub fn dispatcher(&self) -> Dispatcher<R> {
        self.dispatcher.clone()
    }

    pub fn dispatch(&self, action: R::Action) -> Result<(), FrameworkError> {
        self.dispatcher.dispatch(action)
    }

    /// State after every action dispatched before this call has been applied.
    pub async fn state(&self) -> Result<R::State, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.dispatcher
            .sender
            .send(StoreRequest::GetState(respond_to))
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)
    }

    /// Latest published state, without waiting for queued actions.
    pub fn snapshot(&self) -> R::State {
        self.observed.borrow().clone()
    }

    /// Receiver that is notified whenever the state changes.
    pub fn subscribe(&self) -> watch::Receiver<R::State> {
        self.observed.clone()
    }
}
