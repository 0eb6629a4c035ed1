//! Domain slices built on the caching layer.
//!
//! Each slice owns a part of [`AppState`], the actions that change it, and the `use_*`
//! functions call sites load through. [`AppReducer`] routes every action to its slice.

pub mod campaigns;
pub mod events;
pub mod organizations;

use crate::caching::RemoteObjectLoader;
use crate::clients::SharedApiClient;
use crate::framework::{FrameworkError, Reducer, StoreClient};
use crate::lifecycle::Session;

pub use campaigns::{
    delete_campaign, update_campaign, use_campaign, use_campaigns, Campaign, CampaignAction,
    CampaignHandle, CampaignPatch, CampaignsState,
};
pub use events::{use_event, Event, EventAction, EventsState};
pub use organizations::{use_organization, Organization, OrganizationAction, OrganizationsState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub organizations: OrganizationsState,
    pub campaigns: CampaignsState,
    pub events: EventsState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Organization(OrganizationAction),
    Campaign(CampaignAction),
    Event(EventAction),
}

pub struct AppReducer;

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;

    fn reduce(mut state: AppState, action: AppAction) -> AppState {
        match action {
            AppAction::Organization(action) => {
                state.organizations = organizations::reduce(state.organizations, action);
            }
            AppAction::Campaign(action) => {
                state.campaigns = campaigns::reduce(state.campaigns, action);
            }
            AppAction::Event(action) => {
                state.events = events::reduce(state.events, action);
            }
        }
        state
    }
}

/// Everything a feature call site needs: the session's loader and store, and the API.
#[derive(Clone)]
pub struct AppContext {
    loader: RemoteObjectLoader<AppReducer>,
    store: StoreClient<AppReducer>,
    api: SharedApiClient,
}

impl AppContext {
    pub fn new(session: &Session<AppReducer>, api: SharedApiClient) -> Self {
        Self {
            loader: session.loader(),
            store: session.store().clone(),
            api,
        }
    }

    pub fn loader(&self) -> RemoteObjectLoader<AppReducer> {
        self.loader.clone()
    }

    pub fn store(&self) -> &StoreClient<AppReducer> {
        &self.store
    }

    pub fn api(&self) -> SharedApiClient {
        self.api.clone()
    }

    pub fn dispatch(&self, action: impl Into<AppAction>) -> Result<(), FrameworkError> {
        self.store.dispatch(action.into())
    }

    /// Store state after everything dispatched so far.
    pub async fn state(&self) -> Result<AppState, FrameworkError> {
        self.store.state().await
    }
}
