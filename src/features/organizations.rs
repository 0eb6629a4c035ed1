//! The organization a session works in.

use crate::caching::{LoadHooks, LoadIfNecessary};
use crate::clients::{get_json, SharedApiClient};
use crate::features::{AppAction, AppContext, AppReducer};
use crate::framework::{CacheKey, FrameworkError, LoadError};
use crate::model::{Identified, ItemId, RemoteItem};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_open: bool,
}

impl Identified for Organization {
    fn id(&self) -> ItemId {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationsState {
    pub org_data: RemoteItem<Organization>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrganizationAction {
    Load(ItemId),
    Loaded(Organization),
    LoadFailed(LoadError),
}

impl From<OrganizationAction> for AppAction {
    fn from(action: OrganizationAction) -> Self {
        AppAction::Organization(action)
    }
}

pub fn reduce(mut state: OrganizationsState, action: OrganizationAction) -> OrganizationsState {
    match action {
        OrganizationAction::Load(id) => {
            if state.org_data.id != id {
                state.org_data = RemoteItem::new(id);
            }
            state.org_data.begin_load();
        }
        OrganizationAction::Loaded(org) => {
            state.org_data.id = org.id;
            state.org_data.finish_load(org, Utc::now());
        }
        OrganizationAction::LoadFailed(e) => state.org_data.fail(e),
    }
    state
}

pub fn organization_hooks(api: SharedApiClient, org_id: ItemId) -> LoadHooks<Organization, AppAction> {
    LoadHooks::new(
        move || {
            let api = api.clone();
            async move { get_json::<Organization>(&*api, &format!("/api/orgs/{org_id}")).await }
        },
        move || OrganizationAction::Load(org_id).into(),
        |org| OrganizationAction::Loaded(org).into(),
    )
    .on_error(|e| OrganizationAction::LoadFailed(e.clone()).into())
    .cache_key(CacheKey::new("organization").with_param(org_id))
}

pub type OrganizationFuture = LoadIfNecessary<RemoteItem<Organization>, AppReducer>;

/// Loads the organization unless the store already holds it.
///
/// The store keeps one organization. If it holds a different one, this one is loaded in
/// its place.
pub async fn use_organization(ctx: &AppContext, org_id: ItemId) -> Result<OrganizationFuture, FrameworkError> {
    let future = LoadIfNecessary::new(ctx.loader(), organization_hooks(ctx.api(), org_id));
    let state = ctx.state().await?;
    let org_data = &state.organizations.org_data;
    let descriptor = if org_data.id == org_id {
        org_data.clone()
    } else {
        RemoteItem::new(org_id)
    };
    future.run(Some(&descriptor)).await?;
    Ok(future)
}
