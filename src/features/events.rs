//! Events ("actions" in the backend API).

use crate::caching::{LoadHooks, LoadIfNecessary};
use crate::clients::{get_json, SharedApiClient};
use crate::features::{AppAction, AppContext, AppReducer};
use crate::framework::{CacheKey, FrameworkError, LoadError};
use crate::model::{Identified, ItemId, RemoteItem, RemoteList};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: ItemId,
    #[serde(default)]
    pub title: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub info_text: String,
    #[serde(default)]
    pub cancelled: Option<NaiveDateTime>,
}

impl Identified for Event {
    fn id(&self) -> ItemId {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventsState {
    pub event_list: RemoteList<Event>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventAction {
    Load(ItemId),
    Loaded(Event),
    LoadFailed(ItemId, LoadError),
    Deleted(ItemId),
}

impl From<EventAction> for AppAction {
    fn from(action: EventAction) -> Self {
        AppAction::Event(action)
    }
}

pub fn reduce(mut state: EventsState, action: EventAction) -> EventsState {
    let list = &mut state.event_list;
    match action {
        EventAction::Load(id) => list.find_or_add(id).begin_load(),
        EventAction::Loaded(event) => {
            list.upsert(event, Utc::now());
        }
        EventAction::LoadFailed(id, e) => list.find_or_add(id).fail(e),
        EventAction::Deleted(id) => list.find_or_add(id).mark_deleted(),
    }
    state
}

pub fn event_hooks(api: SharedApiClient, org_id: ItemId, id: ItemId) -> LoadHooks<Event, AppAction> {
    LoadHooks::new(
        move || {
            let api = api.clone();
            async move { get_json::<Event>(&*api, &format!("/api/orgs/{org_id}/actions/{id}")).await }
        },
        move || EventAction::Load(id).into(),
        |event| EventAction::Loaded(event).into(),
    )
    .on_error(move |e| EventAction::LoadFailed(id, e.clone()).into())
    .cache_key(CacheKey::new("event").with_param(org_id).with_param(id))
}

pub type EventFuture = LoadIfNecessary<RemoteItem<Event>, AppReducer>;

/// Loads an event unless the event list already holds it. A deleted event is neither
/// loaded nor shown.
pub async fn use_event(ctx: &AppContext, org_id: ItemId, id: ItemId) -> Result<EventFuture, FrameworkError> {
    let future = LoadIfNecessary::new(ctx.loader(), event_hooks(ctx.api(), org_id, id));
    let state = ctx.state().await?;
    let item = match state.events.event_list.get(id) {
        Some(item) if item.deleted => None,
        Some(item) => Some(item.clone()),
        None => Some(RemoteItem::new(id)),
    };
    future.run(item.as_ref()).await?;
    Ok(future)
}
