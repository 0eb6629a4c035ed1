//! Campaigns of an organization: the list, single campaigns, and writes to them.

use crate::caching::{FutureView, LoadHooks, LoadIfNecessary};
use crate::clients::{get_json, patch_json, SharedApiClient};
use crate::features::{AppAction, AppContext, AppReducer};
use crate::framework::{CacheKey, FrameworkError, LoadError};
use crate::model::{Identified, ItemId, RemoteItem, RemoteList};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub info_text: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub visibility: Option<String>,
    /// Display color. Not sent by the backend; derived from the id on load.
    #[serde(default)]
    pub color: String,
}

impl Identified for Campaign {
    fn id(&self) -> ItemId {
        self.id
    }
}

impl Campaign {
    fn colored(mut self) -> Self {
        self.color = color_for(&self.id.to_string());
        self
    }
}

/// Stable pseudo-random `#rrggbb` color for `seed`.
pub fn color_for(seed: &str) -> String {
    // FNV-1a
    let hash = seed
        .bytes()
        .fold(0x811c_9dc5_u32, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193));
    format!("#{:06x}", hash & 0x00ff_ffff)
}

/// Partial update of a campaign. Only the fields that are set are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

impl CampaignPatch {
    /// Names of the attributes this patch writes.
    pub fn attributes(&self) -> Vec<String> {
        [
            ("title", self.title.is_some()),
            ("info_text", self.info_text.is_some()),
            ("published", self.published.is_some()),
            ("visibility", self.visibility.is_some()),
        ]
        .into_iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignsState {
    pub campaign_list: RemoteList<Campaign>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CampaignAction {
    Load(ItemId),
    Loaded(Campaign),
    LoadFailed(ItemId, LoadError),
    ListLoad,
    ListLoaded(Vec<Campaign>),
    ListLoadFailed(LoadError),
    Update(ItemId, Vec<String>),
    Updated(Campaign),
    UpdateFailed(ItemId),
    Deleted(ItemId),
}

impl From<CampaignAction> for AppAction {
    fn from(action: CampaignAction) -> Self {
        AppAction::Campaign(action)
    }
}

pub fn reduce(mut state: CampaignsState, action: CampaignAction) -> CampaignsState {
    let list = &mut state.campaign_list;
    match action {
        CampaignAction::Load(id) => list.find_or_add(id).begin_load(),
        CampaignAction::Loaded(campaign) => {
            list.upsert(campaign, Utc::now());
        }
        CampaignAction::LoadFailed(id, e) => list.find_or_add(id).fail(e),
        CampaignAction::ListLoad => list.begin_load(),
        CampaignAction::ListLoaded(campaigns) => list.replace_all(campaigns, Utc::now()),
        CampaignAction::ListLoadFailed(e) => list.fail(e),
        CampaignAction::Update(id, attributes) => list.find_or_add(id).begin_mutation(&attributes),
        CampaignAction::Updated(campaign) => {
            list.find_or_add(campaign.id).finish_mutation(campaign, Utc::now());
        }
        CampaignAction::UpdateFailed(id) => {
            if let Some(item) = list.get_mut(id) {
                item.mutating.clear();
            }
        }
        CampaignAction::Deleted(id) => list.find_or_add(id).mark_deleted(),
    }
    state
}

fn campaign_path(org_id: ItemId, camp_id: ItemId) -> String {
    format!("/api/orgs/{org_id}/campaigns/{camp_id}")
}

pub fn campaign_hooks(
    api: SharedApiClient,
    org_id: ItemId,
    camp_id: ItemId,
) -> LoadHooks<Campaign, AppAction> {
    LoadHooks::new(
        move || {
            let api = api.clone();
            async move {
                let campaign = get_json::<Campaign>(&*api, &campaign_path(org_id, camp_id)).await?;
                Ok::<_, LoadError>(campaign.colored())
            }
        },
        move || CampaignAction::Load(camp_id).into(),
        |campaign| CampaignAction::Loaded(campaign).into(),
    )
    .on_error(move |e| CampaignAction::LoadFailed(camp_id, e.clone()).into())
    .cache_key(CacheKey::new("campaign").with_param(org_id).with_param(camp_id))
}

pub fn campaigns_hooks(api: SharedApiClient, org_id: ItemId) -> LoadHooks<Vec<Campaign>, AppAction> {
    LoadHooks::new(
        move || {
            let api = api.clone();
            async move {
                let campaigns =
                    get_json::<Vec<Campaign>>(&*api, &format!("/api/orgs/{org_id}/campaigns")).await?;
                Ok::<_, LoadError>(campaigns.into_iter().map(Campaign::colored).collect())
            }
        },
        || CampaignAction::ListLoad.into(),
        |campaigns| CampaignAction::ListLoaded(campaigns).into(),
    )
    .on_error(|e| CampaignAction::ListLoadFailed(e.clone()).into())
    .cache_key(CacheKey::new("campaigns").with_param(org_id))
}

pub type CampaignFuture = LoadIfNecessary<RemoteItem<Campaign>, AppReducer>;
pub type CampaignsFuture = LoadIfNecessary<RemoteList<Campaign>, AppReducer>;

/// One campaign, with the writes that apply to it.
pub struct CampaignHandle {
    pub future: CampaignFuture,
    ctx: AppContext,
    org_id: ItemId,
    camp_id: ItemId,
}

impl CampaignHandle {
    pub fn view(&self) -> FutureView<Campaign> {
        self.future.current()
    }

    pub async fn update(&self, patch: CampaignPatch) -> Result<FutureView<Campaign>, FrameworkError> {
        update_campaign(&self.ctx, self.org_id, self.camp_id, patch).await
    }

    pub async fn delete(&self) -> Result<(), FrameworkError> {
        delete_campaign(&self.ctx, self.org_id, self.camp_id).await
    }
}

/// Loads a campaign unless the campaign list already holds it.
pub async fn use_campaign(ctx: &AppContext, org_id: ItemId, camp_id: ItemId) -> Result<CampaignHandle, FrameworkError> {
    let future = LoadIfNecessary::new(ctx.loader(), campaign_hooks(ctx.api(), org_id, camp_id));
    let state = ctx.state().await?;
    let item = state
        .campaigns
        .campaign_list
        .get(camp_id)
        .cloned()
        .unwrap_or_else(|| RemoteItem::new(camp_id));
    future.run(Some(&item)).await?;
    Ok(CampaignHandle {
        future,
        ctx: ctx.clone(),
        org_id,
        camp_id,
    })
}

/// Writes `patch`, marking its attributes as mutating until the backend answers.
///
/// A failed write clears the mutating marks and comes back as a failed view.
#[instrument(skip(ctx, patch))]
pub async fn update_campaign(
    ctx: &AppContext,
    org_id: ItemId,
    camp_id: ItemId,
    patch: CampaignPatch,
) -> Result<FutureView<Campaign>, FrameworkError> {
    ctx.dispatch(CampaignAction::Update(camp_id, patch.attributes()))?;

    let api = ctx.api();
    match patch_json::<_, Campaign>(&*api, &campaign_path(org_id, camp_id), &patch).await {
        Ok(campaign) => {
            let campaign = campaign.colored();
            ctx.dispatch(CampaignAction::Updated(campaign.clone()))?;
            info!("Campaign updated");
            Ok(FutureView::resolved(campaign))
        }
        Err(e) => {
            warn!(error = %e, "Campaign update failed");
            ctx.dispatch(CampaignAction::UpdateFailed(camp_id))?;
            Ok(FutureView::failed(e))
        }
    }
}

/// Deletes the campaign and leaves a tombstone, so it is never loaded again.
#[instrument(skip(ctx))]
pub async fn delete_campaign(ctx: &AppContext, org_id: ItemId, camp_id: ItemId) -> Result<(), FrameworkError> {
    ctx.api().delete(&campaign_path(org_id, camp_id)).await?;
    ctx.dispatch(CampaignAction::Deleted(camp_id))?;
    info!("Campaign deleted");
    Ok(())
}

/// Loads every campaign of the organization unless already loaded.
pub async fn use_campaigns(ctx: &AppContext, org_id: ItemId) -> Result<CampaignsFuture, FrameworkError> {
    let future = LoadIfNecessary::new(ctx.loader(), campaigns_hooks(ctx.api(), org_id));
    let state = ctx.state().await?;
    future.run(Some(&state.campaigns.campaign_list)).await?;
    Ok(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(id: ItemId, title: &str) -> Campaign {
        Campaign {
            id,
            title: title.to_string(),
            info_text: None,
            published: false,
            visibility: None,
            color: String::new(),
        }
    }

    #[test]
    fn patch_lists_only_set_attributes() {
        let patch = CampaignPatch {
            title: Some("Spring".into()),
            published: Some(true),
            ..CampaignPatch::default()
        };
        assert_eq!(patch.attributes(), vec!["title", "published"]);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"title": "Spring", "published": true})
        );
    }

    #[test]
    fn colors_are_stable_per_seed() {
        assert_eq!(color_for("7"), color_for("7"));
        assert_ne!(color_for("7"), color_for("8"));
        let color = color_for("7");
        assert_eq!(color.len(), 7);
        assert!(color.starts_with('#'));
    }

    #[test]
    fn update_cycle_tracks_mutating_attributes() {
        let state = reduce(
            CampaignsState::default(),
            CampaignAction::ListLoaded(vec![campaign(1, "Old")]),
        );
        let state = reduce(state, CampaignAction::Update(1, vec!["title".into()]));
        assert_eq!(state.campaign_list.get(1).unwrap().mutating, vec!["title"]);

        let state = reduce(state, CampaignAction::Updated(campaign(1, "New")));
        let item = state.campaign_list.get(1).unwrap();
        assert!(item.mutating.is_empty());
        assert_eq!(item.data.as_ref().map(|c| c.title.as_str()), Some("New"));
    }

    #[test]
    fn failed_update_clears_mutating() {
        let state = reduce(
            CampaignsState::default(),
            CampaignAction::Update(1, vec!["title".into()]),
        );
        let state = reduce(state, CampaignAction::UpdateFailed(1));
        assert!(state.campaign_list.get(1).unwrap().mutating.is_empty());
    }

    #[test]
    fn deleted_campaign_leaves_the_projection() {
        let state = reduce(
            CampaignsState::default(),
            CampaignAction::ListLoaded(vec![campaign(1, "A"), campaign(2, "B")]),
        );
        let state = reduce(state, CampaignAction::Deleted(1));
        assert_eq!(state.campaign_list.projection(), vec![campaign(2, "B")]);
        assert!(state.campaign_list.get(1).unwrap().deleted);
    }

    #[test]
    fn single_load_merges_into_the_list() {
        let state = reduce(CampaignsState::default(), CampaignAction::Load(3));
        assert!(state.campaign_list.get(3).unwrap().is_loading);
        let state = reduce(state, CampaignAction::Loaded(campaign(3, "C")));
        assert_eq!(state.campaign_list.len(), 1);
        assert!(state.campaign_list.get(3).unwrap().loaded.is_some());
    }
}
