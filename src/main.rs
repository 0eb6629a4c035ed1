//! # Remote Cache Demo
//!
//! Loads an organization and its campaigns from a live backend:
//!
//! ```bash
//! API_BASE_URL=http://localhost:3000 ORG_ID=1 RUST_LOG=info cargo run
//! ```
//!
//! Then loads the campaigns a second time to show that nothing is fetched again.

use remote_cache::clients::HttpApiClient;
use remote_cache::features::{use_campaigns, use_organization, AppContext, AppReducer, AppState};
use remote_cache::lifecycle::{setup_tracing, Config, Session};
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    dotenvy::dotenv().ok();
    setup_tracing();

    let config = Config::from_env().map_err(|e| e.to_string())?;
    let org_id: u64 = std::env::var("ORG_ID")
        .unwrap_or_else(|_| "1".to_string())
        .parse()
        .map_err(|_| "Invalid ORG_ID value".to_string())?;
    info!(api = %config.api_base_url, org_id, "Starting demo");

    let session = Session::<AppReducer>::start(&config, AppState::default()).map_err(|e| e.to_string())?;
    let ctx = AppContext::new(&session, Arc::new(HttpApiClient::new(config.api_base_url.clone())));

    let span = tracing::info_span!("organization");
    async {
        let org = use_organization(&ctx, org_id).await.map_err(|e| e.to_string())?;
        let view = org.settled().await;
        match (view.data, view.error) {
            (Some(org), _) => info!(title = %org.title, "Organization loaded"),
            (None, Some(e)) => error!(error = %e, "Organization failed to load"),
            (None, None) => info!("No organization"),
        }
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("campaigns");
    async {
        let campaigns = use_campaigns(&ctx, org_id).await.map_err(|e| e.to_string())?;
        let view = campaigns.settled().await;
        if let Some(e) = view.error {
            error!(error = %e, "Campaigns failed to load");
        }
        for campaign in view.data.unwrap_or_default() {
            info!(id = campaign.id, title = %campaign.title, color = %campaign.color, "Campaign");
        }

        let again = use_campaigns(&ctx, org_id).await.map_err(|e| e.to_string())?;
        let resources = ctx.loader().cache().len().await.map_err(|e| e.to_string())?;
        info!(
            loading = again.current().is_loading,
            resources,
            "Second pass served from the store"
        );
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    drop(ctx);
    session.shutdown().await.map_err(|e| e.to_string())?;

    info!("Demo completed successfully");
    Ok(())
}
