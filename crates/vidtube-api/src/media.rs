use anyhow::{Result, anyhow};
use reqwest::Url;
use tracing::{debug, warn};

use vidtube_types::models::MediaAsset;

/// Client for the external media storage service.
///
/// Uploads happen before any API call reaches us; the only thing this side
/// ever does is release stored objects by public id once their owning
/// record is gone.
#[derive(Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    base_url: Option<Url>,
    api_key: Option<String>,
}

impl MediaClient {
    pub fn new(base_url: Option<&str>, api_key: Option<String>) -> Result<Self> {
        let base_url = base_url.map(Url::parse).transpose()?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        })
    }

    /// A client with no backing service. Deletions are skipped.
    pub fn disabled() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: None,
            api_key: None,
        }
    }

    /// `DELETE {base}/assets/{publicId}`.
    pub async fn delete(&self, asset: &MediaAsset) -> Result<()> {
        let Some(url) = self.asset_url(&asset.public_id)? else {
            warn!("Media service not configured, leaving {} in storage", asset.public_id);
            return Ok(());
        };

        let mut req = self.http.delete(url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(anyhow!("media delete for {} failed: {}", asset.public_id, status));
        }
        debug!("Released media object {}", asset.public_id);
        Ok(())
    }

    /// Best-effort release of several objects. The owning row is already gone,
    /// so failures are logged rather than surfaced.
    pub async fn release(&self, assets: &[MediaAsset]) {
        for asset in assets {
            if let Err(e) = self.delete(asset).await {
                warn!("Failed to release media object {}: {}", asset.public_id, e);
            }
        }
    }

    fn asset_url(&self, public_id: &str) -> Result<Option<Url>> {
        let Some(base) = &self.base_url else {
            return Ok(None);
        };
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("media base url cannot be a base"))?
            .pop_if_empty()
            .push("assets")
            .push(public_id);
        Ok(Some(url))
    }
}
