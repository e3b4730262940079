use uuid::Uuid;

use vidtube_types::models::MediaAsset;

use crate::error::ApiError;

/// Trimmed value of a required text field; empty or whitespace-only is rejected.
pub fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Like `required`, but an absent field is fine.
pub fn optional(field: &str, value: Option<&str>) -> Result<Option<String>, ApiError> {
    value.map(|v| required(field, v)).transpose()
}

pub fn media_asset(field: &str, asset: &MediaAsset) -> Result<MediaAsset, ApiError> {
    Ok(MediaAsset {
        public_id: required(&format!("{}.publicId", field), &asset.public_id)?,
        url: required(&format!("{}.url", field), &asset.url)?,
    })
}

pub fn parse_id(what: &str, raw: &str) -> Result<Uuid, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::Validation(format!("Invalid {} id", what)))
}
