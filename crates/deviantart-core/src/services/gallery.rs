use serde::{Deserialize, Serialize};

use crate::client::{ClientResult, DeviantArtClient};
use crate::models::Deviation;
use crate::pagination::{OffsetParams, OffsetResponse};

/// Endpoints under `gallery/`.
#[derive(Clone)]
pub struct GalleryService {
    client: DeviantArtClient,
}

/// A page of gallery deviations, plus the folder name when one was queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderContent {
    #[serde(flatten)]
    pub page: OffsetResponse<Deviation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryMode {
    Newest,
    Popular,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GalleryParams {
    /// Defaults to the token's user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<GalleryMode>,
    #[serde(flatten)]
    pub page: OffsetParams,
}

impl GalleryService {
    pub fn new(client: DeviantArtClient) -> Self {
        Self { client }
    }

    /// Every deviation in the user's gallery.
    pub async fn all(&self, params: &GalleryParams) -> ClientResult<FolderContent> {
        self.client.get("gallery/all", params).await
    }

    pub async fn folder(&self, folder_id: &str, params: &GalleryParams) -> ClientResult<FolderContent> {
        let url = self.client.endpoint(&["gallery", folder_id])?;
        self.client.get_url(url, params).await
    }
}
