use serde::{Deserialize, Serialize};

use crate::client::{ClientResult, DeviantArtClient};
use crate::models::{Profile, Status, User};
use crate::pagination::is_false;

/// Endpoints under `user/`.
#[derive(Clone)]
pub struct UserService {
    client: DeviantArtClient,
}

/// Extra sections to include in a profile.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileParams {
    #[serde(rename = "ext_collections", skip_serializing_if = "is_false")]
    pub include_collections: bool,
    #[serde(rename = "ext_galleries", skip_serializing_if = "is_false")]
    pub include_galleries: bool,
}

impl UserService {
    pub fn new(client: DeviantArtClient) -> Self {
        Self { client }
    }

    /// The user the access token belongs to. Needs an authorization code token.
    pub async fn whoami(&self) -> ClientResult<User> {
        self.client.get("user/whoami", &()).await
    }

    /// Token for connecting to the dAmn chat servers.
    pub async fn damntoken(&self) -> ClientResult<String> {
        #[derive(Deserialize)]
        struct DamnToken {
            damntoken: String,
        }

        let response: DamnToken = self.client.get("user/damntoken", &()).await?;
        Ok(response.damntoken)
    }

    pub async fn profile(&self, username: &str, params: &ProfileParams) -> ClientResult<Profile> {
        let url = self.client.endpoint(&["user", "profile", username])?;
        self.client.get_url(url, params).await
    }

    pub async fn status(&self, status_id: &str) -> ClientResult<Status> {
        let url = self.client.endpoint(&["user", "statuses", status_id])?;
        self.client.get_url(url, &()).await
    }
}
