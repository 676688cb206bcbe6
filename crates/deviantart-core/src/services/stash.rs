use serde::Serialize;

use crate::client::{ClientResult, DeviantArtClient};
use crate::models::{StashMetadata, SuccessResponse};
use crate::pagination::{is_false, OffsetResponse};

/// Stack id that lists the root of a user's Sta.sh.
pub const ROOT_STACK_ID: i64 = 0;

pub type StackContents = OffsetResponse<StashMetadata>;

/// Sta.sh endpoints. All of them require an authorization code token with the
/// `stash` scope.
#[derive(Clone)]
pub struct StashService {
    client: DeviantArtClient,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StackContentsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "ext_submission", skip_serializing_if = "is_false")]
    pub include_submission: bool,
    #[serde(rename = "ext_camera", skip_serializing_if = "is_false")]
    pub include_camera: bool,
    #[serde(rename = "ext_stats", skip_serializing_if = "is_false")]
    pub include_stats: bool,
}

impl StashService {
    pub fn new(client: DeviantArtClient) -> Self {
        Self { client }
    }

    pub async fn stack_metadata(&self, stack_id: i64) -> ClientResult<StashMetadata> {
        self.client.get(&format!("stash/{stack_id}"), &()).await
    }

    pub async fn stack_contents(
        &self,
        stack_id: i64,
        params: &StackContentsParams,
    ) -> ClientResult<StackContents> {
        self.client
            .get(&format!("stash/{stack_id}/contents"), params)
            .await
    }

    /// Delete a previously submitted item. Returns whether the API confirmed it.
    pub async fn delete(&self, item_id: i64) -> ClientResult<bool> {
        #[derive(Serialize)]
        struct Form {
            itemid: i64,
        }

        let response: SuccessResponse = self
            .client
            .post_form("stash/delete", &Form { itemid: item_id })
            .await?;
        Ok(response.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn stack_metadata_by_id() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/oauth2/stash/123");
            then.status(200).json_body_obj(&serde_json::json!({
                "title": "Sketches",
                "size": 4,
                "stackid": 123,
                "tags": ["wip"]
            }));
        });

        let metadata = test_client(&server).stash().stack_metadata(123).await.unwrap();
        assert_eq!(metadata.title, "Sketches");
        assert_eq!(metadata.stackid, Some(123));
        assert_eq!(metadata.tags, vec!["wip"]);
    }

    #[tokio::test]
    async fn root_contents_with_extensions() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/oauth2/stash/0/contents")
                .query_param("limit", "10")
                .query_param("ext_stats", "true");
            then.status(200).json_body_obj(&serde_json::json!({
                "results": [{ "title": "a", "itemid": 9 }],
                "has_more": false
            }));
        });

        let params = StackContentsParams {
            limit: Some(10),
            include_stats: true,
            ..StackContentsParams::default()
        };
        let contents = test_client(&server)
            .stash()
            .stack_contents(ROOT_STACK_ID, &params)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(contents.results[0].itemid, Some(9));
    }

    #[tokio::test]
    async fn delete_posts_item_id_form() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/oauth2/stash/delete")
                .header("content-type", "application/x-www-form-urlencoded")
                .body("itemid=5150");
            then.status(200)
                .json_body_obj(&serde_json::json!({ "success": true }));
        });

        assert!(test_client(&server).stash().delete(5150).await.unwrap());
        mock.assert();
    }
}
