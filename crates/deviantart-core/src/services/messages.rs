use serde::de::IgnoredAny;
use serde::Serialize;

use crate::client::{ClientResult, DeviantArtClient};
use crate::models::Message;
use crate::pagination::CursorResponse;

/// Message center endpoints. Require an authorization code token with the
/// `message` scope.
#[derive(Clone)]
pub struct MessagesService {
    client: DeviantArtClient,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessagesFeedParams {
    /// Defaults to the inbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folderid: Option<String>,
    /// Group similar messages (the API default) or list them flat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Identifies what to delete: a single message or a whole stack.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteMessageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folderid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messageid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stackid: Option<String>,
}

impl MessagesService {
    pub fn new(client: DeviantArtClient) -> Self {
        Self { client }
    }

    pub async fn feed(&self, params: &MessagesFeedParams) -> ClientResult<CursorResponse<Message>> {
        self.client.get("messages/feed", params).await
    }

    pub async fn delete(&self, params: &DeleteMessageParams) -> ClientResult<()> {
        let _: IgnoredAny = self.client.post_form("messages/delete", params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn feed_follows_cursor() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/oauth2/messages/feed")
                .query_param("stack", "false")
                .query_param("cursor", "m-1");
            then.status(200).json_body_obj(&serde_json::json!({
                "results": [{
                    "messageid": "m-2",
                    "type": "fave",
                    "orphaned": false,
                    "is_new": true,
                    "originator": { "username": "fan" }
                }],
                "has_more": true,
                "next_cursor": "m-3"
            }));
        });

        let params = MessagesFeedParams {
            stack: Some(false),
            cursor: Some("m-1".into()),
            ..MessagesFeedParams::default()
        };
        let feed = test_client(&server).messages().feed(&params).await.unwrap();

        mock.assert();
        let message = &feed.results[0];
        assert_eq!(message.kind, "fave");
        assert!(message.is_new);
        assert_eq!(message.originator.as_ref().unwrap().username, "fan");
        assert_eq!(feed.next_cursor.as_deref(), Some("m-3"));
    }

    #[tokio::test]
    async fn delete_accepts_empty_acknowledgement() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/oauth2/messages/delete")
                .body("messageid=m-2");
            then.status(200);
        });

        let params = DeleteMessageParams {
            messageid: Some("m-2".into()),
            ..DeleteMessageParams::default()
        };
        test_client(&server).messages().delete(&params).await.unwrap();
        mock.assert();
    }
}
