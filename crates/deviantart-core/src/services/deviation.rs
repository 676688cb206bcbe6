use crate::client::{ClientResult, DeviantArtClient};
use crate::models::Deviation;

#[derive(Clone)]
pub struct DeviationService {
    client: DeviantArtClient,
}

impl DeviationService {
    pub fn new(client: DeviantArtClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, deviation_id: &str) -> ClientResult<Deviation> {
        let url = self.client.endpoint(&["deviation", deviation_id])?;
        self.client.get_url(url, &()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use crate::client::ClientError;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn get_fetches_single_deviation() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/oauth2/deviation/d-77");
            then.status(200).json_body_obj(&serde_json::json!({
                "deviationid": "d-77",
                "title": "Harbour",
                "is_mature": false,
                "preview": { "src": "https://img/p.jpg", "height": 300, "width": 400, "transparency": false },
                "content": { "src": "https://img/c.jpg", "height": 1200, "width": 1600, "transparency": false, "filesize": 52000 }
            }));
        });

        let deviation = test_client(&server).deviation().get("d-77").await.unwrap();
        mock.assert();
        assert_eq!(deviation.title.as_deref(), Some("Harbour"));
        assert_eq!(deviation.content.unwrap().filesize, Some(52000));
    }

    #[tokio::test]
    async fn missing_deviation_is_an_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/oauth2/deviation/gone");
            then.status(400).json_body_obj(&serde_json::json!({
                "error": "invalid_request",
                "error_description": "Deviation not found.",
                "status": "error"
            }));
        });

        let err = test_client(&server).deviation().get("gone").await.unwrap_err();
        assert!(matches!(err, ClientError::Api(ref api) if api.error_description == "Deviation not found."));
    }
}
