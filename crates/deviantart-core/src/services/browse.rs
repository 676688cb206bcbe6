use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::client::{ClientResult, DeviantArtClient};
use crate::models::{Deviation, Topic};
use crate::pagination::{CursorParams, CursorResponse, OffsetParams, OffsetResponse};

/// Endpoints under `browse/`. All of them accept client credentials tokens.
#[derive(Clone)]
pub struct BrowseService {
    client: DeviantArtClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeRange {
    #[serde(rename = "now")]
    Now,
    #[serde(rename = "1week")]
    Week,
    #[serde(rename = "1month")]
    Month,
    #[serde(rename = "alltime")]
    AllTime,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PopularParams {
    /// Search term; the response then carries `estimated_total`.
    #[serde(rename = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(rename = "timerange", skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<&'a str>,
    #[serde(flatten)]
    page: &'a OffsetParams,
}

impl BrowseService {
    pub fn new(client: DeviantArtClient) -> Self {
        Self { client }
    }

    pub async fn newest(
        &self,
        query: Option<&str>,
        page: &OffsetParams,
    ) -> ClientResult<OffsetResponse<Deviation>> {
        self.client
            .get("browse/newest", &SearchQuery { q: query, page })
            .await
    }

    pub async fn popular(
        &self,
        params: &PopularParams,
        page: &OffsetParams,
    ) -> ClientResult<OffsetResponse<Deviation>> {
        #[derive(Serialize)]
        struct Query<'a> {
            #[serde(flatten)]
            params: &'a PopularParams,
            #[serde(flatten)]
            page: &'a OffsetParams,
        }

        self.client
            .get("browse/popular", &Query { params, page })
            .await
    }

    /// Deviations carrying `tag`.
    pub async fn tags(
        &self,
        tag: &str,
        page: &CursorParams,
    ) -> ClientResult<CursorResponse<Deviation>> {
        #[derive(Serialize)]
        struct Query<'a> {
            tag: &'a str,
            #[serde(flatten)]
            page: &'a CursorParams,
        }

        self.client.get("browse/tags", &Query { tag, page }).await
    }

    /// Autocomplete tag names starting with `prefix`.
    pub async fn tag_search(&self, prefix: &str) -> ClientResult<Vec<String>> {
        #[derive(Serialize, Deserialize)]
        struct TagName {
            tag_name: String,
        }

        #[derive(Deserialize)]
        struct Results {
            #[serde(default)]
            results: Vec<TagName>,
        }

        let query = TagName {
            tag_name: prefix.to_owned(),
        };
        let response: Results = self.client.get("browse/tags/search", &query).await?;
        Ok(response.results.into_iter().map(|tag| tag.tag_name).collect())
    }

    /// Daily deviations for `date`, or today's when `None`.
    pub async fn daily_deviations(
        &self,
        date: Option<NaiveDate>,
    ) -> ClientResult<OffsetResponse<Deviation>> {
        #[derive(Serialize)]
        struct Query {
            #[serde(skip_serializing_if = "Option::is_none")]
            date: Option<NaiveDate>,
        }

        self.client
            .get("browse/dailydeviations", &Query { date })
            .await
    }

    pub async fn topics(&self, page: &CursorParams) -> ClientResult<CursorResponse<Topic>> {
        self.client.get("browse/topics", page).await
    }
}
