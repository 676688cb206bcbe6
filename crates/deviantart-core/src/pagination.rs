//! Offset- and cursor-based paging used by list endpoints.

use serde::{Deserialize, Serialize};

use crate::models::Session;

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

/// Query parameters for offset-paged endpoints. Unset fields are left out of
/// the query string so the API applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OffsetParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "is_false")]
    pub with_session: bool,
}

impl OffsetParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_session(mut self, with_session: bool) -> Self {
        self.with_session = with_session;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u32>,
    /// Only present on searches (`q=`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

impl<T> OffsetResponse<T> {
    /// Parameters for the following page, keeping the caller's limit, or
    /// `None` once the listing is exhausted.
    pub fn next_page(&self, current: &OffsetParams) -> Option<OffsetParams> {
        if !self.has_more {
            return None;
        }
        self.next_offset.map(|offset| OffsetParams {
            offset: Some(offset),
            ..current.clone()
        })
    }
}

/// Query parameters for cursor-paged endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CursorParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub with_session: bool,
}

impl CursorParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn with_session(mut self, with_session: bool) -> Self {
        self.with_session = with_session;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

impl<T> CursorResponse<T> {
    pub fn next_page(&self, current: &CursorParams) -> Option<CursorParams> {
        if !self.has_more {
            return None;
        }
        self.next_cursor
            .as_ref()
            .filter(|cursor| !cursor.is_empty())
            .map(|cursor| CursorParams {
                cursor: Some(cursor.clone()),
                ..current.clone()
            })
    }
}
