//! Response payloads. Only the commonly used fields are modelled; anything
//! the API adds is ignored, and missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};

/// `{"status": "success"}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// `{"success": true}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub userid: String,
    pub username: String,
    pub usericon: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_watching: Option<bool>,
    pub is_subscribed: Option<bool>,
    pub details: Option<UserDetails>,
    pub geo: Option<UserGeo>,
    pub profile: Option<UserProfile>,
    pub stats: Option<UserStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDetails {
    pub sex: Option<String>,
    pub age: Option<u8>,
    pub joindate: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserGeo {
    pub country: String,
    pub countryid: u32,
    pub timezone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub user_is_artist: bool,
    pub artist_level: Option<String>,
    pub artist_specialty: Option<String>,
    pub real_name: String,
    pub tagline: String,
    pub website: String,
    pub cover_photo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub watchers: u32,
    pub friends: u32,
}

/// Per-user counters returned when `with_session` is requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub user: SessionUser,
    pub counts: SessionCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionUser {
    pub userid: String,
    pub username: String,
    pub usericon: String,
    pub symbol_class: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionCounts {
    pub feedback: u32,
    pub notes: u32,
}

/// An image rendition (preview, thumbnail, Sta.sh file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StashObject {
    pub src: String,
    pub height: u32,
    pub width: u32,
    pub transparency: bool,
    pub filesize: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deviation {
    pub deviationid: String,
    pub printid: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub category_path: Option<String>,
    pub is_favourited: bool,
    pub is_deleted: bool,
    pub is_published: bool,
    pub is_mature: bool,
    pub is_downloadable: bool,
    pub allows_comments: bool,
    pub author: Option<User>,
    pub stats: Option<DeviationStats>,
    pub published_time: Option<String>,
    pub preview: Option<StashObject>,
    pub content: Option<StashObject>,
    pub thumbs: Vec<StashObject>,
    pub excerpt: Option<String>,
    pub daily_deviation: Option<DailyDeviation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviationStats {
    pub comments: u32,
    pub favourites: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyDeviation {
    pub body: String,
    pub time: String,
    pub giver: Option<User>,
    pub suggester: Option<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub statusid: String,
    #[serde(rename = "html")]
    pub body: String,
    pub ts: Option<String>,
    pub url: Option<String>,
    pub comments_count: u32,
    pub is_share: bool,
    pub is_deleted: bool,
    #[serde(rename = "user")]
    pub author: Option<User>,
    pub items: Vec<StatusItem>,
}

/// Something shared in a status: another status or a deviation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Option<Box<Status>>,
    pub deviation: Option<Box<Deviation>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub user: User,
    pub is_watching: bool,
    pub profile_url: String,
    pub user_is_artist: bool,
    pub artist_level: Option<String>,
    pub artist_specialty: Option<String>,
    pub real_name: String,
    pub tagline: String,
    pub countryid: u32,
    pub country: String,
    pub website: String,
    pub bio: String,
    pub cover_photo: Option<String>,
    pub last_status: Option<Status>,
    pub stats: ProfileStats,
    pub galleries: Vec<GalleryFolderRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileStats {
    pub user_deviations: u32,
    pub user_favourites: u32,
    pub user_comments: u32,
    pub profile_pageviews: u32,
    pub profile_comments: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryFolderRef {
    pub folderid: String,
    pub parent: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StashMetadata {
    pub title: String,
    pub path: Option<String>,
    pub size: Option<u32>,
    /// HTML.
    pub description: Option<String>,
    pub parentid: Option<i64>,
    pub thumb: Option<StashObject>,
    pub artist_comments: Option<String>,
    pub original_url: Option<String>,
    pub category: Option<String>,
    pub creation_time: Option<i64>,
    pub files: Vec<StashObject>,
    pub stackid: Option<i64>,
    pub itemid: Option<i64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub messageid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub orphaned: bool,
    pub ts: Option<String>,
    pub stackid: Option<String>,
    pub stack_count: Option<u32>,
    pub is_new: bool,
    pub originator: Option<User>,
    pub html: Option<String>,
    pub profile: Option<User>,
    pub deviation: Option<Deviation>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topic {
    pub name: String,
    pub canonical_name: String,
    pub example_deviations: Vec<Deviation>,
}
