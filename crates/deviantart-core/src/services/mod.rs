//! Typed wrappers around groups of API endpoints. Each service is a thin,
//! cloneable handle over a [`DeviantArtClient`](crate::client::DeviantArtClient).

mod browse;
mod deviation;
mod gallery;
mod messages;
mod stash;
mod user;

pub use browse::{BrowseService, PopularParams, TimeRange};
pub use deviation::DeviationService;
pub use gallery::{FolderContent, GalleryMode, GalleryParams, GalleryService};
pub use messages::{DeleteMessageParams, MessagesFeedParams, MessagesService};
pub use stash::{StackContents, StackContentsParams, StashService, ROOT_STACK_ID};
pub use user::{ProfileParams, UserService};
