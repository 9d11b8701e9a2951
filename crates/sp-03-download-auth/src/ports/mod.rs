//! # Ports Layer

pub mod inbound;
pub mod outbound;

pub use inbound::{AuthorizedDownload, DownloadAuthorizationApi, DownloadRequest};
pub use outbound::{ContentProvider, InMemoryContentProvider};
