use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::markup::Node;

/// MIME type Drive reports for Google Docs.
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// MIME type Drive reports for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Errors raised anywhere in the site-data generation run.
///
/// Nothing is recovered locally: every variant propagates up to `main` and
/// aborts the build.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Google API returned {status} for {url}: {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },
    #[error("HTTP transport error: {0}")]
    Transport(String),
    #[error("Failed to convert document: {0}")]
    Convert(String),
    #[error("Failed to download image {url}: {reason}")]
    Download { url: String, reason: String },
    #[error("I/O error: {0}")]
    Io(String),
}

/// What a Drive listing entry is, as far as the site is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Document,
    Folder,
    Other,
}

/// One child of a Drive folder, exactly as the files endpoint lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
}

impl DriveEntry {
    pub fn kind(&self) -> EntryKind {
        match self.mime_type.as_str() {
            DOCUMENT_MIME_TYPE => EntryKind::Document,
            FOLDER_MIME_TYPE => EntryKind::Folder,
            _ => EntryKind::Other,
        }
    }
}

/// A converted Google Doc, ready to be handed to the site renderer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    /// Slugified ancestor folder names plus the document name, joined by `/`.
    pub path: String,
    /// `path` with the configured path prefix applied.
    pub url: String,
    /// Containing folders below the root, outermost first.
    pub tree: Vec<DriveEntry>,
    /// Raw Docs API payload.
    pub document: serde_json::Value,
    pub hast: Node,
    pub html: String,
}

/// Remote Drive/Docs operations the collector depends on.
///
/// The infra layer implements this over HTTP; tests implement it in memory.
#[async_trait]
pub trait DriveSource: Send + Sync {
    /// Lists every child of `folder_id`, in listing order.
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveEntry>, SiteError>;

    /// Fetches the structured representation of a Google Doc.
    async fn get_document(&self, doc_id: &str) -> Result<serde_json::Value, SiteError>;
}

/// Turns a remote image reference into a local asset URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn localize(&self, remote_url: &str) -> Result<String, SiteError>;
}
