use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::fetch_cache::FetchCache;
use super::service_account::AccessTokenProvider;
use crate::core::site::{DriveEntry, DriveSource, SiteError};

const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1/documents";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";

/// One page of `files.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveEntry>,
    next_page_token: Option<String>,
}

/// Google Drive + Docs REST client. Every GET goes through the fetch cache;
/// a token is only requested when the cache misses.
pub struct GoogleDriveClient<T: AccessTokenProvider> {
    client: Client,
    tokens: T,
    cache: FetchCache,
}

impl<T: AccessTokenProvider> GoogleDriveClient<T> {
    pub fn new(client: Client, tokens: T, cache: FetchCache) -> Self {
        Self {
            client,
            tokens,
            cache,
        }
    }

    pub fn document_url(doc_id: &str) -> String {
        format!("{}/{}", DOCS_API_BASE, doc_id)
    }

    pub fn folder_url(folder_id: &str, page_token: Option<&str>) -> String {
        let query = format!("'{}' in parents", folder_id);
        let mut url = format!("{}?q={}", DRIVE_FILES_API, urlencoding::encode(&query));
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, SiteError> {
        if let Some(body) = self.cache.get(url).await {
            tracing::debug!(url, "Cache hit");
            return Ok(body);
        }
        tracing::debug!(url, "Cache miss, fetching");

        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SiteError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SiteError::Api {
                status,
                url: url.to_string(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SiteError::Transport(e.to_string()))?;

        self.cache.put(url, &body).await;
        Ok(body)
    }
}

#[async_trait]
impl<T: AccessTokenProvider> DriveSource for GoogleDriveClient<T> {
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveEntry>, SiteError> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = Self::folder_url(folder_id, page_token.as_deref());
            let body = self.fetch_json(&url).await?;
            let page: FileList = serde_json::from_value(body).map_err(|e| {
                SiteError::Transport(format!("unexpected Drive listing for {}: {}", url, e))
            })?;

            entries.extend(page.files);
            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(entries)
    }

    async fn get_document(&self, doc_id: &str) -> Result<serde_json::Value, SiteError> {
        if doc_id.trim().is_empty() {
            return Err(SiteError::Api {
                status: 400,
                url: DOCS_API_BASE.to_string(),
                body: "document id is empty".to_string(),
            });
        }

        tracing::debug!(doc_id, "Fetching Google Doc");
        self.fetch_json(&Self::document_url(doc_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Counts requests and refuses to hand out tokens, so any network
    /// attempt fails before leaving the process.
    #[derive(Default)]
    struct OfflineTokens {
        requests: AtomicUsize,
    }

    #[async_trait]
    impl AccessTokenProvider for OfflineTokens {
        async fn access_token(&self) -> Result<String, SiteError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Err(SiteError::Auth("offline".to_string()))
        }
    }

    fn client(dir: &TempDir) -> GoogleDriveClient<OfflineTokens> {
        GoogleDriveClient::new(
            Client::new(),
            OfflineTokens::default(),
            FetchCache::new(dir.path(), Duration::from_secs(24 * 60 * 60)),
        )
    }

    #[test]
    fn test_folder_url_encodes_parent_query() {
        type C = GoogleDriveClient<OfflineTokens>;
        assert_eq!(
            C::folder_url("abc123", None),
            "https://www.googleapis.com/drive/v3/files?q=%27abc123%27%20in%20parents"
        );
        assert!(C::folder_url("abc123", Some("tok/1")).ends_with("&pageToken=tok%2F1"));
        assert_eq!(
            C::document_url("doc9"),
            "https://docs.googleapis.com/v1/documents/doc9"
        );
    }

    #[tokio::test]
    async fn test_cached_document_needs_no_token() {
        let dir = TempDir::new().unwrap();
        let drive = client(&dir);
        let payload = json!({ "documentId": "doc9", "title": "Cached" });
        drive
            .cache
            .put(&GoogleDriveClient::<OfflineTokens>::document_url("doc9"), &payload)
            .await;

        let first = drive.get_document("doc9").await.unwrap();
        let second = drive.get_document("doc9").await.unwrap();

        assert_eq!(first, payload);
        assert_eq!(first, second);
        assert_eq!(drive.tokens.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_miss_propagates_auth_failure() {
        let dir = TempDir::new().unwrap();
        let drive = client(&dir);

        let err = drive.get_document("missing").await.unwrap_err();

        assert!(matches!(err, SiteError::Auth(_)));
        assert_eq!(drive.tokens.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_document_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let drive = client(&dir);

        let err = drive.get_document("  ").await.unwrap_err();

        assert!(matches!(err, SiteError::Api { status: 400, .. }));
        assert_eq!(drive.tokens.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_listing_follows_page_tokens() {
        type C = GoogleDriveClient<OfflineTokens>;
        let dir = TempDir::new().unwrap();
        let drive = client(&dir);

        drive
            .cache
            .put(
                &C::folder_url("root", None),
                &json!({
                    "files": [
                        {
                            "id": "1",
                            "name": "Intro",
                            "mimeType": "application/vnd.google-apps.document"
                        }
                    ],
                    "nextPageToken": "page2"
                }),
            )
            .await;
        drive
            .cache
            .put(
                &C::folder_url("root", Some("page2")),
                &json!({
                    "files": [
                        {
                            "id": "2",
                            "name": "Guides",
                            "mimeType": "application/vnd.google-apps.folder"
                        }
                    ]
                }),
            )
            .await;

        let entries = drive.list_folder("root").await.unwrap();

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(drive.tokens.requests.load(Ordering::SeqCst), 0);
    }
}
