use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::core::site::{ImageStore, SiteError};

/// Length of the URL hash used as the output file stem.
const HASH_LENGTH: usize = 10;

/// Downloads remote images into the site's image directory at their natural
/// size and hands back the public URL of the stored copy.
pub struct ImageDownloader {
    client: Client,
    output_dir: PathBuf,
    url_path: String,
    write_seq: AtomicU64,
}

impl ImageDownloader {
    pub fn new(
        client: Client,
        output_dir: impl AsRef<Path>,
        url_path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            output_dir: output_dir.as_ref().to_path_buf(),
            url_path: url_path.into(),
            write_seq: AtomicU64::new(0),
        }
    }

    fn url_for(&self, file_name: &str) -> String {
        format!("{}{}", self.url_path, file_name)
    }

    /// Looks for an earlier download of the same URL, whatever its extension.
    ///
    /// In-flight temp files never match the `<stem>.` prefix. Empty files
    /// are skipped so a download cut short before any bytes landed is
    /// fetched again.
    async fn find_existing(&self, stem: &str) -> Option<String> {
        let mut dir = fs::read_dir(&self.output_dir).await.ok()?;
        let prefix = format!("{}.", stem);
        while let Ok(Some(entry)) = dir.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&prefix) {
                continue;
            }
            match entry.metadata().await {
                Ok(meta) if meta.is_file() && meta.len() > 0 => return Some(name),
                _ => tracing::debug!(file = %name, "Ignoring unusable image file"),
            }
        }
        None
    }

    /// Writes downloaded bytes under a name derived from `remote_url`.
    async fn store(
        &self,
        remote_url: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, SiteError> {
        let file_name = format!(
            "{}.{}",
            hash_stem(remote_url),
            extension_for(content_type, remote_url)
        );

        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| download_error(remote_url, e))?;

        // Dot-prefixed temp name, renamed into place once fully written.
        let tmp = self.output_dir.join(format!(
            ".{}.tmp-{}-{}",
            file_name,
            std::process::id(),
            self.write_seq.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = fs::write(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(download_error(remote_url, e));
        }
        if let Err(e) = fs::rename(&tmp, self.output_dir.join(&file_name)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(download_error(remote_url, e));
        }

        Ok(self.url_for(&file_name))
    }
}

#[async_trait]
impl ImageStore for ImageDownloader {
    async fn localize(&self, remote_url: &str) -> Result<String, SiteError> {
        let stem = hash_stem(remote_url);
        if let Some(existing) = self.find_existing(&stem).await {
            tracing::debug!(
                url = remote_url,
                file = %existing,
                "Reusing downloaded image"
            );
            return Ok(self.url_for(&existing));
        }

        let response = self
            .client
            .get(remote_url)
            .send()
            .await
            .map_err(|e| download_error(remote_url, e))?;

        if !response.status().is_success() {
            return Err(download_error(
                remote_url,
                format!("server returned {}", response.status()),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(remote_url, e))?;

        let local = self
            .store(remote_url, content_type.as_deref(), &bytes)
            .await?;
        tracing::info!(
            url = remote_url,
            local = %local,
            size = bytes.len(),
            "Downloaded image"
        );
        Ok(local)
    }
}

fn download_error(url: &str, reason: impl ToString) -> SiteError {
    SiteError::Download {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

fn hash_stem(url: &str) -> String {
    let mut stem = hex::encode(Sha256::digest(url.as_bytes()));
    stem.truncate(HASH_LENGTH);
    stem
}

/// Picks a file extension from the response type, then from the URL path.
fn extension_for(content_type: Option<&str>, url: &str) -> String {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());

    let from_mime = match mime.as_deref() {
        Some("image/png") => Some("png"),
        Some("image/jpeg") | Some("image/jpg") => Some("jpeg"),
        Some("image/gif") => Some("gif"),
        Some("image/webp") => Some("webp"),
        Some("image/svg+xml") => Some("svg"),
        Some("image/avif") => Some("avif"),
        _ => None,
    };
    if let Some(ext) = from_mime {
        return ext.to_string();
    }

    let path = url.split(['?', '#']).next().unwrap_or_default();
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "img".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_prefers_content_type() {
        assert_eq!(extension_for(Some("image/png"), "https://x/y"), "png");
        assert_eq!(
            extension_for(Some("image/jpeg; charset=binary"), "https://x/y.png"),
            "jpeg"
        );
        assert_eq!(extension_for(Some("image/svg+xml"), "https://x/y"), "svg");
    }

    #[test]
    fn test_extension_falls_back_to_url_then_default() {
        assert_eq!(extension_for(None, "https://example.com/x.PNG?sz=1"), "png");
        assert_eq!(
            extension_for(Some("application/octet-stream"), "https://example.com/a/b.gif"),
            "gif"
        );
        assert_eq!(
            extension_for(None, "https://lh7-us.googleusercontent.com/docsz/AD_4nX"),
            "img"
        );
    }

    #[test]
    fn test_hash_stem_is_stable_and_short() {
        let a = hash_stem("https://example.com/x.png");
        assert_eq!(a.len(), HASH_LENGTH);
        assert_eq!(a, hash_stem("https://example.com/x.png"));
        assert_ne!(a, hash_stem("https://example.com/y.png"));
    }

    #[tokio::test]
    async fn test_store_writes_file_and_returns_local_url() {
        let tmp = TempDir::new().unwrap();
        let img_dir = tmp.path().join("_site").join("img");
        let downloader = ImageDownloader::new(Client::new(), &img_dir, "/img/");
        let url = "https://example.com/x.png";

        let local = downloader
            .store(url, Some("image/png"), b"\x89PNG fake")
            .await
            .unwrap();

        let expected_name = format!("{}.png", hash_stem(url));
        assert_eq!(local, format!("/img/{}", expected_name));
        assert!(!local.starts_with("http"));
        assert_eq!(
            std::fs::read(img_dir.join(&expected_name)).unwrap(),
            b"\x89PNG fake"
        );

        let leftovers: Vec<_> = std::fs::read_dir(&img_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name != &expected_name)
            .collect();
        assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_interrupted_writes_are_not_reused() {
        let tmp = TempDir::new().unwrap();
        let downloader = ImageDownloader::new(Client::new(), tmp.path(), "/img/");
        let url = "https://example.com/x.png";
        let stem = hash_stem(url);

        // A temp file from a killed run and an empty final file.
        let partial = tmp.path().join(format!(".{}.png.tmp-1-0", stem));
        std::fs::write(partial, b"\x89P").unwrap();
        std::fs::write(tmp.path().join(format!("{}.png", stem)), b"").unwrap();

        assert_eq!(downloader.find_existing(&stem).await, None);

        let local = downloader
            .store(url, Some("image/png"), b"\x89PNG full")
            .await
            .unwrap();

        assert_eq!(local, format!("/img/{}.png", stem));
        assert_eq!(
            downloader.find_existing(&stem).await,
            Some(format!("{}.png", stem))
        );
    }

    #[tokio::test]
    async fn test_localize_reuses_existing_download() {
        let tmp = TempDir::new().unwrap();
        let downloader = ImageDownloader::new(Client::new(), tmp.path(), "/img/");
        let url = "https://unreachable.invalid/photo";
        let name = format!("{}.webp", hash_stem(url));
        std::fs::write(tmp.path().join(&name), b"cached").unwrap();

        // Served from disk; the host is never contacted.
        let local = downloader.localize(url).await.unwrap();

        assert_eq!(local, format!("/img/{}", name));
    }
}
