use std::path::Path;

use tokio::fs;

use crate::core::markup::html::escape_text;
use crate::core::site::{DocumentRecord, SiteError};

/// Writes one standalone `index.html` per record at `<output_dir>/<path>/`.
pub async fn render_pages(
    output_dir: &Path,
    records: &[DocumentRecord],
) -> Result<usize, SiteError> {
    for record in records {
        let dir = output_dir.join(&record.path);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SiteError::Io(format!("{}: {}", dir.display(), e)))?;

        let file = dir.join("index.html");
        fs::write(&file, render_page(record))
            .await
            .map_err(|e| SiteError::Io(format!("{}: {}", file.display(), e)))?;
        tracing::debug!(path = %file.display(), "Rendered page");
    }

    tracing::info!(count = records.len(), "Rendered pages");
    Ok(records.len())
}

fn render_page(record: &DocumentRecord) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n<main>\n{}\n</main>\n</body>\n</html>\n",
        escape_text(&record.title),
        record.html
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markup::Node;
    use tempfile::TempDir;

    fn record(title: &str, path: &str, html: &str) -> DocumentRecord {
        DocumentRecord {
            id: path.to_string(),
            title: title.to_string(),
            path: path.to_string(),
            url: format!("/{}/", path),
            tree: Vec::new(),
            document: serde_json::Value::Null,
            hast: Node::root(Vec::new()),
            html: html.to_string(),
        }
    }

    #[tokio::test]
    async fn test_pages_land_at_record_paths() {
        let tmp = TempDir::new().unwrap();
        let records = vec![
            record("My Doc", "my-doc", "<p>one</p>"),
            record("Other", "s/other", "<p>two</p>"),
        ];

        let count = render_pages(tmp.path(), &records).await.unwrap();

        assert_eq!(count, 2);
        let nested = std::fs::read_to_string(tmp.path().join("s/other/index.html")).unwrap();
        assert!(nested.contains("<title>Other</title>"));
        assert!(nested.contains("<main>\n<p>two</p>\n</main>"));
        assert!(tmp.path().join("my-doc/index.html").exists());
    }

    #[test]
    fn test_title_is_escaped() {
        let page = render_page(&record("Q&A <draft>", "q-and-a", ""));
        assert!(page.contains("<title>Q&amp;A &lt;draft&gt;</title>"));
    }
}
