use std::path::Path;

use tokio::fs;

use crate::core::site::{DocumentRecord, SiteError};

/// Writes the collected records as the site's page data file.
pub async fn write_page_data(path: &Path, records: &[DocumentRecord]) -> Result<(), SiteError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| SiteError::Io(e.to_string()))?;
    }

    let text =
        serde_json::to_string_pretty(records).map_err(|e| SiteError::Io(e.to_string()))?;
    fs::write(path, text)
        .await
        .map_err(|e| SiteError::Io(format!("{}: {}", path.display(), e)))?;

    tracing::info!(path = %path.display(), count = records.len(), "Wrote page data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markup::{Element, Node};
    use serde_json::json;
    use tempfile::TempDir;

    fn record(id: &str, path: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            title: "Title".to_string(),
            path: path.to_string(),
            url: format!("/{}/", path),
            tree: Vec::new(),
            document: json!({ "documentId": id }),
            hast: Node::root(vec![Element::new("p")
                .with_children(vec![Node::text("hi")])
                .into_node()]),
            html: "<p>hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_writes_camel_case_records_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("_data").join("docs.json");

        write_page_data(&path, &[record("a", "my-doc"), record("b", "s/other")])
            .await
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let items = written.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["path"], "my-doc");
        assert_eq!(items[1]["path"], "s/other");
        assert_eq!(items[0]["hast"]["type"], "root");
        assert_eq!(items[0]["document"]["documentId"], "a");
        assert_eq!(items[0]["html"], "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_empty_list_writes_empty_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docs.json");

        write_page_data(&path, &[]).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
