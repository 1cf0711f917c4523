use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;

use super::site_models::{
    DocumentRecord, DriveEntry, DriveSource, EntryKind, ImageStore, SiteError,
};
use super::slug::slug_path;
use crate::core::markup::{localize_images, parse_document, to_hast, to_html};

/// Walks a Drive folder tree and turns every Google Doc in it into a
/// [`DocumentRecord`].
///
/// All remote access goes through the injected [`DriveSource`] and
/// [`ImageStore`], so the traversal can be tested without HTTP.
pub struct SiteCollector<D: DriveSource, I: ImageStore> {
    drive: D,
    images: I,
    path_prefix: String,
}

impl<D, I> SiteCollector<D, I>
where
    D: DriveSource,
    I: ImageStore,
{
    pub fn new(drive: D, images: I, path_prefix: impl Into<String>) -> Self {
        Self {
            drive,
            images,
            path_prefix: path_prefix.into(),
        }
    }

    /// Collects every document below `root_folder_id` into one flat list.
    ///
    /// Documents of a folder come first in listing order, followed by the
    /// records of each subfolder in listing order. The first failure aborts
    /// the whole collection.
    pub async fn collect(&self, root_folder_id: &str) -> Result<Vec<DocumentRecord>, SiteError> {
        let records = self
            .collect_folder(root_folder_id.to_string(), Vec::new())
            .await?;
        tracing::info!(count = records.len(), "Collected documents");
        Ok(records)
    }

    fn collect_folder(
        &self,
        folder_id: String,
        tree: Vec<DriveEntry>,
    ) -> BoxFuture<'_, Result<Vec<DocumentRecord>, SiteError>> {
        async move {
            let entries = self.drive.list_folder(&folder_id).await?;

            let documents: Vec<&DriveEntry> = entries
                .iter()
                .filter(|e| e.kind() == EntryKind::Document)
                .collect();
            let folders: Vec<&DriveEntry> = entries
                .iter()
                .filter(|e| e.kind() == EntryKind::Folder)
                .collect();

            tracing::info!(
                folder_id = %folder_id,
                documents = documents.len(),
                folders = folders.len(),
                skipped = entries.len() - documents.len() - folders.len(),
                "Listed folder"
            );

            let files = try_join_all(
                documents
                    .iter()
                    .map(|entry| self.build_record(entry, &tree)),
            );

            let nested = try_join_all(folders.iter().map(|folder| {
                let mut ancestors = tree.clone();
                ancestors.push((*folder).clone());
                self.collect_folder(folder.id.clone(), ancestors)
            }));

            let (mut records, nested) = futures::try_join!(files, nested)?;
            records.extend(nested.into_iter().flatten());
            Ok(records)
        }
        .boxed()
    }

    async fn build_record(
        &self,
        entry: &DriveEntry,
        tree: &[DriveEntry],
    ) -> Result<DocumentRecord, SiteError> {
        let raw = self.drive.get_document(&entry.id).await?;
        let doc = parse_document(&raw)?;

        let mut hast = to_hast(&doc);
        let images = localize_images(&mut hast, &self.images).await?;
        let html = to_html(&hast);

        let path = slug_path(tree.iter().chain(std::iter::once(entry)));
        let title = if doc.title.is_empty() {
            entry.name.clone()
        } else {
            doc.title.clone()
        };

        tracing::info!(doc_id = %entry.id, path = %path, images, "Converted document");

        Ok(DocumentRecord {
            id: entry.id.clone(),
            title,
            url: format!("{}{}/", self.path_prefix, path),
            path,
            tree: tree.to_vec(),
            document: raw,
            hast,
            html,
        })
    }
}
