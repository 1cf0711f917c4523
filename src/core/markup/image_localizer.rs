use futures::future::try_join_all;

use super::tree::Node;
use crate::core::site::{ImageStore, SiteError};

/// Downloads every remote image referenced by `tree` and points each `img`
/// at its local copy.
///
/// The walk is synchronous; downloads for the whole tree then run
/// concurrently and the slots are rewritten once all of them succeed. A single
/// failed download fails the document and leaves the tree untouched.
pub async fn localize_images<S>(tree: &mut Node, store: &S) -> Result<usize, SiteError>
where
    S: ImageStore + ?Sized,
{
    let mut slots: Vec<&mut String> = tree
        .image_sources_mut()
        .into_iter()
        .filter(|src| is_remote(src))
        .collect();

    if slots.is_empty() {
        return Ok(0);
    }

    let local_urls = try_join_all(slots.iter().map(|src| store.localize(src.as_str()))).await?;

    for (slot, local) in slots.iter_mut().zip(local_urls) {
        **slot = local;
    }

    Ok(slots.len())
}

fn is_remote(src: &str) -> bool {
    src.starts_with("https://") || src.starts_with("http://")
}
