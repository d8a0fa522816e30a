//! Concurrent file fetching for resolved items.

use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::abort::join_error;
use super::graph::ResolvedItem;
use crate::error::{FetchFailure, Result};
use crate::manifest::{FileRole, ItemFile};
use crate::registry::RegistryResolver;

/// A file with its fetched content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub file: ItemFile,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct FetchedItem {
    pub resolved: ResolvedItem,
    /// In the order of `resolved.files`, minus soft-role files the
    /// registry does not actually serve
    pub files: Vec<FetchedFile>,
}

/// Fetch every file of every item concurrently.
///
/// Item and file order is preserved. A missing soft-role file is skipped
/// with a warning; any other failure aborts all outstanding fetches.
pub async fn fetch_items(
    resolver: &RegistryResolver,
    items: Vec<ResolvedItem>,
) -> Result<Vec<FetchedItem>> {
    let mut tasks = JoinSet::new();
    for (item_index, item) in items.iter().enumerate() {
        for (file_index, file) in item.files.iter().enumerate() {
            let resolver = resolver.clone();
            let registry = item.registry.clone();
            let path = item.item.remote_path(file);
            tasks.spawn(async move {
                let result = resolver.fetch(&registry, &path).await;
                (item_index, file_index, path, result)
            });
        }
    }

    let mut slots: Vec<Vec<Option<String>>> =
        items.iter().map(|i| vec![None; i.files.len()]).collect();
    while let Some(joined) = tasks.join_next().await {
        let (item_index, file_index, path, result) = joined.map_err(join_error)?;
        match result {
            Ok(content) => {
                debug!("Fetched {}", path);
                slots[item_index][file_index] = Some(content);
            }
            Err(e)
                if e.fetch_failure() == Some(FetchFailure::NotFound)
                    && items[item_index].files[file_index].role != FileRole::Primary =>
            {
                warn!("Skipping {}: not served by the registry", path);
            }
            Err(e) => {
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    Ok(items
        .into_iter()
        .zip(slots)
        .map(|(resolved, contents)| {
            let files = resolved
                .files
                .iter()
                .zip(contents)
                .filter_map(|(file, content)| {
                    content.map(|content| FetchedFile {
                        file: file.clone(),
                        content,
                    })
                })
                .collect();
            FetchedItem { resolved, files }
        })
        .collect())
}
