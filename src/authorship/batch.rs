use futures::stream::{self, StreamExt};
use tracing::{debug, info};
use url::Url;

use super::resolve::resolve;
use crate::document::{Document, Item, PropertyValue, H_ENTRY};
use crate::fetch::PageFetcher;

/// Position of an item: index into `Document::items`, then into `children`.
type ItemPath = Vec<usize>;

/// Resolve the author of every h-entry in `doc` and overwrite its `author`
/// property with the result. Entries with no determinable author keep
/// whatever they had. Returns how many entries were updated.
///
/// Up to `concurrency` entries are in flight at once, and a free slot goes to
/// the next entry as soon as any resolution finishes, so one slow author page
/// only holds its own slot. All entries are resolved against the unmodified
/// document before any write happens, so results never depend on completion
/// order. Dropping the returned future before it completes leaves `doc`
/// untouched.
pub async fn resolve_all(
    doc: &mut Document,
    base_url: &Url,
    fetcher: &dyn PageFetcher,
    concurrency: usize,
) -> usize {
    let mut paths = Vec::new();
    entry_paths(&doc.items, &mut Vec::new(), &mut paths);
    debug!("Resolving {} entries", paths.len());

    let snapshot: &Document = doc;
    let resolved: Vec<(ItemPath, Option<Item>)> = stream::iter(paths)
        .map(move |path| async move {
            let author = match item_at(&snapshot.items, &path) {
                Some(entry) => resolve(snapshot, entry, base_url, fetcher)
                    .await
                    .unwrap_or_default(),
                None => None,
            };
            (path, author)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut updated = 0;
    for (path, author) in resolved {
        let (Some(author), Some(entry)) = (author, item_at_mut(&mut doc.items, &path)) else {
            continue;
        };
        entry
            .properties
            .insert("author".to_string(), vec![PropertyValue::Item(author)]);
        updated += 1;
    }

    info!("Authorship resolved for {} entries", updated);
    updated
}

fn entry_paths(items: &[Item], prefix: &mut ItemPath, out: &mut Vec<ItemPath>) {
    for (i, item) in items.iter().enumerate() {
        prefix.push(i);
        if item.has_type(H_ENTRY) {
            out.push(prefix.clone());
        }
        entry_paths(&item.children, prefix, out);
        prefix.pop();
    }
}

fn item_at<'a>(items: &'a [Item], path: &[usize]) -> Option<&'a Item> {
    let (first, rest) = path.split_first()?;
    let item = items.get(*first)?;
    if rest.is_empty() {
        Some(item)
    } else {
        item_at(&item.children, rest)
    }
}

fn item_at_mut<'a>(items: &'a mut [Item], path: &[usize]) -> Option<&'a mut Item> {
    let (first, rest) = path.split_first()?;
    let item = items.get_mut(*first)?;
    if rest.is_empty() {
        Some(item)
    } else {
        item_at_mut(&mut item.children, rest)
    }
}
