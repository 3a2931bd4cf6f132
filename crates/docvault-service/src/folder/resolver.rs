//! Direct-children view of a virtual folder.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use docvault_entity::document::DocumentEntity;
use docvault_entity::listing::{FolderItem, InferredFolder};

/// Items uploaded this recently are listed first within their group.
const RECENT_WINDOW_MINUTES: i64 = 15;

/// Compute the direct children of `current_path` (`""` is the root).
///
/// `entities` should be the active rows. Folders that only exist because
/// deeper paths run through them are synthesized as
/// [`FolderItem::Inferred`], one per name. Folders come before files;
/// within each group items uploaded in the last 15 minutes come first
/// (newest first), the rest are ordered by name.
pub fn resolve_children(
    entities: &[DocumentEntity],
    current_path: &str,
    now: DateTime<Utc>,
) -> Vec<FolderItem> {
    let prefix = if current_path.is_empty() {
        String::new()
    } else {
        format!("{current_path}/")
    };

    let mut explicit = Vec::new();
    let mut deeper = Vec::new();
    for doc in entities {
        let Some(rest) = doc.path.strip_prefix(prefix.as_str()) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        match rest.split_once('/') {
            None => explicit.push(doc),
            Some((segment, _)) if !segment.is_empty() => deeper.push(segment),
            Some(_) => {}
        }
    }

    let explicit_folders: HashSet<&str> = explicit
        .iter()
        .filter(|doc| doc.is_folder())
        .map(|doc| doc.name.as_str())
        .collect();

    let mut inferred_names = HashSet::new();
    let mut items: Vec<FolderItem> = explicit
        .into_iter()
        .map(|doc| FolderItem::Explicit(doc.clone()))
        .collect();
    for segment in deeper {
        if explicit_folders.contains(segment) || !inferred_names.insert(segment) {
            continue;
        }
        items.push(FolderItem::Inferred(InferredFolder::new(current_path, segment)));
    }

    let recent_since = now - Duration::minutes(RECENT_WINDOW_MINUTES);
    items.sort_by(|a, b| compare(a, b, recent_since));
    items
}

fn recent_upload(item: &FolderItem, since: DateTime<Utc>) -> Option<DateTime<Utc>> {
    item.as_entity()
        .map(|doc| doc.uploaded_at)
        .filter(|uploaded| *uploaded >= since)
}

fn compare(a: &FolderItem, b: &FolderItem, recent_since: DateTime<Utc>) -> Ordering {
    b.is_folder()
        .cmp(&a.is_folder())
        .then_with(|| {
            match (recent_upload(a, recent_since), recent_upload(b, recent_since)) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
        .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
        .then_with(|| a.name().cmp(b.name()))
}
