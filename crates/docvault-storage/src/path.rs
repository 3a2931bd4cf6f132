//! Virtual path codec.
//!
//! A virtual path is root-relative, forward-slash separated, and has no
//! leading or trailing slash. The root itself is the empty string. Nothing
//! in this module performs I/O.

use std::path::{Component, Path, PathBuf};

use docvault_core::error::AppError;
use docvault_core::result::AppResult;

/// Separator used in virtual paths on every platform.
pub const SEPARATOR: char = '/';

/// Normalize caller-supplied input into a canonical virtual path.
///
/// Backslashes are treated as separators, empty and `.` segments are
/// dropped, and `..` is rejected.
pub fn normalize(input: &str) -> AppResult<String> {
    let mut segments = Vec::new();
    for segment in input.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(AppError::validation(format!(
                    "Path '{input}' must not contain '..'"
                )));
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

/// Check that `name` is usable as a single path segment.
pub fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if name.contains(['/', '\\']) {
        return Err(AppError::validation(format!(
            "Name '{name}' must not contain path separators"
        )));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation(format!("Name '{name}' is reserved")));
    }
    Ok(())
}

/// Map a physical location below `root` to its virtual path.
pub fn to_virtual(root: &Path, physical: &Path) -> AppResult<String> {
    let relative = physical.strip_prefix(root).map_err(|_| {
        AppError::validation(format!(
            "{} is outside the storage root {}",
            physical.display(),
            root.display()
        ))
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(AppError::validation(format!(
                    "{} does not map to a virtual path",
                    physical.display()
                )));
            }
        }
    }
    Ok(segments.join("/"))
}

/// Map a virtual path to its physical location below `root`.
pub fn to_physical(root: &Path, virtual_path: &str) -> AppResult<PathBuf> {
    let canonical = normalize(virtual_path)?;
    let mut physical = root.to_path_buf();
    for segment in canonical.split(SEPARATOR).filter(|s| !s.is_empty()) {
        physical.push(segment);
    }
    Ok(physical)
}

/// Join a parent virtual path and a leaf name.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// The parent of a virtual path (`""` for root-level entries).
pub fn parent(path: &str) -> &str {
    path.rfind(SEPARATOR).map_or("", |idx| &path[..idx])
}

/// The last segment of a virtual path.
pub fn file_name(path: &str) -> &str {
    path.rfind(SEPARATOR).map_or(path, |idx| &path[idx + 1..])
}

/// Whether `path` equals `root` or lives below it.
pub fn is_within(root: &str, path: &str) -> bool {
    if root.is_empty() {
        return true;
    }
    path == root || (path.starts_with(root) && path.as_bytes().get(root.len()) == Some(&b'/'))
}

/// Append ` (<label> <n>)` to a name.
///
/// Files split at the last `.` so the extension stays last
/// (`report.pdf` becomes `report (Copy 1).pdf`). Folders and dot-files
/// take the suffix at the end of the whole name.
pub fn with_suffix(name: &str, label: &str, n: u32, is_folder: bool) -> String {
    let split = if is_folder {
        None
    } else {
        name.rfind('.').filter(|&idx| idx > 0)
    };
    match split {
        Some(idx) => format!("{} ({label} {n}){}", &name[..idx], &name[idx..]),
        None => format!("{name} ({label} {n})"),
    }
}
