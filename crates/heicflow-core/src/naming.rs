//! Object naming rules.
//!
//! Object paths are `/`-separated keys inside a bucket. A source object
//! `students/abc/foo.heic` is published as `students/abc/foo_converted.jpg`;
//! every converted name contains [`CONVERTED_MARKER`], which is what keeps the
//! pipeline from re-triggering on its own output.

use crate::constants::{CONVERTED_EXTENSION, CONVERTED_MARKER, HEIC_EXTENSIONS};

/// Final path segment of an object path (`students/abc/foo.heic` -> `foo.heic`).
pub fn base_name(object_path: &str) -> &str {
    match object_path.rfind('/') {
        Some(idx) => &object_path[idx + 1..],
        None => object_path,
    }
}

/// Directory part of an object path, without the trailing slash.
///
/// Returns `None` for objects at the bucket root.
pub fn parent_dir(object_path: &str) -> Option<&str> {
    object_path.rfind('/').map(|idx| &object_path[..idx])
}

/// File name without its last extension (`foo.tar.heic` -> `foo.tar`).
///
/// A name that is only an extension (`.heic`) has an empty stem.
pub fn stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) => &file_name[..idx],
        None => file_name,
    }
}

/// Whether the object path ends in `.heic` or `.heif`, case-insensitively.
pub fn has_heic_extension(object_path: &str) -> bool {
    let name = base_name(object_path).to_ascii_lowercase();
    HEIC_EXTENSIONS.iter().any(|ext| {
        name.strip_suffix(ext)
            .is_some_and(|rest| rest.ends_with('.'))
    })
}

/// Whether the object path is (or looks like) pipeline output.
pub fn is_converted(object_path: &str) -> bool {
    object_path.contains(CONVERTED_MARKER)
}

/// Name of the converted object for a source path (`foo_converted.jpg`).
pub fn converted_file_name(object_path: &str) -> String {
    format!(
        "{}{}.{}",
        stem(base_name(object_path)),
        CONVERTED_MARKER,
        CONVERTED_EXTENSION
    )
}

/// Full path of the converted object, in the same directory as the source.
pub fn converted_object_path(object_path: &str) -> String {
    let file_name = converted_file_name(object_path);
    match parent_dir(object_path) {
        Some(dir) => format!("{}/{}", dir, file_name),
        None => file_name,
    }
}
