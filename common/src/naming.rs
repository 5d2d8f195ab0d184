//! File naming conventions for edited images and downloads

use crate::types::Edit;

pub const DEFAULT_DOWNLOAD_PREFIX: &str = "no-bg";

const FALLBACK_BASE: &str = "image";

/// Part of the file name before its first `.`
///
/// `holiday.beach.jpg` gives `holiday`. Names starting with a dot fall back
/// to `image`.
pub fn base_name(file_name: &str) -> &str {
    match file_name.split('.').next() {
        Some(base) if !base.is_empty() => base,
        _ => FALLBACK_BASE,
    }
}

/// Display name after a local edit, e.g. `cat.jpg` -> `cat-rotated.png`
pub fn edited_name(file_name: &str, edit: Edit) -> String {
    format!("{}-{}.png", base_name(file_name), edit.suffix())
}

/// Name offered for a finished result, e.g. `no-bg-cat.png`
pub fn download_name(prefix: &str, file_name: &str) -> String {
    format!("{}-{}.png", prefix, base_name(file_name))
}
