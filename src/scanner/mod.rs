use crate::error::{NobgError, Result};
use image::ImageFormat;
use nobg_common::InputFile;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Reads the given files and folders into queue inputs
///
/// Folders contribute the files directly inside them, sorted by name.
/// Every file is read; filtering by type is left to the queue.
pub fn load_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            files.extend(list_folder(path));
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(NobgError::FileNotFound(path.display().to_string()));
        }
    }

    files
        .iter()
        .map(|path| -> Result<InputFile> {
            let bytes = std::fs::read(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(InputFile::new(name, mime_for(path), bytes))
        })
        .collect()
}

/// MIME type guessed from the file extension
pub fn mime_for(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

fn list_folder(folder: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}
