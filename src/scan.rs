//! Stage input discovery and directory contract checks.
//!
//! Every stage starts here: [`require_dir`] fails fast when a directory from
//! the contract table is missing, and [`list_files`] returns the eligible
//! inputs in the one order every stage uses.
//!
//! ## Eligibility
//!
//! - Regular files only (subdirectories are never inputs)
//! - Hidden files (`.DS_Store`, in-flight `.partial` writes) are skipped
//! - Extension must match, case-insensitively (`ART.PNG` counts as `png`)
//!
//! ## Ordering
//!
//! Files are sorted by file name, byte-wise. Numbering (`Clipart-01`,
//! `Preview-01`), collage cell order, and video frame order all follow it.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Required directory missing: {}", .0.display())]
    MissingDirectory(PathBuf),
}

/// Raster inputs accepted by the image stages.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Frame inputs for the video stages.
pub const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Fail unless `path` exists and is a directory.
pub fn require_dir(path: &Path) -> Result<(), ScanError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ScanError::MissingDirectory(path.to_path_buf()))
    }
}

/// True when the lowercase extension of `path` is in `extensions`.
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    extensions.iter().any(|e| e.as_ref() == ext)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

/// Eligible files directly inside `dir`, sorted by file name.
pub fn list_files<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> Result<Vec<PathBuf>, ScanError> {
    require_dir(dir)?;
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && !is_hidden(p) && has_extension(p, extensions))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Like [`list_files`], but a missing directory yields an empty list.
pub fn list_files_if_present<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    list_files(dir, extensions)
}

/// File name as an owned string (empty for paths without one).
pub fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File stem as an owned string (empty for paths without one).
pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
