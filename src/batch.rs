//! Parallel per-file work with deferred sequential numbering.
//!
//! Batch stages (upscale, watermark) decode and encode every input on the
//! rayon pool, each writing to a hidden staged file in the output directory.
//! Only after the whole batch has run are the staged files renamed to
//! `{prefix}-01.ext`, `{prefix}-02.ext`, … in sorted input order, so a file
//! that failed never consumes a number.
//!
//! ```text
//! Upscaled/
//! ├── .Clipart-0000.staged.png   # written in parallel
//! ├── .Clipart-0001.staged.jpg
//! └── ...
//!          ↓ commit (sequential)
//! Upscaled/
//! ├── Clipart-01.png
//! └── Clipart-02.jpg
//! ```

use crate::naming::numbered_name;
use crate::scan;
use crate::stage::{StageError, StageReport};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A successfully processed input waiting for its final name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged {
    pub path: PathBuf,
    /// Final extension without the dot (`png`, `jpg`).
    pub extension: &'static str,
    /// Non-fatal remark to carry into the report.
    pub note: Option<String>,
}

/// Hidden per-input path inside `output_dir`, unique by input index.
pub fn staged_path(output_dir: &Path, prefix: &str, index: usize, extension: &str) -> PathBuf {
    output_dir.join(format!(".{prefix}-{index:04}.staged.{extension}"))
}

/// Run `work(index, input)` for every input on the rayon pool.
///
/// Results come back in input order regardless of completion order.
pub fn process_all<T, E, F>(inputs: &[PathBuf], work: F) -> Vec<(PathBuf, Result<T, E>)>
where
    T: Send,
    E: Send,
    F: Fn(usize, &Path) -> Result<T, E> + Sync,
{
    inputs
        .par_iter()
        .enumerate()
        .map(|(i, path)| (path.clone(), work(i, path)))
        .collect()
}

/// Rename staged outputs to their sequential names and fill the report.
///
/// Failed inputs are recorded as skipped. A numbered output left by an
/// earlier run under a different extension is removed so reruns converge on
/// the same file set.
pub fn commit<E: fmt::Display>(
    results: Vec<(PathBuf, Result<Staged, E>)>,
    output_dir: &Path,
    prefix: &str,
    report: &mut StageReport,
) -> Result<(), StageError> {
    let mut number = 0;
    for (source, result) in results {
        match result {
            Ok(staged) => {
                number += 1;
                let name = numbered_name(prefix, number, &format!(".{}", staged.extension));
                let dest = output_dir.join(&name);
                remove_stale_variants(&dest)?;
                fs::rename(&staged.path, &dest)?;
                if let Some(note) = staged.note {
                    report.notes.push(note);
                }
                tracing::debug!(source = %source.display(), output = %name, "committed");
                report.processed += 1;
                report.outputs.push(dest);
            }
            Err(e) => {
                tracing::warn!(file = %source.display(), error = %e, "skipped");
                report.skip(&source, e);
            }
        }
    }
    Ok(())
}

/// Same stem, other image extension: `Clipart-01.jpg` when writing `Clipart-01.png`.
fn remove_stale_variants(dest: &Path) -> Result<(), StageError> {
    let Some(dir) = dest.parent() else {
        return Ok(());
    };
    let stem = scan::file_stem_string(dest);
    for ext in scan::IMAGE_EXTENSIONS {
        let candidate = dir.join(format!("{stem}.{ext}"));
        if candidate != dest && candidate.is_file() {
            fs::remove_file(&candidate)?;
        }
    }
    Ok(())
}
