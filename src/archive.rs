//! Size-bounded zip bundles.
//!
//! Marketplaces cap the size of each downloadable file, so deliverables are
//! split across `{base}-01.zip`, `{base}-02.zip`, … with a greedy, order
//! preserving plan:
//!
//! - a new archive starts when none is open or when the next file would push
//!   the open one past the threshold;
//! - a file larger than the threshold gets an archive of its own;
//! - no file is ever dropped.
//!
//! Entries are stored by basename with deflate compression.

use crate::config::ArchiveConfig;
use crate::imaging::write_atomic;
use crate::naming::{is_plain_name, numbered_name, strip_sequence_suffix};
use crate::scan;
use crate::stage::{StageError, StageId, StageReport};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A file to bundle and its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Files grouped into archives, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePlan {
    pub max_bytes: u64,
    pub groups: Vec<Vec<ArchiveEntry>>,
}

impl ArchivePlan {
    pub fn group_bytes(&self) -> Vec<u64> {
        self.groups
            .iter()
            .map(|g| g.iter().map(|e| e.size).sum())
            .collect()
    }
}

pub fn plan_archives(files: &[ArchiveEntry], max_bytes: u64) -> ArchivePlan {
    let mut groups: Vec<Vec<ArchiveEntry>> = Vec::new();
    let mut open_bytes = 0u64;
    for entry in files {
        match groups.last_mut() {
            Some(group) if open_bytes.saturating_add(entry.size) <= max_bytes => {
                group.push(entry.clone());
                open_bytes += entry.size;
            }
            _ => {
                groups.push(vec![entry.clone()]);
                open_bytes = entry.size;
            }
        }
    }
    ArchivePlan { max_bytes, groups }
}

/// Listing name from the first eligible file in `dir`: its stem without a
/// trailing sequence number (`lets-get-boho-01.png` → `lets-get-boho`).
/// `None` when the directory is missing or has no eligible file.
pub fn listing_stem(dir: &Path, extensions: &[String]) -> Result<Option<String>, StageError> {
    Ok(scan::list_files_if_present(dir, extensions)?
        .first()
        .map(|first| strip_sequence_suffix(&scan::file_stem_string(first)).to_string()))
}

/// Archive base name: explicit override, then config, then `derived`.
pub fn base_name(
    override_name: Option<&str>,
    config: &ArchiveConfig,
    derived: &str,
) -> Result<String, StageError> {
    let name = match override_name.or(config.base_name.as_deref()) {
        Some(name) => name.trim().to_string(),
        None => derived.to_string(),
    };
    if !is_plain_name(&name) {
        return Err(StageError::InvalidName(name));
    }
    Ok(name)
}

/// Archive-eligible files in `dir` with their sizes.
pub fn archive_entries(dir: &Path, extensions: &[String]) -> Result<Vec<ArchiveEntry>, StageError> {
    scan::list_files(dir, extensions)?
        .into_iter()
        .map(|path| {
            let size = fs::metadata(&path)?.len();
            Ok(ArchiveEntry { path, size })
        })
        .collect()
}

pub fn write_zip(dest: &Path, entries: &[ArchiveEntry]) -> Result<(), StageError> {
    write_atomic(dest, |partial| {
        let mut zip = ZipWriter::new(BufWriter::new(File::create(partial)?));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for entry in entries {
            zip.start_file(scan::file_name_string(&entry.path), options)?;
            io::copy(&mut File::open(&entry.path)?, &mut zip)?;
        }
        zip.finish()?.flush()?;
        Ok(())
    })
}

/// `{base}-NN.zip` files from an earlier run.
fn remove_previous(output_dir: &Path, base: &str) -> Result<(), StageError> {
    let prefix = format!("{base}-");
    for path in scan::list_files_if_present(output_dir, &["zip"][..])? {
        let stem = scan::file_stem_string(&path);
        let numbered = stem
            .strip_prefix(&prefix)
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if numbered {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Bundle `source_dir` into `output_dir`.
///
/// Without an explicit name the base comes from the raw exports in
/// `exports_dir`, since upscaled files all carry the generic output prefix;
/// the first bundled file is used only when there are no exports.
#[tracing::instrument(skip_all, fields(source = %source_dir.display()))]
pub fn run(
    source_dir: &Path,
    output_dir: &Path,
    config: &ArchiveConfig,
    name_override: Option<&str>,
    exports_dir: &Path,
) -> Result<StageReport, StageError> {
    let entries = archive_entries(source_dir, &config.extensions)?;
    let Some(first) = entries.first() else {
        return Err(StageError::EmptyInput(source_dir.to_path_buf()));
    };
    let derived = match listing_stem(exports_dir, &config.extensions)? {
        Some(stem) => stem,
        None => strip_sequence_suffix(&scan::file_stem_string(&first.path)).to_string(),
    };
    let base = base_name(name_override, config, &derived)?;
    let plan = plan_archives(&entries, config.max_bytes);
    tracing::info!(files = entries.len(), archives = plan.groups.len(), base = %base, "bundling");

    remove_previous(output_dir, &base)?;
    let mut report = StageReport::new(StageId::Archive);
    for (i, (group, bytes)) in plan.groups.iter().zip(plan.group_bytes()).enumerate() {
        let dest = output_dir.join(numbered_name(&base, i + 1, ".zip"));
        write_zip(&dest, group)?;
        if bytes > config.max_bytes {
            report.notes.push(format!(
                "{} holds a single file over the size limit",
                scan::file_name_string(&dest)
            ));
        }
        report.outputs.push(dest);
    }
    report.processed = entries.len();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MB: u64 = 1024 * 1024;

    fn entries(sizes: &[u64]) -> Vec<ArchiveEntry> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| ArchiveEntry {
                path: PathBuf::from(format!("f{i}")),
                size,
            })
            .collect()
    }

    fn sizes(plan: &ArchivePlan) -> Vec<Vec<u64>> {
        plan.groups
            .iter()
            .map(|g| g.iter().map(|e| e.size).collect())
            .collect()
    }

    fn zip_names(path: &Path) -> Vec<String> {
        let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }

    // =========================================================================
    // Planning
    // =========================================================================

    #[test]
    fn oversized_file_gets_own_archive() {
        let plan = plan_archives(&entries(&[5 * MB, 5 * MB, 15 * MB, MB]), 10 * MB);
        assert_eq!(
            sizes(&plan),
            vec![vec![5 * MB, 5 * MB], vec![15 * MB], vec![MB]]
        );
    }

    #[test]
    fn exact_fit_stays_in_group() {
        let plan = plan_archives(&entries(&[4, 6, 1]), 10);
        assert_eq!(sizes(&plan), vec![vec![4, 6], vec![1]]);
    }

    #[test]
    fn order_preserved_and_nothing_dropped() {
        let input = entries(&[3, 9, 2, 2, 12, 0, 7]);
        let plan = plan_archives(&input, 10);
        let flat: Vec<ArchiveEntry> = plan.groups.concat();
        assert_eq!(flat, input);
        assert!(plan.groups.iter().all(|g| !g.is_empty()));
    }

    #[test]
    fn empty_input_plans_nothing() {
        assert!(plan_archives(&[], 10).groups.is_empty());
    }

    #[test]
    fn group_bytes_totals() {
        let plan = plan_archives(&entries(&[5, 5, 15, 1]), 10);
        assert_eq!(plan.group_bytes(), vec![10, 15, 1]);
    }

    // =========================================================================
    // Naming
    // =========================================================================

    #[test]
    fn base_name_precedence() {
        let mut config = ArchiveConfig::default();
        assert_eq!(base_name(None, &config, "lets-get-boho").unwrap(), "lets-get-boho");

        config.base_name = Some("boho".into());
        assert_eq!(base_name(None, &config, "lets-get-boho").unwrap(), "boho");
        assert_eq!(base_name(Some("flowers"), &config, "lets-get-boho").unwrap(), "flowers");
    }

    #[test]
    fn base_name_rejects_paths() {
        let result = base_name(Some("../evil"), &ArchiveConfig::default(), "a");
        assert!(matches!(result, Err(StageError::InvalidName(_))));
    }

    #[test]
    fn listing_stem_strips_sequence() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("lets-get-boho-02.png"), b"x").unwrap();
        fs::write(tmp.path().join("lets-get-boho-01.jpg"), b"x").unwrap();
        fs::write(tmp.path().join("clipart-press.toml"), b"x").unwrap();
        let exts = ArchiveConfig::default().extensions;

        let stem = listing_stem(tmp.path(), &exts).unwrap();
        assert_eq!(stem.as_deref(), Some("lets-get-boho"));
        assert_eq!(listing_stem(&tmp.path().join("missing"), &exts).unwrap(), None);
    }

    #[test]
    fn default_name_comes_from_exports_not_upscaled() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("Upscaled");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("Clipart-01.png"), b"u").unwrap();
        fs::write(tmp.path().join("lets-get-boho-01.png"), b"raw").unwrap();
        let out = tmp.path().join("ZIP");

        let report = run(&src, &out, &ArchiveConfig::default(), None, tmp.path()).unwrap();
        assert_eq!(report.outputs, vec![out.join("lets-get-boho-01.zip")]);
    }

    #[test]
    fn default_name_falls_back_to_bundled_file() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("Upscaled");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("Clipart-01.png"), b"u").unwrap();
        let out = tmp.path().join("ZIP");

        let report = run(&src, &out, &ArchiveConfig::default(), None, &tmp.path().join("raw")).unwrap();
        assert_eq!(report.outputs, vec![out.join("Clipart-01.zip")]);
    }

    // =========================================================================
    // Stage
    // =========================================================================

    #[test]
    fn run_splits_by_size_with_basename_entries() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("Upscaled");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.png"), vec![1u8; 600]).unwrap();
        fs::write(src.join("b.eps"), vec![2u8; 600]).unwrap();
        fs::write(src.join("c.jpg"), vec![3u8; 300]).unwrap();
        fs::write(src.join("notes.txt"), b"ignored").unwrap();
        let out = tmp.path().join("ZIP");
        let config = ArchiveConfig {
            max_bytes: 1000,
            ..ArchiveConfig::default()
        };

        let report = run(&src, &out, &config, Some("boho"), tmp.path()).unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(
            report.outputs,
            vec![out.join("boho-01.zip"), out.join("boho-02.zip")]
        );
        assert_eq!(zip_names(&out.join("boho-01.zip")), vec!["a.png"]);
        assert_eq!(zip_names(&out.join("boho-02.zip")), vec!["b.eps", "c.jpg"]);
    }

    #[test]
    fn zip_contents_round_trip() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("art.svg");
        fs::write(&file, b"<svg/>").unwrap();
        let dest = tmp.path().join("out.zip");
        write_zip(&dest, &[ArchiveEntry { path: file, size: 6 }]).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut entry = archive.by_name("art.svg").unwrap();
        let mut body = String::new();
        io::Read::read_to_string(&mut entry, &mut body).unwrap();
        assert_eq!(body, "<svg/>");
        assert_eq!(entry.compression(), zip::CompressionMethod::Deflated);
    }

    #[test]
    fn rerun_replaces_previous_archives() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("Upscaled");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.png"), vec![1u8; 10]).unwrap();
        let out = tmp.path().join("ZIP");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("boho-02.zip"), b"stale").unwrap();
        fs::write(out.join("other-01.zip"), b"keep").unwrap();

        run(&src, &out, &ArchiveConfig::default(), Some("boho"), tmp.path()).unwrap();
        assert!(out.join("boho-01.zip").exists());
        assert!(!out.join("boho-02.zip").exists());
        assert!(out.join("other-01.zip").exists());
    }

    #[test]
    fn oversized_single_file_noted() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("big.pdf"), vec![0u8; 50]).unwrap();
        let config = ArchiveConfig {
            max_bytes: 10,
            ..ArchiveConfig::default()
        };
        let report = run(tmp.path(), &tmp.path().join("ZIP"), &config, Some("x"), tmp.path()).unwrap();
        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.notes.len(), 1);
    }

    #[test]
    fn no_eligible_files_is_empty_input() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("readme.txt"), b"x").unwrap();
        let result = run(tmp.path(), &tmp.path().join("ZIP"), &ArchiveConfig::default(), None, tmp.path());
        assert!(matches!(result, Err(StageError::EmptyInput(_))));
    }
}
