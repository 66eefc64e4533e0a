//! Numbered delivery folders.
//!
//! Finished listings are moved out of the working root into a destination
//! (usually a cloud-synced folder) under the next free slot number:
//!
//! ```text
//! Delivered/
//! ├── 3 - Foo/
//! ├── 7 - Bar/
//! └── 8 - Lets Get Boho/        ← allocated now
//!     ├── Upscaled/
//!     ├── WATERMARK/            ← includes Main Preview.jpg
//!     └── ZIP/
//! ```
//!
//! Slot folders are created exclusively, so an existing folder is never merged
//! into. Each moved source directory is recreated empty, leaving the working
//! root ready for the next batch.

use crate::archive;
use crate::config::{ArchiveConfig, DeliverySource};
use crate::naming::{is_plain_name, parse_slot_name, slot_name, title_from_stem};
use crate::scan;
use crate::stage::{StageError, StageId, StageReport};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySlot {
    pub root: PathBuf,
    pub number: u32,
    pub title: String,
}

impl DeliverySlot {
    pub fn name(&self) -> String {
        slot_name(self.number, &self.title)
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(self.name())
    }
}

/// One past the highest `{N} - …` folder under `root`; 1 when there are none
/// or `root` does not exist yet.
pub fn next_slot_number(root: &Path) -> Result<u32, StageError> {
    if !root.is_dir() {
        return Ok(1);
    }
    let mut max = 0;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(slot) = parse_slot_name(&entry.file_name().to_string_lossy()) {
            max = max.max(slot.number);
        }
    }
    max.checked_add(1).ok_or_else(|| {
        StageError::Delivery(format!("no slot number left after {} in {}", max, root.display()))
    })
}

/// Create the next slot folder for `title`.
pub fn allocate_slot(root: &Path, title: &str) -> Result<DeliverySlot, StageError> {
    let title = title.trim();
    if !is_plain_name(title) {
        return Err(StageError::InvalidName(title.to_string()));
    }
    fs::create_dir_all(root)?;
    let slot = DeliverySlot {
        root: root.to_path_buf(),
        number: next_slot_number(root)?,
        title: title.to_string(),
    };
    match fs::create_dir(slot.path()) {
        Ok(()) => Ok(slot),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(StageError::Delivery(format!(
            "slot '{}' already exists",
            slot.path().display()
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Move a file or directory. Only a cross-device rename falls back to
/// copy then remove; any other failure is returned untouched.
pub fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(from = %from.display(), error = %e, "cross-device rename, copying");
            copy_then_remove(from, to)
        }
        Err(e) => Err(e),
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    if from.is_file() {
        fs::copy(from, to)?;
        return fs::remove_file(from);
    }
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    fs::remove_dir_all(from)
}

fn refuse_existing(target: &Path) -> Result<(), StageError> {
    if target.exists() {
        return Err(StageError::Delivery(format!(
            "{} already exists",
            target.display()
        )));
    }
    Ok(())
}

/// Move configured sources from `working_root` into `slot`.
///
/// Returns the moved destinations and a note per absent source.
pub fn deliver(
    working_root: &Path,
    slot: &DeliverySlot,
    sources: &[DeliverySource],
) -> Result<(Vec<PathBuf>, Vec<String>), StageError> {
    let slot_dir = slot.path();
    let mut moved = Vec::new();
    let mut notes = Vec::new();

    for source in sources {
        let src = working_root.join(&source.path);
        if !src.is_dir() {
            tracing::warn!(source = %src.display(), "delivery source missing");
            notes.push(format!("{} not present", source.path));
            continue;
        }

        match &source.flatten_into {
            Some(sub) => {
                let dest_dir = slot_dir.join(sub);
                fs::create_dir_all(&dest_dir)?;
                for entry in fs::read_dir(&src)? {
                    let path = entry?.path();
                    let name = scan::file_name_string(&path);
                    if name.starts_with('.') {
                        continue;
                    }
                    let target = dest_dir.join(&name);
                    refuse_existing(&target)?;
                    move_path(&path, &target)?;
                    moved.push(target);
                }
            }
            None => {
                let target = slot_dir.join(scan::file_name_string(&src));
                refuse_existing(&target)?;
                move_path(&src, &target)?;
                fs::create_dir_all(&src)?;
                moved.push(target);
            }
        }
    }
    Ok((moved, notes))
}

/// Title from the first raw export: `lets-get-boho-01.png` → `Lets Get Boho`.
/// Falls back to the first file in `fallback` when there are no exports left.
pub fn default_title(
    exports: &Path,
    fallback: &Path,
    config: &ArchiveConfig,
) -> Result<String, StageError> {
    let stem = match archive::listing_stem(exports, &config.extensions)? {
        Some(stem) => stem,
        None => archive::listing_stem(fallback, &config.extensions)?
            .ok_or_else(|| StageError::EmptyInput(exports.to_path_buf()))?,
    };
    Ok(title_from_stem(&stem))
}

#[tracing::instrument(skip_all, fields(destination = %destination.display(), title = %title))]
pub fn run(
    working_root: &Path,
    destination: &Path,
    title: &str,
    sources: &[DeliverySource],
) -> Result<StageReport, StageError> {
    let slot = allocate_slot(destination, title)?;
    tracing::info!(slot = %slot.name(), "delivering");
    let (moved, notes) = deliver(working_root, &slot, sources)?;

    let mut report = StageReport::new(StageId::Deliver);
    report.processed = moved.len();
    report.outputs.push(slot.path());
    report.notes = notes;
    Ok(report)
}
