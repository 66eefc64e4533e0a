//! # clipart-press
//!
//! Batch production pipeline for marketplace clipart listings. A folder of
//! raw exported artwork goes in; a preview collage, watermarked previews,
//! print-resolution masters, a slideshow video and size-bounded zip bundles
//! come out, and are finally moved into a numbered delivery folder.
//!
//! # Architecture: Directory-Scoped Stages
//!
//! Every stage reads a known directory and writes a known directory under the
//! working root. The filesystem tree is the only state shared between stages:
//!
//! ```text
//! raw exports (.)  ──┬─→ collage   ─→ Main Preview/Main Preview.jpg
//!                    ├─→ watermark ─→ WATERMARK/Preview-NN.jpg
//!                    ├─→ upscale   ─→ Upscaled/Clipart-NN.{png,jpg}
//!                    └─→ loop-video ─→ preview_video.mp4
//! Main Preview + WATERMARK ─→ slideshow ─→ WATERMARK/output.mp4
//! Upscaled ─→ archive ─→ ZIP/{name}-NN.zip
//! Upscaled, WATERMARK, ZIP, Main Preview ─→ deliver ─→ Delivered/N - Title/
//! ```
//!
//! Stages can be run one by one from the CLI, chained with `build`, or fed to
//! a single-worker [`runner::StageRunner`] that drops triggers while busy.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`collage`] | Grid collage with a captioned footer band |
//! | [`upscale`] | Square print masters: transparent PNG or sharpened JPEG at 300 DPI |
//! | [`watermark`] | Faded centered mark, flattened preview JPEGs |
//! | [`slideshow`] | Frame-accurate cover slideshow and looping preview video |
//! | [`encode_ffmpeg`] | Raw RGB frames streamed to the system `ffmpeg` |
//! | [`archive`] | Greedy size-bounded zip bundling |
//! | [`delivery`] | Numbered delivery slots and cross-device moves |
//! | [`stage`] | Stage ids, requests, reports, and the directory contract |
//! | [`runner`] | One-slot background worker for interactive triggers |
//! | [`batch`] | Parallel per-file work with deferred sequential numbering |
//! | [`config`] | `clipart-press.toml` loading, merging, and validation |
//! | [`scan`] | Eligible input listing and directory checks |
//! | [`naming`] | `Prefix-NN` outputs and `N - Title` slot names |
//! | [`imaging`] | Geometry transforms, codecs, caption text |
//! | [`tools`] | External binary resolution and the PNG optimizer |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Exact Frame Counts
//!
//! Videos are planned before any frame is rendered: a [`slideshow::FramePlan`]
//! fixes the rate and the exact number of frames, and the assembler writes
//! that many raw frames to ffmpeg. The cover slideshow uses a rational frame
//! rate (`images / seconds`) instead of per-frame durations, so a twelve-frame
//! video lasts exactly eight seconds.
//!
//! ## Numbering After the Batch
//!
//! Output numbers are assigned only once a whole batch has run, in sorted
//! input order, so a file that fails to decode never leaves a gap.
//!
//! ## Crash-Safe Writes
//!
//! Every deliverable is written to a hidden `.partial` sibling and renamed into
//! place. Partially written files are hidden, so a rerun never picks them up
//! as input.

pub mod archive;
pub mod batch;
pub mod collage;
pub mod config;
pub mod delivery;
pub mod encode_ffmpeg;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod runner;
pub mod scan;
pub mod slideshow;
pub mod stage;
pub mod tools;
pub mod upscale;
pub mod watermark;

#[cfg(test)]
pub(crate) mod test_helpers;
