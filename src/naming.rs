//! Centralized naming conventions.
//!
//! Two conventions live here so every stage agrees on them:
//!
//! ## Sequential outputs
//!
//! Batch outputs are renamed to `{prefix}-NN` in sorted input order, zero-padded
//! to two digits so lexical order matches numeric order for typical listings:
//! - `Clipart-01.png`, `Clipart-02.jpg` (masters)
//! - `Preview-01.jpg` (watermarked previews)
//! - `lets-get-boho-01.zip` (archives)
//!
//! ## Delivery slots
//!
//! Delivery folders are named `{N} - {Title}`: a decimal number, a space, a
//! dash, a space, then free text. Anything else in the destination root is
//! ignored when allocating the next number.
//! - `"7 - Boho Florals"` → number=7, title="Boho Florals"
//! - `"12 - "` → number=12, title=""
//! - `"7-Boho"`, `"Archive"` → not a slot

/// `{prefix}-{index:02}{extension}`; `extension` includes its dot or is empty.
pub fn numbered_name(prefix: &str, index: usize, extension: &str) -> String {
    format!("{prefix}-{index:02}{extension}")
}

/// Result of parsing a delivery slot folder name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSlot {
    pub number: u32,
    pub title: String,
}

/// Parse a `{N} - {Title}` folder name.
pub fn parse_slot_name(name: &str) -> Option<ParsedSlot> {
    let digits_end = name
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    if digits_end == 0 {
        return None;
    }
    let rest = name[digits_end..].strip_prefix(" - ")?;
    let number = name[..digits_end].parse::<u32>().ok()?;
    Some(ParsedSlot {
        number,
        title: rest.to_string(),
    })
}

/// `{number} - {title}`
pub fn slot_name(number: u32, title: &str) -> String {
    format!("{number} - {title}")
}

/// True when `name` can be used as a single path component: non-empty, no
/// path separators, not `.` or `..`.
pub fn is_plain_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && !name.contains(['/', '\\']) && trimmed != "." && trimmed != ".."
}

/// Drop a trailing `-NN` sequence number: `Clipart-03` → `Clipart`.
pub fn strip_sequence_suffix(stem: &str) -> &str {
    match stem.rsplit_once('-') {
        Some((head, digits))
            if !head.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            head
        }
        _ => stem,
    }
}

/// Display title from a file stem: dashes and underscores become spaces,
/// then each word is capitalized with the rest lowercased.
///
/// - `"lets-get-boho"` → `"Lets Get Boho"`
/// - `"WATERCOLOR_flowers"` → `"Watercolor Flowers"`
pub fn title_from_stem(stem: &str) -> String {
    let spaced = stem.replace(['-', '_'], " ");
    let mut out = String::with_capacity(spaced.len());
    let mut word_start = true;
    for c in spaced.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
