//! Naming policy for shelf.
//!
//! Upload names are sanitized and made collision-free with `_n`
//! suffixes; rename and move never let a file change its extension.

use std::path::Path;

/// Split a file name into stem and extension (extension keeps its
/// leading dot and original case; empty when absent).
///
/// A leading dot does not start an extension, so `.hidden` is a stem.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Extension of a file name, lowercased, with its leading dot.
/// Empty string when the name has no extension.
pub fn extension_of(name: &str) -> String {
    split_extension(name).1.to_lowercase()
}

/// Strip every character outside `[A-Za-z0-9_-]` from a name stem.
pub fn sanitize_base(stem: &str) -> String {
    stem.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Strip one trailing `_<digits>` counter from a stem, if present.
fn strip_counter(stem: &str) -> &str {
    if let Some(idx) = stem.rfind('_') {
        let digits = &stem[idx + 1..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return &stem[..idx];
        }
    }
    stem
}

/// Compute a collision-free name for a new file in `dir`.
///
/// The sanitized name is used unchanged when free. Otherwise any
/// existing `_<digits>` counter is stripped and `_1`, `_2`, … appended
/// until an unused name is found; the lowest free counter wins.
pub fn unique_name(dir: &Path, requested: &str) -> String {
    let (stem, ext) = split_extension(requested);
    let base = sanitize_base(stem);

    let candidate = format!("{base}{ext}");
    if !dir.join(&candidate).exists() {
        return candidate;
    }

    let base = strip_counter(&base);
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{base}_{n}{ext}");
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Force the original extension onto a requested new name.
///
/// The requested name's own extension is discarded; `original_ext`
/// keeps its verbatim case (including the leading dot, or empty).
pub fn preserve_extension(original_ext: &str, requested: &str) -> String {
    let (stem, _) = split_extension(requested);
    format!("{stem}{original_ext}")
}
