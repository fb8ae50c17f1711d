//! Entry classification for shelf.
//!
//! Resolves a filesystem object into an [`Entry`] (kind, extension,
//! timestamps, size, image dimensions) and selects the preview
//! reference a file-browser client renders for it.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use super::naming;
use crate::Result;

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Resolved metadata for an existing filesystem object.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Display name (final path component).
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Lowercased extension with leading dot; empty for directories
    /// and extension-less files.
    pub extension: String,
    /// Creation time; falls back to the modification time on
    /// platforms without birth-time support.
    pub created: DateTime<Local>,
    /// Last modification time.
    pub modified: DateTime<Local>,
    /// Size in bytes; 0 for directories.
    pub size: u64,
    /// Image width in pixels; 0 unless a decodable image.
    pub width: u32,
    /// Image height in pixels; 0 unless a decodable image.
    pub height: u32,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Display type tag: `dir` for directories, otherwise the
    /// extension without its leading dot.
    pub fn file_type(&self) -> String {
        if self.is_dir() {
            "dir".to_string()
        } else {
            self.extension.trim_start_matches('.').to_string()
        }
    }
}

/// Classifies entries and selects preview icons.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// URL prefix used in Preview values.
    icon_url: String,
    /// On-disk directory for the per-extension icon lookup.
    icon_dir: PathBuf,
    /// Lowercased image extensions (with leading dot).
    image_exts: HashSet<String>,
}

impl Classifier {
    pub fn new(icon_url: &str, icon_dir: impl Into<PathBuf>, image_extensions: &[String]) -> Self {
        Self {
            icon_url: icon_url.to_string(),
            icon_dir: icon_dir.into(),
            image_exts: image_extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Whether a file name carries an image extension.
    pub fn is_image_name(&self, name: &str) -> bool {
        self.image_exts.contains(&naming::extension_of(name))
    }

    /// Whether an entry is an image file.
    pub fn is_image(&self, entry: &Entry) -> bool {
        !entry.is_dir() && self.image_exts.contains(&entry.extension)
    }

    /// Classify an existing filesystem object.
    ///
    /// Kind comes from filesystem attributes, never from the
    /// extension. Image dimension probing is best-effort: an
    /// undecodable image degrades to 0x0 instead of failing.
    pub fn classify(&self, path: &Path) -> Result<Entry> {
        let meta = fs::metadata(path)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        let extension = if kind == EntryKind::Directory {
            String::new()
        } else {
            naming::extension_of(&name)
        };

        let modified_sys = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let created_sys = meta.created().unwrap_or(modified_sys);

        let (width, height) = if kind == EntryKind::File && self.image_exts.contains(&extension) {
            image::image_dimensions(path).unwrap_or((0, 0))
        } else {
            (0, 0)
        };

        Ok(Entry {
            path: path.to_path_buf(),
            name,
            kind,
            extension,
            created: DateTime::<Local>::from(created_sys),
            modified: DateTime::<Local>::from(modified_sys),
            size: if kind == EntryKind::Directory { 0 } else { meta.len() },
            width,
            height,
        })
    }

    /// Preview reference for an entry at the given virtual path.
    ///
    /// Directories use the fixed open-folder icon. Images reference
    /// their own path with an mtime-derived cache-buster. Other files
    /// use `<icon_url><ext>.png` when that icon exists on disk,
    /// falling back to `<icon_url>default.png`.
    pub fn preview(&self, entry: &Entry, virtual_path: &str) -> String {
        if entry.is_dir() {
            return format!("{}_Open.png", self.icon_url);
        }
        if self.is_image(entry) {
            return format!("{}?{}", virtual_path, entry.modified.timestamp_millis());
        }

        let tag = entry.file_type();
        if !tag.is_empty() && self.icon_dir.join(format!("{tag}.png")).is_file() {
            format!("{}{}.png", self.icon_url, tag)
        } else {
            format!("{}default.png", self.icon_url)
        }
    }
}
