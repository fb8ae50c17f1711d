//! Path confinement for shelf.
//!
//! Every client-supplied path passes through [`PathGuard::confine`]
//! before any filesystem call. Confinement collapses `.` and `..`
//! segments lexically, then re-checks existing paths against the
//! canonical root so a symlink cannot smuggle an operation outside it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, ShelfError};

/// A client path resolved and confined to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confined {
    /// Absolute path on disk, guaranteed to lie under the root.
    pub real: PathBuf,
    /// Normalized client-visible path. `/` denotes the root itself.
    pub virtual_path: String,
}

impl Confined {
    /// Final component of the virtual path (empty for the root).
    pub fn name(&self) -> &str {
        self.virtual_path.rsplit('/').next().unwrap_or("")
    }

    /// Virtual path of the parent directory.
    pub fn parent_virtual(&self) -> String {
        match self.virtual_path.rfind('/') {
            Some(0) | None => "/".to_string(),
            Some(idx) => self.virtual_path[..idx].to_string(),
        }
    }

    /// Virtual path of a direct child.
    pub fn child(&self, name: &str) -> String {
        if self.virtual_path == "/" {
            format!("/{name}")
        } else {
            format!("{}/{}", self.virtual_path, name)
        }
    }

    /// Whether this confined path denotes the root itself.
    pub fn is_root(&self) -> bool {
        self.virtual_path == "/"
    }
}

/// Guards a single filesystem root against path escapes.
#[derive(Debug, Clone)]
pub struct PathGuard {
    /// Canonicalized root directory.
    root: PathBuf,
}

impl PathGuard {
    /// Create a guard for the given root directory.
    ///
    /// The root must exist; it is canonicalized once so later
    /// containment checks compare against a stable form.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = fs::canonicalize(root.as_ref())
            .map_err(|e| ShelfError::Config(format!("cannot resolve root directory: {e}")))?;
        if !root.is_dir() {
            return Err(ShelfError::Config(
                "root path is not a directory".to_string(),
            ));
        }
        Ok(Self { root })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a client path against the root, rejecting escapes.
    ///
    /// Both `/` and `\` are accepted as separators on input. A `..`
    /// that would climb past the root is rejected. The returned
    /// virtual path always uses `/`.
    pub fn confine(&self, client_path: &str) -> Result<Confined> {
        let mut parts: Vec<&str> = Vec::new();
        for seg in client_path.split(['/', '\\']) {
            match seg {
                "" | "." => {}
                ".." => {
                    if parts.pop().is_none() {
                        return Err(ShelfError::PathRejected("outside root".to_string()));
                    }
                }
                _ => parts.push(seg),
            }
        }

        let mut real = self.root.clone();
        for part in &parts {
            real.push(part);
        }

        // Lexical collapse already prevents `..` escapes; for paths that
        // exist, canonicalize to also catch symlinks pointing outside.
        if real.exists() {
            let canonical = fs::canonicalize(&real)?;
            if !canonical.starts_with(&self.root) {
                return Err(ShelfError::PathRejected("outside root".to_string()));
            }
        }

        let virtual_path = format!("/{}", parts.join("/"));
        Ok(Confined { real, virtual_path })
    }
}
