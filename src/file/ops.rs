//! Operation executor for shelf.
//!
//! [`FileManager`] implements the connector operations over the
//! confined root. Every operation validates all involved paths through
//! the guard before touching the filesystem, so a failed precondition
//! never leaves a partial effect behind.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::entry::Entry;
use super::guard::{Confined, PathGuard};
use super::naming;
use super::response::{
    format_time, AddFolderRecord, DeleteRecord, EntryRecord, FolderListing, Properties,
    TransferRecord, UploadRecord, NO_ERROR,
};
use super::Classifier;
use crate::config::StorageConfig;
use crate::{Result, ShelfError};

/// An uploaded file as received from the transport.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name.
    pub filename: String,
    /// Full file content.
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    fn is_missing(&self) -> bool {
        self.filename.is_empty() || self.content.is_empty()
    }
}

/// Payload returned by the download operation.
#[derive(Debug, Clone)]
pub struct Download {
    /// Suggested file name for the client.
    pub filename: String,
    /// File bytes.
    pub content: Vec<u8>,
}

/// Executes file manager operations confined to a single root.
///
/// Built once from the resolved configuration and shared immutably;
/// concurrent operations on the same path are not serialized here.
#[derive(Debug, Clone)]
pub struct FileManager {
    guard: PathGuard,
    classifier: Classifier,
    /// Lowercased extensions (with leading dot) allowed for uploads.
    allowed_exts: HashSet<String>,
}

impl FileManager {
    /// Create a file manager from the storage configuration.
    ///
    /// The root directory is created if missing, then canonicalized.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        fs::create_dir_all(&config.root)?;
        let guard = PathGuard::new(&config.root)?;
        let classifier = Classifier::new(
            &config.icon_url,
            Path::new(&config.icon_dir),
            &config.image_extensions,
        );
        let allowed_exts = config
            .allowed_extensions
            .iter()
            .map(|e| e.to_lowercase())
            .collect();

        Ok(Self {
            guard,
            classifier,
            allowed_exts,
        })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// Confine a client path, mapping rejection to an
    /// operation-specific message.
    fn confine(&self, client_path: &str, reject_msg: &str) -> Result<Confined> {
        self.guard.confine(client_path).map_err(|e| match e {
            ShelfError::PathRejected(_) => ShelfError::PathRejected(reject_msg.to_string()),
            other => other,
        })
    }

    /// Build the wire record for a classified entry.
    ///
    /// `path_field` is what goes into the record's Path key (directory
    /// listings add a trailing slash there); `virtual_path` is used for
    /// the image preview reference.
    fn record_for(&self, entry: &Entry, virtual_path: &str, path_field: String) -> EntryRecord {
        let preview = self.classifier.preview(entry, virtual_path);
        let (height, width) = if entry.is_dir() {
            (Some(0), Some(0))
        } else if self.classifier.is_image(entry) {
            (Some(entry.height), Some(entry.width))
        } else {
            (None, None)
        };

        EntryRecord {
            path: path_field,
            filename: entry.name.clone(),
            file_type: entry.file_type(),
            preview,
            properties: Properties {
                date_created: format_time(&entry.created),
                date_modified: format_time(&entry.modified),
                height,
                width,
                size: entry.size,
            },
            error: String::new(),
            code: 0,
        }
    }

    /// getinfo: metadata record for an existing file or directory.
    pub fn get_info(&self, path: &str) -> Result<EntryRecord> {
        let target = self.confine(path, "Attempt to view file outside root path")?;
        if !target.real.exists() {
            return Err(ShelfError::NotFound("File".to_string()));
        }

        let entry = self.classifier.classify(&target.real)?;
        Ok(self.record_for(&entry, &target.virtual_path, target.virtual_path.clone()))
    }

    /// getfolder: immediate children of a directory, directories
    /// before files, each group in directory-read order.
    pub fn get_folder(&self, path: &str) -> Result<FolderListing> {
        let target = self.confine(path, "Attempt to view files outside root path")?;
        if !target.real.is_dir() {
            return Err(ShelfError::NotFound("Directory".to_string()));
        }

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for dirent in fs::read_dir(&target.real)? {
            let dirent = dirent?;
            let name = dirent.file_name().to_string_lossy().into_owned();
            if dirent.file_type()?.is_dir() {
                dirs.push(name);
            } else {
                files.push(name);
            }
        }

        // A child whose metadata cannot be read (dangling symlink,
        // permission denied) is skipped, never fails the listing.
        let mut listing = FolderListing::default();
        for name in dirs {
            let child = target.child(&name);
            match self.classifier.classify(&target.real.join(&name)) {
                Ok(entry) => {
                    let record = self.record_for(&entry, &child, format!("{child}/"));
                    listing.push(child, record);
                }
                Err(e) => tracing::warn!(path = %child, error = %e, "skipping unreadable entry"),
            }
        }
        for name in files {
            let child = target.child(&name);
            match self.classifier.classify(&target.real.join(&name)) {
                Ok(entry) => {
                    let record = self.record_for(&entry, &child, child.clone());
                    listing.push(child, record);
                }
                Err(e) => tracing::warn!(path = %child, error = %e, "skipping unreadable entry"),
            }
        }

        Ok(listing)
    }

    /// addfolder: create a new directory under `path`.
    pub fn add_folder(&self, path: &str, name: &str) -> Result<AddFolderRecord> {
        let parent = self.confine(path, "Attempt to add folder outside root path")?;
        if !parent.real.is_dir() {
            return Err(ShelfError::NotFound("Directory".to_string()));
        }

        let target = self.confine(
            &parent.child(name),
            "Attempt to add folder outside root path",
        )?;
        if target.real.exists() {
            return Err(ShelfError::AlreadyExists("Folder already exists.".to_string()));
        }

        fs::create_dir(&target.real)?;

        Ok(AddFolderRecord {
            parent: parent.virtual_path,
            name: target.name().to_string(),
            error: NO_ERROR.to_string(),
            code: 0,
        })
    }

    /// delete: remove a file, or a directory with its entire subtree.
    pub fn delete(&self, path: &str) -> Result<DeleteRecord> {
        let target = self.confine(path, "Attempt to delete file outside root path")?;
        if target.is_root() {
            return Err(ShelfError::PathRejected(
                "Attempt to delete root path".to_string(),
            ));
        }
        if !target.real.exists() {
            return Err(ShelfError::NotFound("File".to_string()));
        }

        if target.real.is_dir() {
            fs::remove_dir_all(&target.real)?;
        } else {
            fs::remove_file(&target.real)?;
        }

        Ok(DeleteRecord {
            error: NO_ERROR.to_string(),
            code: 0,
            path: target.virtual_path,
        })
    }

    /// rename: give an entry a new name within its parent directory.
    ///
    /// Files keep their original extension; only the final path
    /// segment of the requested name is used.
    pub fn rename(&self, old: &str, new_name: &str) -> Result<TransferRecord> {
        let source = self.confine(old, "Attempt to modify file outside root path")?;
        if source.is_root() {
            return Err(ShelfError::PathRejected(
                "Attempt to modify file outside root path".to_string(),
            ));
        }
        if !source.real.exists() {
            return Err(ShelfError::NotFound("File".to_string()));
        }

        let new_name = new_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(new_name)
            .to_string();
        let final_name = if source.real.is_dir() {
            new_name
        } else {
            let (_, ext) = naming::split_extension(source.name());
            naming::preserve_extension(ext, &new_name)
        };

        let parent = self.confine(
            &source.parent_virtual(),
            "Attempt to modify file outside root path",
        )?;
        let dest = self.confine(
            &parent.child(&final_name),
            "Attempt to modify file outside root path",
        )?;
        if dest.real.exists() {
            return Err(ShelfError::AlreadyExists(
                "A file or folder with that name already exists.".to_string(),
            ));
        }

        fs::rename(&source.real, &dest.real)?;

        Ok(TransferRecord {
            error: NO_ERROR.to_string(),
            code: 0,
            old_path: source.virtual_path.clone(),
            old_name: source.name().to_string(),
            new_path: dest.virtual_path.clone(),
            new_name: dest.name().to_string(),
        })
    }

    /// move: relocate an entry into the directory `new_root` +
    /// `new_dir`. Directories move into `<dest>/<name>`; files keep
    /// their source extension.
    pub fn move_item(&self, old: &str, new_root: &str, new_dir: &str) -> Result<TransferRecord> {
        let source = self.confine(old, "Attempt to modify file outside root path")?;
        if source.is_root() {
            return Err(ShelfError::PathRejected(
                "Attempt to modify file outside root path".to_string(),
            ));
        }
        if !source.real.exists() {
            return Err(ShelfError::NotFound("File".to_string()));
        }

        let dest_dir = self.confine(
            &format!("{new_root}/{new_dir}"),
            "Attempt to move a file outside root path",
        )?;
        if !dest_dir.real.is_dir() {
            return Err(ShelfError::NotFound("Directory".to_string()));
        }

        let final_name = if source.real.is_dir() {
            source.name().to_string()
        } else {
            let (_, ext) = naming::split_extension(source.name());
            naming::preserve_extension(ext, source.name())
        };

        let dest = self.confine(
            &dest_dir.child(&final_name),
            "Attempt to move a file outside root path",
        )?;
        if dest.real.exists() {
            return Err(ShelfError::AlreadyExists(
                "A file or folder with that name already exists.".to_string(),
            ));
        }

        fs::rename(&source.real, &dest.real)?;

        Ok(TransferRecord {
            error: NO_ERROR.to_string(),
            code: 0,
            old_path: source.virtual_path.clone(),
            old_name: source.name().to_string(),
            new_path: dest.virtual_path.clone(),
            new_name: dest.name().to_string(),
        })
    }

    /// add: store an uploaded file in `current_path` under a
    /// collision-free name.
    pub fn add_file(&self, current_path: &str, upload: &Upload) -> Result<UploadRecord> {
        if upload.is_missing() {
            return Err(ShelfError::InvalidUpload("No file provided.".to_string()));
        }

        let dir = self.confine(current_path, "Attempt to add file outside root path")?;
        if !dir.real.is_dir() {
            return Err(ShelfError::NotFound("Directory".to_string()));
        }

        let ext = naming::extension_of(&upload.filename);
        if !self.allowed_exts.contains(&ext) {
            return Err(ShelfError::InvalidUpload(
                "Uploaded file type is not allowed.".to_string(),
            ));
        }

        let stored_name = naming::unique_name(&dir.real, &upload.filename);
        fs::write(dir.real.join(&stored_name), &upload.content)?;

        Ok(UploadRecord {
            path: dir.virtual_path,
            name: stored_name,
            error: NO_ERROR.to_string(),
            code: 0,
        })
    }

    /// replace: overwrite an existing file's bytes with an upload of
    /// the same extension.
    pub fn replace_file(&self, new_file_path: &str, upload: &Upload) -> Result<UploadRecord> {
        if upload.is_missing() {
            return Err(ShelfError::InvalidUpload("No file provided.".to_string()));
        }

        let target = self.confine(new_file_path, "Attempt to replace file outside root path")?;

        let upload_ext = naming::extension_of(&upload.filename);
        if !self.allowed_exts.contains(&upload_ext) {
            return Err(ShelfError::InvalidUpload(
                "Uploaded file type is not allowed.".to_string(),
            ));
        }
        if upload_ext != naming::extension_of(target.name()) {
            return Err(ShelfError::InvalidUpload(
                "Replacement file must have the same extension as the file being replaced."
                    .to_string(),
            ));
        }
        if !target.real.is_file() {
            return Err(ShelfError::NotFound("File to replace".to_string()));
        }

        fs::write(&target.real, &upload.content)?;

        Ok(UploadRecord {
            path: target.parent_virtual(),
            name: target.name().to_string(),
            error: NO_ERROR.to_string(),
            code: 0,
        })
    }

    /// download: file bytes plus the suggested client-side name.
    pub fn download(&self, path: &str) -> Result<Download> {
        let target = self.confine(path, "Attempt to view file outside root path")?;
        if !target.real.is_file() {
            return Err(ShelfError::NotFound("File".to_string()));
        }

        let content = fs::read(&target.real)?;
        Ok(Download {
            filename: target.name().to_string(),
            content,
        })
    }
}
