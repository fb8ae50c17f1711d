//! Wire records for the connector API.
//!
//! Key names and their order are fixed for compatibility with existing
//! file-browser clients; struct field order is what goes on the wire.
//! Upload responses are additionally wrapped in a `<textarea>` block
//! for legacy form-upload transports.

use chrono::{DateTime, Local};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::ShelfError;

/// Success marker used by mutating operations.
pub const NO_ERROR: &str = "No error";

/// Render a timestamp for the wire.
pub fn format_time(t: &DateTime<Local>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Nested properties block of an entry record.
///
/// Height and Width are omitted for non-image files; directories
/// report them as 0.
#[derive(Debug, Clone, Serialize)]
pub struct Properties {
    #[serde(rename = "Date Created")]
    pub date_created: String,
    #[serde(rename = "Date Modified")]
    pub date_modified: String,
    #[serde(rename = "Height", skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(rename = "Width", skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(rename = "Size")]
    pub size: u64,
}

/// Record describing a single entry (getinfo and getfolder values).
#[derive(Debug, Clone, Serialize)]
pub struct EntryRecord {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "File Type")]
    pub file_type: String,
    #[serde(rename = "Preview")]
    pub preview: String,
    #[serde(rename = "Properties")]
    pub properties: Properties,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Code")]
    pub code: i32,
}

/// getfolder response: child virtual path -> entry record, directories
/// first, each group in directory-read order.
#[derive(Debug, Clone, Default)]
pub struct FolderListing {
    entries: Vec<(String, EntryRecord)>,
}

impl FolderListing {
    pub fn push(&mut self, path: String, record: EntryRecord) {
        self.entries.push((path, record));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, EntryRecord)> {
        self.entries.iter()
    }
}

impl Serialize for FolderListing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, record) in &self.entries {
            map.serialize_entry(path, record)?;
        }
        map.end()
    }
}

/// addfolder success record.
#[derive(Debug, Clone, Serialize)]
pub struct AddFolderRecord {
    #[serde(rename = "Parent")]
    pub parent: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Code")]
    pub code: i32,
}

/// delete success record.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRecord {
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Code")]
    pub code: i32,
    #[serde(rename = "Path")]
    pub path: String,
}

/// move/rename success record.
#[derive(Debug, Clone, Serialize)]
pub struct TransferRecord {
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Code")]
    pub code: i32,
    #[serde(rename = "Old Path")]
    pub old_path: String,
    #[serde(rename = "Old Name")]
    pub old_name: String,
    #[serde(rename = "New Path")]
    pub new_path: String,
    #[serde(rename = "New Name")]
    pub new_name: String,
}

/// add/replace success record (textarea-wrapped on the wire).
#[derive(Debug, Clone, Serialize)]
pub struct UploadRecord {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Code")]
    pub code: i32,
}

/// Failure record for any operation.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Code")]
    pub code: i32,
}

impl FailureRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: -1,
        }
    }
}

impl From<&ShelfError> for FailureRecord {
    fn from(err: &ShelfError) -> Self {
        Self::new(err.to_string())
    }
}

/// Wrap a JSON body for legacy form-upload transports.
pub fn textarea_wrap(json: &str) -> String {
    format!("<textarea>{json}</textarea>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_properties(dims: Option<(u32, u32)>) -> Properties {
        Properties {
            date_created: "2024-01-02 03:04:05".to_string(),
            date_modified: "2024-01-02 03:04:06".to_string(),
            height: dims.map(|d| d.1),
            width: dims.map(|d| d.0),
            size: 42,
        }
    }

    #[test]
    fn test_entry_record_key_order() {
        let record = EntryRecord {
            path: "/a.png".to_string(),
            filename: "a.png".to_string(),
            file_type: "png".to_string(),
            preview: "/a.png?1".to_string(),
            properties: sample_properties(Some((640, 480))),
            error: String::new(),
            code: 0,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Path":"/a.png","Filename":"a.png","File Type":"png","Preview":"/a.png?1","Properties":{"Date Created":"2024-01-02 03:04:05","Date Modified":"2024-01-02 03:04:06","Height":480,"Width":640,"Size":42},"Error":"","Code":0}"#
        );
    }

    #[test]
    fn test_properties_omit_dimensions() {
        let json = serde_json::to_string(&sample_properties(None)).unwrap();
        assert!(!json.contains("Height"));
        assert!(!json.contains("Width"));
        assert!(json.contains("\"Size\":42"));
    }

    #[test]
    fn test_folder_listing_preserves_order() {
        let mut listing = FolderListing::default();
        for name in ["/z", "/a", "/m"] {
            listing.push(
                name.to_string(),
                EntryRecord {
                    path: name.to_string(),
                    filename: name.trim_start_matches('/').to_string(),
                    file_type: "dir".to_string(),
                    preview: "/icons/_Open.png".to_string(),
                    properties: sample_properties(Some((0, 0))),
                    error: String::new(),
                    code: 0,
                },
            );
        }

        let json = serde_json::to_string(&listing).unwrap();
        let z = json.find("\"/z\"").unwrap();
        let a = json.find("\"/a\"").unwrap();
        let m = json.find("\"/m\"").unwrap();
        assert!(z < a && a < m);
    }

    #[test]
    fn test_transfer_record_key_order() {
        let record = TransferRecord {
            error: NO_ERROR.to_string(),
            code: 0,
            old_path: "/a/old.txt".to_string(),
            old_name: "old.txt".to_string(),
            new_path: "/a/new.txt".to_string(),
            new_name: "new.txt".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Error":"No error","Code":0,"Old Path":"/a/old.txt","Old Name":"old.txt","New Path":"/a/new.txt","New Name":"new.txt"}"#
        );
    }

    #[test]
    fn test_delete_record_key_order() {
        let record = DeleteRecord {
            error: NO_ERROR.to_string(),
            code: 0,
            path: "/gone.txt".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Error":"No error","Code":0,"Path":"/gone.txt"}"#);
    }

    #[test]
    fn test_failure_record() {
        let err = ShelfError::NotFound("File".to_string());
        let record = FailureRecord::from(&err);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Error":"File not found","Code":-1}"#);
    }

    #[test]
    fn test_textarea_wrap() {
        assert_eq!(textarea_wrap("{}"), "<textarea>{}</textarea>");
    }
}
