//! Shelf - Server-side file management backend
//!
//! A connector backend for web file-browser clients: listing,
//! metadata, upload, download, rename, move, and delete, all confined
//! to a single root directory.

pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use error::{Result, ShelfError};
pub use file::{Classifier, Confined, Download, FileManager, PathGuard, Upload};
pub use web::WebServer;
