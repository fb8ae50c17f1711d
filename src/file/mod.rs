//! File management core: path confinement, entry classification,
//! naming policy, the operation executor, and the wire records it
//! produces.

pub mod entry;
pub mod guard;
pub mod naming;
pub mod ops;
pub mod response;

pub use entry::{Classifier, Entry, EntryKind};
pub use guard::{Confined, PathGuard};
pub use ops::{Download, FileManager, Upload};
pub use response::{FailureRecord, FolderListing};
