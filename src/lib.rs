#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Share-token encoding and decoding.
pub mod codec;
/// Viewer configuration types.
pub mod config;
/// Centralized constants used across ingestion, sharing, and storage.
pub mod constants;
/// Product record and record set types.
pub mod data;
/// Reusable example runners shared by downstream crates.
pub mod example_apps;
/// Spreadsheet upload parsing.
pub mod ingestion;
/// Inbound link parsing and outbound share URLs.
pub mod link;
/// Department namespaces.
pub mod namespace;
/// Curriculum completion tracking.
pub mod progress;
/// Viewer session orchestration.
pub mod session;
/// Per-namespace persisted state.
pub mod state;
/// Key-value persistence backends.
pub mod store;
/// Shared type aliases.
pub mod types;
/// Text normalization helpers.
pub mod utils;

mod errors;

pub use codec::{ShareToken, export, import, import_legacy};
pub use config::{ShareLimits, ViewerConfig};
pub use data::{CellText, ProductRecord, RecordSet};
pub use errors::TransferError;
pub use ingestion::{UploadFormat, parse_upload, parse_upload_file};
pub use link::{InboundLink, share_url};
pub use namespace::Namespace;
pub use progress::{Curriculum, TrainingProgress};
pub use session::{Notice, NoticeLevel, RecordOrigin, UploadOutcome, UploadStatus, ViewerSession};
pub use state::{LocalState, PersistedNamespace, resolve_selection};
pub use store::{FileStore, MemoryStore, PersistenceStore};
