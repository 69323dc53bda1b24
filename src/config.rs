use std::path::{Path, PathBuf};

use crate::constants::storage::{DEFAULT_STORE_DIR, DEFAULT_STORE_FILENAME};
use crate::namespace::Namespace;

/// Size policy applied to share tokens on export and import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShareLimits {
    /// Maximum token length in characters (`None` = unlimited).
    pub max_token_len: Option<usize>,
}

impl ShareLimits {
    /// No cap; tokens of any length are accepted.
    pub const UNLIMITED: ShareLimits = ShareLimits {
        max_token_len: None,
    };

    /// Cap tokens at `max_token_len` characters.
    pub fn with_max_token_len(max_token_len: usize) -> Self {
        Self {
            max_token_len: Some(max_token_len),
        }
    }
}

/// Viewer session configuration.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Token size policy.
    pub limits: ShareLimits,
    /// Namespace used when the store has no remembered active namespace.
    pub default_namespace: Namespace,
    /// Path of the file-backed store used by the CLI runners.
    pub store_path: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            limits: ShareLimits::UNLIMITED,
            default_namespace: Namespace::default(),
            store_path: Path::new(DEFAULT_STORE_DIR).join(DEFAULT_STORE_FILENAME),
        }
    }
}

impl ViewerConfig {
    /// Replace the token size policy.
    pub fn with_limits(mut self, limits: ShareLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Namespace to open when none is remembered.
    pub fn with_default_namespace(mut self, namespace: Namespace) -> Self {
        self.default_namespace = namespace;
        self
    }

    /// Store file used by the CLI runners.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }
}
