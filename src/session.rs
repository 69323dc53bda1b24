//! Viewer session: the page-load resolution sequence and every user action
//! that mutates per-namespace state.
//!
//! Construction runs the full load sequence (share token, then legacy query
//! payload, then local state) before returning, so no mutation can reach a
//! namespace whose initial state has not settled. Failures never escape a
//! session method; they become [`Notice`]s, and persistence failures are
//! logged while the in-memory state stays authoritative.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::codec;
use crate::config::ViewerConfig;
use crate::constants::notices::{READ_ONLY, SHARED_LOAD_FAILED, SHARE_READY, UPLOAD_FAILED};
use crate::data::{ProductRecord, RecordSet};
use crate::errors::TransferError;
use crate::ingestion::{UploadFormat, parse_upload};
use crate::link::{InboundLink, share_url};
use crate::namespace::Namespace;
use crate::state::{LocalState, resolve_selection};
use crate::store::PersistenceStore;
use crate::types::NoticeText;

/// Upload state shown next to the product list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UploadStatus {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// A record set is loaded.
    Uploaded,
    /// The most recent upload failed; previous records are retained.
    Error,
}

/// Severity of a [`Notice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Neutral information.
    Info,
    /// An action succeeded.
    Success,
    /// An action failed.
    Error,
}

/// Non-blocking, user-visible message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub message: NoticeText,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<NoticeText>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Where a namespace's current record set came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOrigin {
    /// Nothing loaded.
    Empty,
    /// Restored from local state.
    Local,
    /// Imported from a `#data=` token.
    ShareToken,
    /// Imported from a legacy `?data=` payload.
    LegacyQuery,
    /// Parsed from an upload in this session.
    Upload,
}

/// Handle for an upload in flight; only the latest issued ticket may apply.
///
/// The ticket is bound to the namespace that was active when it was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadTicket {
    seq: u64,
    namespace: Namespace,
}

impl UploadTicket {
    /// Namespace the upload will replace.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }
}

/// Result of completing an upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The record set was replaced with this many records.
    Loaded(usize),
    /// A later upload was started; this result was discarded.
    Superseded,
    /// Parsing failed or the session is read-only; nothing changed.
    Rejected,
}

#[derive(Clone, Debug)]
struct NamespaceView {
    records: RecordSet,
    selected: Option<usize>,
    status: UploadStatus,
    origin: RecordOrigin,
}

static EMPTY_VIEW: NamespaceView = NamespaceView {
    records: RecordSet::empty(),
    selected: None,
    status: UploadStatus::Idle,
    origin: RecordOrigin::Empty,
};

impl Default for NamespaceView {
    fn default() -> Self {
        EMPTY_VIEW.clone()
    }
}

impl NamespaceView {
    fn replaced(records: RecordSet, origin: RecordOrigin) -> Self {
        let selected = resolve_selection(&records, None);
        Self {
            records,
            selected,
            status: UploadStatus::Uploaded,
            origin,
        }
    }
}

/// Interactive viewer state over an injected [`PersistenceStore`].
pub struct ViewerSession {
    config: ViewerConfig,
    state: LocalState,
    trainee_mode: bool,
    active: Namespace,
    views: HashMap<Namespace, NamespaceView>,
    notices: Vec<Notice>,
    issued_uploads: u64,
}

impl ViewerSession {
    /// Resolve initial state for the active namespace.
    ///
    /// An inbound `#data=` token wins over everything; the legacy `?data=`
    /// payload is consulted only when no token is present. A successful
    /// import replaces the namespace's records and becomes its persisted
    /// baseline; a failed one raises an error notice and falls back to local
    /// state.
    pub fn bootstrap(
        config: ViewerConfig,
        store: Arc<dyn PersistenceStore>,
        link: InboundLink,
    ) -> Self {
        let state = LocalState::new(store);
        let active = match state.load_active_namespace() {
            Ok(Some(namespace)) => namespace,
            Ok(None) => config.default_namespace,
            Err(err) => {
                warn!("[salesdeck:session] ignoring stored active namespace: {err}");
                config.default_namespace
            }
        };
        let mut session = Self {
            config,
            state,
            trainee_mode: link.trainee_mode,
            active,
            views: HashMap::new(),
            notices: Vec::new(),
            issued_uploads: 0,
        };

        let shared = if let Some(token) = link.fragment_token.as_deref() {
            Some((
                codec::import(token, session.config.limits),
                RecordOrigin::ShareToken,
            ))
        } else {
            link.legacy_payload
                .as_deref()
                .map(|payload| (codec::import_legacy(payload), RecordOrigin::LegacyQuery))
        };

        match shared {
            Some((Ok(records), origin)) => {
                info!(
                    "[salesdeck:session] loaded {} shared records into {active} from {origin:?}",
                    records.len()
                );
                session.replace_records(active, records, origin);
            }
            Some((Err(err), origin)) => {
                warn!("[salesdeck:session] failed to load shared data from {origin:?}: {err}");
                session.notify(NoticeLevel::Error, SHARED_LOAD_FAILED);
                session.ensure_loaded(active);
            }
            None => session.ensure_loaded(active),
        }
        session
    }

    /// Configuration the session was opened with.
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Read-only presentation (`?mode=trainee`).
    pub fn is_trainee(&self) -> bool {
        self.trainee_mode
    }

    /// Namespace currently shown.
    pub fn active_namespace(&self) -> Namespace {
        self.active
    }

    /// Records of the active namespace.
    pub fn records(&self) -> &RecordSet {
        &self.view().records
    }

    /// Selected product of the active namespace.
    pub fn selected(&self) -> Option<&ProductRecord> {
        let view = self.view();
        view.selected.and_then(|idx| view.records.get(idx))
    }

    /// Upload status of the active namespace.
    pub fn status(&self) -> UploadStatus {
        self.view().status
    }

    /// Where the active namespace's records came from.
    pub fn origin(&self) -> RecordOrigin {
        self.view().origin
    }

    /// Products in the active namespace whose name or definition contains `term`.
    pub fn search<'a>(&'a self, term: &'a str) -> Vec<&'a ProductRecord> {
        self.records().search(term).collect()
    }

    /// Take all pending notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Select the first product named `name`; returns false if absent.
    pub fn select(&mut self, name: &str) -> bool {
        let active = self.active;
        let view = self.view_mut();
        let Some(idx) = view.records.position_of(name) else {
            return false;
        };
        view.selected = Some(idx);
        self.persist(active, |state| state.save_selection(active, name));
        true
    }

    /// Make `namespace` active, loading it from local state on first use.
    pub fn switch_namespace(&mut self, namespace: Namespace) {
        if namespace == self.active {
            return;
        }
        self.active = namespace;
        self.persist(namespace, |state| state.save_active_namespace(namespace));
        self.ensure_loaded(namespace);
    }

    /// Start an upload into the active namespace; completing any earlier
    /// ticket afterwards is a no-op.
    pub fn begin_upload(&mut self) -> UploadTicket {
        self.issued_uploads += 1;
        UploadTicket {
            seq: self.issued_uploads,
            namespace: self.active,
        }
    }

    /// Apply a finished upload if `ticket` is still the latest one issued.
    ///
    /// Records land in the ticket's namespace even if another namespace has
    /// become active since.
    pub fn complete_upload(
        &mut self,
        ticket: UploadTicket,
        bytes: &[u8],
        format: UploadFormat,
    ) -> UploadOutcome {
        if self.trainee_mode {
            self.notify(NoticeLevel::Error, READ_ONLY);
            return UploadOutcome::Rejected;
        }
        if ticket.seq != self.issued_uploads {
            info!(
                "[salesdeck:session] discarding upload {} superseded by {}",
                ticket.seq, self.issued_uploads
            );
            return UploadOutcome::Superseded;
        }
        match parse_upload(bytes, format) {
            Ok(records) => {
                let count = records.len();
                self.replace_records(ticket.namespace, records, RecordOrigin::Upload);
                self.notify(
                    NoticeLevel::Success,
                    format!("Successfully loaded {count} products into {}", ticket.namespace),
                );
                UploadOutcome::Loaded(count)
            }
            Err(err) => {
                warn!("[salesdeck:session] upload rejected: {err}");
                self.ensure_loaded(ticket.namespace);
                if let Some(view) = self.views.get_mut(&ticket.namespace) {
                    view.status = UploadStatus::Error;
                }
                self.notify(NoticeLevel::Error, UPLOAD_FAILED);
                UploadOutcome::Rejected
            }
        }
    }

    /// Upload with no concurrent work in flight.
    pub fn upload(&mut self, bytes: &[u8], format: UploadFormat) -> UploadOutcome {
        let ticket = self.begin_upload();
        self.complete_upload(ticket, bytes, format)
    }

    /// Build the trainee link for the active record set.
    pub fn share_link(&mut self, origin: &Url) -> Option<String> {
        if self.trainee_mode {
            self.notify(NoticeLevel::Error, READ_ONLY);
            return None;
        }
        match codec::export(self.records(), self.config.limits) {
            Ok(token) => {
                self.notify(NoticeLevel::Success, SHARE_READY);
                Some(share_url(origin, &token))
            }
            Err(err) => {
                warn!("[salesdeck:session] share link unavailable: {err}");
                self.notify(NoticeLevel::Error, format!("Could not create share link: {err}"));
                None
            }
        }
    }

    /// Drop the active namespace's records and selection, in memory and on disk.
    pub fn reset(&mut self) -> bool {
        if self.trainee_mode {
            self.notify(NoticeLevel::Error, READ_ONLY);
            return false;
        }
        let active = self.active;
        self.views.insert(active, NamespaceView::default());
        self.persist(active, |state| state.reset(active));
        self.notify(NoticeLevel::Info, format!("Cleared {active} product data"));
        true
    }

    fn view(&self) -> &NamespaceView {
        self.views.get(&self.active).unwrap_or(&EMPTY_VIEW)
    }

    fn view_mut(&mut self) -> &mut NamespaceView {
        self.views.entry(self.active).or_default()
    }

    /// Read local state for `namespace` unless this session already holds it.
    fn ensure_loaded(&mut self, namespace: Namespace) {
        if self.views.contains_key(&namespace) {
            return;
        }
        let view = match self.state.load(namespace) {
            Ok(persisted) => match persisted.records {
                Some(records) => {
                    let selected = resolve_selection(&records, persisted.selected_id.as_deref());
                    NamespaceView {
                        records,
                        selected,
                        status: UploadStatus::Uploaded,
                        origin: RecordOrigin::Local,
                    }
                }
                None => NamespaceView::default(),
            },
            Err(err) => {
                warn!("[salesdeck:session] local state for {namespace} unusable: {err}");
                NamespaceView::default()
            }
        };
        self.views.insert(namespace, view);
    }

    /// Full replacement of `namespace`'s records; selection moves to the first record.
    ///
    /// The stored selection is only touched once the records were written, so
    /// a failed write never pairs a new selection with old records.
    fn replace_records(&mut self, namespace: Namespace, records: RecordSet, origin: RecordOrigin) {
        let view = NamespaceView::replaced(records, origin);
        let first_name = view.records.first().map(|record| record.name.clone());
        let persisted = self.state.save_record_set(namespace, &view.records);
        self.views.insert(namespace, view);
        if persisted.is_err() {
            self.log_storage(namespace, persisted);
            return;
        }
        match first_name {
            Some(name) => self.persist(namespace, |state| state.save_selection(namespace, &name)),
            None => self.persist(namespace, |state| state.clear_selection(namespace)),
        }
    }

    fn persist<F>(&self, namespace: Namespace, write: F)
    where
        F: FnOnce(&LocalState) -> Result<(), TransferError>,
    {
        self.log_storage(namespace, write(&self.state));
    }

    fn log_storage(&self, namespace: Namespace, result: Result<(), TransferError>) {
        if let Err(err) = result {
            warn!("[salesdeck:session] could not persist {namespace} state: {err}");
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<NoticeText>) {
        self.notices.push(Notice::new(level, message));
    }
}
