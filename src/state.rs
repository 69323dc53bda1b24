use std::sync::Arc;

use tracing::debug;

use crate::codec::{from_canonical_json, to_canonical_json};
use crate::constants::storage::ACTIVE_NAMESPACE_KEY;
use crate::data::{ProductName, RecordSet};
use crate::errors::TransferError;
use crate::namespace::Namespace;
use crate::store::PersistenceStore;

/// Everything persisted for one namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistedNamespace {
    /// Last saved record set, if any was ever written.
    pub records: Option<RecordSet>,
    /// Last saved selected product name.
    pub selected_id: Option<ProductName>,
}

/// Per-namespace durable state on top of a [`PersistenceStore`].
#[derive(Clone)]
pub struct LocalState {
    store: Arc<dyn PersistenceStore>,
}

impl LocalState {
    /// Wrap a store.
    pub fn new(store: Arc<dyn PersistenceStore>) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<dyn PersistenceStore> {
        &self.store
    }

    /// Load whatever was last written for `namespace`.
    ///
    /// Stored records that no longer parse are reported as errors so callers
    /// can decide whether to discard them.
    pub fn load(&self, namespace: Namespace) -> Result<PersistedNamespace, TransferError> {
        let records = self
            .store
            .get(&namespace.records_key())?
            .map(|text| from_canonical_json(&text))
            .transpose()?;
        let selected_id = self.store.get(&namespace.selection_key())?;
        Ok(PersistedNamespace {
            records,
            selected_id,
        })
    }

    /// Replace the stored record set for `namespace`.
    pub fn save_record_set(
        &self,
        namespace: Namespace,
        records: &RecordSet,
    ) -> Result<(), TransferError> {
        let text = to_canonical_json(records)?;
        self.store.set(&namespace.records_key(), &text)?;
        debug!(
            "[salesdeck:state] saved {} records for {namespace}",
            records.len()
        );
        Ok(())
    }

    /// Replace the stored selection pointer for `namespace`; records are untouched.
    pub fn save_selection(&self, namespace: Namespace, id: &str) -> Result<(), TransferError> {
        self.store.set(&namespace.selection_key(), id)
    }

    /// Drop the stored selection pointer for `namespace`; records are untouched.
    pub fn clear_selection(&self, namespace: Namespace) -> Result<(), TransferError> {
        self.store.remove(&namespace.selection_key())
    }

    /// Clear records and selection for `namespace` only.
    pub fn reset(&self, namespace: Namespace) -> Result<(), TransferError> {
        self.store.remove(&namespace.records_key())?;
        self.clear_selection(namespace)?;
        debug!("[salesdeck:state] reset {namespace}");
        Ok(())
    }

    /// Namespace that was active when the store was last written.
    pub fn load_active_namespace(&self) -> Result<Option<Namespace>, TransferError> {
        self.store
            .get(ACTIVE_NAMESPACE_KEY)?
            .map(|raw| raw.parse())
            .transpose()
    }

    /// Remember `namespace` as the active one.
    pub fn save_active_namespace(&self, namespace: Namespace) -> Result<(), TransferError> {
        self.store.set(ACTIVE_NAMESPACE_KEY, namespace.as_str())
    }
}

/// Resolve the selection for `records`.
///
/// A stored name present in the set wins (first match); otherwise the first
/// record; `None` only for an empty set.
pub fn resolve_selection(records: &RecordSet, stored_id: Option<&str>) -> Option<usize> {
    if records.is_empty() {
        return None;
    }
    stored_id
        .and_then(|id| records.position_of(id))
        .or(Some(0))
}
