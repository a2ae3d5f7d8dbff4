//! Process-wide store registration and the per-request session snapshot.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::store::EvidenceStore;

/// Holds the currently registered evidence store, if any.
///
/// Absent at startup; `register` replaces the handle wholesale. Readers take a [`Session`]
/// snapshot, so a request sees either the old or the new store, never a mix.
///
/// **Interaction**: Owned by `AdaptiveRag`; the server's upload handler registers freshly
/// ingested stores through `AdaptiveRag::register_store`.
#[derive(Default)]
pub struct StoreRegistry {
    current: RwLock<Option<Arc<dyn EvidenceStore>>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a new store. The previous one stays alive while in-flight sessions hold it.
    pub fn register(&self, store: Arc<dyn EvidenceStore>) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(store);
        info!("evidence store registered");
    }

    /// Snapshot of the current registration for one request.
    pub fn snapshot(&self) -> Session {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        Session {
            store: current.clone(),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

/// Per-request context: the evidence store seen by the router and the retrieve node.
#[derive(Clone, Default)]
pub struct Session {
    store: Option<Arc<dyn EvidenceStore>>,
}

impl Session {
    pub fn new(store: Arc<dyn EvidenceStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Session with no document loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn store(&self) -> Option<&Arc<dyn EvidenceStore>> {
        self.store.as_ref()
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_store", &self.has_store())
            .finish()
    }
}
