//! Kind-to-adapter lookup table.

use tracing::debug;

use super::{AlbumAdapter, CollectionAdapter, CollectionError, CollectionKind, PlaylistAdapter};

/// Builds the registry with every supported collection kind.
#[must_use]
pub fn build_default_adapter_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(PlaylistAdapter::new()));
    registry.register(Box::new(AlbumAdapter::new()));
    registry
}

/// Adapters keyed by the kind they handle.
///
/// Registering a second adapter for a kind replaces the first.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn CollectionAdapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Registers an adapter for its kind.
    pub fn register(&mut self, adapter: Box<dyn CollectionAdapter>) {
        let kind = adapter.kind();
        debug!(kind = %kind, "registering collection adapter");
        self.adapters.retain(|existing| existing.kind() != kind);
        self.adapters.push(adapter);
    }

    /// Returns the number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns true if no adapters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Returns the adapter for `kind`, if registered.
    #[must_use]
    pub fn get(&self, kind: CollectionKind) -> Option<&dyn CollectionAdapter> {
        self.adapters
            .iter()
            .find(|adapter| adapter.kind() == kind)
            .map(AsRef::as_ref)
    }

    /// Classifies `url` and returns the adapter for its kind.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] when the URL matches no kind
    /// or the matched kind has no registered adapter.
    pub fn adapter_for(&self, url: &str) -> Result<&dyn CollectionAdapter, CollectionError> {
        let kind = CollectionKind::classify(url)?;
        self.get(kind)
            .ok_or_else(|| CollectionError::unsupported(url))
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&str> = self.adapters.iter().map(|a| a.kind().key()).collect();
        f.debug_struct("AdapterRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
