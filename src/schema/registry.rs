// Record registry for schemaforge
//
// The registry maps record names to resolved records. It is shared by the
// schema builder and the fake generator so that nested and self-referenced
// records are resolved once and reused. Entries are never evicted.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::internal::error::{Error, Result};
use crate::schema::declaration::{ModelProvider, RecordDefinition};
use crate::schema::resolver::FieldResolver;
use crate::schema::types::Record;

static GLOBAL_REGISTRY: Lazy<RecordRegistry> = Lazy::new(RecordRegistry::new);

/// A registry of resolved records
///
/// Reads take a shared lock; registration and first resolution through the
/// provider take the exclusive lock, so concurrent first access to the same
/// name yields a single entry.
pub struct RecordRegistry {
    /// Resolved records by name
    records: RwLock<HashMap<String, Arc<Record>>>,
    /// Source of declarations for names that were never registered
    provider: Option<Box<dyn ModelProvider>>,
    resolver: FieldResolver,
}

impl RecordRegistry {
    /// Creates an empty registry without a provider
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            provider: None,
            resolver: FieldResolver::new(),
        }
    }

    /// Creates an empty registry that populates itself from `provider` on demand
    pub fn with_provider(provider: impl ModelProvider + 'static) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            provider: Some(Box::new(provider)),
            resolver: FieldResolver::new(),
        }
    }

    /// Process-wide registry, created on first access and never torn down
    pub fn global() -> &'static RecordRegistry {
        &GLOBAL_REGISTRY
    }

    /// Resolves and registers a record definition.
    ///
    /// Registering a name again overwrites the previous entry; registering an
    /// identical definition leaves the registry unchanged.
    pub fn register(&self, definition: RecordDefinition) -> Result<Arc<Record>> {
        let record = self.resolver.resolve_record(&definition)?;

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = records.get(&record.name) {
            if existing.as_ref() == &record {
                return Ok(Arc::clone(existing));
            }
            warn!("Record '{}' redefined, replacing previous definition", record.name);
        } else {
            debug!("Registered record '{}'", record.name);
        }

        let record = Arc::new(record);
        records.insert(record.name.clone(), Arc::clone(&record));
        Ok(record)
    }

    /// Returns the resolved record for `name`, consulting the provider on a miss
    pub fn resolve(&self, name: &str) -> Result<Arc<Record>> {
        if let Some(record) = self.get(name) {
            return Ok(record);
        }

        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| Error::UnknownRecord(name.to_string()))?;

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have resolved it while we waited for the lock
        if let Some(record) = records.get(name) {
            return Ok(Arc::clone(record));
        }

        let definition = provider
            .definition(name)?
            .ok_or_else(|| Error::UnknownRecord(name.to_string()))?;
        if definition.name != name {
            return Err(Error::configuration(
                name,
                None,
                format!("provider returned a definition named '{}'", definition.name),
            ));
        }

        let record = Arc::new(self.resolver.resolve_record(&definition)?);
        debug!("Resolved record '{}' from provider", name);
        records.insert(name.to_string(), Arc::clone(&record));
        Ok(record)
    }

    /// Returns the record if it is already resolved
    pub fn get(&self, name: &str) -> Option<Arc<Record>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Returns true if `name` is already resolved
    pub fn contains(&self, name: &str) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Names of all resolved records, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of resolved records
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing is resolved yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordRegistry")
            .field("records", &self.names())
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}
