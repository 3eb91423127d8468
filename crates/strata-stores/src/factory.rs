//! Factory for creating triple store providers.

use std::sync::Arc;

use strata_core::error::StrataResult;
use strata_core::traits::{TripleStore, TripleStoreConfig, TripleStoreProvider};

use crate::memory::MemoryTripleStore;
use crate::sqlite::SqliteTripleStore;

/// Factory for creating triple store providers.
pub struct TripleStoreFactory;

impl TripleStoreFactory {
    /// Create a triple store from the given configuration.
    pub fn create(config: &TripleStoreConfig) -> StrataResult<Arc<dyn TripleStore>> {
        match config.provider {
            TripleStoreProvider::Memory => Ok(Arc::new(MemoryTripleStore::new())),
            TripleStoreProvider::Sqlite => {
                let store = if config.url.is_empty() || config.url == ":memory:" {
                    SqliteTripleStore::in_memory()?
                } else {
                    SqliteTripleStore::new(&config.url)?
                };
                Ok(Arc::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_memory_store() {
        let config = TripleStoreConfig::default();
        assert!(TripleStoreFactory::create(&config).is_ok());
    }

    #[test]
    fn test_create_sqlite_store_in_memory() {
        let config = TripleStoreConfig {
            provider: TripleStoreProvider::Sqlite,
            url: ":memory:".to_string(),
        };
        assert!(TripleStoreFactory::create(&config).is_ok());
    }
}
