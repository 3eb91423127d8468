//! Collaborator traits consumed by the versioning layer.

mod triple_store;

pub use triple_store::{
    TripleQuery, TripleQueryResult, TripleStore, TripleStoreConfig, TripleStoreProvider,
};
