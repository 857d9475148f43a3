pub mod graph;
pub mod json_store;
pub mod traits;

pub use graph::*;
pub use json_store::*;
pub use traits::*;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

/// Construct the backend selected by configuration. Built once at startup
/// and injected into the router state; handlers never reach for globals.
pub fn build_store(config: &StorageConfig) -> Arc<dyn Store> {
    match config.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(&config.data_dir)),
        StorageBackend::Graph => {
            let mut executor = HttpGraphExecutor::new(&config.graph.endpoint);
            if let (Some(username), Some(password)) =
                (&config.graph.username, &config.graph.password)
            {
                executor = executor.with_basic_auth(username, password);
            }
            Arc::new(GraphStore::new(Arc::new(executor)))
        }
    }
}
