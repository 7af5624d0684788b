// Corporate Registry - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod importer;
pub mod record;
pub mod service;
pub mod store;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{init_logging, ServerConfig, StoreConfig};
pub use importer::{
    import_document, load_if_empty, parse_document,
    CorporationEntry, ImportOutcome, ImportReport,
};
pub use record::{CorporateRecord, RecordField, SearchScope};
pub use service::CorporationService;
pub use store::{CorporationStore, SqliteStore};

#[cfg(feature = "server")]
pub use api::{build_router, AppState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
