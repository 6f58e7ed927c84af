//! Roomdex data layer for `PostgreSQL` state management
//!
//! Persists per-document indexing status and per-dataroom RAG settings. The
//! dataroom's derived status is always recomputed from a fresh document scan,
//! never cached, because concurrent mutations can occur between enqueue and
//! processing.

// Module declarations
pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod repository;
pub mod traits;

pub mod mock;
pub use mock::MockDataroomRepository;

// Public exports
pub use error::{MetaDataError, MetaDataResult};
pub use migrations::run_migrations;
pub use models::{
    DataroomDocument, DataroomRagSettings, DataroomRagStatus, DocumentIndexingStatus,
    DocumentStatusUpdate, RagSettingsUpdate,
};
pub use pool::create_pool;
pub use repository::PgDataroomRepository;
// Use unified DatabaseConfig from roomdex-config
pub use roomdex_config::DatabaseConfig;
pub use traits::DataroomRepository;
