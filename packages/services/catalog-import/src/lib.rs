pub mod clients;
pub mod config;
pub mod handlers;
pub mod ids;
pub mod mapping;
pub mod models;
pub mod routes;
pub mod sync;

// Convenient re-exports for tests and external callers
pub use clients::{clean_input, AdminApiClient, CatalogTransport};
pub use config::Config;
pub use handlers::{CellValue, Row, SheetFormat, Worksheet};
pub use ids::{GlobalIdResource, IdTranslator, ResourceId};
pub use mapping::ProductMapper;
pub use models::*;
pub use sync::{Dispatcher, ImportEngine, ReconcileSummary, Reconciler};
