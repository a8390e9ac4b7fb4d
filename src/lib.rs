pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

pub use error::{InvariantViolation, MatrixError, MatrixResult, RemoteCreateError, ValidationError};

// Export engine and session types
pub use logic::{
    BulkEdit, BulkField, CreationReport, MatrixSettings, MatrixSnapshot, MatrixSummary, PassOrigin,
    ProductEditSession, ReconcileOutcome, ReconcileReport, RemovalReport, VariantMatrix,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{AttributeStore, AxisRecord, CatalogStore, MemoryStore, VariantStore};
