//! # Pricera Core
//!
//! Shared, runtime-agnostic logic for the pricera crawl/parse pipeline:
//! identity hashing, data models, the handler registry, payload routing,
//! batch expansion, response chain aggregation, status derivation, and the
//! storage traits the pipeline writes through.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem I/O. Everything
//! here is either a pure transformation or a trait seam, which keeps the
//! partial-failure rules testable without any external service.
//!
//! ## Data Flow
//!
//! ```text
//! JobMessage ──▶ router ──▶ expand ──▶ JobUnit ──▶ (fetch stage)
//!                                                      │
//!                              ChainAggregator ◀───────┘
//!                                     │ take()
//!                                     ▼
//!                              ChainSnapshot ──▶ status::derive_status
//! ```

pub mod aggregate;
pub mod error;
pub mod expand;
pub mod identity;
pub mod models;
pub mod registry;
pub mod router;
pub mod status;
pub mod store;

pub use aggregate::{ChainAggregator, ChainSnapshot};
pub use error::{
    AggregateError, BulkWriteError, OperationFailure, ParseError, RecordStoreError, StorageError,
};
pub use expand::{expand, JobUnit, UnitMode};
pub use identity::{hash_value, HashedUrl};
pub use models::{JobMessage, Outcome, PayloadValue, ResponseItem};
pub use registry::{HandlerDescriptor, HandlerRegistry, ParserKind, Stage, StorageLocation};
pub use router::{route, RouteSignal, Routed, RoutedEntry};
pub use status::{derive_status, status_field, StatusKind, StatusMap};
