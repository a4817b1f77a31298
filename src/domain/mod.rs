//! Domain layer for the queue plugin.
//!
//! Core record types, reference data, and the error vocabulary, independent of
//! Zellij APIs or the HTTP transport. Raw backend JSON is converted here and
//! nowhere else.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`solicitud`]: The queue record and its normalization
//! - [`catalog`]: Catalog entries, statistics, and the management-state fallback table
//!
//! # Examples
//!
//! ```
//! use bolsas_queue::domain::{BagState, SolicitudRecord};
//!
//! let row = serde_json::json!({"idSolicitud": 1, "estado": "ATENDIDO"});
//! let record = SolicitudRecord::from_json(&row).unwrap();
//! assert_eq!(record.bag_state, Some(BagState::Attended));
//! ```

pub mod catalog;
pub mod error;
mod fields;
pub mod solicitud;

pub use catalog::{CatalogEntry, CatalogKind, StatCount, StatDimension};
pub use error::{ApiFailure, FailureKind, QueueError, Result};
pub use solicitud::{BagState, SolicitudRecord};

pub(crate) use fields::{pick_array, pick_str, pick_u64};
