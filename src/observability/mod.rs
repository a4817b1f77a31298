//! OpenTelemetry-based observability with file-based span export.
//!
//! The plugin runs inside Zellij's WASM sandbox with no collector to talk to,
//! so finished spans are written as JSON lines to a rotating file under the
//! data directory and analysed offline.
//!
//! ```text
//! tracing macros → tracing-opentelemetry → TracerProvider → JsonLinesExporter → .jsonl
//! ```
//!
//! The same span context feeds the `traceparent` header of every backend
//! request (see [`crate::backend::TraceContext`]), so a slow `cambiar-bolsa`
//! call can be matched with the server-side trace.
//!
//! # Configuration
//!
//! The `trace_level` plugin option is an `EnvFilter` directive. Default: `"info"`.
//!
//! ```
//! use bolsas_queue::observability::init_tracing;
//! use bolsas_queue::Config;
//!
//! let config = Config::default();
//! init_tracing(&config);
//!
//! tracing::debug!("plugin initialized");
//! ```

mod file_writer;
mod init;
mod span_formatter;
mod tracer;

pub use file_writer::RotatingWriter;
pub use init::init_tracing;
