//! Backend layer: the typed request protocol and its HTTP encoding.
//!
//! # Organization
//!
//! - [`messages`]: Requests, responses, and the epoch envelopes around them
//! - [`codec`]: URL/header/body encoding and status-aware reply decoding
//!
//! Nothing here performs I/O. The plugin shim passes [`codec::HttpCall`] values
//! to the host and feeds the host's replies back through [`codec::decode`].

pub mod codec;
pub mod messages;

pub use messages::{
    BackendReply, BackendRequest, BackendResponse, MutationReceipt, Outbound, ReminderChannel, SearchPage,
    TraceContext,
};
