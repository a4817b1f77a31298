//! Actions representing side effects to be executed by the plugin runtime.
//!
//! The event handler never performs I/O. It returns a `Vec<Action>` after each
//! event and the plugin shim executes them in order: closing the pane, or
//! encoding an [`Outbound`] request and handing it to the host's web request
//! facility.
//!
//! # Example
//!
//! ```
//! use bolsas_queue::app::Action;
//! use bolsas_queue::backend::{BackendRequest, Outbound};
//!
//! let actions = vec![Action::Send(Outbound {
//!     epoch: 1,
//!     request: BackendRequest::delete_many(vec![4, 5]),
//! })];
//! assert_eq!(actions.len(), 1);
//! ```

use crate::backend::Outbound;

/// Commands representing side effects to be executed by the plugin runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Hides the plugin pane.
    ///
    /// Sent when the user explicitly requests to exit the plugin (pressing 'q').
    CloseFocus,

    /// Sends one API request.
    ///
    /// The envelope's epoch travels in the request context and comes back with
    /// the reply, so replies from a previous mount can be dropped.
    Send(Outbound),
}
