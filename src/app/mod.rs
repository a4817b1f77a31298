//! Application layer coordinating state, events, and actions.
//!
//! This module defines the queue controllers and the event-driven layer that
//! ties them together, sitting between the plugin runtime (main.rs) and the
//! domain/backend layers.
//!
//! # Architecture
//!
//! The application layer follows a unidirectional data flow pattern:
//!
//! ```text
//! User Input → Events → Event Handler → State Mutations → Actions → HTTP
//!                           ↑                                         ↓
//!                           └─────────── Backend Replies ─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effect commands emitted by the event handler
//! - [`bulk`]: Assignment, bag change and delete over a selection
//! - [`catalogs`]: Reference data, statistics, and the catalog gate
//! - [`handler`]: Event processing logic and state transition coordinator
//! - [`keymap`]: Key bindings per input mode
//! - [`loader`]: Last-request-wins page loading and row mapping
//! - [`modes`]: Input mode state machine types
//! - [`pagination`]: Page index, page size, and totals
//! - [`picker`]: Fuzzy option chooser
//! - [`query`]: Filters, search term, and page sort
//! - [`selection`]: Row, page, and all-matching selection
//! - [`stat_cards`]: Count cards that double as filter toggles
//! - [`state`]: Central application state container and view model computation
//!
//! # Example
//!
//! ```
//! use bolsas_queue::app::{handle_event, AppState, Event};
//! use bolsas_queue::ui::theme::Theme;
//!
//! let mut state = AppState::new(Theme::default(), 20);
//! handle_event(&mut state, &Event::Mounted)?;
//! let (render, _) = handle_event(&mut state, &Event::CursorDown)?;
//! assert!(render);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod actions;
pub mod bulk;
pub mod catalogs;
pub mod handler;
pub mod keymap;
pub mod loader;
pub mod modes;
pub mod pagination;
pub mod picker;
pub mod query;
pub mod selection;
pub mod stat_cards;
pub mod state;

pub use actions::Action;
pub use handler::{handle_event, Event};
pub use modes::InputMode;
pub use state::AppState;
