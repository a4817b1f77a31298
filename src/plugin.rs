//! Zellij plugin wrapper.
//!
//! This is the only code that touches the host API. It translates Zellij
//! events into library [`Event`]s, executes the returned [`Action`]s, and
//! performs HTTP through the host's `web_request`.
//!
//! # Plugin Lifecycle
//!
//! 1. **Load**: Parse config, initialize tracing, create `AppState`
//! 2. **Subscribe**: Key, `WebRequestResult`, `PermissionRequestResult`
//! 3. **Granted**: `Event::Mounted` loads catalogs, statistics, then the first page
//! 4. **Update**: Keys go through the keymap; HTTP replies through the codec
//! 5. **Render**: Delegated to the library renderer
//!
//! # HTTP Round Trip
//!
//! ```text
//! Action::Send(Outbound) → codec::encode → web_request(.., context)
//! WebRequestResult(status, _, body, context) → codec::decode → Event::BackendReply
//! ```
//!
//! The serialized request rides in the host context, so no bookkeeping of
//! in-flight calls is kept here.

use std::collections::BTreeMap;
use zellij_tile::prelude::*;

use bolsas_queue::app::keymap::{map_key, Key};
use bolsas_queue::backend::codec::{self, HttpMethod};
use bolsas_queue::backend::{BackendReply, BackendResponse};
use bolsas_queue::domain::ApiFailure;
use bolsas_queue::{handle_event, Action, ApiConfig, AppState, Config, Event};

/// Plugin state wrapper.
pub struct State {
    /// Core application state from library layer.
    app: AppState,

    /// Where requests go and how they authenticate.
    api: ApiConfig,
}

impl Default for State {
    fn default() -> Self {
        let config = Config::default();
        Self {
            app: bolsas_queue::initialize(&config),
            api: config.api(),
        }
    }
}

impl ZellijPlugin for State {
    fn load(&mut self, configuration: BTreeMap<String, String>) {
        let config = Config::from_zellij(&configuration);
        bolsas_queue::observability::init_tracing(&config);

        let span = tracing::debug_span!("plugin_load");
        let _guard = span.entered();

        tracing::debug!(api_base_url = %config.api_base_url, "plugin loading started");
        self.app = bolsas_queue::initialize(&config);
        self.api = config.api();

        request_permission(&[PermissionType::WebAccess]);
        subscribe(&[
            EventType::Key,
            EventType::WebRequestResult,
            EventType::PermissionRequestResult,
        ]);

        tracing::debug!("plugin load complete - waiting for permissions");
    }

    fn update(&mut self, event: zellij_tile::prelude::Event) -> bool {
        let event_name = Self::get_event_name(&event);
        let span = tracing::debug_span!("plugin_update_event", otel.name = %format!("plugin_update::{event_name}"), event_type = %event_name);
        let _guard = span.entered();

        let our_event = match event {
            zellij_tile::prelude::Event::Key(ref key) => {
                let Some(key) = Self::translate_key(key) else {
                    return false;
                };
                match map_key(self.app.input_mode, key) {
                    Some(event) => event,
                    None => return false,
                }
            }
            zellij_tile::prelude::Event::WebRequestResult(status, _headers, body, context) => {
                match codec::decode(status, &body, &context) {
                    Ok(reply) => Event::BackendReply(reply),
                    Err(e) => {
                        tracing::warn!(status, error = %e, "dropping undecodable web request result");
                        return false;
                    }
                }
            }
            zellij_tile::prelude::Event::PermissionRequestResult(PermissionStatus::Granted) => {
                tracing::debug!("web access granted - mounting queue");
                Event::Mounted
            }
            zellij_tile::prelude::Event::PermissionRequestResult(PermissionStatus::Denied) => {
                tracing::warn!("web access denied - the queue cannot load");
                return false;
            }
            _ => return false,
        };

        self.dispatch(&our_event)
    }

    fn render(&mut self, rows: usize, cols: usize) {
        bolsas_queue::ui::render(&self.app, rows, cols);
    }
}

impl State {
    /// Runs an event through the library and executes the resulting actions.
    fn dispatch(&mut self, event: &Event) -> bool {
        match handle_event(&mut self.app, event) {
            Ok((should_render, actions)) => {
                tracing::debug!(action_count = actions.len(), should_render, "event handled");
                actions
                    .into_iter()
                    .fold(should_render, |render, action| self.execute_action(action) || render)
            }
            Err(e) => {
                tracing::debug!(error = %e, "error handling event");
                false
            }
        }
    }

    fn get_event_name(event: &zellij_tile::prelude::Event) -> String {
        match event {
            zellij_tile::prelude::Event::Key(key) => format!("Key({:?})", key.bare_key),
            zellij_tile::prelude::Event::WebRequestResult(status, ..) => format!("WebRequestResult({status})"),
            zellij_tile::prelude::Event::PermissionRequestResult(..) => "PermissionRequestResult".to_string(),
            _ => "Other".to_string(),
        }
    }

    /// Host key to keymap key. Unbound keys and other modifiers are dropped.
    fn translate_key(key: &KeyWithModifier) -> Option<Key> {
        if key.has_modifiers(&[KeyModifier::Ctrl]) {
            return match key.bare_key {
                BareKey::Char('n') => Some(Key::CtrlN),
                BareKey::Char('p') => Some(Key::CtrlP),
                _ => None,
            };
        }

        Some(match key.bare_key {
            BareKey::Char(c) => Key::Char(c),
            BareKey::Enter => Key::Enter,
            BareKey::Esc => Key::Esc,
            BareKey::Backspace => Key::Backspace,
            BareKey::Tab => Key::Tab,
            BareKey::Up => Key::Up,
            BareKey::Down => Key::Down,
            BareKey::Left => Key::Left,
            BareKey::Right => Key::Right,
            BareKey::Home => Key::Home,
            BareKey::End => Key::End,
            _ => return None,
        })
    }

    /// Returns whether executing the action changed state that needs a render.
    #[tracing::instrument(level = "debug", skip(self))]
    fn execute_action(&mut self, action: Action) -> bool {
        match action {
            Action::CloseFocus => {
                tracing::debug!("closing plugin focus");
                hide_self();
                false
            }
            Action::Send(outbound) => match codec::encode(&outbound, &self.api) {
                Ok(call) => {
                    tracing::debug!(method = ?call.method, url = %call.url, "sending request");
                    let verb = match call.method {
                        HttpMethod::Get => HttpVerb::Get,
                        HttpMethod::Post => HttpVerb::Post,
                        HttpMethod::Put => HttpVerb::Put,
                    };
                    web_request(call.url, verb, call.headers, call.body, call.context);
                    false
                }
                Err(e) => {
                    // A request that never leaves must still settle the loader or the bulk run.
                    tracing::warn!(error = %e, "failed to encode request");
                    let reply = BackendReply {
                        epoch: outbound.epoch,
                        response: BackendResponse::Failed {
                            request: outbound.request,
                            failure: ApiFailure::network(Some(e.to_string())),
                        },
                    };
                    self.dispatch(&Event::BackendReply(reply))
                }
            },
        }
    }
}
