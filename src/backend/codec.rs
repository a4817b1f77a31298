//! HTTP encoding of [`Outbound`] requests and decoding of host replies.
//!
//! The plugin host performs the actual transfer. [`encode`] turns a request into
//! a verb, URL, headers, JSON body and a context map; the host hands the context
//! back untouched with the reply, and [`decode`] uses it to rebuild the
//! [`BackendReply`] for the request that produced it.
//!
//! Paths, verbs and parameter names follow the plugin's own API contract
//! (English query names, `PUT` mutations, `asignar-gestora-filtrado`), not the
//! legacy `bolsas` controller.
//!
//! # Status classification
//!
//! | status | outcome |
//! |---|---|
//! | 2xx | success payload; an unreadable body is a `Decode` failure |
//! | 0, or 4xx without a JSON body | `Network` failure |
//! | 4xx with JSON | `Validation` failure carrying the backend message |
//! | 5xx | `Server` failure |

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use url::Url;

use super::messages::{BackendReply, BackendRequest, BackendResponse, MutationReceipt, Outbound, SearchPage};
use crate::domain::error::{QueueError, Result};
use crate::domain::{pick_array, pick_str, pick_u64};
use crate::domain::{ApiFailure, CatalogEntry, FailureKind, SolicitudRecord, StatCount};

/// Context key holding the serialized [`Outbound`] envelope.
pub const CONTEXT_KEY: &str = "request";

const MESSAGE_KEYS: &[&str] = &["mensaje", "message", "error", "detail"];
const AFFECTED_KEYS: &[&str] = &["actualizados", "totalBorrados", "updated", "affected", "total"];
const CONTENT_KEYS: &[&str] = &["content", "contenido", "data", "items"];
const TOTAL_ELEMENTS_KEYS: &[&str] = &["totalElements", "total_elements", "totalRegistros", "total"];
const TOTAL_PAGES_KEYS: &[&str] = &["totalPages", "total_pages", "totalPaginas"];

/// HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

/// Where the API lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// API root, e.g. `https://api.example.org/api`.
    pub base_url: String,
    /// Bearer token, sent as `Authorization` when present.
    pub auth_token: Option<String>,
}

/// A fully encoded call, ready for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCall {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    /// Returned verbatim by the host with the reply.
    pub context: BTreeMap<String, String>,
}

/// Encodes a request for the host.
///
/// # Errors
///
/// Returns [`QueueError::Config`] if the base URL cannot be parsed.
///
/// # Example
///
/// ```
/// use bolsas_queue::backend::codec::{encode, ApiConfig, HttpMethod};
/// use bolsas_queue::backend::{BackendRequest, Outbound};
///
/// let config = ApiConfig { base_url: "https://api.test/api".to_string(), auth_token: None };
/// let outbound = Outbound { epoch: 1, request: BackendRequest::change_bag_type(7, 3) };
/// let call = encode(&outbound, &config)?;
/// assert_eq!(call.method, HttpMethod::Put);
/// assert_eq!(call.url, "https://api.test/api/bolsas/solicitudes/7/cambiar-bolsa?idBolsaNueva=3");
/// # Ok::<(), bolsas_queue::domain::QueueError>(())
/// ```
pub fn encode(outbound: &Outbound, config: &ApiConfig) -> Result<HttpCall> {
    let request = &outbound.request;
    let root = config.base_url.trim_end_matches('/');
    let solicitudes = format!("{root}/bolsas/solicitudes");

    let (method, path, params, body): (HttpMethod, String, Vec<(&str, String)>, Option<Value>) = match request {
        BackendRequest::SearchPage { query, page, size, .. } => {
            let mut params = vec![("page", page.to_string()), ("size", size.to_string())];
            params.extend(query.to_params());
            (HttpMethod::Get, solicitudes, params, None)
        }
        BackendRequest::CollectMatchingIds { query, page, size, .. } => {
            let mut params = vec![("page", page.to_string()), ("size", size.to_string())];
            params.extend(query.to_params());
            (HttpMethod::Get, solicitudes, params, None)
        }
        BackendRequest::LoadCatalog { kind, .. } => {
            (HttpMethod::Get, format!("{root}/bolsas/catalogo/{}", kind.slug()), vec![], None)
        }
        BackendRequest::LoadStatistics { dimension, .. } => (
            HttpMethod::Get,
            format!("{solicitudes}/estadisticas/{}", dimension.slug()),
            vec![],
            None,
        ),
        BackendRequest::AssignManager { id, manager_id, .. } => (
            HttpMethod::Put,
            format!("{solicitudes}/{id}/asignar"),
            vec![("idGestora", manager_id.to_string())],
            None,
        ),
        BackendRequest::AssignManagerBatch { ids, manager_id, .. } => (
            HttpMethod::Post,
            format!("{solicitudes}/asignar-gestora-masivo"),
            vec![],
            Some(json!({ "ids": ids, "idGestora": manager_id })),
        ),
        BackendRequest::AssignManagerFiltered { query, manager_id, .. } => (
            HttpMethod::Post,
            format!("{solicitudes}/asignar-gestora-filtrado"),
            query.to_params(),
            Some(json!({ "idGestora": manager_id })),
        ),
        BackendRequest::ChangeBagType { id, bag_type_id, .. } => (
            HttpMethod::Put,
            format!("{solicitudes}/{id}/cambiar-bolsa"),
            vec![("idBolsaNueva", bag_type_id.to_string())],
            None,
        ),
        BackendRequest::DeleteMany { ids, .. } => (
            HttpMethod::Post,
            format!("{solicitudes}/borrar"),
            vec![],
            Some(json!({ "ids": ids })),
        ),
        BackendRequest::UpdatePhones {
            id,
            phone,
            alternate_phone,
            ..
        } => (
            HttpMethod::Put,
            format!("{solicitudes}/{id}/actualizar-telefonos"),
            vec![],
            Some(json!({ "pacienteTelefono": phone, "pacienteTelefonoAlterno": alternate_phone })),
        ),
        BackendRequest::UpdateAttentionFacility { id, facility_id, .. } => (
            HttpMethod::Put,
            format!("{solicitudes}/{id}/ipress-atencion"),
            vec![("idIpressAtencion", facility_id.to_string())],
            None,
        ),
        BackendRequest::UpdatePreferredDate { id, date, .. } => (
            HttpMethod::Put,
            format!("{solicitudes}/{id}/fecha-preferida"),
            vec![("fecha", date.format("%Y-%m-%d").to_string())],
            None,
        ),
        BackendRequest::SendReminder { id, channel, message, .. } => (
            HttpMethod::Post,
            format!("{solicitudes}/{id}/recordatorio"),
            vec![],
            Some(json!({ "tipo": channel.code(), "mensaje": message })),
        ),
    };

    let mut url = Url::parse(&path).map_err(|e| QueueError::Config(format!("invalid API URL {path}: {e}")))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in &params {
            pairs.append_pair(name, value);
        }
    }

    let mut headers = BTreeMap::new();
    headers.insert("Accept".to_string(), "application/json".to_string());
    if let Some(token) = config.auth_token.as_deref().filter(|token| !token.is_empty()) {
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
    }
    if let Some(trace_context) = request.trace_context() {
        headers.insert("traceparent".to_string(), trace_context.traceparent());
    }
    let body = match body {
        Some(value) => {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
            serde_json::to_vec(&value).map_err(|e| QueueError::Decode(e.to_string()))?
        }
        None => Vec::new(),
    };

    let envelope = serde_json::to_string(outbound).map_err(|e| QueueError::Decode(e.to_string()))?;
    let context = BTreeMap::from([(CONTEXT_KEY.to_string(), envelope)]);

    tracing::debug!(request = request.name(), method = ?method, url = %url, "encoded request");
    Ok(HttpCall {
        method,
        url: url.into(),
        headers,
        body,
        context,
    })
}

/// Rebuilds the reply for a finished host call.
///
/// # Errors
///
/// Returns [`QueueError::Decode`] only when the context does not carry a
/// request envelope. Every HTTP-level problem becomes a
/// [`BackendResponse::Failed`] reply instead.
pub fn decode(status: u16, body: &[u8], context: &BTreeMap<String, String>) -> Result<BackendReply> {
    let envelope = context
        .get(CONTEXT_KEY)
        .ok_or_else(|| QueueError::Decode("reply without request context".to_string()))?;
    let Outbound { epoch, request } =
        serde_json::from_str(envelope).map_err(|e| QueueError::Decode(format!("request context: {e}")))?;

    let _span = tracing::debug_span!("decode_reply", request = request.name(), status).entered();

    let response = match classify(status, body) {
        Ok(payload) => match success(&request, &payload) {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(error = %error, "unreadable success body");
                BackendResponse::Failed {
                    request,
                    failure: ApiFailure {
                        kind: FailureKind::Decode,
                        status: Some(status),
                        message: None,
                    },
                }
            }
        },
        Err(failure) => {
            tracing::debug!(kind = ?failure.kind, "request failed");
            BackendResponse::Failed { request, failure }
        }
    };
    Ok(BackendReply { epoch, response })
}

/// Parses the body of a 2xx reply, or classifies the failure.
fn classify(status: u16, body: &[u8]) -> std::result::Result<Value, ApiFailure> {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    let message = parsed.as_ref().and_then(Value::as_object).and_then(|o| pick_str(o, MESSAGE_KEYS));
    let failure = |kind| ApiFailure {
        kind,
        status: Some(status),
        message: message.clone(),
    };

    match status {
        200..=299 => {
            if body.iter().all(u8::is_ascii_whitespace) {
                Ok(Value::Null)
            } else {
                parsed.ok_or_else(|| failure(FailureKind::Decode))
            }
        }
        400..=499 if parsed.is_some() => Err(failure(FailureKind::Validation)),
        500..=599 => Err(failure(FailureKind::Server)),
        _ => Err(ApiFailure::network(
            (!body.is_empty()).then(|| String::from_utf8_lossy(body).into_owned()),
        )),
    }
}

fn decode_error(what: &str) -> QueueError {
    QueueError::Decode(format!("{what} has an unexpected shape"))
}

/// Top-level array, or an array nested under one of the content keys.
fn list_of(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(object) => pick_array(object, CONTENT_KEYS),
        _ => None,
    }
}

/// Decodes every item, dropping the ones that do not normalize.
fn decode_items<T>(items: &[Value], decode_one: impl Fn(&Value) -> Result<T>) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| match decode_one(item) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(error = %error, "skipping malformed item");
                None
            }
        })
        .collect()
}

fn search_page(payload: &Value) -> Result<SearchPage> {
    let items = list_of(payload).ok_or_else(|| decode_error("search page"))?;
    let records = decode_items(items, SolicitudRecord::from_json);
    let object = payload.as_object();
    let total_elements = object
        .and_then(|o| pick_u64(o, TOTAL_ELEMENTS_KEYS))
        .unwrap_or(records.len() as u64);
    let total_pages = object
        .and_then(|o| pick_u64(o, TOTAL_PAGES_KEYS))
        .and_then(|pages| u32::try_from(pages).ok())
        .unwrap_or(u32::from(total_elements > 0));
    Ok(SearchPage {
        records,
        total_elements,
        total_pages,
    })
}

fn matching_ids(page: u32, payload: &Value) -> Result<BackendResponse> {
    let items = list_of(payload).ok_or_else(|| decode_error("matching ids"))?;
    let ids: Vec<i64> = decode_items(items, SolicitudRecord::from_json)
        .iter()
        .map(|record| record.id)
        .collect();
    let total_elements = payload
        .as_object()
        .and_then(|o| pick_u64(o, TOTAL_ELEMENTS_KEYS))
        .unwrap_or(items.len() as u64);
    Ok(BackendResponse::MatchingIdsCollected {
        page,
        unreadable: (items.len() - ids.len()) as u64,
        ids,
        total_elements,
    })
}

fn receipt(payload: &Value) -> MutationReceipt {
    let empty = Map::new();
    let object = payload.as_object().unwrap_or(&empty);
    MutationReceipt {
        affected: pick_u64(object, AFFECTED_KEYS),
        message: pick_str(object, MESSAGE_KEYS),
    }
}

fn success(request: &BackendRequest, payload: &Value) -> Result<BackendResponse> {
    Ok(match request {
        BackendRequest::SearchPage { token, .. } => BackendResponse::PageLoaded {
            token: *token,
            page: search_page(payload)?,
        },
        BackendRequest::CollectMatchingIds { page, .. } => matching_ids(*page, payload)?,
        BackendRequest::LoadCatalog { kind, generation, .. } => BackendResponse::CatalogLoaded {
            kind: *kind,
            generation: *generation,
            entries: decode_items(list_of(payload).ok_or_else(|| decode_error("catalog"))?, CatalogEntry::from_json),
        },
        BackendRequest::LoadStatistics {
            dimension, generation, ..
        } => BackendResponse::StatisticsLoaded {
            dimension: *dimension,
            generation: *generation,
            counts: decode_items(list_of(payload).ok_or_else(|| decode_error("statistics"))?, StatCount::from_json),
        },
        BackendRequest::AssignManager { .. }
        | BackendRequest::AssignManagerBatch { .. }
        | BackendRequest::AssignManagerFiltered { .. }
        | BackendRequest::ChangeBagType { .. }
        | BackendRequest::DeleteMany { .. }
        | BackendRequest::UpdatePhones { .. }
        | BackendRequest::UpdateAttentionFacility { .. }
        | BackendRequest::UpdatePreferredDate { .. }
        | BackendRequest::SendReminder { .. } => BackendResponse::MutationApplied {
            request: request.clone(),
            receipt: receipt(payload),
        },
    })
}
