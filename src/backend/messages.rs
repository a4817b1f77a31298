//! Typed request/response protocol between the queue controllers and the API.
//!
//! Controllers never build URLs. They emit [`BackendRequest`] values wrapped in an
//! [`Outbound`] envelope; the plugin shim hands them to the HTTP codec, and every
//! reply comes back as a [`BackendReply`] carrying the same epoch. Requests are
//! serialized into the host's request context so the reply can be matched to the
//! request that produced it without any shared bookkeeping.

use crate::app::query::CanonicalQuery;
use crate::domain::{ApiFailure, CatalogEntry, CatalogKind, SolicitudRecord, StatCount, StatDimension};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Distributed tracing context propagated to the API.
///
/// Captures the current trace and span IDs from OpenTelemetry so the backend can
/// join the plugin's trace through a W3C `traceparent` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// OpenTelemetry trace ID as a hex string.
    pub trace_id: String,

    /// Parent span ID for linking the backend span.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Creates a trace context from the current tracing span.
    ///
    /// Returns `None` if the current span context is invalid or not sampled,
    /// which is always the case when tracing was never initialized.
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let span = tracing::Span::current();

        let otel_context = span.context();
        let span_ref = otel_context.span();
        let span_context = span_ref.span_context();

        if span_context.is_valid() {
            Some(Self {
                trace_id: format!("{:032x}", span_context.trace_id()),
                parent_span_id: format!("{:016x}", span_context.span_id()),
            })
        } else {
            None
        }
    }

    /// W3C `traceparent` header value, sampled flag set.
    ///
    /// # Example
    ///
    /// ```
    /// use bolsas_queue::backend::TraceContext;
    ///
    /// let context = TraceContext {
    ///     trace_id: "4bf92f3577b34da6a3ce929d0e0e4736".to_string(),
    ///     parent_span_id: "00f067aa0ba902b7".to_string(),
    /// };
    /// assert_eq!(
    ///     context.traceparent(),
    ///     "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
    /// );
    /// ```
    #[must_use]
    pub fn traceparent(&self) -> String {
        format!("00-{}-{}-01", self.trace_id, self.parent_span_id)
    }
}

/// Channel used to remind a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderChannel {
    Whatsapp,
    Sms,
    Email,
}

impl ReminderChannel {
    pub const ALL: [Self; 3] = [Self::Whatsapp, Self::Sms, Self::Email];

    /// Wire value of `tipo`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Whatsapp => "WHATSAPP",
            Self::Sms => "SMS",
            Self::Email => "EMAIL",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Whatsapp => "WhatsApp",
            Self::Sms => "SMS",
            Self::Email => "Correo electrónico",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.code().eq_ignore_ascii_case(raw.trim()))
    }
}

/// Macro to generate builder methods for `BackendRequest` variants.
///
/// Generates convenience constructors that automatically attach the current
/// trace context to each request variant.
macro_rules! backend_request_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl BackendRequest {
            $(
                #[doc = concat!("Create a ", stringify!($variant), " request with current trace context")]
                #[must_use]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::$variant {
                        $($field,)*
                        trace_context: TraceContext::from_current(),
                    }
                }
            )*
        }
    };
}

backend_request_builders! {
    search_page(SearchPage { token: u64, query: CanonicalQuery, page: u32, size: u32 }),
    collect_matching_ids(CollectMatchingIds { query: CanonicalQuery, page: u32, size: u32 }),
    load_catalog(LoadCatalog { kind: CatalogKind, generation: u64 }),
    load_statistics(LoadStatistics { dimension: StatDimension, generation: u64 }),
    assign_manager(AssignManager { id: i64, manager_id: i64 }),
    assign_manager_batch(AssignManagerBatch { ids: Vec<i64>, manager_id: i64 }),
    assign_manager_filtered(AssignManagerFiltered { query: CanonicalQuery, manager_id: i64 }),
    change_bag_type(ChangeBagType { id: i64, bag_type_id: i64 }),
    delete_many(DeleteMany { ids: Vec<i64> }),
    update_phones(UpdatePhones { id: i64, phone: String, alternate_phone: Option<String> }),
    update_attention_facility(UpdateAttentionFacility { id: i64, facility_id: i64 }),
    update_preferred_date(UpdatePreferredDate { id: i64, date: NaiveDate }),
    send_reminder(SendReminder { id: i64, channel: ReminderChannel, message: Option<String> }),
}

/// Calls the controllers can make against the solicitud API.
///
/// Every variant carries an optional trace context that becomes the outgoing
/// `traceparent` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendRequest {
    /// One page of the filtered queue, tagged with the loader's sequence token.
    SearchPage {
        token: u64,
        query: CanonicalQuery,
        page: u32,
        size: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// One page of the ids matching `query`; the executor walks the pages
    /// until the whole matching set is collected.
    CollectMatchingIds {
        query: CanonicalQuery,
        page: u32,
        size: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// One catalog kind, for load round `generation`.
    LoadCatalog {
        kind: CatalogKind,
        generation: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Counts for one dimension, for load round `generation`.
    LoadStatistics {
        dimension: StatDimension,
        generation: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Assign a single solicitud.
    AssignManager {
        id: i64,
        manager_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Assign explicit ids in one batched call.
    AssignManagerBatch {
        ids: Vec<i64>,
        manager_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Assign every solicitud matching `query`, resolved server-side.
    AssignManagerFiltered {
        query: CanonicalQuery,
        manager_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Move one solicitud to another bag type.
    ChangeBagType {
        id: i64,
        bag_type_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Delete explicit ids in one batched call.
    DeleteMany {
        ids: Vec<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    UpdatePhones {
        id: i64,
        phone: String,
        alternate_phone: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    UpdateAttentionFacility {
        id: i64,
        facility_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    UpdatePreferredDate {
        id: i64,
        date: NaiveDate,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    SendReminder {
        id: i64,
        channel: ReminderChannel,
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },
}

impl BackendRequest {
    /// Short name for logs and spans.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SearchPage { .. } => "search_page",
            Self::CollectMatchingIds { .. } => "collect_matching_ids",
            Self::LoadCatalog { .. } => "load_catalog",
            Self::LoadStatistics { .. } => "load_statistics",
            Self::AssignManager { .. } => "assign_manager",
            Self::AssignManagerBatch { .. } => "assign_manager_batch",
            Self::AssignManagerFiltered { .. } => "assign_manager_filtered",
            Self::ChangeBagType { .. } => "change_bag_type",
            Self::DeleteMany { .. } => "delete_many",
            Self::UpdatePhones { .. } => "update_phones",
            Self::UpdateAttentionFacility { .. } => "update_attention_facility",
            Self::UpdatePreferredDate { .. } => "update_preferred_date",
            Self::SendReminder { .. } => "send_reminder",
        }
    }

    /// Trace context attached at construction time.
    #[must_use]
    pub const fn trace_context(&self) -> Option<&TraceContext> {
        match self {
            Self::SearchPage { trace_context, .. }
            | Self::CollectMatchingIds { trace_context, .. }
            | Self::LoadCatalog { trace_context, .. }
            | Self::LoadStatistics { trace_context, .. }
            | Self::AssignManager { trace_context, .. }
            | Self::AssignManagerBatch { trace_context, .. }
            | Self::AssignManagerFiltered { trace_context, .. }
            | Self::ChangeBagType { trace_context, .. }
            | Self::DeleteMany { trace_context, .. }
            | Self::UpdatePhones { trace_context, .. }
            | Self::UpdateAttentionFacility { trace_context, .. }
            | Self::UpdatePreferredDate { trace_context, .. }
            | Self::SendReminder { trace_context, .. } => trace_context.as_ref(),
        }
    }
}

/// A request tagged with the controller epoch that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    pub epoch: u64,
    pub request: BackendRequest,
}

/// One decoded page of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchPage {
    pub records: Vec<SolicitudRecord>,
    pub total_elements: u64,
    pub total_pages: u32,
}

/// What a successful mutation reported.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MutationReceipt {
    /// Updated or deleted count, when the backend sends one.
    pub affected: Option<u64>,
    /// Backend message, shown verbatim.
    pub message: Option<String>,
}

/// Decoded outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendResponse {
    PageLoaded {
        token: u64,
        page: SearchPage,
    },
    MatchingIdsCollected {
        page: u32,
        ids: Vec<i64>,
        /// Rows on the page that had no readable id.
        unreadable: u64,
        /// Matching total reported with this page.
        total_elements: u64,
    },
    CatalogLoaded {
        kind: CatalogKind,
        generation: u64,
        entries: Vec<CatalogEntry>,
    },
    StatisticsLoaded {
        dimension: StatDimension,
        generation: u64,
        counts: Vec<StatCount>,
    },
    MutationApplied {
        request: BackendRequest,
        receipt: MutationReceipt,
    },
    /// Any request that did not succeed, with the request kept for routing.
    Failed {
        request: BackendRequest,
        failure: ApiFailure,
    },
}

/// A response tagged with the epoch of the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendReply {
    pub epoch: u64,
    pub response: BackendResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_attach_no_context_without_a_subscriber() {
        let request = BackendRequest::delete_many(vec![1, 2]);
        assert_eq!(request.trace_context(), None);
        assert_eq!(request.name(), "delete_many");
    }

    #[test]
    fn request_survives_the_context_round_trip() {
        let request = BackendRequest::search_page(9, CanonicalQuery::default(), 3, 50);
        let json = serde_json::to_string(&Outbound { epoch: 2, request: request.clone() }).unwrap();
        let back: Outbound = serde_json::from_str(&json).unwrap();
        assert_eq!(back.epoch, 2);
        assert_eq!(back.request, request);
    }

    #[test]
    fn reminder_channel_parses_codes() {
        assert_eq!(ReminderChannel::parse("whatsapp"), Some(ReminderChannel::Whatsapp));
        assert_eq!(ReminderChannel::parse("fax"), None);
    }
}
