//! Reference data: catalog kinds, entries and per-dimension statistics.

use super::error::{QueueError, Result};
use super::fields::{pick_i64, pick_str, pick_u64};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ENTRY_ID: &[&str] = &["id", "idEstado", "idIpress", "idRed", "idGestora", "idTipoBolsa", "idEspecialidad"];
const ENTRY_CODE: &[&str] = &["code", "codigo", "cod", "codEstadoCita", "codIpress"];
const ENTRY_LABEL: &[&str] = &["label", "descripcion", "desc", "nombre", "nombreCompleto", "descEstadoCita"];
const STAT_VALUE: &[&str] = &["value", "valor", "clave", "nombre"];
const STAT_COUNT: &[&str] = &["count", "cantidad", "total"];

/// Management-state codes the queue always knows how to label.
///
/// Used when the dynamic catalog is missing a code or failed to load.
pub const MANAGEMENT_STATE_FALLBACK: &[(&str, &str)] = &[
    ("PENDIENTE_CITA", "Pendiente de citar"),
    ("CITADO", "Citado"),
    ("ATENDIDO_IPRESS", "Atendido por IPRESS"),
    ("NO_CONTESTA", "No contesta"),
    ("SIN_VIGENCIA", "Sin vigencia de Seguro"),
    ("APAGADO", "Apagado"),
    ("NO_DESEA", "No desea"),
    ("REPROG_FALLIDA", "Reprogramación Fallida"),
    ("NUM_NO_EXISTE", "Numero no existe"),
    ("HC_BLOQUEADA", "Historia clinica bloqueada"),
    ("TEL_SIN_SERVICIO", "Teléfono sin servicio"),
];

/// Code assumed for rows that arrive without a management state.
pub const DEFAULT_MANAGEMENT_STATE: &str = "PENDIENTE_CITA";

/// Label for `code` from the static table, if it is a well-known code.
#[must_use]
pub fn fallback_management_label(code: &str) -> Option<&'static str> {
    MANAGEMENT_STATE_FALLBACK
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, label)| *label)
}

/// Reference-data dimensions loaded at mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CatalogKind {
    ManagementStates,
    Facilities,
    Networks,
    CaseManagers,
    BagTypes,
    Specialties,
}

impl CatalogKind {
    pub const ALL: [Self; 6] = [
        Self::ManagementStates,
        Self::Facilities,
        Self::Networks,
        Self::CaseManagers,
        Self::BagTypes,
        Self::Specialties,
    ];

    /// Path segment under `/bolsas/catalogo/`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::ManagementStates => "estados-gestion",
            Self::Facilities => "ipress",
            Self::Networks => "redes",
            Self::CaseManagers => "gestoras",
            Self::BagTypes => "tipos-bolsa",
            Self::Specialties => "especialidades",
        }
    }
}

/// Dimensions with server-side counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatDimension {
    BagType,
    ManagementState,
    Specialty,
    Facility,
    Network,
    AppointmentType,
    BagState,
    Assignment,
}

impl StatDimension {
    pub const ALL: [Self; 8] = [
        Self::BagType,
        Self::ManagementState,
        Self::Specialty,
        Self::Facility,
        Self::Network,
        Self::AppointmentType,
        Self::BagState,
        Self::Assignment,
    ];

    /// Path segment under `/estadisticas/`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::BagType => "tipo-bolsa",
            Self::ManagementState => "estado-gestion",
            Self::Specialty => "especialidad",
            Self::Facility => "ipress",
            Self::Network => "red",
            Self::AppointmentType => "tipo-cita",
            Self::BagState => "estado-bolsa",
            Self::Assignment => "asignacion",
        }
    }
}

/// One reference-data entry, addressable by id and by code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub code: String,
    pub label: String,
}

impl CatalogEntry {
    /// Normalizes one catalog row.
    ///
    /// Entries without a code use their id as code; entries without a label use
    /// their code.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Decode`] if neither an id nor a code is present.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| QueueError::Decode("catalog entry is not an object".to_string()))?;
        let id = pick_i64(object, ENTRY_ID);
        let code = pick_str(object, ENTRY_CODE);
        let (id, code) = match (id, code) {
            (Some(id), Some(code)) => (id, code),
            (Some(id), None) => (id, id.to_string()),
            (None, Some(code)) => (0, code),
            (None, None) => return Err(QueueError::Decode("catalog entry without id or code".to_string())),
        };
        let label = pick_str(object, ENTRY_LABEL).unwrap_or_else(|| code.clone());
        Ok(Self { id, code, label })
    }
}

/// Count of matching solicitudes for one value of a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCount {
    pub value: String,
    pub count: u64,
}

impl StatCount {
    /// Normalizes one statistics row.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Decode`] if the value is missing.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| QueueError::Decode("statistic is not an object".to_string()))?;
        let key = pick_str(object, STAT_VALUE)
            .ok_or_else(|| QueueError::Decode("statistic without value".to_string()))?;
        Ok(Self {
            value: key,
            count: pick_u64(object, STAT_COUNT).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_table_is_case_insensitive() {
        assert_eq!(fallback_management_label("citado"), Some("Citado"));
        assert_eq!(fallback_management_label("DESCONOCIDO"), None);
    }

    #[test]
    fn entry_accepts_spanish_keys() {
        let entry = CatalogEntry::from_json(&json!({"idEstado": 3, "codigo": "NO_CONTESTA", "descripcion": "No contesta"})).unwrap();
        assert_eq!(entry, CatalogEntry { id: 3, code: "NO_CONTESTA".into(), label: "No contesta".into() });
    }

    #[test]
    fn entry_without_code_uses_id() {
        let entry = CatalogEntry::from_json(&json!({"id": 14, "nombre": "María Torres"})).unwrap();
        assert_eq!(entry.code, "14");
        assert_eq!(entry.label, "María Torres");
    }

    #[test]
    fn statistic_reads_count_aliases() {
        let stat = StatCount::from_json(&json!({"valor": "PENDIENTE", "cantidad": "120"})).unwrap();
        assert_eq!(stat, StatCount { value: "PENDIENTE".into(), count: 120 });
    }
}
