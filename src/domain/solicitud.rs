//! The solicitud record and its normalization from backend JSON.
//!
//! [`SolicitudRecord::from_json`] is the single place where historic field
//! spellings are resolved. Once a record exists, every field has exactly one name
//! and one type; the loader and the UI never branch on spelling variants.

use super::error::{QueueError, Result};
use super::fields::{pick_i64, pick_str};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ID: &[&str] = &["idSolicitud", "id_solicitud", "id"];
const DNI: &[&str] = &["pacienteDni", "paciente_dni", "dni", "numeroDocumento", "numero_documento"];
const NAME: &[&str] = &["pacienteNombre", "paciente_nombre", "nombreCompleto", "asegurado", "nombre"];
const SEX: &[&str] = &["pacienteSexo", "paciente_sexo", "sexo"];
const AGE: &[&str] = &["pacienteEdad", "paciente_edad", "edad"];
const PHONE: &[&str] = &["pacienteTelefono", "paciente_telefono", "telefono", "telefonoPrincipal", "telefono_principal"];
const ALT_PHONE: &[&str] = &[
    "pacienteTelefonoAlterno",
    "paciente_telefono_alterno",
    "telefonoAlterno",
    "telefono_alterno",
];
const BAG_TYPE_ID: &[&str] = &["idBolsa", "id_bolsa", "idTipoBolsa", "id_tipo_bolsa"];
const BAG_CODE: &[&str] = &["codTipoBolsa", "cod_tipo_bolsa", "codigoBolsa", "codigo_bolsa"];
const BAG_ALIAS: &[&str] = &["descTipoBolsa", "desc_tipo_bolsa", "tipoBolsa", "nombreBolsa"];
const PREFERRED_DATE: &[&str] = &[
    "fechaPreferidaNoAtendida",
    "fecha_preferida_no_atendida",
    "fechaPreferida",
    "fecha_preferida",
];
const APPOINTMENT_TYPE: &[&str] = &["tipoCita", "tipo_cita"];
const SPECIALTY: &[&str] = &["especialidad", "descEspecialidad", "servicio"];
const ASCRIPTION: &[&str] = &["descIpress", "desc_ipress", "ipress", "nombreIpress"];
const ATTENTION: &[&str] = &["descIpressAtencion", "desc_ipress_atencion", "ipressAtencion"];
const ATTENTION_ID: &[&str] = &["idIpressAtencion", "id_ipress_atencion"];
const NETWORK: &[&str] = &["descRed", "desc_red", "red"];
const BAG_STATE: &[&str] = &["estado", "estadoBolsa", "estado_bolsa"];
const MANAGEMENT_CODE: &[&str] = &["codEstadoCita", "cod_estado_cita", "estadoGestionCodigo", "codigoEstado"];
const MANAGER_ID: &[&str] = &["responsableGestoraId", "responsable_gestora_id", "idGestora", "gestoraId"];
const MANAGER_NAME: &[&str] = &["responsableGestoraNombre", "nombreGestora", "gestoraNombre"];
const ASSIGNED_AT: &[&str] = &["fechaAsignacion", "fecha_asignacion"];
const CHANGED_BY: &[&str] = &["nombreUsuarioCambioEstado", "usuarioCambioEstado", "usuario_cambio_estado"];
const CHANGED_AT: &[&str] = &["fechaCambioEstado", "fecha_cambio_estado"];
const MEDICAL_CONDITION: &[&str] = &["condicionMedica", "condicion_medica"];
const MEDICAL_ATTENTION_AT: &[&str] = &["fechaAtencionMedica", "fecha_atencion_medica"];
const DOCTOR: &[&str] = &["nombreMedicoAsignado", "nombre_medico_asignado"];
const REQUESTED_AT: &[&str] = &["fechaSolicitud", "fecha_solicitud", "createdAt", "created_at"];

/// Coarse progress of a solicitud through the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BagState {
    /// Waiting to be worked.
    Pending,
    /// Flagged for review.
    Observed,
    /// Closed out.
    Attended,
}

impl BagState {
    /// All states, in display order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Observed, Self::Attended];

    /// Parses the backend code, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "PENDIENTE" => Some(Self::Pending),
            "OBSERVADO" => Some(Self::Observed),
            "ATENDIDO" => Some(Self::Attended),
            _ => None,
        }
    }

    /// Wire code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pending => "PENDIENTE",
            Self::Observed => "OBSERVADO",
            Self::Attended => "ATENDIDO",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::Observed => "Observado",
            Self::Attended => "Atendido",
        }
    }
}

/// One row of the solicitud queue, with every field under its canonical name.
///
/// Optional fields stay `None` here; display fallbacks are applied when the
/// loader builds a [`QueueRow`](crate::app::loader::QueueRow).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SolicitudRecord {
    /// Unique within a page.
    pub id: i64,
    pub patient_dni: Option<String>,
    pub patient_name: Option<String>,
    pub patient_sex: Option<String>,
    pub patient_age: Option<u32>,
    pub phone: Option<String>,
    pub alternate_phone: Option<String>,
    pub bag_type_id: Option<i64>,
    pub bag_code: Option<String>,
    pub bag_alias: Option<String>,
    /// Raw preferred date as sent by the backend.
    pub preferred_date: Option<String>,
    pub appointment_type: Option<String>,
    pub specialty: Option<String>,
    pub ascription_facility: Option<String>,
    pub attention_facility: Option<String>,
    pub attention_facility_id: Option<i64>,
    pub network: Option<String>,
    pub bag_state: Option<BagState>,
    pub management_state_code: Option<String>,
    pub manager_id: Option<i64>,
    pub manager_name: Option<String>,
    pub assigned_at: Option<String>,
    pub state_changed_by: Option<String>,
    pub state_changed_at: Option<String>,
    pub medical_condition: Option<String>,
    pub medical_attention_at: Option<String>,
    pub attending_doctor: Option<String>,
    pub requested_at: Option<String>,
}

impl SolicitudRecord {
    /// Normalizes one backend row.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Decode`] if the value is not an object or carries no
    /// usable id under any known spelling. Every other field is optional.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| QueueError::Decode("solicitud row is not an object".to_string()))?;

        let id = pick_i64(object, ID)
            .ok_or_else(|| QueueError::Decode("solicitud row without id".to_string()))?;

        Ok(Self {
            id,
            patient_dni: pick_str(object, DNI),
            patient_name: pick_str(object, NAME),
            patient_sex: pick_str(object, SEX),
            patient_age: pick_i64(object, AGE).and_then(|age| u32::try_from(age).ok()),
            phone: pick_str(object, PHONE),
            alternate_phone: pick_str(object, ALT_PHONE),
            bag_type_id: pick_i64(object, BAG_TYPE_ID),
            bag_code: pick_str(object, BAG_CODE),
            bag_alias: pick_str(object, BAG_ALIAS),
            preferred_date: pick_str(object, PREFERRED_DATE),
            appointment_type: pick_str(object, APPOINTMENT_TYPE),
            specialty: pick_str(object, SPECIALTY),
            ascription_facility: pick_str(object, ASCRIPTION),
            attention_facility: pick_str(object, ATTENTION),
            attention_facility_id: pick_i64(object, ATTENTION_ID),
            network: pick_str(object, NETWORK),
            bag_state: pick_str(object, BAG_STATE).as_deref().and_then(BagState::parse),
            management_state_code: pick_str(object, MANAGEMENT_CODE).map(|code| code.to_uppercase()),
            manager_id: pick_i64(object, MANAGER_ID),
            manager_name: pick_str(object, MANAGER_NAME),
            assigned_at: pick_str(object, ASSIGNED_AT),
            state_changed_by: pick_str(object, CHANGED_BY),
            state_changed_at: pick_str(object, CHANGED_AT),
            medical_condition: pick_str(object, MEDICAL_CONDITION),
            medical_attention_at: pick_str(object, MEDICAL_ATTENTION_AT),
            attending_doctor: pick_str(object, DOCTOR),
            requested_at: pick_str(object, REQUESTED_AT),
        })
    }
}

/// Parses the timestamp shapes the backend emits.
///
/// Accepts RFC 3339, ISO local date-times with or without fractional seconds,
/// plain ISO dates, and `dd/mm/yyyy`. Dates become midnight.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn camel_case_row_is_normalized() {
        let row = json!({
            "idSolicitud": 101,
            "pacienteDni": "45678912",
            "pacienteNombre": "Rosa Quispe",
            "pacienteEdad": 67,
            "estado": "pendiente",
            "codEstadoCita": "citado",
            "responsableGestoraId": 12,
            "fechaPreferidaNoAtendida": "2025-03-04"
        });
        let record = SolicitudRecord::from_json(&row).unwrap();
        assert_eq!(record.id, 101);
        assert_eq!(record.patient_age, Some(67));
        assert_eq!(record.bag_state, Some(BagState::Pending));
        assert_eq!(record.management_state_code.as_deref(), Some("CITADO"));
        assert_eq!(record.manager_id, Some(12));
    }

    #[test]
    fn snake_case_and_string_numbers_map_to_the_same_fields() {
        let row = json!({
            "id_solicitud": "55",
            "paciente_dni": 12345678,
            "telefono_principal": "987654321",
            "telefono_alterno": "",
            "desc_ipress": "CAP III Surquillo",
            "estado_bolsa": "OBSERVADO"
        });
        let record = SolicitudRecord::from_json(&row).unwrap();
        assert_eq!(record.id, 55);
        assert_eq!(record.patient_dni.as_deref(), Some("12345678"));
        assert_eq!(record.phone.as_deref(), Some("987654321"));
        assert_eq!(record.alternate_phone, None);
        assert_eq!(record.ascription_facility.as_deref(), Some("CAP III Surquillo"));
        assert_eq!(record.bag_state, Some(BagState::Observed));
    }

    #[test]
    fn row_without_id_is_a_decode_error() {
        let row = json!({"pacienteNombre": "Sin Id"});
        assert!(matches!(SolicitudRecord::from_json(&row), Err(QueueError::Decode(_))));
    }

    #[test]
    fn timestamps_parse_from_every_shape() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-15"), Some(expected));
        assert_eq!(parse_timestamp("15/01/2025"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15T00:00:00.250").map(|t| t.date()), Some(expected.date()));
        assert!(parse_timestamp("2025-01-15T08:30:00-05:00").is_some());
        assert_eq!(parse_timestamp("mañana"), None);
    }
}
