// libs/ehr-cell/src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ==============================================================================
// PROVIDER RECORD MODELS
// ==============================================================================
//
// Field names are provider-specific lower-case (`patientid`, `starttime`).
// Every field is optional: sandbox and production tenants disagree on which
// fields a record carries, so the consumer must tolerate anything missing.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default)]
    pub patientid: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub homephone: Option<String>,
    #[serde(default)]
    pub lastappointmentdate: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenSlot {
    #[serde(default)]
    pub appointmentid: Option<Value>,
    #[serde(default)]
    pub starttime: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub providername: Option<String>,
    #[serde(default)]
    pub appointmenttypeid: Option<Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl OpenSlot {
    /// Athena returns numeric ids on some endpoints and strings on others.
    pub fn appointment_id_string(&self) -> Option<String> {
        match &self.appointmentid {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ==============================================================================
// COLLABORATOR RESULT MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientSearchPage {
    #[serde(default)]
    pub patients: Vec<PatientRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenSlotPage {
    #[serde(default)]
    pub appointments: Vec<OpenSlot>,
}

#[derive(Debug, Clone)]
pub struct PatientQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub limit: i32,
}

impl Default for PatientQuery {
    fn default() -> Self {
        Self {
            first_name: None,
            last_name: None,
            phone: None,
            date_of_birth: None,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub appointment_id: String,
    pub patient_id: String,
    pub appointment_type_id: Option<String>,
    pub reason_id: Option<String>,
    pub reason: Option<String>,
    pub insurance_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookedAppointment {
    pub appointment_id: String,
    pub patient_id: String,
    pub raw: Value,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EhrError {
    #[error("Authentication failed - token expired or rejected")]
    Auth,

    #[error("Appointment slot is no longer available")]
    SlotTaken(String),

    #[error("Invalid booking data: {0}")]
    InvalidBooking(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("At least one search parameter is required")]
    EmptyQuery,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
