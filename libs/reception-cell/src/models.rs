// libs/reception-cell/src/models.rs
use chrono::NaiveDate;
use ehr_cell::models::PatientRecord;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ==============================================================================
// TRANSIENT VALUE OBJECTS
// ==============================================================================
//
// Nothing here persists. A webhook call constructs these, composes a response,
// and drops them.

/// What the caller provided this turn, untouched.
#[derive(Debug, Clone, Default)]
pub struct IdentityClaim {
    pub raw_name: Option<String>,
    pub raw_phone: Option<String>,
    pub raw_date_of_birth: Option<String>,
}

/// Inclusive calendar range, `start <= end` by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    pub fn start_mdy(&self) -> String {
        self.start.format("%m/%d/%Y").to_string()
    }

    pub fn end_mdy(&self) -> String {
        self.end.format("%m/%d/%Y").to_string()
    }
}

/// Why a resolution came back uncertain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertainReason {
    GetPatientName,
    GetFullName,
    SpellNameFirst,
    SpellNameForSearch,
}

impl UncertainReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UncertainReason::GetPatientName => "get_patient_name",
            UncertainReason::GetFullName => "get_full_name",
            UncertainReason::SpellNameFirst => "spell_name_first",
            UncertainReason::SpellNameForSearch => "spell_name_for_search",
        }
    }
}

/// Outcome of matching a caller's spoken identity to an EHR record.
#[derive(Debug, Clone)]
pub enum PatientResolution {
    Found {
        patient_id: String,
        record: PatientRecord,
        message: String,
    },
    Uncertain {
        reason: UncertainReason,
        message: String,
        spelling_prompt: Option<String>,
        cultural_context: Vec<String>,
        confidence: i32,
        /// Advisory Soundex key; no phonetic lookup is performed today.
        phonetic_key: Option<String>,
    },
    NotFound {
        message: String,
        registration_prompt: Option<String>,
        /// `not_found` for a clean miss, `manual_verification` when the EHR
        /// collaborator failed and we could not tell either way.
        search_method: &'static str,
        error: Option<String>,
    },
}

/// A bookable slot, sourced verbatim from the EHR collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilitySlot {
    pub time: String,
    pub date: String,
    pub provider: String,
    pub appointment_id: String,
    pub system: &'static str,
}

#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Booked {
        confirmation_id: String,
        details: Value,
    },
    Rejected {
        reason_code: &'static str,
        message: String,
    },
}

// ==============================================================================
// WEBHOOK REQUEST MODELS
// ==============================================================================
//
// All fields optional strings: the voice agent sends whatever it extracted
// from the conversation, which is frequently partial.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckAvailabilityRequest {
    pub department_id: Option<String>,
    /// Natural-language date from the caller.
    pub date: Option<String>,
    pub service_type: Option<String>,
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub service_type: Option<String>,
    /// Slot id from a prior availability check.
    pub appointment_id: Option<String>,
    pub reason_id: Option<String>,
    pub insurance_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyPatientRequest {
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub date_of_birth: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessSpelledNameRequest {
    pub spelled_name: Option<String>,
    /// "search" or "registration"; anything else just confirms the name.
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPatientsRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub limit: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelAppointmentRequest {
    pub appointment_id: Option<String>,
    pub patient_name: Option<String>,
}

// ==============================================================================
// RESPONSE ENVELOPE
// ==============================================================================

/// Standardized success envelope: `success:true`, a speakable `message`, plus
/// operation-specific extras.
pub fn success_response(message: &str, data: Value) -> Value {
    envelope(true, message, data)
}

/// Standardized failure envelope. `error` is machine-readable detail for
/// logs; `message` stays conversational for text-to-speech.
pub fn error_response(message: &str, error: Option<&str>) -> Value {
    let mut data = Map::new();
    if let Some(err) = error {
        data.insert("error".to_string(), json!(err));
    }
    envelope(false, message, Value::Object(data))
}

fn envelope(success: bool, message: &str, data: Value) -> Value {
    let mut body = Map::new();
    body.insert("success".to_string(), json!(success));
    body.insert("message".to_string(), json!(message));
    if let Value::Object(extra) = data {
        for (key, value) in extra {
            body.insert(key, value);
        }
    }
    Value::Object(body)
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ReceptionError {
    #[error("Unknown tool operation: {0}")]
    UnknownOperation(String),

    #[error("Malformed tool payload: {0}")]
    MalformedPayload(String),
}
