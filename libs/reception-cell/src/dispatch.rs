// libs/reception-cell/src/dispatch.rs
use serde::de::DeserializeOwned;
use serde_json::Value;

use shared_models::error::AppError;

use crate::handlers::{
    book_appointment_op, cancel_appointment_op, check_availability_op, pre_check_patient_op,
    process_spelled_name_op, search_patients_op, verify_patient_op, ReceptionState,
};
use crate::models::ReceptionError;

/// The closed set of tool operations the voice agent may invoke. Dispatch is
/// by name; anything outside this set is rejected before a payload is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOperation {
    PreCheckPatient,
    VerifyPatient,
    CheckAvailability,
    BookAppointment,
    ProcessSpelledName,
    SearchPatients,
    CancelAppointment,
}

impl ToolOperation {
    pub fn parse(name: &str) -> Result<Self, ReceptionError> {
        match name {
            "pre-check-patient" => Ok(ToolOperation::PreCheckPatient),
            "verify-patient" => Ok(ToolOperation::VerifyPatient),
            "check-availability" => Ok(ToolOperation::CheckAvailability),
            "book-appointment" => Ok(ToolOperation::BookAppointment),
            "process-spelled-name" => Ok(ToolOperation::ProcessSpelledName),
            "search-patients" => Ok(ToolOperation::SearchPatients),
            "cancel-appointment" => Ok(ToolOperation::CancelAppointment),
            other => Err(ReceptionError::UnknownOperation(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolOperation::PreCheckPatient => "pre-check-patient",
            ToolOperation::VerifyPatient => "verify-patient",
            ToolOperation::CheckAvailability => "check-availability",
            ToolOperation::BookAppointment => "book-appointment",
            ToolOperation::ProcessSpelledName => "process-spelled-name",
            ToolOperation::SearchPatients => "search-patients",
            ToolOperation::CancelAppointment => "cancel-appointment",
        }
    }
}

impl From<ReceptionError> for AppError {
    fn from(err: ReceptionError) -> Self {
        match err {
            ReceptionError::UnknownOperation(name) => AppError::UnknownOperation(name),
            ReceptionError::MalformedPayload(detail) => AppError::BadRequest(detail),
        }
    }
}

/// Runs one tool operation against a JSON payload. Only a payload that does
/// not deserialize into the operation's request shape errors here; the
/// operations themselves always produce a speakable envelope.
pub async fn dispatch(
    state: &ReceptionState,
    operation: ToolOperation,
    payload: Value,
) -> Result<Value, ReceptionError> {
    tracing::debug!("Dispatching tool operation {}", operation.as_str());
    match operation {
        ToolOperation::PreCheckPatient => Ok(pre_check_patient_op(state, parse(payload)?).await),
        ToolOperation::VerifyPatient => Ok(verify_patient_op(state, parse(payload)?).await),
        ToolOperation::CheckAvailability => {
            Ok(check_availability_op(state, parse(payload)?).await)
        }
        ToolOperation::BookAppointment => Ok(book_appointment_op(state, parse(payload)?).await),
        ToolOperation::ProcessSpelledName => {
            Ok(process_spelled_name_op(state, parse(payload)?).await)
        }
        ToolOperation::SearchPatients => Ok(search_patients_op(state, parse(payload)?).await),
        ToolOperation::CancelAppointment => {
            Ok(cancel_appointment_op(state, parse(payload)?).await)
        }
    }
}

fn parse<T: DeserializeOwned>(payload: Value) -> Result<T, ReceptionError> {
    serde_json::from_value(payload).map_err(|e| ReceptionError::MalformedPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_every_operation_name() {
        for name in [
            "pre-check-patient",
            "verify-patient",
            "check-availability",
            "book-appointment",
            "process-spelled-name",
            "search-patients",
            "cancel-appointment",
        ] {
            let op = ToolOperation::parse(name).unwrap();
            assert_eq!(op.as_str(), name);
        }
    }

    #[test]
    fn rejects_unknown_operation_names() {
        assert_matches!(
            ToolOperation::parse("register-patient"),
            Err(ReceptionError::UnknownOperation(name)) if name == "register-patient"
        );
        assert_matches!(
            ToolOperation::parse(""),
            Err(ReceptionError::UnknownOperation(_))
        );
    }
}
