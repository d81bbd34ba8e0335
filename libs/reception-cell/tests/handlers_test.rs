use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use ehr_cell::client::EhrClient;
use ehr_cell::models::{
    BookedAppointment, BookingRequest, EhrError, OpenSlot, PatientQuery, PatientRecord,
};
use reception_cell::handlers::ReceptionState;
use reception_cell::router::reception_routes;
use shared_config::AppConfig;

/// Canned EHR collaborator for routing tests.
struct CannedEhr {
    patients: Vec<PatientRecord>,
    slots: Vec<OpenSlot>,
    booking_conflict: Option<String>,
}

impl CannedEhr {
    fn with_patient() -> Self {
        Self {
            patients: vec![PatientRecord {
                patientid: Some("42".to_string()),
                firstname: Some("Test".to_string()),
                lastname: Some("Patient".to_string()),
                ..Default::default()
            }],
            slots: Vec::new(),
            booking_conflict: None,
        }
    }
}

#[async_trait]
impl EhrClient for CannedEhr {
    async fn search_patients(&self, _query: PatientQuery) -> Result<Vec<PatientRecord>, EhrError> {
        Ok(self.patients.clone())
    }

    async fn check_availability(
        &self,
        _department_id: &str,
        _start_date: &str,
        _end_date: &str,
        _limit: i32,
    ) -> Result<Vec<OpenSlot>, EhrError> {
        Ok(self.slots.clone())
    }

    async fn book_appointment(
        &self,
        request: BookingRequest,
    ) -> Result<BookedAppointment, EhrError> {
        if let Some(conflict) = &self.booking_conflict {
            return Err(EhrError::SlotTaken(conflict.clone()));
        }
        Ok(BookedAppointment {
            appointment_id: request.appointment_id,
            patient_id: request.patient_id,
            raw: json!([{"appointmentid": "998877"}]),
        })
    }

    async fn cancel_appointment(&self, _appointment_id: &str) -> Result<(), EhrError> {
        Ok(())
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        athena_base_url: "http://localhost:0".to_string(),
        athena_client_id: "id".to_string(),
        athena_client_secret: "secret".to_string(),
        athena_practice_id: "195900".to_string(),
        default_department_id: "1".to_string(),
        default_appointment_type_id: "2".to_string(),
    }
}

fn app_with(ehr: CannedEhr) -> Router {
    reception_routes(ReceptionState::with_client(&test_config(), Arc::new(ehr)))
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn book_without_slot_id_directs_back_to_availability() {
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(
        app,
        "/book-appointment",
        json!({"patient_name": "Test Patient", "date": "tomorrow", "time": "9am"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["action_needed"], "check_availability");
    assert_eq!(body["missing_info"][0], "appointment_id");
}

#[tokio::test]
async fn booking_conflict_keeps_provider_text_in_the_message() {
    let mut ehr = CannedEhr::with_patient();
    ehr.booking_conflict = Some("That slot was taken a moment ago".to_string());
    let app = app_with(ehr);

    let (status, body) = post_json(
        app,
        "/book-appointment",
        json!({"patient_name": "Test Patient", "appointment_id": "998877"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["reason"], "That slot was taken a moment ago");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("That slot was taken a moment ago"));
}

#[tokio::test]
async fn successful_booking_returns_confirmation_number() {
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(
        app,
        "/book-appointment",
        json!({
            "patient_name": "Test Patient",
            "appointment_id": "998877",
            "service_type": "checkup"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["confirmation_number"], "998877");
    assert!(body["message"].as_str().unwrap().contains("checkup"));
}

#[tokio::test]
async fn unknown_invoke_operation_is_a_404() {
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(app, "/invoke/register-patient", json!({})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("register-patient"));
}

#[tokio::test]
async fn invoke_dispatches_to_the_named_operation() {
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(
        app,
        "/invoke/pre-check-patient",
        json!({"patient_name": "Test Patient"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);
    assert_eq!(body["patient_id"], "42");
    assert_eq!(body["action_needed"], "proceed_with_scheduling");
}

#[tokio::test]
async fn verify_patient_reports_verified_with_record_details() {
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(
        app,
        "/verify-patient",
        json!({
            "patient_name": "Test Patient",
            "patient_phone": "210-784-8551",
            "date_of_birth": "January 1, 1988"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], true);
    assert_eq!(body["patient_id"], "42");
    assert_eq!(body["message"], "I found your record, Test");
}

#[tokio::test]
async fn check_availability_shapes_slots_for_speech() {
    let mut ehr = CannedEhr::with_patient();
    ehr.slots = vec![OpenSlot {
        appointmentid: Some(json!(998877)),
        starttime: Some("09:00".to_string()),
        date: Some("06/21/2025".to_string()),
        providername: Some("Dr. Adams".to_string()),
        ..Default::default()
    }];
    let app = app_with(ehr);

    let (status, body) = post_json(app, "/check-availability", json!({"date": "tomorrow"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["available"], true);
    assert_eq!(body["slots"][0]["time"], "09:00");
    assert_eq!(body["slots"][0]["provider"], "Dr. Adams");
    assert_eq!(body["slots"][0]["appointment_id"], "998877");
    assert_eq!(body["slots"][0]["system"], "athena");
    assert!(body["date_checked"].is_string());
    assert!(body["message"].as_str().unwrap().contains("available appointment times"));
}

#[tokio::test]
async fn known_patient_with_no_openings_hears_a_clarification() {
    // Patient resolves, but the day is fully booked.
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(
        app,
        "/check-availability",
        json!({"patient_name": "Test Patient", "date": "tomorrow"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Test"), "message was: {}", message);
    assert!(message.contains("don't have any openings"), "message was: {}", message);
    assert_eq!(body["patient_status"]["exists"], true);
}

#[tokio::test]
async fn new_patient_with_openings_is_directed_to_registration() {
    let ehr = CannedEhr {
        patients: Vec::new(),
        slots: vec![OpenSlot {
            appointmentid: Some(json!("998877")),
            starttime: Some("09:00".to_string()),
            date: Some("06/21/2025".to_string()),
            providername: Some("Dr. Adams".to_string()),
            ..Default::default()
        }],
        booking_conflict: None,
    };
    let app = app_with(ehr);

    let (status, body) = post_json(
        app,
        "/check-availability",
        json!({"patient_name": "Test Patient", "date": "tomorrow"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    assert_eq!(body["requires_registration"], true);
    assert!(body["message"].as_str().unwrap().contains("new to our practice"));
    assert!(body["booking_instruction"]
        .as_str()
        .unwrap()
        .contains("proceed with registration"));
}

#[tokio::test]
async fn process_spelled_name_reconstructs_hyphenated_letters() {
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(
        app,
        "/process-spelled-name",
        json!({"spelled_name": "G-B-O-Y-E-G-A O-F-I", "context": "confirm"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["processed_name"], "Gboyega Ofi");
    assert_eq!(body["action_needed"], "name_confirmed");
}

#[tokio::test]
async fn process_spelled_name_in_search_context_finds_the_patient() {
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(
        app,
        "/process-spelled-name",
        json!({"spelled_name": "T-E-S-T Last name P-A-T-I-E-N-T", "context": "search"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["patient_found"], true);
    assert_eq!(body["patient_id"], "42");
    assert_eq!(body["processed_name"], "Test Patient");
}

#[tokio::test]
async fn cancel_without_id_asks_for_appointment_details() {
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(
        app,
        "/cancel-appointment",
        json!({"patient_name": "Test Patient"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["action_needed"], "get_appointment_details");
}

#[tokio::test]
async fn cancel_with_id_confirms_the_cancellation() {
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(
        app,
        "/cancel-appointment",
        json!({"appointment_id": "998877", "patient_name": "Test Patient"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["cancellation_confirmed"], true);
    assert_eq!(body["appointment_id"], "998877");
}

#[tokio::test]
async fn search_patients_returns_the_record_list() {
    let app = app_with(CannedEhr::with_patient());

    let (status, body) = post_json(
        app,
        "/search-patients",
        json!({"last_name": "Patient"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 1);
    assert_eq!(body["patients"][0]["patientid"], "42");
}
