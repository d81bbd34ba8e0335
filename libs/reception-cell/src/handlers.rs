// libs/reception-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Map, Value};
use tracing::info;

use ehr_cell::athena::AthenaClient;
use ehr_cell::client::EhrClient;
use ehr_cell::models::{BookingRequest, PatientQuery};
use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::dispatch::{dispatch, ToolOperation};
use crate::models::{
    success_response, error_response, BookAppointmentRequest, CancelAppointmentRequest,
    CheckAvailabilityRequest, IdentityClaim, PatientResolution, ProcessSpelledNameRequest,
    SearchPatientsRequest, UncertainReason, VerifyPatientRequest,
};
use crate::services::complexity::{HeuristicNameScorer, NameComplexityScorer};
use crate::services::compose::{cultural_confirmation, personalize, Tone};
use crate::services::normalize::{
    normalize_date_of_birth, normalize_phone, parse_spoken_date, split_patient_name,
};
use crate::services::resolver::PatientResolver;
use crate::services::scheduling::Scheduler;
use crate::models::BookingOutcome;

// ==============================================================================
// SHARED STATE
// ==============================================================================

/// Everything the webhook handlers need, wired once at startup.
pub struct ReceptionState {
    pub ehr: Arc<dyn EhrClient>,
    pub resolver: PatientResolver,
    pub scheduler: Scheduler,
    pub scorer: Arc<dyn NameComplexityScorer>,
    pub default_appointment_type_id: String,
}

impl ReceptionState {
    pub fn new(config: &AppConfig) -> Arc<Self> {
        Self::with_client(config, Arc::new(AthenaClient::new(config)))
    }

    /// Wires the state around an arbitrary EHR collaborator. Tests inject
    /// fakes through this.
    pub fn with_client(config: &AppConfig, ehr: Arc<dyn EhrClient>) -> Arc<Self> {
        let scorer: Arc<dyn NameComplexityScorer> = Arc::new(HeuristicNameScorer);
        Arc::new(Self {
            resolver: PatientResolver::new(ehr.clone(), scorer.clone()),
            scheduler: Scheduler::new(ehr.clone(), config.default_department_id.clone()),
            scorer,
            ehr,
            default_appointment_type_id: config.default_appointment_type_id.clone(),
        })
    }
}

// ==============================================================================
// TOOL OPERATIONS
// ==============================================================================
//
// Every operation is total: whatever happens inside, the voice agent receives
// a speakable JSON envelope, never an HTTP error. The `*_op` functions hold
// the logic; the axum wrappers below them only adapt the transport.

/// Early-conversation identity check. The resolver decides whether we found
/// the caller, need spelling, or should offer registration.
pub async fn pre_check_patient_op(
    state: &ReceptionState,
    request: VerifyPatientRequest,
) -> Value {
    let claim = IdentityClaim {
        raw_name: request.patient_name,
        raw_phone: request.patient_phone,
        raw_date_of_birth: request.date_of_birth,
    };
    let resolution = state.resolver.resolve(&claim).await;
    let mut payload = resolution_payload(&resolution);
    if let Value::Object(body) = &mut payload {
        body.insert("provider".to_string(), json!("athena"));
    }
    payload
}

/// Strict identity verification: one search with every detail the caller
/// gave, normalized, limit 1.
pub async fn verify_patient_op(state: &ReceptionState, request: VerifyPatientRequest) -> Value {
    let (first_name, last_name) = split_patient_name(request.patient_name.as_deref().unwrap_or(""));

    let query = PatientQuery {
        first_name: none_if_empty(first_name),
        last_name: none_if_empty(last_name),
        phone: request
            .patient_phone
            .as_deref()
            .map(normalize_phone)
            .and_then(none_if_empty),
        date_of_birth: request
            .date_of_birth
            .as_deref()
            .map(normalize_date_of_birth)
            .and_then(none_if_empty),
        limit: 1,
    };

    match state.ehr.search_patients(query).await {
        Ok(patients) => match patients.into_iter().next() {
            Some(patient) => {
                let first = request
                    .patient_name
                    .as_deref()
                    .map(|name| split_patient_name(name).0)
                    .unwrap_or_default();
                json!({
                    "verified": true,
                    "message": format!("I found your record, {}", first),
                    "patient_id": patient.patientid,
                    "last_visit": patient.lastappointmentdate,
                    "provider": "athena"
                })
            }
            None => json!({
                "verified": false,
                "message": "I couldn't find your patient record",
                "suggestion": "You may need to register as a new patient",
                "provider": "athena"
            }),
        },
        Err(error) => error_response(
            "I'm having trouble verifying your information",
            Some(&error.to_string()),
        ),
    }
}

/// Open-slot lookup for a natural-language date, with an optional identity
/// pre-check when the caller already gave a name.
pub async fn check_availability_op(
    state: &ReceptionState,
    request: CheckAvailabilityRequest,
) -> Value {
    let resolution = match request.patient_name.as_deref().filter(|n| !n.trim().is_empty()) {
        Some(_) => Some(
            state
                .resolver
                .resolve(&IdentityClaim {
                    raw_name: request.patient_name.clone(),
                    raw_phone: request.patient_phone.clone(),
                    raw_date_of_birth: None,
                })
                .await,
        ),
        None => None,
    };

    let range = parse_spoken_date(
        request.date.as_deref().unwrap_or("tomorrow"),
        chrono::Local::now().date_naive(),
    );

    let slots = match state
        .scheduler
        .check_availability(request.department_id.as_deref(), &range)
        .await
    {
        Ok(slots) => slots,
        Err(error) => {
            return error_response(
                "I'm having trouble checking availability right now. Let me try again in a moment.",
                Some(&error.to_string()),
            )
        }
    };

    let date_checked = range.start_mdy();
    let available = !slots.is_empty();
    let slot_count = slots.len();
    let mut body = Map::new();
    body.insert("success".to_string(), json!(true));
    body.insert("available".to_string(), json!(available));
    body.insert("slots".to_string(), json!(slots));
    body.insert("date_checked".to_string(), json!(date_checked));
    body.insert("provider".to_string(), json!("athena"));

    // Every envelope carries a speakable message; the identity-aware arms
    // below override this baseline.
    body.insert(
        "message".to_string(),
        json!(if available {
            format!(
                "I found {} available appointment times on {}.",
                slot_count, date_checked
            )
        } else {
            format!(
                "I don't have any openings on {}. Would you like me to check another day?",
                date_checked
            )
        }),
    );

    // Fold the identity pre-check into the spoken message so the agent does
    // not have to stitch two responses together.
    if let Some(resolution) = resolution {
        let name = request.patient_name.as_deref().unwrap_or("");
        match &resolution {
            PatientResolution::Found { .. } if available => {
                body.insert(
                    "message".to_string(),
                    json!(personalize(
                        Some(name),
                        &format!(
                            "I found {} available appointments for you on {}.",
                            slot_count, date_checked
                        ),
                        Tone::Success,
                    )),
                );
                body.insert(
                    "booking_instruction".to_string(),
                    json!(format!(
                        "Great {}! When you're ready to book, just let me know which time works best for you.",
                        split_patient_name(name).0
                    )),
                );
            }
            PatientResolution::Found { .. } => {
                body.insert(
                    "message".to_string(),
                    json!(personalize(
                        Some(name),
                        &format!(
                            "I don't have any openings on {}, but I can look at nearby days for you.",
                            date_checked
                        ),
                        Tone::Clarification,
                    )),
                );
            }
            PatientResolution::NotFound { search_method, .. }
                if available && *search_method == "not_found" =>
            {
                body.insert(
                    "message".to_string(),
                    json!(personalize(
                        Some(name),
                        &format!(
                            "I found {} available appointments on {}. Since you're new to our practice, I'll need to register you first.",
                            slot_count, date_checked
                        ),
                        Tone::Clarification,
                    )),
                );
                body.insert(
                    "booking_instruction".to_string(),
                    json!(format!(
                        "{}, I can book one of these times for you after we get you registered. Would you like to proceed with registration?",
                        split_patient_name(name).0
                    )),
                );
                body.insert("requires_registration".to_string(), json!(true));
            }
            _ => {}
        }
        body.insert("patient_status".to_string(), resolution_payload(&resolution));
    }

    Value::Object(body)
}

/// Books a previously surfaced slot. Without a slot id the operation refuses
/// and directs the agent back to an availability check; no guessing.
pub async fn book_appointment_op(state: &ReceptionState, request: BookAppointmentRequest) -> Value {
    let (first_name, last_name) =
        split_patient_name(request.patient_name.as_deref().unwrap_or(""));
    if first_name.is_empty() || last_name.is_empty() {
        return json!({
            "success": false,
            "message": "I need your full name to book the appointment",
            "missing_info": ["patient_name"]
        });
    }

    let patient_id = match find_patient_id(state, &first_name, &last_name, request.patient_phone.as_deref()).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            return json!({
                "success": false,
                "message": "I couldn't find your patient record. Would you like me to register you as a new patient?",
                "action_needed": "new_patient_registration",
                "suggestion": "I can help you register as a new patient if you'd like to proceed."
            })
        }
        Err(error) => {
            return error_response(
                "I encountered an error while booking your appointment",
                Some(&error.to_string()),
            )
        }
    };

    let service_type = request
        .service_type
        .clone()
        .unwrap_or_else(|| "appointment".to_string());
    let outcome = state
        .scheduler
        .book(BookingRequest {
            appointment_id: request.appointment_id.clone().unwrap_or_default(),
            patient_id,
            appointment_type_id: Some(state.default_appointment_type_id.clone()),
            reason_id: request.reason_id.clone(),
            reason: Some(
                request
                    .service_type
                    .clone()
                    .unwrap_or_else(|| "Office Visit".to_string()),
            ),
            insurance_id: request.insurance_id.clone(),
        })
        .await;

    match outcome {
        BookingOutcome::Booked { confirmation_id, details } => json!({
            "success": true,
            "message": format!("Perfect! Your {} appointment has been booked successfully!", service_type),
            "confirmation_number": confirmation_id,
            "details": details,
            "provider": "athena",
            "next_steps": "You should receive a confirmation call or email. Please arrive 15 minutes early."
        }),
        BookingOutcome::Rejected { reason_code: "check_availability_required", message } => json!({
            "success": false,
            "message": message,
            "action_needed": "check_availability",
            "missing_info": ["appointment_id"],
            "suggestion": "Please let me check the availability again to get the correct appointment slot"
        }),
        BookingOutcome::Rejected { reason_code, message } => json!({
            "success": false,
            "message": format!("I'm sorry, I couldn't book that appointment. {}", message),
            "reason": message,
            "reason_code": reason_code,
            "provider": "athena",
            "suggestion": "Would you like me to check for other available times?"
        }),
    }
}

/// Reconstructs a letter-by-letter spelled name, confirms it with a cultural
/// affirmation and, in the search context, retries the patient lookup.
pub async fn process_spelled_name_op(
    state: &ReceptionState,
    request: ProcessSpelledNameRequest,
) -> Value {
    let spelled = request.spelled_name.as_deref().unwrap_or("").trim().to_string();
    if spelled.is_empty() {
        return json!({
            "success": false,
            "message": "I didn't catch the spelling. Could you spell your name again, letter by letter?",
            "action_needed": "repeat_spelling"
        });
    }

    let processed = reconstruct_spelled_name(&spelled);
    let assessment = state.scorer.assess(&processed);
    let confirmation = cultural_confirmation(&processed, &assessment.cultural_indicators);
    let context = request.context.as_deref().unwrap_or("search");

    match context {
        "search" => {
            let (first_name, last_name) = split_patient_name(&processed);
            if first_name.is_empty() || last_name.is_empty() {
                return json!({
                    "success": false,
                    "message": "I need both your first and last name. Could you spell your full name for me?",
                    "action_needed": "get_full_name_spelling"
                });
            }

            let query = PatientQuery {
                first_name: Some(first_name),
                last_name: Some(last_name),
                ..Default::default()
            };
            match state.ehr.search_patients(query).await {
                Ok(patients) => match patients.into_iter().next() {
                    Some(patient) => json!({
                        "success": true,
                        "patient_found": true,
                        "patient_id": patient.patientid,
                        "patient_info": patient,
                        "processed_name": processed,
                        "message": format!("{} I found your record! Let me check what appointments are available for you.", confirmation),
                        "action_needed": "proceed_with_scheduling"
                    }),
                    None => json!({
                        "success": true,
                        "patient_found": false,
                        "processed_name": processed,
                        "message": format!("{} I don't see you in our system yet. I'll get you registered first, then we can schedule your appointment.", confirmation),
                        "action_needed": "proceed_with_registration",
                        "next_step": "get_phone_number"
                    }),
                },
                Err(error) => json!({
                    "success": false,
                    "message": "I'm having trouble processing that. Could you spell your name again?",
                    "action_needed": "repeat_spelling",
                    "error": error.to_string()
                }),
            }
        }
        "registration" => json!({
            "success": true,
            "processed_name": processed,
            "message": format!("{} Now I'll need some additional information to register you.", confirmation),
            "action_needed": "continue_registration",
            "next_step": "get_phone_number"
        }),
        _ => json!({
            "success": true,
            "processed_name": processed,
            "message": format!("{} I have your name as {}.", confirmation, processed),
            "action_needed": "name_confirmed",
            "cultural_context": assessment.cultural_indicators
        }),
    }
}

/// Raw patient search for the agent: whatever fields it has, normalized and
/// passed through.
pub async fn search_patients_op(state: &ReceptionState, request: SearchPatientsRequest) -> Value {
    let query = PatientQuery {
        first_name: request.first_name.and_then(none_if_empty),
        last_name: request.last_name.and_then(none_if_empty),
        phone: request
            .phone
            .as_deref()
            .map(normalize_phone)
            .and_then(none_if_empty),
        date_of_birth: request
            .date_of_birth
            .as_deref()
            .map(normalize_date_of_birth)
            .and_then(none_if_empty),
        limit: request.limit.unwrap_or(10),
    };

    match state.ehr.search_patients(query).await {
        Ok(patients) => json!({
            "success": true,
            "count": patients.len(),
            "patients": patients
        }),
        Err(error) => error_response("Error searching for patients.", Some(&error.to_string())),
    }
}

pub async fn cancel_appointment_op(
    state: &ReceptionState,
    request: CancelAppointmentRequest,
) -> Value {
    let salutation = request
        .patient_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .map(|n| format!(", {}", n))
        .unwrap_or_default();

    let Some(appointment_id) = request.appointment_id.filter(|id| !id.trim().is_empty()) else {
        return success_response(
            &format!(
                "I'll help you cancel your appointment{}. Can you tell me what date and time your appointment is scheduled for?",
                salutation
            ),
            json!({
                "action_needed": "get_appointment_details",
                "next_step": "find_appointment_to_cancel"
            }),
        );
    };

    match state.scheduler.cancel(&appointment_id).await {
        Ok(()) => {
            info!("Cancelled appointment {}", appointment_id);
            success_response(
                &format!(
                    "I've cancelled your appointment{}. You should receive a confirmation shortly. Is there anything else I can help you with?",
                    salutation
                ),
                json!({
                    "cancellation_confirmed": true,
                    "appointment_id": appointment_id,
                    "confirmation_sent": true
                }),
            )
        }
        Err(error) => error_response(
            "I'm having trouble cancelling that appointment. Let me transfer you to our front desk to help you with this.",
            Some(&error.to_string()),
        ),
    }
}

// ==============================================================================
// AXUM HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn pre_check_patient(
    State(state): State<Arc<ReceptionState>>,
    Json(request): Json<VerifyPatientRequest>,
) -> Json<Value> {
    Json(pre_check_patient_op(&state, request).await)
}

#[axum::debug_handler]
pub async fn verify_patient(
    State(state): State<Arc<ReceptionState>>,
    Json(request): Json<VerifyPatientRequest>,
) -> Json<Value> {
    Json(verify_patient_op(&state, request).await)
}

#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<ReceptionState>>,
    Json(request): Json<CheckAvailabilityRequest>,
) -> Json<Value> {
    Json(check_availability_op(&state, request).await)
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<ReceptionState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Json<Value> {
    Json(book_appointment_op(&state, request).await)
}

#[axum::debug_handler]
pub async fn process_spelled_name(
    State(state): State<Arc<ReceptionState>>,
    Json(request): Json<ProcessSpelledNameRequest>,
) -> Json<Value> {
    Json(process_spelled_name_op(&state, request).await)
}

#[axum::debug_handler]
pub async fn search_patients(
    State(state): State<Arc<ReceptionState>>,
    Json(request): Json<SearchPatientsRequest>,
) -> Json<Value> {
    Json(search_patients_op(&state, request).await)
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<ReceptionState>>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Json<Value> {
    Json(cancel_appointment_op(&state, request).await)
}

/// Single dispatch endpoint: the operation name travels in the path, the
/// payload is whatever the agent extracted. Unknown names are a boundary
/// error, not a speakable envelope.
#[axum::debug_handler]
pub async fn invoke_operation(
    State(state): State<Arc<ReceptionState>>,
    Path(operation): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let operation = ToolOperation::parse(&operation)?;
    let response = dispatch(&state, operation, payload).await?;
    Ok(Json(response))
}

// ==============================================================================
// HELPERS
// ==============================================================================

/// Flattens a `PatientResolution` into the envelope the voice agent consumes.
fn resolution_payload(resolution: &PatientResolution) -> Value {
    let mut body = Map::new();
    match resolution {
        PatientResolution::Found { patient_id, record, message } => {
            body.insert("exists".to_string(), json!(true));
            body.insert("patient_id".to_string(), json!(patient_id));
            body.insert("patient_info".to_string(), json!(record));
            body.insert("message".to_string(), json!(message));
            body.insert("action_needed".to_string(), json!("proceed_with_scheduling"));
            body.insert("search_method".to_string(), json!("exact_match"));
        }
        PatientResolution::Uncertain {
            reason,
            message,
            spelling_prompt,
            cultural_context,
            confidence,
            phonetic_key,
        } => {
            match reason {
                UncertainReason::GetPatientName | UncertainReason::GetFullName => {
                    body.insert("exists".to_string(), json!(false));
                }
                UncertainReason::SpellNameFirst | UncertainReason::SpellNameForSearch => {
                    body.insert("exists".to_string(), json!("uncertain"));
                    body.insert("cultural_context".to_string(), json!(cultural_context));
                    body.insert("confidence".to_string(), json!(confidence));
                }
            }
            body.insert("message".to_string(), json!(message));
            body.insert("action_needed".to_string(), json!(reason.as_str()));
            if let Some(prompt) = spelling_prompt {
                body.insert("spelling_prompt".to_string(), json!(prompt));
            }
            if let Some(key) = phonetic_key {
                body.insert("phonetic_key".to_string(), json!(key));
            }
        }
        PatientResolution::NotFound { message, registration_prompt, search_method, error } => {
            body.insert("exists".to_string(), json!(false));
            body.insert("message".to_string(), json!(message));
            if *search_method == "manual_verification" {
                body.insert("action_needed".to_string(), json!("manual_verification"));
            } else {
                body.insert("action_needed".to_string(), json!("offer_registration"));
                body.insert("search_method".to_string(), json!(search_method));
            }
            if let Some(prompt) = registration_prompt {
                body.insert("registration_prompt".to_string(), json!(prompt));
            }
            if let Some(err) = error {
                body.insert("error".to_string(), json!(err));
            }
        }
    }
    Value::Object(body)
}

/// Phone-augmented search first, then name-only. The booking path does not
/// second-guess transcription quality; the agent is expected to have run the
/// identity pre-check already.
async fn find_patient_id(
    state: &ReceptionState,
    first_name: &str,
    last_name: &str,
    phone: Option<&str>,
) -> Result<Option<String>, ehr_cell::models::EhrError> {
    let phone_digits = phone.map(normalize_phone).unwrap_or_default();

    if phone_digits.len() >= 10 {
        let matches = state
            .ehr
            .search_patients(PatientQuery {
                first_name: Some(first_name.to_string()),
                last_name: Some(last_name.to_string()),
                phone: Some(phone_digits),
                ..Default::default()
            })
            .await?;
        if let Some(record) = matches.into_iter().next() {
            return Ok(record.patientid);
        }
    }

    let matches = state
        .ehr
        .search_patients(PatientQuery {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            ..Default::default()
        })
        .await?;
    Ok(matches.into_iter().next().and_then(|record| record.patientid))
}

/// "G-B-O-Y-E-G-A O-F-I" becomes "Gboyega Ofi". Filler like "last name" that
/// callers insert between the two words is stripped first.
fn reconstruct_spelled_name(spelled: &str) -> String {
    let mut cleaned = spelled.to_string();
    for filler in ["Last name", "last name", "First name", "first name"] {
        cleaned = cleaned.replace(filler, "");
    }

    cleaned
        .split_whitespace()
        .map(|word| title_case(&word.replace('-', "")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn none_if_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
