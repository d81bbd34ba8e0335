// libs/reception-cell/src/services/scheduling.rs
use std::sync::Arc;

use ehr_cell::client::EhrClient;
use ehr_cell::models::{BookingRequest, EhrError};
use tracing::{info, warn};

use crate::models::{AvailabilitySlot, BookingOutcome, DateRange};

/// At most this many open slots are read back to the caller; more is noise
/// over the phone.
const SPOKEN_SLOT_LIMIT: usize = 5;

/// Availability lookup and booking against the EHR's scheduling endpoints.
/// Booking is fail-closed: without a slot id from a prior availability
/// check, no booking call is attempted.
pub struct Scheduler {
    ehr: Arc<dyn EhrClient>,
    department_id: String,
}

impl Scheduler {
    pub fn new(ehr: Arc<dyn EhrClient>, department_id: String) -> Self {
        Self { ehr, department_id }
    }

    /// Open slots for the range, trimmed to what can be spoken. A single-day
    /// range asks the EHR for fewer candidates than a multi-day window.
    pub async fn check_availability(
        &self,
        department_id: Option<&str>,
        range: &DateRange,
    ) -> Result<Vec<AvailabilitySlot>, EhrError> {
        let department_id = department_id.unwrap_or(&self.department_id);
        let limit = if range.is_single_day() { 5 } else { 10 };
        let slots = self
            .ehr
            .check_availability(department_id, &range.start_mdy(), &range.end_mdy(), limit)
            .await?;

        Ok(slots
            .into_iter()
            .filter_map(|slot| {
                let appointment_id = slot.appointment_id_string()?;
                Some(AvailabilitySlot {
                    time: slot.starttime.unwrap_or_default(),
                    date: slot.date.unwrap_or_default(),
                    provider: slot.providername.unwrap_or_else(|| "our provider".to_string()),
                    appointment_id,
                    system: "athena",
                })
            })
            .take(SPOKEN_SLOT_LIMIT)
            .collect())
    }

    /// Books a specific open slot. Exactly one attempt is made; a contested
    /// slot surfaces the EHR's own message so the caller hears why.
    pub async fn book(&self, request: BookingRequest) -> BookingOutcome {
        if request.appointment_id.trim().is_empty() {
            return BookingOutcome::Rejected {
                reason_code: "check_availability_required",
                message: "I need to check which appointment slots are open before booking. Let me look at availability for that date first.".to_string(),
            };
        }

        match self.ehr.book_appointment(request).await {
            Ok(booked) => {
                info!("Booked appointment {} for patient {}", booked.appointment_id, booked.patient_id);
                BookingOutcome::Booked {
                    confirmation_id: booked.appointment_id,
                    details: booked.raw,
                }
            }
            Err(EhrError::SlotTaken(body)) => BookingOutcome::Rejected {
                reason_code: "slot_taken",
                message: body,
            },
            Err(EhrError::InvalidBooking(body)) => BookingOutcome::Rejected {
                reason_code: "invalid_booking",
                message: body,
            },
            Err(EhrError::NotFound(body)) => BookingOutcome::Rejected {
                reason_code: "slot_not_found",
                message: body,
            },
            Err(error) => {
                warn!("Booking attempt failed: {}", error);
                BookingOutcome::Rejected {
                    reason_code: "booking_failed",
                    message: error.to_string(),
                }
            }
        }
    }

    pub async fn cancel(&self, appointment_id: &str) -> Result<(), EhrError> {
        self.ehr.cancel_appointment(appointment_id).await
    }
}
