// libs/ehr-cell/src/client.rs
use async_trait::async_trait;

use crate::models::{
    BookedAppointment, BookingRequest, EhrError, OpenSlot, PatientQuery, PatientRecord,
};

/// Contract the reception core consumes from an EHR backend. Every call is a
/// single remote attempt: retries, token refresh, and rate limiting belong to
/// the implementation, never to the caller.
#[async_trait]
pub trait EhrClient: Send + Sync {
    /// Search patients by demographics. Result ranking is the provider's
    /// responsibility; callers take the head of the list.
    async fn search_patients(&self, query: PatientQuery) -> Result<Vec<PatientRecord>, EhrError>;

    /// List open appointment slots for a department within a date range
    /// (MM/DD/YYYY inclusive on both ends).
    async fn check_availability(
        &self,
        department_id: &str,
        start_date: &str,
        end_date: &str,
        limit: i32,
    ) -> Result<Vec<OpenSlot>, EhrError>;

    /// Book an existing open slot for a patient.
    async fn book_appointment(&self, request: BookingRequest) -> Result<BookedAppointment, EhrError>;

    /// Cancel a booked appointment.
    async fn cancel_appointment(&self, appointment_id: &str) -> Result<(), EhrError>;
}
