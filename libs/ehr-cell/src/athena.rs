// libs/ehr-cell/src/athena.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::client::EhrClient;
use crate::models::{
    BookedAppointment, BookingRequest, EhrError, OpenSlot, OpenSlotPage, PatientQuery,
    PatientRecord, PatientSearchPage,
};
use crate::token::{OAuthTokenProvider, TokenProvider};

/// AthenaHealth REST client. A 401 from any endpoint invalidates the cached
/// token and surfaces `EhrError::Auth`; the next call re-authenticates. No
/// endpoint is retried here.
pub struct AthenaClient {
    http: Client,
    base_url: String,
    practice_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl AthenaClient {
    pub fn new(config: &AppConfig) -> Self {
        let tokens = Arc::new(OAuthTokenProvider::new(
            &config.athena_base_url,
            &config.athena_client_id,
            &config.athena_client_secret,
        ));
        Self::with_token_provider(config, tokens)
    }

    pub fn with_token_provider(config: &AppConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http: Client::new(),
            base_url: config.athena_base_url.clone(),
            practice_id: config.athena_practice_id.clone(),
            tokens,
        }
    }

    fn practice_url(&self, path: &str) -> String {
        format!("{}/v1/{}{}", self.base_url, self.practice_id, path)
    }

    /// Map a non-success response to an error, handling the shared 401 path.
    async fn fail(&self, response: Response) -> EhrError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if status == 401 {
            warn!("Athena returned 401, invalidating cached token");
            self.tokens.invalidate().await;
            return EhrError::Auth;
        }

        error!("Athena API error ({}): {}", status, body);
        EhrError::Api { status, body }
    }
}

#[async_trait]
impl EhrClient for AthenaClient {
    async fn search_patients(&self, query: PatientQuery) -> Result<Vec<PatientRecord>, EhrError> {
        let mut params: Vec<(&str, String)> = vec![("limit", query.limit.to_string())];
        if let Some(first) = &query.first_name {
            params.push(("firstname", first.clone()));
        }
        if let Some(last) = &query.last_name {
            params.push(("lastname", last.clone()));
        }
        if let Some(dob) = &query.date_of_birth {
            params.push(("dob", dob.clone()));
        }
        if let Some(phone) = &query.phone {
            params.push(("homephone", phone.clone()));
        }

        if params.len() == 1 {
            return Err(EhrError::EmptyQuery);
        }

        let token = self.tokens.get_token().await?;
        let url = self.practice_url("/patients");
        debug!("Searching patients at {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }

        let page: PatientSearchPage = response.json().await?;
        Ok(page.patients)
    }

    async fn check_availability(
        &self,
        department_id: &str,
        start_date: &str,
        end_date: &str,
        limit: i32,
    ) -> Result<Vec<OpenSlot>, EhrError> {
        let token = self.tokens.get_token().await?;
        let url = self.practice_url("/appointments/open");
        debug!(
            "Checking open slots for department {} from {} to {}",
            department_id, start_date, end_date
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("departmentid", department_id),
                ("startdate", start_date),
                ("enddate", end_date),
                ("reasonid", "-1"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(EhrError::NotFound(format!(
                "department {} not found: {}",
                department_id, body
            )));
        }
        if !status.is_success() {
            return Err(self.fail(response).await);
        }

        let page: OpenSlotPage = response.json().await?;
        Ok(page.appointments)
    }

    async fn book_appointment(&self, request: BookingRequest) -> Result<BookedAppointment, EhrError> {
        let token = self.tokens.get_token().await?;
        let url = self.practice_url(&format!("/appointments/{}", request.appointment_id));

        let mut form: Vec<(&str, String)> = vec![("patientid", request.patient_id.clone())];
        // Athena prefers reasonid over the legacy appointmenttypeid.
        if let Some(reason_id) = &request.reason_id {
            form.push(("reasonid", reason_id.clone()));
        } else if let Some(type_id) = &request.appointment_type_id {
            form.push(("appointmenttypeid", type_id.clone()));
        } else if let Some(reason) = &request.reason {
            form.push(("appointmentreason", reason.clone()));
        }
        if let Some(insurance_id) = &request.insurance_id {
            form.push(("insuranceid", insurance_id.clone()));
        }

        debug!(
            "Booking slot {} for patient {}",
            request.appointment_id, request.patient_id
        );

        let response = self.http.put(&url).bearer_auth(token).form(&form).send().await?;

        let status = response.status().as_u16();
        match status {
            200 => {
                let raw: Value = response.json().await?;
                Ok(BookedAppointment {
                    appointment_id: request.appointment_id,
                    patient_id: request.patient_id,
                    raw,
                })
            }
            409 => {
                let body = response.text().await.unwrap_or_default();
                Err(EhrError::SlotTaken(body))
            }
            400 => {
                let body = response.text().await.unwrap_or_default();
                Err(EhrError::InvalidBooking(body))
            }
            404 => Err(EhrError::NotFound(format!(
                "appointment {} not found or not available",
                request.appointment_id
            ))),
            _ => Err(self.fail(response).await),
        }
    }

    async fn cancel_appointment(&self, appointment_id: &str) -> Result<(), EhrError> {
        let token = self.tokens.get_token().await?;
        let url = self.practice_url(&format!("/appointments/{}/cancel", appointment_id));
        debug!("Cancelling appointment {}", appointment_id);

        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .form(&[("cancelreason", "patient request")])
            .send()
            .await?;

        let status = response.status().as_u16();
        match status {
            200 => Ok(()),
            404 => Err(EhrError::NotFound(format!(
                "appointment {} not found",
                appointment_id
            ))),
            400 => {
                let body = response.text().await.unwrap_or_default();
                Err(EhrError::InvalidBooking(body))
            }
            _ => Err(self.fail(response).await),
        }
    }
}
