use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub athena_base_url: String,
    pub athena_client_id: String,
    pub athena_client_secret: String,
    pub athena_practice_id: String,
    pub default_department_id: String,
    pub default_appointment_type_id: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            athena_base_url: env::var("ATHENA_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("ATHENA_BASE_URL not set, using sandbox endpoint");
                    "https://api.preview.platform.athenahealth.com".to_string()
                }),
            athena_client_id: env::var("ATHENA_CLIENT_ID")
                .unwrap_or_else(|_| {
                    warn!("ATHENA_CLIENT_ID not set, using empty value");
                    String::new()
                }),
            athena_client_secret: env::var("ATHENA_CLIENT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("ATHENA_CLIENT_SECRET not set, using empty value");
                    String::new()
                }),
            athena_practice_id: env::var("ATHENA_PRACTICE_ID")
                .unwrap_or_else(|_| {
                    warn!("ATHENA_PRACTICE_ID not set, using empty value");
                    String::new()
                }),
            default_department_id: env::var("DEFAULT_DEPARTMENT_ID")
                .unwrap_or_else(|_| "1".to_string()),
            default_appointment_type_id: env::var("DEFAULT_APPOINTMENT_TYPE_ID")
                .unwrap_or_else(|_| "2".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.athena_base_url.is_empty()
            && !self.athena_client_id.is_empty()
            && !self.athena_client_secret.is_empty()
            && !self.athena_practice_id.is_empty()
    }
}
