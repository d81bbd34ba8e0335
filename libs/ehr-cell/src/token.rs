// libs/ehr-cell/src/token.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::EhrError;

/// Bearer-token capability for an EHR API. The client calls `get_token` before
/// every request and `invalidate` when the provider answers 401; the provider
/// owns the cache, the caller never touches token state directly.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<String, EhrError>;
    async fn invalidate(&self);
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// OAuth2 client-credentials provider with an in-process cache. Tokens are
/// reused until `invalidate` is called; expiry is handled reactively through
/// the 401 path rather than by tracking `expires_in`.
pub struct OAuthTokenProvider {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<String>>,
}

impl OAuthTokenProvider {
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            http: Client::new(),
            token_url: format!("{}/oauth2/v1/token", base_url),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            cached: RwLock::new(None),
        }
    }

    async fn fetch_token(&self) -> Result<String, EhrError> {
        debug!("Requesting new access token from {}", self.token_url);

        let basic = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .http
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials"), ("scope", "athena/service/Athenanet.MDP.*")])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 {
            warn!("Token endpoint rejected client credentials");
            return Err(EhrError::Auth);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EhrError::TokenExchange(format!("HTTP {} - {}", status, body)));
        }

        let token_data: TokenResponse = response.json().await?;
        token_data
            .access_token
            .ok_or_else(|| EhrError::TokenExchange("no access_token in response".to_string()))
    }
}

#[async_trait]
impl TokenProvider for OAuthTokenProvider {
    async fn get_token(&self) -> Result<String, EhrError> {
        if let Some(token) = self.cached.read().await.as_ref() {
            return Ok(token.clone());
        }

        let token = self.fetch_token().await?;
        *self.cached.write().await = Some(token.clone());
        Ok(token)
    }

    async fn invalidate(&self) {
        debug!("Invalidating cached access token");
        *self.cached.write().await = None;
    }
}
