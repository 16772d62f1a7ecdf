//! Payment-session provider port and its HTTP adapter.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::PaymentConfig;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment provider is not configured")]
    NotConfigured,
    #[error("payment provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment provider answered {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("could not read payment provider response: {0}")]
    Parse(String),
    #[error("malformed checkout session id")]
    InvalidSessionId,
}

/// Provider session ids are opaque tokens such as `cs_test_a1B2`. Anything else is refused
/// before it can reach a request path.
pub fn is_session_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= 255
        && candidate
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

/// What the bridge asks the provider to charge.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    /// Minor currency units (cents).
    pub amount_minor: i64,
    pub description: String,
    pub buyer_email: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub session_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub session_id: String,
    pub paid: bool,
    pub metadata: BTreeMap<String, String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: SessionRequest)
        -> Result<CheckoutSession, PaymentError>;
    async fn retrieve_session(&self, session_id: &str) -> Result<SessionState, PaymentError>;
}

/// Stand-in used when no provider key is configured. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_session(
        &self,
        _request: SessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        Err(PaymentError::NotConfigured)
    }

    async fn retrieve_session(&self, _session_id: &str) -> Result<SessionState, PaymentError> {
        Err(PaymentError::NotConfigured)
    }
}

/// Client for a Stripe-compatible checkout-sessions API.
pub struct CheckoutGateway {
    client: Client,
    api_base: String,
    secret_key: String,
    currency: String,
    success_url: String,
    cancel_url: String,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl CheckoutGateway {
    pub fn new(config: &PaymentConfig, secret_key: impl Into<String>) -> Result<Self, PaymentError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            currency: config.currency.clone(),
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
        })
    }

    fn session_form(&self, request: &SessionRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                self.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_minor.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.description.clone(),
            ),
        ];
        if let Some(email) = &request.buyer_email {
            form.push(("customer_email".to_string(), email.clone()));
        }
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }
        form
    }

    async fn read_session(response: reqwest::Response) -> Result<SessionBody, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ProviderErrorBody>().await {
                Ok(body) => body
                    .error
                    .message
                    .unwrap_or_else(|| "no error message".to_string()),
                Err(err) => err.to_string(),
            };
            return Err(PaymentError::Provider {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<SessionBody>()
            .await
            .map_err(|err| PaymentError::Parse(err.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for CheckoutGateway {
    async fn create_session(
        &self,
        request: SessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&self.session_form(&request))
            .send()
            .await?;

        let body = Self::read_session(response).await?;
        let redirect_url = body
            .url
            .ok_or_else(|| PaymentError::Parse("session has no redirect url".to_string()))?;
        Ok(CheckoutSession {
            session_id: body.id,
            redirect_url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionState, PaymentError> {
        if !is_session_id(session_id) {
            return Err(PaymentError::InvalidSessionId);
        }
        let response = self
            .client
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.api_base))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let body = Self::read_session(response).await?;
        Ok(SessionState {
            paid: body.payment_status.as_deref() == Some("paid"),
            session_id: body.id,
            metadata: body.metadata,
        })
    }
}

impl std::fmt::Debug for CheckoutGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutGateway")
            .field("api_base", &self.api_base)
            .field("currency", &self.currency)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
