use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::gateway::{is_session_id, PaymentGateway, SessionRequest};
use crate::workflows::hiring::domain::{HireId, HireRecord, Principal};
use crate::workflows::hiring::error::HiringError;
use crate::workflows::hiring::ledger::HireLedger;
use crate::workflows::hiring::repository::{HireRepository, ProfileRepository};

pub const HIRE_ID_METADATA_KEY: &str = "hire_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRedirect {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Paid(HireRecord),
    NotPaid,
}

/// Connects checkout sessions at the payment provider with hire records.
pub struct PaymentBridge<H, P> {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<HireLedger<H, P>>,
    hires: Arc<H>,
    profiles: Arc<P>,
}

impl<H, P> PaymentBridge<H, P>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<HireLedger<H, P>>,
        hires: Arc<H>,
        profiles: Arc<P>,
    ) -> Self {
        Self {
            gateway,
            ledger,
            hires,
            profiles,
        }
    }

    /// Opens a provider session for the hire's agreed amount.
    ///
    /// Any authenticated principal may start a checkout; the session is billed to the
    /// hiring client's email when that profile exists.
    pub async fn start_checkout(
        &self,
        principal: Principal,
        hire_id: HireId,
    ) -> Result<CheckoutRedirect, HiringError> {
        let record = self
            .hires
            .fetch(hire_id)?
            .ok_or(HiringError::NotFound("hire"))?;
        let buyer_email = self
            .profiles
            .client(record.client_id)?
            .map(|client| client.contact.email)
            .filter(|email| !email.is_empty());

        let mut metadata = BTreeMap::new();
        metadata.insert(HIRE_ID_METADATA_KEY.to_string(), record.id.to_string());
        metadata.insert("client_id".to_string(), record.client_id.to_string());
        metadata.insert("worker_id".to_string(), record.worker_id.to_string());

        let session = self
            .gateway
            .create_session(SessionRequest {
                amount_minor: minor_units(record.total_amount),
                description: format!("Hire #{}", record.id),
                buyer_email,
                metadata,
            })
            .await
            .map_err(|err| {
                warn!(hire_id = %hire_id, error = %err, "checkout session creation failed");
                HiringError::from(err)
            })?;

        info!(
            hire_id = %hire_id,
            session_id = %session.session_id,
            requested_by = %principal,
            "checkout session created"
        );
        Ok(CheckoutRedirect {
            session_id: session.session_id,
            url: session.redirect_url,
        })
    }

    /// Marks the referenced hire paid when the provider reports the session settled.
    pub async fn confirm(&self, session_id: &str) -> Result<ConfirmOutcome, HiringError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(HiringError::InvalidArgument(
                "session_id is required".to_string(),
            ));
        }
        if !is_session_id(session_id) {
            warn!("rejected malformed checkout session id");
            return Err(HiringError::InvalidArgument(
                "session_id is malformed".to_string(),
            ));
        }

        let state = self
            .gateway
            .retrieve_session(session_id)
            .await
            .map_err(|err| {
                warn!(session_id, error = %err, "checkout session lookup failed");
                HiringError::from(err)
            })?;

        if !state.paid {
            info!(session_id, "checkout session not paid yet");
            return Ok(ConfirmOutcome::NotPaid);
        }

        let hire_id = state
            .metadata
            .get(HIRE_ID_METADATA_KEY)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(HireId)
            .ok_or_else(|| {
                HiringError::InvalidArgument(
                    "checkout session does not reference a hire".to_string(),
                )
            })?;

        let record = self.ledger.confirm_external_payment(hire_id)?;
        info!(session_id, hire_id = %hire_id, "checkout session settled");
        Ok(ConfirmOutcome::Paid(record))
    }
}

fn minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::minor_units;

    #[test]
    fn amounts_round_to_cents() {
        assert_eq!(minor_units(50.0), 5000);
        assert_eq!(minor_units(19.999), 2000);
        assert_eq!(minor_units(0.0), 0);
    }
}
