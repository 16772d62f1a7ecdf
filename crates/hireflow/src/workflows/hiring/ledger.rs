use std::sync::Arc;

use tracing::info;

use super::domain::{
    AcceptanceStatus, ClientId, CounterpartSummary, HireId, HireListing, HireRecord, HireRequest,
    NewHire, PaymentStatus, Principal, Rating, RatingDirection, WorkerId,
};
use super::error::HiringError;
use super::repository::{HireFilter, HireRepository, HireUpdate, ProfileRepository};

/// Owns hire creation and the acceptance, payment and rating transitions.
///
/// Every operation checks the caller's role and party membership before writing, and every
/// write is a single [`HireUpdate`] so the store applies it atomically.
pub struct HireLedger<H, P> {
    hires: Arc<H>,
    profiles: Arc<P>,
}

impl<H, P> HireLedger<H, P>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    pub fn new(hires: Arc<H>, profiles: Arc<P>) -> Self {
        Self { hires, profiles }
    }

    /// Client opens a new engagement with a worker. Repeat hires of the same worker are allowed.
    pub fn create_hire(
        &self,
        principal: Principal,
        request: HireRequest,
    ) -> Result<HireRecord, HiringError> {
        let client_id = require_client(principal)?;
        validate_request(&request)?;

        if self.profiles.worker(request.worker_id)?.is_none() {
            return Err(HiringError::NotFound("worker"));
        }

        let record = self.hires.insert(NewHire {
            client_id,
            worker_id: request.worker_id,
            job: request.job,
            total_amount: request.total_amount,
        })?;

        info!(
            hire_id = %record.id,
            client_id = %record.client_id,
            worker_id = %record.worker_id,
            total_amount = record.total_amount,
            "hire created"
        );
        Ok(record)
    }

    pub fn set_acceptance(
        &self,
        principal: Principal,
        hire_id: HireId,
        status: AcceptanceStatus,
    ) -> Result<HireRecord, HiringError> {
        let worker_id = require_worker(principal)?;
        let record = self.load(hire_id)?;
        if record.worker_id != worker_id {
            return Err(HiringError::Forbidden("only the hired worker may respond"));
        }

        let updated = self.hires.apply(hire_id, HireUpdate::Acceptance(status))?;
        info!(hire_id = %hire_id, status = status.label(), "acceptance status updated");
        Ok(updated)
    }

    pub fn set_payment(
        &self,
        principal: Principal,
        hire_id: HireId,
        status: PaymentStatus,
    ) -> Result<HireRecord, HiringError> {
        let client_id = require_client(principal)?;
        let record = self.load(hire_id)?;
        if record.client_id != client_id {
            return Err(HiringError::Forbidden("only the hiring client may settle payment"));
        }

        let updated = self.hires.apply(hire_id, HireUpdate::Payment(status))?;
        info!(hire_id = %hire_id, status = status.label(), "payment status updated");
        Ok(updated)
    }

    /// Marks a hire paid after the payment provider confirmed the session.
    ///
    /// Replays re-apply the same write, so repeated confirmations are harmless.
    pub fn confirm_external_payment(&self, hire_id: HireId) -> Result<HireRecord, HiringError> {
        let updated = self
            .hires
            .apply(hire_id, HireUpdate::Payment(PaymentStatus::Paid))
            .map_err(|err| match HiringError::from(err) {
                HiringError::NotFound(_) => HiringError::NotFound("hire"),
                other => other,
            })?;
        info!(hire_id = %hire_id, "external payment confirmed");
        Ok(updated)
    }

    pub fn rate_counterparty(
        &self,
        principal: Principal,
        hire_id: HireId,
        score: f64,
        direction: RatingDirection,
    ) -> Result<HireRecord, HiringError> {
        let rating = Rating::from_score(score)?;
        let record = self.load(hire_id)?;
        if principal.kind() != direction.rater() {
            return Err(HiringError::Forbidden("caller is on the wrong side of this rating"));
        }
        if !principal.is_party_to(&record) {
            return Err(HiringError::Forbidden("caller is not a party to this hire"));
        }

        let updated = self
            .hires
            .apply(hire_id, HireUpdate::Rating { direction, rating })?;
        info!(
            hire_id = %hire_id,
            field = direction.field(),
            rating = rating.value(),
            "rating recorded"
        );
        Ok(updated)
    }

    pub fn get_hire(&self, principal: Principal, hire_id: HireId) -> Result<HireRecord, HiringError> {
        let record = self.load(hire_id)?;
        if !principal.is_party_to(&record) {
            return Err(HiringError::Forbidden("caller is not a party to this hire"));
        }
        Ok(record)
    }

    /// The worker's hires, each carrying a summary of the client.
    pub fn list_for_worker(&self, principal: Principal) -> Result<Vec<HireListing>, HiringError> {
        let worker_id = require_worker(principal)?;
        self.hires
            .list(HireFilter::for_worker(worker_id))?
            .into_iter()
            .map(|record| -> Result<HireListing, HiringError> {
                let counterpart = self
                    .profiles
                    .client(record.client_id)?
                    .as_ref()
                    .map(CounterpartSummary::of_client);
                Ok(HireListing {
                    record,
                    counterpart,
                })
            })
            .collect()
    }

    /// The client's hires, each carrying a summary of the worker.
    pub fn list_for_client(&self, principal: Principal) -> Result<Vec<HireListing>, HiringError> {
        let client_id = require_client(principal)?;
        self.hires
            .list(HireFilter::for_client(client_id))?
            .into_iter()
            .map(|record| -> Result<HireListing, HiringError> {
                let counterpart = self
                    .profiles
                    .worker(record.worker_id)?
                    .as_ref()
                    .map(CounterpartSummary::of_worker);
                Ok(HireListing {
                    record,
                    counterpart,
                })
            })
            .collect()
    }

    /// Every hire on the platform, for operator review.
    pub fn all_hires(&self) -> Result<Vec<HireRecord>, HiringError> {
        Ok(self.hires.list(HireFilter::default())?)
    }

    fn load(&self, hire_id: HireId) -> Result<HireRecord, HiringError> {
        self.hires
            .fetch(hire_id)?
            .ok_or(HiringError::NotFound("hire"))
    }
}

fn require_client(principal: Principal) -> Result<ClientId, HiringError> {
    principal
        .as_client()
        .ok_or(HiringError::Forbidden("client account required"))
}

fn require_worker(principal: Principal) -> Result<WorkerId, HiringError> {
    principal
        .as_worker()
        .ok_or(HiringError::Forbidden("worker account required"))
}

fn validate_request(request: &HireRequest) -> Result<(), HiringError> {
    if !request.total_amount.is_finite() || request.total_amount < 0.0 {
        return Err(HiringError::InvalidArgument(
            "total_amount must be a non-negative number".to_string(),
        ));
    }
    if !request.job.area.is_finite() || request.job.area < 0.0 {
        return Err(HiringError::InvalidArgument(
            "area must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}
