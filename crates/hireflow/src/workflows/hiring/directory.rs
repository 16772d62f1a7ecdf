use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::disclosure::{disclose, public_view, visibility, Disclosable, Disclosed};
use super::domain::{
    ClientDraft, ClientId, ClientProfile, ContactDetails, HireRecord, PersonalDetails, Principal,
    ProfileStatus, WorkerDraft, WorkerId, WorkerProfile,
};
use super::error::HiringError;
use super::ratings::{aggregate, RatingSummary};
use super::repository::{HireFilter, HireRepository, ProfileRepository, WorkerFilter};

/// Hire and rating figures derived from the ledger at read time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileStats {
    pub hire_count: usize,
    pub rating_count: usize,
    pub average_rating: f64,
}

impl From<&RatingSummary> for ProfileStats {
    fn from(summary: &RatingSummary) -> Self {
        Self {
            hire_count: summary.hire_count,
            rating_count: summary.rating_count,
            average_rating: summary.average_rating,
        }
    }
}

/// Search-result entry: redacted-safe worker profile plus statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerListing {
    #[serde(flatten)]
    pub profile: WorkerProfile,
    #[serde(flatten)]
    pub stats: ProfileStats,
}

/// Detail view after the disclosure filter, plus statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDetail<T> {
    #[serde(flatten)]
    pub disclosed: Disclosed<T>,
    #[serde(flatten)]
    pub stats: ProfileStats,
}

/// Worker discovery, profile lookups and account upkeep.
pub struct DirectoryService<H, P> {
    hires: Arc<H>,
    profiles: Arc<P>,
}

impl<H, P> DirectoryService<H, P>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    pub fn new(hires: Arc<H>, profiles: Arc<P>) -> Self {
        Self { hires, profiles }
    }

    pub fn register_client(&self, draft: ClientDraft) -> Result<ClientProfile, HiringError> {
        validate_identity(&draft.personal, &draft.contact)?;
        let profile = self.profiles.insert_client(draft)?;
        info!(client_id = %profile.id, "client registered");
        Ok(profile)
    }

    /// New workers start in moderation status `Pending`.
    pub fn register_worker(&self, draft: WorkerDraft) -> Result<WorkerProfile, HiringError> {
        validate_identity(&draft.personal, &draft.contact)?;
        validate_experience(draft.work.experience_years)?;
        let profile = self.profiles.insert_worker(draft)?;
        info!(worker_id = %profile.id, "worker registered");
        Ok(profile)
    }

    pub fn update_client(
        &self,
        principal: Principal,
        draft: ClientDraft,
    ) -> Result<ClientProfile, HiringError> {
        let client_id = principal
            .as_client()
            .ok_or(HiringError::Forbidden("only clients may edit client profiles"))?;
        validate_identity(&draft.personal, &draft.contact)?;

        let mut profile = self.load_client(client_id)?;
        profile.personal = draft.personal;
        profile.contact = draft.contact;
        Ok(self.profiles.update_client(profile)?)
    }

    /// Self-update; moderation status is left untouched.
    pub fn update_worker(
        &self,
        principal: Principal,
        draft: WorkerDraft,
    ) -> Result<WorkerProfile, HiringError> {
        let worker_id = principal
            .as_worker()
            .ok_or(HiringError::Forbidden("only workers may edit worker profiles"))?;
        validate_identity(&draft.personal, &draft.contact)?;
        validate_experience(draft.work.experience_years)?;

        let mut profile = self.load_worker(worker_id)?;
        profile.personal = draft.personal;
        profile.contact = draft.contact;
        profile.work = draft.work;
        Ok(self.profiles.update_worker(profile)?)
    }

    pub fn list_workers(&self, filter: &WorkerFilter) -> Result<Vec<WorkerListing>, HiringError> {
        self.profiles
            .workers(filter)?
            .into_iter()
            .map(|profile| self.listing(profile))
            .collect()
    }

    pub fn worker_listing(&self, worker_id: WorkerId) -> Result<WorkerListing, HiringError> {
        let profile = self.load_worker(worker_id)?;
        self.listing(profile)
    }

    pub fn worker_detail(
        &self,
        viewer: Principal,
        worker_id: WorkerId,
    ) -> Result<ProfileDetail<WorkerProfile>, HiringError> {
        let profile = self.load_worker(worker_id)?;
        let hires = self.hires.list(HireFilter::for_worker(worker_id))?;
        detail(viewer, profile, &hires)
    }

    pub fn client_detail(
        &self,
        viewer: Principal,
        client_id: ClientId,
    ) -> Result<ProfileDetail<ClientProfile>, HiringError> {
        let profile = self.load_client(client_id)?;
        let hires = self.hires.list(HireFilter::for_client(client_id))?;
        detail(viewer, profile, &hires)
    }

    /// Public: anyone may read a worker's rating distribution.
    pub fn worker_ratings(&self, worker_id: WorkerId) -> Result<RatingSummary, HiringError> {
        let hires = self.hires.list(HireFilter::for_worker(worker_id))?;
        Ok(aggregate(Principal::Worker(worker_id), &hires))
    }

    /// Visible to the client themself and to workers the client has hired.
    pub fn client_ratings(
        &self,
        viewer: Principal,
        client_id: ClientId,
    ) -> Result<RatingSummary, HiringError> {
        let subject = Principal::Client(client_id);
        let hires = self.hires.list(HireFilter::for_client(client_id))?;
        visibility(viewer, subject, &hires)?;
        Ok(aggregate(subject, &hires))
    }

    pub fn set_worker_status(
        &self,
        worker_id: WorkerId,
        status: ProfileStatus,
    ) -> Result<WorkerProfile, HiringError> {
        let profile = self
            .profiles
            .set_worker_status(worker_id, status)
            .map_err(|err| match HiringError::from(err) {
                HiringError::NotFound(_) => HiringError::NotFound("worker"),
                other => other,
            })?;
        info!(worker_id = %worker_id, status = status.label(), "worker moderation status changed");
        Ok(profile)
    }

    /// Unredacted operator views.
    pub fn all_workers(&self) -> Result<Vec<WorkerProfile>, HiringError> {
        Ok(self.profiles.workers(&WorkerFilter::everyone())?)
    }

    pub fn all_clients(&self) -> Result<Vec<ClientProfile>, HiringError> {
        Ok(self.profiles.clients()?)
    }

    fn listing(&self, profile: WorkerProfile) -> Result<WorkerListing, HiringError> {
        let hires = self.hires.list(HireFilter::for_worker(profile.id))?;
        let summary = aggregate(Principal::Worker(profile.id), &hires);
        Ok(WorkerListing {
            profile: public_view(profile),
            stats: ProfileStats::from(&summary),
        })
    }

    fn load_worker(&self, worker_id: WorkerId) -> Result<WorkerProfile, HiringError> {
        self.profiles
            .worker(worker_id)?
            .ok_or(HiringError::NotFound("worker"))
    }

    fn load_client(&self, client_id: ClientId) -> Result<ClientProfile, HiringError> {
        self.profiles
            .client(client_id)?
            .ok_or(HiringError::NotFound("client"))
    }
}

fn detail<T>(
    viewer: Principal,
    profile: T,
    hires: &[HireRecord],
) -> Result<ProfileDetail<T>, HiringError>
where
    T: Disclosable,
{
    let summary = aggregate(profile.subject(), hires);
    let disclosed = disclose(viewer, profile, hires)?;
    Ok(ProfileDetail {
        disclosed,
        stats: ProfileStats::from(&summary),
    })
}

fn validate_identity(personal: &PersonalDetails, contact: &ContactDetails) -> Result<(), HiringError> {
    if personal.full_name.trim().is_empty() {
        return Err(HiringError::InvalidArgument("full_name is required".to_string()));
    }
    let email = contact.email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(HiringError::InvalidArgument(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

fn validate_experience(years: f64) -> Result<(), HiringError> {
    if years.is_finite() && years >= 0.0 {
        Ok(())
    } else {
        Err(HiringError::InvalidArgument(
            "experience_years must be a non-negative number".to_string(),
        ))
    }
}
