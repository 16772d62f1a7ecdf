use super::domain::{
    AcceptanceStatus, ClientDraft, ClientId, ClientProfile, HireId, HireRecord, NewHire,
    PaymentStatus, ProfileStatus, Rating, RatingDirection, WorkerDraft, WorkerId, WorkerProfile,
};

/// Single-record mutation applied atomically by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HireUpdate {
    Acceptance(AcceptanceStatus),
    Payment(PaymentStatus),
    /// Conditional: only lands when the target field is still `0`.
    Rating {
        direction: RatingDirection,
        rating: Rating,
    },
}

/// Equality filter over hire records. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HireFilter {
    pub client_id: Option<ClientId>,
    pub worker_id: Option<WorkerId>,
}

impl HireFilter {
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn for_worker(worker_id: WorkerId) -> Self {
        Self {
            worker_id: Some(worker_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &HireRecord) -> bool {
        self.client_id.map_or(true, |id| record.client_id == id)
            && self.worker_id.map_or(true, |id| record.worker_id == id)
    }
}

/// Storage port for hire records.
pub trait HireRepository: Send + Sync {
    fn insert(&self, hire: NewHire) -> Result<HireRecord, RepositoryError>;
    fn fetch(&self, id: HireId) -> Result<Option<HireRecord>, RepositoryError>;
    /// Applies `update` to the record and returns the stored result.
    fn apply(&self, id: HireId, update: HireUpdate) -> Result<HireRecord, RepositoryError>;
    fn list(&self, filter: HireFilter) -> Result<Vec<HireRecord>, RepositoryError>;
}

/// Worker search criteria. `status: None` means every status except `Rejected`,
/// unless `any_status` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerFilter {
    pub skill: Option<String>,
    pub job_type: Option<String>,
    pub city: Option<String>,
    pub status: Option<ProfileStatus>,
    pub any_status: bool,
}

impl WorkerFilter {
    pub fn everyone() -> Self {
        Self {
            any_status: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, profile: &WorkerProfile) -> bool {
        let status_ok = match (self.status, self.any_status) {
            (Some(status), _) => profile.status == status,
            (None, true) => true,
            (None, false) => profile.status != ProfileStatus::Rejected,
        };
        let skill_ok = self.skill.as_deref().map_or(true, |wanted| {
            profile
                .work
                .skills
                .iter()
                .any(|skill| skill.eq_ignore_ascii_case(wanted))
        });
        let job_ok = self
            .job_type
            .as_deref()
            .map_or(true, |wanted| profile.work.job_type.eq_ignore_ascii_case(wanted));
        let city_ok = self
            .city
            .as_deref()
            .map_or(true, |wanted| profile.personal.city.eq_ignore_ascii_case(wanted));
        status_ok && skill_ok && job_ok && city_ok
    }
}

/// Storage port for client and worker profiles. Emails are unique per kind.
pub trait ProfileRepository: Send + Sync {
    fn insert_client(&self, draft: ClientDraft) -> Result<ClientProfile, RepositoryError>;
    fn insert_worker(&self, draft: WorkerDraft) -> Result<WorkerProfile, RepositoryError>;
    fn client(&self, id: ClientId) -> Result<Option<ClientProfile>, RepositoryError>;
    fn worker(&self, id: WorkerId) -> Result<Option<WorkerProfile>, RepositoryError>;
    fn client_by_email(&self, email: &str) -> Result<Option<ClientProfile>, RepositoryError>;
    fn worker_by_email(&self, email: &str) -> Result<Option<WorkerProfile>, RepositoryError>;
    fn clients(&self) -> Result<Vec<ClientProfile>, RepositoryError>;
    fn workers(&self, filter: &WorkerFilter) -> Result<Vec<WorkerProfile>, RepositoryError>;
    fn update_client(&self, profile: ClientProfile) -> Result<ClientProfile, RepositoryError>;
    fn update_worker(&self, profile: WorkerProfile) -> Result<WorkerProfile, RepositoryError>;
    fn set_worker_status(
        &self,
        id: WorkerId,
        status: ProfileStatus,
    ) -> Result<WorkerProfile, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("rating already recorded")]
    RatingAlreadySet,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
