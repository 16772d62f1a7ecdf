use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a hire record, assigned by storage on creation.
    HireId
);
numeric_id!(
    /// Identifier of a client (the hiring party).
    ClientId
);
numeric_id!(
    /// Identifier of a worker (the hired party).
    WorkerId
);

/// The two account kinds able to act on the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    Client,
    Worker,
}

impl PrincipalKind {
    pub const fn label(self) -> &'static str {
        match self {
            PrincipalKind::Client => "client",
            PrincipalKind::Worker => "worker",
        }
    }
}

/// Authenticated caller, resolved once per request from a bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Principal {
    Client(ClientId),
    Worker(WorkerId),
}

impl Principal {
    pub const fn kind(self) -> PrincipalKind {
        match self {
            Principal::Client(_) => PrincipalKind::Client,
            Principal::Worker(_) => PrincipalKind::Worker,
        }
    }

    pub const fn raw_id(self) -> u64 {
        match self {
            Principal::Client(ClientId(id)) | Principal::Worker(WorkerId(id)) => id,
        }
    }

    pub fn as_client(self) -> Option<ClientId> {
        match self {
            Principal::Client(id) => Some(id),
            Principal::Worker(_) => None,
        }
    }

    pub fn as_worker(self) -> Option<WorkerId> {
        match self {
            Principal::Worker(id) => Some(id),
            Principal::Client(_) => None,
        }
    }

    /// True when the principal is either named party on the record.
    pub fn is_party_to(self, record: &HireRecord) -> bool {
        match self {
            Principal::Client(id) => record.client_id == id,
            Principal::Worker(id) => record.worker_id == id,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind().label(), self.raw_id())
    }
}

/// Worker's answer to a hire request. Freely settable by the named worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceptanceStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl AcceptanceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AcceptanceStatus::Pending => "Pending",
            AcceptanceStatus::Accepted => "Accepted",
            AcceptanceStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
        }
    }
}

/// Moderation state of a worker profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ProfileStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProfileStatus::Pending => "Pending",
            ProfileStatus::Approved => "Approved",
            ProfileStatus::Rejected => "Rejected",
        }
    }
}

/// Which side of a hire is scoring the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingDirection {
    /// Stored in `worker_rating`; counts toward the worker's aggregate.
    ClientRatesWorker,
    /// Stored in `client_rating`; counts toward the client's aggregate.
    WorkerRatesClient,
}

impl RatingDirection {
    pub const fn rater(self) -> PrincipalKind {
        match self {
            RatingDirection::ClientRatesWorker => PrincipalKind::Client,
            RatingDirection::WorkerRatesClient => PrincipalKind::Worker,
        }
    }

    pub const fn field(self) -> &'static str {
        match self {
            RatingDirection::ClientRatesWorker => "worker_rating",
            RatingDirection::WorkerRatesClient => "client_rating",
        }
    }
}

/// Star score in `1..=5`. Storage keeps `0` for "not yet rated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, RatingRangeError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingRangeError(value.to_string()))
        }
    }

    /// Accepts a JSON-style number; fractional, non-finite and out-of-range scores are refused.
    pub fn from_score(score: f64) -> Result<Self, RatingRangeError> {
        if !score.is_finite() || score.fract() != 0.0 {
            return Err(RatingRangeError(score.to_string()));
        }
        if score < f64::from(Self::MIN) || score > f64::from(Self::MAX) {
            return Err(RatingRangeError(score.to_string()));
        }
        Ok(Self(score as u8))
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rating must be a whole number between 1 and 5 (got {0})")]
pub struct RatingRangeError(pub String);

/// Fields blanked by the disclosure filter when the viewer has not paid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: String,
    #[serde(default)]
    pub national_id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub id_photo_front: String,
    #[serde(default)]
    pub id_photo_back: String,
}

impl ContactDetails {
    pub fn blank(&mut self) {
        self.email.clear();
        self.national_id.clear();
        self.phone.clear();
        self.id_photo_front.clear();
        self.id_photo_back.clear();
    }

    pub fn is_blank(&self) -> bool {
        self.email.is_empty()
            && self.national_id.is_empty()
            && self.phone.is_empty()
            && self.id_photo_front.is_empty()
            && self.id_photo_back.is_empty()
    }
}

/// Identity attributes that stay visible to every viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub full_name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub marital_status: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub current_address: String,
    /// Base64-encoded image.
    #[serde(default)]
    pub profile_photo: String,
}

/// Professional attributes owned by a worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkDetails {
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub experience_years: f64,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub profile_title: String,
    #[serde(default)]
    pub profile_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub id: ClientId,
    #[serde(flatten)]
    pub personal: PersonalDetails,
    #[serde(flatten)]
    pub contact: ContactDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub id: WorkerId,
    #[serde(flatten)]
    pub personal: PersonalDetails,
    #[serde(flatten)]
    pub contact: ContactDetails,
    #[serde(flatten)]
    pub work: WorkDetails,
    pub status: ProfileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload accepted when a client account is created or edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientDraft {
    #[serde(flatten)]
    pub personal: PersonalDetails,
    #[serde(flatten)]
    pub contact: ContactDetails,
}

/// Payload accepted when a worker account is created or edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerDraft {
    #[serde(flatten)]
    pub personal: PersonalDetails,
    #[serde(flatten)]
    pub contact: ContactDetails,
    #[serde(flatten)]
    pub work: WorkDetails,
}

/// Scope of the job being requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobParameters {
    /// Size of the premises, in the client's chosen area unit.
    pub area: f64,
    pub rooms: u32,
    pub occupants: u32,
    #[serde(default)]
    pub requested_skills: BTreeSet<String>,
    #[serde(default)]
    pub preferred_schedule: String,
    #[serde(default)]
    pub site_photo: String,
}

/// Client-supplied body of a new hire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HireRequest {
    pub worker_id: WorkerId,
    #[serde(flatten)]
    pub job: JobParameters,
    pub total_amount: f64,
}

/// Validated hire handed to storage, which assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHire {
    pub client_id: ClientId,
    pub worker_id: WorkerId,
    pub job: JobParameters,
    pub total_amount: f64,
}

/// One hiring engagement between a client and a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HireRecord {
    pub id: HireId,
    pub client_id: ClientId,
    pub worker_id: WorkerId,
    #[serde(flatten)]
    pub job: JobParameters,
    pub total_amount: f64,
    pub acceptance_status: AcceptanceStatus,
    pub payment_status: PaymentStatus,
    /// Score the worker gave the client, `0` until rated.
    pub client_rating: u8,
    /// Score the client gave the worker, `0` until rated.
    pub worker_rating: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HireRecord {
    pub fn from_new(id: HireId, hire: NewHire, now: DateTime<Utc>) -> Self {
        Self {
            id,
            client_id: hire.client_id,
            worker_id: hire.worker_id,
            job: hire.job,
            total_amount: hire.total_amount,
            acceptance_status: AcceptanceStatus::Pending,
            payment_status: PaymentStatus::Pending,
            client_rating: 0,
            worker_rating: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn links(&self, client_id: ClientId, worker_id: WorkerId) -> bool {
        self.client_id == client_id && self.worker_id == worker_id
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    pub fn rating(&self, direction: RatingDirection) -> u8 {
        match direction {
            RatingDirection::ClientRatesWorker => self.worker_rating,
            RatingDirection::WorkerRatesClient => self.client_rating,
        }
    }

    /// Score this record contributes to `subject`'s aggregate, if any.
    pub fn rating_received_by(&self, subject: Principal) -> Option<u8> {
        let score = match subject {
            Principal::Worker(id) if id == self.worker_id => self.worker_rating,
            Principal::Client(id) if id == self.client_id => self.client_rating,
            _ => return None,
        };
        (score != 0).then_some(score)
    }
}

/// Minimal view of the other party attached to "my hires" listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartSummary {
    pub id: u64,
    pub full_name: String,
    pub profile_photo: String,
    pub email: String,
}

impl CounterpartSummary {
    pub fn of_client(profile: &ClientProfile) -> Self {
        Self {
            id: profile.id.0,
            full_name: profile.personal.full_name.clone(),
            profile_photo: profile.personal.profile_photo.clone(),
            email: profile.contact.email.clone(),
        }
    }

    pub fn of_worker(profile: &WorkerProfile) -> Self {
        Self {
            id: profile.id.0,
            full_name: profile.personal.full_name.clone(),
            profile_photo: profile.personal.profile_photo.clone(),
            email: profile.contact.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HireListing {
    #[serde(flatten)]
    pub record: HireRecord,
    pub counterpart: Option<CounterpartSummary>,
}
