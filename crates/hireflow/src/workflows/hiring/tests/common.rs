use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::workflows::hiring::domain::{
    ClientDraft, ClientId, ClientProfile, ContactDetails, HireId, HireRecord, HireRequest,
    JobParameters, NewHire, PersonalDetails, Principal, ProfileStatus, WorkDetails, WorkerDraft,
    WorkerId, WorkerProfile,
};
use crate::workflows::hiring::payments::{
    CheckoutSession, PaymentError, PaymentGateway, SessionRequest, SessionState,
};
use crate::workflows::hiring::profile_text::{
    ProfileCopy, ProfileTextGenerator, TextGenerationError,
};
use crate::workflows::hiring::repository::{
    HireFilter, HireRepository, HireUpdate, ProfileRepository, RepositoryError,
};
use crate::workflows::hiring::{
    hiring_router, DirectoryService, HireLedger, HiringApi, InMemoryHireRepository,
    InMemoryProfileRepository, OperatorKey, TokenSigner,
};

pub(super) const OPERATOR_KEY: &str = "operator-key";

pub(super) fn client_draft(name: &str, email: &str) -> ClientDraft {
    ClientDraft {
        personal: PersonalDetails {
            full_name: name.to_string(),
            gender: "female".to_string(),
            state: "Punjab".to_string(),
            city: "Lahore".to_string(),
            current_address: "12 Canal Road".to_string(),
            ..PersonalDetails::default()
        },
        contact: ContactDetails {
            email: email.to_string(),
            national_id: "35202-1234567-1".to_string(),
            phone: "+92 300 0000000".to_string(),
            id_photo_front: "front-b64".to_string(),
            id_photo_back: "back-b64".to_string(),
        },
    }
}

pub(super) fn worker_draft(name: &str, email: &str, skills: &[&str]) -> WorkerDraft {
    WorkerDraft {
        personal: PersonalDetails {
            full_name: name.to_string(),
            gender: "female".to_string(),
            state: "Punjab".to_string(),
            city: "Lahore".to_string(),
            current_address: "7 Mall Road".to_string(),
            ..PersonalDetails::default()
        },
        contact: ContactDetails {
            email: email.to_string(),
            national_id: "35202-7654321-2".to_string(),
            phone: "+92 301 1111111".to_string(),
            id_photo_front: "front-b64".to_string(),
            id_photo_back: "back-b64".to_string(),
        },
        work: WorkDetails {
            skills: skills.iter().map(|skill| skill.to_string()).collect(),
            experience_years: 4.0,
            job_type: "full-time".to_string(),
            ..WorkDetails::default()
        },
    }
}

pub(super) fn hire_request(worker_id: WorkerId, total_amount: f64) -> HireRequest {
    HireRequest {
        worker_id,
        job: JobParameters {
            area: 1200.0,
            rooms: 3,
            occupants: 4,
            requested_skills: ["cleaning".to_string()].into_iter().collect(),
            preferred_schedule: "weekday mornings".to_string(),
            site_photo: String::new(),
        },
        total_amount,
    }
}

/// Two clients and two workers registered against fresh in-memory stores.
pub(super) struct Marketplace {
    pub(super) hires: Arc<InMemoryHireRepository>,
    pub(super) profiles: Arc<InMemoryProfileRepository>,
    pub(super) client: ClientProfile,
    pub(super) other_client: ClientProfile,
    pub(super) worker: WorkerProfile,
    pub(super) other_worker: WorkerProfile,
}

impl Marketplace {
    pub(super) fn seeded() -> Self {
        let hires = Arc::new(InMemoryHireRepository::default());
        let profiles = Arc::new(InMemoryProfileRepository::default());
        let client = profiles
            .insert_client(client_draft("Ayesha Khan", "ayesha@example.com"))
            .expect("client inserts");
        let other_client = profiles
            .insert_client(client_draft("Bilal Ahmed", "bilal@example.com"))
            .expect("client inserts");
        let worker = profiles
            .insert_worker(worker_draft("Sana Malik", "sana@example.com", &["cleaning", "cooking"]))
            .expect("worker inserts");
        let other_worker = profiles
            .insert_worker(worker_draft("Hina Raza", "hina@example.com", &["babysitting"]))
            .expect("worker inserts");
        Self {
            hires,
            profiles,
            client,
            other_client,
            worker,
            other_worker,
        }
    }

    pub(super) fn ledger(&self) -> HireLedger<InMemoryHireRepository, InMemoryProfileRepository> {
        HireLedger::new(self.hires.clone(), self.profiles.clone())
    }

    pub(super) fn directory(
        &self,
    ) -> DirectoryService<InMemoryHireRepository, InMemoryProfileRepository> {
        DirectoryService::new(self.hires.clone(), self.profiles.clone())
    }

    pub(super) fn client_principal(&self) -> Principal {
        Principal::Client(self.client.id)
    }

    pub(super) fn worker_principal(&self) -> Principal {
        Principal::Worker(self.worker.id)
    }

    /// Hire between the seeded client and worker, optionally already paid.
    pub(super) fn hire(&self, paid: bool) -> HireRecord {
        let ledger = self.ledger();
        let record = ledger
            .create_hire(self.client_principal(), hire_request(self.worker.id, 50.0))
            .expect("hire created");
        if paid {
            ledger
                .confirm_external_payment(record.id)
                .expect("payment applied")
        } else {
            record
        }
    }

    pub(super) fn approve_workers(&self) {
        for id in [self.worker.id, self.other_worker.id] {
            self.profiles
                .set_worker_status(id, ProfileStatus::Approved)
                .expect("status updates");
        }
    }
}

pub(super) fn raw_hire(id: u64, client: u64, worker: u64) -> HireRecord {
    HireRecord::from_new(
        HireId(id),
        NewHire {
            client_id: ClientId(client),
            worker_id: WorkerId(worker),
            job: JobParameters::default(),
            total_amount: 25.0,
        },
        chrono::Utc::now(),
    )
}

pub(super) struct UnavailableHires;

impl HireRepository for UnavailableHires {
    fn insert(&self, _hire: NewHire) -> Result<HireRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: HireId) -> Result<Option<HireRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn apply(&self, _id: HireId, _update: HireUpdate) -> Result<HireRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: HireFilter) -> Result<Vec<HireRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Payment provider double: records every session request and answers lookups from a table.
#[derive(Default)]
pub(super) struct ScriptedGateway {
    requests: Mutex<Vec<SessionRequest>>,
    lookups: Mutex<Vec<String>>,
    sessions: Mutex<BTreeMap<String, SessionState>>,
}

impl ScriptedGateway {
    pub(super) fn requests(&self) -> Vec<SessionRequest> {
        self.requests.lock().expect("gateway mutex poisoned").clone()
    }

    pub(super) fn lookups(&self) -> Vec<String> {
        self.lookups.lock().expect("gateway mutex poisoned").clone()
    }

    pub(super) fn settle(&self, session_id: &str, metadata: &[(&str, &str)]) {
        self.sessions.lock().expect("gateway mutex poisoned").insert(
            session_id.to_string(),
            SessionState {
                session_id: session_id.to_string(),
                paid: true,
                metadata: metadata
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            },
        );
    }

    pub(super) fn leave_open(&self, session_id: &str, hire_id: HireId) {
        let mut metadata = BTreeMap::new();
        metadata.insert("hire_id".to_string(), hire_id.to_string());
        self.sessions.lock().expect("gateway mutex poisoned").insert(
            session_id.to_string(),
            SessionState {
                session_id: session_id.to_string(),
                paid: false,
                metadata,
            },
        );
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_session(
        &self,
        request: SessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut requests = self.requests.lock().expect("gateway mutex poisoned");
        requests.push(request);
        let session_id = format!("cs_test_{}", requests.len());
        Ok(CheckoutSession {
            redirect_url: format!("https://pay.test/{session_id}"),
            session_id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionState, PaymentError> {
        self.lookups
            .lock()
            .expect("gateway mutex poisoned")
            .push(session_id.to_string());
        self.sessions
            .lock()
            .expect("gateway mutex poisoned")
            .get(session_id)
            .cloned()
            .ok_or_else(|| PaymentError::Provider {
                status: 404,
                message: format!("No such checkout.session: {session_id}"),
            })
    }
}

/// Text generator double returning a fixed reply or a fixed failure.
pub(super) enum CannedWriter {
    Reply(ProfileCopy),
    Garbled,
}

#[async_trait]
impl ProfileTextGenerator for CannedWriter {
    async fn generate(&self, _worker: &WorkerProfile) -> Result<ProfileCopy, TextGenerationError> {
        match self {
            CannedWriter::Reply(copy) => Ok(copy.clone()),
            CannedWriter::Garbled => Err(TextGenerationError::MalformedReply(
                "expected value at line 1 column 1".to_string(),
            )),
        }
    }
}

pub(super) fn signer() -> TokenSigner {
    TokenSigner::new("test-secret", 24)
}

pub(super) fn bearer(principal: Principal) -> String {
    format!("Bearer {}", signer().issue(principal))
}

pub(super) struct ApiFixture {
    pub(super) market: Marketplace,
    pub(super) gateway: Arc<ScriptedGateway>,
    pub(super) router: axum::Router,
}

pub(super) fn api_fixture() -> ApiFixture {
    let market = Marketplace::seeded();
    let gateway = Arc::new(ScriptedGateway::default());
    let api = HiringApi::new(
        market.hires.clone(),
        market.profiles.clone(),
        Arc::new(signer()),
        OperatorKey::new(Some(OPERATOR_KEY.to_string())),
        gateway.clone(),
        Arc::new(CannedWriter::Reply(ProfileCopy {
            profile_title: "Reliable cleaner and cook".to_string(),
            profile_description: "Four years keeping Lahore homes spotless.".to_string(),
        })),
    );
    ApiFixture {
        router: hiring_router(Arc::new(api)),
        market,
        gateway,
    }
}

pub(super) fn json_request(
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> Request<axum::body::Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            axum::body::Body::from(serde_json::to_vec(&value).expect("serializable body"))
        }
        None => axum::body::Body::empty(),
    };
    builder.body(body).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
