//! End-to-end scenarios driven through the public hiring facade and HTTP router.

mod common {
    use std::sync::Arc;

    use hireflow::workflows::hiring::{
        hiring_router, ClientDraft, ContactDetails, HiringApi, InMemoryHireRepository,
        InMemoryProfileRepository, OperatorKey, PersonalDetails, ProfileRepository,
        TokenSigner, UnconfiguredGateway, UnconfiguredWriter, WorkDetails, WorkerDraft,
    };

    pub(super) type Api = HiringApi<InMemoryHireRepository, InMemoryProfileRepository>;

    pub(super) fn signer() -> TokenSigner {
        TokenSigner::new("integration-secret", 1)
    }

    pub(super) fn contact(email: &str) -> ContactDetails {
        ContactDetails {
            email: email.to_string(),
            national_id: "ID-0001".to_string(),
            phone: "555-0100".to_string(),
            id_photo_front: "front".to_string(),
            id_photo_back: "back".to_string(),
        }
    }

    pub(super) fn personal(name: &str) -> PersonalDetails {
        PersonalDetails {
            full_name: name.to_string(),
            city: "Austin".to_string(),
            ..PersonalDetails::default()
        }
    }

    pub(super) fn build() -> (Arc<Api>, Arc<InMemoryProfileRepository>) {
        let hires = Arc::new(InMemoryHireRepository::default());
        let profiles = Arc::new(InMemoryProfileRepository::default());
        let api = HiringApi::new(
            hires,
            profiles.clone(),
            Arc::new(signer()),
            OperatorKey::new(None),
            Arc::new(UnconfiguredGateway),
            Arc::new(UnconfiguredWriter),
        );
        (Arc::new(api), profiles)
    }

    pub(super) fn seed(profiles: &InMemoryProfileRepository) -> (u64, u64) {
        let client = profiles
            .insert_client(ClientDraft {
                personal: personal("Casey Client"),
                contact: contact("casey@example.com"),
            })
            .expect("client inserts");
        let worker = profiles
            .insert_worker(WorkerDraft {
                personal: personal("Wren Worker"),
                contact: contact("wren@example.com"),
                work: WorkDetails {
                    skills: ["cleaning".to_string()].into_iter().collect(),
                    experience_years: 3.0,
                    ..WorkDetails::default()
                },
            })
            .expect("worker inserts");
        (client.id.0, worker.id.0)
    }

    pub(super) fn router(api: Arc<Api>) -> axum::Router {
        hiring_router(api)
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use hireflow::workflows::hiring::{
    AcceptanceStatus, ClientId, HireRequest, HiringError, JobParameters, PaymentStatus,
    Principal, RatingDirection, Visibility, WorkerId,
};
use serde_json::Value;
use tower::ServiceExt;

#[test]
fn lifecycle_unlocks_contact_details_after_payment() {
    let (api, profiles) = common::build();
    let (client_id, worker_id) = common::seed(&profiles);
    let client = Principal::Client(ClientId(client_id));
    let worker = Principal::Worker(WorkerId(worker_id));

    let record = api
        .ledger
        .create_hire(
            client,
            HireRequest {
                worker_id: WorkerId(worker_id),
                job: JobParameters {
                    area: 800.0,
                    rooms: 2,
                    occupants: 2,
                    ..JobParameters::default()
                },
                total_amount: 50.0,
            },
        )
        .expect("hire created");

    let detail = api
        .directory
        .worker_detail(client, WorkerId(worker_id))
        .expect("linked client sees worker");
    assert_eq!(detail.disclosed.visibility, Visibility::Redacted);
    assert!(detail.disclosed.profile.contact.email.is_empty());

    api.ledger
        .set_acceptance(worker, record.id, AcceptanceStatus::Accepted)
        .expect("accepted");
    api.ledger
        .set_payment(client, record.id, PaymentStatus::Paid)
        .expect("paid");

    let detail = api
        .directory
        .worker_detail(client, WorkerId(worker_id))
        .expect("paid client sees worker");
    assert_eq!(detail.disclosed.visibility, Visibility::Full);
    assert_eq!(detail.disclosed.profile.contact.email, "wren@example.com");

    api.ledger
        .rate_counterparty(worker, record.id, 4.0, RatingDirection::WorkerRatesClient)
        .expect("worker rates client");
    let err = api
        .ledger
        .rate_counterparty(worker, record.id, 2.0, RatingDirection::WorkerRatesClient)
        .expect_err("exactly once");
    assert!(matches!(err, HiringError::AlreadyRated));

    let summary = api
        .directory
        .client_ratings(worker, ClientId(client_id))
        .expect("linked worker reads client ratings");
    assert_eq!(summary.rating_count, 1);
    assert_eq!(summary.average_rating, 4.0);
}

#[tokio::test]
async fn http_surface_reports_structured_errors() {
    let (api, profiles) = common::build();
    let (client_id, _) = common::seed(&profiles);
    let token = common::signer().issue(Principal::Client(ClientId(client_id)));
    let router = common::router(api);

    let response = router
        .clone()
        .oneshot(
            Request::post("/hires/checkout")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"hire_id": 1}"#))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(
            Request::get("/admin/hires")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    let payload: Value = serde_json::from_slice(&body).expect("json payload");
    assert!(payload["message"]
        .as_str()
        .is_some_and(|message| message.contains("operator")));
}
