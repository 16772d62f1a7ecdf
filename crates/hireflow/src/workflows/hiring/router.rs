use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::directory::{DirectoryService, ProfileDetail, WorkerListing};
use super::domain::{
    AcceptanceStatus, ClientDraft, ClientId, ClientProfile, HireId, HireListing, HireRecord,
    HireRequest, PaymentStatus, Principal, ProfileStatus, RatingDirection, WorkerDraft, WorkerId,
    WorkerProfile,
};
use super::error::HiringError;
use super::identity::{authenticate, IdentityResolver, OperatorKey};
use super::ledger::HireLedger;
use super::payments::{CheckoutRedirect, ConfirmOutcome, PaymentBridge, PaymentGateway};
use super::profile_text::{ProfileTextGenerator, ProfileWriter};
use super::ratings::RatingSummary;
use super::repository::{HireRepository, ProfileRepository, WorkerFilter};

/// Everything the HTTP handlers need, shared behind one `Arc`.
pub struct HiringApi<H, P> {
    pub ledger: Arc<HireLedger<H, P>>,
    pub directory: DirectoryService<H, P>,
    pub payments: PaymentBridge<H, P>,
    pub writer: ProfileWriter<P>,
    identity: Arc<dyn IdentityResolver>,
    operator: OperatorKey,
}

impl<H, P> HiringApi<H, P>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    pub fn new(
        hires: Arc<H>,
        profiles: Arc<P>,
        identity: Arc<dyn IdentityResolver>,
        operator: OperatorKey,
        gateway: Arc<dyn PaymentGateway>,
        generator: Arc<dyn ProfileTextGenerator>,
    ) -> Self {
        let ledger = Arc::new(HireLedger::new(hires.clone(), profiles.clone()));
        Self {
            directory: DirectoryService::new(hires.clone(), profiles.clone()),
            payments: PaymentBridge::new(gateway, ledger.clone(), hires, profiles.clone()),
            writer: ProfileWriter::new(generator, profiles),
            ledger,
            identity,
            operator,
        }
    }

    fn principal(&self, headers: &HeaderMap) -> Result<Principal, HiringError> {
        Ok(authenticate(self.identity.as_ref(), headers)?)
    }

    fn require_operator(&self, headers: &HeaderMap) -> Result<(), HiringError> {
        if self.operator.admits(headers) {
            Ok(())
        } else {
            Err(HiringError::Forbidden("operator credential required"))
        }
    }
}

/// Router exposing the hire lifecycle, directory, payment and moderation endpoints.
pub fn hiring_router<H, P>(api: Arc<HiringApi<H, P>>) -> Router
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    Router::new()
        .route("/hires", post(create_hire::<H, P>))
        .route("/hires/mine/worker", get(worker_hires::<H, P>))
        .route("/hires/mine/client", get(client_hires::<H, P>))
        .route("/hires/checkout", post(start_checkout::<H, P>))
        .route("/hires/checkout/confirm", post(confirm_checkout::<H, P>))
        .route("/hires/:hire_id", get(get_hire::<H, P>))
        .route("/hires/:hire_id/acceptance", patch(set_acceptance::<H, P>))
        .route("/hires/:hire_id/payment", patch(set_payment::<H, P>))
        .route("/hires/:hire_id/rate-worker", post(rate_worker::<H, P>))
        .route("/hires/:hire_id/rate-client", post(rate_client::<H, P>))
        .route(
            "/workers",
            get(search_workers::<H, P>).post(register_worker::<H, P>),
        )
        .route("/workers/me", put(update_worker::<H, P>))
        .route("/workers/me/profile-copy", post(refresh_profile_copy::<H, P>))
        .route("/workers/:worker_id", get(worker_listing::<H, P>))
        .route("/workers/:worker_id/profile", get(worker_detail::<H, P>))
        .route("/workers/:worker_id/ratings", get(worker_ratings::<H, P>))
        .route("/clients", post(register_client::<H, P>))
        .route("/clients/me", put(update_client::<H, P>))
        .route("/clients/:client_id", get(client_detail::<H, P>))
        .route("/clients/:client_id/ratings", get(client_ratings::<H, P>))
        .route("/admin/hires", get(admin_hires::<H, P>))
        .route("/admin/workers", get(admin_workers::<H, P>))
        .route("/admin/clients", get(admin_clients::<H, P>))
        .route(
            "/admin/workers/:worker_id/status",
            patch(moderate_worker::<H, P>),
        )
        .with_state(api)
}

type ApiState<H, P> = State<Arc<HiringApi<H, P>>>;
type JsonBody<T> = Result<Json<T>, JsonRejection>;
type IdPath = Result<Path<u64>, PathRejection>;

fn body<T>(payload: JsonBody<T>) -> Result<T, HiringError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| HiringError::InvalidArgument(rejection.body_text()))
}

fn path_id(path: IdPath) -> Result<u64, HiringError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| HiringError::InvalidArgument(rejection.body_text()))
}

#[derive(Debug, Deserialize)]
struct AcceptanceBody {
    status: AcceptanceStatus,
}

#[derive(Debug, Deserialize)]
struct PaymentBody {
    status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
struct RatingBody {
    rating: f64,
}

#[derive(Debug, Deserialize)]
struct CheckoutBody {
    hire_id: HireId,
}

#[derive(Debug, Deserialize)]
struct ConfirmBody {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ModerationBody {
    status: ProfileStatus,
}

#[derive(Debug, Default, Deserialize)]
struct WorkerQuery {
    skill: Option<String>,
    job_type: Option<String>,
    city: Option<String>,
    status: Option<ProfileStatus>,
}

impl WorkerQuery {
    fn into_filter(self) -> WorkerFilter {
        let blank_to_none = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        WorkerFilter {
            skill: blank_to_none(self.skill),
            job_type: blank_to_none(self.job_type),
            city: blank_to_none(self.city),
            status: self.status,
            any_status: false,
        }
    }
}

async fn create_hire<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    payload: JsonBody<HireRequest>,
) -> Result<(StatusCode, Json<HireRecord>), HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(&headers)?;
    let record = api.ledger.create_hire(principal, body(payload)?)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_hire<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    hire_id: IdPath,
) -> Result<Json<HireRecord>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(&headers)?;
    let hire_id = HireId(path_id(hire_id)?);
    Ok(Json(api.ledger.get_hire(principal, hire_id)?))
}

async fn worker_hires<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
) -> Result<Json<Vec<HireListing>>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(&headers)?;
    Ok(Json(api.ledger.list_for_worker(principal)?))
}

async fn client_hires<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
) -> Result<Json<Vec<HireListing>>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(&headers)?;
    Ok(Json(api.ledger.list_for_client(principal)?))
}

async fn set_acceptance<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    hire_id: IdPath,
    payload: JsonBody<AcceptanceBody>,
) -> Result<Json<HireRecord>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(&headers)?;
    let hire_id = HireId(path_id(hire_id)?);
    let AcceptanceBody { status } = body(payload)?;
    Ok(Json(api.ledger.set_acceptance(principal, hire_id, status)?))
}

async fn set_payment<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    hire_id: IdPath,
    payload: JsonBody<PaymentBody>,
) -> Result<Json<HireRecord>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(&headers)?;
    let hire_id = HireId(path_id(hire_id)?);
    let PaymentBody { status } = body(payload)?;
    Ok(Json(api.ledger.set_payment(principal, hire_id, status)?))
}

async fn rate_worker<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    hire_id: IdPath,
    payload: JsonBody<RatingBody>,
) -> Result<Json<HireRecord>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    rate(&api, &headers, hire_id, payload, RatingDirection::ClientRatesWorker)
}

async fn rate_client<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    hire_id: IdPath,
    payload: JsonBody<RatingBody>,
) -> Result<Json<HireRecord>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    rate(&api, &headers, hire_id, payload, RatingDirection::WorkerRatesClient)
}

fn rate<H, P>(
    api: &HiringApi<H, P>,
    headers: &HeaderMap,
    hire_id: IdPath,
    payload: JsonBody<RatingBody>,
    direction: RatingDirection,
) -> Result<Json<HireRecord>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(headers)?;
    let hire_id = HireId(path_id(hire_id)?);
    let RatingBody { rating } = body(payload)?;
    Ok(Json(api.ledger.rate_counterparty(
        principal, hire_id, rating, direction,
    )?))
}

async fn start_checkout<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    payload: JsonBody<CheckoutBody>,
) -> Result<Json<CheckoutRedirect>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(&headers)?;
    let CheckoutBody { hire_id } = body(payload)?;
    Ok(Json(api.payments.start_checkout(principal, hire_id).await?))
}

async fn confirm_checkout<H, P>(
    State(api): ApiState<H, P>,
    payload: JsonBody<ConfirmBody>,
) -> Result<Json<HireRecord>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let ConfirmBody { session_id } = body(payload)?;
    match api.payments.confirm(&session_id).await? {
        ConfirmOutcome::Paid(record) => Ok(Json(record)),
        ConfirmOutcome::NotPaid => Err(HiringError::InvalidArgument(
            "payment not completed".to_string(),
        )),
    }
}

async fn register_worker<H, P>(
    State(api): ApiState<H, P>,
    payload: JsonBody<WorkerDraft>,
) -> Result<(StatusCode, Json<WorkerProfile>), HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let profile = api.directory.register_worker(body(payload)?)?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn register_client<H, P>(
    State(api): ApiState<H, P>,
    payload: JsonBody<ClientDraft>,
) -> Result<(StatusCode, Json<ClientProfile>), HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let profile = api.directory.register_client(body(payload)?)?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn update_worker<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    payload: JsonBody<WorkerDraft>,
) -> Result<Json<WorkerProfile>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(&headers)?;
    Ok(Json(api.directory.update_worker(principal, body(payload)?)?))
}

async fn update_client<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    payload: JsonBody<ClientDraft>,
) -> Result<Json<ClientProfile>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(&headers)?;
    Ok(Json(api.directory.update_client(principal, body(payload)?)?))
}

async fn refresh_profile_copy<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
) -> Result<Json<WorkerProfile>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let principal = api.principal(&headers)?;
    Ok(Json(api.writer.refresh(principal).await?))
}

async fn search_workers<H, P>(
    State(api): ApiState<H, P>,
    query: Result<Query<WorkerQuery>, QueryRejection>,
) -> Result<Json<Vec<WorkerListing>>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let Query(query) =
        query.map_err(|rejection| HiringError::InvalidArgument(rejection.body_text()))?;
    Ok(Json(api.directory.list_workers(&query.into_filter())?))
}

async fn worker_listing<H, P>(
    State(api): ApiState<H, P>,
    worker_id: IdPath,
) -> Result<Json<WorkerListing>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let worker_id = WorkerId(path_id(worker_id)?);
    Ok(Json(api.directory.worker_listing(worker_id)?))
}

async fn worker_detail<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    worker_id: IdPath,
) -> Result<Json<ProfileDetail<WorkerProfile>>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let viewer = api.principal(&headers)?;
    let worker_id = WorkerId(path_id(worker_id)?);
    Ok(Json(api.directory.worker_detail(viewer, worker_id)?))
}

async fn worker_ratings<H, P>(
    State(api): ApiState<H, P>,
    worker_id: IdPath,
) -> Result<Json<RatingSummary>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let worker_id = WorkerId(path_id(worker_id)?);
    Ok(Json(api.directory.worker_ratings(worker_id)?))
}

async fn client_detail<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    client_id: IdPath,
) -> Result<Json<ProfileDetail<ClientProfile>>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let viewer = api.principal(&headers)?;
    let client_id = ClientId(path_id(client_id)?);
    Ok(Json(api.directory.client_detail(viewer, client_id)?))
}

async fn client_ratings<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    client_id: IdPath,
) -> Result<Json<RatingSummary>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    let viewer = api.principal(&headers)?;
    let client_id = ClientId(path_id(client_id)?);
    Ok(Json(api.directory.client_ratings(viewer, client_id)?))
}

async fn admin_hires<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
) -> Result<Json<Vec<HireRecord>>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    api.require_operator(&headers)?;
    Ok(Json(api.ledger.all_hires()?))
}

async fn admin_workers<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
) -> Result<Json<Vec<WorkerProfile>>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    api.require_operator(&headers)?;
    Ok(Json(api.directory.all_workers()?))
}

async fn admin_clients<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
) -> Result<Json<Vec<ClientProfile>>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    api.require_operator(&headers)?;
    Ok(Json(api.directory.all_clients()?))
}

async fn moderate_worker<H, P>(
    State(api): ApiState<H, P>,
    headers: HeaderMap,
    worker_id: IdPath,
    payload: JsonBody<ModerationBody>,
) -> Result<Json<WorkerProfile>, HiringError>
where
    H: HireRepository + 'static,
    P: ProfileRepository + 'static,
{
    api.require_operator(&headers)?;
    let worker_id = WorkerId(path_id(worker_id)?);
    let ModerationBody { status } = body(payload)?;
    Ok(Json(api.directory.set_worker_status(worker_id, status)?))
}
