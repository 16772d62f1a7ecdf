//! Hire lifecycle and access control for the marketplace.
//!
//! The [`HireLedger`] owns every hire mutation, the disclosure filter decides how much of a
//! counterpart's profile a caller sees, and rating statistics are derived from the ledger at
//! read time. Storage, identity, payments and text generation sit behind traits so the HTTP
//! layer and the tests can swap adapters freely.

pub mod directory;
pub mod disclosure;
pub mod domain;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod memory;
pub mod payments;
pub mod profile_text;
pub mod ratings;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

pub use directory::{DirectoryService, ProfileDetail, ProfileStats, WorkerListing};
pub use disclosure::{disclose, public_view, visibility, Disclosable, Disclosed, Visibility};
pub use domain::{
    AcceptanceStatus, ClientDraft, ClientId, ClientProfile, ContactDetails, CounterpartSummary,
    HireId, HireListing, HireRecord, HireRequest, JobParameters, NewHire, PaymentStatus,
    PersonalDetails, Principal, PrincipalKind, ProfileStatus, Rating, RatingDirection, WorkDetails,
    WorkerDraft, WorkerId, WorkerProfile,
};
pub use error::HiringError;
pub use identity::{
    authenticate, bearer_token, IdentityError, IdentityResolver, OperatorKey, TokenSigner,
};
pub use ledger::HireLedger;
pub use memory::{InMemoryHireRepository, InMemoryProfileRepository};
pub use payments::{
    CheckoutGateway, CheckoutRedirect, ConfirmOutcome, PaymentBridge, PaymentError,
    PaymentGateway, SessionRequest, SessionState, UnconfiguredGateway,
};
pub use profile_text::{
    ChatCompletionWriter, ProfileCopy, ProfileTextGenerator, ProfileWriter, TextGenerationError,
    UnconfiguredWriter,
};
pub use ratings::{aggregate, RatingBucket, RatingSummary};
pub use repository::{
    HireFilter, HireRepository, HireUpdate, ProfileRepository, RepositoryError, WorkerFilter,
};
pub use router::{hiring_router, HiringApi};
