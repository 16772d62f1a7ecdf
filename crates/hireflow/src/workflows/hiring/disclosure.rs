//! Decides how much of a profile a viewer may see.
//!
//! Owners always see everything. A viewer of the opposite kind needs at least one hire linking
//! the two parties to see the profile at all, and at least one *paid* linking hire to see
//! contact and identity-document fields. Everyone else is refused.

use serde::Serialize;

use super::domain::{
    ClientProfile, ContactDetails, HireRecord, Principal, WorkerProfile,
};
use super::error::HiringError;

/// A profile that can pass through the disclosure filter.
pub trait Disclosable {
    fn subject(&self) -> Principal;
    fn contact_mut(&mut self) -> &mut ContactDetails;

    /// Strip the fields a non-paying counterpart may not see.
    fn redact(&mut self) {
        self.contact_mut().blank();
    }
}

impl Disclosable for ClientProfile {
    fn subject(&self) -> Principal {
        Principal::Client(self.id)
    }

    fn contact_mut(&mut self) -> &mut ContactDetails {
        &mut self.contact
    }
}

impl Disclosable for WorkerProfile {
    fn subject(&self) -> Principal {
        Principal::Worker(self.id)
    }

    fn contact_mut(&mut self) -> &mut ContactDetails {
        &mut self.contact
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Full,
    Redacted,
}

/// Visibility granted to `viewer` over `subject`, given the hires on record.
///
/// `hires` may contain unrelated records; only those linking viewer and subject count.
pub fn visibility(
    viewer: Principal,
    subject: Principal,
    hires: &[HireRecord],
) -> Result<Visibility, HiringError> {
    if viewer == subject {
        return Ok(Visibility::Full);
    }

    let (client_id, worker_id) = match (viewer, subject) {
        (Principal::Client(client), Principal::Worker(worker))
        | (Principal::Worker(worker), Principal::Client(client)) => (client, worker),
        _ => return Err(HiringError::Forbidden("profiles of the same kind are private")),
    };

    let mut linked = false;
    for record in hires.iter().filter(|record| record.links(client_id, worker_id)) {
        if record.is_paid() {
            return Ok(Visibility::Full);
        }
        linked = true;
    }

    if linked {
        Ok(Visibility::Redacted)
    } else {
        Err(HiringError::Forbidden("no hire links these accounts"))
    }
}

/// A profile after the disclosure filter ran, tagged with what was shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Disclosed<T> {
    #[serde(flatten)]
    pub profile: T,
    pub visibility: Visibility,
}

pub fn disclose<T: Disclosable>(
    viewer: Principal,
    mut profile: T,
    hires: &[HireRecord],
) -> Result<Disclosed<T>, HiringError> {
    let visibility = visibility(viewer, profile.subject(), hires)?;
    if visibility == Visibility::Redacted {
        profile.redact();
    }
    Ok(Disclosed {
        profile,
        visibility,
    })
}

/// Listing and search views: always the redacted-safe subset, no relationship required.
pub fn public_view<T: Disclosable>(mut profile: T) -> T {
    profile.redact();
    profile
}
