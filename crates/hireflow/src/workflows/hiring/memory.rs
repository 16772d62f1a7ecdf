//! Mutex-guarded in-process adapters for the storage ports.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{
    ClientDraft, ClientId, ClientProfile, HireId, HireRecord, NewHire, ProfileStatus,
    RatingDirection, WorkerDraft, WorkerId, WorkerProfile,
};
use super::repository::{
    normalize_email, HireFilter, HireRepository, HireUpdate, ProfileRepository, RepositoryError,
    WorkerFilter,
};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
}

#[derive(Debug, Default)]
struct HireTable {
    next_id: u64,
    rows: BTreeMap<HireId, HireRecord>,
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryHireRepository {
    table: Arc<Mutex<HireTable>>,
}

impl HireRepository for InMemoryHireRepository {
    fn insert(&self, hire: NewHire) -> Result<HireRecord, RepositoryError> {
        let mut table = lock(&self.table)?;
        table.next_id += 1;
        let id = HireId(table.next_id);
        let record = HireRecord::from_new(id, hire, Utc::now());
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: HireId) -> Result<Option<HireRecord>, RepositoryError> {
        Ok(lock(&self.table)?.rows.get(&id).cloned())
    }

    fn apply(&self, id: HireId, update: HireUpdate) -> Result<HireRecord, RepositoryError> {
        let mut table = lock(&self.table)?;
        let record = table.rows.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        match update {
            HireUpdate::Acceptance(status) => record.acceptance_status = status,
            HireUpdate::Payment(status) => record.payment_status = status,
            HireUpdate::Rating { direction, rating } => {
                let slot = match direction {
                    RatingDirection::ClientRatesWorker => &mut record.worker_rating,
                    RatingDirection::WorkerRatesClient => &mut record.client_rating,
                };
                if *slot != 0 {
                    return Err(RepositoryError::RatingAlreadySet);
                }
                *slot = rating.value();
            }
        }

        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn list(&self, filter: HireFilter) -> Result<Vec<HireRecord>, RepositoryError> {
        let table = lock(&self.table)?;
        Ok(table
            .rows
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct ProfileTables {
    next_client: u64,
    next_worker: u64,
    clients: BTreeMap<ClientId, ClientProfile>,
    workers: BTreeMap<WorkerId, WorkerProfile>,
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileRepository {
    tables: Arc<Mutex<ProfileTables>>,
}

impl ProfileRepository for InMemoryProfileRepository {
    fn insert_client(&self, mut draft: ClientDraft) -> Result<ClientProfile, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        draft.contact.email = normalize_email(&draft.contact.email);
        if tables
            .clients
            .values()
            .any(|existing| existing.contact.email == draft.contact.email)
        {
            return Err(RepositoryError::Conflict);
        }

        tables.next_client += 1;
        let now = Utc::now();
        let profile = ClientProfile {
            id: ClientId(tables.next_client),
            personal: draft.personal,
            contact: draft.contact,
            created_at: now,
            updated_at: now,
        };
        tables.clients.insert(profile.id, profile.clone());
        Ok(profile)
    }

    fn insert_worker(&self, mut draft: WorkerDraft) -> Result<WorkerProfile, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        draft.contact.email = normalize_email(&draft.contact.email);
        if tables
            .workers
            .values()
            .any(|existing| existing.contact.email == draft.contact.email)
        {
            return Err(RepositoryError::Conflict);
        }

        tables.next_worker += 1;
        let now = Utc::now();
        let profile = WorkerProfile {
            id: WorkerId(tables.next_worker),
            personal: draft.personal,
            contact: draft.contact,
            work: draft.work,
            status: ProfileStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tables.workers.insert(profile.id, profile.clone());
        Ok(profile)
    }

    fn client(&self, id: ClientId) -> Result<Option<ClientProfile>, RepositoryError> {
        Ok(lock(&self.tables)?.clients.get(&id).cloned())
    }

    fn worker(&self, id: WorkerId) -> Result<Option<WorkerProfile>, RepositoryError> {
        Ok(lock(&self.tables)?.workers.get(&id).cloned())
    }

    fn client_by_email(&self, email: &str) -> Result<Option<ClientProfile>, RepositoryError> {
        let email = normalize_email(email);
        Ok(lock(&self.tables)?
            .clients
            .values()
            .find(|profile| profile.contact.email == email)
            .cloned())
    }

    fn worker_by_email(&self, email: &str) -> Result<Option<WorkerProfile>, RepositoryError> {
        let email = normalize_email(email);
        Ok(lock(&self.tables)?
            .workers
            .values()
            .find(|profile| profile.contact.email == email)
            .cloned())
    }

    fn clients(&self) -> Result<Vec<ClientProfile>, RepositoryError> {
        Ok(lock(&self.tables)?.clients.values().cloned().collect())
    }

    fn workers(&self, filter: &WorkerFilter) -> Result<Vec<WorkerProfile>, RepositoryError> {
        Ok(lock(&self.tables)?
            .workers
            .values()
            .filter(|profile| filter.matches(profile))
            .cloned()
            .collect())
    }

    fn update_client(&self, mut profile: ClientProfile) -> Result<ClientProfile, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        profile.contact.email = normalize_email(&profile.contact.email);
        if tables
            .clients
            .values()
            .any(|other| other.id != profile.id && other.contact.email == profile.contact.email)
        {
            return Err(RepositoryError::Conflict);
        }
        let slot = tables
            .clients
            .get_mut(&profile.id)
            .ok_or(RepositoryError::NotFound)?;
        profile.created_at = slot.created_at;
        profile.updated_at = Utc::now();
        *slot = profile.clone();
        Ok(profile)
    }

    fn update_worker(&self, mut profile: WorkerProfile) -> Result<WorkerProfile, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        profile.contact.email = normalize_email(&profile.contact.email);
        if tables
            .workers
            .values()
            .any(|other| other.id != profile.id && other.contact.email == profile.contact.email)
        {
            return Err(RepositoryError::Conflict);
        }
        let slot = tables
            .workers
            .get_mut(&profile.id)
            .ok_or(RepositoryError::NotFound)?;
        profile.created_at = slot.created_at;
        profile.updated_at = Utc::now();
        *slot = profile.clone();
        Ok(profile)
    }

    fn set_worker_status(
        &self,
        id: WorkerId,
        status: ProfileStatus,
    ) -> Result<WorkerProfile, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        let profile = tables.workers.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        profile.status = status;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::hiring::domain::{
        ContactDetails, JobParameters, PaymentStatus, Rating,
    };

    fn new_hire(client: u64, worker: u64) -> NewHire {
        NewHire {
            client_id: ClientId(client),
            worker_id: WorkerId(worker),
            job: JobParameters::default(),
            total_amount: 10.0,
        }
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let store = InMemoryHireRepository::default();
        let first = store.insert(new_hire(1, 1)).expect("insert");
        let second = store.insert(new_hire(1, 1)).expect("insert");
        assert_eq!(first.id, HireId(1));
        assert_eq!(second.id, HireId(2));
    }

    #[test]
    fn rating_write_is_conditional_on_zero() {
        let store = InMemoryHireRepository::default();
        let record = store.insert(new_hire(1, 2)).expect("insert");
        let update = HireUpdate::Rating {
            direction: RatingDirection::ClientRatesWorker,
            rating: Rating::new(5).expect("valid"),
        };

        let rated = store.apply(record.id, update).expect("first write lands");
        assert_eq!(rated.worker_rating, 5);
        assert_eq!(rated.client_rating, 0);

        assert!(matches!(
            store.apply(record.id, update),
            Err(RepositoryError::RatingAlreadySet)
        ));
    }

    #[test]
    fn racing_rating_writes_land_exactly_once() {
        use std::sync::Barrier;
        use std::thread;

        let store = InMemoryHireRepository::default();
        let hire_id = store.insert(new_hire(1, 2)).expect("insert").id;
        let contenders = 8u8;
        let barrier = Barrier::new(usize::from(contenders));

        let outcomes: Vec<Result<HireRecord, RepositoryError>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..contenders)
                .map(|n| {
                    let (store, barrier) = (&store, &barrier);
                    scope.spawn(move || {
                        let rating = Rating::new(n % 5 + 1).expect("valid");
                        barrier.wait();
                        store.apply(
                            hire_id,
                            HireUpdate::Rating {
                                direction: RatingDirection::WorkerRatesClient,
                                rating,
                            },
                        )
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("writer thread"))
                .collect()
        });

        let landed: Vec<&HireRecord> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(landed.len(), 1);
        assert!(outcomes
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(RepositoryError::RatingAlreadySet))));

        let stored = store.fetch(hire_id).expect("fetch").expect("present");
        assert_eq!(stored.client_rating, landed[0].client_rating);
        assert_eq!(stored.worker_rating, 0);
    }

    #[test]
    fn filters_select_by_party() {
        let store = InMemoryHireRepository::default();
        store.insert(new_hire(1, 2)).expect("insert");
        store.insert(new_hire(1, 3)).expect("insert");
        store.insert(new_hire(4, 2)).expect("insert");

        let for_worker = store.list(HireFilter::for_worker(WorkerId(2))).expect("list");
        assert_eq!(for_worker.len(), 2);
        assert!(for_worker.iter().all(|record| record.worker_id == WorkerId(2)));

        let both = HireFilter {
            client_id: Some(ClientId(1)),
            worker_id: Some(WorkerId(3)),
        };
        assert_eq!(store.list(both).expect("list").len(), 1);
        assert_eq!(store.list(HireFilter::default()).expect("list").len(), 3);
    }

    #[test]
    fn apply_on_missing_record_is_not_found() {
        let store = InMemoryHireRepository::default();
        assert!(matches!(
            store.apply(HireId(99), HireUpdate::Payment(PaymentStatus::Paid)),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn duplicate_emails_conflict_per_kind() {
        let store = InMemoryProfileRepository::default();
        let contact = ContactDetails {
            email: "Sam@Example.com".to_string(),
            ..ContactDetails::default()
        };
        store
            .insert_client(ClientDraft {
                contact: contact.clone(),
                ..ClientDraft::default()
            })
            .expect("first client");
        assert!(matches!(
            store.insert_client(ClientDraft {
                contact: ContactDetails {
                    email: "sam@example.com ".to_string(),
                    ..ContactDetails::default()
                },
                ..ClientDraft::default()
            }),
            Err(RepositoryError::Conflict)
        ));

        let worker = store
            .insert_worker(WorkerDraft {
                contact,
                ..WorkerDraft::default()
            })
            .expect("same email is fine for the other kind");
        assert_eq!(worker.status, ProfileStatus::Pending);
        assert!(store
            .worker_by_email("SAM@example.com")
            .expect("lookup")
            .is_some());
    }
}
