use clap::Args;
use hireflow::error::AppError;
use hireflow::workflows::hiring::{
    AcceptanceStatus, ClientDraft, ContactDetails, DirectoryService, HireLedger, HireRecord,
    HireRequest, HiringError, InMemoryHireRepository, InMemoryProfileRepository, JobParameters,
    PaymentStatus, PersonalDetails, Principal, RatingDirection, WorkDetails, WorkerDraft,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Agreed total for the demo hire.
    #[arg(long, default_value_t = 50.0)]
    pub(crate) amount: f64,
    /// Score the worker gives the client at the end of the walkthrough.
    #[arg(long, default_value_t = 4)]
    pub(crate) rating: u8,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let hires = Arc::new(InMemoryHireRepository::default());
    let profiles = Arc::new(InMemoryProfileRepository::default());
    let ledger = HireLedger::new(hires.clone(), profiles.clone());
    let directory = DirectoryService::new(hires, profiles);

    let client = directory.register_client(ClientDraft {
        personal: personal("Casey Morgan", "Austin"),
        contact: contact("casey@example.com", "555-0101"),
    })?;
    let worker = directory.register_worker(WorkerDraft {
        personal: personal("Wren Alvarez", "Austin"),
        contact: contact("wren@example.com", "555-0199"),
        work: WorkDetails {
            skills: ["cleaning", "laundry"].iter().map(|s| s.to_string()).collect(),
            experience_years: 6.0,
            job_type: "part-time".to_string(),
            ..WorkDetails::default()
        },
    })?;
    let client_principal = Principal::Client(client.id);
    let worker_principal = Principal::Worker(worker.id);

    println!("Hire lifecycle demo");
    println!(
        "  Client #{} {} hires worker #{} {}",
        client.id, client.personal.full_name, worker.id, worker.personal.full_name
    );

    let record = ledger.create_hire(
        client_principal,
        HireRequest {
            worker_id: worker.id,
            job: JobParameters {
                area: 950.0,
                rooms: 3,
                occupants: 2,
                requested_skills: worker.work.skills.clone(),
                preferred_schedule: "Saturday mornings".to_string(),
                site_photo: String::new(),
            },
            total_amount: args.amount,
        },
    )?;
    print_state("created", &record);

    let detail = directory.worker_detail(client_principal, worker.id)?;
    println!(
        "  Worker profile as seen by the client before payment: {:?} (email '{}')",
        detail.disclosed.visibility, detail.disclosed.profile.contact.email
    );

    let record = ledger.set_acceptance(worker_principal, record.id, AcceptanceStatus::Accepted)?;
    print_state("worker accepted", &record);

    let record = ledger.set_payment(client_principal, record.id, PaymentStatus::Paid)?;
    print_state("client paid", &record);

    let detail = directory.worker_detail(client_principal, worker.id)?;
    println!(
        "  Worker profile as seen by the client after payment: {:?} (email '{}')",
        detail.disclosed.visibility, detail.disclosed.profile.contact.email
    );

    let record = ledger.rate_counterparty(
        worker_principal,
        record.id,
        f64::from(args.rating),
        RatingDirection::WorkerRatesClient,
    )?;
    print_state("worker rated client", &record);

    match ledger.rate_counterparty(
        worker_principal,
        record.id,
        f64::from(args.rating),
        RatingDirection::WorkerRatesClient,
    ) {
        Err(HiringError::AlreadyRated) => println!("  Second rating attempt refused: already rated"),
        Err(err) => return Err(err.into()),
        Ok(_) => println!("  Second rating attempt unexpectedly accepted"),
    }

    let summary = directory.client_ratings(client_principal, client.id)?;
    println!(
        "  Client rating summary: {} hire(s), {} rating(s), average {:.2}",
        summary.hire_count, summary.rating_count, summary.average_rating
    );
    for bucket in summary.distribution {
        println!("    {}: {}", bucket.label, bucket.value);
    }

    Ok(())
}

fn print_state(step: &str, record: &HireRecord) {
    println!(
        "  [{step}] hire #{} acceptance={} payment={} client_rating={} worker_rating={}",
        record.id,
        record.acceptance_status.label(),
        record.payment_status.label(),
        record.client_rating,
        record.worker_rating
    );
}

fn personal(name: &str, city: &str) -> PersonalDetails {
    PersonalDetails {
        full_name: name.to_string(),
        city: city.to_string(),
        state: "TX".to_string(),
        ..PersonalDetails::default()
    }
}

fn contact(email: &str, phone: &str) -> ContactDetails {
    ContactDetails {
        email: email.to_string(),
        phone: phone.to_string(),
        ..ContactDetails::default()
    }
}
