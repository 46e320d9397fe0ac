use crate::infra::{
    load_jobs, load_users, InMemoryApplicationRegistry, InMemoryArtifactStore, InMemoryJobCatalog,
    InMemoryUserDirectory, RecordingNotifier,
};
use clap::Args;
use hiretrack::applications::{
    ArtifactUpload, JobApplicationService, StatusNotification,
};
use hiretrack::error::AppError;
use hiretrack::seed::SeedError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// CSV file of job postings to run the demo against
    #[arg(long)]
    pub(crate) jobs_seed: Option<PathBuf>,
    /// CSV file of user accounts to run the demo against
    #[arg(long)]
    pub(crate) users_seed: Option<PathBuf>,
}

fn pdf_upload(name: &str, text: &str) -> ArtifactUpload {
    ArtifactUpload {
        bytes: format!("%PDF-1.4\n{text}\n").into_bytes(),
        original_name: name.to_string(),
    }
}

/// Walk one application through apply, review, approval, and the admin
/// listing, printing each step.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let users = load_users(args.users_seed.as_deref())?;
    let jobs = load_jobs(args.jobs_seed.as_deref())?;

    let applicant = users
        .iter()
        .find(|user| !user.role.can_manage_applications())
        .cloned()
        .ok_or(SeedError::MissingRole("applicant"))?;
    let staff = users
        .iter()
        .find(|user| user.role.can_manage_applications())
        .cloned()
        .ok_or(SeedError::MissingRole("recruiter or admin"))?;
    let admin = users
        .iter()
        .find(|user| user.role.can_view_all_applications())
        .cloned()
        .ok_or(SeedError::MissingRole("admin"))?;
    let job = jobs.first().cloned().ok_or(SeedError::NoJobs)?;

    let notifier = Arc::new(RecordingNotifier::default());
    let service = JobApplicationService::new(
        Arc::new(InMemoryApplicationRegistry::default()),
        Arc::new(InMemoryUserDirectory::new(users)),
        Arc::new(InMemoryJobCatalog::new(jobs)),
        Arc::new(InMemoryArtifactStore::default()),
        notifier.clone(),
    );

    println!("hiretrack lifecycle demo");
    println!("  applicant: {} <{}>", applicant.username, applicant.email);
    println!("  job:       {} at {}", job.title, job.company);

    let record = service.apply(
        job.id,
        &applicant.email,
        pdf_upload("resume.pdf", "demo resume"),
        pdf_upload("cover_letter.pdf", "demo cover letter"),
    )?;
    println!(
        "\nsubmitted application #{} ({})",
        record.application.id,
        record.application.status.label()
    );

    let reviewed = service.update_status(record.application.id, "reviewed", &staff.email)?;
    println!(
        "{} marked it {}",
        staff.username,
        reviewed.application.status.label()
    );

    let approved = service.update_status(record.application.id, "approved", &staff.email)?;
    println!(
        "{} marked it {}",
        staff.username,
        approved.application.status.label()
    );

    for event in notifier.events() {
        println!(
            "\nnotification to {} — {}",
            event.recipient,
            StatusNotification::SUBJECT
        );
        for line in event.body().lines().take(3) {
            println!("  {line}");
        }
    }

    let listing = service.all_applications(&admin.email)?;
    println!("\n{} sees {} application(s):", admin.username, listing.len());
    for view in listing {
        println!(
            "  #{} {} — {} ({})",
            view.id,
            view.job_title,
            view.status.label(),
            view.applicant_email
        );
    }

    Ok(())
}
