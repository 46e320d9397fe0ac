use chrono::NaiveDate;
use hiretrack::applications::{
    ApplicationId, ApplicationRecord, ApplicationRegistry, ArtifactError, ArtifactKind,
    ArtifactLocator, ArtifactStore, DirectoryError, DispatchError, Job, JobApplication,
    JobCatalog, JobId, NewApplication, NotificationDispatcher, RegistryError, Role,
    StatusNotification, User, UserDirectory,
};
use hiretrack::error::AppError;
use hiretrack::seed;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryApplicationRegistry {
    state: Mutex<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    records: HashMap<ApplicationId, ApplicationRecord>,
    next_id: u64,
}

impl ApplicationRegistry for InMemoryApplicationRegistry {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RegistryError> {
        let mut state = self.state.lock().expect("registry mutex poisoned");
        let duplicate = state.records.values().any(|record| {
            record.application.job_id == application.job_id
                && record
                    .application
                    .applicant_email
                    .eq_ignore_ascii_case(&application.applicant_email)
        });
        if duplicate {
            return Err(RegistryError::Duplicate);
        }

        state.next_id += 1;
        let record = ApplicationRecord {
            application: JobApplication {
                id: ApplicationId(state.next_id),
                job_id: application.job_id,
                applicant_email: application.applicant_email,
                applied_date: application.applied_date,
                status: application.status,
                resume: application.resume,
                cover_letter: application.cover_letter,
            },
            version: 1,
        };
        state.records.insert(record.application.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RegistryError> {
        let mut state = self.state.lock().expect("registry mutex poisoned");
        let existing = state
            .records
            .get_mut(&record.application.id)
            .ok_or(RegistryError::NotFound)?;
        if existing.version != record.version {
            return Err(RegistryError::VersionConflict);
        }

        let updated = ApplicationRecord {
            application: record.application,
            version: record.version + 1,
        };
        *existing = updated.clone();
        Ok(updated)
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RegistryError> {
        let state = self.state.lock().expect("registry mutex poisoned");
        Ok(state.records.get(&id).cloned())
    }

    fn for_applicant(&self, email: &str) -> Result<Vec<ApplicationRecord>, RegistryError> {
        let state = self.state.lock().expect("registry mutex poisoned");
        Ok(state
            .records
            .values()
            .filter(|record| record.application.applicant_email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }

    fn for_job(&self, job_id: JobId) -> Result<Vec<ApplicationRecord>, RegistryError> {
        let state = self.state.lock().expect("registry mutex poisoned");
        Ok(state
            .records
            .values()
            .filter(|record| record.application.job_id == job_id)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<ApplicationRecord>, RegistryError> {
        let state = self.state.lock().expect("registry mutex poisoned");
        Ok(state.records.values().cloned().collect())
    }
}

pub(crate) struct InMemoryUserDirectory {
    users: Vec<User>,
}

impl InMemoryUserDirectory {
    pub(crate) fn new(users: Vec<User>) -> Self {
        Self { users }
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        Ok(self
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

pub(crate) struct InMemoryJobCatalog {
    jobs: Vec<Job>,
}

impl InMemoryJobCatalog {
    pub(crate) fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }
}

impl JobCatalog for InMemoryJobCatalog {
    fn find(&self, id: JobId) -> Result<Option<Job>, DirectoryError> {
        Ok(self.jobs.iter().find(|job| job.id == id).cloned())
    }
}

/// Artifact store for the demo command; the server uses the filesystem
/// store from the core crate.
#[derive(Default)]
pub(crate) struct InMemoryArtifactStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    sequence: AtomicU64,
}

impl ArtifactStore for InMemoryArtifactStore {
    fn put(
        &self,
        bytes: &[u8],
        kind: ArtifactKind,
        original_name: &str,
    ) -> Result<ArtifactLocator, ArtifactError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let key = format!("mem://{sequence}/{}/{original_name}", kind.label());
        self.blobs
            .lock()
            .expect("artifact mutex poisoned")
            .insert(key.clone(), bytes.to_vec());
        Ok(ArtifactLocator(key))
    }

    fn get(&self, locator: &ArtifactLocator) -> Result<Vec<u8>, ArtifactError> {
        let blobs = self.blobs.lock().expect("artifact mutex poisoned");
        match blobs.get(&locator.0) {
            Some(bytes) if !bytes.is_empty() => Ok(bytes.clone()),
            _ => Err(ArtifactError::NotFound(locator.clone())),
        }
    }
}

/// Dispatcher backing the HTTP service: the mail relay is an external
/// concern, so delivery is logged and handed off.
pub(crate) struct LoggingNotifier;

impl NotificationDispatcher for LoggingNotifier {
    fn dispatch(&self, notification: StatusNotification) -> Result<(), DispatchError> {
        info!(
            recipient = %notification.recipient,
            subject = StatusNotification::SUBJECT,
            status = notification.status.label(),
            "dispatching status notification"
        );
        Ok(())
    }
}

/// Dispatcher for the demo command, so emitted notifications can be printed
/// after the run.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    events: Mutex<Vec<StatusNotification>>,
}

impl RecordingNotifier {
    pub(crate) fn events(&self) -> Vec<StatusNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationDispatcher for RecordingNotifier {
    fn dispatch(&self, notification: StatusNotification) -> Result<(), DispatchError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Load user accounts from the seed file, falling back to the built-in demo
/// directory.
pub(crate) fn load_users(path: Option<&Path>) -> Result<Vec<User>, AppError> {
    match path {
        Some(path) => {
            let file = File::open(path)?;
            Ok(seed::users_from_reader(file)?)
        }
        None => Ok(demo_users()),
    }
}

/// Load job postings from the seed file, falling back to the built-in demo
/// catalog.
pub(crate) fn load_jobs(path: Option<&Path>) -> Result<Vec<Job>, AppError> {
    match path {
        Some(path) => {
            let file = File::open(path)?;
            Ok(seed::jobs_from_reader(file)?)
        }
        None => Ok(demo_jobs()),
    }
}

pub(crate) fn demo_users() -> Vec<User> {
    let user = |id: u64, username: &str, email: &str, role: Role| User {
        id,
        username: username.to_string(),
        email: email.to_string(),
        password_hash: String::new(),
        role,
    };

    vec![
        user(1, "alice", "alice@example.com", Role::Applicant),
        user(2, "bob", "bob@example.com", Role::Applicant),
        user(3, "rita", "rita@example.com", Role::Recruiter),
        user(4, "omar", "omar@example.com", Role::Admin),
    ]
}

pub(crate) fn demo_jobs() -> Vec<Job> {
    vec![
        Job {
            id: JobId(1),
            title: "Backend Engineer".to_string(),
            description: "Own the services powering candidate pipelines".to_string(),
            location: "Des Moines, IA".to_string(),
            company: "Acme Corp".to_string(),
            salary: 98_000,
            employment_type: "Full-Time".to_string(),
            posted_date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
        },
        Job {
            id: JobId(2),
            title: "Data Analyst".to_string(),
            description: "Hiring funnel dashboards and reporting".to_string(),
            location: "Remote".to_string(),
            company: "Acme Corp".to_string(),
            salary: 74_000,
            employment_type: "Contract".to_string(),
            posted_date: NaiveDate::from_ymd_opt(2025, 7, 15).expect("valid date"),
        },
    ]
}
