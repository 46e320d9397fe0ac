use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::applications::artifacts::{
    ArtifactError, ArtifactKind, ArtifactLocator, ArtifactStore, ArtifactUpload,
};
use crate::applications::domain::{
    ApplicationId, ApplicationStatus, Job, JobApplication, JobId, Role, User,
};
use crate::applications::notify::{DispatchError, NotificationDispatcher, StatusNotification};
use crate::applications::repository::{
    ApplicationRecord, ApplicationRegistry, DirectoryError, JobCatalog, NewApplication,
    RegistryError, UserDirectory,
};
use crate::applications::router::application_router;
use crate::applications::service::JobApplicationService;

pub(super) const ALICE: &str = "alice@example.com";
pub(super) const BOB: &str = "bob@example.com";
pub(super) const RECRUITER: &str = "rita@example.com";
pub(super) const ADMIN: &str = "omar@example.com";

pub(super) const BACKEND_JOB: JobId = JobId(42);
pub(super) const ANALYST_JOB: JobId = JobId(7);

pub(super) fn users() -> Vec<User> {
    vec![
        User {
            id: 1,
            username: "alice".to_string(),
            email: ALICE.to_string(),
            password_hash: String::new(),
            role: Role::Applicant,
        },
        User {
            id: 2,
            username: "bob".to_string(),
            email: BOB.to_string(),
            password_hash: String::new(),
            role: Role::Applicant,
        },
        User {
            id: 3,
            username: "rita".to_string(),
            email: RECRUITER.to_string(),
            password_hash: String::new(),
            role: Role::Recruiter,
        },
        User {
            id: 4,
            username: "omar".to_string(),
            email: ADMIN.to_string(),
            password_hash: String::new(),
            role: Role::Admin,
        },
    ]
}

pub(super) fn jobs() -> Vec<Job> {
    vec![
        Job {
            id: BACKEND_JOB,
            title: "Backend Engineer".to_string(),
            description: "Own the services powering candidate pipelines".to_string(),
            location: "Des Moines, IA".to_string(),
            company: "Acme Corp".to_string(),
            salary: 98_000,
            employment_type: "Full-Time".to_string(),
            posted_date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
        },
        Job {
            id: ANALYST_JOB,
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

pub(super) fn upload(name: &str, bytes: &[u8]) -> ArtifactUpload {
    ArtifactUpload {
        bytes: bytes.to_vec(),
        original_name: name.to_string(),
    }
}

#[derive(Default)]
pub(super) struct MemoryRegistry {
    state: Mutex<MemoryRegistryState>,
}

#[derive(Default)]
struct MemoryRegistryState {
    records: HashMap<ApplicationId, ApplicationRecord>,
    next_id: u64,
}

impl ApplicationRegistry for MemoryRegistry {
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

pub(super) struct UnavailableRegistry;

impl ApplicationRegistry for UnavailableRegistry {
    fn insert(&self, _application: NewApplication) -> Result<ApplicationRecord, RegistryError> {
        Err(RegistryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RegistryError> {
        Err(RegistryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: ApplicationId) -> Result<Option<ApplicationRecord>, RegistryError> {
        Err(RegistryError::Unavailable("database offline".to_string()))
    }

    fn for_applicant(&self, _email: &str) -> Result<Vec<ApplicationRecord>, RegistryError> {
        Err(RegistryError::Unavailable("database offline".to_string()))
    }

    fn for_job(&self, _job_id: JobId) -> Result<Vec<ApplicationRecord>, RegistryError> {
        Err(RegistryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<ApplicationRecord>, RegistryError> {
        Err(RegistryError::Unavailable("database offline".to_string()))
    }
}

/// Registry that injects version conflicts to simulate a concurrent writer.
/// With `withdraw_during_conflict` set, the simulated writer withdraws the
/// application before the conflict surfaces.
pub(super) struct RacingRegistry {
    inner: MemoryRegistry,
    conflicts: AtomicUsize,
    withdraw_during_conflict: bool,
}

impl RacingRegistry {
    pub(super) fn new(conflicts: usize, withdraw_during_conflict: bool) -> Self {
        Self {
            inner: MemoryRegistry::default(),
            conflicts: AtomicUsize::new(conflicts),
            withdraw_during_conflict,
        }
    }
}

impl ApplicationRegistry for RacingRegistry {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RegistryError> {
        self.inner.insert(application)
    }

    fn update(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RegistryError> {
        if self.conflicts.load(Ordering::SeqCst) > 0 {
            self.conflicts.fetch_sub(1, Ordering::SeqCst);
            if self.withdraw_during_conflict {
                if let Some(mut current) = self.inner.fetch(record.application.id)? {
                    current.application.status = ApplicationStatus::Withdrawn;
                    self.inner.update(current)?;
                }
            }
            return Err(RegistryError::VersionConflict);
        }
        self.inner.update(record)
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RegistryError> {
        self.inner.fetch(id)
    }

    fn for_applicant(&self, email: &str) -> Result<Vec<ApplicationRecord>, RegistryError> {
        self.inner.for_applicant(email)
    }

    fn for_job(&self, job_id: JobId) -> Result<Vec<ApplicationRecord>, RegistryError> {
        self.inner.for_job(job_id)
    }

    fn all(&self) -> Result<Vec<ApplicationRecord>, RegistryError> {
        self.inner.all()
    }
}

pub(super) struct MemoryDirectory {
    users: Vec<User>,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self { users: users() }
    }
}

impl UserDirectory for MemoryDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        Ok(self
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

pub(super) struct MemoryCatalog {
    jobs: Vec<Job>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self { jobs: jobs() }
    }
}

impl JobCatalog for MemoryCatalog {
    fn find(&self, id: JobId) -> Result<Option<Job>, DirectoryError> {
        Ok(self.jobs.iter().find(|job| job.id == id).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryArtifactStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    sequence: AtomicU64,
}

impl ArtifactStore for MemoryArtifactStore {
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

#[derive(Default)]
pub(super) struct RecordingDispatcher {
    events: Mutex<Vec<StatusNotification>>,
}

impl RecordingDispatcher {
    pub(super) fn events(&self) -> Vec<StatusNotification> {
        self.events.lock().expect("dispatch mutex poisoned").clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn dispatch(&self, notification: StatusNotification) -> Result<(), DispatchError> {
        self.events
            .lock()
            .expect("dispatch mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    fn dispatch(&self, _notification: StatusNotification) -> Result<(), DispatchError> {
        Err(DispatchError::Transport("smtp relay unreachable".to_string()))
    }
}

pub(super) type TestService = JobApplicationService<
    MemoryRegistry,
    MemoryDirectory,
    MemoryCatalog,
    MemoryArtifactStore,
    RecordingDispatcher,
>;

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryRegistry>,
    Arc<MemoryArtifactStore>,
    Arc<RecordingDispatcher>,
) {
    let registry = Arc::new(MemoryRegistry::default());
    let artifacts = Arc::new(MemoryArtifactStore::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = JobApplicationService::new(
        registry.clone(),
        Arc::new(MemoryDirectory::default()),
        Arc::new(MemoryCatalog::default()),
        artifacts.clone(),
        dispatcher.clone(),
    );
    (service, registry, artifacts, dispatcher)
}

pub(super) fn application_router_with_service(service: TestService) -> axum::Router {
    application_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_raw_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}
