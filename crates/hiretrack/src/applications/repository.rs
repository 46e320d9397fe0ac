use chrono::NaiveDate;
use serde::Serialize;

use super::artifacts::ArtifactLocator;
use super::domain::{ApplicationId, ApplicationStatus, Job, JobApplication, JobId, User};

/// Fields of an application before the registry assigns its identifier.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: JobId,
    pub applicant_email: String,
    pub applied_date: NaiveDate,
    pub status: ApplicationStatus,
    pub resume: ArtifactLocator,
    pub cover_letter: ArtifactLocator,
}

/// Registry envelope carrying the optimistic-concurrency token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub application: JobApplication,
    pub version: u64,
}

/// Durable storage contract for application records.
///
/// `insert` enforces the one-application-per-`(job, applicant)` rule
/// atomically with the insert itself. `update` rejects writes carrying a
/// stale version so read-modify-write cycles can retry instead of racing.
pub trait ApplicationRegistry: Send + Sync {
    fn insert(&self, application: NewApplication) -> Result<ApplicationRecord, RegistryError>;
    fn update(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RegistryError>;
    fn fetch(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RegistryError>;
    fn for_applicant(&self, email: &str) -> Result<Vec<ApplicationRecord>, RegistryError>;
    fn for_job(&self, job_id: JobId) -> Result<Vec<ApplicationRecord>, RegistryError>;
    fn all(&self) -> Result<Vec<ApplicationRecord>, RegistryError>;
}

/// Error enumeration for registry failures.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("an application for this job already exists")]
    Duplicate,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently")]
    VersionConflict,
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to user accounts; registration and credentials live
/// upstream.
pub trait UserDirectory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;
}

/// Read-only access to job postings; posting CRUD lives upstream.
pub trait JobCatalog: Send + Sync {
    fn find(&self, id: JobId) -> Result<Option<Job>, DirectoryError>;
}

/// Transport failure while consulting an external lookup service.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("lookup failed: {0}")]
    Unavailable(String),
}

/// Staff-facing projection of one application within a job listing.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub applicant_name: String,
    pub job_title: String,
    pub status: ApplicationStatus,
    pub resume: ArtifactLocator,
    pub cover_letter: ArtifactLocator,
}

/// Minimal projection for the global admin listing; carries no artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct AdminApplicationView {
    pub id: ApplicationId,
    pub status: ApplicationStatus,
    pub applicant_email: String,
    pub job_title: String,
}

/// Applicant-facing listing with count.
#[derive(Debug, Clone, Serialize)]
pub struct MyApplications {
    pub count: usize,
    pub applications: Vec<JobApplication>,
}
