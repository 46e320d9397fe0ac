//! Application lifecycle engine: intake, status transitions, withdrawal,
//! authorization, and artifact plumbing for job applications.
//!
//! The engine orchestrates five injected contracts — registry, user
//! directory, job catalog, artifact store, notification dispatcher — so the
//! whole lifecycle can be exercised against in-memory fakes.

pub mod artifacts;
pub mod domain;
pub mod notify;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use artifacts::{
    ArtifactError, ArtifactKind, ArtifactLocator, ArtifactStore, ArtifactUpload, FsArtifactStore,
};
pub use domain::{ApplicationId, ApplicationStatus, Job, JobApplication, JobId, Role, User};
pub use notify::{DispatchError, NotificationDispatcher, StatusNotification};
pub use repository::{
    AdminApplicationView, ApplicationRecord, ApplicationRegistry, ApplicationSummary,
    DirectoryError, JobCatalog, MyApplications, NewApplication, RegistryError, UserDirectory,
};
pub use router::{application_router, CallerIdentity};
pub use service::{ApplicationServiceError, JobApplicationService, WITHDRAW_CONFIRMATION};
