use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use super::artifacts::{ArtifactError, ArtifactKind, ArtifactStore, ArtifactUpload};
use super::domain::{ApplicationId, ApplicationStatus, Job, JobApplication, JobId, User};
use super::notify::{NotificationDispatcher, StatusNotification};
use super::repository::{
    AdminApplicationView, ApplicationRecord, ApplicationRegistry, ApplicationSummary,
    DirectoryError, JobCatalog, MyApplications, NewApplication, RegistryError, UserDirectory,
};

/// Confirmation returned by a successful withdrawal.
pub const WITHDRAW_CONFIRMATION: &str = "Application withdrawn successfully.";

/// Lifecycle engine composing the registry, directory, catalog, artifact
/// store, and notification dispatcher.
///
/// Every collaborator is an injected trait object owner; the engine holds
/// no ambient state beyond them.
pub struct JobApplicationService<R, U, C, S, N> {
    registry: Arc<R>,
    directory: Arc<U>,
    catalog: Arc<C>,
    artifacts: Arc<S>,
    notifier: Arc<N>,
}

impl<R, U, C, S, N> JobApplicationService<R, U, C, S, N>
where
    R: ApplicationRegistry + 'static,
    U: UserDirectory + 'static,
    C: JobCatalog + 'static,
    S: ArtifactStore + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(
        registry: Arc<R>,
        directory: Arc<U>,
        catalog: Arc<C>,
        artifacts: Arc<S>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            registry,
            directory,
            catalog,
            artifacts,
            notifier,
        }
    }

    fn job(&self, id: JobId) -> Result<Job, ApplicationServiceError> {
        self.catalog
            .find(id)?
            .ok_or(ApplicationServiceError::JobNotFound(id))
    }

    fn user(&self, email: &str) -> Result<User, ApplicationServiceError> {
        self.directory
            .find_by_email(email)?
            .ok_or_else(|| ApplicationServiceError::UserNotFound(email.to_string()))
    }

    fn record(&self, id: ApplicationId) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.registry
            .fetch(id)?
            .ok_or(ApplicationServiceError::ApplicationNotFound(id))
    }

    /// Submit a new application carrying both documents.
    ///
    /// Both artifacts are stored and their locators known before the record
    /// is inserted; the registry enforces the duplicate guard atomically
    /// with the insert.
    pub fn apply(
        &self,
        job_id: JobId,
        applicant_email: &str,
        resume: ArtifactUpload,
        cover_letter: ArtifactUpload,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.job(job_id)?;
        let applicant = self.user(applicant_email)?;

        let resume = self
            .artifacts
            .put(&resume.bytes, ArtifactKind::Resume, &resume.original_name)?;
        let cover_letter = self.artifacts.put(
            &cover_letter.bytes,
            ArtifactKind::CoverLetter,
            &cover_letter.original_name,
        )?;

        let stored = self.registry.insert(NewApplication {
            job_id,
            applicant_email: applicant.email,
            applied_date: Local::now().date_naive(),
            status: ApplicationStatus::Pending,
            resume,
            cover_letter,
        })?;

        info!(
            application = stored.application.id.0,
            job = job_id.0,
            "application submitted"
        );
        Ok(stored)
    }

    /// Move an application to a new status on behalf of staff.
    ///
    /// A same-status call is a no-op returning the unchanged record; real
    /// transitions to APPROVED or REJECTED emit exactly one notification.
    pub fn update_status(
        &self,
        application_id: ApplicationId,
        raw_status: &str,
        requester_email: &str,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let mut record = self.record(application_id)?;

        let requester = self.user(requester_email)?;
        if !requester.role.can_manage_applications() {
            return Err(ApplicationServiceError::Forbidden(
                "only ADMIN or RECRUITER can update application status",
            ));
        }

        let new_status = ApplicationStatus::parse(raw_status)
            .ok_or_else(|| ApplicationServiceError::UnknownStatus(raw_status.to_string()))?;

        let (record, changed) = loop {
            if record.application.status.is_terminal() {
                return Err(ApplicationServiceError::WithdrawnImmutable);
            }
            if record.application.status == new_status {
                break (record, false);
            }

            let mut next = record.clone();
            next.application.status = new_status;
            match self.registry.update(next) {
                Ok(updated) => break (updated, true),
                Err(RegistryError::VersionConflict) => {
                    record = self.record(application_id)?;
                }
                Err(other) => return Err(other.into()),
            }
        };

        if !changed {
            info!(
                application = application_id.0,
                status = new_status.label(),
                "status unchanged, nothing to do"
            );
            return Ok(record);
        }

        info!(
            application = application_id.0,
            status = new_status.label(),
            "application status updated"
        );

        if matches!(
            new_status,
            ApplicationStatus::Approved | ApplicationStatus::Rejected
        ) {
            self.notify_applicant(&record.application, new_status);
        }

        Ok(record)
    }

    /// Notification delivery is best-effort: assembly or transport failures
    /// are logged and never unwind the persisted transition.
    fn notify_applicant(&self, application: &JobApplication, status: ApplicationStatus) {
        let assembled = self
            .user(&application.applicant_email)
            .and_then(|applicant| {
                let job = self.job(application.job_id)?;
                Ok(StatusNotification {
                    recipient: applicant.email,
                    applicant_name: applicant.username,
                    job_title: job.title,
                    status,
                })
            });

        match assembled {
            Ok(notification) => {
                if let Err(err) = self.notifier.dispatch(notification) {
                    warn!(
                        application = application.id.0,
                        error = %err,
                        "failed to dispatch status notification"
                    );
                }
            }
            Err(err) => warn!(
                application = application.id.0,
                error = %err,
                "could not assemble status notification"
            ),
        }
    }

    /// Withdraw an application on behalf of its owner. Terminal and
    /// idempotent: repeating the call succeeds without another write.
    pub fn withdraw(
        &self,
        application_id: ApplicationId,
        requester_email: &str,
    ) -> Result<&'static str, ApplicationServiceError> {
        let mut record = self.record(application_id)?;

        if !record.application.is_owned_by(requester_email) {
            return Err(ApplicationServiceError::Forbidden(
                "unauthorized to withdraw this application",
            ));
        }

        loop {
            if record.application.status == ApplicationStatus::Withdrawn {
                break;
            }

            let mut next = record.clone();
            next.application.status = ApplicationStatus::Withdrawn;
            match self.registry.update(next) {
                Ok(_) => break,
                Err(RegistryError::VersionConflict) => {
                    record = self.record(application_id)?;
                }
                Err(other) => return Err(other.into()),
            }
        }

        info!(application = application_id.0, "application withdrawn");
        Ok(WITHDRAW_CONFIRMATION)
    }

    /// Fetch a record for status display; callers gate visibility through
    /// [`Self::can_access`].
    pub fn get(
        &self,
        application_id: ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.record(application_id)
    }

    /// True for staff and for the owning applicant.
    pub fn can_access(
        &self,
        application_id: ApplicationId,
        email: &str,
    ) -> Result<bool, ApplicationServiceError> {
        let record = self.record(application_id)?;
        let user = self.user(email)?;
        Ok(user.role.can_manage_applications() || record.application.is_owned_by(email))
    }

    pub fn is_admin(&self, email: &str) -> Result<bool, ApplicationServiceError> {
        Ok(self.user(email)?.role.can_view_all_applications())
    }

    /// Resume bytes for download.
    pub fn resume(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<u8>, ApplicationServiceError> {
        let record = self.record(application_id)?;
        Ok(self.artifacts.get(&record.application.resume)?)
    }

    /// Cover-letter bytes for download.
    pub fn cover_letter(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<u8>, ApplicationServiceError> {
        let record = self.record(application_id)?;
        Ok(self.artifacts.get(&record.application.cover_letter)?)
    }

    /// All applications submitted by one applicant, with a count.
    pub fn my_applications(
        &self,
        email: &str,
    ) -> Result<MyApplications, ApplicationServiceError> {
        let applications: Vec<JobApplication> = self
            .registry
            .for_applicant(email)?
            .into_iter()
            .map(|record| record.application)
            .collect();

        Ok(MyApplications {
            count: applications.len(),
            applications,
        })
    }

    /// Applications for one job, projected for staff review. ADMIN only.
    pub fn applications_for_job(
        &self,
        job_id: JobId,
        requester_email: &str,
    ) -> Result<Vec<ApplicationSummary>, ApplicationServiceError> {
        let job = self.job(job_id)?;

        let requester = self.user(requester_email)?;
        if !requester.role.can_view_all_applications() {
            return Err(ApplicationServiceError::Forbidden(
                "unauthorized to view job applications",
            ));
        }

        let mut summaries = Vec::new();
        for record in self.registry.for_job(job_id)? {
            let applicant = self.user(&record.application.applicant_email)?;
            summaries.push(ApplicationSummary {
                applicant_name: applicant.username,
                job_title: job.title.clone(),
                status: record.application.status,
                resume: record.application.resume,
                cover_letter: record.application.cover_letter,
            });
        }

        Ok(summaries)
    }

    /// Global minimal listing across all applications. ADMIN only.
    pub fn all_applications(
        &self,
        requester_email: &str,
    ) -> Result<Vec<AdminApplicationView>, ApplicationServiceError> {
        if !self.is_admin(requester_email)? {
            return Err(ApplicationServiceError::Forbidden(
                "access denied: not an admin",
            ));
        }

        let mut views = Vec::new();
        for record in self.registry.all()? {
            let job_title = self.job(record.application.job_id)?.title;
            views.push(AdminApplicationView {
                id: record.application.id,
                status: record.application.status,
                applicant_email: record.application.applicant_email,
                job_title,
            });
        }

        Ok(views)
    }
}

/// Error raised by the lifecycle engine.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("user '{0}' not found")]
    UserNotFound(String),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("you have already applied to this job")]
    AlreadyApplied,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("cannot update a withdrawn application")]
    WithdrawnImmutable,
    #[error("unknown application status '{0}'")]
    UnknownStatus(String),
    #[error(transparent)]
    Registry(RegistryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl From<RegistryError> for ApplicationServiceError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::Duplicate => Self::AlreadyApplied,
            other => Self::Registry(other),
        }
    }
}
