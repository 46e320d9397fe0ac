use super::domain::ApplicationStatus;

/// Status-change event emitted by the engine when an application is
/// approved or rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotification {
    pub recipient: String,
    pub applicant_name: String,
    pub job_title: String,
    pub status: ApplicationStatus,
}

impl StatusNotification {
    pub const SUBJECT: &'static str = "Your Job Application Status Update";

    /// Render the message body delivered to the applicant.
    pub fn body(&self) -> String {
        format!(
            "Hello {},\n\nYour application for the job \"{}\" has been {}.\n\nThank you for using hiretrack.\n\nBest regards,\nThe hiretrack team",
            self.applicant_name,
            self.job_title,
            self.status.label().to_ascii_lowercase()
        )
    }
}

/// Outbound delivery hook. Transports (SMTP relays, webhooks) are wired by
/// the host; the engine treats delivery as best-effort.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notification: StatusNotification) -> Result<(), DispatchError>;
}

/// Dispatch transport error.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
