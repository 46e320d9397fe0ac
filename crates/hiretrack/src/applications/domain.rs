use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::artifacts::ArtifactLocator;

/// Identifier wrapper for persisted applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for catalog jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed role set with capability predicates, replacing scattered
/// string comparisons against role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Applicant,
    Recruiter,
    Admin,
}

impl Role {
    /// ADMIN and RECRUITER move applications through the pipeline.
    pub const fn can_manage_applications(self) -> bool {
        matches!(self, Role::Admin | Role::Recruiter)
    }

    /// Only ADMIN sees cross-applicant listings.
    pub const fn can_view_all_applications(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Parse a role name, accepting any casing.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "APPLICANT" => Some(Role::Applicant),
            "RECRUITER" => Some(Role::Recruiter),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::Applicant => "APPLICANT",
            Role::Recruiter => "RECRUITER",
            Role::Admin => "ADMIN",
        }
    }
}

/// Account record resolved through the user directory. Registration and
/// credential handling live upstream; the hash rides along opaquely and
/// never reaches the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
}

/// Job posting owned by the external catalog; read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub company: String,
    pub salary: u32,
    pub employment_type: String,
    pub posted_date: NaiveDate,
}

/// The five lifecycle statuses. WITHDRAWN is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Approved,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    /// Parse a caller-supplied status value, accepting any casing.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "REVIEWED" => Some(Self::Reviewed),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "WITHDRAWN" => Some(Self::Withdrawn),
            _ => None,
        }
    }

    /// Normalized upper-case form used for storage and the wire.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Reviewed => "REVIEWED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Withdrawn => "WITHDRAWN",
        }
    }

    /// Terminal statuses accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Withdrawn)
    }
}

/// One submitted application. `job_id` and `applicant_email` are weak
/// references resolved through the catalog and directory; artifact bytes
/// live in the artifact store behind the two locators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub applicant_email: String,
    pub applied_date: NaiveDate,
    pub status: ApplicationStatus,
    pub resume: ArtifactLocator,
    pub cover_letter: ArtifactLocator,
}

impl JobApplication {
    /// Ownership check; emails compare case-insensitively.
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.applicant_email.eq_ignore_ascii_case(email)
    }
}
