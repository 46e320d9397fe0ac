//! CSV bootstrap for jobs and user accounts.
//!
//! Registration and posting CRUD belong to upstream services; local runs
//! hydrate the in-memory directory and catalog from seed files instead.

use std::io::Read;

use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::applications::domain::{Job, JobId, Role, User};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("malformed seed file: {0}")]
    Csv(#[from] csv::Error),
    #[error("unknown role '{role}' for user '{email}'")]
    UnknownRole { role: String, email: String },
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("seed data contains no {0} account")]
    MissingRole(&'static str),
    #[error("seed data contains no job postings")]
    NoJobs,
}

/// Parse job postings from CSV. Identifiers are assigned in row order,
/// starting at 1.
pub fn jobs_from_reader<R: Read>(reader: R) -> Result<Vec<Job>, SeedError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut jobs = Vec::new();
    for (index, row) in csv_reader.deserialize::<JobRow>().enumerate() {
        let row = row?;
        jobs.push(row.into_job(JobId(index as u64 + 1))?);
    }
    Ok(jobs)
}

/// Parse user accounts from CSV. Identifiers are assigned in row order,
/// starting at 1.
pub fn users_from_reader<R: Read>(reader: R) -> Result<Vec<User>, SeedError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut users = Vec::new();
    for (index, row) in csv_reader.deserialize::<UserRow>().enumerate() {
        let row = row?;
        let role = Role::parse(&row.role).ok_or_else(|| SeedError::UnknownRole {
            role: row.role.clone(),
            email: row.email.clone(),
        })?;
        users.push(User {
            id: index as u64 + 1,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash.unwrap_or_default(),
            role,
        });
    }
    Ok(users)
}

#[derive(Debug, Deserialize)]
struct JobRow {
    title: String,
    description: String,
    location: String,
    company: String,
    salary: u32,
    employment_type: String,
    #[serde(default)]
    posted_date: Option<String>,
}

impl JobRow {
    fn into_job(self, id: JobId) -> Result<Job, SeedError> {
        let posted_date = match self.posted_date.filter(|value| !value.is_empty()) {
            Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| SeedError::InvalidDate(raw))?,
            None => Local::now().date_naive(),
        };

        Ok(Job {
            id,
            title: self.title,
            description: self.description,
            location: self.location,
            company: self.company,
            salary: self.salary,
            employment_type: self.employment_type,
            posted_date,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UserRow {
    username: String,
    email: String,
    role: String,
    #[serde(default)]
    password_hash: Option<String>,
}
