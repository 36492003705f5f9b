//! Job data types
//!
//! Imports and exports run in the background; a job row tracks each one.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::db::DbError;

/// Kind of background work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    Import,
    Export,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Import => "IMPORT",
            JobType::Export => "EXPORT",
        }
    }
}

impl FromStr for JobType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IMPORT" => Ok(JobType::Import),
            "EXPORT" => Ok(JobType::Export),
            _ => Err(DbError::InvalidValue {
                kind: "job type",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of a job: created in progress, then done or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    InProgress,
    Done,
    Error,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::InProgress => "IN_PROGRESS",
            JobState::Done => "DONE",
            JobState::Error => "ERROR",
        }
    }
}

impl FromStr for JobState {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(JobState::InProgress),
            "DONE" => Ok(JobState::Done),
            "ERROR" => Ok(JobState::Error),
            _ => Err(DbError::InvalidValue {
                kind: "job state",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Stored as their upper-case names
impl ToSql for JobType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for JobType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: DbError| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for JobState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for JobState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: DbError| FromSqlError::Other(Box::new(e)))
    }
}

/// Stored job record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub job_type: JobType,
    pub job_state: JobState,
    /// Output file of an export job
    pub file_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Response carrying a freshly created job id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobIdResponse {
    pub id: String,
}

/// Response carrying a job's current state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStateResponse {
    pub state: JobState,
}

impl From<&Job> for JobIdResponse {
    fn from(job: &Job) -> Self {
        Self { id: job.id.clone() }
    }
}

impl From<&Job> for JobStateResponse {
    fn from(job: &Job) -> Self {
        Self {
            state: job.job_state,
        }
    }
}
