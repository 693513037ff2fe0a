//! Print job model

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Job lifecycle: Queued → Printing → Succeeded | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Printing,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Printing => write!(f, "printing"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Which producer created the job (logging only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobSource {
    /// Completed aggregation bundle
    Briefing,
    /// Push-button reprint
    Reprint,
    /// Startup test page
    TestPage,
}

impl JobSource {
    fn prefix(self) -> &'static str {
        match self {
            JobSource::Briefing => "briefing",
            JobSource::Reprint => "reprint",
            JobSource::TestPage => "test_page",
        }
    }
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A unit of print work
///
/// Moves by value: producer → queue → worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJob {
    pub id: Uuid,
    /// Rendered text, without printer control codes
    pub content: String,
    pub job_name: String,
    pub created_at: DateTime<Local>,
    pub attempt_count: u32,
    pub status: JobStatus,
    pub source: JobSource,
}

impl PrintJob {
    /// Create a job named after its source and the current time
    pub fn new(content: impl Into<String>, source: JobSource) -> Self {
        let created_at = Local::now();
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            job_name: job_name_at(source, created_at),
            created_at,
            attempt_count: 0,
            status: JobStatus::Queued,
            source,
        }
    }

    pub fn briefing(content: impl Into<String>) -> Self {
        Self::new(content, JobSource::Briefing)
    }

    pub fn reprint(content: impl Into<String>) -> Self {
        Self::new(content, JobSource::Reprint)
    }

    /// Fixed test page exercising the character set
    pub fn test_page() -> Self {
        Self::new(TEST_PAGE, JobSource::TestPage)
    }

    /// Override the generated job name
    pub fn with_name(mut self, job_name: impl Into<String>) -> Self {
        self.job_name = job_name.into();
        self
    }
}

/// `briefing_20260101_080000`
pub fn job_name_at(source: JobSource, at: DateTime<Local>) -> String {
    format!("{}_{}", source.prefix(), at.format("%Y%m%d_%H%M%S"))
}

const TEST_PAGE: &str = "\
TEST PAGE
---------
This is a test of the dot matrix printer interface.
Testing formatting and printer control.

1234567890
ABCDEFGHIJKLMNOPQRSTUVWXYZ
abcdefghijklmnopqrstuvwxyz

Special characters: !@#$%^&*()
Box drawing: ┌─┬─┐ │ ├─┼─┤ └─┴─┘  Blocks: ░▒▓█";
