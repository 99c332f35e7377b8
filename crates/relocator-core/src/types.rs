use crate::error::RelocateError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// StatusDir
// ---------------------------------------------------------------------------

/// Top-level status directory under the projects root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDir {
    Inactive,
    Rfps,
    Current,
    Completed,
}

impl StatusDir {
    /// Scan order used by folder lookup.
    pub fn all() -> &'static [StatusDir] {
        &[
            StatusDir::Inactive,
            StatusDir::Rfps,
            StatusDir::Current,
            StatusDir::Completed,
        ]
    }

    /// Directory name on disk.
    pub fn dir_name(self) -> &'static str {
        match self {
            StatusDir::Inactive => "00 Inactive",
            StatusDir::Rfps => "01 RFPs",
            StatusDir::Current => "11 Current",
            StatusDir::Completed => "99 Completed",
        }
    }

    /// Status a folder found here is assumed to have when it has no record.
    pub fn default_status(self) -> Status {
        match self {
            StatusDir::Inactive => Status::Cancelled,
            StatusDir::Rfps => Status::Draft,
            StatusDir::Current => Status::Active,
            StatusDir::Completed => Status::Completed,
        }
    }
}

impl fmt::Display for StatusDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl std::str::FromStr for StatusDir {
    type Err = RelocateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "00 inactive" | "inactive" => Ok(StatusDir::Inactive),
            "01 rfps" | "rfps" | "rfp" => Ok(StatusDir::Rfps),
            "11 current" | "current" => Ok(StatusDir::Current),
            "99 completed" | "completed" | "archive" => Ok(StatusDir::Completed),
            _ => Err(RelocateError::InvalidStatusDir(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    Sent,
    Awarded,
    Active,
    OnHold,
    Completed,
    Lost,
    Cancelled,
}

impl Status {
    pub fn all() -> &'static [Status] {
        &[
            Status::Draft,
            Status::Sent,
            Status::Awarded,
            Status::Active,
            Status::OnHold,
            Status::Completed,
            Status::Lost,
            Status::Cancelled,
        ]
    }

    /// The directory a project with this status lives under.
    pub fn folder(self) -> StatusDir {
        match self {
            Status::Draft | Status::Sent => StatusDir::Rfps,
            Status::Awarded | Status::Active => StatusDir::Current,
            Status::Completed => StatusDir::Completed,
            Status::OnHold | Status::Lost | Status::Cancelled => StatusDir::Inactive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Sent => "sent",
            Status::Awarded => "awarded",
            Status::Active => "active",
            Status::OnHold => "on_hold",
            Status::Completed => "completed",
            Status::Lost => "lost",
            Status::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = RelocateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" | "rfp" | "proposal" => Ok(Status::Draft),
            "sent" | "submitted" => Ok(Status::Sent),
            "awarded" => Ok(Status::Awarded),
            "active" | "current" | "ongoing" => Ok(Status::Active),
            "on_hold" | "on hold" | "on-hold" | "onhold" => Ok(Status::OnHold),
            "completed" | "finished" | "delivered" => Ok(Status::Completed),
            "lost" => Ok(Status::Lost),
            "cancelled" | "canceled" | "inactive" => Ok(Status::Cancelled),
            _ => Err(RelocateError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectNumber
// ---------------------------------------------------------------------------

/// Project number of the form `YY-CCCNN`: year, country dial code, sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectNumber(String);

static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
static FOLDER_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

fn number_re() -> &'static Regex {
    NUMBER_RE.get_or_init(|| Regex::new(r"^[0-9]{2}-[0-9]{5}$").unwrap())
}

fn folder_prefix_re() -> &'static Regex {
    FOLDER_PREFIX_RE.get_or_init(|| Regex::new(r"^([0-9]{2}-[0-9]{5})(?: |$)").unwrap())
}

impl ProjectNumber {
    pub fn parse(s: &str) -> crate::Result<Self> {
        let s = s.trim();
        if !number_re().is_match(s) {
            return Err(RelocateError::InvalidNumber(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Extract the project number a folder name starts with, if any.
    pub fn from_folder_name(name: &str) -> Option<Self> {
        folder_prefix_re()
            .captures(name)
            .map(|c| Self(c[1].to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year(&self) -> u32 {
        self.0[..2].parse().unwrap_or_default()
    }

    pub fn country(&self) -> u32 {
        self.0[3..6].parse().unwrap_or_default()
    }

    pub fn seq(&self) -> u32 {
        self.0[6..].parse().unwrap_or_default()
    }
}

impl fmt::Display for ProjectNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ProjectNumber {
    type Err = RelocateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProjectNumber {
    type Error = RelocateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ProjectNumber> for String {
    fn from(n: ProjectNumber) -> Self {
        n.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
