use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

// Timestamp alias for clarity
pub type Timestamp = DateTime<Utc>;

/// Lifecycle of a posted project. Transitions are driven by the callers
/// (accepting a bid moves a project to `InProgress`, leaving feedback moves it
/// to `Completed`); the store itself never rejects a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
    Open,
    InProgress,
    Completed,
}

/// Delivery state of a project, independent of `ProjectStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Submitted,
    Approved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Which side of the marketplace performed an action on a project's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActorRole {
    Client,
    Developer,
}

impl ActorRole {
    /// Human-readable form used in file log messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ActorRole::Client => "Client",
            ActorRole::Developer => "Developer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Upload,
    Delete,
    Update,
}

/// A file attached to a project. The `url` is an ephemeral locator handed to
/// us by the uploader, not a durable address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub url: String,
    pub uploaded_at: Timestamp,
    pub uploaded_by: ActorRole,
}

/// File metadata as supplied by an uploader, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProjectFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub url: String,
    pub uploaded_by: ActorRole,
}

/// One entry in a project's append-only file change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLogEntry {
    pub timestamp: Timestamp,
    pub action: FileAction,
    pub file_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Budget in whole currency units.
    pub budget: u64,
    /// Expected delivery timeline in days.
    pub timeline_days: u32,
    pub skills: Vec<String>,
    pub status: ProjectStatus,
    pub client_id: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_status: Option<SubmissionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub files: Vec<ProjectFile>,
    #[serde(default)]
    pub file_log: Vec<FileLogEntry>,
}

impl Project {
    pub fn new(
        name: String,
        description: String,
        budget: u64,
        timeline_days: u32,
        skills: Vec<String>,
        client_id: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            budget,
            timeline_days,
            skills,
            status: ProjectStatus::Open,
            client_id,
            created_at: Utc::now(),
            submission_status: Some(SubmissionStatus::Pending),
            submission_url: None,
            payment_status: None,
            files: Vec::new(),
            file_log: Vec::new(),
        }
    }

    /// Apply a partial update. Absent fields are left untouched.
    pub fn apply_patch(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(budget) = patch.budget {
            self.budget = budget;
        }
        if let Some(timeline_days) = patch.timeline_days {
            self.timeline_days = timeline_days;
        }
        if let Some(skills) = patch.skills {
            self.skills = skills;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: String,
    pub project_id: String,
    pub freelancer_id: String,
    pub amount: u64,
    pub timeline_days: u32,
    pub proposal: String,
    pub status: BidStatus,
    pub created_at: Timestamp,
}

impl Bid {
    pub fn new(
        project_id: String,
        freelancer_id: String,
        amount: u64,
        timeline_days: u32,
        proposal: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            freelancer_id,
            amount,
            timeline_days,
            proposal,
            status: BidStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn apply_patch(&mut self, patch: BidPatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(timeline_days) = patch.timeline_days {
            self.timeline_days = timeline_days;
        }
        if let Some(proposal) = patch.proposal {
            self.proposal = proposal;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Feedback left by a client for a freelancer on a completed project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFeedback {
    pub id: String,
    pub project_id: String,
    pub freelancer_id: String,
    /// 1-5 inclusive by convention; the store does not validate the range.
    pub rating: u8,
    pub comment: String,
    pub created_at: Timestamp,
}

impl ProjectFeedback {
    pub fn new(project_id: String, freelancer_id: String, rating: u8, comment: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            freelancer_id,
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}

/// Partial update for a project. All fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub timeline_days: Option<u32>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BidPatch {
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub timeline_days: Option<u32>,
    #[serde(default)]
    pub proposal: Option<String>,
    #[serde(default)]
    pub status: Option<BidStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_leaves_absent_fields_untouched() {
        let mut project = Project::new(
            "Landing page".to_string(),
            "Marketing site refresh".to_string(),
            500,
            10,
            vec!["react".to_string()],
            "client-1".to_string(),
        );
        let original_description = project.description.clone();

        project.apply_patch(ProjectPatch {
            budget: Some(750),
            ..Default::default()
        });

        assert_eq!(project.budget, 750);
        assert_eq!(project.description, original_description);
        assert_eq!(project.status, ProjectStatus::Open);
    }

    #[test]
    fn status_round_trips_through_snake_case() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: ProjectStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ProjectStatus::InProgress);
    }
}
