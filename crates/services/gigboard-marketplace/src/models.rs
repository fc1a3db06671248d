use gigboard_types::{
    Bid, BidStatus, Freelancer, PaymentStatus, Project, ProjectFeedback, ProjectStatus,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Request structs

#[derive(Debug, Deserialize)]
pub struct NewProjectRequest {
    pub name: String,
    pub description: String,
    pub budget: u64,
    pub timeline_days: u32,
    #[serde(default)]
    pub skills: Vec<String>,
    pub client_id: String,
}

impl NewProjectRequest {
    pub fn into_project(self) -> Project {
        Project::new(
            self.name,
            self.description,
            self.budget,
            self.timeline_days,
            self.skills,
            self.client_id,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct NewBidRequest {
    pub freelancer_id: String,
    pub amount: u64,
    pub timeline_days: u32,
    pub proposal: String,
}

impl NewBidRequest {
    pub fn into_bid(self, project_id: String) -> Bid {
        Bid::new(
            project_id,
            self.freelancer_id,
            self.amount,
            self.timeline_days,
            self.proposal,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectStatusRequest {
    pub status: ProjectStatus,
}

#[derive(Debug, Deserialize)]
pub struct BidStatusRequest {
    pub status: BidStatus,
}

#[derive(Debug, Deserialize)]
pub struct PaymentStatusRequest {
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
pub struct SubmitProjectRequest {
    pub submission_url: String,
}

#[derive(Debug, Deserialize)]
pub struct NewFeedbackRequest {
    pub project_id: String,
    pub freelancer_id: String,
    pub rating: u8,
    pub comment: String,
}

impl NewFeedbackRequest {
    pub fn into_feedback(self) -> ProjectFeedback {
        ProjectFeedback::new(
            self.project_id,
            self.freelancer_id,
            self.rating,
            self.comment,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct NewFreelancerRequest {
    /// Optional caller-chosen id; a fresh one is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

impl NewFreelancerRequest {
    pub fn into_freelancer(self) -> Freelancer {
        let id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        Freelancer::new(id, self.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub project_id: String,
}

/// Body of a checkout session request once validated. The handler validates
/// field presence by hand so malformed bodies map to plain 400 responses.
#[derive(Debug, Deserialize)]
pub struct CheckoutSessionRequest {
    pub amount: u64,
    pub project_id: String,
    pub bid_id: String,
}

// Response structs

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub freelancer_id: String,
    pub average_rating: f64,
}
