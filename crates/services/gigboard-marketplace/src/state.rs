use chrono::Utc;
use gigboard_types::{
    ActorRole, Bid, BidPatch, BidStatus, FileAction, FileLogEntry, Freelancer,
    FreelancerReputation, NewProjectFile, PaymentStatus, Project, ProjectFeedback, ProjectFile,
    ProjectPatch, ProjectStatus, SubmissionStatus,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The entire marketplace state: every collection the service owns, held in
/// insertion order and persisted as a single snapshot after each mutation.
///
/// Every mutation here is total. An unknown id leaves the state untouched;
/// readers get `None` or an empty list. Referential consistency by id is the
/// only cross-collection invariant, maintained by the project delete cascade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceState {
    pub projects: Vec<Project>,
    pub bids: Vec<Bid>,
    pub feedback: Vec<ProjectFeedback>,
    pub reputations: Vec<FreelancerReputation>,
    pub freelancers: Vec<Freelancer>,
}

impl MarketplaceState {
    pub fn add_project(&mut self, project: Project) {
        self.projects.push(project);
    }

    pub fn add_bid(&mut self, bid: Bid) {
        self.bids.push(bid);
    }

    pub fn update_bid_status(&mut self, bid_id: &str, status: BidStatus) {
        if let Some(bid) = self.bids.iter_mut().find(|b| b.id == bid_id) {
            bid.status = status;
        }
    }

    pub fn update_project_status(&mut self, project_id: &str, status: ProjectStatus) {
        if let Some(project) = self.project_mut(project_id) {
            project.status = status;
        }
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn bid(&self, id: &str) -> Option<&Bid> {
        self.bids.iter().find(|b| b.id == id)
    }

    /// Bids for one project, in insertion order.
    pub fn bids_for_project(&self, project_id: &str) -> Vec<Bid> {
        self.bids
            .iter()
            .filter(|b| b.project_id == project_id)
            .cloned()
            .collect()
    }

    /// The accepted bid for a project, if any. When callers have accepted
    /// more than one (the store does not forbid it), the earliest wins.
    pub fn accepted_bid_for_project(&self, project_id: &str) -> Option<&Bid> {
        self.bids
            .iter()
            .find(|b| b.project_id == project_id && b.status == BidStatus::Accepted)
    }

    pub fn submit_project(&mut self, project_id: &str, submission_url: &str) {
        if let Some(project) = self.project_mut(project_id) {
            project.submission_status = Some(SubmissionStatus::Submitted);
            project.submission_url = Some(submission_url.to_string());
        }
    }

    pub fn approve_submission(&mut self, project_id: &str) {
        if let Some(project) = self.project_mut(project_id) {
            project.submission_status = Some(SubmissionStatus::Approved);
        }
    }

    pub fn add_feedback(&mut self, feedback: ProjectFeedback) {
        self.feedback.push(feedback);
    }

    pub fn feedback_for_freelancer(&self, freelancer_id: &str) -> Vec<ProjectFeedback> {
        self.feedback
            .iter()
            .filter(|f| f.freelancer_id == freelancer_id)
            .cloned()
            .collect()
    }

    /// Append a rating entry to the freelancer's aggregate, creating the
    /// aggregate if absent. The cached mean is recomputed on every insert.
    pub fn update_freelancer_rating(
        &mut self,
        freelancer_id: &str,
        rating: u8,
        feedback: Option<String>,
    ) {
        let index = match self
            .reputations
            .iter()
            .position(|r| r.freelancer_id == freelancer_id)
        {
            Some(index) => index,
            None => {
                self.reputations
                    .push(FreelancerReputation::new(freelancer_id.to_string()));
                self.reputations.len() - 1
            }
        };
        self.reputations[index].record(rating, feedback, Utc::now());
    }

    /// Current average rating, or 0 if the freelancer has no aggregate yet.
    pub fn freelancer_rating(&self, freelancer_id: &str) -> f64 {
        self.reputations
            .iter()
            .find(|r| r.freelancer_id == freelancer_id)
            .map(|r| r.average_rating)
            .unwrap_or(0.0)
    }

    pub fn update_payment_status(&mut self, project_id: &str, status: PaymentStatus) {
        if let Some(project) = self.project_mut(project_id) {
            project.payment_status = Some(status);
        }
    }

    /// Credit earnings to an existing roster entry. Unknown freelancers are a
    /// no-op; no record is created implicitly.
    pub fn update_freelancer_earnings(&mut self, freelancer_id: &str, amount: u64) {
        if let Some(freelancer) = self.freelancers.iter_mut().find(|f| f.id == freelancer_id) {
            freelancer.credit(amount);
        }
    }

    pub fn add_freelancer(&mut self, freelancer: Freelancer) {
        self.freelancers.push(freelancer);
    }

    pub fn freelancer(&self, id: &str) -> Option<&Freelancer> {
        self.freelancers.iter().find(|f| f.id == id)
    }

    /// Attach a file to a project, assigning it a fresh id and appending an
    /// upload entry to the project's file log. Returns the stored file, or
    /// `None` when the project does not exist.
    pub fn add_project_file(&mut self, project_id: &str, file: NewProjectFile) -> Option<ProjectFile> {
        let project = self.project_mut(project_id)?;
        let stored = ProjectFile {
            id: Uuid::new_v4().to_string(),
            name: file.name,
            size: file.size,
            mime_type: file.mime_type,
            url: file.url,
            uploaded_at: Utc::now(),
            uploaded_by: file.uploaded_by,
        };
        project.file_log.push(FileLogEntry {
            timestamp: stored.uploaded_at,
            action: FileAction::Upload,
            file_id: stored.id.clone(),
            message: format!(
                "{} uploaded {}",
                stored.uploaded_by.display_name(),
                stored.name
            ),
        });
        project.files.push(stored.clone());
        Some(stored)
    }

    /// Remove a file from a project and append a delete entry to the file
    /// log. Missing project or file is a no-op.
    pub fn delete_project_file(&mut self, project_id: &str, file_id: &str, deleted_by: ActorRole) {
        let Some(project) = self.project_mut(project_id) else {
            return;
        };
        let Some(position) = project.files.iter().position(|f| f.id == file_id) else {
            return;
        };
        let removed = project.files.remove(position);
        project.file_log.push(FileLogEntry {
            timestamp: Utc::now(),
            action: FileAction::Delete,
            file_id: file_id.to_string(),
            message: format!("{} deleted {}", deleted_by.display_name(), removed.name),
        });
    }

    pub fn update_project(&mut self, project_id: &str, patch: ProjectPatch) {
        if let Some(project) = self.project_mut(project_id) {
            project.apply_patch(patch);
        }
    }

    /// Remove a project and cascade to the bids and feedback that reference
    /// it. Attached files and the file log live inside the project record, so
    /// they go with it.
    pub fn delete_project(&mut self, project_id: &str) {
        self.projects.retain(|p| p.id != project_id);
        self.bids.retain(|b| b.project_id != project_id);
        self.feedback.retain(|f| f.project_id != project_id);
    }

    pub fn update_bid(&mut self, bid_id: &str, patch: BidPatch) {
        if let Some(bid) = self.bids.iter_mut().find(|b| b.id == bid_id) {
            bid.apply_patch(patch);
        }
    }

    pub fn delete_bid(&mut self, bid_id: &str) {
        self.bids.retain(|b| b.id != bid_id);
    }
}
