use crate::error::AppError;
use crate::state::MarketplaceState;
use async_trait::async_trait;
use gigboard_types::{
    ActorRole, Bid, BidPatch, BidStatus, Freelancer, NewProjectFile, PaymentStatus, Project,
    ProjectFeedback, ProjectFile, ProjectPatch, ProjectStatus,
};
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

/// Single source of truth for all marketplace entities. Every mutation is
/// reflected in all derived reads before the call returns; implementations
/// that persist do so as part of the same call.
///
/// Operations are total: unknown ids are no-ops or `None`, never errors. The
/// `Err` side is reserved for storage and serialization failures.
#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    async fn add_project(&self, project: Project) -> Result<(), AppError>;
    async fn get_project(&self, id: &str) -> Result<Option<Project>, AppError>;
    async fn list_projects(&self) -> Result<Vec<Project>, AppError>;
    async fn update_project(&self, project_id: &str, patch: ProjectPatch) -> Result<(), AppError>;
    async fn update_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
    ) -> Result<(), AppError>;
    async fn delete_project(&self, project_id: &str) -> Result<(), AppError>;

    async fn add_bid(&self, bid: Bid) -> Result<(), AppError>;
    async fn get_bid(&self, id: &str) -> Result<Option<Bid>, AppError>;
    async fn bids_for_project(&self, project_id: &str) -> Result<Vec<Bid>, AppError>;
    async fn accepted_bid_for_project(&self, project_id: &str)
        -> Result<Option<Bid>, AppError>;
    async fn update_bid(&self, bid_id: &str, patch: BidPatch) -> Result<(), AppError>;
    async fn update_bid_status(&self, bid_id: &str, status: BidStatus) -> Result<(), AppError>;
    async fn delete_bid(&self, bid_id: &str) -> Result<(), AppError>;

    /// Subscribe to bids placed on a project from this point on.
    async fn subscribe_to_bids(
        &self,
        project_id: &str,
    ) -> Result<broadcast::Receiver<Bid>, AppError>;

    async fn submit_project(
        &self,
        project_id: &str,
        submission_url: &str,
    ) -> Result<(), AppError>;
    async fn approve_submission(&self, project_id: &str) -> Result<(), AppError>;

    async fn add_project_feedback(&self, feedback: ProjectFeedback) -> Result<(), AppError>;
    async fn feedback_for_freelancer(
        &self,
        freelancer_id: &str,
    ) -> Result<Vec<ProjectFeedback>, AppError>;

    async fn update_freelancer_rating(
        &self,
        freelancer_id: &str,
        rating: u8,
        feedback: Option<String>,
    ) -> Result<(), AppError>;
    async fn freelancer_rating(&self, freelancer_id: &str) -> Result<f64, AppError>;

    async fn update_payment_status(
        &self,
        project_id: &str,
        status: PaymentStatus,
    ) -> Result<(), AppError>;
    async fn update_freelancer_earnings(
        &self,
        freelancer_id: &str,
        amount: u64,
    ) -> Result<(), AppError>;
    async fn add_freelancer(&self, freelancer: Freelancer) -> Result<(), AppError>;
    async fn get_freelancer(&self, id: &str) -> Result<Option<Freelancer>, AppError>;

    async fn add_project_file(
        &self,
        project_id: &str,
        file: NewProjectFile,
    ) -> Result<Option<ProjectFile>, AppError>;
    async fn delete_project_file(
        &self,
        project_id: &str,
        file_id: &str,
        deleted_by: ActorRole,
    ) -> Result<(), AppError>;
}

/// Per-project broadcast channels feeding the live bid streams.
pub(crate) struct BidBroadcasters {
    channels: RwLock<HashMap<String, broadcast::Sender<Bid>>>,
}

impl BidBroadcasters {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub async fn subscribe(&self, project_id: &str) -> broadcast::Receiver<Bid> {
        let mut channels = self.channels.write().await;
        channels
            .entry(project_id.to_string())
            .or_insert_with(|| broadcast::channel(32).0)
            .subscribe()
    }

    pub async fn publish(&self, bid: &Bid) {
        let channels = self.channels.read().await;
        if let Some(sender) = channels.get(&bid.project_id) {
            if sender.send(bid.clone()).is_err() {
                tracing::debug!("No active subscribers for bids on project {}", bid.project_id);
            }
        }
    }
}

/// In-memory implementation; state lives for the process lifetime only.
pub struct InMemoryStore {
    state: RwLock<MarketplaceState>,
    bid_events: BidBroadcasters,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_state(MarketplaceState::default())
    }

    pub fn with_state(state: MarketplaceState) -> Self {
        Self {
            state: RwLock::new(state),
            bid_events: BidBroadcasters::new(),
        }
    }

    async fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&MarketplaceState) -> R + Send,
        R: Send,
    {
        let state = self.state.read().await;
        f(&state)
    }

    async fn mutate<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut MarketplaceState) -> R + Send,
        R: Send,
    {
        let mut state = self.state.write().await;
        f(&mut state)
    }
}

#[async_trait]
impl MarketplaceStore for InMemoryStore {
    async fn add_project(&self, project: Project) -> Result<(), AppError> {
        self.mutate(|s| s.add_project(project)).await;
        Ok(())
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>, AppError> {
        Ok(self.read(|s| s.project(id).cloned()).await)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        Ok(self.read(|s| s.projects.clone()).await)
    }

    async fn update_project(&self, project_id: &str, patch: ProjectPatch) -> Result<(), AppError> {
        self.mutate(|s| s.update_project(project_id, patch)).await;
        Ok(())
    }

    async fn update_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
    ) -> Result<(), AppError> {
        self.mutate(|s| s.update_project_status(project_id, status))
            .await;
        Ok(())
    }

    async fn delete_project(&self, project_id: &str) -> Result<(), AppError> {
        self.mutate(|s| s.delete_project(project_id)).await;
        Ok(())
    }

    async fn add_bid(&self, bid: Bid) -> Result<(), AppError> {
        self.mutate(|s| s.add_bid(bid.clone())).await;
        self.bid_events.publish(&bid).await;
        Ok(())
    }

    async fn get_bid(&self, id: &str) -> Result<Option<Bid>, AppError> {
        Ok(self.read(|s| s.bid(id).cloned()).await)
    }

    async fn bids_for_project(&self, project_id: &str) -> Result<Vec<Bid>, AppError> {
        Ok(self.read(|s| s.bids_for_project(project_id)).await)
    }

    async fn accepted_bid_for_project(
        &self,
        project_id: &str,
    ) -> Result<Option<Bid>, AppError> {
        Ok(self
            .read(|s| s.accepted_bid_for_project(project_id).cloned())
            .await)
    }

    async fn update_bid(&self, bid_id: &str, patch: BidPatch) -> Result<(), AppError> {
        self.mutate(|s| s.update_bid(bid_id, patch)).await;
        Ok(())
    }

    async fn update_bid_status(&self, bid_id: &str, status: BidStatus) -> Result<(), AppError> {
        self.mutate(|s| s.update_bid_status(bid_id, status)).await;
        Ok(())
    }

    async fn delete_bid(&self, bid_id: &str) -> Result<(), AppError> {
        self.mutate(|s| s.delete_bid(bid_id)).await;
        Ok(())
    }

    async fn subscribe_to_bids(
        &self,
        project_id: &str,
    ) -> Result<broadcast::Receiver<Bid>, AppError> {
        Ok(self.bid_events.subscribe(project_id).await)
    }

    async fn submit_project(
        &self,
        project_id: &str,
        submission_url: &str,
    ) -> Result<(), AppError> {
        self.mutate(|s| s.submit_project(project_id, submission_url))
            .await;
        Ok(())
    }

    async fn approve_submission(&self, project_id: &str) -> Result<(), AppError> {
        self.mutate(|s| s.approve_submission(project_id)).await;
        Ok(())
    }

    async fn add_project_feedback(&self, feedback: ProjectFeedback) -> Result<(), AppError> {
        self.mutate(|s| s.add_feedback(feedback)).await;
        Ok(())
    }

    async fn feedback_for_freelancer(
        &self,
        freelancer_id: &str,
    ) -> Result<Vec<ProjectFeedback>, AppError> {
        Ok(self.read(|s| s.feedback_for_freelancer(freelancer_id)).await)
    }

    async fn update_freelancer_rating(
        &self,
        freelancer_id: &str,
        rating: u8,
        feedback: Option<String>,
    ) -> Result<(), AppError> {
        self.mutate(|s| s.update_freelancer_rating(freelancer_id, rating, feedback))
            .await;
        Ok(())
    }

    async fn freelancer_rating(&self, freelancer_id: &str) -> Result<f64, AppError> {
        Ok(self.read(|s| s.freelancer_rating(freelancer_id)).await)
    }

    async fn update_payment_status(
        &self,
        project_id: &str,
        status: PaymentStatus,
    ) -> Result<(), AppError> {
        self.mutate(|s| s.update_payment_status(project_id, status))
            .await;
        Ok(())
    }

    async fn update_freelancer_earnings(
        &self,
        freelancer_id: &str,
        amount: u64,
    ) -> Result<(), AppError> {
        self.mutate(|s| s.update_freelancer_earnings(freelancer_id, amount))
            .await;
        Ok(())
    }

    async fn add_freelancer(&self, freelancer: Freelancer) -> Result<(), AppError> {
        self.mutate(|s| s.add_freelancer(freelancer)).await;
        Ok(())
    }

    async fn get_freelancer(&self, id: &str) -> Result<Option<Freelancer>, AppError> {
        Ok(self.read(|s| s.freelancer(id).cloned()).await)
    }

    async fn add_project_file(
        &self,
        project_id: &str,
        file: NewProjectFile,
    ) -> Result<Option<ProjectFile>, AppError> {
        Ok(self.mutate(|s| s.add_project_file(project_id, file)).await)
    }

    async fn delete_project_file(
        &self,
        project_id: &str,
        file_id: &str,
        deleted_by: ActorRole,
    ) -> Result<(), AppError> {
        self.mutate(|s| s.delete_project_file(project_id, file_id, deleted_by))
            .await;
        Ok(())
    }
}
