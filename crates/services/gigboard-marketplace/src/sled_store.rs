use crate::error::AppError;
use crate::state::MarketplaceState;
use crate::storage::{BidBroadcasters, MarketplaceStore};
use async_trait::async_trait;
use gigboard_types::{
    ActorRole, Bid, BidPatch, BidStatus, Freelancer, NewProjectFile, PaymentStatus, Project,
    ProjectFeedback, ProjectFile, ProjectPatch, ProjectStatus,
};
use std::path::Path;
use tokio::sync::RwLock;

const STATE_TREE_NAME: &str = "marketplace";
const SNAPSHOT_KEY: &[u8] = b"state";

/// Persistent store backed by a Sled database holding the whole
/// [`MarketplaceState`] as one JSON snapshot under a single key. The snapshot
/// is hydrated once at open and rewritten in full after every mutation.
pub struct SledSnapshotStore {
    _db: sled::Db,
    tree: sled::Tree,
    state: RwLock<MarketplaceState>,
    bid_events: BidBroadcasters,
}

impl SledSnapshotStore {
    /// Opens or creates the database at `path` and hydrates the snapshot.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        tracing::info!("Opening marketplace state database at {:?}", path);
        let db = sled::open(path)?;
        let tree = db.open_tree(STATE_TREE_NAME)?;
        let state = match tree.get(SNAPSHOT_KEY)? {
            Some(ivec) => serde_json::from_slice(&ivec)?,
            None => MarketplaceState::default(),
        };
        Ok(Self {
            _db: db,
            tree,
            state: RwLock::new(state),
            bid_events: BidBroadcasters::new(),
        })
    }

    fn persist(&self, state: &MarketplaceState) -> Result<(), AppError> {
        let snapshot = serde_json::to_vec(state)?;
        self.tree.insert(SNAPSHOT_KEY, snapshot)?;
        self.tree.flush()?;
        Ok(())
    }

    async fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&MarketplaceState) -> R + Send,
        R: Send,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Apply a mutation and rewrite the snapshot before releasing the write
    /// lock, so no read can observe unpersisted state.
    async fn mutate<R, F>(&self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut MarketplaceState) -> R + Send,
        R: Send,
    {
        let mut state = self.state.write().await;
        let result = f(&mut state);
        self.persist(&state)?;
        Ok(result)
    }
}

#[async_trait]
impl MarketplaceStore for SledSnapshotStore {
    async fn add_project(&self, project: Project) -> Result<(), AppError> {
        self.mutate(|s| s.add_project(project)).await
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>, AppError> {
        Ok(self.read(|s| s.project(id).cloned()).await)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        Ok(self.read(|s| s.projects.clone()).await)
    }

    async fn update_project(&self, project_id: &str, patch: ProjectPatch) -> Result<(), AppError> {
        self.mutate(|s| s.update_project(project_id, patch)).await
    }

    async fn update_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
    ) -> Result<(), AppError> {
        self.mutate(|s| s.update_project_status(project_id, status))
            .await
    }

    async fn delete_project(&self, project_id: &str) -> Result<(), AppError> {
        self.mutate(|s| s.delete_project(project_id)).await
    }

    async fn add_bid(&self, bid: Bid) -> Result<(), AppError> {
        self.mutate(|s| s.add_bid(bid.clone())).await?;
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
        self.mutate(|s| s.update_bid(bid_id, patch)).await
    }

    async fn update_bid_status(&self, bid_id: &str, status: BidStatus) -> Result<(), AppError> {
        self.mutate(|s| s.update_bid_status(bid_id, status)).await
    }

    async fn delete_bid(&self, bid_id: &str) -> Result<(), AppError> {
        self.mutate(|s| s.delete_bid(bid_id)).await
    }

    async fn subscribe_to_bids(
        &self,
        project_id: &str,
    ) -> Result<tokio::sync::broadcast::Receiver<Bid>, AppError> {
        Ok(self.bid_events.subscribe(project_id).await)
    }

    async fn submit_project(
        &self,
        project_id: &str,
        submission_url: &str,
    ) -> Result<(), AppError> {
        self.mutate(|s| s.submit_project(project_id, submission_url))
            .await
    }

    async fn approve_submission(&self, project_id: &str) -> Result<(), AppError> {
        self.mutate(|s| s.approve_submission(project_id)).await
    }

    async fn add_project_feedback(&self, feedback: ProjectFeedback) -> Result<(), AppError> {
        self.mutate(|s| s.add_feedback(feedback)).await
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
            .await
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
            .await
    }

    async fn update_freelancer_earnings(
        &self,
        freelancer_id: &str,
        amount: u64,
    ) -> Result<(), AppError> {
        self.mutate(|s| s.update_freelancer_earnings(freelancer_id, amount))
            .await
    }

    async fn add_freelancer(&self, freelancer: Freelancer) -> Result<(), AppError> {
        self.mutate(|s| s.add_freelancer(freelancer)).await
    }

    async fn get_freelancer(&self, id: &str) -> Result<Option<Freelancer>, AppError> {
        Ok(self.read(|s| s.freelancer(id).cloned()).await)
    }

    async fn add_project_file(
        &self,
        project_id: &str,
        file: NewProjectFile,
    ) -> Result<Option<ProjectFile>, AppError> {
        self.mutate(|s| s.add_project_file(project_id, file)).await
    }

    async fn delete_project_file(
        &self,
        project_id: &str,
        file_id: &str,
        deleted_by: ActorRole,
    ) -> Result<(), AppError> {
        self.mutate(|s| s.delete_project_file(project_id, file_id, deleted_by))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn snapshot_survives_reopen() -> Result<(), AppError> {
        let dir = tempdir().expect("tempdir");

        let project = Project::new(
            "Persisted".to_string(),
            "survives restarts".to_string(),
            800,
            14,
            vec!["rust".to_string()],
            "client-1".to_string(),
        );
        let project_id = project.id.clone();

        {
            let store = SledSnapshotStore::open(dir.path())?;
            store.add_project(project.clone()).await?;
            store
                .add_freelancer(Freelancer::new("f1".to_string(), "Jane".to_string()))
                .await?;
            store.update_freelancer_earnings("f1", 250).await?;
        }

        let reopened = SledSnapshotStore::open(dir.path())?;
        let loaded = reopened.get_project(&project_id).await?.expect("hydrated");
        assert_eq!(loaded, project);
        assert_eq!(
            reopened.get_freelancer("f1").await?.unwrap().total_earnings,
            250
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_database_starts_blank() -> Result<(), AppError> {
        let dir = tempdir().expect("tempdir");
        let store = SledSnapshotStore::open(dir.path())?;
        assert!(store.list_projects().await?.is_empty());
        Ok(())
    }
}
