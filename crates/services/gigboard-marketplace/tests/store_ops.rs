use gigboard_marketplace::{AppError, InMemoryStore, MarketplaceStore};
use gigboard_types::{
    ActorRole, Bid, BidStatus, Freelancer, NewProjectFile, Project, ProjectFeedback,
    ProjectStatus, SubmissionStatus,
};

fn project(name: &str, budget: u64, timeline_days: u32) -> Project {
    Project::new(
        name.to_string(),
        format!("{} description", name),
        budget,
        timeline_days,
        vec!["rust".to_string()],
        "client-1".to_string(),
    )
}

#[tokio::test]
async fn rating_is_the_running_arithmetic_mean() -> Result<(), AppError> {
    let store = InMemoryStore::new();

    store
        .update_freelancer_rating("f1", 4, None)
        .await?;
    store
        .update_freelancer_rating("f1", 5, Some("solid delivery".to_string()))
        .await?;
    assert_eq!(store.freelancer_rating("f1").await?, 4.5);

    store.update_freelancer_rating("f1", 3, None).await?;
    assert_eq!(store.freelancer_rating("f1").await?, 4.0);

    // No aggregate yet for f2
    assert_eq!(store.freelancer_rating("f2").await?, 0.0);
    Ok(())
}

#[tokio::test]
async fn delete_project_cascades_and_spares_the_rest() -> Result<(), AppError> {
    let store = InMemoryStore::new();
    let doomed = project("doomed", 500, 10);
    let survivor = project("survivor", 900, 20);
    let doomed_id = doomed.id.clone();
    let survivor_id = survivor.id.clone();
    store.add_project(doomed).await?;
    store.add_project(survivor).await?;

    store
        .add_bid(Bid::new(doomed_id.clone(), "f1".into(), 450, 9, "p1".into()))
        .await?;
    store
        .add_bid(Bid::new(survivor_id.clone(), "f1".into(), 850, 18, "p2".into()))
        .await?;
    store
        .add_project_feedback(ProjectFeedback::new(doomed_id.clone(), "f1".into(), 5, "ok".into()))
        .await?;
    store
        .add_project_feedback(ProjectFeedback::new(
            survivor_id.clone(),
            "f1".into(),
            4,
            "fine".into(),
        ))
        .await?;

    store.delete_project(&doomed_id).await?;

    assert!(store.get_project(&doomed_id).await?.is_none());
    assert!(store.bids_for_project(&doomed_id).await?.is_empty());
    assert!(store.get_project(&survivor_id).await?.is_some());
    assert_eq!(store.bids_for_project(&survivor_id).await?.len(), 1);

    let remaining_feedback = store.feedback_for_freelancer("f1").await?;
    assert_eq!(remaining_feedback.len(), 1);
    assert_eq!(remaining_feedback[0].project_id, survivor_id);
    Ok(())
}

#[tokio::test]
async fn file_add_then_delete_leaves_files_as_before_plus_two_log_entries() -> Result<(), AppError>
{
    let store = InMemoryStore::new();
    let p = project("with-files", 500, 10);
    let project_id = p.id.clone();
    store.add_project(p).await?;

    let stored = store
        .add_project_file(
            &project_id,
            NewProjectFile {
                name: "mockups.zip".to_string(),
                size: 1_048_576,
                mime_type: "application/zip".to_string(),
                url: "blob:local/mockups".to_string(),
                uploaded_by: ActorRole::Developer,
            },
        )
        .await?
        .expect("project exists");

    store
        .delete_project_file(&project_id, &stored.id, ActorRole::Client)
        .await?;

    let after = store.get_project(&project_id).await?.unwrap();
    assert!(after.files.is_empty());
    assert_eq!(after.file_log.len(), 2);
    assert_eq!(after.file_log[0].message, "Developer uploaded mockups.zip");
    assert_eq!(after.file_log[1].message, "Client deleted mockups.zip");
    assert_eq!(after.file_log[0].file_id, stored.id);
    assert_eq!(after.file_log[1].file_id, stored.id);
    Ok(())
}

#[tokio::test]
async fn submit_sets_submission_state_on_that_project_only() -> Result<(), AppError> {
    let store = InMemoryStore::new();
    let submitted = project("submitted", 500, 10);
    let untouched = project("untouched", 700, 12);
    let submitted_id = submitted.id.clone();
    let untouched_id = untouched.id.clone();
    store.add_project(submitted).await?;
    store.add_project(untouched.clone()).await?;

    store
        .submit_project(&submitted_id, "https://example.com/delivery")
        .await?;

    let after = store.get_project(&submitted_id).await?.unwrap();
    assert_eq!(after.submission_status, Some(SubmissionStatus::Submitted));
    assert_eq!(
        after.submission_url.as_deref(),
        Some("https://example.com/delivery")
    );

    let other = store.get_project(&untouched_id).await?.unwrap();
    assert_eq!(other, untouched);
    Ok(())
}

#[tokio::test]
async fn status_updates_are_idempotent_through_the_store() -> Result<(), AppError> {
    let store = InMemoryStore::new();
    let p = project("idem", 500, 10);
    let project_id = p.id.clone();
    store.add_project(p).await?;
    let bid = Bid::new(project_id.clone(), "f1".into(), 450, 9, "take it".into());
    let bid_id = bid.id.clone();
    store.add_bid(bid).await?;

    store
        .update_bid_status(&bid_id, BidStatus::Accepted)
        .await?;
    let after_first = store.get_bid(&bid_id).await?.unwrap();
    store
        .update_bid_status(&bid_id, BidStatus::Accepted)
        .await?;
    assert_eq!(store.get_bid(&bid_id).await?.unwrap(), after_first);

    store
        .update_project_status(&project_id, ProjectStatus::InProgress)
        .await?;
    let after_first = store.get_project(&project_id).await?.unwrap();
    store
        .update_project_status(&project_id, ProjectStatus::InProgress)
        .await?;
    assert_eq!(store.get_project(&project_id).await?.unwrap(), after_first);
    Ok(())
}

#[tokio::test]
async fn accepted_bid_flow_matches_the_project_lifecycle() -> Result<(), AppError> {
    let store = InMemoryStore::new();
    let p = project("lifecycle", 500, 10);
    let project_id = p.id.clone();
    store.add_project(p).await?;

    let b1 = Bid::new(project_id.clone(), "f1".into(), 450, 9, "ready to start".into());
    let b1_id = b1.id.clone();
    store.add_bid(b1).await?;

    store.update_bid_status(&b1_id, BidStatus::Accepted).await?;
    store
        .update_project_status(&project_id, ProjectStatus::InProgress)
        .await?;

    let bids = store.bids_for_project(&project_id).await?;
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].id, b1_id);
    assert_eq!(bids[0].status, BidStatus::Accepted);
    assert_eq!(
        store.get_project(&project_id).await?.unwrap().status,
        ProjectStatus::InProgress
    );
    Ok(())
}

#[tokio::test]
async fn earnings_accumulate_and_ignore_unknown_freelancers() -> Result<(), AppError> {
    let store = InMemoryStore::new();
    store
        .add_freelancer(Freelancer::new("f1".into(), "Jane Doe".into()))
        .await?;

    store.update_freelancer_earnings("f1", 100).await?;
    store.update_freelancer_earnings("f1", 50).await?;
    assert_eq!(store.get_freelancer("f1").await?.unwrap().total_earnings, 150);

    store.update_freelancer_earnings("ghost", 75).await?;
    assert!(store.get_freelancer("ghost").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn bids_are_listed_in_insertion_order() -> Result<(), AppError> {
    let store = InMemoryStore::new();
    let p = project("ordered", 500, 10);
    let project_id = p.id.clone();
    store.add_project(p).await?;

    for (freelancer, amount) in [("f1", 450u64), ("f2", 480), ("f3", 420)] {
        store
            .add_bid(Bid::new(
                project_id.clone(),
                freelancer.to_string(),
                amount,
                9,
                "proposal".into(),
            ))
            .await?;
    }

    let amounts: Vec<u64> = store
        .bids_for_project(&project_id)
        .await?
        .iter()
        .map(|b| b.amount)
        .collect();
    assert_eq!(amounts, vec![450, 480, 420]);
    Ok(())
}
