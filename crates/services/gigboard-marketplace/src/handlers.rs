use crate::config::ServiceConfig;
use crate::error::AppError;
use crate::metrics;
use crate::models::{
    BidStatusRequest, CheckoutSessionRequest, ConfirmPaymentRequest, NewBidRequest,
    NewFeedbackRequest, NewFreelancerRequest, NewProjectRequest, PaymentStatusRequest,
    ProjectStatusRequest, RatingResponse, SessionCreatedResponse, SubmitProjectRequest,
};
use crate::payment_client::CheckoutClient;
use crate::storage::MarketplaceStore;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use futures::StreamExt;
use gigboard_types::{
    ActorRole, Bid, BidPatch, BidStatus, NewProjectFile, PaymentStatus, ProjectPatch,
    ProjectStatus,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// --- Projects ---

pub async fn create_project_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Json(req): Json<NewProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let project = req.into_project();
    store.add_project(project.clone()).await?;
    metrics::record_store_mutation("add_project");
    tracing::info!(project_id = %project.id, client_id = %project.client_id, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

#[derive(Deserialize)]
pub struct ListProjectsQuery {
    pub status: Option<String>,
}

fn parse_project_status(s: Option<String>) -> Option<ProjectStatus> {
    s.and_then(|status_str| ProjectStatus::from_str(&status_str.to_lowercase()).ok())
}

pub async fn list_projects_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status_filter = parse_project_status(query.status);
    let mut projects = store.list_projects().await?;
    if let Some(status) = status_filter {
        projects.retain(|p| p.status == status);
    }
    Ok(Json(projects))
}

pub async fn get_project_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match store.get_project(&project_id).await? {
        Some(project) => Ok(Json(project)),
        None => Err(AppError::NotFound(format!("project {}", project_id))),
    }
}

pub async fn patch_project_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> Result<impl IntoResponse, AppError> {
    if store.get_project(&project_id).await?.is_none() {
        return Err(AppError::NotFound(format!("project {}", project_id)));
    }
    store.update_project(&project_id, patch).await?;
    metrics::record_store_mutation("update_project");
    Ok(StatusCode::OK)
}

pub async fn set_project_status_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
    Json(req): Json<ProjectStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    store.update_project_status(&project_id, req.status).await?;
    metrics::record_store_mutation("update_project_status");
    Ok(StatusCode::OK)
}

pub async fn delete_project_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    store.delete_project(&project_id).await?;
    metrics::record_store_mutation("delete_project");
    tracing::info!(project_id = %project_id, "Project deleted");
    Ok(StatusCode::OK)
}

// --- Bids ---

pub async fn create_bid_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
    Json(req): Json<NewBidRequest>,
) -> Result<impl IntoResponse, AppError> {
    if store.get_project(&project_id).await?.is_none() {
        return Err(AppError::NotFound(format!("project {}", project_id)));
    }
    let bid = req.into_bid(project_id);
    store.add_bid(bid.clone()).await?;
    metrics::record_store_mutation("add_bid");
    tracing::info!(bid_id = %bid.id, project_id = %bid.project_id, freelancer_id = %bid.freelancer_id, "Bid placed");
    Ok((StatusCode::CREATED, Json(bid)))
}

pub async fn list_bids_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.bids_for_project(&project_id).await?))
}

/// Accept a bid and move its project to in-progress. Refuses when the project
/// already has a different accepted bid; the raw status endpoint below stays
/// permissive for callers that want the unchecked behavior.
pub async fn accept_bid_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(bid_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bid = store
        .get_bid(&bid_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("bid {}", bid_id)))?;

    if let Some(existing) = store.accepted_bid_for_project(&bid.project_id).await? {
        if existing.id != bid.id {
            return Err(AppError::Conflict(format!(
                "project {} already has accepted bid {}",
                bid.project_id, existing.id
            )));
        }
    }

    store
        .update_bid_status(&bid_id, BidStatus::Accepted)
        .await?;
    store
        .update_project_status(&bid.project_id, ProjectStatus::InProgress)
        .await?;
    metrics::record_store_mutation("update_bid_status");
    metrics::record_store_mutation("update_project_status");
    tracing::info!(bid_id = %bid_id, project_id = %bid.project_id, "Bid accepted");

    Ok(Json(json!({
        "message": "Bid accepted",
        "bid_id": bid_id,
        "project_id": bid.project_id,
    })))
}

pub async fn set_bid_status_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(bid_id): Path<String>,
    Json(req): Json<BidStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    store.update_bid_status(&bid_id, req.status).await?;
    metrics::record_store_mutation("update_bid_status");
    Ok(StatusCode::OK)
}

pub async fn patch_bid_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(bid_id): Path<String>,
    Json(patch): Json<BidPatch>,
) -> Result<impl IntoResponse, AppError> {
    if store.get_bid(&bid_id).await?.is_none() {
        return Err(AppError::NotFound(format!("bid {}", bid_id)));
    }
    store.update_bid(&bid_id, patch).await?;
    metrics::record_store_mutation("update_bid");
    Ok(StatusCode::OK)
}

pub async fn delete_bid_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(bid_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    store.delete_bid(&bid_id).await?;
    metrics::record_store_mutation("delete_bid");
    Ok(StatusCode::OK)
}

// --- Submission ---

pub async fn submit_project_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
    Json(req): Json<SubmitProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if store.get_project(&project_id).await?.is_none() {
        return Err(AppError::NotFound(format!("project {}", project_id)));
    }
    store
        .submit_project(&project_id, &req.submission_url)
        .await?;
    metrics::record_store_mutation("submit_project");
    tracing::info!(project_id = %project_id, "Work submitted");
    Ok(StatusCode::OK)
}

pub async fn approve_submission_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if store.get_project(&project_id).await?.is_none() {
        return Err(AppError::NotFound(format!("project {}", project_id)));
    }
    store.approve_submission(&project_id).await?;
    metrics::record_store_mutation("approve_submission");
    tracing::info!(project_id = %project_id, "Submission approved");
    Ok(StatusCode::OK)
}

// --- Feedback and ratings ---

/// Record feedback for a completed project. Also appends the rating to the
/// freelancer's aggregate and moves the project to completed, which is what
/// closes out the project lifecycle.
pub async fn create_feedback_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Json(req): Json<NewFeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    let feedback = req.into_feedback();
    store.add_project_feedback(feedback.clone()).await?;
    metrics::record_store_mutation("add_project_feedback");

    store
        .update_freelancer_rating(
            &feedback.freelancer_id,
            feedback.rating,
            Some(feedback.comment.clone()),
        )
        .await?;
    metrics::record_store_mutation("update_freelancer_rating");

    store
        .update_project_status(&feedback.project_id, ProjectStatus::Completed)
        .await?;
    metrics::record_store_mutation("update_project_status");

    tracing::info!(
        project_id = %feedback.project_id,
        freelancer_id = %feedback.freelancer_id,
        rating = feedback.rating,
        "Feedback recorded"
    );
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn feedback_for_freelancer_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(freelancer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.feedback_for_freelancer(&freelancer_id).await?))
}

pub async fn get_rating_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(freelancer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let average_rating = store.freelancer_rating(&freelancer_id).await?;
    Ok(Json(RatingResponse {
        freelancer_id,
        average_rating,
    }))
}

// --- Freelancers ---

pub async fn create_freelancer_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Json(req): Json<NewFreelancerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let freelancer = req.into_freelancer();
    store.add_freelancer(freelancer.clone()).await?;
    metrics::record_store_mutation("add_freelancer");
    Ok((StatusCode::CREATED, Json(freelancer)))
}

pub async fn get_freelancer_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(freelancer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match store.get_freelancer(&freelancer_id).await? {
        Some(freelancer) => Ok(Json(freelancer)),
        None => Err(AppError::NotFound(format!("freelancer {}", freelancer_id))),
    }
}

// --- Project files ---

pub async fn upload_file_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
    Json(file): Json<NewProjectFile>,
) -> Result<impl IntoResponse, AppError> {
    match store.add_project_file(&project_id, file).await? {
        Some(stored) => {
            metrics::record_store_mutation("add_project_file");
            tracing::info!(project_id = %project_id, file_id = %stored.id, "File attached");
            Ok((StatusCode::CREATED, Json(stored)))
        }
        None => Err(AppError::NotFound(format!("project {}", project_id))),
    }
}

#[derive(Deserialize)]
pub struct DeleteFileQuery {
    pub deleted_by: String,
}

pub async fn delete_file_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path((project_id, file_id)): Path<(String, String)>,
    Query(query): Query<DeleteFileQuery>,
) -> Result<impl IntoResponse, AppError> {
    let deleted_by = ActorRole::from_str(&query.deleted_by)
        .map_err(|_| AppError::InvalidInput(format!("unknown role {}", query.deleted_by)))?;
    store
        .delete_project_file(&project_id, &file_id, deleted_by)
        .await?;
    metrics::record_store_mutation("delete_project_file");
    Ok(StatusCode::OK)
}

// --- Payments ---

pub async fn set_payment_status_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
    Json(req): Json<PaymentStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    store.update_payment_status(&project_id, req.status).await?;
    metrics::record_store_mutation("update_payment_status");
    Ok(StatusCode::OK)
}

pub async fn create_checkout_session_handler(
    Extension(config): Extension<Arc<ServiceConfig>>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    // Field presence is validated by hand so a missing amount/project_id/
    // bid_id maps to 400, matching the contract of this endpoint.
    let req: CheckoutSessionRequest = serde_json::from_value(body).map_err(|_| {
        metrics::record_checkout_outcome("invalid_request");
        AppError::InvalidInput(
            "missing required parameters (amount, project_id, bid_id)".to_string(),
        )
    })?;

    let client = CheckoutClient::from_config(&config).map_err(|e| {
        metrics::record_checkout_outcome("configuration_error");
        e
    })?;

    let session_id = client
        .create_session(req.amount, &req.project_id, &req.bid_id)
        .await
        .map_err(|e| {
            metrics::record_checkout_outcome("processor_error");
            e
        })?;

    metrics::record_checkout_outcome("created");
    Ok(Json(SessionCreatedResponse { session_id }))
}

/// Driven by the processor's success redirect. Marks the project paid and
/// credits the accepted bid's amount to its freelancer. Confirming an already
/// paid project changes nothing.
pub async fn confirm_payment_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let project = store
        .get_project(&req.project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {}", req.project_id)))?;

    if project.payment_status == Some(PaymentStatus::Paid) {
        return Ok(Json(json!({
            "message": "Payment already recorded",
            "project_id": req.project_id,
        })));
    }

    store
        .update_payment_status(&req.project_id, PaymentStatus::Paid)
        .await?;
    metrics::record_store_mutation("update_payment_status");

    if let Some(bid) = store.accepted_bid_for_project(&req.project_id).await? {
        store
            .update_freelancer_earnings(&bid.freelancer_id, bid.amount)
            .await?;
        metrics::record_store_mutation("update_freelancer_earnings");
        tracing::info!(
            project_id = %req.project_id,
            freelancer_id = %bid.freelancer_id,
            amount = bid.amount,
            "Payment recorded, earnings credited"
        );
    } else {
        tracing::warn!(project_id = %req.project_id, "Payment recorded with no accepted bid");
    }

    Ok(Json(json!({
        "message": "Payment recorded",
        "project_id": req.project_id,
    })))
}

// --- Bid streaming ---

pub async fn stream_bids_handler(
    Extension(store): Extension<Arc<dyn MarketplaceStore>>,
    Path(project_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    if store.get_project(&project_id).await?.is_none() {
        return Err(AppError::NotFound(format!("project {}", project_id)));
    }
    // Subscribe before snapshotting existing bids so none land in the gap.
    let receiver = store.subscribe_to_bids(&project_id).await?;
    let existing = store.bids_for_project(&project_id).await?;
    Ok(ws.on_upgrade(move |socket| stream_bids(socket, existing, receiver, project_id)))
}

async fn stream_bids(
    mut socket: WebSocket,
    existing: Vec<Bid>,
    mut receiver: broadcast::Receiver<Bid>,
    project_id: String,
) {
    tracing::info!("Bid stream opened for project {}", project_id);
    metrics::bid_stream_client_connected();

    for bid in existing {
        if let Ok(json_bid) = serde_json::to_string(&bid) {
            if socket.send(Message::Text(json_bid)).await.is_err() {
                metrics::bid_stream_client_disconnected();
                return;
            }
        }
    }

    loop {
        tokio::select! {
            incoming = receiver.recv() => match incoming {
                Ok(bid) => {
                    let Ok(json_bid) = serde_json::to_string(&bid) else {
                        tracing::warn!("Failed to serialize bid {} for stream", bid.id);
                        continue;
                    };
                    if socket.send(Message::Text(json_bid)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(
                        "Bid stream for project {} lagged by {} messages",
                        project_id, n
                    );
                }
            },
            msg = socket.next() => match msg {
                Some(Ok(Message::Ping(payload))) => {
                    if socket.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    metrics::bid_stream_client_disconnected();
    tracing::info!("Bid stream closed for project {}", project_id);
}

// --- Metrics ---

pub async fn metrics_handler() -> Html<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => match String::from_utf8(buffer) {
            Ok(metrics_text) => Html(metrics_text),
            Err(e) => {
                tracing::error!("Failed to convert Prometheus buffer to UTF-8: {}", e);
                Html("# ERROR: Failed to convert buffer to UTF-8\n".to_string())
            }
        },
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {}", e);
            Html(format!("# ERROR: Failed to encode metrics: {}\n", e))
        }
    }
}
