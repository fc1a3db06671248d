use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::handlers::{
    accept_bid_handler, approve_submission_handler, confirm_payment_handler, create_bid_handler,
    create_checkout_session_handler, create_feedback_handler, create_freelancer_handler,
    create_project_handler, delete_bid_handler, delete_file_handler, delete_project_handler,
    feedback_for_freelancer_handler, get_freelancer_handler, get_project_handler,
    get_rating_handler, health_handler, list_bids_handler, list_projects_handler, metrics_handler,
    patch_bid_handler, patch_project_handler, set_bid_status_handler, set_payment_status_handler,
    set_project_status_handler, stream_bids_handler, submit_project_handler, upload_file_handler,
};
use crate::storage::MarketplaceStore;

pub fn create_app(store: Arc<dyn MarketplaceStore>, config: Arc<ServiceConfig>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/projects",
            post(create_project_handler).get(list_projects_handler),
        )
        .route(
            "/projects/:project_id",
            get(get_project_handler)
                .patch(patch_project_handler)
                .delete(delete_project_handler),
        )
        .route("/projects/:project_id/status", post(set_project_status_handler))
        .route(
            "/projects/:project_id/bids",
            post(create_bid_handler).get(list_bids_handler),
        )
        .route("/projects/:project_id/bids/ws", get(stream_bids_handler))
        .route("/projects/:project_id/submit", post(submit_project_handler))
        .route(
            "/projects/:project_id/approve",
            post(approve_submission_handler),
        )
        .route(
            "/projects/:project_id/payment-status",
            post(set_payment_status_handler),
        )
        .route("/projects/:project_id/files", post(upload_file_handler))
        .route(
            "/projects/:project_id/files/:file_id",
            axum::routing::delete(delete_file_handler),
        )
        .route("/bids/:bid_id/accept", post(accept_bid_handler))
        .route("/bids/:bid_id/status", post(set_bid_status_handler))
        .route(
            "/bids/:bid_id",
            axum::routing::patch(patch_bid_handler).delete(delete_bid_handler),
        )
        .route("/feedback", post(create_feedback_handler))
        .route("/freelancers", post(create_freelancer_handler))
        .route("/freelancers/:freelancer_id", get(get_freelancer_handler))
        .route(
            "/freelancers/:freelancer_id/feedback",
            get(feedback_for_freelancer_handler),
        )
        .route(
            "/freelancers/:freelancer_id/rating",
            get(get_rating_handler),
        )
        .route(
            "/payments/checkout-session",
            post(create_checkout_session_handler),
        )
        .route("/payments/confirm", post(confirm_payment_handler))
        .layer(Extension(store))
        .layer(Extension(config))
}
