use crate::config::ServiceConfig;
use crate::error::AppError;
use serde::Deserialize;
use std::time::Duration;

const PROCESSOR_TIMEOUT_SECS: u64 = 10;

/// Client for creating hosted checkout sessions against the payment
/// processor. One request per session, no retries; failures surface to the
/// caller as processor errors.
pub struct CheckoutClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
    public_origin: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
}

impl CheckoutClient {
    /// Builds a client from service configuration. Fails with a configuration
    /// error when the processor secret key is not set.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, AppError> {
        let secret_key = config
            .processor_secret_key
            .clone()
            .ok_or_else(|| AppError::Config("missing payment processor secret key".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROCESSOR_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Processor(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.processor_api_base.trim_end_matches('/').to_string(),
            secret_key,
            public_origin: config.public_origin.trim_end_matches('/').to_string(),
            currency: config.currency.clone(),
        })
    }

    /// Create a checkout session for `amount` minor currency units and return
    /// the processor's session id. The success redirect carries the project
    /// id so the caller can mark the payment complete afterwards.
    pub async fn create_session(
        &self,
        amount: u64,
        project_id: &str,
        bid_id: &str,
    ) -> Result<String, AppError> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);
        let success_url = format!(
            "{}/payment-success?project_id={}",
            self.public_origin, project_id
        );
        let cancel_url = format!("{}/?canceled=true", self.public_origin);
        let description = format!("Payment for project ID: {}", project_id);
        let amount_str = amount.to_string();

        let params: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url.as_str()),
            ("line_items[0][price_data][currency]", self.currency.as_str()),
            ("line_items[0][price_data][product_data][name]", "Project Payment"),
            (
                "line_items[0][price_data][product_data][description]",
                description.as_str(),
            ),
            ("line_items[0][price_data][unit_amount]", amount_str.as_str()),
            ("line_items[0][quantity]", "1"),
            ("metadata[project_id]", project_id),
            ("metadata[bid_id]", bid_id),
        ];

        tracing::debug!(%project_id, %bid_id, amount, "Creating checkout session");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Processor(format!("checkout session request failed: {}", e)))?;

        if resp.status().is_success() {
            let session: SessionResponse = resp.json().await.map_err(|e| {
                AppError::Processor(format!("failed to parse session response: {}", e))
            })?;
            tracing::info!(session_id = %session.id, %project_id, "Checkout session created");
            Ok(session.id)
        } else {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            tracing::error!(%status, "Checkout session creation failed: {}", body);
            Err(AppError::Processor(format!(
                "processor returned {}: {}",
                status, body
            )))
        }
    }
}
