use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, IntGauge, Opts};

// Metrics for store mutations, labelled by operation name
static STORE_MUTATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "marketplace_store_mutations_total",
            "Number of store mutations applied, by operation",
        ),
        &["op"],
    )
    .expect("Failed to create store_mutations metric");

    register_metric(&counter);
    counter
});

static CHECKOUT_SESSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "marketplace_checkout_sessions_total",
            "Checkout session creation attempts, by outcome",
        ),
        &["outcome"], // "created", "invalid_request", "configuration_error", "processor_error"
    )
    .expect("Failed to create checkout_sessions metric");

    register_metric(&counter);
    counter
});

static BID_STREAM_CLIENTS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new(
        "marketplace_bid_stream_clients",
        "Number of connected WebSocket bid-stream clients",
    )
    .expect("Failed to create bid_stream_clients metric");

    register_metric(&gauge);
    gauge
});

/// Helper function to register a metric with the default registry, so the
/// /metrics endpoint can expose everything through `prometheus::gather()`.
fn register_metric<M: prometheus::core::Collector + Clone + 'static>(metric: &M) {
    prometheus::default_registry()
        .register(Box::new(metric.clone()))
        .expect("Failed to register metric");
}

/// Record a store mutation by operation name.
pub fn record_store_mutation(op: &str) {
    STORE_MUTATIONS.with_label_values(&[op]).inc();
}

/// Record the outcome of a checkout session creation attempt.
pub fn record_checkout_outcome(outcome: &str) {
    CHECKOUT_SESSIONS.with_label_values(&[outcome]).inc();
}

pub fn bid_stream_client_connected() {
    BID_STREAM_CLIENTS.inc();
}

pub fn bid_stream_client_disconnected() {
    BID_STREAM_CLIENTS.dec();
}
