//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - RPC calls and errors per method
//! - Submitted transactions per signing path
//! - Failed sends per phase

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};

lazy_static! {
    // RPC metrics
    pub static ref RPC_CALLS: CounterVec = register_counter_vec!(
        "cfx_sender_rpc_calls_total",
        "Total RPC calls issued by method",
        &["method"]
    ).unwrap();

    pub static ref RPC_ERRORS: CounterVec = register_counter_vec!(
        "cfx_sender_rpc_errors_total",
        "Total RPC calls that failed by method",
        &["method"]
    ).unwrap();

    // Transaction metrics
    pub static ref TX_SUBMITTED: CounterVec = register_counter_vec!(
        "cfx_sender_transactions_submitted_total",
        "Total transactions submitted by signing path",
        &["path"]
    ).unwrap();

    pub static ref SEND_FAILURES: CounterVec = register_counter_vec!(
        "cfx_sender_send_failures_total",
        "Total failed sends by phase",
        &["phase"]
    ).unwrap();
}

/// Render every registered metric in the text exposition format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

// Helper functions to record metrics

pub fn record_rpc_call(method: &str) {
    RPC_CALLS.with_label_values(&[method]).inc();
}

pub fn record_rpc_error(method: &str) {
    RPC_ERRORS.with_label_values(&[method]).inc();
}

pub fn record_tx_submitted(path: &str) {
    TX_SUBMITTED.with_label_values(&[path]).inc();
}

pub fn record_send_failure(phase: &str) {
    SEND_FAILURES.with_label_values(&[phase]).inc();
}
