//! Prometheus metrics for the gateway
//!
//! One registry owned by the server, shared with the services that record
//! into it.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Gateway metrics registry
pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub upstream_failures_total: IntCounter,
    pub flows_started_total: IntCounter,
    pub flows_succeeded_total: IntCounter,
    pub flows_failed_total: IntCounter,
    pub messages_sent_total: IntCounter,
    pub messages_queued_total: IntCounter,
    pub messages_dropped_total: IntCounter,
}

impl Metrics {
    /// Create a new metrics registry with all gateway counters registered
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounter::new(
            "gateway_http_requests_total",
            "Total number of HTTP requests",
        )
        .unwrap();
        let upstream_failures_total = IntCounter::new(
            "gateway_upstream_failures_total",
            "Total number of failed upstream calls",
        )
        .unwrap();
        let flows_started_total = IntCounter::new(
            "gateway_flows_started_total",
            "Total number of payment flows started",
        )
        .unwrap();
        let flows_succeeded_total = IntCounter::new(
            "gateway_flows_succeeded_total",
            "Total number of payment flows that reached success",
        )
        .unwrap();
        let flows_failed_total = IntCounter::new(
            "gateway_flows_failed_total",
            "Total number of payment flows that expired or failed",
        )
        .unwrap();
        let messages_sent_total = IntCounter::new(
            "gateway_messages_sent_total",
            "Total number of Telegram messages delivered",
        )
        .unwrap();
        let messages_queued_total = IntCounter::new(
            "gateway_messages_queued_total",
            "Total number of Telegram messages queued for retry",
        )
        .unwrap();
        let messages_dropped_total = IntCounter::new(
            "gateway_messages_dropped_total",
            "Total number of Telegram messages dropped after retry exhaustion",
        )
        .unwrap();

        registry
            .register(Box::new(http_requests_total.clone()))
            .unwrap();
        registry
            .register(Box::new(upstream_failures_total.clone()))
            .unwrap();
        registry
            .register(Box::new(flows_started_total.clone()))
            .unwrap();
        registry
            .register(Box::new(flows_succeeded_total.clone()))
            .unwrap();
        registry
            .register(Box::new(flows_failed_total.clone()))
            .unwrap();
        registry
            .register(Box::new(messages_sent_total.clone()))
            .unwrap();
        registry
            .register(Box::new(messages_queued_total.clone()))
            .unwrap();
        registry
            .register(Box::new(messages_dropped_total.clone()))
            .unwrap();

        Self {
            registry,
            http_requests_total,
            upstream_failures_total,
            flows_started_total,
            flows_succeeded_total,
            flows_failed_total,
            messages_sent_total,
            messages_queued_total,
            messages_dropped_total,
        }
    }

    /// Render the registry in Prometheus text exposition format
    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder
            .encode(&self.registry.gather(), &mut buffer)
            .is_err()
        {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
