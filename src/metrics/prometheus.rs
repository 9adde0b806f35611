use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

/// Start the Prometheus HTTP exporter on `addr`.
/// After this call, any metrics recorded via the `metrics` crate
/// macros (counter!, gauge!, histogram!) are exported at /metrics.
pub fn init_metrics_server(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

// ── Source metrics ───────────────────────────────────────────────

pub fn record_source_failure(source: &str, endpoint: &str) {
    counter!("source_failures_total", "source" => source.to_string(), "endpoint" => endpoint.to_string())
        .increment(1);
}

pub fn record_fetch_latency(source: &str, endpoint: &str, latency_ms: f64) {
    histogram!("source_fetch_latency_ms", "source" => source.to_string(), "endpoint" => endpoint.to_string())
        .record(latency_ms);
}

pub fn record_coins_upserted(count: usize) {
    counter!("coins_upserted_total").increment(count as u64);
}

// ── Scheduler metrics ────────────────────────────────────────────

pub fn record_refresh_tick() {
    counter!("refresh_ticks_total").increment(1);
}

pub fn record_emission(day: u32, period: u32, total_release: f64) {
    gauge!("dt_emission_day").set(f64::from(day));
    gauge!("dt_emission_period").set(f64::from(period));
    gauge!("dt_total_release").set(total_release);
}

pub fn record_snapshot_write() {
    counter!("snapshot_writes_total").increment(1);
}

pub fn record_snapshot_failure() {
    counter!("snapshot_failures_total").increment(1);
}
