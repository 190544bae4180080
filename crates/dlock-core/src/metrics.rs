// Metrics for the lock node
// Counters for handler outcomes and gauges published after each maintenance cycle

use metrics::{counter, describe_counter, describe_gauge, gauge};

use crate::lock::{LockStats, MaintenanceReport};

/// Register metric descriptions; call once at startup
pub fn describe_metrics() {
    describe_counter!(
        "dlock_requests_total",
        "Lock requests handled, labelled by operation and outcome"
    );
    describe_gauge!("dlock_resources", "Resource names currently held");
    describe_gauge!("dlock_write_locks", "Resource names held by a writer");
    describe_gauge!("dlock_read_locks", "Reader holders across all resources");
    describe_counter!(
        "dlock_maintenance_probes_total",
        "Liveness probes issued by lock maintenance, labelled by outcome"
    );
    describe_counter!(
        "dlock_maintenance_reaped_total",
        "Stale holders removed by lock maintenance"
    );

    tracing::info!("Metrics initialized");
}

/// Record a handled lock request
pub fn record_request(operation: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "denied" };
    counter!("dlock_requests_total", "operation" => operation, "outcome" => outcome).increment(1);
}

/// Publish table gauges
pub fn set_lock_stats(stats: &LockStats) {
    gauge!("dlock_resources").set(stats.resources as f64);
    gauge!("dlock_write_locks").set(stats.write_locks as f64);
    gauge!("dlock_read_locks").set(stats.read_locks as f64);
}

/// Record the outcome of one maintenance cycle
pub fn record_maintenance(report: &MaintenanceReport) {
    counter!("dlock_maintenance_probes_total", "outcome" => "live").increment(report.live as u64);
    counter!("dlock_maintenance_probes_total", "outcome" => "expired").increment(report.expired as u64);
    counter!("dlock_maintenance_probes_total", "outcome" => "inconclusive")
        .increment(report.inconclusive as u64);
    counter!("dlock_maintenance_reaped_total").increment(report.reaped as u64);
}
