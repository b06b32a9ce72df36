use tracing::trace;

// Trace-level counters; the Prometheus recorder in `main` exposes whatever a
// subscriber derives from them.

pub fn inc_requests(route: &'static str) {
    trace!(
        target = "pantry.metrics",
        route = route,
        "requests_total_inc"
    );
}

pub fn stage_elapsed(stage: &'static str, elapsed_ms: u128) {
    trace!(
        target = "pantry.metrics",
        stage = stage,
        elapsed_ms = elapsed_ms as u64,
        "stage_elapsed"
    );
}

pub fn outcome(kind: &'static str) {
    trace!(
        target = "pantry.metrics",
        outcome = kind,
        "classification_outcome_inc"
    );
}
