use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_screen_time_us: AtomicU64,
    total_ingest_time_us: AtomicU64,

    // Counts
    documents_screened: AtomicUsize,
    documents_ingested: AtomicUsize,
    actors_scored: AtomicUsize,
    actor_score_failures: AtomicUsize,
    briefs_generated: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_screen(&self, duration: Duration) {
        self.total_screen_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.documents_screened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingest(&self, duration: Duration) {
        self.total_ingest_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scores(&self, succeeded: usize, failed: usize) {
        self.actors_scored.fetch_add(succeeded, Ordering::Relaxed);
        self.actor_score_failures.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn record_brief(&self) {
        self.briefs_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_screen_time_ms: avg_time_ms(&self.total_screen_time_us, &self.documents_screened),
            avg_ingest_time_ms: avg_time_ms(&self.total_ingest_time_us, &self.documents_ingested),
            documents_screened: self.documents_screened.load(Ordering::Relaxed),
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            actors_scored: self.actors_scored.load(Ordering::Relaxed),
            actor_score_failures: self.actor_score_failures.load(Ordering::Relaxed),
            briefs_generated: self.briefs_generated.load(Ordering::Relaxed),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_screen_time_ms: f64,
    pub avg_ingest_time_ms: f64,
    pub documents_screened: usize,
    pub documents_ingested: usize,
    pub actors_scored: usize,
    pub actor_score_failures: usize,
    pub briefs_generated: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
