//! Prometheus metrics for story analysis and question answering
//!
//! This module tracks:
//! - Analysis: stories analysed, relationship fetch failures
//! - Answering: questions by validation outcome, answer-cache hits,
//!   fallback answers by reason, generation latency
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all pipeline metrics
struct PipelineMetrics {
    stories_analyzed: Counter,
    fetch_failures: CounterVec,
    questions: CounterVec,
    answer_cache_hits: Counter,
    fallback_answers: CounterVec,
    generation_duration: HistogramVec,
}

/// Global storage for pipeline metrics
static PIPELINE_METRICS: OnceLock<PipelineMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, subsequent metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = storyground::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    // Prevent double initialization
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let pipeline = PipelineMetrics {
        stories_analyzed: register_counter!(
            "storyground_stories_analyzed_total",
            "Total number of stories analysed"
        )?,
        fetch_failures: register_counter_vec!(
            "storyground_relation_fetch_failures_total",
            "Relationship lookups that failed and were treated as empty",
            &["kind"]
        )?,
        questions: register_counter_vec!(
            "storyground_questions_total",
            "Questions answered by validation outcome",
            &["outcome"]
        )?,
        answer_cache_hits: register_counter!(
            "storyground_answer_cache_hits_total",
            "Questions served from the answer cache"
        )?,
        fallback_answers: register_counter_vec!(
            "storyground_fallback_answers_total",
            "Templated answers used instead of generated text",
            &["reason"]
        )?,
        generation_duration: register_histogram_vec!(
            "storyground_generation_duration_seconds",
            "Time spent waiting for the generator in seconds",
            &["intent"],
            vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]
        )?,
    };

    PIPELINE_METRICS
        .set(pipeline)
        .map_err(|_| "Pipeline metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    PIPELINE_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a completed story analysis
pub fn record_story_analyzed() {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.stories_analyzed.inc();
    }
}

/// Record a relationship lookup that failed
pub fn record_fetch_failure(kind: &str) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.fetch_failures.with_label_values(&[kind]).inc();
    }
}

/// Record a question answered with the given outcome
pub fn record_question(outcome: &str) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.questions.with_label_values(&[outcome]).inc();
    }
}

/// Record an answer-cache hit
pub fn record_cache_hit() {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.answer_cache_hits.inc();
    }
}

/// Record a fallback answer
pub fn record_fallback(reason: &str) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.fallback_answers.with_label_values(&[reason]).inc();
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a generation timer for the given intent
pub fn start_generation_timer(intent: &str) -> MetricsTimer {
    match PIPELINE_METRICS.get() {
        Some(m) => MetricsTimer::new(
            m.generation_duration
                .with_label_values(&[intent])
                .start_timer(),
        ),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
