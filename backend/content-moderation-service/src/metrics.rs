/// Prometheus metrics for the moderation pipeline
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

static SUBMISSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "moderation_submissions_total",
        "Total number of content submissions received",
        &["content_type"]
    )
    .expect("Failed to register submissions metric")
});

static DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "moderation_decisions_total",
        "Total number of moderation decisions by outcome and origin",
        &["outcome", "origin"]
    )
    .expect("Failed to register decisions metric")
});

static PROCESSING_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "moderation_processing_errors_total",
        "Total number of submissions that failed automated processing"
    )
    .expect("Failed to register processing errors metric")
});

static DETECTOR_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "moderation_detector_duration_seconds",
        "Time spent in each detector",
        &["detector", "result"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("Failed to register detector duration metric")
});

static QUEUE_DEPTH: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "moderation_review_queue_depth",
        "Submissions waiting for automated processing"
    )
    .expect("Failed to register queue depth metric")
});

pub struct ModerationMetrics;

impl ModerationMetrics {
    pub fn record_submission(content_type: &str) {
        SUBMISSIONS_TOTAL.with_label_values(&[content_type]).inc();
    }

    /// `origin` is `automated` or `human`
    pub fn record_decision(outcome: &str, origin: &str) {
        DECISIONS_TOTAL.with_label_values(&[outcome, origin]).inc();
    }

    pub fn record_processing_error() {
        PROCESSING_ERRORS_TOTAL.inc();
    }

    pub fn record_detector(detector: &str, success: bool, duration_secs: f64) {
        let result = if success { "ok" } else { "error" };
        DETECTOR_DURATION
            .with_label_values(&[detector, result])
            .observe(duration_secs);
    }

    pub fn set_queue_depth(depth: usize) {
        QUEUE_DEPTH.set(depth as i64);
    }
}

/// Render every registered metric in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_metrics() {
        ModerationMetrics::record_submission("image");
        ModerationMetrics::record_decision("approved", "automated");
        ModerationMetrics::record_detector("fingerprint", true, 0.002);
        ModerationMetrics::set_queue_depth(3);

        let output = render().unwrap();
        assert!(output.contains("moderation_submissions_total"));
        assert!(output.contains("moderation_decisions_total"));
        assert!(output.contains("moderation_detector_duration_seconds"));
        assert!(output.contains("moderation_review_queue_depth"));
    }
}
