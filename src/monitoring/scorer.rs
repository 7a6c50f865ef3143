//! Composite 0-100 health score

use super::sample::PerformanceSample;
use crate::config::Thresholds;

const MAX_SCORE: f64 = 100.0;

// (weight per 100% overage, cap)
const PAGE_LOAD_PENALTY: (f64, f64) = (20.0, 25.0);
const DOM_READY_PENALTY: (f64, f64) = (10.0, 15.0);
const FCP_PENALTY: (f64, f64) = (15.0, 20.0);
const LAYOUT_SHIFT_PENALTY: (f64, f64) = (30.0, 30.0);
const MEMORY_PENALTY: (f64, f64) = (10.0, 15.0);
const SLOW_API_PENALTY: f64 = 5.0;
const SLOW_API_PENALTY_CAP: f64 = 20.0;

/// Scores a sample against thresholds
///
/// Starts at 100 and subtracts capped penalties proportional to how far each
/// reading exceeds its threshold. DOM-ready time is judged against the
/// page-load threshold. The result is rounded and clamped to `[0, 100]`, and
/// non-finite readings are ignored.
pub fn calculate_performance_score(sample: &PerformanceSample, thresholds: &Thresholds) -> f64 {
    let mut score = MAX_SCORE;

    score -= overage_penalty(sample.page_load_time, thresholds.page_load_time, PAGE_LOAD_PENALTY);
    score -= overage_penalty(
        sample.dom_content_loaded,
        thresholds.page_load_time,
        DOM_READY_PENALTY,
    );
    score -= overage_penalty(
        sample.first_contentful_paint,
        thresholds.first_contentful_paint,
        FCP_PENALTY,
    );
    score -= overage_penalty(
        sample.cumulative_layout_shift,
        thresholds.layout_shift,
        LAYOUT_SHIFT_PENALTY,
    );
    score -= overage_penalty(
        sample.memory_usage as f64,
        thresholds.memory_usage as f64,
        MEMORY_PENALTY,
    );

    let slow_apis = sample
        .api_response_times
        .values()
        .filter(|&&ms| ms.is_finite() && ms > thresholds.api_response_time)
        .count();
    score -= (slow_apis as f64 * SLOW_API_PENALTY).min(SLOW_API_PENALTY_CAP);

    if !score.is_finite() {
        return 0.0;
    }
    score.round().clamp(0.0, MAX_SCORE)
}

fn overage_penalty(value: f64, threshold: f64, (weight, cap): (f64, f64)) -> f64 {
    if !value.is_finite() || !threshold.is_finite() || value <= threshold {
        return 0.0;
    }
    // non-positive thresholds fall back to an absolute scale
    let scale = if threshold > 0.0 { threshold } else { 1.0 };
    ((value - threshold) / scale * weight).min(cap)
}

/// Label for a score band
pub fn score_grade(score: f64) -> &'static str {
    if score >= 90.0 {
        "good"
    } else if score >= 50.0 {
        "needs improvement"
    } else {
        "poor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> PerformanceSample {
        PerformanceSample::new(Utc::now())
    }

    #[test]
    fn test_good_metrics_score_high() {
        let metrics = sample()
            .with_navigation(1000.0, 800.0)
            .with_first_contentful_paint(900.0)
            .with_layout_shift(0.05)
            .with_memory_usage(50 * 1024 * 1024)
            .with_bundle_size(1_000_000);

        let score = calculate_performance_score(&metrics, &Thresholds::default());
        assert!(score > 80.0);
    }

    #[test]
    fn test_poor_metrics_are_penalized() {
        let metrics = sample()
            .with_navigation(3000.0, 2500.0)
            .with_first_contentful_paint(1500.0)
            .with_layout_shift(0.2)
            .with_api_response_time("/api/slow", 1000.0)
            .with_memory_usage(150 * 1024 * 1024)
            .with_bundle_size(5_000_000);

        let score = calculate_performance_score(&metrics, &Thresholds::default());
        assert!(score < 80.0);
        assert!(score >= 0.0);
    }

    #[test]
    fn test_all_zero_sample_is_well_defined() {
        let score = calculate_performance_score(&sample(), &Thresholds::default());
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_layout_shift_weighs_heavily() {
        let thresholds = Thresholds::default();
        let cls = calculate_performance_score(&sample().with_layout_shift(0.2), &thresholds);
        let fcp = calculate_performance_score(
            &sample().with_first_contentful_paint(2000.0),
            &thresholds,
        );
        assert!(cls < fcp);
    }

    #[test]
    fn test_score_is_clamped_for_extreme_inputs() {
        let mut metrics = sample()
            .with_navigation(f64::MAX, f64::MAX)
            .with_first_contentful_paint(1e12)
            .with_layout_shift(50.0)
            .with_memory_usage(u64::MAX);
        for i in 0..50 {
            metrics.api_response_times.insert(format!("/api/{i}"), 1e9);
        }
        let score = calculate_performance_score(&metrics, &Thresholds::default());
        assert!((0.0..=100.0).contains(&score));

        let nan = sample().with_navigation(f64::NAN, f64::INFINITY);
        let score = calculate_performance_score(&nan, &Thresholds::default());
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn test_zero_thresholds_do_not_produce_nan() {
        let thresholds = Thresholds {
            page_load_time: 0.0,
            first_contentful_paint: 0.0,
            api_response_time: 0.0,
            layout_shift: 0.0,
            long_task_duration: 0.0,
            memory_usage: 0,
            bundle_size: 0,
        };
        let metrics = sample().with_navigation(10.0, 5.0).with_memory_usage(1);
        let score = calculate_performance_score(&metrics, &thresholds);
        assert!(score.is_finite());
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn test_score_grade() {
        assert_eq!(score_grade(95.0), "good");
        assert_eq!(score_grade(70.0), "needs improvement");
        assert_eq!(score_grade(10.0), "poor");
    }
}
