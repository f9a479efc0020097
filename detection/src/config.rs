//! Detection gating tunables.

/// Default overall confidence needed to accept a detection without review.
pub const DEFAULT_ACCEPT_THRESHOLD: f32 = 0.9;

/// Squares classified below this confidence are flagged for review.
pub const LOW_CONFIDENCE_CUTOFF: f32 = 0.9;

/// Get the acceptance threshold.
///
/// Priority:
/// 1. `CHESSLENS_DETECTION_THRESHOLD` env variable if set and within `0..=1`
/// 2. `0.9` as fallback
pub fn get_accept_threshold() -> f32 {
    std::env::var("CHESSLENS_DETECTION_THRESHOLD")
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|t| (0.0..=1.0).contains(t))
        .unwrap_or(DEFAULT_ACCEPT_THRESHOLD)
}
