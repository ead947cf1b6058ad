use chrono::{DateTime, Utc};

/// Parameters of the time-based decay curve.
#[derive(Debug, Clone, Copy)]
pub struct DecayPolicy {
    /// Days without access before decay starts applying.
    pub after_days: i64,
    /// Fraction of confidence removed per elapsed day past the threshold.
    pub rate_per_day: f64,
}

impl DecayPolicy {
    pub fn new(after_days: i64, rate_per_day: f64) -> Self {
        Self {
            after_days,
            rate_per_day: rate_per_day.clamp(0.0, 1.0),
        }
    }
}

/// Whole days since last access, floored at zero.
pub fn days_since_access(last_accessed: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_accessed).num_seconds().max(0) / 86_400
}

/// Compounding decay past the idle threshold.
///
/// ```text
/// finalConfidence = baseConfidence × (1 − ratePerDay)^daysPastThreshold
/// ```
///
/// Inside the threshold the confidence is returned untouched. The curve
/// is monotone in elapsed time and approaches zero without ever crossing
/// it; the final value is clamped to [0.0, 1.0].
pub fn compute(
    base_confidence: f64,
    last_accessed: DateTime<Utc>,
    now: DateTime<Utc>,
    policy: &DecayPolicy,
) -> f64 {
    let idle = days_since_access(last_accessed, now);
    let past = idle - policy.after_days;
    if past <= 0 {
        return base_confidence.clamp(0.0, 1.0);
    }
    let retention = (1.0 - policy.rate_per_day).powi(past.min(i32::MAX as i64) as i32);
    (base_confidence * retention).clamp(0.0, 1.0)
}

/// Compute each component individually for debugging/observability.
#[derive(Debug, Clone)]
pub struct DecayBreakdown {
    pub base_confidence: f64,
    pub days_since_access: i64,
    pub days_past_threshold: i64,
    /// `(1 − ratePerDay)^daysPastThreshold`; 1.0 inside the threshold.
    pub retention: f64,
    pub final_confidence: f64,
}

/// Compute decay with a full breakdown of each component.
pub fn compute_breakdown(
    base_confidence: f64,
    last_accessed: DateTime<Utc>,
    now: DateTime<Utc>,
    policy: &DecayPolicy,
) -> DecayBreakdown {
    let idle = days_since_access(last_accessed, now);
    let past = (idle - policy.after_days).max(0);
    let retention = if past == 0 {
        1.0
    } else {
        (1.0 - policy.rate_per_day).powi(past.min(i32::MAX as i64) as i32)
    };
    DecayBreakdown {
        base_confidence,
        days_since_access: idle,
        days_past_threshold: past,
        retention,
        final_confidence: (base_confidence * retention).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn no_decay_inside_threshold() {
        let now = Utc::now();
        let policy = DecayPolicy::new(30, 0.02);
        let result = compute(0.9, now - Duration::days(29), now, &policy);
        assert_eq!(result, 0.9);
    }

    #[test]
    fn one_day_past_threshold_removes_one_rate() {
        let now = Utc::now();
        let policy = DecayPolicy::new(30, 0.02);
        let result = compute(0.9, now - Duration::days(31), now, &policy);
        assert!((result - 0.9 * 0.98).abs() < 1e-12);
    }

    #[test]
    fn decay_compounds_per_day() {
        let now = Utc::now();
        let policy = DecayPolicy::new(30, 0.02);
        let result = compute(0.9, now - Duration::days(40), now, &policy);
        assert!((result - 0.9 * 0.98f64.powi(10)).abs() < 1e-12);
        assert!(result < 0.9);
        assert!(result >= 0.0);
    }

    #[test]
    fn breakdown_matches_compute() {
        let now = Utc::now();
        let policy = DecayPolicy::new(30, 0.05);
        let last = now - Duration::days(45);
        let b = compute_breakdown(0.8, last, now, &policy);
        assert_eq!(b.days_since_access, 45);
        assert_eq!(b.days_past_threshold, 15);
        assert_eq!(b.final_confidence, compute(0.8, last, now, &policy));
    }
}
