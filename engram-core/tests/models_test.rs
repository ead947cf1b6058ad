use chrono::Utc;
use engram_core::models::*;
use engram_core::pattern::*;

fn make_pattern(id: &str, title: &str) -> Pattern {
    let payload = PatternPayload::Workflow(WorkflowContent {
        steps: vec!["edit".into(), "test".into()],
        trigger: None,
        outcome: None,
    });
    let content_hash = Pattern::compute_content_hash(&payload).unwrap();
    Pattern {
        id: id.to_string(),
        kind: "workflow".to_string(),
        title: title.to_string(),
        description: payload.describe(),
        payload,
        confidence: Confidence::new(0.8),
        namespaces: vec![Namespace::Project("proj".into())],
        access_count: 0,
        last_accessed: Utc::now(),
        created_at: Utc::now(),
        content_hash,
    }
}

#[test]
fn confidence_clamps_on_new() {
    assert_eq!(Confidence::new(1.5).value(), 1.0);
    assert_eq!(Confidence::new(-0.2).value(), 0.0);
    assert_eq!(Confidence::new(0.42).value(), 0.42);
}

#[test]
fn confidence_try_new_rejects_out_of_range() {
    assert!(Confidence::try_new(1.01).is_err());
    assert!(Confidence::try_new(-0.01).is_err());
    assert!(Confidence::try_new(f64::NAN).is_err());
    assert!(Confidence::try_new(0.0).is_ok());
    assert!(Confidence::try_new(1.0).is_ok());
}

#[test]
fn confidence_arithmetic_stays_clamped() {
    let a = Confidence::new(0.9);
    let b = Confidence::new(0.3);
    assert_eq!((a + b).value(), 1.0);
    assert_eq!((b - a).value(), 0.0);
    assert_eq!((a * 0.5).value(), 0.45);
}

#[test]
fn pattern_equality_is_by_id() {
    let a = make_pattern("id-1", "deploy flow");
    let mut b = make_pattern("id-1", "different title");
    b.access_count = 99;
    assert_eq!(a, b);
    assert!(!a.content_eq(&b));
}

#[test]
fn content_hash_is_stable_across_identical_payloads() {
    let a = make_pattern("id-1", "t");
    let b = make_pattern("id-2", "t");
    assert_eq!(a.content_hash, b.content_hash);
}

#[test]
fn is_core_checks_namespace_membership() {
    let mut p = make_pattern("id-1", "t");
    assert!(!p.is_core());
    p.namespaces.push(Namespace::Core);
    assert!(p.is_core());
}

#[test]
fn message_role_round_trips_through_strings() {
    for role in [MessageRole::User, MessageRole::Assistant, MessageRole::System] {
        assert_eq!(MessageRole::parse(role.as_str()).unwrap(), role);
    }
    assert!(MessageRole::parse("narrator").is_err());
}

#[test]
fn insight_severity_orders_by_gravity() {
    assert!(InsightSeverity::Info < InsightSeverity::Warning);
    assert!(InsightSeverity::Warning < InsightSeverity::Error);
    assert!(InsightSeverity::Error < InsightSeverity::Critical);
}

#[test]
fn degraded_report_is_empty_with_a_warning() {
    let report = ContextReport::degraded(30, "not a git repository");
    assert!(report.degraded);
    assert!(report.file_stability.is_empty());
    assert!(report.velocity.is_none());
    assert_eq!(report.insights.len(), 1);
    assert_eq!(report.insights[0].severity, InsightSeverity::Warning);
}

#[test]
fn unstable_paths_filters_by_band() {
    let now = Utc::now();
    let mk = |path: &str, band: StabilityBand| FileStability {
        path: path.into(),
        window_start: now,
        window_end: now,
        commit_count: 4,
        edit_count: 4,
        churn_rate: 0.25,
        band,
    };
    let report = ContextReport {
        collected_at: now,
        window_days: 30,
        file_stability: vec![
            mk("src/a.rs", StabilityBand::Stable),
            mk("src/b.rs", StabilityBand::Unstable),
        ],
        velocity: None,
        insights: vec![],
        degraded: false,
    };
    assert_eq!(report.unstable_paths(), vec!["src/b.rs"]);
}

#[test]
fn transfer_decision_round_trips_through_strings() {
    for d in [
        TransferDecision::New,
        TransferDecision::Merged,
        TransferDecision::Replaced,
        TransferDecision::Skipped,
    ] {
        assert_eq!(TransferDecision::parse(d.as_str()).unwrap(), d);
    }
}
