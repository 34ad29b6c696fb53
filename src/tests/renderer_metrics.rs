use crate::renderer::{ComponentStatus, IncrementalRenderer};
use crate::Options;
use serde_json::json;
use std::time::Duration;

#[test]
fn metrics_count_each_lifecycle_bucket() {
    let mut r = IncrementalRenderer::new(Options::default());
    r.start_rendering("s");
    r.render_partial(&json!({"id": "done", "type": "text"}));
    r.render_partial(&json!({"id": "busy", "type": "text"}));
    r.render_partial(&json!({"id": "broken", "type": "text"}));
    r.update_component("busy", &json!({"x": 1}));
    r.finalize_component("done", &json!({"id": "done", "type": "text"}));
    r.handle_error("broken", "nope");

    let m = r.metrics();
    assert_eq!(m.total_components, 3);
    assert_eq!(m.completed_components, 1);
    assert_eq!(m.rendering_components, 1);
    assert_eq!(m.failed_components, 1);
    assert_eq!(m.total_updates, 4);
    assert!(m.avg_time_to_completion_ms >= 0.0);
    assert!(m.avg_time_to_completion_ms.is_finite());
}

#[test]
fn metrics_on_empty_session_are_zero() {
    let r = IncrementalRenderer::new(Options::default());
    let m = r.metrics();
    assert_eq!(m, Default::default());
}

#[test]
fn avg_completion_only_counts_completed_components() {
    let mut r = IncrementalRenderer::new(Options::default());
    r.start_rendering("s");
    r.render_partial(&json!({"id": "a", "type": "text"}));
    r.render_partial(&json!({"id": "b", "type": "text"}));
    let m = r.metrics();
    assert_eq!(m.completed_components, 0);
    assert_eq!(m.avg_time_to_completion_ms, 0.0);
}

#[test]
fn sweep_stalled_is_inert_without_a_timeout() {
    let mut r = IncrementalRenderer::new(Options::default());
    r.start_rendering("s");
    r.render_partial(&json!({"id": "a", "type": "text"}));
    assert_eq!(r.sweep_stalled(), 0);
    assert_eq!(r.component("a").unwrap().status, ComponentStatus::Rendering);
}

#[test]
fn sweep_stalled_force_completes_idle_components() {
    let mut opts = Options::default();
    opts.auto_finalize_timeout = Some(Duration::from_millis(0));
    let mut r = IncrementalRenderer::new(opts);
    r.start_rendering("s");
    r.render_partial(&json!({"id": "a", "type": "text"}));
    r.render_partial(&json!({"id": "b", "type": "text"}));
    r.finalize_component("a", &json!({"id": "a", "type": "text"}));
    assert_eq!(r.sweep_stalled(), 1);
    assert_eq!(r.component("b").unwrap().status, ComponentStatus::Complete);
    // The forced value is the partial accumulated so far.
    assert_eq!(
        r.component("b").unwrap().finalized,
        Some(json!({"id": "b", "type": "text"}))
    );
}

#[test]
fn metrics_serialize_for_the_ui_layer() {
    let r = IncrementalRenderer::new(Options::default());
    let s = serde_json::to_string(&r.metrics()).unwrap();
    assert!(s.contains("\"total_components\":0"));
    assert!(s.contains("\"avg_time_to_completion_ms\":0.0"));
}
