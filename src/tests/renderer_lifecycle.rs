use crate::renderer::{ComponentStatus, IncrementalRenderer, RenderCallbacks};
use crate::Options;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

fn event_log() -> (Rc<RefCell<Vec<String>>>, RenderCallbacks) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut cb = RenderCallbacks::default();
    let l = log.clone();
    cb.on_render_start = Some(Box::new(move |s: &str| {
        l.borrow_mut().push(format!("start:{s}"));
    }));
    let l = log.clone();
    cb.on_partial_render = Some(Box::new(move |v: &Value| {
        let id = v.get("id").and_then(Value::as_str).unwrap_or("?");
        l.borrow_mut().push(format!("partial:{id}"));
    }));
    let l = log.clone();
    cb.on_component_update = Some(Box::new(move |id: &str, _: &Value| {
        l.borrow_mut().push(format!("update:{id}"));
    }));
    let l = log.clone();
    cb.on_finalize = Some(Box::new(move |id: &str, _: &Value| {
        l.borrow_mut().push(format!("finalize:{id}"));
    }));
    let l = log.clone();
    cb.on_error = Some(Box::new(move |id: &str, e: &str| {
        l.borrow_mut().push(format!("error:{id}:{e}"));
    }));
    let l = log.clone();
    cb.on_render_complete = Some(Box::new(move |s: &str| {
        l.borrow_mut().push(format!("complete:{s}"));
    }));
    (log, cb)
}

// Scenario: partial, one update, finalize.
#[test]
fn partial_update_finalize_lifecycle() {
    let (log, cb) = event_log();
    let mut r = IncrementalRenderer::with_callbacks(Options::default(), cb);
    r.start_rendering("surface-1");

    r.render_partial(&json!({"id": "t1", "type": "text"}));
    assert_eq!(r.component("t1").unwrap().status, ComponentStatus::Rendering);
    assert_eq!(r.component("t1").unwrap().update_count, 1);

    r.update_component("t1", &json!({"properties": {"text": "Hi"}}));
    let c = r.component("t1").unwrap();
    assert_eq!(c.status, ComponentStatus::Updating);
    assert_eq!(c.update_count, 2);
    assert_eq!(c.partial["properties"]["text"], json!("Hi"));

    let final_value = json!({"id": "t1", "type": "text", "properties": {"text": "Hi"}});
    r.finalize_component("t1", &final_value);
    let c = r.component("t1").unwrap();
    assert_eq!(c.status, ComponentStatus::Complete);
    assert_eq!(c.finalized, Some(final_value));
    assert_eq!(c.update_count, 2);

    assert_eq!(
        *log.borrow(),
        [
            "start:surface-1",
            "partial:t1",
            "update:t1",
            "finalize:t1",
            "complete:surface-1"
        ]
    );
}

#[test]
fn partial_without_id_creates_no_state() {
    let (log, cb) = event_log();
    let mut r = IncrementalRenderer::with_callbacks(Options::default(), cb);
    r.start_rendering("s");
    r.render_partial(&json!({"type": "text"}));
    assert_eq!(r.component_ids().count(), 0);
    assert_eq!(*log.borrow(), ["start:s"]);
}

// Scenario: finalize on a never-seen id.
#[test]
fn finalize_unknown_id_is_a_no_op() {
    let (log, cb) = event_log();
    let mut r = IncrementalRenderer::with_callbacks(Options::default(), cb);
    r.start_rendering("s");
    r.finalize_component("unknown-id", &json!({"id": "unknown-id"}));
    assert_eq!(r.component_ids().count(), 0);
    assert_eq!(*log.borrow(), ["start:s"]);
}

#[test]
fn finalize_is_idempotent_and_complete_is_immutable() {
    let (log, cb) = event_log();
    let mut r = IncrementalRenderer::with_callbacks(Options::default(), cb);
    r.start_rendering("s");
    r.render_partial(&json!({"id": "a", "type": "text"}));
    r.finalize_component("a", &json!({"id": "a", "type": "text", "v": 1}));
    r.finalize_component("a", &json!({"id": "a", "type": "text", "v": 2}));
    r.update_component("a", &json!({"v": 3}));

    let c = r.component("a").unwrap();
    assert_eq!(c.finalized.as_ref().unwrap()["v"], json!(1));
    assert_eq!(c.update_count, 1);
    // Exactly one finalize and one completion event.
    let log = log.borrow();
    assert_eq!(log.iter().filter(|e| e.starts_with("finalize:")).count(), 1);
    assert_eq!(log.iter().filter(|e| e.starts_with("complete:")).count(), 1);
}

#[test]
fn update_before_partial_creates_state_implicitly() {
    let mut r = IncrementalRenderer::new(Options::default());
    r.start_rendering("s");
    r.update_component("late", &json!({"properties": {"x": 1}}));
    let c = r.component("late").unwrap();
    assert_eq!(c.status, ComponentStatus::Rendering);
    assert_eq!(c.update_count, 1);
}

#[test]
fn update_count_matches_non_rejected_mutations() {
    let mut r = IncrementalRenderer::new(Options::default());
    r.start_rendering("s");
    r.render_partial(&json!({"id": "n", "type": "num"}));
    for i in 0..5 {
        r.update_component("n", &json!({"properties": {"i": i}}));
    }
    assert_eq!(r.component("n").unwrap().update_count, 6);
    assert_eq!(r.component("n").unwrap().partial["properties"]["i"], json!(4));
}

#[test]
fn error_is_recorded_and_does_not_block_finalize() {
    let (log, cb) = event_log();
    let mut r = IncrementalRenderer::with_callbacks(Options::default(), cb);
    r.start_rendering("s");
    r.render_partial(&json!({"id": "e1", "type": "img"}));
    r.handle_error("e1", "bad src");
    r.handle_error("e1", "still bad");
    assert_eq!(r.component("e1").unwrap().status, ComponentStatus::Error);
    assert_eq!(r.component("e1").unwrap().errors, ["bad src", "still bad"]);

    // The component self-heals through an explicit finalize.
    r.finalize_component("e1", &json!({"id": "e1", "type": "img", "src": "x"}));
    let c = r.component("e1").unwrap();
    assert_eq!(c.status, ComponentStatus::Complete);
    assert_eq!(c.errors.len(), 2);
    assert!(log.borrow().iter().any(|e| e == "error:e1:bad src"));
}

#[test]
fn error_on_unknown_id_is_ignored() {
    let (log, cb) = event_log();
    let mut r = IncrementalRenderer::with_callbacks(Options::default(), cb);
    r.start_rendering("s");
    r.handle_error("ghost", "boom");
    assert_eq!(r.component_ids().count(), 0);
    assert_eq!(*log.borrow(), ["start:s"]);
}

// Scenario: one component finalized, one left rendering.
#[test]
fn completion_waits_for_every_component() {
    let (log, cb) = event_log();
    let mut r = IncrementalRenderer::with_callbacks(Options::default(), cb);
    r.start_rendering("s");
    r.render_partial(&json!({"id": "a", "type": "text"}));
    r.render_partial(&json!({"id": "b", "type": "text"}));
    r.finalize_component("a", &json!({"id": "a", "type": "text"}));
    assert!(!log.borrow().iter().any(|e| e.starts_with("complete:")));

    r.complete_rendering();
    assert_eq!(r.component("b").unwrap().status, ComponentStatus::Complete);
    assert_eq!(
        log.borrow().iter().filter(|e| e.starts_with("complete:")).count(),
        1
    );
}

#[test]
fn complete_rendering_respects_auto_finalize_flag() {
    let mut opts = Options::default();
    opts.auto_finalize = false;
    let (log, cb) = event_log();
    let mut r = IncrementalRenderer::with_callbacks(opts, cb);
    r.start_rendering("s");
    r.render_partial(&json!({"id": "a", "type": "text"}));
    r.complete_rendering();
    assert_eq!(r.component("a").unwrap().status, ComponentStatus::Rendering);
    assert!(!log.borrow().iter().any(|e| e.starts_with("complete:")));
}

#[test]
fn callbacks_are_entirely_optional() {
    let mut r = IncrementalRenderer::new(Options::default());
    r.start_rendering("s");
    r.render_partial(&json!({"id": "a", "type": "text"}));
    r.update_component("a", &json!({"x": 1}));
    r.handle_error("a", "oops");
    r.finalize_component("a", &json!({"id": "a"}));
    r.complete_rendering();
    assert_eq!(r.component("a").unwrap().status, ComponentStatus::Complete);
}

#[test]
fn reset_clears_the_session() {
    let mut r = IncrementalRenderer::new(Options::default());
    r.start_rendering("s");
    r.render_partial(&json!({"id": "a", "type": "text"}));
    r.reset();
    assert_eq!(r.component_ids().count(), 0);
    assert_eq!(r.surface_id(), None);
}
