//! Per-component lifecycle tracking and incremental render orchestration.
//!
//! One [`ComponentState`] per distinct component id, held in an arena-style
//! table keyed by id. Status only ever moves forward through
//! `Pending -> Rendering -> Updating* -> {Complete | Error}`; `Complete` is
//! absorbing, `Error` can still be finalized later.

use crate::component::{component_id, shallow_merge};
use crate::options::Options;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Pending,
    Rendering,
    Updating,
    Complete,
    Error,
}

impl ComponentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ComponentStatus::Complete | ComponentStatus::Error)
    }
}

/// Everything tracked for one component over a render session.
#[derive(Debug, Clone)]
pub struct ComponentState {
    pub id: String,
    pub status: ComponentStatus,
    /// Best-known value, shallow-merged as patches arrive.
    pub partial: Value,
    /// Set exactly once, at completion. Immutable afterwards.
    pub finalized: Option<Value>,
    /// Monotonic; starts at 1 on first sighting.
    pub update_count: u64,
    pub first_seen: Instant,
    pub last_updated: Instant,
    /// Ordered, append-only. Never cleared while the session lives.
    pub errors: Vec<String>,
    completed_at: Option<Instant>,
}

impl ComponentState {
    fn new(id: &str, partial: Value, now: Instant) -> Self {
        Self {
            id: id.to_string(),
            status: ComponentStatus::Rendering,
            partial,
            finalized: None,
            update_count: 1,
            first_seen: now,
            last_updated: now,
            errors: Vec::new(),
            completed_at: None,
        }
    }

    fn new_from(partial: &Value, now: Instant) -> Self {
        let id = component_id(partial).unwrap_or_default();
        Self::new(id, partial.clone(), now)
    }
}

/// Aggregate counters over the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RenderMetrics {
    pub total_components: usize,
    pub completed_components: usize,
    /// Components still in `Rendering` or `Updating`.
    pub rendering_components: usize,
    pub failed_components: usize,
    pub total_updates: u64,
    /// Mean first-seen-to-finalize time, over completed components only.
    pub avg_time_to_completion_ms: f64,
}

/// Optional callback slots toward the UI layer. Any subset may be unset; the
/// renderer never fails for lack of one.
#[derive(Default)]
pub struct RenderCallbacks {
    pub on_render_start: Option<Box<dyn FnMut(&str)>>,
    pub on_partial_render: Option<Box<dyn FnMut(&Value)>>,
    pub on_component_update: Option<Box<dyn FnMut(&str, &Value)>>,
    pub on_finalize: Option<Box<dyn FnMut(&str, &Value)>>,
    pub on_error: Option<Box<dyn FnMut(&str, &str)>>,
    pub on_render_complete: Option<Box<dyn FnMut(&str)>>,
}

/// Orchestrates partial-render, update, finalize and error events against the
/// component table, and detects when the whole surface has converged.
pub struct IncrementalRenderer {
    opts: Options,
    callbacks: RenderCallbacks,
    components: HashMap<String, ComponentState>,
    surface_id: Option<String>,
    complete_announced: bool,
}

impl IncrementalRenderer {
    pub fn new(opts: Options) -> Self {
        Self::with_callbacks(opts, RenderCallbacks::default())
    }

    pub fn with_callbacks(opts: Options, callbacks: RenderCallbacks) -> Self {
        Self {
            opts,
            callbacks,
            components: HashMap::new(),
            surface_id: None,
            complete_announced: false,
        }
    }

    pub fn callbacks_mut(&mut self) -> &mut RenderCallbacks {
        &mut self.callbacks
    }

    /// Open a render session for `surface_id`. Resets aggregate completion
    /// tracking; already-tracked components survive until `reset`.
    pub fn start_rendering(&mut self, surface_id: &str) {
        self.surface_id = Some(surface_id.to_string());
        self.complete_announced = false;
        if let Some(cb) = self.callbacks.on_render_start.as_mut() {
            cb(surface_id);
        }
    }

    /// First (or repeated) partial sighting of a component. A partial without
    /// an id is dropped without creating state.
    pub fn render_partial(&mut self, partial: &Value) {
        let Some(id) = component_id(partial) else {
            return;
        };
        let id = id.to_string();
        let now = Instant::now();
        match self.components.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(ComponentState::new_from(partial, now));
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if entry.status == ComponentStatus::Complete {
                    return;
                }
                shallow_merge(&mut entry.partial, partial);
                entry.update_count += 1;
                entry.last_updated = now;
                if entry.status == ComponentStatus::Rendering {
                    entry.status = ComponentStatus::Updating;
                }
            }
        }
        if let Some(cb) = self.callbacks.on_partial_render.as_mut() {
            cb(partial);
        }
    }

    /// Apply a patch. An unknown id creates state implicitly: patches may
    /// arrive before the initial partial due to pipelining. A `Complete`
    /// component is immutable and the call is a silent no-op.
    pub fn update_component(&mut self, id: &str, patch: &Value) {
        let now = Instant::now();
        match self.components.entry(id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(ComponentState::new(id, patch.clone(), now));
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if entry.status == ComponentStatus::Complete {
                    return;
                }
                shallow_merge(&mut entry.partial, patch);
                entry.update_count += 1;
                entry.last_updated = now;
                // Error stays sticky until an explicit finalize.
                if matches!(
                    entry.status,
                    ComponentStatus::Pending | ComponentStatus::Rendering
                ) {
                    entry.status = ComponentStatus::Updating;
                }
            }
        }
        if let Some(cb) = self.callbacks.on_component_update.as_mut() {
            cb(id, patch);
        }
    }

    /// Mark a component's value as complete and immutable. No-op for unknown
    /// ids (never finalize something never seen) and for already-`Complete`
    /// components (idempotent; the finalize callback fires once).
    pub fn finalize_component(&mut self, id: &str, value: &Value) {
        let Some(entry) = self.components.get_mut(id) else {
            return;
        };
        if entry.status == ComponentStatus::Complete {
            return;
        }
        let now = Instant::now();
        entry.status = ComponentStatus::Complete;
        entry.finalized = Some(value.clone());
        entry.last_updated = now;
        entry.completed_at = Some(now);
        if let Some(cb) = self.callbacks.on_finalize.as_mut() {
            cb(id, value);
        }
        self.announce_if_complete();
    }

    /// Record an error against a component. Unknown ids are ignored. The
    /// component stays in the session's completion accounting and can still
    /// be finalized later.
    pub fn handle_error(&mut self, id: &str, error: &str) {
        let Some(entry) = self.components.get_mut(id) else {
            return;
        };
        entry.errors.push(error.to_string());
        entry.last_updated = Instant::now();
        if entry.status != ComponentStatus::Complete {
            entry.status = ComponentStatus::Error;
        }
        if let Some(cb) = self.callbacks.on_error.as_mut() {
            cb(id, error);
        }
    }

    /// Upstream signalled end-of-stream: force every component still in
    /// flight to `Complete` with its current partial value. With
    /// `Options.auto_finalize` off this performs no transitions at all.
    pub fn complete_rendering(&mut self) {
        if !self.opts.auto_finalize {
            return;
        }
        let stalled: Vec<String> = self
            .components
            .values()
            .filter(|c| !c.status.is_terminal())
            .map(|c| c.id.clone())
            .collect();
        for id in stalled {
            self.force_finalize(&id);
        }
        self.announce_if_complete();
    }

    /// Apply the optional wall-clock auto-finalize policy: components with no
    /// update inside `Options.auto_finalize_timeout` are force-completed.
    /// Returns how many components were transitioned.
    pub fn sweep_stalled(&mut self) -> usize {
        let Some(window) = self.opts.auto_finalize_timeout else {
            return 0;
        };
        let now = Instant::now();
        let stalled: Vec<String> = self
            .components
            .values()
            .filter(|c| !c.status.is_terminal() && now.duration_since(c.last_updated) >= window)
            .map(|c| c.id.clone())
            .collect();
        let swept = stalled.len();
        for id in stalled {
            self.force_finalize(&id);
        }
        if swept > 0 {
            self.announce_if_complete();
        }
        swept
    }

    pub fn metrics(&self) -> RenderMetrics {
        let mut m = RenderMetrics {
            total_components: self.components.len(),
            ..RenderMetrics::default()
        };
        let mut completion_total_ms = 0.0f64;
        for c in self.components.values() {
            m.total_updates += c.update_count;
            match c.status {
                ComponentStatus::Complete => {
                    m.completed_components += 1;
                    if let Some(done) = c.completed_at {
                        completion_total_ms +=
                            done.duration_since(c.first_seen).as_secs_f64() * 1000.0;
                    }
                }
                ComponentStatus::Error => m.failed_components += 1,
                ComponentStatus::Rendering | ComponentStatus::Updating => {
                    m.rendering_components += 1;
                }
                ComponentStatus::Pending => {}
            }
        }
        if m.completed_components > 0 {
            m.avg_time_to_completion_ms = completion_total_ms / m.completed_components as f64;
        }
        m
    }

    pub fn component(&self, id: &str) -> Option<&ComponentState> {
        self.components.get(id)
    }

    pub fn component_ids(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn surface_id(&self) -> Option<&str> {
        self.surface_id.as_deref()
    }

    /// Drop the whole session: all component state and the surface binding.
    pub fn reset(&mut self) {
        self.components.clear();
        self.surface_id = None;
        self.complete_announced = false;
    }

    fn force_finalize(&mut self, id: &str) {
        let Some(entry) = self.components.get_mut(id) else {
            return;
        };
        if entry.status == ComponentStatus::Complete {
            return;
        }
        let now = Instant::now();
        let value = entry.partial.clone();
        entry.status = ComponentStatus::Complete;
        entry.finalized = Some(value.clone());
        entry.last_updated = now;
        entry.completed_at = Some(now);
        if let Some(cb) = self.callbacks.on_finalize.as_mut() {
            cb(id, &value);
        }
    }

    fn announce_if_complete(&mut self) {
        if self.complete_announced || self.components.is_empty() {
            return;
        }
        if !self.components.values().all(|c| c.status.is_terminal()) {
            return;
        }
        self.complete_announced = true;
        let surface = self.surface_id.clone().unwrap_or_default();
        if let Some(cb) = self.callbacks.on_render_complete.as_mut() {
            cb(&surface);
        }
    }
}
