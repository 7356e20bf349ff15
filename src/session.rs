use crate::canvas::model::{Color, Point, Tool, ToolState};
use crate::canvas::render::{DirtyRect, StrokeRenderer};
use crate::canvas::surface::CanvasSurface;
use crate::error::SolveError;
use crate::messages::Notification;
use crate::overlay::{OverlayManager, OverlayPosition, Typesetter};
use crate::settings::AppSettings;
use crate::solve::client::SolverClient;
use crate::solve::orchestrator::SolveOrchestrator;
use crate::solve::schedule::RevealScheduler;
use crate::solve::variables::VariableStore;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    Idle,
    ResetRequested,
}

pub fn can_transition(from: ResetState, to: ResetState) -> bool {
    matches!(
        (from, to),
        (ResetState::Idle, ResetState::ResetRequested)
            | (ResetState::ResetRequested, ResetState::Idle)
    )
}

/// Top-level state container for one drawing session.
///
/// Owns every stateful piece of the pipeline and is driven by the UI event
/// loop: pointer and tool events as they arrive, `submit` on demand and
/// `tick` once per frame.
pub struct Session {
    renderer: StrokeRenderer,
    tools: ToolState,
    variables: VariableStore,
    overlays: OverlayManager,
    reveals: RevealScheduler,
    orchestrator: SolveOrchestrator,
    reset_state: ResetState,
}

impl Session {
    pub fn new(
        settings: &AppSettings,
        client: Arc<dyn SolverClient>,
        typesetter: Box<dyn Typesetter>,
        size: (u32, u32),
    ) -> Self {
        Self {
            renderer: StrokeRenderer::new(size.0, size.1),
            tools: ToolState::new(settings.default_color, settings.brush_width),
            variables: VariableStore::default(),
            overlays: OverlayManager::new(typesetter),
            reveals: RevealScheduler::default(),
            orchestrator: SolveOrchestrator::new(
                client,
                settings.reveal_delay(),
                settings.default_anchor(),
            ),
            reset_state: ResetState::Idle,
        }
    }

    pub fn surface(&self) -> &CanvasSurface {
        self.renderer.surface()
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn reset_state(&self) -> ResetState {
        self.reset_state
    }

    pub fn is_busy(&self) -> bool {
        self.orchestrator.is_busy()
    }

    pub fn is_drawing(&self) -> bool {
        self.renderer.is_drawing()
    }

    pub fn pending_reveals(&self) -> usize {
        self.reveals.pending_len()
    }

    /// Earliest moment `tick` has new work; lets the UI schedule a repaint.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.reveals.next_deadline()
    }

    pub fn pointer_down(&mut self, point: Point) {
        self.renderer.begin_stroke(point);
    }

    pub fn pointer_move(&mut self, point: Point) -> Option<DirtyRect> {
        self.renderer.extend_stroke(point, &self.tools)
    }

    pub fn pointer_up(&mut self) {
        self.renderer.end_stroke();
    }

    pub fn pointer_leave(&mut self) {
        self.renderer.end_stroke();
    }

    pub fn select_color(&mut self, color: Color) {
        self.tools.select_color(color);
    }

    pub fn select_tool(&mut self, tool: Tool) {
        self.tools.select_tool(tool);
    }

    pub fn set_brush_width(&mut self, width: u32) {
        self.tools.set_brush_width(width);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
    }

    pub fn submit(&mut self, now: Instant) -> Result<(), SolveError> {
        self.orchestrator.submit(
            self.renderer.surface(),
            self.renderer.ink_hint(),
            &self.variables,
            self.reveals.generation(),
            now,
        )
    }

    /// Blocks up to `timeout` for an outstanding solve response.
    pub fn wait_for_response(&mut self, timeout: std::time::Duration) -> bool {
        self.orchestrator.wait_for_response(timeout)
    }

    /// Applies a finished solve response and reveals every overlay due by
    /// `now`. Returns notifications for the user.
    pub fn tick(&mut self, now: Instant) -> Vec<Notification> {
        let mut notifications = Vec::new();
        if let Some(note) = self
            .orchestrator
            .poll(now, &mut self.variables, &mut self.reveals)
        {
            notifications.push(note);
        }
        for entry in self.reveals.due_entries(now) {
            self.overlays.reveal(entry);
        }
        notifications
    }

    pub fn reposition_overlay(&mut self, index: usize, position: OverlayPosition) -> bool {
        self.overlays.reposition(index, position)
    }

    /// Clears ink, overlays and variables in one step. Reveals still queued
    /// and any response still in flight belong to the old generation and are
    /// discarded when they surface.
    pub fn reset(&mut self) {
        self.transition(ResetState::ResetRequested);
        self.renderer.clear();
        self.overlays.clear();
        self.variables.clear();
        let generation = self.reveals.invalidate();
        self.transition(ResetState::Idle);
        tracing::info!(generation, "session reset");
    }

    fn transition(&mut self, next: ResetState) {
        debug_assert!(can_transition(self.reset_state, next));
        self.reset_state = next;
    }
}
