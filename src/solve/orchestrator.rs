use crate::canvas::bounds::locate_ink;
use crate::canvas::capture::capture_data_url;
use crate::canvas::render::DirtyRect;
use crate::canvas::surface::CanvasSurface;
use crate::error::SolveError;
use crate::messages::{Notification, SOLVE_FAILED, SOLVE_SUCCEEDED};
use crate::overlay::{OverlayEntry, OverlayPosition};
use crate::solve::client::{SolveRequest, SolveResult, SolverClient};
use crate::solve::schedule::RevealScheduler;
use crate::solve::variables::VariableStore;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

type SolveOutcome = Result<Vec<SolveResult>, SolveError>;

struct InFlightSolve {
    generation: u64,
    anchor: Option<OverlayPosition>,
    started: Instant,
    rx: Receiver<SolveOutcome>,
    ready: Option<SolveOutcome>,
}

/// Runs the capture → solve → merge → schedule pipeline.
///
/// The request itself runs on a worker thread; everything else happens on the
/// caller's thread through `submit` and `poll`, so the variable store and the
/// reveal queue are only ever touched by their owner.
pub struct SolveOrchestrator {
    client: Arc<dyn SolverClient>,
    reveal_delay: Duration,
    last_anchor: OverlayPosition,
    in_flight: Option<InFlightSolve>,
}

impl SolveOrchestrator {
    pub fn new(
        client: Arc<dyn SolverClient>,
        reveal_delay: Duration,
        default_anchor: OverlayPosition,
    ) -> Self {
        Self {
            client,
            reveal_delay,
            last_anchor: default_anchor,
            in_flight: None,
        }
    }

    /// True while a request is outstanding. Staggered reveals do not count.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Anchor used when the next response finds an empty canvas.
    pub fn last_anchor(&self) -> OverlayPosition {
        self.last_anchor
    }

    /// Captures `surface` and sends it to the solver with a copy of
    /// `variables`. The anchor for this batch is located now, against the
    /// surface as submitted.
    pub fn submit(
        &mut self,
        surface: &CanvasSurface,
        ink_hint: Option<DirtyRect>,
        variables: &VariableStore,
        generation: u64,
        now: Instant,
    ) -> Result<(), SolveError> {
        if self.in_flight.is_some() {
            return Err(SolveError::Busy);
        }
        if surface.is_zero_sized() {
            tracing::debug!("submit skipped: no canvas surface to capture");
            return Err(SolveError::CaptureUnavailable);
        }

        let image =
            capture_data_url(surface).map_err(|err| SolveError::Encode(format!("{err:#}")))?;
        let anchor =
            locate_ink(surface, ink_hint).map(|bounds| OverlayPosition::from(bounds.anchor()));
        let request = SolveRequest {
            image,
            variables: variables.snapshot(),
        };

        let (tx, rx) = channel();
        let client = Arc::clone(&self.client);
        std::thread::Builder::new()
            .name("ink-calc-solve".into())
            .spawn(move || {
                let outcome = client.solve(&request);
                let _ = tx.send(outcome);
            })
            .map_err(|err| SolveError::SolveRequestFailed(format!("spawn solve worker: {err}")))?;

        tracing::info!(
            variables = variables.len(),
            anchored = anchor.is_some(),
            "canvas submitted for solving"
        );
        self.in_flight = Some(InFlightSolve {
            generation,
            anchor,
            started: now,
            rx,
            ready: None,
        });
        Ok(())
    }

    /// Blocks up to `timeout` for the outstanding response without applying
    /// it. Returns whether a response is ready for `poll`.
    pub fn wait_for_response(&mut self, timeout: Duration) -> bool {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return false;
        };
        if in_flight.ready.is_some() {
            return true;
        }
        match in_flight.rx.recv_timeout(timeout) {
            Ok(outcome) => {
                in_flight.ready = Some(outcome);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                in_flight.ready = Some(Err(worker_vanished()));
                true
            }
        }
    }

    /// Applies a finished response, at most once per submit.
    ///
    /// Assignments are merged into `variables` and one reveal per result is
    /// scheduled, each `reveal_delay` after the previous one. A response whose
    /// generation is no longer current (a reset happened meanwhile) is dropped.
    pub fn poll(
        &mut self,
        now: Instant,
        variables: &mut VariableStore,
        reveals: &mut RevealScheduler,
    ) -> Option<Notification> {
        let in_flight = self.in_flight.as_mut()?;
        let outcome = match in_flight.ready.take() {
            Some(outcome) => outcome,
            None => match in_flight.rx.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => Err(worker_vanished()),
            },
        };
        let in_flight = self.in_flight.take()?;
        tracing::debug!(
            elapsed_ms = now.saturating_duration_since(in_flight.started).as_millis() as u64,
            "solve round trip finished"
        );

        if in_flight.generation != reveals.generation() {
            tracing::warn!("dropping solve response that arrived after a reset");
            return None;
        }

        match outcome {
            Ok(results) => {
                self.apply_results(
                    in_flight.anchor,
                    results,
                    now,
                    in_flight.generation,
                    variables,
                    reveals,
                );
                Some(Notification::success(SOLVE_SUCCEEDED))
            }
            Err(err) => {
                tracing::error!(error = %err, "calculation failed");
                Some(Notification::error(SOLVE_FAILED))
            }
        }
    }

    fn apply_results(
        &mut self,
        anchor: Option<OverlayPosition>,
        results: Vec<SolveResult>,
        now: Instant,
        generation: u64,
        variables: &mut VariableStore,
        reveals: &mut RevealScheduler,
    ) {
        for result in results.iter().filter(|result| result.assign) {
            variables.upsert(result.expr.clone(), result.result.clone());
        }

        let anchor = match anchor {
            Some(anchor) => {
                self.last_anchor = anchor;
                anchor
            }
            None => {
                tracing::debug!("empty canvas: reusing previous anchor");
                self.last_anchor
            }
        };

        tracing::info!(results = results.len(), "scheduling result reveals");
        let mut due = now;
        for result in results {
            due += self.reveal_delay;
            reveals.schedule(
                OverlayEntry::from_result(&result.expr, &result.result, anchor),
                due,
                generation,
            );
        }
    }
}

fn worker_vanished() -> SolveError {
    SolveError::SolveRequestFailed("solve worker exited without a response".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedSolver {
        outcome: SolveOutcome,
        seen: Mutex<Vec<SolveRequest>>,
    }

    impl FixedSolver {
        fn new(outcome: SolveOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl SolverClient for FixedSolver {
        fn solve(&self, request: &SolveRequest) -> SolveOutcome {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            self.outcome.clone()
        }
    }

    fn inked_surface() -> CanvasSurface {
        let mut surface = CanvasSurface::new(20, 20);
        for y in 3..=7 {
            for x in 2..=10 {
                surface.set_pixel((x, y), [255, 255, 255, 255]);
            }
        }
        surface
    }

    fn orchestrator(solver: Arc<FixedSolver>) -> SolveOrchestrator {
        SolveOrchestrator::new(
            solver,
            Duration::from_secs(1),
            OverlayPosition::new(10.0, 200.0),
        )
    }

    #[test]
    fn second_submit_while_busy_is_rejected() {
        let solver = FixedSolver::new(Ok(Vec::new()));
        let mut orchestrator = orchestrator(solver);
        let surface = inked_surface();
        let vars = VariableStore::default();
        let now = Instant::now();

        orchestrator.submit(&surface, None, &vars, 0, now).expect("first submit");
        assert!(orchestrator.is_busy());
        assert_eq!(
            orchestrator.submit(&surface, None, &vars, 0, now),
            Err(SolveError::Busy)
        );
    }

    #[test]
    fn zero_sized_surface_is_capture_unavailable() {
        let solver = FixedSolver::new(Ok(Vec::new()));
        let mut orchestrator = orchestrator(solver.clone());
        let result = orchestrator.submit(
            &CanvasSurface::new(0, 0),
            None,
            &VariableStore::default(),
            0,
            Instant::now(),
        );
        assert_eq!(result, Err(SolveError::CaptureUnavailable));
        assert!(!orchestrator.is_busy());
        assert!(solver.seen.lock().expect("lock").is_empty());
    }

    #[test]
    fn results_are_staggered_one_delay_apart() {
        let solver = FixedSolver::new(Ok(vec![
            SolveResult::new("x", "5", true),
            SolveResult::new("y", "6", true),
        ]));
        let mut orchestrator = orchestrator(solver);
        let mut vars = VariableStore::default();
        let mut reveals = RevealScheduler::default();
        let now = Instant::now();

        orchestrator
            .submit(&inked_surface(), None, &vars, reveals.generation(), now)
            .expect("submit");
        assert!(orchestrator.wait_for_response(Duration::from_secs(5)));
        let note = orchestrator
            .poll(now, &mut vars, &mut reveals)
            .expect("notification");
        assert!(!note.is_error());
        assert!(!orchestrator.is_busy());
        assert_eq!(vars.get("x"), Some("5"));
        assert_eq!(vars.get("y"), Some("6"));

        assert!(reveals.due_entries(now + Duration::from_millis(999)).is_empty());
        let first = reveals.due_entries(now + Duration::from_secs(1));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].text, "x = 5");
        assert_eq!(first[0].position, OverlayPosition::new(6.0, 5.0));
        let second = reveals.due_entries(now + Duration::from_secs(2));
        assert_eq!(second[0].text, "y = 6");
    }

    #[test]
    fn failure_leaves_state_untouched() {
        let solver = FixedSolver::new(Err(SolveError::SolveRequestFailed("offline".into())));
        let mut orchestrator = orchestrator(solver);
        let mut vars = VariableStore::default();
        vars.upsert("z", "1");
        let before = vars.clone();
        let mut reveals = RevealScheduler::default();
        let now = Instant::now();

        orchestrator
            .submit(&inked_surface(), None, &vars, reveals.generation(), now)
            .expect("submit");
        assert!(orchestrator.wait_for_response(Duration::from_secs(5)));
        let note = orchestrator
            .poll(now, &mut vars, &mut reveals)
            .expect("notification");

        assert!(note.is_error());
        assert_eq!(note.message, SOLVE_FAILED);
        assert_eq!(vars, before);
        assert_eq!(reveals.pending_len(), 0);
        assert!(!orchestrator.is_busy());
    }

    #[test]
    fn empty_canvas_reuses_previous_anchor() {
        let solver = FixedSolver::new(Ok(vec![SolveResult::new("1+1", "2", false)]));
        let mut orchestrator = orchestrator(solver);
        let mut vars = VariableStore::default();
        let mut reveals = RevealScheduler::default();
        let now = Instant::now();

        orchestrator
            .submit(&CanvasSurface::new(8, 8), None, &vars, 0, now)
            .expect("submit");
        assert!(orchestrator.wait_for_response(Duration::from_secs(5)));
        orchestrator.poll(now, &mut vars, &mut reveals);

        let due = reveals.due_entries(now + Duration::from_secs(1));
        assert_eq!(due[0].position, OverlayPosition::new(10.0, 200.0));
        assert_eq!(orchestrator.last_anchor(), OverlayPosition::new(10.0, 200.0));

        orchestrator
            .submit(&inked_surface(), None, &vars, 0, now)
            .expect("submit");
        assert!(orchestrator.wait_for_response(Duration::from_secs(5)));
        orchestrator.poll(now, &mut vars, &mut reveals);
        assert_eq!(orchestrator.last_anchor(), OverlayPosition::new(6.0, 5.0));
        reveals.due_entries(now + Duration::from_secs(1));

        orchestrator
            .submit(&CanvasSurface::new(20, 20), None, &vars, 0, now)
            .expect("submit");
        assert!(orchestrator.wait_for_response(Duration::from_secs(5)));
        orchestrator.poll(now, &mut vars, &mut reveals);
        let due = reveals.due_entries(now + Duration::from_secs(1));
        assert_eq!(due[0].position, OverlayPosition::new(6.0, 5.0));
    }

    #[test]
    fn stale_response_after_reset_is_dropped() {
        let solver = FixedSolver::new(Ok(vec![SolveResult::new("x", "9", true)]));
        let mut orchestrator = orchestrator(solver);
        let mut vars = VariableStore::default();
        let mut reveals = RevealScheduler::default();
        let now = Instant::now();

        orchestrator
            .submit(&inked_surface(), None, &vars, reveals.generation(), now)
            .expect("submit");
        reveals.invalidate();
        assert!(orchestrator.wait_for_response(Duration::from_secs(5)));

        assert_eq!(orchestrator.poll(now, &mut vars, &mut reveals), None);
        assert!(vars.is_empty());
        assert_eq!(reveals.pending_len(), 0);
        assert!(!orchestrator.is_busy());
    }

    #[test]
    fn request_carries_png_snapshot_and_variables() {
        let solver = FixedSolver::new(Ok(Vec::new()));
        let mut orchestrator = orchestrator(solver.clone());
        let mut vars = VariableStore::default();
        vars.upsert("x", "5");

        orchestrator
            .submit(&inked_surface(), None, &vars, 0, Instant::now())
            .expect("submit");
        assert!(orchestrator.wait_for_response(Duration::from_secs(5)));

        let seen = solver.seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert!(seen[0].image.starts_with("data:image/png;base64,"));
        assert_eq!(seen[0].variables.get("x").map(String::as_str), Some("5"));
    }
}
