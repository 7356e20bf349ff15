use ink_calc::canvas::{Color, Tool};
use ink_calc::overlay::NullTypesetter;
use ink_calc::settings::AppSettings;
use ink_calc::solve::{SolveRequest, SolveResult, SolverClient};
use ink_calc::{Session, SolveError};
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

/// Answers each request with the next scripted reply and records what it saw.
#[derive(Default)]
struct ScriptedSolver {
    replies: Mutex<VecDeque<Result<Vec<SolveResult>, SolveError>>>,
    seen: Mutex<Vec<SolveRequest>>,
}

impl ScriptedSolver {
    fn with(replies: Vec<Result<Vec<SolveResult>, SolveError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::default(),
        })
    }

    fn requests(&self) -> Vec<SolveRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl SolverClient for ScriptedSolver {
    fn solve(&self, request: &SolveRequest) -> Result<Vec<SolveResult>, SolveError> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Holds every request until the test releases it.
struct GatedSolver {
    gate: Mutex<Receiver<()>>,
}

impl SolverClient for GatedSolver {
    fn solve(&self, _request: &SolveRequest) -> Result<Vec<SolveResult>, SolveError> {
        let _ = self.gate.lock().unwrap().recv();
        Ok(vec![SolveResult::new("1+1", "2", false)])
    }
}

fn thin_settings() -> AppSettings {
    AppSettings {
        brush_width: 1,
        ..AppSettings::default()
    }
}

fn session_with(client: Arc<dyn SolverClient>) -> Session {
    Session::new(&thin_settings(), client, Box::new(NullTypesetter), (64, 48))
}

fn stroke(session: &mut Session, from: (i32, i32), to: (i32, i32)) {
    session.pointer_down(from);
    session.pointer_move(to);
    session.pointer_up();
}

fn solve(session: &mut Session, now: Instant) {
    session.submit(now).expect("submit");
    assert!(session.wait_for_response(WAIT), "solver never answered");
}

#[test]
fn overlays_appear_one_per_second_at_the_ink_center() {
    let solver = ScriptedSolver::with(vec![Ok(vec![
        SolveResult::new("2+2", "4", false),
        SolveResult::new("3*3", "9", false),
    ])]);
    let mut session = session_with(solver);
    stroke(&mut session, (2, 3), (10, 7));

    let now = Instant::now();
    solve(&mut session, now);
    let notes = session.tick(now);
    assert_eq!(notes.len(), 1);
    assert!(!notes[0].is_error());
    assert!(session.overlays().is_empty());

    session.tick(now + Duration::from_millis(1000));
    assert_eq!(session.overlays().len(), 1);
    session.tick(now + Duration::from_millis(1999));
    assert_eq!(session.overlays().len(), 1);
    session.tick(now + Duration::from_millis(2000));

    let entries = session.overlays().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "2+2 = 4");
    assert_eq!(entries[1].text, "3*3 = 9");
    for entry in entries {
        assert_eq!((entry.position.x, entry.position.y), (6.0, 5.0));
    }
}

#[test]
fn assignments_are_sent_with_the_next_request() {
    let solver = ScriptedSolver::with(vec![
        Ok(vec![SolveResult::new("x", "5", true)]),
        Ok(vec![SolveResult::new("x+1", "6", false)]),
    ]);
    let mut session = session_with(solver.clone());
    stroke(&mut session, (5, 5), (20, 5));

    let now = Instant::now();
    solve(&mut session, now);
    session.tick(now);
    assert_eq!(session.variables().get("x"), Some("5"));

    solve(&mut session, now);
    session.tick(now);

    let requests = solver.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].variables.is_empty());
    assert_eq!(requests[1].variables.get("x").map(String::as_str), Some("5"));
    assert!(requests[1].image.starts_with("data:image/png;base64,"));
}

#[test]
fn failed_solve_only_notifies() {
    let solver = ScriptedSolver::with(vec![
        Ok(vec![SolveResult::new("y", "2", true)]),
        Err(SolveError::SolveRequestFailed("connection refused".into())),
    ]);
    let mut session = session_with(solver);
    stroke(&mut session, (5, 5), (9, 9));

    let now = Instant::now();
    solve(&mut session, now);
    session.tick(now);
    session.tick(now + WAIT);
    assert_eq!(session.overlays().len(), 1);

    solve(&mut session, now + WAIT);
    let notes = session.tick(now + WAIT);
    assert_eq!(notes.len(), 1);
    assert!(notes[0].is_error());
    assert!(!session.is_busy());
    assert_eq!(session.pending_reveals(), 0);
    assert_eq!(session.overlays().len(), 1);
    assert_eq!(session.variables().len(), 1);
    assert_eq!(session.variables().get("y"), Some("2"));
}

#[test]
fn second_run_is_rejected_while_busy() {
    let (release, gate): (Sender<()>, Receiver<()>) = channel();
    let mut session = session_with(Arc::new(GatedSolver {
        gate: Mutex::new(gate),
    }));
    stroke(&mut session, (1, 1), (4, 4));

    let now = Instant::now();
    session.submit(now).expect("first submit");
    assert!(session.is_busy());
    assert_eq!(session.submit(now), Err(SolveError::Busy));

    release.send(()).unwrap();
    assert!(session.wait_for_response(WAIT));
    session.tick(now);
    assert!(!session.is_busy());
    assert_eq!(session.pending_reveals(), 1);
}

#[test]
fn reset_discards_reveals_still_pending() {
    let solver = ScriptedSolver::with(vec![Ok(vec![
        SolveResult::new("a", "1", true),
        SolveResult::new("b", "2", true),
        SolveResult::new("a+b", "3", false),
    ])]);
    let mut session = session_with(solver);
    stroke(&mut session, (3, 3), (30, 30));

    let now = Instant::now();
    solve(&mut session, now);
    session.tick(now);
    session.tick(now + Duration::from_secs(1));
    assert_eq!(session.overlays().len(), 1);

    session.reset();
    assert_eq!(session.pending_reveals(), 0);
    assert!(session.variables().is_empty());

    session.tick(now + Duration::from_secs(10));
    assert!(session.overlays().is_empty());
    assert!(session.surface().rgba().chunks_exact(4).all(|px| px[3] == 0));
}

#[test]
fn eraser_clears_pencil_ink() {
    let mut session = session_with(ScriptedSolver::with(Vec::new()));
    session.select_color(Color::rgb(255, 0, 0));
    stroke(&mut session, (10, 10), (30, 10));
    assert_eq!(session.surface().pixel(20, 10), Some([255, 0, 0, 255]));

    session.select_tool(Tool::Eraser);
    session.set_brush_width(5);
    stroke(&mut session, (8, 10), (32, 10));
    for x in 10..=30 {
        assert_eq!(session.surface().alpha(x, 10), 0, "pixel {x} still inked");
    }
}

#[test]
fn empty_canvas_falls_back_to_the_default_anchor() {
    let solver = ScriptedSolver::with(vec![Ok(vec![SolveResult::new("0", "0", false)])]);
    let mut session = session_with(solver);

    let now = Instant::now();
    solve(&mut session, now);
    session.tick(now);
    session.tick(now + Duration::from_secs(1));

    let entry = &session.overlays().entries()[0];
    assert_eq!((entry.position.x, entry.position.y), (10.0, 200.0));
}
