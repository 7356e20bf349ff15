pub mod client;
pub mod orchestrator;
pub mod schedule;
pub mod variables;

pub use client::{HttpSolverClient, SolveRequest, SolveResult, SolverClient};
pub use orchestrator::SolveOrchestrator;
pub use schedule::RevealScheduler;
pub use variables::VariableStore;
