pub mod canvas;
pub mod error;
pub mod gui;
pub mod logging;
pub mod messages;
pub mod overlay;
pub mod session;
pub mod settings;
pub mod solve;
pub mod typeset;

pub use error::SolveError;
pub use session::Session;
