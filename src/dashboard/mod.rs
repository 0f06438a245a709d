//! Local web dashboard.
//!
//! Serves the role-based chat page and the museum dashboard with the same
//! session semantics as the REPL.

pub mod routes;
pub mod server;
pub mod state;
pub mod templates;

pub use server::{router, start_dashboard};
pub use state::{ChatState, DashboardState, Notice, NoticeLevel};
