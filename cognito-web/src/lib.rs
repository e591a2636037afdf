//! cognito-web library
//!
//! Axum routes that put the cognito-session layer in front of a small web app:
//! hosted login redirects, the OAuth callback, password login, logout and
//! a JSON view of the current user.

pub mod cookies;
pub mod error;
pub mod html;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use routes::router;
pub use state::{AppState, CurrentUser, SharedState};
