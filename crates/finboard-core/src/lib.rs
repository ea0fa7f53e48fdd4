//! Core library for finboard.
//!
//! Provides the session lifecycle (login, logout, token validation and
//! refresh), the authenticated REST client, the typed API models, and the
//! client-side record filters and dashboard summaries used by front ends.

pub mod api;
pub mod auth;
pub mod config;
pub mod filter;
pub mod models;
pub mod summary;
pub mod utils;

pub use api::{ApiClient, ApiError, AuthClient};
pub use auth::{AuthError, AuthState, Session, SessionStore};
pub use config::Config;
pub use filter::{Filterable, RecordFilter};
pub use summary::{DashboardSummary, GoalProgress};
