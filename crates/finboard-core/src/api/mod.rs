//! REST API client module for the finboard backend.
//!
//! - `AuthClient`: unauthenticated auth endpoints (login, register, refresh)
//! - `ApiClient`: bearer-authenticated data endpoints with a single
//!   refresh-and-retry on 401
//!
//! The backend issues JWT access tokens plus a longer-lived refresh token.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{AuthClient, AuthResponse, AuthUser, LoginRequest, RefreshResponse, RegisterRequest};
pub use client::ApiClient;
pub use error::ApiError;
