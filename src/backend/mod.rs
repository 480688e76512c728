//! Auth/data backend module
//!
//! REST client and payload types for the hosted backend that owns
//! authentication and the `profiles` table.

pub mod client;
pub mod types;

pub use client::BackendClient;
pub use types::{AuthUser, TokenResponse};
