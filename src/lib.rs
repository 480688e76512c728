//! WasteWise access gate
//!
//! An HTTP front service that decides, for every request to the WasteWise
//! web app, whether the caller may proceed, and forwards allowed requests to
//! the app itself.
//!
//! ## Access Model
//!
//! ```text
//! classify path → resolve session (may rotate cookies) → decide
//! ```
//!
//! - `/dashboard*`, `/profile*` need a session, otherwise → `/auth/login`
//! - `/admin*` needs a session (→ `/auth/login`) whose profile role is
//!   `admin` (→ `/dashboard` otherwise, including when the profile can't be read)
//! - everything else passes through
//!
//! Sessions and profiles live in a hosted Supabase project; the gate only
//! reads them.
//!
//! ## Example Configuration
//!
//! ```toml
//! [server]
//! port = 3000
//!
//! [backend]
//! url = "https://xyzcompany.supabase.co"
//! # anon key from SUPABASE_ANON_KEY env var
//!
//! [upstream]
//! url = "http://127.0.0.1:3001"
//!
//! [session]
//! secure = true
//! ```

pub mod access_control;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod transport;
pub mod util;

// Re-export main types
pub use access_control::{AccessGate, GateDecision, GateOutcome, RouteClass};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use transport::{GateState, build_router};
