//! Access control module
//!
//! Session and role based gating of the web app's routes.
//!
//! ## Route classes
//!
//! | Prefix | Class | Requirement |
//! |---|---|---|
//! | `/auth` | auth | none |
//! | `/dashboard`, `/profile` | protected | any session |
//! | `/admin` | admin | session whose profile role is `admin` |
//! | anything else | public | none |
//!
//! Prefixes are matched against the percent-decoded path with empty and dot
//! segments removed.
//!
//! Unauthenticated callers are redirected to `/auth/login`; authenticated
//! callers without the admin role (or whose profile cannot be read) are
//! redirected to `/dashboard` from admin routes.

pub mod gate;
pub mod profile;
pub mod role;
pub mod route;

pub use gate::{AccessGate, GateDecision, GateOutcome};
pub use profile::{Profile, ProfileStore, RestProfileStore, SharedProfileStore};
pub use role::Role;
pub use route::{CanonicalPath, DASHBOARD_PATH, LOGIN_PATH, RouteClass};
