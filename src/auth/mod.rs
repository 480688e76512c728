//! Authentication module
//!
//! Session resolution for incoming requests. The identity provider is the
//! hosted GoTrue service; the trait seam keeps the gate independent of it.

pub mod provider;
pub mod session;
pub mod supabase;

pub use provider::{IdentityProvider, SharedIdentityProvider};
pub use session::{ResolvedSession, Session, SessionCredentials, SessionUpdate, TokenPair};
pub use supabase::SupabaseIdentity;
