//! Accounts, sessions, and the hosted auth provider.

pub mod domain;
pub mod provider;
pub mod session;
pub mod supabase;

pub use domain::{
    AuthEvent, AuthenticatedUser, Role, Session, SignUpOutcome, SignUpRequest, UserId,
    UserProfile,
};
pub use provider::{AuthError, AuthProvider, UnconfiguredAuth};
pub use session::{spawn_session_listener, SessionContext, SessionSnapshot};
pub use supabase::SupabaseAuth;
