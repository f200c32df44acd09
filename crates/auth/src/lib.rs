//! `coursehub-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: the API layer
//! resolves a session into an [`Actor`] and every mutating or resource-scoped
//! operation goes through [`guard::ensure`] before touching the store.

pub mod actor;
pub mod claims;
pub mod guard;
pub mod roles;
pub mod user;

pub use actor::Actor;
pub use claims::{validate_claims, SessionClaims, TokenValidationError};
pub use guard::{can_perform, ensure, Action, Scope};
pub use roles::Role;
pub use user::{validate_role_assignment, Invite, User, UserStatus};
