//! `coursehub-store` — persistence behind repository traits.
//!
//! The relational store is the sole shared resource of the system; every
//! mutation goes through the traits in [`traits`], and every multi-row write
//! (shadow-edit submission, review finalization, invite-accepting user
//! creation, guarded organization delete) is a single store operation that the
//! Postgres backend wraps in a transaction and the in-memory backend performs
//! under one write lock.
//!
//! Handles are constructed explicitly and dependency-injected (`Arc<dyn …>`);
//! there is no global client singleton.

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use traits::{
    CourseStore, DraftStore, EditSubmission, HideOutcome, InviteStore, OrganizationStore,
    ProfileStore, ReviewSideEffect, UserStore,
};
